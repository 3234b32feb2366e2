use async_trait::async_trait;

use crate::domain::team::{Team, TeamId};
use crate::error::DataError;

/// Repository trait for Team entities
///
/// Plain CRUD only; the inverse collection of a team's members is read
/// through `MemberRepository::find_by_team`.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Save a team: insert when it has no identity, update otherwise.
    /// Returns the team with its identity populated.
    async fn save(&self, team: &Team) -> Result<Team, DataError>;

    /// Find a team by its ID; absence is an empty result, not an error.
    async fn find_by_id(&self, id: TeamId) -> Result<Option<Team>, DataError>;

    /// Find all teams, in no guaranteed order.
    async fn find_all(&self) -> Result<Vec<Team>, DataError>;

    /// Count all teams.
    async fn count(&self) -> Result<u64, DataError>;

    /// Delete a team by identity; deleting an absent or transient team is
    /// a no-op.
    async fn delete(&self, team: &Team) -> Result<(), DataError>;
}

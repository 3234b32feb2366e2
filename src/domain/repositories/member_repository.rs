use async_trait::async_trait;

use crate::domain::member::{Member, MemberDto, MemberId};
use crate::domain::page::{Page, PageRequest};
use crate::domain::team::TeamId;
use crate::error::DataError;

/// Repository trait for Member entities
///
/// Defines the generic CRUD contract plus the derived and declared query
/// methods of this domain. All reads and writes run against the session
/// the implementation was constructed with, inside one transaction
/// boundary.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Save a member: insert when it has no identity, update otherwise.
    /// Returns the member with its identity populated. Re-saving an
    /// already-identified member is not an error.
    async fn save(&self, member: &Member) -> Result<Member, DataError>;

    /// Find a member by its ID; absence is an empty result, not an error.
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, DataError>;

    /// Find all members, in no guaranteed order.
    async fn find_all(&self) -> Result<Vec<Member>, DataError>;

    /// Count all members.
    async fn count(&self) -> Result<u64, DataError>;

    /// Delete a member by identity; deleting an absent or transient
    /// member is a no-op.
    async fn delete(&self, member: &Member) -> Result<(), DataError>;

    /// Derived finder: username equals `username` AND age strictly
    /// greater than `age`.
    async fn find_by_username_and_age_greater_than(
        &self,
        username: &str,
        age: i32,
    ) -> Result<Vec<Member>, DataError>;

    /// Derived finder: all members of one team (the inverse side of the
    /// member→team reference).
    async fn find_by_team(&self, team_id: TeamId) -> Result<Vec<Member>, DataError>;

    /// One page of members of the given age, with the total computed by a
    /// separate count query.
    async fn find_by_age(
        &self,
        age: i32,
        page: &PageRequest,
    ) -> Result<Page<Member>, DataError>;

    /// Declared query: members matching both username and exact age.
    async fn find_user(&self, username: &str, age: i32) -> Result<Vec<Member>, DataError>;

    /// Declared query: every username, as a scalar list.
    async fn find_username_list(&self) -> Result<Vec<String>, DataError>;

    /// Declared query: (id, username, team name) projections for members
    /// that belong to a team.
    async fn find_member_dto(&self) -> Result<Vec<MemberDto>, DataError>;

    /// Declared query: members whose username is in `names`.
    async fn find_by_names(&self, names: &[&str]) -> Result<Vec<Member>, DataError>;

    /// Declared query: members joined with their team in a single query;
    /// the team reference comes back already resolved.
    async fn find_member_fetch_join(&self) -> Result<Vec<Member>, DataError>;

    /// Bulk update: `age = age + 1` for every member with
    /// `age >= threshold_age`. Returns the affected row count.
    ///
    /// This is a set-based write that bypasses per-entity tracking: the
    /// session's identity map is not touched, so entities read before the
    /// bulk update keep their old field values until the caller clears
    /// the session. Call `Session::clear` before re-reading.
    async fn bulk_age_plus(&self, threshold_age: i32) -> Result<u64, DataError>;
}

/// Custom extension mixed into the member repository
///
/// Hand-written query logic for cases the declarative surface cannot
/// express. Implementations use the same low-level session handle as the
/// generic repository and must not open a second transaction.
#[async_trait]
pub trait MemberRepositoryCustom: Send + Sync {
    async fn find_member_custom(&self) -> Result<Vec<Member>, DataError>;
}

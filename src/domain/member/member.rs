use std::fmt;

use serde::Serialize;
use tokio::sync::OnceCell;

use crate::domain::repositories::TeamRepository;
use crate::domain::team::{Team, TeamId};
use crate::error::DataError;

/// Identity of a persisted [`Member`], assigned by the storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MemberId(i64);

impl MemberId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lazy reference from a member to its team.
///
/// Holds the team's identity plus a memoized loader cell: the team row is
/// fetched at most once per entity instance, on first
/// [`load`](Self::load), and reused afterwards.
#[derive(Debug)]
pub struct LazyTeam {
    team_id: TeamId,
    cell: OnceCell<Team>,
}

impl LazyTeam {
    /// A reference that will load on demand.
    pub fn from_id(team_id: TeamId) -> Self {
        Self {
            team_id,
            cell: OnceCell::new(),
        }
    }

    /// A reference already resolved to a loaded team.
    pub fn resolved(team: Team) -> Result<Self, DataError> {
        let team_id = team.id().ok_or_else(|| {
            DataError::ConstraintViolation(
                "cannot reference a team that has not been saved".to_string(),
            )
        })?;
        Ok(Self {
            team_id,
            cell: OnceCell::new_with(Some(team)),
        })
    }

    pub fn team_id(&self) -> TeamId {
        self.team_id
    }

    /// The team, if it has already been resolved.
    pub fn get(&self) -> Option<&Team> {
        self.cell.get()
    }

    /// Resolves the team, loading it through `repo` on first use.
    ///
    /// A dangling reference (the row no longer exists) is a
    /// [`DataError::ConstraintViolation`].
    pub async fn load(&self, repo: &dyn TeamRepository) -> Result<&Team, DataError> {
        self.cell
            .get_or_try_init(|| async {
                repo.find_by_id(self.team_id).await?.ok_or_else(|| {
                    DataError::ConstraintViolation(format!(
                        "member references missing team {}",
                        self.team_id
                    ))
                })
            })
            .await
    }
}

impl Clone for LazyTeam {
    fn clone(&self) -> Self {
        Self {
            team_id: self.team_id,
            cell: OnceCell::new_with(self.cell.get().cloned()),
        }
    }
}

impl PartialEq for LazyTeam {
    fn eq(&self, other: &Self) -> bool {
        self.team_id == other.team_id
    }
}

/// Member entity.
///
/// Mutable after creation; username, age, and the team reference may all
/// be reassigned. Equality is identity-based: two members are equal only
/// when both carry the same assigned id.
#[derive(Debug, Clone)]
pub struct Member {
    id: Option<MemberId>,
    username: String,
    age: i32,
    team: Option<LazyTeam>,
}

impl Member {
    /// Creates a new, not-yet-persisted member without a team.
    pub fn new(username: impl Into<String>, age: i32) -> Self {
        Self {
            id: None,
            username: username.into(),
            age,
            team: None,
        }
    }

    /// Creates a new member referencing an already-saved team.
    pub fn with_team(
        username: impl Into<String>,
        age: i32,
        team: &Team,
    ) -> Result<Self, DataError> {
        let mut member = Self::new(username, age);
        member.set_team(team)?;
        Ok(member)
    }

    /// Returns the assigned identity, if this member has been saved.
    pub fn id(&self) -> Option<MemberId> {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn set_age(&mut self, age: i32) {
        self.age = age;
    }

    /// The team reference, if any.
    pub fn team(&self) -> Option<&LazyTeam> {
        self.team.as_ref()
    }

    /// Points this member at an already-saved team.
    ///
    /// The team must carry an identity; referencing a transient team is a
    /// [`DataError::ConstraintViolation`].
    pub fn set_team(&mut self, team: &Team) -> Result<(), DataError> {
        self.team = Some(LazyTeam::resolved(team.clone())?);
        Ok(())
    }

    /// Drops the team reference.
    pub fn clear_team(&mut self) {
        self.team = None;
    }

    /// Reconstructs a Member from persistence layer data.
    ///
    /// The team reference, when present, stays unresolved until loaded.
    pub fn from_persistence(
        id: MemberId,
        username: String,
        age: i32,
        team_id: Option<TeamId>,
    ) -> Self {
        Self {
            id: Some(id),
            username,
            age,
            team: team_id.map(LazyTeam::from_id),
        }
    }

    pub(crate) fn from_persistence_with_team(
        id: MemberId,
        username: String,
        age: i32,
        team: LazyTeam,
    ) -> Self {
        Self {
            id: Some(id),
            username,
            age,
            team: Some(team),
        }
    }

    pub(crate) fn assign_id(&mut self, id: MemberId) {
        self.id = Some(id);
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_member_is_transient() {
        let member = Member::new("memberA", 10);
        assert!(member.id().is_none());
        assert!(member.team().is_none());
    }

    #[test]
    fn referencing_a_transient_team_is_rejected() {
        let team = Team::new("teamA").expect("valid team");
        let mut member = Member::new("memberA", 10);
        assert!(matches!(
            member.set_team(&team),
            Err(DataError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn referencing_a_saved_team_keeps_it_resolved() {
        let team = Team::from_persistence(TeamId::new(1), "teamA".to_string());
        let member = Member::with_team("memberA", 10, &team).expect("valid member");

        let lazy = member.team().expect("team reference");
        assert_eq!(lazy.team_id(), TeamId::new(1));
        assert_eq!(lazy.get().map(Team::name), Some("teamA"));
    }

    #[test]
    fn persisted_reference_starts_unresolved() {
        let member =
            Member::from_persistence(MemberId::new(1), "memberA".into(), 10, Some(TeamId::new(7)));
        let lazy = member.team().expect("team reference");
        assert!(lazy.get().is_none());
    }

    #[test]
    fn equality_is_identity_based() {
        let a = Member::from_persistence(MemberId::new(1), "aaa".into(), 10, None);
        let b = Member::from_persistence(MemberId::new(1), "bbb".into(), 20, None);
        assert_eq!(a, b);
        assert_ne!(Member::new("aaa", 10), Member::new("aaa", 10));
    }

    #[test]
    fn clone_carries_the_resolved_team() {
        let team = Team::from_persistence(TeamId::new(1), "teamA".to_string());
        let member = Member::with_team("memberA", 10, &team).expect("valid member");
        let cloned = member.clone();
        assert!(cloned.team().expect("team reference").get().is_some());
    }
}

use std::fmt;

use crate::error::DataError;

/// Identity of a persisted [`Team`], assigned by the storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamId(i64);

impl TeamId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team entity.
///
/// A team owns no member lifecycle: the inverse collection of members is
/// read through `MemberRepository::find_by_team`, not held here.
///
/// # Invariants
/// - Name cannot be empty
/// - Identity is assigned once, by the persistence layer, on first save
///
/// Equality is identity-based: two teams are equal only when both carry
/// the same assigned id.
#[derive(Debug, Clone)]
pub struct Team {
    id: Option<TeamId>,
    name: String,
}

impl Team {
    /// Creates a new, not-yet-persisted team.
    ///
    /// # Returns
    /// * `Ok(Team)` - New transient team without an identity
    /// * `Err(DataError::ConstraintViolation)` - If the name is empty
    pub fn new(name: impl Into<String>) -> Result<Self, DataError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DataError::ConstraintViolation(
                "team name cannot be empty".to_string(),
            ));
        }
        Ok(Self { id: None, name })
    }

    /// Returns the assigned identity, if this team has been saved.
    pub fn id(&self) -> Option<TeamId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Reconstructs a Team from persistence layer data.
    ///
    /// Bypasses validation; only for repository implementations and tests
    /// that need an already-identified team.
    pub fn from_persistence(id: TeamId, name: String) -> Self {
        Self { id: Some(id), name }
    }

    pub(crate) fn assign_id(&mut self, id: TeamId) {
        self.id = Some(id);
    }
}

impl PartialEq for Team {
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
    fn new_team_has_no_identity() {
        let team = Team::new("teamA").expect("valid team");
        assert!(team.id().is_none());
        assert_eq!(team.name(), "teamA");
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(matches!(
            Team::new(""),
            Err(DataError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn equality_is_identity_based() {
        let a = Team::from_persistence(TeamId::new(1), "teamA".to_string());
        let b = Team::from_persistence(TeamId::new(1), "renamed".to_string());
        let c = Team::from_persistence(TeamId::new(2), "teamA".to_string());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn transient_teams_are_never_equal() {
        let a = Team::new("teamA").expect("valid team");
        let b = Team::new("teamA").expect("valid team");
        assert_ne!(a, b);
    }
}

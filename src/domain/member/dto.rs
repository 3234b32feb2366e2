use serde::Serialize;

use crate::domain::member::MemberId;

/// Read-only projection of a member joined with its team name.
///
/// Produced only by query results; never persisted and carries no
/// identity beyond the row it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberDto {
    pub id: MemberId,
    pub username: String,
    pub team_name: String,
}

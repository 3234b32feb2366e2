// Repository implementations (data access layer)
// Adapters that implement the domain repository contracts over SQLite

mod member_custom;
pub mod sqlite_member_repository;
pub mod sqlite_team_repository;

pub use sqlite_member_repository::SqliteMemberRepository;
pub use sqlite_team_repository::SqliteTeamRepository;

// Repository contracts for the domain entities
// Implementations live in the infrastructure layer

pub mod member_repository;
pub mod team_repository;

pub use member_repository::{MemberRepository, MemberRepositoryCustom};
pub use team_repository::TeamRepository;

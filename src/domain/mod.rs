// Domain layer module exports
// Entities, projections, and repository contracts; no storage concerns

pub mod member;
pub mod page;
pub mod repositories;
pub mod team;

// Infrastructure layer module exports
// Storage backend access: database handle, session, repository adapters

pub mod database;
pub mod repositories;
pub mod session;

pub use database::Database;
pub use session::{Session, SharedSession};

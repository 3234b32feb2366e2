mod team;

pub use team::{Team, TeamId};

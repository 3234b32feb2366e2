mod dto;
mod member;

pub use dto::MemberDto;
pub use member::{LazyTeam, Member, MemberId};

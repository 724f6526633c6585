mod group;
mod member;

pub use group::{normalize_name, rename_value, Group, DEFAULT_GROUP_NAME};
pub use member::{Member, MemberUpdate, DEFAULT_MEMBER_NAME};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name given to a member created without one.
pub const DEFAULT_MEMBER_NAME: &str = "New Member";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: i64,
    pub group_id: i64,
    pub name: String,
    pub checked_in: bool,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn new(id: i64, group_id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            group_id,
            name: name.into(),
            checked_in: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_checked_in(mut self, checked_in: bool) -> Self {
        self.checked_in = checked_in;
        self
    }

    /// Returns a copy with the present fields of `update` applied.
    ///
    /// A blank name is ignored, matching how the store treats renames.
    pub fn patched(&self, update: &MemberUpdate) -> Self {
        let mut member = self.clone();
        if let Some(name) = update.name.as_deref().and_then(super::rename_value) {
            member.name = name;
        }
        if let Some(checked_in) = update.checked_in {
            member.checked_in = checked_in;
        }
        member
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.checked_in { "x" } else { " " };
        write!(f, "[{}] {} (#{})", mark, self.name, self.id)
    }
}

/// Partial update of a member. Only present fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_in: Option<bool>,
}

impl MemberUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            checked_in: None,
        }
    }

    pub fn checked_in(checked_in: bool) -> Self {
        Self {
            name: None,
            checked_in: Some(checked_in),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.checked_in.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_member_not_checked_in() {
        let member = Member::new(1, 2, "Alice");
        assert!(!member.checked_in);
        assert_eq!(member.group_id, 2);
    }

    #[test]
    fn test_patched_applies_present_fields() {
        let member = Member::new(1, 1, "Alice");

        let renamed = member.patched(&MemberUpdate::name("  Alicia "));
        assert_eq!(renamed.name, "Alicia");
        assert!(!renamed.checked_in);

        let checked = member.patched(&MemberUpdate::checked_in(true));
        assert_eq!(checked.name, "Alice");
        assert!(checked.checked_in);
    }

    #[test]
    fn test_patched_ignores_blank_name() {
        let member = Member::new(1, 1, "Alice");
        let patched = member.patched(&MemberUpdate::name("   "));
        assert_eq!(patched.name, "Alice");
    }

    #[test]
    fn test_update_is_empty() {
        assert!(MemberUpdate::default().is_empty());
        assert!(!MemberUpdate::checked_in(false).is_empty());
    }

    #[test]
    fn test_update_serializes_only_present_fields() {
        let json = serde_json::to_string(&MemberUpdate::checked_in(true)).unwrap();
        assert_eq!(json, r#"{"checked_in":true}"#);
    }
}

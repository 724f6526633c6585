use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::member::Member;

/// Name given to a group created without one.
pub const DEFAULT_GROUP_NAME: &str = "Untitled Group";

/// A roast group (panel) together with its members, ordered by creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Group {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            created_at: Utc::now(),
            members: Vec::new(),
        }
    }

    pub fn with_members(mut self, members: Vec<Member>) -> Self {
        self.members = members;
        self
    }

    pub fn checked_in_count(&self) -> usize {
        self.members.iter().filter(|m| m.checked_in).count()
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = format!("{} (#{})", self.name, self.id);
        writeln!(f, "{}", title)?;
        writeln!(f, "{}", "=".repeat(title.len()))?;
        writeln!(
            f,
            "Checked in: {}/{}",
            self.checked_in_count(),
            self.members.len()
        )?;

        for member in &self.members {
            writeln!(f, "  {}", member)?;
        }

        Ok(())
    }
}

/// Trims a user-supplied name, falling back to `default` when it is blank.
pub fn normalize_name(name: Option<&str>, default: &str) -> String {
    match name.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
        _ => default.to_string(),
    }
}

/// Trims a rename value; `None` means the rename should be ignored.
pub fn rename_value(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

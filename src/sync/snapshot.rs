//! Immutable view of every group and member.
//!
//! Patches never mutate a snapshot; each returns a new one. The engine swaps
//! whole snapshots, so rolling back is just republishing the old value.

use std::collections::HashSet;

use crate::models::{Group, Member, MemberUpdate};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    groups: Vec<Group>,
}

impl Snapshot {
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, id: i64) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn member(&self, id: i64) -> Option<&Member> {
        self.groups
            .iter()
            .flat_map(|g| g.members.iter())
            .find(|m| m.id == id)
    }

    /// Appends a group.
    pub fn with_group(&self, group: Group) -> Self {
        let mut groups = self.groups.clone();
        groups.push(group);
        Self { groups }
    }

    /// Puts `group` where `id` used to be.
    ///
    /// Any other entry already carrying the new group's id is dropped so a
    /// splice racing with a reload cannot leave duplicates. When `id` is
    /// gone the group is appended.
    pub fn with_group_replaced(&self, id: i64, group: Group) -> Self {
        let mut groups: Vec<Group> = self
            .groups
            .iter()
            .filter(|g| g.id == id || g.id != group.id)
            .cloned()
            .collect();

        match groups.iter_mut().find(|g| g.id == id) {
            Some(slot) => *slot = group,
            None => groups.push(group),
        }
        Self { groups }
    }

    /// Sets a group's name, keeping its members.
    pub fn with_group_renamed(&self, id: i64, name: &str) -> Self {
        self.map_group(id, |g| g.name = name.to_string())
    }

    /// Removes a group and, with it, all of its members.
    pub fn without_group(&self, id: i64) -> Self {
        Self {
            groups: self.groups.iter().filter(|g| g.id != id).cloned().collect(),
        }
    }

    /// Appends a member to its group. Unknown groups are left untouched.
    pub fn with_member(&self, member: Member) -> Self {
        self.map_group(member.group_id, |g| g.members.push(member))
    }

    /// Puts `member` where member `id` used to be within its group.
    pub fn with_member_replaced(&self, id: i64, member: Member) -> Self {
        self.map_group(member.group_id, |g| {
            g.members.retain(|m| m.id == id || m.id != member.id);
            match g.members.iter_mut().find(|m| m.id == id) {
                Some(slot) => *slot = member,
                None => g.members.push(member),
            }
        })
    }

    pub fn with_member_patched(&self, id: i64, group_id: i64, update: &MemberUpdate) -> Self {
        self.map_group(group_id, |g| {
            if let Some(slot) = g.members.iter_mut().find(|m| m.id == id) {
                *slot = slot.patched(update);
            }
        })
    }

    pub fn without_member(&self, id: i64, group_id: i64) -> Self {
        self.map_group(group_id, |g| g.members.retain(|m| m.id != id))
    }

    /// True while any entity carries a locally generated id.
    pub fn has_sentinels(&self) -> bool {
        self.groups
            .iter()
            .any(|g| is_sentinel(g.id) || g.members.iter().any(|m| is_sentinel(m.id)))
    }

    /// Drops every placeholder group or member whose id is not in `keep`.
    pub fn without_sentinels_except(&self, keep: &HashSet<i64>) -> Self {
        let live = |id: i64| !is_sentinel(id) || keep.contains(&id);
        let groups = self
            .groups
            .iter()
            .filter(|g| live(g.id))
            .map(|g| {
                let mut group = g.clone();
                group.members.retain(|m| live(m.id));
                group
            })
            .collect();
        Self { groups }
    }

    fn map_group(&self, id: i64, f: impl FnOnce(&mut Group)) -> Self {
        let mut groups = self.groups.clone();
        if let Some(group) = groups.iter_mut().find(|g| g.id == id) {
            f(group);
        }
        Self { groups }
    }
}

/// Server ids are positive; placeholders use negative ones.
pub fn is_sentinel(id: i64) -> bool {
    id < 0
}

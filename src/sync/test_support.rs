//! In-memory stand-in for the HTTP API.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use super::client::RosterApi;
use super::error::SyncError;
use crate::models::{
    normalize_name, rename_value, Group, Member, MemberUpdate, DEFAULT_GROUP_NAME,
    DEFAULT_MEMBER_NAME,
};

#[derive(Default)]
struct FakeState {
    groups: Vec<Group>,
    next_group_id: i64,
    next_member_id: i64,
}

/// Behaves like the server over a plain vector of groups, with switches for
/// failing calls and a gate that holds mutations until released.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
    gate: Arc<RwLock<()>>,
    pending: AtomicUsize,
    fetches: AtomicUsize,
    mutations: AtomicUsize,
    fail_fetches: AtomicBool,
    fail_mutations: AtomicBool,
}

fn server_error(message: &str) -> SyncError {
    SyncError::Status {
        status: 500,
        message: message.to_string(),
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_group(&self, id: i64, name: &str, members: &[(i64, &str)]) {
        let mut state = self.state.lock().unwrap();
        let members = members
            .iter()
            .map(|(member_id, member_name)| Member::new(*member_id, id, *member_name))
            .collect::<Vec<_>>();
        for member in &members {
            state.next_member_id = state.next_member_id.max(member.id);
        }
        state.next_group_id = state.next_group_id.max(id);
        state.groups.push(Group::new(id, name).with_members(members));
    }

    /// The next created member gets exactly this id.
    pub fn set_next_member_id(&self, id: i64) {
        self.state.lock().unwrap().next_member_id = id - 1;
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub fn fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    /// Holds every mutation call until the returned guard is dropped.
    pub fn pause(&self) -> OwnedRwLockWriteGuard<()> {
        Arc::clone(&self.gate).try_write_owned().unwrap()
    }

    /// Mutation calls currently held by [`FakeApi::pause`].
    pub fn pending_calls(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<(), SyncError> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        drop(self.gate.read().await);
        self.pending.fetch_sub(1, Ordering::SeqCst);

        self.mutations.fetch_add(1, Ordering::SeqCst);
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(server_error("simulated failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl RosterApi for FakeApi {
    async fn fetch_all(&self) -> Result<Vec<Group>, SyncError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(SyncError::Transport("simulated outage".to_string()));
        }
        Ok(self.state.lock().unwrap().groups.clone())
    }

    async fn create_group(&self, name: Option<&str>) -> Result<Group, SyncError> {
        self.enter().await?;
        let mut state = self.state.lock().unwrap();
        state.next_group_id += 1;
        let group = Group::new(state.next_group_id, normalize_name(name, DEFAULT_GROUP_NAME));
        state.groups.push(group.clone());
        Ok(group)
    }

    async fn rename_group(&self, id: i64, name: &str) -> Result<Group, SyncError> {
        self.enter().await?;
        let mut state = self.state.lock().unwrap();
        let group = state
            .groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| server_error("Group not found"))?;
        if let Some(name) = rename_value(name) {
            group.name = name;
        }
        Ok(group.clone())
    }

    async fn delete_group(&self, id: i64) -> Result<(), SyncError> {
        self.enter().await?;
        self.state.lock().unwrap().groups.retain(|g| g.id != id);
        Ok(())
    }

    async fn create_member(&self, group_id: i64, name: Option<&str>) -> Result<Member, SyncError> {
        self.enter().await?;
        let mut state = self.state.lock().unwrap();
        state.next_member_id += 1;
        let member = Member::new(
            state.next_member_id,
            group_id,
            normalize_name(name, DEFAULT_MEMBER_NAME),
        );
        let group = state
            .groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| server_error("Group not found"))?;
        group.members.push(member.clone());
        Ok(member)
    }

    async fn update_member(&self, id: i64, update: &MemberUpdate) -> Result<Member, SyncError> {
        self.enter().await?;
        if update.is_empty() {
            return Err(server_error("No fields provided"));
        }
        let mut state = self.state.lock().unwrap();
        let member = state
            .groups
            .iter_mut()
            .flat_map(|g| g.members.iter_mut())
            .find(|m| m.id == id)
            .ok_or_else(|| server_error("Member not found"))?;
        *member = member.patched(update);
        Ok(member.clone())
    }

    async fn delete_member(&self, id: i64) -> Result<(), SyncError> {
        self.enter().await?;
        let mut state = self.state.lock().unwrap();
        for group in &mut state.groups {
            group.members.retain(|m| m.id != id);
        }
        Ok(())
    }
}

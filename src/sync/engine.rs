//! Optimistic client-side cache of all groups and members.
//!
//! Every mutation runs the same protocol:
//!
//! 1. apply the change to the current snapshot and publish it immediately,
//!    giving new entities a negative placeholder id;
//! 2. call the server and splice its canonical entity into the snapshot;
//! 3. reload the whole snapshot from the server;
//! 4. if the call in step 2 fails, republish the snapshot from before step 1
//!    and return the error. Nothing is retried.
//!
//! Overlapping mutations are not queued. Each one patches whatever snapshot
//! is current when it starts, and the last splice to land wins. A rollback
//! may restore placeholders created by another mutation; those are dropped
//! unless that mutation is still waiting on the server.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::client::RosterApi;
use super::error::SyncError;
use super::snapshot::Snapshot;
use crate::models::{
    normalize_name, rename_value, Group, Member, MemberUpdate, DEFAULT_GROUP_NAME,
    DEFAULT_MEMBER_NAME,
};

/// Default period of the background revalidation.
pub const DEFAULT_REVALIDATE_INTERVAL: Duration = Duration::from_secs(30);

/// What consumers observe: one whole snapshot plus request status.
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    pub snapshot: Arc<Snapshot>,
    /// True while a full reload is in flight.
    pub loading: bool,
    /// Message of the most recent failure, until cleared or superseded by a
    /// successful reload.
    pub last_error: Option<String>,
}

pub struct SyncEngine<A> {
    api: A,
    state: watch::Sender<SyncState>,
    next_sentinel: AtomicI64,
    /// Placeholder ids whose creating call has not returned yet.
    in_flight: Mutex<HashSet<i64>>,
}

impl<A: RosterApi> SyncEngine<A> {
    /// Creates an engine with an empty snapshot. Call [`refresh`] to load.
    ///
    /// [`refresh`]: SyncEngine::refresh
    pub fn new(api: A) -> Self {
        let (state, _) = watch::channel(SyncState::default());
        Self {
            api,
            state,
            next_sentinel: AtomicI64::new(-1),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// The snapshot currently published.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.borrow().snapshot.clone()
    }

    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified every time a new state is published.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.last_error.take().is_some());
    }

    /// Reloads the full snapshot from the server, replacing whatever is
    /// cached. On failure the cached snapshot is kept and the error recorded.
    pub async fn refresh(&self) -> Result<(), SyncError> {
        self.state.send_modify(|s| s.loading = true);

        match self.api.fetch_all().await {
            Ok(groups) => {
                tracing::debug!(groups = groups.len(), "Revalidated snapshot");
                self.state.send_modify(|s| {
                    s.snapshot = Arc::new(Snapshot::new(groups));
                    s.loading = false;
                    s.last_error = None;
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Revalidation failed: {}", e);
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.last_error = Some(e.to_string());
                });
                Err(e)
            }
        }
    }

    pub async fn add_group(&self, name: Option<&str>) -> Result<Group, SyncError> {
        let claim = self.claim_sentinel();
        let sentinel = claim.id;
        let placeholder = Group::new(sentinel, normalize_name(name, DEFAULT_GROUP_NAME));

        self.mutate(
            "add_group",
            |s| s.with_group(placeholder),
            self.api.create_group(name),
            |s, group| s.with_group_replaced(sentinel, group.clone()),
        )
        .await
    }

    pub async fn rename_group(&self, id: i64, name: &str) -> Result<Group, SyncError> {
        let new_name = rename_value(name);

        self.mutate(
            "rename_group",
            |s| match &new_name {
                Some(n) => s.with_group_renamed(id, n),
                None => s.clone(),
            },
            self.api.rename_group(id, name),
            |s, group| s.with_group_renamed(group.id, &group.name),
        )
        .await
    }

    /// Deletes a group; its members disappear from the cache with it.
    pub async fn delete_group(&self, id: i64) -> Result<(), SyncError> {
        self.mutate(
            "delete_group",
            |s| s.without_group(id),
            self.api.delete_group(id),
            |s, _| s.clone(),
        )
        .await
    }

    pub async fn add_member(&self, group_id: i64, name: Option<&str>) -> Result<Member, SyncError> {
        let claim = self.claim_sentinel();
        let sentinel = claim.id;
        let placeholder = Member::new(sentinel, group_id, normalize_name(name, DEFAULT_MEMBER_NAME));

        self.mutate(
            "add_member",
            |s| s.with_member(placeholder),
            self.api.create_member(group_id, name),
            |s, member| s.with_member_replaced(sentinel, member.clone()),
        )
        .await
    }

    /// Applies a partial update to a member. An empty update is rejected
    /// before the cache is touched.
    pub async fn edit_member(
        &self,
        id: i64,
        group_id: i64,
        update: MemberUpdate,
    ) -> Result<Member, SyncError> {
        if update.is_empty() {
            return Err(SyncError::NoFieldsProvided);
        }

        self.mutate(
            "edit_member",
            |s| s.with_member_patched(id, group_id, &update),
            self.api.update_member(id, &update),
            |s, member| s.with_member_replaced(id, member.clone()),
        )
        .await
    }

    pub async fn remove_member(&self, id: i64, group_id: i64) -> Result<(), SyncError> {
        self.mutate(
            "remove_member",
            |s| s.without_member(id, group_id),
            self.api.delete_member(id),
            |s, _| s.clone(),
        )
        .await
    }

    /// Reserves a new placeholder id. It counts as in flight until the
    /// claim is dropped.
    fn claim_sentinel(&self) -> SentinelClaim<'_> {
        let id = self.next_sentinel.fetch_sub(1, Ordering::Relaxed);
        self.in_flight_ids().insert(id);
        SentinelClaim {
            in_flight: &self.in_flight,
            id,
        }
    }

    fn in_flight_ids(&self) -> std::sync::MutexGuard<'_, HashSet<i64>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs one optimistic mutation. `call` is not polled until the
    /// optimistic snapshot has been published.
    async fn mutate<T, Fut>(
        &self,
        op: &'static str,
        optimistic: impl FnOnce(&Snapshot) -> Snapshot,
        call: Fut,
        splice: impl FnOnce(&Snapshot, &T) -> Snapshot,
    ) -> Result<T, SyncError>
    where
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let mut previous: Arc<Snapshot> = Arc::default();
        self.state.send_modify(|s| {
            let next = Arc::new(optimistic(s.snapshot.as_ref()));
            previous = std::mem::replace(&mut s.snapshot, next);
        });

        match call.await {
            Ok(value) => {
                self.state
                    .send_modify(|s| s.snapshot = Arc::new(splice(s.snapshot.as_ref(), &value)));

                // The mutation is committed; a failed reload only leaves the
                // spliced snapshot in place until the next revalidation.
                if let Err(e) = self.refresh().await {
                    tracing::warn!(op, "Reload after commit failed: {}", e);
                }
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(op, "Mutation failed, rolling back: {}", e);
                let restored = if previous.has_sentinels() {
                    let in_flight = self.in_flight_ids().clone();
                    Arc::new(previous.without_sentinels_except(&in_flight))
                } else {
                    previous
                };
                self.state.send_modify(|s| {
                    s.snapshot = restored;
                    s.last_error = Some(e.to_string());
                });
                Err(e)
            }
        }
    }
}

impl<A: RosterApi + 'static> SyncEngine<A> {
    /// Starts background revalidation on a fixed `interval` and whenever
    /// [`RevalidationHandle::focus`] is called. The task stops when the
    /// handle is dropped.
    pub fn spawn_revalidation(self: &Arc<Self>, interval: Duration) -> RevalidationHandle {
        let focus = Arc::new(Notify::new());
        let engine = Arc::clone(self);
        let notified = Arc::clone(&focus);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                let trigger = tokio::select! {
                    _ = ticker.tick() => "interval",
                    _ = notified.notified() => "focus",
                };
                tracing::debug!(trigger, "Revalidating");
                // refresh() records the error in the published state.
                let _ = engine.refresh().await;
            }
        });

        RevalidationHandle { focus, task }
    }
}

struct SentinelClaim<'a> {
    in_flight: &'a Mutex<HashSet<i64>>,
    id: i64,
}

impl Drop for SentinelClaim<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}
/// Owns the background revalidation task.
pub struct RevalidationHandle {
    focus: Arc<Notify>,
    task: JoinHandle<()>,
}

impl RevalidationHandle {
    /// Signals that the consuming surface regained focus.
    pub fn focus(&self) {
        self.focus.notify_one();
    }
}

impl Drop for RevalidationHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

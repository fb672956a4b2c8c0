//! Reconciliation engine: pending optimistic mutations merged with backend truth.
//!
//! # Design
//! - The merged view is computed on demand, never stored, so rollback is just "forget the mutation".
//! - Precedence is optimistic adds, then the backend snapshot, then the baseline; first id wins.
//! - Fetches carry the ticket they were issued with. A confirmed mutation is only released by a
//!   fetch issued after its confirmation, and a fetch older than the applied one is dropped.

use crate::models::{Resource, ResourceId};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Handle addressing one pending mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationHandle(u64);

/// Issue order of a backend fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// What a pending mutation changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationKind {
    /// Show a resource before the backend stores it.
    Add(Resource),
    /// Hide a resource before the backend deletes it.
    Remove(ResourceId),
}

impl MutationKind {
    /// Id the mutation targets.
    #[must_use]
    pub const fn target(&self) -> &ResourceId {
        match self {
            Self::Add(resource) => &resource.id,
            Self::Remove(id) => id,
        }
    }
}

/// Lifecycle of a pending mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationStatus {
    /// Applied locally, awaiting the backend.
    Optimistic,
    /// Acknowledged by the backend, awaiting a fetch that reflects it.
    Confirmed,
    /// Rejected; rolled back.
    Failed,
}

/// Terminal outcome reported by the mutation coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The backend accepted the change.
    Confirmed,
    /// The change failed and must be rolled back.
    Failed,
}

/// In-flight optimistic change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingMutation {
    /// Handle returned to the coordinator.
    pub handle: MutationHandle,
    /// Change being applied.
    pub kind: MutationKind,
    /// Current status.
    pub status: MutationStatus,
    /// Last ticket issued when the backend confirmed the change.
    confirmed_after: u64,
}

/// Owner of the merged resource list.
#[derive(Clone, Debug, Default)]
pub struct ReconciliationEngine {
    baseline: Vec<Resource>,
    snapshot: Vec<Resource>,
    pending: Vec<PendingMutation>,
    dismissed: BTreeSet<ResourceId>,
    next_handle: u64,
    issued: u64,
    applied: u64,
}

impl ReconciliationEngine {
    /// Create an engine over an immutable baseline.
    #[must_use]
    pub fn new(baseline: Vec<Resource>) -> Self {
        Self {
            baseline: dedup_by_id(baseline),
            ..Self::default()
        }
    }

    /// Merged, deduplicated view in display order.
    #[must_use]
    pub fn view(&self) -> Vec<Resource> {
        let removed: HashSet<&ResourceId> = self
            .pending
            .iter()
            .filter_map(|pending| match &pending.kind {
                MutationKind::Remove(id) => Some(id),
                MutationKind::Add(_) => None,
            })
            .collect();
        let snapshot_ids: HashSet<&ResourceId> =
            self.snapshot.iter().map(|resource| &resource.id).collect();

        let adds = self
            .pending
            .iter()
            .rev()
            .filter_map(|pending| match (&pending.kind, pending.status) {
                (MutationKind::Add(resource), MutationStatus::Optimistic) => Some(resource),
                (MutationKind::Add(resource), MutationStatus::Confirmed)
                    if !snapshot_ids.contains(&resource.id) =>
                {
                    Some(resource)
                }
                _ => None,
            });
        let baseline = self
            .baseline
            .iter()
            .filter(|resource| !self.dismissed.contains(&resource.id));

        let mut seen: HashSet<&ResourceId> = HashSet::new();
        adds.chain(self.snapshot.iter())
            .chain(baseline)
            .filter(|resource| !removed.contains(&resource.id))
            .filter(|&resource| seen.insert(&resource.id))
            .cloned()
            .collect()
    }

    /// Look up a resource in the merged view.
    #[must_use]
    pub fn find(&self, id: &ResourceId) -> Option<Resource> {
        self.view().into_iter().find(|resource| &resource.id == id)
    }

    /// Stamp a fetch that is about to be sent.
    pub const fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Replace the backend snapshot with the listing returned for `ticket`.
    ///
    /// Returns the number of confirmed mutations released, or `None` when a
    /// later-issued fetch has already been applied and this one was dropped.
    pub fn apply_fetch(&mut self, ticket: FetchTicket, resources: Vec<Resource>) -> Option<usize> {
        if ticket.0 <= self.applied {
            debug!(ticket = ticket.0, applied = self.applied, "stale fetch dropped");
            return None;
        }
        self.applied = ticket.0;
        self.snapshot = dedup_by_id(resources);
        let released = self.release_confirmed(ticket);
        debug!(
            count = self.snapshot.len(),
            ticket = ticket.0,
            released,
            "backend snapshot replaced"
        );
        Some(released)
    }

    /// Show `resource` immediately.
    pub fn apply_optimistic_add(&mut self, resource: Resource) -> MutationHandle {
        self.push(MutationKind::Add(resource))
    }

    /// Hide `id` immediately.
    pub fn apply_optimistic_remove(&mut self, id: ResourceId) -> MutationHandle {
        self.push(MutationKind::Remove(id))
    }

    /// Swap an optimistic add's placeholder for the backend record.
    ///
    /// Returns `false` when the handle is unknown or not an add.
    pub fn rebind(&mut self, handle: MutationHandle, resource: Resource) -> bool {
        let Some(pending) = self.pending_mut(handle) else {
            return false;
        };
        match &mut pending.kind {
            MutationKind::Add(current) => {
                *current = resource;
                true
            }
            MutationKind::Remove(_) => false,
        }
    }

    /// Settle a mutation, returning the status it settled into.
    ///
    /// `None` means the handle is unknown (already resolved or never issued).
    pub fn resolve(&mut self, handle: MutationHandle, outcome: Outcome) -> Option<MutationStatus> {
        let index = self.position(handle)?;
        match outcome {
            Outcome::Failed => {
                let rolled_back = self.pending.remove(index);
                debug!(target_id = %rolled_back.kind.target(), "optimistic mutation rolled back");
                Some(MutationStatus::Failed)
            }
            Outcome::Confirmed => {
                self.confirm(index);
                Some(MutationStatus::Confirmed)
            }
        }
    }

    /// Pending mutations in application order.
    #[must_use]
    pub fn pending(&self) -> &[PendingMutation] {
        &self.pending
    }

    /// Status of a tracked mutation.
    #[must_use]
    pub fn status(&self, handle: MutationHandle) -> Option<MutationStatus> {
        self.pending
            .iter()
            .find(|pending| pending.handle == handle)
            .map(|pending| pending.status)
    }

    fn confirm(&mut self, index: usize) {
        let issued = self.issued;
        let pending = &mut self.pending[index];
        pending.status = MutationStatus::Confirmed;
        pending.confirmed_after = issued;
        let handle = pending.handle;
        match pending.kind.clone() {
            MutationKind::Add(resource) => {
                if self.snapshot.iter().any(|known| known.id == resource.id) {
                    self.pending.remove(index);
                }
            }
            MutationKind::Remove(id) => {
                self.snapshot.retain(|resource| resource.id != id);
                self.pending.retain(|other| {
                    !(other.status == MutationStatus::Confirmed
                        && matches!(&other.kind, MutationKind::Add(resource) if resource.id == id))
                });
                if self.baseline.iter().any(|resource| resource.id == id) {
                    self.pending.retain(|other| other.handle != handle);
                    self.dismissed.insert(id);
                }
            }
        }
    }

    /// Drop confirmed mutations that the fetch for `ticket` reflects.
    fn release_confirmed(&mut self, ticket: FetchTicket) -> usize {
        let snapshot_ids: HashSet<&ResourceId> =
            self.snapshot.iter().map(|resource| &resource.id).collect();
        let before = self.pending.len();
        self.pending.retain(|pending| {
            if pending.status != MutationStatus::Confirmed {
                return true;
            }
            let absorbed = match &pending.kind {
                MutationKind::Add(resource) => snapshot_ids.contains(&resource.id),
                MutationKind::Remove(_) => false,
            };
            !(absorbed || ticket.0 > pending.confirmed_after)
        });
        before - self.pending.len()
    }

    fn push(&mut self, kind: MutationKind) -> MutationHandle {
        let handle = MutationHandle(self.next_handle);
        self.next_handle += 1;
        debug!(target_id = %kind.target(), ?handle, "optimistic mutation applied");
        self.pending.push(PendingMutation {
            handle,
            kind,
            status: MutationStatus::Optimistic,
            confirmed_after: 0,
        });
        handle
    }

    fn position(&self, handle: MutationHandle) -> Option<usize> {
        self.pending
            .iter()
            .position(|pending| pending.handle == handle)
    }

    fn pending_mut(&mut self, handle: MutationHandle) -> Option<&mut PendingMutation> {
        self.pending
            .iter_mut()
            .find(|pending| pending.handle == handle)
    }
}

fn dedup_by_id(resources: Vec<Resource>) -> Vec<Resource> {
    let mut seen = HashSet::new();
    resources
        .into_iter()
        .filter(|resource| seen.insert(resource.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploaded(id: &str) -> Resource {
        Resource::uploaded(id, format!("Doc {id}"))
    }

    fn baseline(id: &str) -> Resource {
        Resource::baseline(id, format!("Base {id}"), "")
    }

    fn ids(engine: &ReconciliationEngine) -> Vec<String> {
        engine
            .view()
            .into_iter()
            .map(|resource| resource.id.to_string())
            .collect()
    }

    fn fetch(engine: &mut ReconciliationEngine, resources: Vec<Resource>) -> Option<usize> {
        let ticket = engine.begin_fetch();
        engine.apply_fetch(ticket, resources)
    }

    #[test]
    fn view_is_idempotent() {
        let mut engine = ReconciliationEngine::new(vec![baseline("1"), baseline("2")]);
        fetch(&mut engine, vec![uploaded("u1")]);
        engine.apply_optimistic_add(uploaded("u2"));
        assert_eq!(engine.view(), engine.view());
    }

    #[test]
    fn optimistic_add_wins_over_backend_copy() {
        let mut engine = ReconciliationEngine::default();
        let mut local = uploaded("x");
        local.title = "Local".into();
        engine.apply_optimistic_add(local);
        fetch(&mut engine, vec![uploaded("a"), uploaded("x")]);

        let view = engine.view();
        let matches: Vec<_> = view.iter().filter(|r| r.id.as_str() == "x").collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].title, "Local");
        assert_eq!(ids(&engine), vec!["x", "a"]);
    }

    #[test]
    fn newest_optimistic_add_is_listed_first() {
        let mut engine = ReconciliationEngine::new(vec![baseline("1")]);
        engine.apply_optimistic_add(uploaded("a"));
        engine.apply_optimistic_add(uploaded("b"));
        assert_eq!(ids(&engine), vec!["b", "a", "1"]);
    }

    #[test]
    fn failed_remove_restores_original_order() {
        let mut engine = ReconciliationEngine::new(vec![baseline("A"), baseline("B")]);
        let handle = engine.apply_optimistic_remove(ResourceId::new("A"));
        assert_eq!(ids(&engine), vec!["B"]);
        assert_eq!(
            engine.resolve(handle, Outcome::Failed),
            Some(MutationStatus::Failed)
        );
        assert_eq!(ids(&engine), vec!["A", "B"]);
        assert!(engine.pending().is_empty());
    }

    #[test]
    fn add_fetch_confirm_scenario_has_no_duplicates() {
        let mut engine = ReconciliationEngine::new(vec![uploaded("1"), uploaded("2")]);
        let handle = engine.apply_optimistic_add(uploaded("3"));
        assert_eq!(ids(&engine), vec!["3", "1", "2"]);

        fetch(&mut engine, vec![uploaded("3"), uploaded("1"), uploaded("2")]);
        assert_eq!(
            engine.resolve(handle, Outcome::Confirmed),
            Some(MutationStatus::Confirmed)
        );
        assert_eq!(ids(&engine), vec!["3", "1", "2"]);
        assert!(engine.pending().is_empty());
    }

    #[test]
    fn confirmed_add_stays_visible_until_a_later_fetch() {
        let mut engine = ReconciliationEngine::default();
        let handle = engine.apply_optimistic_add(uploaded("n"));
        engine.resolve(handle, Outcome::Confirmed);
        assert_eq!(engine.status(handle), Some(MutationStatus::Confirmed));
        assert_eq!(ids(&engine), vec!["n"]);

        assert_eq!(fetch(&mut engine, vec![uploaded("n"), uploaded("o")]), Some(1));
        assert_eq!(ids(&engine), vec!["n", "o"]);
        assert!(engine.pending().is_empty());
    }

    #[test]
    fn fetch_issued_before_confirmation_keeps_the_add() {
        let mut engine = ReconciliationEngine::default();
        let handle = engine.apply_optimistic_add(uploaded("n"));
        let in_flight = engine.begin_fetch();
        engine.resolve(handle, Outcome::Confirmed);

        assert_eq!(engine.apply_fetch(in_flight, Vec::new()), Some(0));
        assert_eq!(ids(&engine), vec!["n"]);
        assert_eq!(engine.status(handle), Some(MutationStatus::Confirmed));

        assert_eq!(fetch(&mut engine, vec![uploaded("n")]), Some(1));
        assert_eq!(ids(&engine), vec!["n"]);
    }

    #[test]
    fn out_of_order_fetch_is_dropped() {
        let mut engine = ReconciliationEngine::default();
        let older = engine.begin_fetch();
        let newer = engine.begin_fetch();
        assert_eq!(engine.apply_fetch(newer, vec![uploaded("fresh")]), Some(0));
        assert_eq!(engine.apply_fetch(older, vec![uploaded("stale")]), None);
        assert_eq!(ids(&engine), vec!["fresh"]);
    }

    #[test]
    fn fetch_does_not_evict_unresolved_mutations() {
        let mut engine = ReconciliationEngine::default();
        fetch(&mut engine, vec![uploaded("keep"), uploaded("gone")]);
        let add = engine.apply_optimistic_add(uploaded("new"));
        let remove = engine.apply_optimistic_remove(ResourceId::new("gone"));

        assert_eq!(
            fetch(&mut engine, vec![uploaded("keep"), uploaded("gone")]),
            Some(0)
        );
        assert_eq!(ids(&engine), vec!["new", "keep"]);
        assert_eq!(engine.status(add), Some(MutationStatus::Optimistic));
        assert_eq!(engine.status(remove), Some(MutationStatus::Optimistic));
    }

    #[test]
    fn confirmed_removes_hide_until_a_later_fetch() {
        let mut engine = ReconciliationEngine::new(vec![baseline("b1")]);
        fetch(&mut engine, vec![uploaded("u1"), uploaded("u2")]);
        let in_flight = engine.begin_fetch();
        let backend = engine.apply_optimistic_remove(ResourceId::new("u1"));
        let local = engine.apply_optimistic_remove(ResourceId::new("b1"));
        engine.resolve(backend, Outcome::Confirmed);
        engine.resolve(local, Outcome::Confirmed);

        assert_eq!(engine.pending().len(), 1);
        assert_eq!(ids(&engine), vec!["u2"]);

        assert_eq!(
            engine.apply_fetch(in_flight, vec![uploaded("u1"), uploaded("u2")]),
            Some(0)
        );
        assert_eq!(ids(&engine), vec!["u2"]);

        assert_eq!(fetch(&mut engine, vec![uploaded("u2")]), Some(1));
        assert!(engine.pending().is_empty());
        assert_eq!(ids(&engine), vec!["u2"]);
    }

    #[test]
    fn confirmed_remove_drops_confirmed_add_of_same_id() {
        let mut engine = ReconciliationEngine::new(vec![baseline("b1")]);
        let add = engine.apply_optimistic_add(uploaded("srv-1"));
        engine.resolve(add, Outcome::Confirmed);
        let remove = engine.apply_optimistic_remove(ResourceId::new("srv-1"));
        engine.resolve(remove, Outcome::Confirmed);

        assert_eq!(engine.status(add), None);
        assert_eq!(ids(&engine), vec!["b1"]);

        assert_eq!(fetch(&mut engine, Vec::new()), Some(1));
        assert_eq!(ids(&engine), vec!["b1"]);
        assert!(engine.pending().is_empty());
    }

    #[test]
    fn resolution_order_is_independent() {
        let run = |first_then_second: bool| {
            let mut engine = ReconciliationEngine::new(vec![baseline("1"), baseline("2")]);
            let a = engine.apply_optimistic_add(uploaded("a"));
            let r = engine.apply_optimistic_remove(ResourceId::new("1"));
            if first_then_second {
                engine.resolve(a, Outcome::Failed);
                engine.resolve(r, Outcome::Confirmed);
            } else {
                engine.resolve(r, Outcome::Confirmed);
                engine.resolve(a, Outcome::Failed);
            }
            ids(&engine)
        };
        assert_eq!(run(true), run(false));
        assert_eq!(run(true), vec!["2"]);
    }

    #[test]
    fn rebind_replaces_placeholder() {
        let mut engine = ReconciliationEngine::default();
        let placeholder = Resource::placeholder("report.pdf", 10, 0);
        let handle = engine.apply_optimistic_add(placeholder);
        assert!(engine.rebind(handle, uploaded("srv-1")));
        assert_eq!(ids(&engine), vec!["srv-1"]);

        let remove = engine.apply_optimistic_remove(ResourceId::new("srv-1"));
        assert!(!engine.rebind(remove, uploaded("zzz")));
        assert_eq!(engine.resolve(MutationHandle(99), Outcome::Failed), None);
    }

    #[test]
    fn fetch_payload_duplicates_keep_first() {
        let mut engine = ReconciliationEngine::default();
        let mut second = uploaded("dup");
        second.title = "Second".into();
        fetch(&mut engine, vec![uploaded("dup"), second]);
        let view = engine.view();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].title, "Doc dup");
        assert_eq!(
            engine.find(&ResourceId::new("dup")).map(|r| r.title),
            Some("Doc dup".to_string())
        );
    }
}

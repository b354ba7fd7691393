//! Per-unit status snapshots and tag-scoped observation.
//!
//! The tracker is the runtime's queryable record: one [`WorkInfo`] per
//! registered request, indexed by id, chain name, and tag. Tag observers
//! get a `watch` channel carrying the latest snapshot list — push-style,
//! latest-value-only, so an observer processes at most one in-flight
//! notification at a time.

use std::collections::{HashMap, HashSet};

use blurmill_core::data::InputData;
use blurmill_core::request::{RequestId, WorkRequest, WorkerKind};
use blurmill_core::status::{state_machine, WorkStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};

/// Observable snapshot of a single work unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkInfo {
    pub id: RequestId,
    /// Unique chain name the request was enqueued under.
    pub chain: String,
    pub kind: WorkerKind,
    pub status: WorkStatus,
    pub tags: Vec<String>,
    /// Output bag; populated when the unit succeeds.
    pub output: InputData,
}

#[derive(Default)]
struct TrackerInner {
    records: HashMap<RequestId, WorkInfo>,
    /// Request ids per tag, in enqueue order.
    by_tag: HashMap<String, Vec<RequestId>>,
    /// Request ids per chain name, in enqueue order.
    by_chain: HashMap<String, Vec<RequestId>>,
    /// Latest-value fan-out per tag; created lazily on first watch.
    watchers: HashMap<String, watch::Sender<Vec<WorkInfo>>>,
}

/// Snapshot store shared between the registry and the chain tasks.
#[derive(Default)]
pub(crate) struct StatusTracker {
    inner: RwLock<TrackerInner>,
}

impl StatusTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a fresh chain's requests as `Enqueued`.
    ///
    /// Any prior records under the same chain name are dropped first: the
    /// new chain supersedes them, so tag lists never mix units from two
    /// generations of the same name.
    pub(crate) async fn begin_chain(&self, chain: &str, requests: &[WorkRequest]) {
        let mut inner = self.inner.write().await;

        let mut touched = remove_chain_records(&mut inner, chain);

        for request in requests {
            let info = WorkInfo {
                id: request.id,
                chain: chain.to_string(),
                kind: request.kind,
                status: WorkStatus::Enqueued,
                tags: request.tags.clone(),
                output: InputData::default(),
            };
            inner.records.insert(request.id, info);
            inner
                .by_chain
                .entry(chain.to_string())
                .or_default()
                .push(request.id);
            for tag in &request.tags {
                inner.by_tag.entry(tag.clone()).or_default().push(request.id);
                touched.insert(tag.clone());
            }
        }

        notify_tags(&inner, &touched);
    }

    /// Move a unit into `to`, recording `output` when provided.
    ///
    /// Returns the updated snapshot, or `None` when the unit is unknown
    /// (evicted) or the transition is not allowed by the state machine —
    /// a terminal unit never transitions again.
    pub(crate) async fn transition(
        &self,
        id: RequestId,
        to: WorkStatus,
        output: Option<InputData>,
    ) -> Option<WorkInfo> {
        let mut inner = self.inner.write().await;

        let record = inner.records.get_mut(&id)?;
        if state_machine::validate_transition(record.status, to).is_err() {
            return None;
        }
        record.status = to;
        if let Some(output) = output {
            record.output = output;
        }
        let info = record.clone();

        let touched: HashSet<String> = info.tags.iter().cloned().collect();
        notify_tags(&inner, &touched);
        Some(info)
    }

    /// Watch the snapshot list for `tag`, ordered by enqueue time.
    ///
    /// The receiver immediately holds the current list (empty when no
    /// request carries the tag yet).
    pub(crate) async fn watch_tag(&self, tag: &str) -> watch::Receiver<Vec<WorkInfo>> {
        let mut inner = self.inner.write().await;
        if let Some(tx) = inner.watchers.get(tag) {
            return tx.subscribe();
        }
        let initial = tag_list(&inner, tag);
        let (tx, rx) = watch::channel(initial);
        inner.watchers.insert(tag.to_string(), tx);
        rx
    }

    /// Current snapshot for a single request.
    pub(crate) async fn snapshot(&self, id: RequestId) -> Option<WorkInfo> {
        self.inner.read().await.records.get(&id).cloned()
    }

    /// Snapshots of every request under `chain`, in enqueue order.
    pub(crate) async fn chain_snapshots(&self, chain: &str) -> Vec<WorkInfo> {
        let inner = self.inner.read().await;
        inner
            .by_chain
            .get(chain)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.records.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Drop every record belonging to `chain`, returning the tags touched.
fn remove_chain_records(inner: &mut TrackerInner, chain: &str) -> HashSet<String> {
    let mut touched = HashSet::new();
    let Some(ids) = inner.by_chain.remove(chain) else {
        return touched;
    };
    for id in ids {
        if let Some(info) = inner.records.remove(&id) {
            for tag in info.tags {
                if let Some(list) = inner.by_tag.get_mut(&tag) {
                    list.retain(|existing| *existing != id);
                }
                touched.insert(tag);
            }
        }
    }
    touched
}

/// Push the rebuilt list for every touched tag that has a watcher.
fn notify_tags(inner: &TrackerInner, tags: &HashSet<String>) {
    for tag in tags {
        if let Some(tx) = inner.watchers.get(tag) {
            tx.send_replace(tag_list(inner, tag));
        }
    }
}

fn tag_list(inner: &TrackerInner, tag: &str) -> Vec<WorkInfo> {
    inner
        .by_tag
        .get(tag)
        .map(|ids| {
            ids.iter()
                .filter_map(|id| inner.records.get(id).cloned())
                .collect()
        })
        .unwrap_or_default()
}

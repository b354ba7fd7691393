//! Unique-name chain registry and sequential executor.
//!
//! [`ChainRuntime`] owns the worker registry, the unique-name table, and
//! the status tracker. Enqueueing spawns one tokio task per chain which
//! executes its units strictly in order, feeds each unit's output into
//! the next unit's input, and publishes every status transition on the
//! [`StatusBus`].
//!
//! At most one non-terminal chain exists per unique name; the policy on
//! conflict is decided by [`ExistingChainPolicy`] under the registry
//! lock, never by the caller.

use std::collections::HashMap;
use std::sync::Arc;

use blurmill_core::data::InputData;
use blurmill_core::request::{RequestId, WorkRequest, WorkerKind};
use blurmill_core::status::WorkStatus;
use blurmill_core::validation::{validate_chain_name, validate_tag};
use blurmill_events::{StatusBus, StatusEvent};
use tokio::sync::{broadcast, watch, RwLock};
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;
use crate::tracker::{StatusTracker, WorkInfo};
use crate::worker::{WorkContext, Worker};

/// What to do when a chain is enqueued under a name that is still active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingChainPolicy {
    /// Cancel and evict the active chain, then enqueue the new one.
    Replace,
    /// Leave the active chain running and drop the new request list.
    Keep,
}

/// Handle to an enqueued chain.
#[derive(Debug, Clone)]
pub struct ChainHandle {
    pub name: String,
    /// Ids of the chain's requests, in execution order.
    pub request_ids: Vec<RequestId>,
}

/// Internal bookkeeping for one chain under a unique name.
struct ActiveChain {
    request_ids: Vec<RequestId>,
    task_handle: tokio::task::JoinHandle<()>,
    /// Per-chain cancellation token (child of the master token).
    cancel: CancellationToken,
}

/// Named-chain execution engine.
///
/// Created once via [`ChainRuntime::builder`] and shared as an `Arc`.
pub struct ChainRuntime {
    /// Registered workers, fixed at construction.
    workers: Arc<HashMap<WorkerKind, Arc<dyn Worker>>>,
    /// Chains indexed by unique name.
    chains: RwLock<HashMap<String, ActiveChain>>,
    tracker: Arc<StatusTracker>,
    bus: Arc<StatusBus>,
    /// Master cancellation token -- cancelled during shutdown.
    cancel: CancellationToken,
}

impl ChainRuntime {
    /// Start building a runtime; register one worker per kind, then `build`.
    pub fn builder() -> ChainRuntimeBuilder {
        ChainRuntimeBuilder {
            workers: HashMap::new(),
            bus_capacity: None,
        }
    }

    /// Enqueue an ordered chain of requests under `name`.
    ///
    /// Validates the name, rejects empty chains and unregistered worker
    /// kinds, applies `policy` to any chain still active under the name,
    /// registers every request as `Enqueued`, and spawns the chain task.
    pub async fn enqueue_unique(
        &self,
        name: &str,
        policy: ExistingChainPolicy,
        requests: Vec<WorkRequest>,
    ) -> Result<ChainHandle, RuntimeError> {
        validate_chain_name(name)?;
        if requests.is_empty() {
            return Err(RuntimeError::EmptyChain);
        }
        for request in &requests {
            if !self.workers.contains_key(&request.kind) {
                return Err(RuntimeError::UnknownWorker(request.kind));
            }
            for tag in &request.tags {
                validate_tag(tag)?;
            }
        }

        let mut chains = self.chains.write().await;

        if let Some(prev) = chains.remove(name) {
            if !prev.task_handle.is_finished() {
                match policy {
                    ExistingChainPolicy::Keep => {
                        let handle = ChainHandle {
                            name: name.to_string(),
                            request_ids: prev.request_ids.clone(),
                        };
                        chains.insert(name.to_string(), prev);
                        tracing::debug!(chain = name, "Existing chain kept, new requests dropped");
                        return Ok(handle);
                    }
                    ExistingChainPolicy::Replace => {
                        self.cancel_chain(name, &prev).await;
                    }
                }
            }
            // A terminal chain is inert; its table entry is simply dropped.
        }

        self.tracker.begin_chain(name, &requests).await;
        for request in &requests {
            self.bus.publish(
                StatusEvent::new(name, request.id, request.kind, WorkStatus::Enqueued)
                    .with_tags(request.tags.clone()),
            );
        }

        let cancel = self.cancel.child_token();
        let request_ids: Vec<RequestId> = requests.iter().map(|r| r.id).collect();

        tracing::info!(chain = name, units = requests.len(), "Chain enqueued");

        let task_handle = tokio::spawn(run_chain(
            name.to_string(),
            requests,
            Arc::clone(&self.workers),
            Arc::clone(&self.tracker),
            Arc::clone(&self.bus),
            cancel.clone(),
        ));

        chains.insert(
            name.to_string(),
            ActiveChain {
                request_ids: request_ids.clone(),
                task_handle,
                cancel,
            },
        );

        Ok(ChainHandle {
            name: name.to_string(),
            request_ids,
        })
    }

    /// Cancel the chain under `name`, if one is active.
    ///
    /// Cooperative and coarse: the current unit stops at its next
    /// cancellation check and every not-yet-terminal unit is marked
    /// `Cancelled`. Cancelling an unknown or terminal name is a no-op.
    pub async fn cancel_unique(&self, name: &str) {
        let chains = self.chains.read().await;
        if let Some(active) = chains.get(name) {
            self.cancel_chain(name, active).await;
        }
    }

    /// True while a chain under `name` has not reached a terminal state.
    pub async fn is_active(&self, name: &str) -> bool {
        self.chains
            .read()
            .await
            .get(name)
            .map(|chain| !chain.task_handle.is_finished())
            .unwrap_or(false)
    }

    /// Watch the snapshot list for `tag`, ordered by enqueue time.
    pub async fn watch_tag(&self, tag: &str) -> watch::Receiver<Vec<WorkInfo>> {
        self.tracker.watch_tag(tag).await
    }

    /// Subscribe to every status transition.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.bus.subscribe()
    }

    /// Current snapshot for a single request.
    pub async fn snapshot(&self, id: RequestId) -> Option<WorkInfo> {
        self.tracker.snapshot(id).await
    }

    /// Snapshots of the current chain under `name`, in execution order.
    pub async fn chain_snapshots(&self, name: &str) -> Vec<WorkInfo> {
        self.tracker.chain_snapshots(name).await
    }

    /// Cancel every active chain. Called during application shutdown.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let chains = self.chains.read().await;
        for (name, chain) in chains.iter() {
            if !chain.task_handle.is_finished() {
                self.cancel_chain(name, chain).await;
            }
        }
    }

    async fn cancel_chain(&self, name: &str, chain: &ActiveChain) {
        chain.cancel.cancel();
        for id in &chain.request_ids {
            if let Some(info) = self
                .tracker
                .transition(*id, WorkStatus::Cancelled, None)
                .await
            {
                self.bus.publish(event_from(&info));
            }
        }
        tracing::info!(chain = name, "Chain cancelled");
    }
}

/// Builder for [`ChainRuntime`].
pub struct ChainRuntimeBuilder {
    workers: HashMap<WorkerKind, Arc<dyn Worker>>,
    bus_capacity: Option<usize>,
}

impl ChainRuntimeBuilder {
    /// Register the worker dispatched for `kind`.
    pub fn register(mut self, kind: WorkerKind, worker: Arc<dyn Worker>) -> Self {
        self.workers.insert(kind, worker);
        self
    }

    /// Override the status bus capacity.
    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = Some(capacity);
        self
    }

    /// Finish the runtime. The worker set is fixed from here on.
    pub fn build(self) -> Arc<ChainRuntime> {
        let bus = match self.bus_capacity {
            Some(capacity) => StatusBus::new(capacity),
            None => StatusBus::default(),
        };
        Arc::new(ChainRuntime {
            workers: Arc::new(self.workers),
            chains: RwLock::new(HashMap::new()),
            tracker: Arc::new(StatusTracker::new()),
            bus: Arc::new(bus),
            cancel: CancellationToken::new(),
        })
    }
}

/// Execute one chain's units strictly in order.
///
/// Cancellation is observed at unit boundaries and at the running unit's
/// await points; a failed unit marks every dependent unit `Failed`
/// without running it.
async fn run_chain(
    chain: String,
    requests: Vec<WorkRequest>,
    workers: Arc<HashMap<WorkerKind, Arc<dyn Worker>>>,
    tracker: Arc<StatusTracker>,
    bus: Arc<StatusBus>,
    cancel: CancellationToken,
) {
    let mut carried = InputData::default();
    let mut aborted = false;

    for request in requests {
        if cancel.is_cancelled() {
            mark(&tracker, &bus, request.id, WorkStatus::Cancelled, None).await;
            continue;
        }
        if aborted {
            mark(&tracker, &bus, request.id, WorkStatus::Failed, None).await;
            continue;
        }

        let Some(worker) = workers.get(&request.kind) else {
            mark(&tracker, &bus, request.id, WorkStatus::Failed, None).await;
            aborted = true;
            continue;
        };

        if mark(&tracker, &bus, request.id, WorkStatus::Running, None)
            .await
            .is_none()
        {
            // Evicted while waiting for its turn.
            continue;
        }
        tracing::info!(
            chain = %chain,
            request_id = %request.id,
            kind = %request.kind,
            "Work unit started",
        );

        let input = request.input.merged_with(&carried);
        let ctx = WorkContext::new(input, cancel.clone());
        let worker = Arc::clone(worker);

        let result = tokio::select! {
            _ = cancel.cancelled() => None,
            result = worker.execute(ctx) => Some(result),
        };

        match result {
            None => {
                mark(&tracker, &bus, request.id, WorkStatus::Cancelled, None).await;
                tracing::info!(chain = %chain, request_id = %request.id, "Work unit cancelled");
            }
            Some(Ok(output)) => {
                carried = output.clone();
                mark(
                    &tracker,
                    &bus,
                    request.id,
                    WorkStatus::Succeeded,
                    Some(output),
                )
                .await;
                tracing::info!(
                    chain = %chain,
                    request_id = %request.id,
                    kind = %request.kind,
                    "Work unit succeeded",
                );
            }
            Some(Err(e)) => {
                tracing::error!(
                    chain = %chain,
                    request_id = %request.id,
                    kind = %request.kind,
                    error = %e,
                    "Work unit failed",
                );
                mark(&tracker, &bus, request.id, WorkStatus::Failed, None).await;
                aborted = true;
            }
        }
    }

    tracing::debug!(chain = %chain, "Chain task finished");
}

/// Apply a transition and publish it; `None` when the unit was evicted
/// or is already terminal.
async fn mark(
    tracker: &StatusTracker,
    bus: &StatusBus,
    id: RequestId,
    status: WorkStatus,
    output: Option<InputData>,
) -> Option<WorkInfo> {
    let info = tracker.transition(id, status, output).await?;
    bus.publish(event_from(&info));
    Some(info)
}

fn event_from(info: &WorkInfo) -> StatusEvent {
    StatusEvent::new(info.chain.clone(), info.id, info.kind, info.status)
        .with_tags(info.tags.clone())
        .with_output(info.output.clone())
}

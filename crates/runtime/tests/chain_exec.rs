//! End-to-end chain runtime behavior.
//!
//! Exercises ordered execution, output chaining, failure abort, the
//! replace/keep policies, cooperative cancellation, and tag observation
//! against stub workers.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use blurmill_core::data::InputData;
use blurmill_core::request::{RequestId, WorkRequest, WorkerKind};
use blurmill_core::status::WorkStatus;
use blurmill_runtime::{
    ChainRuntime, ExistingChainPolicy, RuntimeError, WorkContext, Worker, WorkerError,
};
use tokio::sync::Mutex;

const CHAIN_NAME: &str = "image_manipulation_work";

/// Stub worker: sleeps, records its run, echoes a configured output bag.
struct StubWorker {
    label: &'static str,
    log: Arc<Mutex<Vec<String>>>,
    output: InputData,
    delay: Duration,
    fail: bool,
}

impl StubWorker {
    fn new(label: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            label,
            log: Arc::clone(log),
            output: InputData::default(),
            delay: Duration::ZERO,
            fail: false,
        }
    }

    fn output(mut self, output: InputData) -> Self {
        self.output = output;
        self
    }

    fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait::async_trait]
impl Worker for StubWorker {
    async fn execute(&self, ctx: WorkContext) -> Result<InputData, WorkerError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let carry = ctx.input().get_str("carry").unwrap_or("-").to_string();
        self.log.lock().await.push(format!("{}:{carry}", self.label));
        if self.fail {
            return Err(WorkerError::Failed("stub failure".into()));
        }
        Ok(self.output.clone())
    }
}

fn carry(value: &str) -> InputData {
    InputData::builder().put_str("carry", value).build()
}

fn chain_requests() -> Vec<WorkRequest> {
    vec![
        WorkRequest::from_kind(WorkerKind::Cleanup),
        WorkRequest::from_kind(WorkerKind::Blur),
        WorkRequest::builder(WorkerKind::Save).tag("OUTPUT").build(),
    ]
}

async fn wait_terminal(runtime: &ChainRuntime, name: &str) {
    for _ in 0..500 {
        if !runtime.is_active(name).await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("chain {name} did not reach a terminal state in time");
}

async fn wait_status(runtime: &ChainRuntime, id: RequestId, status: WorkStatus) {
    for _ in 0..500 {
        if runtime.snapshot(id).await.map(|info| info.status) == Some(status) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("request {id} did not reach {status} in time");
}

// ---------------------------------------------------------------------------
// Ordered execution and output chaining
// ---------------------------------------------------------------------------

#[tokio::test]
async fn chain_executes_units_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let runtime = ChainRuntime::builder()
        .register(WorkerKind::Cleanup, Arc::new(StubWorker::new("cleanup", &log)))
        .register(WorkerKind::Blur, Arc::new(StubWorker::new("blur", &log)))
        .register(WorkerKind::Save, Arc::new(StubWorker::new("save", &log)))
        .build();

    let handle = runtime
        .enqueue_unique(CHAIN_NAME, ExistingChainPolicy::Replace, chain_requests())
        .await
        .expect("enqueue should succeed");
    wait_terminal(&runtime, CHAIN_NAME).await;

    let entries = log.lock().await.clone();
    assert_eq!(entries, vec!["cleanup:-", "blur:-", "save:-"]);

    for id in handle.request_ids {
        let info = runtime.snapshot(id).await.expect("snapshot should exist");
        assert_eq!(info.status, WorkStatus::Succeeded);
    }
}

#[tokio::test]
async fn output_bag_flows_into_the_next_unit() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let runtime = ChainRuntime::builder()
        .register(
            WorkerKind::Cleanup,
            Arc::new(StubWorker::new("cleanup", &log).output(carry("c1"))),
        )
        .register(
            WorkerKind::Blur,
            Arc::new(StubWorker::new("blur", &log).output(carry("c2"))),
        )
        .register(WorkerKind::Save, Arc::new(StubWorker::new("save", &log)))
        .build();

    runtime
        .enqueue_unique(CHAIN_NAME, ExistingChainPolicy::Replace, chain_requests())
        .await
        .expect("enqueue should succeed");
    wait_terminal(&runtime, CHAIN_NAME).await;

    let entries = log.lock().await.clone();
    assert_eq!(entries, vec!["cleanup:-", "blur:c1", "save:c2"]);
}

#[tokio::test]
async fn upstream_output_overrides_declared_input() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let runtime = ChainRuntime::builder()
        .register(
            WorkerKind::Cleanup,
            Arc::new(StubWorker::new("cleanup", &log).output(carry("upstream"))),
        )
        .register(WorkerKind::Blur, Arc::new(StubWorker::new("blur", &log)))
        .build();

    let requests = vec![
        WorkRequest::from_kind(WorkerKind::Cleanup),
        WorkRequest::builder(WorkerKind::Blur)
            .input(carry("declared"))
            .build(),
    ];
    runtime
        .enqueue_unique(CHAIN_NAME, ExistingChainPolicy::Replace, requests)
        .await
        .expect("enqueue should succeed");
    wait_terminal(&runtime, CHAIN_NAME).await;

    let entries = log.lock().await.clone();
    assert_eq!(entries, vec!["cleanup:-", "blur:upstream"]);
}

#[tokio::test]
async fn declared_input_reaches_first_unit_that_carries_it() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let runtime = ChainRuntime::builder()
        .register(WorkerKind::Blur, Arc::new(StubWorker::new("blur", &log)))
        .build();

    let requests = vec![WorkRequest::builder(WorkerKind::Blur)
        .input(carry("declared"))
        .build()];
    runtime
        .enqueue_unique(CHAIN_NAME, ExistingChainPolicy::Replace, requests)
        .await
        .expect("enqueue should succeed");
    wait_terminal(&runtime, CHAIN_NAME).await;

    let entries = log.lock().await.clone();
    assert_eq!(entries, vec!["blur:declared"]);
}

// ---------------------------------------------------------------------------
// Failure abort
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_unit_aborts_dependents() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let runtime = ChainRuntime::builder()
        .register(WorkerKind::Cleanup, Arc::new(StubWorker::new("cleanup", &log)))
        .register(
            WorkerKind::Blur,
            Arc::new(StubWorker::new("blur", &log).failing()),
        )
        .register(WorkerKind::Save, Arc::new(StubWorker::new("save", &log)))
        .build();

    let handle = runtime
        .enqueue_unique(CHAIN_NAME, ExistingChainPolicy::Replace, chain_requests())
        .await
        .expect("enqueue should succeed");
    wait_terminal(&runtime, CHAIN_NAME).await;

    // The save unit never ran.
    let entries = log.lock().await.clone();
    assert_eq!(entries, vec!["cleanup:-", "blur:-"]);

    let statuses: Vec<WorkStatus> = runtime
        .chain_snapshots(CHAIN_NAME)
        .await
        .into_iter()
        .map(|info| info.status)
        .collect();
    assert_eq!(
        statuses,
        vec![WorkStatus::Succeeded, WorkStatus::Failed, WorkStatus::Failed]
    );
    assert_eq!(handle.request_ids.len(), 3);
}

// ---------------------------------------------------------------------------
// Unique-name policies
// ---------------------------------------------------------------------------

#[tokio::test]
async fn replace_policy_evicts_the_active_chain() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let runtime = ChainRuntime::builder()
        .register(WorkerKind::Cleanup, Arc::new(StubWorker::new("cleanup", &log)))
        .register(
            WorkerKind::Blur,
            Arc::new(StubWorker::new("blur", &log).delay(Duration::from_secs(30))),
        )
        .register(WorkerKind::Save, Arc::new(StubWorker::new("save", &log)))
        .build();

    let first = runtime
        .enqueue_unique(CHAIN_NAME, ExistingChainPolicy::Replace, chain_requests())
        .await
        .expect("first enqueue should succeed");
    // Let the first chain get stuck inside its slow blur unit.
    wait_status(&runtime, first.request_ids[1], WorkStatus::Running).await;

    let mut events = runtime.subscribe();

    let second_requests = vec![
        WorkRequest::from_kind(WorkerKind::Cleanup),
        WorkRequest::builder(WorkerKind::Save).tag("OUTPUT").build(),
    ];
    let second = runtime
        .enqueue_unique(CHAIN_NAME, ExistingChainPolicy::Replace, second_requests)
        .await
        .expect("second enqueue should succeed");

    // The evicted chain's unfinished units were cancelled and its records
    // dropped; the registry now tracks only the new generation.
    let mut cancelled = Vec::new();
    while cancelled.len() < 2 {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("expected a status event")
            .expect("bus should stay open");
        if event.status == WorkStatus::Cancelled && first.request_ids.contains(&event.request_id) {
            cancelled.push(event.request_id);
        }
    }
    assert!(cancelled.contains(&first.request_ids[1]));
    assert!(cancelled.contains(&first.request_ids[2]));

    wait_terminal(&runtime, CHAIN_NAME).await;

    let snapshots = runtime.chain_snapshots(CHAIN_NAME).await;
    let ids: Vec<RequestId> = snapshots.iter().map(|info| info.id).collect();
    assert_eq!(ids, second.request_ids);
    assert!(snapshots
        .iter()
        .all(|info| info.status == WorkStatus::Succeeded));
    assert!(runtime.snapshot(first.request_ids[1]).await.is_none());
}

#[tokio::test]
async fn keep_policy_preserves_the_active_chain() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let runtime = ChainRuntime::builder()
        .register(
            WorkerKind::Cleanup,
            Arc::new(StubWorker::new("cleanup", &log).delay(Duration::from_secs(30))),
        )
        .build();

    let first = runtime
        .enqueue_unique(
            CHAIN_NAME,
            ExistingChainPolicy::Replace,
            vec![WorkRequest::from_kind(WorkerKind::Cleanup)],
        )
        .await
        .expect("first enqueue should succeed");

    let second = runtime
        .enqueue_unique(
            CHAIN_NAME,
            ExistingChainPolicy::Keep,
            vec![WorkRequest::from_kind(WorkerKind::Cleanup)],
        )
        .await
        .expect("keep enqueue should succeed");

    assert_eq!(second.request_ids, first.request_ids);
    assert!(runtime.is_active(CHAIN_NAME).await);

    runtime.cancel_unique(CHAIN_NAME).await;
    wait_terminal(&runtime, CHAIN_NAME).await;
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancel_unique_marks_remaining_units_cancelled() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let runtime = ChainRuntime::builder()
        .register(WorkerKind::Cleanup, Arc::new(StubWorker::new("cleanup", &log)))
        .register(
            WorkerKind::Blur,
            Arc::new(StubWorker::new("blur", &log).delay(Duration::from_secs(30))),
        )
        .register(WorkerKind::Save, Arc::new(StubWorker::new("save", &log)))
        .build();

    let handle = runtime
        .enqueue_unique(CHAIN_NAME, ExistingChainPolicy::Replace, chain_requests())
        .await
        .expect("enqueue should succeed");
    wait_status(&runtime, handle.request_ids[1], WorkStatus::Running).await;

    runtime.cancel_unique(CHAIN_NAME).await;
    wait_terminal(&runtime, CHAIN_NAME).await;

    let statuses: Vec<WorkStatus> = runtime
        .chain_snapshots(CHAIN_NAME)
        .await
        .into_iter()
        .map(|info| info.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            WorkStatus::Succeeded,
            WorkStatus::Cancelled,
            WorkStatus::Cancelled,
        ]
    );

    // The cancelled save unit never ran.
    let entries = log.lock().await.clone();
    assert_eq!(entries, vec!["cleanup:-"]);
}

#[tokio::test]
async fn cancelling_an_unknown_name_is_a_no_op() {
    let runtime = ChainRuntime::builder().build();
    runtime.cancel_unique("never_enqueued").await;
}

// ---------------------------------------------------------------------------
// Enqueue validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_chain_is_rejected() {
    let runtime = ChainRuntime::builder().build();
    let result = runtime
        .enqueue_unique(CHAIN_NAME, ExistingChainPolicy::Replace, Vec::new())
        .await;
    assert_matches!(result, Err(RuntimeError::EmptyChain));
}

#[tokio::test]
async fn unregistered_worker_kind_is_rejected() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let runtime = ChainRuntime::builder()
        .register(WorkerKind::Cleanup, Arc::new(StubWorker::new("cleanup", &log)))
        .build();

    let result = runtime
        .enqueue_unique(
            CHAIN_NAME,
            ExistingChainPolicy::Replace,
            vec![WorkRequest::from_kind(WorkerKind::Blur)],
        )
        .await;
    assert_matches!(result, Err(RuntimeError::UnknownWorker(WorkerKind::Blur)));
}

#[tokio::test]
async fn empty_tag_is_rejected() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let runtime = ChainRuntime::builder()
        .register(WorkerKind::Cleanup, Arc::new(StubWorker::new("cleanup", &log)))
        .build();

    let result = runtime
        .enqueue_unique(
            CHAIN_NAME,
            ExistingChainPolicy::Replace,
            vec![WorkRequest::builder(WorkerKind::Cleanup).tag("").build()],
        )
        .await;
    assert_matches!(result, Err(RuntimeError::InvalidChain(_)));
}

#[tokio::test]
async fn malformed_chain_name_is_rejected() {
    let runtime = ChainRuntime::builder().build();
    let result = runtime
        .enqueue_unique(
            "not a valid name",
            ExistingChainPolicy::Replace,
            vec![WorkRequest::from_kind(WorkerKind::Cleanup)],
        )
        .await;
    assert_matches!(result, Err(RuntimeError::InvalidChain(_)));
}

// ---------------------------------------------------------------------------
// Tag observation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn watch_tag_reaches_a_terminal_snapshot() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let runtime = ChainRuntime::builder()
        .register(WorkerKind::Cleanup, Arc::new(StubWorker::new("cleanup", &log)))
        .register(
            WorkerKind::Save,
            Arc::new(StubWorker::new("save", &log).output(carry("final"))),
        )
        .build();

    let mut rx = runtime.watch_tag("OUTPUT").await;
    assert!(rx.borrow_and_update().is_empty());

    runtime
        .enqueue_unique(
            CHAIN_NAME,
            ExistingChainPolicy::Replace,
            vec![
                WorkRequest::from_kind(WorkerKind::Cleanup),
                WorkRequest::builder(WorkerKind::Save).tag("OUTPUT").build(),
            ],
        )
        .await
        .expect("enqueue should succeed");

    loop {
        rx.changed().await.expect("watch should stay open");
        let list = rx.borrow_and_update().clone();
        if list.first().map(|info| info.status) == Some(WorkStatus::Succeeded) {
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].output.get_str("carry"), Some("final"));
            break;
        }
    }
}

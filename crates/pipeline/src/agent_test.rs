//! Agent lifecycle tests
//!
//! End-to-end behavior of the lifecycle controller with stub plugins.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::{sleep, timeout};

use super::*;
use crate::test_utils::{FailEveryNth, PassFilter, RecordingOutput, VecInput, wait_for};

fn item(i: usize) -> Bytes {
    Bytes::from(format!("item-{i}"))
}

fn options() -> AgentOptions {
    AgentOptions {
        ingest_capacity: 16,
        egress_capacity: 16,
        max_batch: 4,
        idle_poll: Duration::from_millis(10),
        monitor_interval: None,
        ..AgentOptions::default()
    }
    .with_plugins("vec", "pass", "rec")
}

struct Stubs {
    input: Arc<VecInput>,
    output: Arc<RecordingOutput>,
}

fn agent_with(options: AgentOptions, input: VecInput, filter: Arc<dyn crate::Filter>, output: RecordingOutput) -> (Agent, Stubs) {
    let input = Arc::new(input);
    let output = Arc::new(output);

    let mut registry = PluginRegistry::new();
    registry.register_input("vec", input.clone());
    registry.register_filter("pass", filter);
    registry.register_output("rec", output.clone());

    let agent = Agent::new(options, registry, PluginConfigs::new());
    (agent, Stubs { input, output })
}

fn fast_agent(count: usize) -> (Agent, Stubs) {
    agent_with(
        options(),
        VecInput::new((0..count).map(item)).hold_open(),
        Arc::new(PassFilter),
        RecordingOutput::new(),
    )
}

// ============================================================================
// Startup
// ============================================================================

#[tokio::test]
async fn test_end_to_end_delivery_in_order() {
    let (agent, stubs) = fast_agent(20);
    agent.start().await.unwrap();

    assert!(wait_for(Duration::from_secs(2), || stubs.output.items().len() == 20).await);
    assert_eq!(stubs.output.items(), (0..20).map(item).collect::<Vec<_>>());
    assert!(stubs.output.batch_sizes().iter().all(|&n| n <= 5));

    let s = agent.metrics();
    assert_eq!(s.items_ingested, 20);
    assert_eq!(s.items_filtered, 20);
    assert_eq!(s.packets_written, 20);

    agent.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_no_ingestion_before_output_bound() {
    let options = AgentOptions {
        ingest_capacity: 4,
        egress_capacity: 4,
        ..options()
    };
    let (agent, stubs) = agent_with(
        options,
        VecInput::new((0..100).map(item)).hold_open(),
        Arc::new(PassFilter),
        RecordingOutput::new()
            .with_bind_delay(Duration::from_millis(500))
            .with_write_delay(Duration::from_secs(10)),
    );
    let agent = Arc::new(agent);

    let starter = Arc::clone(&agent);
    let start = tokio::spawn(async move { starter.start().await });

    sleep(Duration::from_millis(100)).await;
    assert_eq!(agent.ingest_queue().len(), 0);
    assert_eq!(agent.metrics().items_ingested, 0);
    assert_eq!(stubs.input.runs(), 0);
    assert_eq!(agent.stage_states().output, StageState::Binding);

    timeout(Duration::from_secs(2), start)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(wait_for(Duration::from_millis(300), || agent.ingest_queue().len() > 0).await);
    assert!(agent.ingest_queue().len() <= 4);

    timeout(Duration::from_secs(2), agent.shutdown())
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_unknown_plugin_is_fatal() {
    let (agent, stubs) = agent_with(
        options().with_plugins("vec", "pass", "kafka"),
        VecInput::new([item(0)]),
        Arc::new(PassFilter),
        RecordingOutput::new(),
    );

    let err = agent.start().await.unwrap_err();
    assert!(matches!(err, PipelineError::UnknownPlugin { kind: PluginKind::Output, .. }));
    assert_eq!(stubs.input.runs(), 0);
    assert_eq!(agent.stage_states().output, StageState::Idle);
}

#[tokio::test]
async fn test_output_bind_failure_is_fatal() {
    let (agent, stubs) = agent_with(
        options(),
        VecInput::new([item(0)]),
        Arc::new(PassFilter),
        RecordingOutput::new().failing_bind(),
    );

    let err = agent.start().await.unwrap_err();
    assert!(matches!(err, PipelineError::Bind { kind: PluginKind::Output, .. }));
    assert_eq!(stubs.input.runs(), 0);
    assert_eq!(agent.ingest_queue().len(), 0);

    agent.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_double_start() {
    let (agent, _stubs) = fast_agent(0);
    agent.start().await.unwrap();
    assert!(matches!(agent.start().await, Err(PipelineError::AlreadyStarted)));
    agent.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_monitor_runs_with_pipeline() {
    let (agent, stubs) = agent_with(
        AgentOptions {
            monitor_interval: Some(Duration::from_millis(10)),
            ..options()
        },
        VecInput::new((0..5).map(item)).hold_open(),
        Arc::new(PassFilter),
        RecordingOutput::new(),
    );
    agent.start().await.unwrap();
    assert!(wait_for(Duration::from_secs(2), || stubs.output.items().len() == 5).await);

    timeout(Duration::from_secs(1), agent.shutdown())
        .await
        .unwrap()
        .unwrap();
}

// ============================================================================
// Filtering
// ============================================================================

#[tokio::test]
async fn test_filter_errors_drop_items() {
    let (agent, stubs) = agent_with(
        options(),
        VecInput::new((0..9).map(item)).hold_open(),
        Arc::new(FailEveryNth::new(3)),
        RecordingOutput::new(),
    );
    agent.start().await.unwrap();

    assert!(wait_for(Duration::from_secs(2), || agent.metrics().filter_rejected == 3).await);
    assert!(wait_for(Duration::from_secs(2), || stubs.output.items().len() == 6).await);

    let expected: Vec<Bytes> = [0, 1, 3, 4, 6, 7].into_iter().map(item).collect();
    assert_eq!(stubs.output.items(), expected);

    agent.shutdown().await.unwrap();
}

// ============================================================================
// Drain
// ============================================================================

#[tokio::test]
async fn test_empty_without_consumers() {
    let (agent, stubs) = fast_agent(0);
    for i in 0..5 {
        agent.ingest_queue().try_send(item(i)).unwrap();
        agent.egress_queue().try_send(item(i)).unwrap();
    }

    let report = agent.empty();
    assert_eq!(report, DrainReport { ingest: 5, egress: 5 });
    assert_eq!(report.total(), 10);
    assert_eq!(agent.ingest_queue().len(), 0);
    assert_eq!(agent.egress_queue().len(), 0);
    assert!(!agent.ingest_queue().is_closed());
    assert!(stubs.output.batches().is_empty());
    assert_eq!(agent.metrics().items_drained, 10);
}

#[tokio::test]
async fn test_empty_while_running() {
    let (agent, stubs) = agent_with(
        options(),
        VecInput::new((0..3).map(item)).hold_open(),
        Arc::new(PassFilter),
        RecordingOutput::new(),
    );
    agent.start().await.unwrap();
    assert!(wait_for(Duration::from_secs(2), || stubs.output.items().len() == 3).await);

    let report = agent.empty();
    assert_eq!(report.total(), 0);

    // Stages keep running after a drain
    agent.egress_queue().try_send(item(99)).unwrap();
    assert!(wait_for(Duration::from_secs(2), || stubs.output.items().len() == 4).await);

    agent.shutdown().await.unwrap();
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_shutdown_terminates_and_closes_queues() {
    let (agent, _stubs) = fast_agent(10);
    agent.start().await.unwrap();
    sleep(Duration::from_millis(20)).await;

    timeout(Duration::from_secs(1), agent.shutdown())
        .await
        .expect("shutdown should finish quickly")
        .unwrap();

    assert!(agent.ingest_queue().is_closed());
    assert!(agent.egress_queue().is_closed());
    assert!(agent.is_shutdown());

    let states = agent.stage_states();
    assert_eq!(states.input, StageState::Stopped);
    assert_eq!(states.filter, StageState::Stopped);
    assert_eq!(states.output, StageState::Stopped);
}

#[tokio::test]
async fn test_shutdown_interrupts_blocked_input() {
    // 100 items into queues of 2 with a stalled output: the input blocks on send
    let (agent, _stubs) = agent_with(
        AgentOptions {
            ingest_capacity: 2,
            egress_capacity: 2,
            ..options()
        },
        VecInput::new((0..100).map(item)),
        Arc::new(PassFilter),
        RecordingOutput::new().with_write_delay(Duration::from_secs(30)),
    );
    agent.start().await.unwrap();
    sleep(Duration::from_millis(50)).await;
    assert_eq!(agent.ingest_queue().len(), 2);

    timeout(Duration::from_secs(1), agent.shutdown())
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_double_shutdown_fails() {
    let (agent, _stubs) = fast_agent(1);
    agent.start().await.unwrap();

    agent.shutdown().await.unwrap();
    let err = agent.shutdown().await.unwrap_err();
    assert!(matches!(err, PipelineError::AlreadyShutdown));
}

#[tokio::test]
async fn test_start_after_shutdown() {
    let (agent, _stubs) = fast_agent(1);
    agent.shutdown().await.unwrap();
    assert!(matches!(agent.start().await, Err(PipelineError::ShuttingDown)));
}

/// Pass-through filter whose bind takes a while
struct SlowBindFilter(Duration);

#[async_trait::async_trait]
impl crate::Filter for SlowBindFilter {
    async fn bind(&self, _ctx: &PipelineContext) -> crate::PluginResult<()> {
        sleep(self.0).await;
        Ok(())
    }

    fn apply(&self, item: Bytes) -> std::result::Result<Bytes, crate::FilterError> {
        Ok(item)
    }
}

#[tokio::test]
async fn test_shutdown_during_filter_bind() {
    let (agent, stubs) = agent_with(
        options(),
        VecInput::new((0..4).map(item)).hold_open(),
        Arc::new(SlowBindFilter(Duration::from_secs(30))),
        RecordingOutput::new(),
    );
    let agent = Arc::new(agent);

    let starting = Arc::clone(&agent);
    let start = tokio::spawn(async move { starting.start().await });
    assert!(wait_for(Duration::from_secs(2), || agent.stage_states().filter == StageState::Binding).await);

    timeout(Duration::from_secs(1), agent.shutdown())
        .await
        .unwrap()
        .unwrap();

    let started = timeout(Duration::from_secs(1), start).await.unwrap().unwrap();
    assert!(matches!(started, Err(PipelineError::ShuttingDown)));

    // the input was never bound or spawned behind shutdown's back
    sleep(Duration::from_millis(50)).await;
    assert_eq!(stubs.input.runs(), 0);
    assert!(agent.tasks.lock().is_empty());
}

// ============================================================================
// Administrative
// ============================================================================

#[tokio::test]
async fn test_input_finished_does_not_stop_pipeline() {
    let (agent, stubs) = agent_with(
        options(),
        VecInput::new((0..3).map(item)),
        Arc::new(PassFilter),
        RecordingOutput::new(),
    );
    agent.start().await.unwrap();

    timeout(Duration::from_secs(1), agent.input_finished())
        .await
        .unwrap();
    assert!(!agent.is_shutdown());
    assert!(wait_for(Duration::from_secs(2), || stubs.output.items().len() == 3).await);

    let states = agent.stage_states();
    assert_eq!(states.input, StageState::Stopped);
    assert_eq!(states.filter, StageState::Running);
    assert_eq!(states.output, StageState::Running);

    agent.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_refresh_reaches_input_and_output() {
    let (agent, stubs) = fast_agent(0);

    agent.refresh();
    assert_eq!(stubs.input.refreshes(), 0);

    agent.start().await.unwrap();
    agent.refresh();
    assert_eq!(stubs.input.refreshes(), 1);
    assert_eq!(stubs.output.refreshes(), 1);

    agent.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_debug_dump() {
    let (agent, _stubs) = fast_agent(0);
    let dump = agent.debug_dump();
    assert!(dump.contains("plugins: input=vec filter=pass output=rec"));
    assert!(dump.contains("queue ingest: len=0 capacity=16 closed=false"));
    assert!(dump.contains("stages: input=idle"));
}

#[test]
fn test_options_from_config() {
    let config: Config = "[agent]\nmax_batch_size = 7\n[monitor]\nenabled = true\ninterval = \"2s\"\n[pipeline]\noutput = \"logr\""
        .parse()
        .unwrap();
    let options = AgentOptions::from_config(&config);
    assert_eq!(options.max_batch, 7);
    assert_eq!(options.output, "logr");
    assert_eq!(options.input, "stdin");
    assert_eq!(options.monitor_interval, Some(Duration::from_secs(2)));

    let options = AgentOptions::default();
    assert_eq!(options.monitor_interval, None);
    assert_eq!(options.ingest_capacity, 4096);
}

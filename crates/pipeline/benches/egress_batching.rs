//! Egress batching benchmarks
//!
//! End-to-end throughput of the pipeline with stub plugins, for a few
//! batch sizes.
//!
//! Run with: `cargo bench -p ferry-pipeline`

use std::sync::Arc;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ferry_pipeline::test_utils::{PassFilter, RecordingOutput, VecInput, wait_for};
use ferry_pipeline::{Agent, AgentOptions, Bytes, PluginConfigs, PluginRegistry};
use tokio::runtime::Runtime;

const ITEMS: usize = 10_000;

fn payloads() -> Vec<Bytes> {
    (0..ITEMS)
        .map(|i| Bytes::from(format!("127.0.0.1 - - GET /index.html {i}")))
        .collect()
}

fn bench_pipeline_throughput(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("pipeline_throughput");
    group.throughput(Throughput::Elements(ITEMS as u64));
    group.sample_size(10);

    for max_batch in [1, 50, 500] {
        group.bench_with_input(
            BenchmarkId::from_parameter(max_batch),
            &max_batch,
            |b, &max_batch| {
                b.to_async(&rt).iter(|| async move {
                    let output = Arc::new(RecordingOutput::new());
                    let mut registry = PluginRegistry::new();
                    registry.register_input("vec", Arc::new(VecInput::new(payloads()).hold_open()));
                    registry.register_filter("pass", Arc::new(PassFilter));
                    registry.register_output("rec", output.clone());

                    let options = AgentOptions {
                        max_batch,
                        idle_poll: Duration::from_millis(1),
                        ..AgentOptions::default()
                    }
                    .with_plugins("vec", "pass", "rec");

                    let agent = Agent::new(options, registry, PluginConfigs::new());
                    agent.start().await.unwrap();
                    wait_for(Duration::from_secs(30), || {
                        agent.metrics().packets_written == ITEMS as u64
                    })
                    .await;
                    agent.shutdown().await.unwrap();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline_throughput);
criterion_main!(benches);

//! Throughput of the text-ingestion pipeline: analyze, normalize, embed,
//! and upsert-or-insert, end to end against a real on-disk store.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use cortex_benches::{sample_statements, setup_pipeline, TokioExecutor};
use cortex_core::manager::IngestRequest;
use cortex_core::model::{InputChannel, Scope};

fn benchmark_sequential_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingestion_pipeline");
    group.sample_size(10);

    for count in [1, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.to_async(TokioExecutor).iter(|| async move {
                let (memory_manager, _retrieval_engine, _dir) = setup_pipeline().await;

                for text in sample_statements(count) {
                    memory_manager
                        .ingest(IngestRequest {
                            user_id: "bench-user".to_string(),
                            text,
                            source: Some("benchmark".to_string()),
                            scope: Scope::Global,
                            agent_id: None,
                            event_time: None,
                            input_channel: InputChannel::Api,
                        })
                        .await
                        .expect("ingest should succeed against the stub adapters");
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_sequential_ingest);
criterion_main!(benches);

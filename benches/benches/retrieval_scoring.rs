//! Cost of the retrieval pipeline's scoring and cutoff loop: hybrid
//! search over a pre-seeded set of memories, ranked and synthesized
//! into a context window.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use cortex_benches::{sample_statements, setup_pipeline, TokioExecutor};
use cortex_core::manager::ForceIngestRequest;
use cortex_core::model::{InputChannel, MemoryType, Scope};
use cortex_core::retrieval::ContextRequest;

async fn seed(memory_manager: &cortex_core::manager::MemoryManager, count: usize) {
    for (i, content) in sample_statements(count).into_iter().enumerate() {
        memory_manager
            .force_ingest(ForceIngestRequest {
                user_id: "bench-user".to_string(),
                scope: Scope::Global,
                agent_id: None,
                content,
                memory_type: MemoryType::Fact,
                tags: vec![format!("tag{}", i % 5)],
                related_entities: Vec::new(),
                importance: 5,
                confidence: 0.8,
                source: Some("benchmark".to_string()),
                input_channel: InputChannel::Api,
                event_time: None,
                allow_semantic_upsert: false,
            })
            .await
            .expect("force_ingest should succeed against the stub adapters");
    }
}

fn benchmark_context_over_candidate_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("retrieval_scoring");
    group.sample_size(10);

    for pool_size in [10, 100, 500] {
        group.bench_with_input(
            BenchmarkId::from_parameter(pool_size),
            &pool_size,
            |b, &pool_size| {
                b.to_async(TokioExecutor).iter(|| async move {
                    let (memory_manager, retrieval_engine, _dir) = setup_pipeline().await;
                    seed(&memory_manager, pool_size).await;

                    retrieval_engine
                        .context(ContextRequest {
                            user_id: "bench-user".to_string(),
                            query: "fact number 3".to_string(),
                            app_context: None,
                            scope: Scope::Global,
                            agent_id: None,
                            k: 10,
                            include_global: true,
                            include_retired: false,
                            return_evidence: true,
                        })
                        .await
                        .expect("context should succeed against the stub adapters");
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_context_over_candidate_pool);
criterion_main!(benches);

use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use saga::{
    ChoreographyCoordinator, MonolithCoordinator, OrderService, PaymentService, SagaOrchestrator,
    ShippingService, WorkflowCoordinator,
};
use store::InMemoryStore;

fn services(
    store: &InMemoryStore,
) -> (
    OrderService<InMemoryStore>,
    PaymentService<InMemoryStore>,
    ShippingService<InMemoryStore>,
) {
    (
        OrderService::new(store.clone()),
        PaymentService::new(store.clone()),
        ShippingService::new(store.clone()).with_process_delay(Duration::ZERO),
    )
}

fn bench_monolith(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("saga/monolith_happy_path", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStore::new();
                MonolithCoordinator::new(store).run(500, 10).await.unwrap();
            });
        });
    });
}

fn bench_orchestration(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("saga/orchestration_happy_path", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStore::new();
                let (order, payment, shipping) = services(&store);
                SagaOrchestrator::new(order, payment, shipping)
                    .run(500, 10)
                    .await
                    .unwrap();
            });
        });
    });

    c.bench_function("saga/orchestration_reconcile_path", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStore::new();
                let (order, payment, shipping) = services(&store);
                SagaOrchestrator::new(order, payment, shipping)
                    .run(1500, 10)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_workflow(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("saga/workflow_happy_path", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStore::new();
                let (order, payment, shipping) = services(&store);
                WorkflowCoordinator::new(order, payment, shipping)
                    .run(500, 10)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_choreography(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("saga/choreography_happy_path", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStore::new();
                let (order, payment, shipping) = services(&store);
                let coordinator =
                    ChoreographyCoordinator::new(store, order, payment, shipping);
                coordinator.submit(500, 10).await.unwrap();
                coordinator.run_to_completion().await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_monolith,
    bench_orchestration,
    bench_workflow,
    bench_choreography
);
criterion_main!(benches);

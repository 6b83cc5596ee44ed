use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use stockbook_core::{ExpectedVersion, ProductId};
use stockbook_infra::{InMemoryLedger, LedgerStore};
use stockbook_ledger::{
    full_inventory, quantity_on_hand, NewLine, TransactionType, ValidatedTransaction,
};

/// Seed a ledger with `transactions` alternating IN/OUT movements spread
/// across `product_count` products.
fn seed_ledger(product_count: usize, transactions: usize) -> (InMemoryLedger, Vec<ProductId>) {
    let ledger = InMemoryLedger::new();
    let products: Vec<ProductId> = (0..product_count).map(|_| ProductId::new()).collect();

    for i in 0..transactions {
        let product_id = products[i % product_count];
        let (tx_type, quantity) = if i % 3 == 2 {
            (TransactionType::Out, 1)
        } else {
            (TransactionType::In, 5)
        };
        ledger
            .append(
                ValidatedTransaction {
                    tx_type,
                    created_by: String::new(),
                    notes: String::new(),
                    lines: vec![NewLine::of(product_id, quantity)],
                    baseline_version: 0,
                },
                ExpectedVersion::Any,
            )
            .expect("seed append");
    }

    (ledger, products)
}

fn bench_single_product_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantity_on_hand");

    for size in [100usize, 1_000, 10_000] {
        let (ledger, products) = seed_ledger(20, size);
        let snapshot = ledger.snapshot().expect("snapshot");
        let product_id = products[0];

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                black_box(quantity_on_hand(
                    black_box(&snapshot.transactions),
                    product_id,
                    None,
                ))
            })
        });
    }

    group.finish();
}

fn bench_full_inventory_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_inventory");

    for size in [100usize, 1_000, 10_000] {
        let (ledger, _) = seed_ledger(20, size);
        let snapshot = ledger.snapshot().expect("snapshot");

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(full_inventory(black_box(&snapshot.transactions))))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_product_replay,
    bench_full_inventory_replay
);
criterion_main!(benches);

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{Days, NaiveDate, Utc};
use fleetstock_core::{BatchId, ItemId, PrefixedId};
use fleetstock_inventory::{Batch, CategoryPolicy, StockSnapshot, derive_status, plan_fifo};

fn batches(count: usize) -> Vec<Batch> {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    (0..count)
        .map(|i| Batch {
            id: BatchId::from_seq(i as u64 + 1),
            item_id: ItemId::from_seq(1),
            usable_quantity: 10,
            defective_quantity: 0,
            missing_quantity: 0,
            // Every fifth batch undated, the rest spread over the year in reverse.
            expiration_date: if i % 5 == 0 {
                None
            } else {
                start.checked_add_days(Days::new((count - i) as u64 % 365))
            },
            created_at: Utc::now(),
            deleted: false,
        })
        .collect()
}

fn bench_plan_fifo(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_fifo");

    for count in [10usize, 100, 1_000] {
        let lots = batches(count);
        // Drain roughly half the stock so the plan spans many batches.
        let quantity = (count as u32 * 10) / 2;
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &lots, |b, lots| {
            b.iter(|| plan_fifo(ItemId::from_seq(1), black_box(lots), black_box(quantity)).unwrap());
        });
    }

    group.finish();
}

fn bench_status_derivation(c: &mut Criterion) {
    let lots = batches(1_000);
    let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

    c.bench_function("status_from_1000_batches", |b| {
        b.iter(|| {
            let snap = StockSnapshot::from_batches(black_box(&lots), today);
            derive_status(CategoryPolicy::Consumable, 100, snap)
        });
    });
}

criterion_group!(benches, bench_plan_fifo, bench_status_derivation);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use shopledger_core::{ProductId, SaleId};
use shopledger_sales::{bucket_revenue, total_revenue, Period, SaleItem, SalesFilter};

fn sample_items(n: usize) -> Vec<SaleItem> {
    let base = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            let quantity = (i % 7 + 1) as i64;
            let price = Decimal::new(999 + (i % 50) as i64 * 100, 2);
            SaleItem {
                sale_id: SaleId::new(i as i64 + 1),
                product_id: ProductId::new((i % 20) as i64 + 1),
                product_name: format!("Product {}", i % 20),
                category: if i % 3 == 0 { "Beauty" } else { "Electronics" }.to_string(),
                quantity,
                sale_date: base + Days::new((i % 1000) as u64),
                price_per_unit: price,
                total_price: price * Decimal::from(quantity),
            }
        })
        .collect()
}

fn bench_bucketing(c: &mut Criterion) {
    let mut group = c.benchmark_group("revenue_bucketing");

    for size in [1_000usize, 10_000, 100_000].iter() {
        let items = sample_items(*size);
        group.throughput(Throughput::Elements(*size as u64));

        for period in [Period::Daily, Period::Weekly, Period::Monthly, Period::Annual] {
            group.bench_with_input(
                BenchmarkId::new(period.as_str(), size),
                &items,
                |b, items| b.iter(|| bucket_revenue(black_box(items), period)),
            );
        }
    }

    group.finish();
}

fn bench_filtered_total(c: &mut Criterion) {
    let mut group = c.benchmark_group("filtered_total");
    let items = sample_items(50_000);
    let filter = SalesFilter::for_range(
        NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        None,
        Some("Electronics".to_string()),
    );

    group.bench_function("category_and_range", |b| {
        b.iter(|| total_revenue(items.iter().filter(|i| filter.matches(black_box(i)))))
    });

    group.finish();
}

criterion_group!(benches, bench_bucketing, bench_filtered_total);
criterion_main!(benches);

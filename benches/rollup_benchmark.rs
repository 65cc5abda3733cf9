//! Rollup Benchmark
//!
//! Measures the in-memory part of a rollup run:
//! - aggregate 50 symbols × 20 days × 188 two-minute samples into daily rows
//! - recompute MA_5/MA_10 over the resulting series

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use market_rollup::database::models::{NewRawSample, RawSample};
use market_rollup::rollup::{aggregate_daily, apply_moving_averages};
use rust_decimal::Decimal;

const SAMPLES_PER_DAY: usize = 188; // 09:15 to 15:30 every 2 minutes
const NUM_DAYS: usize = 20;

/// Deterministic intraday walk around a base price
fn generate_samples(symbols: usize) -> Vec<RawSample> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(9, 15, 0))
        .expect("valid start");
    let created_at = chrono::Utc::now();
    let mut samples = Vec::with_capacity(symbols * NUM_DAYS * SAMPLES_PER_DAY);
    let mut id = 0;

    for s in 0..symbols {
        let symbol = format!("SYM{:02}", s);
        let base = Decimal::from(1000 + s as i64 * 10);

        for day in 0..NUM_DAYS {
            for i in 0..SAMPLES_PER_DAY {
                let offset = Decimal::from(((i * 7 + day * 13 + s) % 400) as i64 - 200) / Decimal::from(100);
                let at = start + Duration::days(day as i64) + Duration::minutes(2 * i as i64);
                id += 1;
                samples.push(
                    NewRawSample::flat(symbol.clone(), at, base + offset, (i % 50) as i64 * 100)
                        .into_stored(id, created_at),
                );
            }
        }
    }

    // Arrival order, not chronological
    samples.reverse();
    samples
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_daily");

    for symbols in [10, 50] {
        let samples = generate_samples(symbols);
        group.bench_with_input(BenchmarkId::from_parameter(symbols), &samples, |b, samples| {
            b.iter(|| aggregate_daily(black_box(samples.clone())))
        });
    }

    group.finish();
}

fn bench_moving_averages(c: &mut Criterion) {
    let daily = aggregate_daily(generate_samples(50));

    c.bench_function("apply_moving_averages/50x20", |b| {
        b.iter(|| {
            let mut rows = daily.clone();
            for chunk in rows.chunk_by_mut(|a, b| a.symbol == b.symbol) {
                apply_moving_averages(black_box(chunk));
            }
            rows
        })
    });
}

criterion_group!(benches, bench_aggregate, bench_moving_averages);
criterion_main!(benches);

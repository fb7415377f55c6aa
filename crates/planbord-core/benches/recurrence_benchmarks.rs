use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use uuid::Uuid;

use planbord_core::models::{
    DryIceOrder, DryIceProductType, EngineConfig, NewDryIceOrderData, RecurrenceInterval,
    RecurrenceRequest,
};
use planbord_core::recurrence::{expand_dry_ice_order, occurrence_dates};
use planbord_core::series_move::plan_series_move;

fn anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
}

fn creation_request(horizon_days: i64) -> NewDryIceOrderData {
    NewDryIceOrderData {
        order_number: "DI-20250106-042".to_string(),
        customer_id: None,
        customer_name: "Cryo BV".to_string(),
        scheduled_date: anchor(),
        quantity_kg: 25.0,
        product_type: DryIceProductType::Pellets,
        notes: None,
        created_by: Uuid::now_v7(),
        recurrence: Some(RecurrenceRequest {
            interval: RecurrenceInterval::Weekly,
            open_ended: false,
            end_date: Some(anchor() + Duration::days(horizon_days)),
        }),
    }
}

fn weekly_series(members: usize) -> Vec<DryIceOrder> {
    let root = DryIceOrder {
        scheduled_date: anchor(),
        is_recurring: true,
        ..Default::default()
    };
    let root_id = root.id;
    let mut orders = vec![root];
    for index in 1..=members {
        orders.push(DryIceOrder {
            scheduled_date: anchor() + Duration::days(7 * index as i64),
            is_recurring: true,
            parent_order_id: Some(root_id),
            ..Default::default()
        });
    }
    orders
}

fn bench_occurrence_generation(c: &mut Criterion) {
    let config = EngineConfig::default();
    let mut group = c.benchmark_group("occurrence_generation");

    for days in [30, 90, 365].iter() {
        let request = RecurrenceRequest {
            interval: RecurrenceInterval::Weekly,
            open_ended: false,
            end_date: Some(anchor() + Duration::days(*days)),
        };
        group.bench_with_input(BenchmarkId::new("days", days), days, |b, _| {
            b.iter(|| occurrence_dates(black_box(anchor()), black_box(&request), &config).unwrap())
        });
    }
    group.finish();
}

fn bench_series_expansion(c: &mut Criterion) {
    let config = EngineConfig::default();
    let request = creation_request(365);

    c.bench_function("series_expansion_one_year_weekly", |b| {
        b.iter(|| expand_dry_ice_order(black_box(&request), &config).unwrap())
    });
}

fn bench_series_move_planning(c: &mut Criterion) {
    let mut group = c.benchmark_group("series_move_planning");

    for members in [4, 12, 52].iter() {
        let series = weekly_series(*members);
        let dragged = series[0].id;
        let target = anchor() + Duration::days(3);
        group.bench_with_input(BenchmarkId::new("members", members), members, |b, _| {
            b.iter(|| plan_series_move(black_box(&series), dragged, target).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_occurrence_generation,
    bench_series_expansion,
    bench_series_move_planning
);
criterion_main!(benches);

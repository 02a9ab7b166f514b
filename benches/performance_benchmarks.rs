use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use chrono::{Duration, NaiveDate};
use rhythmrs::baseline::BaselineCalculator;
use rhythmrs::cycles::generate_cycles;
use rhythmrs::models::{BiometricRecord, Metric, WeatherConditions};
use rhythmrs::vibe::{calculate_vibe_score, BioInputs, VibeBaselines};
use rhythmrs::vital::calculate_vital_index;

/// Performance benchmarks for the rhythm calculators
///
/// History sizes cover a week up to several years of daily check-ins.

fn bench_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 20).unwrap()
}

fn create_history(days: usize) -> Vec<BiometricRecord> {
    let today = bench_date();
    (0..days)
        .map(|offset| {
            let wobble = (offset % 9) as f64;
            BiometricRecord::new(today - Duration::days(offset as i64))
                .with_hrv(58.0 + wobble * 1.5)
                .with_resting_heart_rate(52.0 + wobble * 0.5)
                .with_sleep(6.5 + wobble * 0.2)
        })
        .collect()
}

fn bench_cycle_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Cycle Generation");

    for &count in &[1u32, 5, 16, 48] {
        group.throughput(Throughput::Elements(u64::from(count)));
        group.bench_with_input(BenchmarkId::new("generate_cycles", count), &count, |b, &count| {
            b.iter(|| {
                let _ = generate_cycles(black_box("06:00:00"), 90, 20, count, 20, bench_date());
            });
        });
    }

    group.finish();
}

fn bench_vital_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("Vital Index");

    for &days in &[7usize, 30, 365, 1825] {
        let history = create_history(days);

        group.throughput(Throughput::Elements(days as u64));
        group.bench_with_input(
            BenchmarkId::new("calculate_vital_index", days),
            &history,
            |b, history| {
                b.iter(|| {
                    let _ = calculate_vital_index(black_box(history), bench_date());
                });
            },
        );
    }

    group.finish();
}

fn bench_baselines(c: &mut Criterion) {
    let calculator = BaselineCalculator::default();
    let history = create_history(365);

    c.bench_function("baseline_all_metrics_365d", |b| {
        b.iter(|| {
            for metric in [Metric::Hrv, Metric::RestingHeartRate, Metric::SleepDuration] {
                let _ = calculator.baseline(black_box(&history), metric, bench_date());
            }
        });
    });
}

fn bench_vibe_score(c: &mut Criterion) {
    let bio = BioInputs {
        hrv: Some(52.0),
        resting_heart_rate: Some(61.0),
        sleep_duration_hours: Some(5.5),
    };
    let baselines = VibeBaselines {
        hrv: Some(65.0),
        resting_heart_rate: Some(54.0),
    };
    let weather = WeatherConditions {
        temperature: Some(31.0),
        dew_point: Some(21.0),
        humidity: Some(85.0),
        pressure: Some(1002.0),
    };

    c.bench_function("calculate_vibe_score", |b| {
        b.iter(|| {
            let _ = calculate_vibe_score(
                black_box(&bio),
                black_box(&baselines),
                black_box(&weather),
                "😴",
            );
        });
    });
}

criterion_group!(
    benches,
    bench_cycle_generation,
    bench_vital_index,
    bench_baselines,
    bench_vibe_score
);
criterion_main!(benches);

use chrono::{NaiveDate, NaiveTime, Timelike};
use proptest::prelude::*;
use rhythmrs::cycles::{flatten_phases, phase_at, CycleParameters, CycleScheduler, MAX_CYCLES};
use rhythmrs::models::{BiometricRecord, WeatherConditions};
use rhythmrs::vibe::{calculate_vibe_score, BioInputs, VibeBaselines, Zone};
use rhythmrs::vital::{calculate_vital_index, VitalStatus};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn minutes_between(start: NaiveTime, end: NaiveTime) -> u32 {
    let secs = (i64::from(end.num_seconds_from_midnight())
        - i64::from(start.num_seconds_from_midnight()))
    .rem_euclid(86_400);
    (secs / 60) as u32
}

fn wake_strategy() -> impl Strategy<Value = NaiveTime> {
    (0u32..24, 0u32..60, 0u32..60).prop_map(|(h, m, s)| NaiveTime::from_hms_opt(h, m, s).unwrap())
}

proptest! {
    #[test]
    fn test_schedule_shape(
        wake_time in wake_strategy(),
        peak_minutes in 0u32..300,
        trough_minutes in 0u32..120,
        cycle_count in 0u32..=MAX_CYCLES,
        grog_minutes in 0u32..120,
    ) {
        let params = CycleParameters {
            wake_time,
            peak_minutes,
            trough_minutes,
            cycle_count,
            grog_minutes,
        };
        let cycles = CycleScheduler::generate(&params, date()).unwrap();

        prop_assert_eq!(cycles.len(), cycle_count as usize);
        if let Some(first) = cycles.first() {
            prop_assert_eq!(first.peak_start, params.first_peak_start());
        }

        for (i, event) in cycles.iter().enumerate() {
            prop_assert_eq!(event.cycle_index, i as u32 + 1);
            prop_assert_eq!(event.peak_end, event.trough_start);
            prop_assert_eq!(minutes_between(event.peak_start, event.peak_end), peak_minutes % 1440);
            prop_assert_eq!(minutes_between(event.trough_start, event.trough_end), trough_minutes % 1440);
            prop_assert_eq!(event.date, date());
        }

        for pair in cycles.windows(2) {
            prop_assert_eq!(pair[1].peak_start, pair[0].trough_end);
        }

        prop_assert_eq!(flatten_phases(&cycles).len(), cycles.len() * 2);
    }

    #[test]
    fn test_first_peak_is_located(
        wake_time in wake_strategy(),
        peak_minutes in 1u32..200,
        trough_minutes in 1u32..60,
    ) {
        let params = CycleParameters {
            wake_time,
            peak_minutes,
            trough_minutes,
            cycle_count: 1,
            grog_minutes: 20,
        };
        let cycles = CycleScheduler::generate(&params, date()).unwrap();
        let (index, _) = phase_at(&cycles, cycles[0].peak_start).unwrap();
        prop_assert_eq!(index, 1);
    }

    #[test]
    fn test_vibe_score_is_bounded_and_zoned(
        hrv in proptest::option::of(10.0f64..150.0),
        rhr in proptest::option::of(35.0f64..110.0),
        sleep in proptest::option::of(0.0f64..12.0),
        baseline_hrv in proptest::option::of(20.0f64..120.0),
        baseline_rhr in proptest::option::of(40.0f64..90.0),
        temperature in proptest::option::of(-20.0f64..45.0),
        dew_point in proptest::option::of(-20.0f64..30.0),
        humidity in proptest::option::of(0.0f64..100.0),
        pressure in proptest::option::of(960.0f64..1060.0),
        mood in prop::sample::select(vec!["", "🙂", "😐", "😴", "😤"]),
    ) {
        let bio = BioInputs {
            hrv,
            resting_heart_rate: rhr,
            sleep_duration_hours: sleep,
        };
        let baselines = VibeBaselines {
            hrv: baseline_hrv,
            resting_heart_rate: baseline_rhr,
        };
        let weather = WeatherConditions {
            temperature,
            dew_point,
            humidity,
            pressure,
        };

        let result = calculate_vibe_score(&bio, &baselines, &weather, mood);
        let deducted: u32 = result.penalties.iter().map(|p| u32::from(p.points())).sum();

        prop_assert!(result.score <= 100);
        prop_assert_eq!(u32::from(result.score), 100u32.saturating_sub(deducted));
        prop_assert_eq!(result.zone, Zone::from_score(result.score));
        prop_assert_eq!(result.prompt.as_str(), result.zone.prompt());
    }

    #[test]
    fn test_vital_status_tracks_index(
        today_hrv in 20.0f64..150.0,
        history in proptest::collection::vec(20.0f64..150.0, 1..10),
    ) {
        let today = date();
        let mut records = vec![BiometricRecord::new(today).with_hrv(today_hrv)];
        for (offset, value) in history.iter().enumerate() {
            let day = today - chrono::Duration::days(offset as i64 + 1);
            records.push(BiometricRecord::new(day).with_hrv(*value));
        }

        let result = calculate_vital_index(&records, today).unwrap();
        let expected = match result.vital_index {
            i if i < 90.0 => VitalStatus::BelowBaseline,
            i if i > 110.0 => VitalStatus::AboveBaseline,
            _ => VitalStatus::Baseline,
        };
        prop_assert_eq!(result.status, expected);
        prop_assert_eq!(result.vital_index, result.vital_index.round());
    }
}

use chrono::{NaiveDate, NaiveTime};
use rhythmrs::cycles::{flatten_phases, generate_cycles, PhaseKind};
use rhythmrs::import::load_history;
use rhythmrs::models::{BiometricRecord, UserCycleSettings, WeatherConditions};
use rhythmrs::planner::{DailyPlanner, InMemoryStore, PlannerSettings};
use rhythmrs::vibe::{calculate_vibe_score, BioInputs, VibeBaselines, Zone};
use rhythmrs::vital::{calculate_vital_index, VitalStatus};
use rhythmrs::weather::{Location, OpenMeteo, StaticWeather, WeatherProvider};
use rhythmrs::{AppConfig, RhythmError};
use std::io::Write;

/// Integration tests that exercise complete request workflows

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seed_history(store: &mut InMemoryStore, user: &str, today: NaiveDate) {
    let wake = NaiveTime::from_hms_opt(6, 45, 0).unwrap();
    let hrv = [70.0, 64.0, 66.0, 62.0, 65.0, 63.0, 67.0, 65.0, 58.0, 61.0];
    for (offset, value) in hrv.iter().enumerate() {
        let day = today - chrono::Duration::days(offset as i64);
        store.upsert(
            user,
            BiometricRecord::new(day)
                .with_wake_time(wake)
                .with_hrv(*value)
                .with_resting_heart_rate(54.0)
                .with_sleep(7.4)
                .with_mood("🙂"),
        );
    }
}

/// Weather source that always fails, as a flaky HTTP lookup would
struct Offline;

impl WeatherProvider for Offline {
    fn current(&self, _location: Location) -> rhythmrs::Result<WeatherConditions> {
        Err(RhythmError::Weather("connection refused".to_string()))
    }
}

#[test]
fn test_full_day_workflow() {
    let today = date(2024, 6, 20);
    let mut store = InMemoryStore::new();
    seed_history(&mut store, "josh", today);

    let body = r#"{"current":{"temperature_2m":29.5,"dew_point_2m":14.0,"relative_humidity_2m":55,"pressure_msl":1012.0}}"#;
    let weather = StaticWeather(OpenMeteo::parse_current(body).unwrap());
    let planner = DailyPlanner::new(store, weather, AppConfig::default().planner_settings());

    let plan = planner
        .plan_cycles("josh", today, &UserCycleSettings::default())
        .unwrap();
    assert_eq!(plan.cycles.len(), 5);
    assert_eq!(plan.cycles[0].peak_start, NaiveTime::from_hms_opt(7, 5, 0).unwrap());

    let vital = planner.vital_index("josh", today).unwrap();
    assert_eq!(vital.today_hrv, 70.0);
    assert_eq!(vital.status, VitalStatus::Baseline);

    let vibe = planner.vibe_score("josh", today, Location::default(), None);
    assert_eq!(vibe.penalty_messages(), vec!["Overheating risk"]);
    assert_eq!(vibe.score, 98);
    assert_eq!(vibe.zone, Zone::Green);
}

#[test]
fn test_weather_failure_never_surfaces() {
    let today = date(2024, 6, 20);
    let mut store = InMemoryStore::new();
    seed_history(&mut store, "josh", today);
    let planner = DailyPlanner::new(store, Offline, PlannerSettings::default());

    let vibe = planner.vibe_score("josh", today, Location::default(), Some("😤"));
    assert_eq!(vibe.inputs.temperature, 22.0);
    assert_eq!(vibe.inputs.pressure, 1015.0);
    assert_eq!(vibe.penalty_messages(), vec!["Mood suggests strain or low energy"]);
}

#[test]
fn test_reference_schedule_json() {
    let cycles = generate_cycles("06:00:00", 90, 20, 5, 20, date(2024, 1, 1)).unwrap();
    let json = serde_json::to_value(&cycles).unwrap();

    assert_eq!(json[0]["peak_start"], "06:20:00");
    assert_eq!(json[0]["peak_end"], "07:50:00");
    assert_eq!(json[0]["trough_start"], "07:50:00");
    assert_eq!(json[0]["trough_end"], "08:10:00");
    assert_eq!(json[1]["peak_start"], "08:10:00");
    assert_eq!(json[4]["cycle"], 5);

    let phases = flatten_phases(&cycles);
    assert_eq!(phases.len(), 10);
    assert!(phases.iter().step_by(2).all(|p| p.kind == PhaseKind::Peak));
}

#[test]
fn test_csv_history_to_vital_index() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "date,wake_time,hrv,rhr,sleep,mood").unwrap();
    writeln!(file, "2024-06-18,06:30,60,55,7.0,🙂").unwrap();
    writeln!(file, "2024-06-19,06:40,70,53,8.0,").unwrap();
    writeln!(file, "2024-06-20,06:50,58.5,57,5.5,😴").unwrap();

    let records = load_history(file.path()).unwrap();
    assert_eq!(records[0].date, date(2024, 6, 20));

    let vital = calculate_vital_index(&records, date(2024, 6, 20)).unwrap();
    assert_eq!(vital.baseline_hrv, 65.0);
    assert_eq!(vital.vital_index, 90.0);
    assert_eq!(vital.status, VitalStatus::Baseline);

    assert!(calculate_vital_index(&records, date(2024, 6, 18)).is_none());
}

#[test]
fn test_vibe_score_canonical_boundaries() {
    let baselines = VibeBaselines {
        hrv: Some(60.0),
        resting_heart_rate: Some(55.0),
    };
    let bio = BioInputs {
        sleep_duration_hours: Some(5.0),
        ..BioInputs::default()
    };
    let humid = WeatherConditions {
        humidity: Some(80.0),
        ..WeatherConditions::default()
    };

    let result = calculate_vibe_score(&bio, &baselines, &humid, "");
    assert_eq!(result.score, 90);
    assert_eq!(result.zone, Zone::Green);

    let humid_high_pressure = WeatherConditions {
        pressure: Some(1036.0),
        ..humid
    };
    let result = calculate_vibe_score(&bio, &baselines, &humid_high_pressure, "");
    assert_eq!(result.score, 89);
    assert_eq!(result.zone, Zone::Yellow);
}

#[test]
fn test_missing_record_is_client_error() {
    let planner = DailyPlanner::new(
        InMemoryStore::new(),
        StaticWeather::default(),
        PlannerSettings::default(),
    );
    let err = planner
        .plan_cycles("josh", date(2024, 6, 20), &UserCycleSettings::default())
        .unwrap_err();

    assert!(err.is_client_error());
    assert_eq!(err.to_string(), "No wake time logged for 2024-06-20");
}

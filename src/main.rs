use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use rhythmrs::config::AppConfig;
use rhythmrs::cycles::{parse_wake_time, CycleEvent, CycleParameters, CycleScheduler, TIME_FORMAT};
use rhythmrs::import::load_history;
use rhythmrs::logging::{init_logging, LogLevel};
use rhythmrs::models::{UserCycleSettings, WeatherConditions};
use rhythmrs::planner::{DailyPlanner, InMemoryStore};
use rhythmrs::vibe::{BioInputs, VibeBaselines, VibeScoreResult, VibeScorer, Zone};
use rhythmrs::vital::VitalIndexResult;
use rhythmrs::weather::{Location, OpenMeteo, StaticWeather};

const CLI_USER: &str = "local";

/// RhythmRS - Ultradian rhythm and readiness CLI
///
/// Plans peak/trough focus cycles from your wake time and scores daily
/// readiness from HRV, resting heart rate, sleep and weather.
#[derive(Parser)]
#[command(name = "rhythmrs")]
#[command(version)]
#[command(about = "Ultradian rhythm and readiness CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate ultradian cycles for a day
    Cycles {
        /// Wake time (HH:MM:SS or HH:MM); read from --history when omitted
        #[arg(short, long)]
        wake: Option<String>,

        /// Biometric history (CSV or JSON) holding the day's wake time
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,

        /// Day to plan (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Peak length in minutes
        #[arg(long)]
        peak: Option<u32>,

        /// Trough length in minutes
        #[arg(long)]
        trough: Option<u32>,

        /// Number of cycles
        #[arg(long)]
        cycles: Option<u32>,

        /// Morning grog in minutes
        #[arg(long)]
        grog: Option<u32>,
    },

    /// Today's HRV relative to your rolling baseline
    Vital {
        /// Biometric history (CSV or JSON)
        #[arg(long, value_name = "FILE")]
        history: PathBuf,

        /// Evaluation day (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Composite 0-100 readiness score
    Vibe {
        /// Biometric history (CSV or JSON); supplies biometrics and baselines
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,

        /// Evaluation day (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// HRV in ms (ignored with --history)
        #[arg(long)]
        hrv: Option<f64>,

        /// Resting heart rate in bpm (ignored with --history)
        #[arg(long)]
        rhr: Option<f64>,

        /// Sleep in hours (ignored with --history)
        #[arg(long)]
        sleep: Option<f64>,

        /// HRV baseline (ignored with --history)
        #[arg(long)]
        baseline_hrv: Option<f64>,

        /// RHR baseline (ignored with --history)
        #[arg(long)]
        baseline_rhr: Option<f64>,

        /// Saved Open-Meteo forecast response
        #[arg(long, value_name = "FILE")]
        weather: Option<PathBuf>,

        /// Air temperature in °C
        #[arg(long, allow_negative_numbers = true)]
        temperature: Option<f64>,

        /// Dew point in °C
        #[arg(long, allow_negative_numbers = true)]
        dew_point: Option<f64>,

        /// Relative humidity in %
        #[arg(long)]
        humidity: Option<f64>,

        /// Sea level pressure in hPa
        #[arg(long)]
        pressure: Option<f64>,

        /// Mood check-in, e.g. 😴
        #[arg(short, long)]
        mood: Option<String>,
    },

    /// Manage the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Tabled)]
struct CycleRow {
    #[tabled(rename = "Cycle")]
    cycle: u32,
    #[tabled(rename = "Peak")]
    peak: String,
    #[tabled(rename = "Trough")]
    trough: String,
}

impl From<&CycleEvent> for CycleRow {
    fn from(event: &CycleEvent) -> Self {
        Self {
            cycle: event.cycle_index,
            peak: format!(
                "{} - {}",
                event.peak_start.format(TIME_FORMAT),
                event.peak_end.format(TIME_FORMAT)
            ),
            trough: format!(
                "{} - {}",
                event.trough_start.format(TIME_FORMAT),
                event.trough_end.format(TIME_FORMAT)
            ),
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from_file(path),
        None => Ok(AppConfig::load_or_default()),
    }
}

fn load_store(path: &Path) -> Result<InMemoryStore> {
    let records = load_history(path)
        .with_context(|| format!("Failed to load history from {}", path.display()))?;
    let mut store = InMemoryStore::new();
    store.extend(CLI_USER, records);
    Ok(store)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_cycles(date: NaiveDate, cycles: &[CycleEvent]) {
    println!("{}", format!("Ultradian cycles for {}", date).cyan().bold());
    if cycles.is_empty() {
        println!("  No cycles requested");
        return;
    }
    let rows: Vec<CycleRow> = cycles.iter().map(CycleRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    if cycles.iter().any(CycleEvent::crosses_midnight) {
        println!("{}", "  Schedule runs past midnight".yellow());
    }
}

/// Thin history is a failed command, not an empty result
fn require_vital(result: Option<VitalIndexResult>, date: NaiveDate) -> Result<VitalIndexResult> {
    result.with_context(|| format!("Not enough HRV data to calculate vital index for {}", date))
}

fn print_vital(result: &VitalIndexResult) {
    println!("{}", "Vital index".cyan().bold());
    println!("  Index:    {}", result.vital_index);
    println!("  Today:    {} ms", result.today_hrv);
    println!("  Baseline: {} ms", result.baseline_hrv);
    println!("  Status:   {}", result.status);
}

fn print_vibe(result: &VibeScoreResult) {
    let zone = match result.zone {
        Zone::Green => result.zone.to_string().green(),
        Zone::Yellow => result.zone.to_string().yellow(),
        Zone::Orange => result.zone.to_string().truecolor(255, 140, 0),
        Zone::Red => result.zone.to_string().red(),
    };
    println!("{} {} ({})", "Vibe score:".bold(), result.score, zone.bold());
    println!("  {}", result.prompt);
    for penalty in &result.penalties {
        println!("  {} {} (-{})", "•".dimmed(), penalty, penalty.points());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if cli.verbose > 0 {
        config.logging.level = LogLevel::from_verbosity(cli.verbose);
    }
    init_logging(&config.logging)?;

    let today = Local::now().date_naive();

    match cli.command {
        Commands::Cycles {
            wake,
            history,
            date,
            peak,
            trough,
            cycles,
            grog,
        } => {
            let date = date.unwrap_or(today);
            let overrides = UserCycleSettings {
                peak_minutes: peak,
                trough_minutes: trough,
                cycle_count: cycles,
                grog_minutes: grog,
            };

            let events = match (wake, history) {
                (Some(wake), _) => {
                    let wake_time = parse_wake_time(&wake)?;
                    let params = CycleParameters::resolve(
                        wake_time,
                        &config.schedule,
                        &UserCycleSettings::default(),
                        &overrides,
                    )?;
                    CycleScheduler::generate(&params, date)?
                }
                (None, Some(history)) => {
                    let planner = DailyPlanner::new(
                        load_store(&history)?,
                        StaticWeather::default(),
                        config.planner_settings(),
                    );
                    planner
                        .plan_cycles(CLI_USER, date, &overrides)
                        .map_err(|e| anyhow::anyhow!(e.user_message()))?
                        .cycles
                }
                (None, None) => anyhow::bail!("Provide --wake or --history"),
            };

            if cli.json {
                print_json(&events)?;
            } else {
                print_cycles(date, &events);
            }
        }

        Commands::Vital { history, date } => {
            let date = date.unwrap_or(today);
            let planner = DailyPlanner::new(
                load_store(&history)?,
                StaticWeather::default(),
                config.planner_settings(),
            );
            let result = require_vital(planner.vital_index(CLI_USER, date), date)?;

            if cli.json {
                print_json(&result)?;
            } else {
                print_vital(&result);
            }
        }

        Commands::Vibe {
            history,
            date,
            hrv,
            rhr,
            sleep,
            baseline_hrv,
            baseline_rhr,
            weather,
            temperature,
            dew_point,
            humidity,
            pressure,
            mood,
        } => {
            let date = date.unwrap_or(today);

            let mut conditions = match weather {
                Some(path) => {
                    let body = fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    OpenMeteo::parse_current(&body)?
                }
                None => WeatherConditions::default(),
            };
            conditions.temperature = temperature.or(conditions.temperature);
            conditions.dew_point = dew_point.or(conditions.dew_point);
            conditions.humidity = humidity.or(conditions.humidity);
            conditions.pressure = pressure.or(conditions.pressure);

            let result = match history {
                Some(history) => {
                    let planner = DailyPlanner::new(
                        load_store(&history)?,
                        StaticWeather(conditions),
                        config.planner_settings(),
                    );
                    let location: Location = config.weather.default_location;
                    planner.vibe_score(CLI_USER, date, location, mood.as_deref())
                }
                None => {
                    let bio = BioInputs {
                        hrv,
                        resting_heart_rate: rhr,
                        sleep_duration_hours: sleep,
                    };
                    let baselines = VibeBaselines {
                        hrv: baseline_hrv,
                        resting_heart_rate: baseline_rhr,
                    };
                    VibeScorer::new(config.vibe.clone()).score(
                        &bio,
                        &baselines,
                        &conditions,
                        mood.as_deref().unwrap_or(""),
                    )
                }
            };

            if cli.json {
                print_json(&result)?;
            } else {
                print_vibe(&result);
            }
        }

        Commands::Config { init, show } => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(AppConfig::default_config_path);

            if init {
                AppConfig::default().save_to_file(&path)?;
                println!("{} {}", "✓ Wrote default configuration to".green(), path.display());
            }
            if show || !init {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhythmrs::models::BiometricRecord;
    use rhythmrs::vital::calculate_vital_index;

    #[test]
    fn test_thin_history_fails_vital_command() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();
        let records = vec![BiometricRecord::new(date).with_hrv(70.0)];

        let err = require_vital(calculate_vital_index(&records, date), date).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Not enough HRV data to calculate vital index for 2024-06-20"
        );

        let records = vec![
            BiometricRecord::new(date).with_hrv(70.0),
            BiometricRecord::new(date.pred_opt().unwrap()).with_hrv(70.0),
        ];
        let result = require_vital(calculate_vital_index(&records, date), date).unwrap();
        assert_eq!(result.vital_index, 100.0);
    }
}

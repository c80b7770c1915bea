use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use std::path::PathBuf;

use racetracker::config::{AppConfig, StoreBackend};
use racetracker::error::{ErrorSeverity, TrackerError};
use racetracker::logging::{init_logging, LogFormat, LogLevel};
use racetracker::models::LifestyleEntry;
use racetracker::progress::{CompletionRule, DayStatus, WeekProgress};
use racetracker::report;
use racetracker::store::open_store;
use racetracker::tracker::{Tracker, WeekSelection};

/// RaceTracker - Race Preparation Tracker
///
/// Follows a week-by-week training plan towards a race: what is planned,
/// what was logged, and how baseline heart rate develops.
#[derive(Parser)]
#[command(name = "racetracker")]
#[command(version = "0.1.0")]
#[command(about = "Race preparation tracker", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Evaluate as if today were this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    as_of: Option<NaiveDate>,

    /// Store backend to use instead of the configured one (sqlite, document)
    #[arg(long, value_name = "BACKEND")]
    store: Option<StoreBackend>,

    /// Store file to use instead of the configured one
    #[arg(long, value_name = "PATH")]
    store_path: Option<PathBuf>,

    /// When a day counts as done (meets-target, any-activity)
    #[arg(long, value_name = "RULE")]
    completion_rule: Option<CompletionRule>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Log format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Days left until the race
    Countdown,

    /// Today's workout and this week's progress
    Today,

    /// Day-by-day progress of one week
    Week {
        /// Week number in the plan
        #[arg(short, long, conflicts_with = "offset")]
        number: Option<u32>,

        /// Weeks relative to the current week (negative goes back)
        #[arg(short, long, allow_hyphen_values = true)]
        offset: Option<i64>,
    },

    /// Progress of every week in the plan
    Weeks,

    /// Heart-rate trend across baseline tests
    Baseline,

    /// Log sleep, weight and wellbeing for a day
    Log {
        /// Day to log (defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Hours slept
        #[arg(long)]
        sleep: Option<Decimal>,

        /// Sleep quality (1-10)
        #[arg(long)]
        sleep_quality: Option<u8>,

        /// Body weight in kg
        #[arg(long)]
        weight: Option<Decimal>,

        /// Energy level (1-10)
        #[arg(long)]
        energy: Option<u8>,

        /// Muscle soreness (1-10)
        #[arg(long)]
        soreness: Option<u8>,

        /// Stress level (1-10)
        #[arg(long)]
        stress: Option<u8>,

        /// Day without added sugar
        #[arg(long)]
        no_sugar: Option<bool>,

        /// Free-text notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Import activities or a training plan
    Import {
        #[command(subcommand)]
        target: ImportTarget,
    },
}

#[derive(Subcommand)]
enum ImportTarget {
    /// Activity export from the fitness service (JSON or CSV)
    Activities {
        /// Input file path
        file: PathBuf,
    },

    /// Training plan (JSON)
    Plan {
        /// Input file path
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    init_logging(&config.logging.clone().with_verbosity(cli.verbose))?;

    if let Err(err) = run(cli, &config) {
        if let Some(tracker_err) = err.downcast_ref::<TrackerError>() {
            match tracker_err.severity() {
                ErrorSeverity::Warning => tracing::warn!(error = %tracker_err, "Command failed"),
                ErrorSeverity::Error | ErrorSeverity::Critical => {
                    tracing::error!(error = %tracker_err, "Command failed")
                }
            }
            eprintln!("{} {}", "✗".red().bold(), tracker_err.user_message().red());
            if tracker_err.is_retryable() {
                eprintln!("  {}", "The store may be busy or locked; try again.".dimmed());
            }
            std::process::exit(1);
        }
        return Err(err);
    }

    Ok(())
}

/// Command-line flags take precedence over the config file
fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(backend) = cli.store {
        config.store.backend = backend;
    }
    if let Some(path) = &cli.store_path {
        config.store.path = path.clone();
    }
    if let Some(rule) = cli.completion_rule {
        config.progress.completion_rule = rule;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
}

fn run(cli: Cli, config: &AppConfig) -> Result<()> {
    let today = cli.as_of.unwrap_or_else(|| Local::now().date_naive());
    let store = open_store(&config.store).map_err(TrackerError::from)?;
    let mut tracker = Tracker::new(store, config);

    match cli.command {
        Commands::Countdown => {
            let days = racetracker::calendar::days_until(config.race.date, today);
            print_countdown(&config.race.name, days);
        }

        Commands::Today => {
            let dashboard = tracker.dashboard(today)?;
            print_countdown(&dashboard.race.name, dashboard.days_to_race);
            println!();

            println!("{}", format!("Today, {}", today).bold());
            match &dashboard.todays_workout {
                Some(workout) => {
                    println!("  {} {}", workout.kind.symbol(), workout.title.bold());
                    if let Some(km) = workout.target_km {
                        println!("  Target: {} km", report::format_km(km));
                    }
                    if let Some(minutes) = workout.target_duration_minutes {
                        println!("  Duration: {} min", minutes);
                    }
                    if let Some(intensity) = workout.intensity {
                        println!("  Intensity: {}", intensity);
                    }
                    if !workout.description.is_empty() {
                        println!("  {}", workout.description.dimmed());
                    }
                }
                None => println!("  {}", "Nothing planned".dimmed()),
            }

            if let Some(progress) = &dashboard.current_week {
                println!();
                print_week_summary(progress);
            }

            if let Some(entry) = &dashboard.lifestyle {
                println!();
                println!("{}", "Logged today".bold());
                if let Some(hours) = entry.sleep_hours {
                    println!("  Sleep: {} h", hours.normalize());
                }
                if let Some(weight) = entry.weight_kg {
                    println!("  Weight: {} kg", weight.normalize());
                }
                if let Some(energy) = entry.energy_level {
                    println!("  Energy: {}/10", energy);
                }
            }
        }

        Commands::Week { number, offset } => {
            let selection = match (number, offset) {
                (Some(number), _) => WeekSelection::Number(number),
                (None, Some(offset)) => WeekSelection::Offset(offset),
                (None, None) => WeekSelection::Current,
            };

            match tracker.week_view(selection, today)? {
                Some(view) => {
                    print_week_summary(&view.progress);
                    if let Some(notes) = &view.progress.week.notes {
                        println!("  {}", notes.italic());
                    }
                    println!("{}", report::week_table(&view.progress));
                    println!(
                        "  Time: {}  Elevation: {} m  Activities: {}",
                        report::format_duration(view.progress.total_moving_time_s),
                        view.progress.total_elevation_m.normalize(),
                        view.progress.activity_count
                    );
                    if view.progress.key_workouts_planned > 0 {
                        println!(
                            "  Key workouts: {}/{}",
                            view.progress.key_workouts_completed, view.progress.key_workouts_planned
                        );
                    }

                    let mut nav = Vec::new();
                    if view.cursor.has_previous() {
                        nav.push("◀ --offset -1");
                    }
                    if !view.is_current {
                        nav.push("current: --offset 0");
                    }
                    if view.cursor.has_next() {
                        nav.push("--offset 1 ▶");
                    }
                    println!("  {}", nav.join("   ").dimmed());
                }
                None => println!("{}", "No training plan loaded. Run `racetracker import plan FILE`.".yellow()),
            }
        }

        Commands::Weeks => {
            let weeks = tracker.weeks_overview(today)?;
            if weeks.is_empty() {
                println!("{}", "No training plan loaded.".yellow());
            } else {
                println!("{}", report::weeks_table(&weeks, today));
            }
        }

        Commands::Baseline => {
            let trend = tracker.baseline_trend(today)?;
            if trend.points.is_empty() {
                println!("{}", "No baseline tests logged yet.".yellow());
                return Ok(());
            }

            println!("{}", report::baseline_table(&trend));
            match (trend.delta_bpm, trend.assessment) {
                (Some(delta), Some(assessment)) => {
                    let line = format!(
                        "{} bpm since first test: {}",
                        report::format_delta(delta),
                        assessment.description()
                    );
                    match assessment {
                        racetracker::TrendAssessment::Favorable => println!("{}", line.green()),
                        racetracker::TrendAssessment::Neutral => println!("{}", line),
                        racetracker::TrendAssessment::Unfavorable => println!("{}", line.red()),
                    }
                }
                _ => println!("{}", "Trend needs two tests with heart-rate data.".dimmed()),
            }
        }

        Commands::Log {
            date,
            sleep,
            sleep_quality,
            weight,
            energy,
            soreness,
            stress,
            no_sugar,
            notes,
        } => {
            let entry = LifestyleEntry {
                date: date.unwrap_or(today),
                sleep_hours: sleep,
                sleep_quality,
                weight_kg: weight,
                energy_level: energy,
                soreness_level: soreness,
                stress_level: stress,
                notes,
                no_sugar,
            };
            tracker.log_lifestyle(&entry)?;
            println!("{}", format!("✓ Logged {}", entry.date).green());
        }

        Commands::Import { target } => match target {
            ImportTarget::Activities { file } => {
                println!("{}", "Importing activities...".green().bold());
                println!("  File: {:?}", file);
                let written = tracker.import_activities(&file)?;
                println!("{}", format!("✓ {} activities stored", written).green());
            }
            ImportTarget::Plan { file } => {
                println!("{}", "Importing training plan...".green().bold());
                println!("  File: {:?}", file);
                let plan = tracker.import_plan(&file)?;
                for issue in &plan.issues {
                    println!("  {} {}", "!".yellow(), issue.to_string().yellow());
                }
                println!(
                    "{}",
                    format!(
                        "✓ {} weeks and {} workouts stored",
                        plan.weeks.len(),
                        plan.workouts.len()
                    )
                    .green()
                );
            }
        },
    }

    Ok(())
}

fn print_countdown(race_name: &str, days: i64) {
    match days {
        0 => println!("{}", format!("Race day: {}!", race_name).green().bold()),
        d if d > 0 => println!("{} days to {}", d.to_string().bold(), race_name),
        d => println!("{} was {} days ago", race_name, -d),
    }
}

fn print_week_summary(progress: &WeekProgress) {
    let week = &progress.week;
    let phase = week
        .phase
        .as_deref()
        .map(|p| format!(" [{}]", p))
        .unwrap_or_default();
    println!(
        "{}",
        format!(
            "Week {} ({}){}",
            week.week_number,
            racetracker::calendar::format_range(&week.range()),
            phase
        )
        .bold()
    );

    if progress.has_distance_target {
        println!(
            "  {} / {} km  ({})",
            report::format_km(progress.total_distance_km),
            report::format_km(week.target_km),
            report::format_percentage(progress.completion_percentage)
        );
    } else {
        println!("  {} km", report::format_km(progress.total_distance_km));
    }

    let tally: Vec<String> = [
        DayStatus::Completed,
        DayStatus::Partial,
        DayStatus::Missed,
        DayStatus::Pending,
    ]
    .into_iter()
    .map(|status| {
        format!(
            "{} {}",
            report::status_symbol(status),
            progress.count_with_status(status)
        )
    })
    .collect();
    println!("  {}", tally.join("  ").dimmed());

    if week.target_elevation_m > Decimal::ZERO {
        println!(
            "  {} / {} m elevation  ({})",
            progress.total_elevation_m.normalize(),
            week.target_elevation_m.normalize(),
            report::format_percentage(progress.elevation_percentage)
        );
    }
}

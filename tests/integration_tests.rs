use chrono::NaiveDate;
use racetracker::config::{AppConfig, StoreBackend, StoreSettings};
use racetracker::{
    open_store, Activity, DateRange, DayStatus, DocumentStore, LifestyleEntry, PlannedWorkout,
    SqliteStore, StoreError, Tracker, TrainingStore, TrendAssessment, Week, WeekSelection,
    WorkoutKind,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs;
use tempfile::tempdir;

/// Integration tests that run complete workflows against both store adapters

fn d(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

fn create_test_week(id: i64, start: NaiveDate) -> Week {
    Week {
        id,
        week_number: id as u32,
        start_date: start,
        end_date: start + chrono::Days::new(6),
        target_km: dec!(40),
        target_elevation_m: dec!(300),
        notes: Some(format!("Week {}", id)),
        phase: Some("base".to_string()),
    }
}

fn create_workout(id: i64, week_id: i64, date: NaiveDate, target_km: Option<Decimal>) -> PlannedWorkout {
    PlannedWorkout {
        id,
        week_id,
        date,
        kind: WorkoutKind::Run,
        target_km,
        target_duration_minutes: Some(60),
        intensity: None,
        is_key_workout: id % 2 == 0,
        title: format!("Workout {}", id),
        description: String::new(),
    }
}

fn create_activity(id: i64, date: NaiveDate, name: &str, km: Decimal) -> Activity {
    Activity {
        id,
        date,
        kind: "Run".to_string(),
        name: name.to_string(),
        distance_km: km,
        moving_time_s: 3000,
        elevation_gain_m: dec!(45.5),
        average_heartrate: Some(dec!(150.4)),
        max_heartrate: Some(dec!(171)),
    }
}

/// Behaviour every `TrainingStore` adapter must share
fn check_store_contract(store: &mut dyn TrainingStore) {
    // Saved out of order; reads come back ordered
    let weeks = vec![create_test_week(2, d(1, 12)), create_test_week(1, d(1, 5))];
    let workouts = vec![
        create_workout(3, 2, d(1, 14), Some(dec!(12))),
        create_workout(2, 1, d(1, 8), None),
        create_workout(1, 1, d(1, 6), Some(dec!(10))),
    ];
    store.save_plan(&weeks, &workouts).unwrap();

    let fetched = store.fetch_weeks().unwrap();
    assert_eq!(fetched.iter().map(|w| w.week_number).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(fetched[0], weeks[1]);

    let week_one = store.fetch_workouts_for_week(1).unwrap();
    assert_eq!(week_one.iter().map(|w| w.id).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(week_one[0], workouts[2]);

    let in_range = store
        .fetch_workouts_in_range(DateRange::new(d(1, 8), d(1, 14)))
        .unwrap();
    assert_eq!(in_range.iter().map(|w| w.id).collect::<Vec<_>>(), vec![2, 3]);

    // Replacing a week by id keeps a single copy
    let mut renamed = create_test_week(1, d(1, 5));
    renamed.target_km = dec!(42.5);
    store.save_plan(&[renamed], &[]).unwrap();
    let fetched = store.fetch_weeks().unwrap();
    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched[0].target_km, dec!(42.5));

    let activities = vec![
        create_activity(11, d(1, 7), "Easy", dec!(8.25)),
        create_activity(10, d(1, 6), "Baseline", dec!(12)),
        create_activity(12, d(1, 20), "Outside", dec!(5)),
    ];
    assert_eq!(store.upsert_activities(&activities).unwrap(), 3);

    let in_week = store.fetch_activities(DateRange::new(d(1, 5), d(1, 11))).unwrap();
    assert_eq!(in_week.iter().map(|a| a.id).collect::<Vec<_>>(), vec![10, 11]);
    assert_eq!(in_week[1], activities[0]);

    let mut longer = create_activity(11, d(1, 7), "Easy", dec!(9));
    longer.average_heartrate = None;
    assert_eq!(store.upsert_activities(&[longer.clone()]).unwrap(), 1);
    let in_week = store.fetch_activities(DateRange::new(d(1, 5), d(1, 11))).unwrap();
    assert_eq!(in_week.len(), 2);
    assert_eq!(in_week[1], longer);

    let entry = LifestyleEntry {
        sleep_hours: Some(dec!(7.25)),
        sleep_quality: Some(8),
        weight_kg: Some(dec!(71.4)),
        no_sugar: Some(true),
        notes: Some("Felt good".to_string()),
        ..LifestyleEntry::new(d(1, 6))
    };
    store.upsert_lifestyle("runner-1", &entry).unwrap();
    assert_eq!(store.fetch_lifestyle("runner-1", d(1, 6)).unwrap(), Some(entry.clone()));
    assert_eq!(store.fetch_lifestyle("runner-2", d(1, 6)).unwrap(), None);

    let updated = LifestyleEntry {
        energy_level: Some(4),
        ..entry
    };
    store.upsert_lifestyle("runner-1", &updated).unwrap();
    assert_eq!(store.fetch_lifestyle("runner-1", d(1, 6)).unwrap(), Some(updated));

    let err = store
        .upsert_lifestyle("", &LifestyleEntry::new(d(1, 6)))
        .unwrap_err();
    assert!(matches!(err, StoreError::Unauthenticated));
}

#[test]
fn test_sqlite_store_contract() {
    let dir = tempdir().unwrap();
    let mut store = SqliteStore::open(dir.path().join("racetracker.db")).unwrap();
    check_store_contract(&mut store);
}

#[test]
fn test_document_store_contract() {
    let dir = tempdir().unwrap();
    let mut store = DocumentStore::open(dir.path().join("racetracker.json")).unwrap();
    check_store_contract(&mut store);
}

#[test]
fn test_stores_persist_across_reopen() {
    let dir = tempdir().unwrap();

    for backend in [StoreBackend::Sqlite, StoreBackend::Document] {
        let settings = StoreSettings {
            backend,
            path: dir.path().join(format!("store-{:?}", backend)),
        };

        {
            let mut store = open_store(&settings).unwrap();
            store
                .save_plan(&[create_test_week(1, d(1, 5))], &[])
                .unwrap();
            store
                .upsert_activities(&[create_activity(1, d(1, 6), "Run", dec!(10))])
                .unwrap();
        }

        let store = open_store(&settings).unwrap();
        assert_eq!(store.fetch_weeks().unwrap().len(), 1, "{:?}", backend);
        assert_eq!(
            store
                .fetch_activities(DateRange::new(d(1, 5), d(1, 11)))
                .unwrap()
                .len(),
            1,
            "{:?}",
            backend
        );
    }
}

#[test]
fn test_timestamped_activities_match_by_date() {
    let activity = create_activity(1, d(1, 11), "Late run", dec!(6));
    let week = DateRange::new(d(1, 5), d(1, 11));

    let mut sqlite = SqliteStore::open_in_memory().unwrap();
    sqlite
        .insert_activity_with_timestamp(&activity, "2026-01-11T23:15:00Z")
        .unwrap();
    assert_eq!(sqlite.fetch_activities(week).unwrap(), vec![activity.clone()]);

    let mut document = DocumentStore::in_memory();
    document
        .insert_activity_document(&activity, "2026-01-11T23:15:00Z")
        .unwrap();
    assert_eq!(document.fetch_activities(week).unwrap(), vec![activity]);
}

#[test]
fn test_import_and_review_workflow() {
    let dir = tempdir().unwrap();
    let plan_path = dir.path().join("plan.json");
    let activities_path = dir.path().join("activities.csv");

    fs::write(
        &plan_path,
        r#"{"weeks": [
            {"id": 1, "week_number": 1, "start_date": "2026-01-05", "end_date": "2026-01-11",
             "target_km": 40, "phase": "base",
             "workouts": [
                {"id": 1, "date": "2026-01-06", "kind": "run", "target_km": 10, "title": "Easy run"},
                {"id": 2, "date": "2026-01-08", "kind": "strength", "title": "Gym"},
                {"id": 3, "date": "2026-01-10", "kind": "long_run", "target_km": 20,
                 "is_key_workout": true, "intensity": "moderate", "title": "Long run"}
             ]},
            {"id": 2, "week_number": 2, "start_date": "2026-01-12", "end_date": "2026-01-18",
             "target_km": 0}
        ]}"#,
    )
    .unwrap();

    fs::write(
        &activities_path,
        "id,date,kind,name,distance_km,moving_time_s,elevation_gain_m,average_heartrate,max_heartrate\n\
         101,2026-01-06T07:30:00,Run,Baseline test,12,3900,40,160,175\n\
         102,2026-01-08,Workout,Gym,0,2700,,,\n\
         103,2026-01-10,Run,Long run,15,5400,120,,\n\
         104,2026-01-13,Run,Baseline test,6,2000,10,150,168\n",
    )
    .unwrap();

    let config = AppConfig {
        user_id: Some("runner-1".to_string()),
        store: StoreSettings {
            backend: StoreBackend::Sqlite,
            path: dir.path().join("racetracker.db"),
        },
        ..AppConfig::default()
    };
    let mut tracker = Tracker::new(open_store(&config.store).unwrap(), &config);

    let plan = tracker.import_plan(&plan_path).unwrap();
    assert_eq!(plan.weeks.len(), 2);
    assert!(plan.issues.is_empty());
    assert_eq!(tracker.import_activities(&activities_path).unwrap(), 4);

    // Evaluated on Friday of week one
    let view = tracker
        .week_view(WeekSelection::Current, d(1, 9))
        .unwrap()
        .unwrap();
    let progress = &view.progress;
    assert_eq!(progress.total_distance_km, dec!(27));
    assert_eq!(progress.completion_percentage, dec!(67.5));
    assert_eq!(progress.day(d(1, 5)).unwrap().status, DayStatus::Missed);
    assert_eq!(progress.day(d(1, 6)).unwrap().status, DayStatus::Completed);
    assert_eq!(progress.day(d(1, 8)).unwrap().status, DayStatus::Completed);
    assert_eq!(progress.day(d(1, 10)).unwrap().status, DayStatus::Partial);
    assert_eq!(progress.day(d(1, 11)).unwrap().status, DayStatus::Pending);
    assert_eq!(progress.key_workouts_planned, 1);
    assert_eq!(progress.key_workouts_completed, 0);

    // A zero target never reports progress
    let next = tracker
        .week_view(WeekSelection::Offset(1), d(1, 9))
        .unwrap()
        .unwrap();
    assert!(!next.progress.has_distance_target);
    assert_eq!(next.progress.completion_percentage, Decimal::ZERO);

    let trend = tracker.baseline_trend(d(1, 20)).unwrap();
    assert_eq!(trend.delta_bpm, Some(dec!(-10)));
    assert_eq!(trend.assessment, Some(TrendAssessment::Favorable));

    let dashboard = tracker.dashboard(d(1, 10)).unwrap();
    assert_eq!(dashboard.todays_workout.map(|w| w.title), Some("Long run".to_string()));
}

#[test]
fn test_plan_with_stray_workout_is_not_stored() {
    let dir = tempdir().unwrap();
    let plan_path = dir.path().join("plan.json");
    fs::write(
        &plan_path,
        r#"{"weeks": [{"id": 1, "week_number": 1, "start_date": "2026-01-05",
            "end_date": "2026-01-11", "target_km": 40,
            "workouts": [{"id": 1, "date": "2026-02-01", "kind": "run", "title": "Stray"}]}]}"#,
    )
    .unwrap();

    let mut tracker = Tracker::new(Box::new(DocumentStore::in_memory()), &AppConfig::default());
    assert!(tracker.import_plan(&plan_path).is_err());
    assert!(tracker
        .week_view(WeekSelection::Current, d(1, 6))
        .unwrap()
        .is_none());
}

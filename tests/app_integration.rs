// Integration tests for the application facade with file-backed stores
//
// Each test builds the stores the same way the binary does, from an AppConfig pointing into a
// temporary directory.

use std::time::Duration;

use karttimer::storage::{DriverRemoval, MAX_DRIVERS};
use karttimer::{AppConfig, Database, DriverProfiles, KartTimer, KartTimerError, WeatherCondition};
use tempfile::TempDir;

fn config(temp_dir: &TempDir) -> AppConfig {
    AppConfig {
        database_path: Some(temp_dir.path().join("karttimer.db")),
        profiles_path: Some(temp_dir.path().join("drivers.json")),
        ..Default::default()
    }
}

fn open_app(config: &AppConfig) -> KartTimer<Database, DriverProfiles> {
    let database = Database::open(&config.database_path().unwrap())
        .unwrap()
        .with_session_list_limit(config.session_list_limit);
    let profiles = DriverProfiles::open(config.profiles_path().unwrap()).unwrap();
    KartTimer::new(database, profiles, config)
}

#[test]
fn test_recorded_session_visible_after_restart() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);

    let session_id = {
        let mut app = open_app(&config);
        let alice = app.add_driver("Alice", "7").unwrap().unwrap();
        app.select_driver(alice.id).unwrap();
        app.set_session_name("Practice");
        app.set_weather(WeatherCondition::Greasy);

        app.start_timer().unwrap();
        // 50 ms ticks
        for _ in 0..40 {
            app.tick();
        }
        assert_eq!(app.record_lap(), Some(Duration::from_secs(2)));
        for _ in 0..30 {
            app.tick();
        }
        app.record_lap();
        app.save_session().unwrap()
    };

    let app = open_app(&config);
    assert_eq!(app.list_drivers().len(), 1);
    let session = app.get_session(session_id).unwrap().unwrap();
    assert_eq!(session.driver_name, "Alice");
    assert_eq!(session.kart_number, "7");
    assert_eq!(session.weather, WeatherCondition::Greasy);
    let times: Vec<f64> = session.laps.iter().map(|l| l.lap_time).collect();
    assert_eq!(times, vec![2.0, 1.5]);
}

#[test]
fn test_driver_profiles_capped_across_restarts() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);

    {
        let mut app = open_app(&config);
        for i in 0..MAX_DRIVERS {
            assert!(
                app.add_driver(&format!("Driver {}", i), &i.to_string())
                    .unwrap()
                    .is_some()
            );
        }
    }

    let mut app = open_app(&config);
    assert_eq!(app.list_drivers().len(), MAX_DRIVERS);
    assert!(app.add_driver("Eleventh", "11").unwrap().is_none());
    assert_eq!(app.list_drivers().len(), MAX_DRIVERS);

    let first = app.list_drivers()[0].id;
    assert!(app.delete_driver(first).unwrap());
    assert!(app.add_driver("Eleventh", "11").unwrap().is_some());
}

#[test]
fn test_deleted_driver_cannot_start_a_session() {
    let temp_dir = TempDir::new().unwrap();
    let mut app = open_app(&config(&temp_dir));

    let bob = app.add_driver("Bob", "12").unwrap().unwrap();
    app.select_driver(bob.id).unwrap();
    app.set_session_name("Qualifying");
    app.delete_driver(bob.id).unwrap();

    assert!(matches!(
        app.start_timer(),
        Err(KartTimerError::ConstraintViolation { .. })
    ));
    assert!(matches!(
        app.select_driver(bob.id),
        Err(KartTimerError::DriverNotFound { .. })
    ));
}

#[test]
fn test_multi_kart_session_flow() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);
    let mut app = open_app(&config);

    if let Some(slot) = app.multi_mut().slot_mut(0) {
        slot.name = "Alice".to_string();
        slot.kart_number = "7".to_string();
    }
    app.start_slot(0);
    app.start_slot(1);
    // 10 ms ticks
    for _ in 0..100 {
        app.tick_slots();
    }
    app.record_slot_lap(0);
    app.record_slot_lap(1);
    app.stop_slot(1);
    for _ in 0..50 {
        app.tick_slots();
    }
    app.record_slot_lap(0);
    // slot 1 is paused so this lap is ignored
    assert_eq!(app.record_slot_lap(1), None);

    let id = app.save_multiple_session(None).unwrap();
    assert!(!app.multi().any_running());

    let app_after_restart = open_app(&config);
    let sessions = app_after_restart.list_multiple_sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, id);
    assert_eq!(sessions[0].session_name, "Practice Session");
    assert_eq!(sessions[0].drivers.len(), 2);
    assert_eq!(sessions[0].drivers[0].driver_name, "Alice");
    assert_eq!(sessions[0].drivers[0].kart_number, "7");
    let alice_times: Vec<f64> = sessions[0].drivers[0]
        .laps
        .iter()
        .map(|l| l.lap_time)
        .collect();
    assert_eq!(alice_times, vec![1.0, 0.5]);
    assert_eq!(sessions[0].drivers[1].driver_name, "Kart 2");

    let mut app = app_after_restart;
    let kart_two = sessions[0].drivers[1].id;
    let alice = sessions[0].drivers[0].id;
    assert_eq!(
        app.delete_multiple_driver(id, kart_two).unwrap(),
        DriverRemoval::DriverRemoved
    );
    assert_eq!(
        app.delete_multiple_driver(id, alice).unwrap(),
        DriverRemoval::SessionRemoved
    );
    assert!(app.list_multiple_sessions().unwrap().is_empty());
}

#[test]
fn test_stop_all_discards_without_saving() {
    let temp_dir = TempDir::new().unwrap();
    let mut app = open_app(&config(&temp_dir));

    app.start_slot(2);
    for _ in 0..10 {
        app.tick_slots();
    }
    app.record_slot_lap(2);
    app.stop_all();

    assert!(app.multi().slots().iter().all(|s| s.stopwatch().laps().is_empty()));
    assert!(matches!(
        app.save_multiple_session(Some("Heat")),
        Err(KartTimerError::ConstraintViolation { .. })
    ));
    assert!(app.list_multiple_sessions().unwrap().is_empty());
}

use digipet::clock::ManualClock;
use digipet::config::{load_settings, project_paths, save_settings_atomic, Settings};
use digipet::model::{PetState, Rules};
use digipet::service::PetService;
use digipet::sim::Action;
use digipet::storage::{JsonFileStore, PetStore};
use std::fs;
use std::sync::Arc;
use std::thread;

#[test]
fn pet_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let paths = project_paths(Some(dir.path())).unwrap();
    let clock = ManualClock::new(1_000_000);

    let first = PetService::new(JsonFileStore::new(&paths.pet_path), clock.clone(), Rules::default());
    first.load();
    clock.advance_minutes(60 * 24 * 2);
    first.resume();
    let (fed, outcome) = first.act(Action::Feed);
    assert!(outcome.is_applied());
    drop(first);

    let second = PetService::new(JsonFileStore::new(&paths.pet_path), clock, Rules::default());
    assert_eq!(second.load(), fed);
}

#[test]
fn file_holds_flat_camel_case_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("pet.json"));
    let mut pet = PetState::fresh(42);
    pet.set_age(4.0);
    store.save(&pet).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(raw["lastUpdate"], 42);
    assert_eq!(raw["stage"], "teen");
    assert_eq!(raw["milestonesAchieved"], 0);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn corrupt_file_degrades_to_fresh_pet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pet.json");
    fs::write(&path, "not json at all").unwrap();

    let svc = PetService::new(JsonFileStore::new(&path), ManualClock::new(9), Rules::default());
    assert_eq!(svc.load(), PetState::fresh(9));
    assert_eq!(JsonFileStore::new(&path).load().unwrap(), Some(PetState::fresh(9)));
}

#[test]
fn clearing_a_missing_file_is_fine() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("pet.json"));
    store.clear().unwrap();
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn settings_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let paths = project_paths(Some(&dir.path().join("nested"))).unwrap();
    assert_eq!(load_settings(&paths.settings_path), Settings::default());

    let settings = Settings {
        enable_color: false,
        alert_cooldown_secs: 30,
        ..Settings::default()
    };
    save_settings_atomic(&paths.settings_path, &settings).unwrap();
    assert_eq!(load_settings(&paths.settings_path), settings);
    assert_eq!(settings.alert_cooldown_ms(), 30_000);
}

#[test]
fn concurrent_writers_never_expose_a_broken_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path().join("pet.json")));
    store.save(&PetState::fresh(0)).unwrap();

    let workers: Vec<_> = (0..4)
        .map(|n| {
            let store = store.clone();
            thread::spawn(move || {
                let mut pet = PetState::fresh(n);
                pet.set_age(1.0 + n as f64);
                let mut failures = 0;
                for _ in 0..500 {
                    if store.save(&pet).is_err() {
                        failures += 1;
                    }
                    match store.load() {
                        Ok(Some(_)) => {}
                        _ => failures += 1,
                    }
                }
                failures
            })
        })
        .collect();

    for worker in workers {
        assert_eq!(worker.join().unwrap(), 0);
    }
    assert!(store.load().unwrap().is_some());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

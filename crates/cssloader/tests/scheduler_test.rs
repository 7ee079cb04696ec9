//! Scheduler engine behavior over a real file-backed schedule.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use cssloader::scheduler::{ManualClock, ScheduleEngine, ScheduledChange, TimeOfDay};
use cssloader::store::ScheduleStore;
use cssloader::store::file::FileScheduleStore;
use cssloader::theme::{Flag, PresetApplier, PresetRegistry, Theme, ThemeError};

#[derive(Default)]
struct RecordingApplier {
    applied: Mutex<Vec<String>>,
}

#[async_trait]
impl PresetApplier for RecordingApplier {
    async fn apply_preset(&self, name: &str) -> Result<(), ThemeError> {
        self.applied.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

fn preset(id: &str, name: &str) -> Theme {
    Theme {
        id: id.to_string(),
        name: name.to_string(),
        display_name: name.to_string(),
        version: "v1.0".to_string(),
        author: String::new(),
        enabled: false,
        flags: vec![Flag::Preset],
        dependencies: vec![],
        bundled: false,
    }
}

fn presets() -> Vec<Theme> {
    vec![
        preset("p-morning", "Morning"),
        preset("p-evening", "Evening"),
        preset("p-night", "Night"),
    ]
}

struct Harness {
    engine: ScheduleEngine,
    store: Arc<FileScheduleStore>,
    clock: Arc<ManualClock>,
    registry: PresetRegistry,
    applier: Arc<RecordingApplier>,
}

fn harness(temp_dir: &TempDir) -> Harness {
    let store = Arc::new(FileScheduleStore::new(temp_dir.path().join("schedule.yaml")));
    let clock = Arc::new(ManualClock::new(TimeOfDay::new(0, 0).unwrap()));
    let registry = PresetRegistry::with_themes(presets());
    let applier = Arc::new(RecordingApplier::default());
    let engine = ScheduleEngine::new(
        clock.clone(),
        registry.clone(),
        applier.clone(),
        store.clone(),
    );
    Harness {
        engine,
        store,
        clock,
        registry,
        applier,
    }
}

/// Small deterministic generator so failures reproduce.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

async fn assert_consistent(h: &Harness) {
    let entries = h.engine.entries();

    let times: Vec<_> = entries.iter().map(|e| (e.hours, e.minutes)).collect();
    let mut sorted = times.clone();
    sorted.sort();
    assert_eq!(times, sorted, "entries out of time order");

    let entry_ids: BTreeSet<_> = entries.iter().map(|e| e.id.as_str()).collect();
    let listener_ids: BTreeSet<_> = h.engine.listeners().ids().collect();
    assert_eq!(entry_ids, listener_ids);
    assert_eq!(entry_ids.len(), entries.len(), "duplicate ids");
    assert_eq!(h.engine.subscription_count(), entries.len());

    assert_eq!(h.store.load().await.unwrap(), entries.to_vec());
}

#[tokio::test]
async fn random_upserts_and_removes_keep_schedule_consistent() {
    let temp_dir = TempDir::new().unwrap();
    let mut h = harness(&temp_dir);
    let mut rng = XorShift(0x9e37_79b9_7f4a_7c15);
    let profiles = ["p-morning", "p-evening", "p-night"];

    for _ in 0..200 {
        let id = format!("c{}", rng.below(12));
        if rng.below(3) == 0 {
            let existed = h.engine.get(&id).is_some();
            let result = h.engine.remove(&id).await;
            assert_eq!(result.is_ok(), existed);
        } else {
            let change = ScheduledChange {
                id,
                profile_id: profiles[rng.below(3) as usize].to_string(),
                hours: rng.below(24) as u8,
                minutes: rng.below(60) as u8,
            };
            h.engine.upsert(change).await.unwrap();
        }
        assert_consistent(&h).await;
    }
}

#[tokio::test]
async fn equal_times_keep_insertion_order() {
    let temp_dir = TempDir::new().unwrap();
    let mut h = harness(&temp_dir);

    for id in ["first", "second", "third"] {
        h.engine
            .upsert(ScheduledChange {
                id: id.to_string(),
                profile_id: "p-morning".to_string(),
                hours: 9,
                minutes: 0,
            })
            .await
            .unwrap();
    }

    let ids: Vec<_> = h.engine.entries().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn only_the_matching_minute_fires() {
    let temp_dir = TempDir::new().unwrap();
    let mut h = harness(&temp_dir);

    h.engine
        .upsert(ScheduledChange::new("p-morning".to_string(), 7, 30))
        .await
        .unwrap();
    h.engine
        .upsert(ScheduledChange::new("p-evening".to_string(), 19, 0))
        .await
        .unwrap();

    h.clock.set(TimeOfDay::new(7, 29).unwrap());
    assert!(h.engine.tick().await.is_empty());

    h.clock.set(TimeOfDay::new(7, 30).unwrap());
    assert_eq!(h.engine.tick().await.applied, vec!["Morning"]);

    h.clock.set(TimeOfDay::new(19, 0).unwrap());
    assert_eq!(h.engine.tick().await.applied, vec!["Evening"]);

    assert_eq!(*h.applier.applied.lock().unwrap(), vec!["Morning", "Evening"]);
}

#[tokio::test]
async fn change_for_deleted_preset_is_dropped_when_it_fires() {
    let temp_dir = TempDir::new().unwrap();
    let mut h = harness(&temp_dir);

    let change = ScheduledChange::new("p-night".to_string(), 22, 0);
    let id = change.id.clone();
    h.engine.upsert(change).await.unwrap();
    h.engine
        .upsert(ScheduledChange::new("p-morning".to_string(), 6, 0))
        .await
        .unwrap();

    h.registry.replace(
        presets()
            .into_iter()
            .filter(|t| t.id != "p-night")
            .collect(),
    );

    // Still listed until its time comes.
    assert!(h.engine.get(&id).is_some());

    h.clock.set(TimeOfDay::new(22, 0).unwrap());
    let report = h.engine.tick().await;
    assert!(report.applied.is_empty());
    assert_eq!(report.removed, vec![id.clone()]);

    assert!(h.engine.get(&id).is_none());
    assert_consistent(&h).await;
    assert!(h.applier.applied.lock().unwrap().is_empty());
}

#[tokio::test]
async fn restore_rebuilds_listeners_from_disk() {
    let temp_dir = TempDir::new().unwrap();

    let expected = {
        let mut h = harness(&temp_dir);
        h.engine
            .upsert(ScheduledChange::new("p-evening".to_string(), 20, 0))
            .await
            .unwrap();
        h.engine
            .upsert(ScheduledChange::new("p-morning".to_string(), 6, 45))
            .await
            .unwrap();
        h.engine.entries().to_vec()
    };

    let mut h = harness(&temp_dir);
    assert_eq!(h.engine.restore().await.unwrap(), 2);
    assert_eq!(h.engine.entries(), &expected[..]);
    assert_consistent(&h).await;

    h.clock.set(TimeOfDay::new(6, 45).unwrap());
    assert_eq!(h.engine.tick().await.applied, vec!["Morning"]);
}

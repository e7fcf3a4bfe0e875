//! Game session: main-menu teardown, pickup collection and day-rollover
//! drops, driven through scene events and ticks.

use haven_core::{
    clock::GameClock,
    collab::{in_memory_providers, MemoryInventory, MemoryPlacedObjects, MemorySpawner, StaticCatalog},
    config::SaveConfig,
    drops::RolloverStatus,
    event::{change_channel, SceneEvent},
    pickup::RegistryState,
    prefs::SqlitePrefs,
    provider::SnapshotProvider,
    session::GameSession,
    types::Vec3,
};
use std::path::Path;

const FRAME: f64 = 1.0 / 60.0;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with_material("wood")
        .with_material("clay")
        .with_furniture(
            "oak_chair",
            &[("wood", 1.0), ("None", 1.0), ("clay", 0.0), ("", 1.0)],
        )
}

fn build_session(root: &Path, async_placed: bool) -> GameSession {
    let (notifier, changes) = change_channel();
    let mut providers = in_memory_providers(catalog(), &["Arrival"], &notifier);
    if async_placed {
        providers.placed = Box::new(MemoryPlacedObjects::new(Some(notifier.clone())).with_async_loads());
    }
    let config = SaveConfig::default_test(root);
    let prefs = SqlitePrefs::open(&config.prefs_file()).expect("prefs");
    GameSession::start(config, providers, changes, Box::new(prefs), Box::new(MemorySpawner::new()))
        .expect("start session")
}

fn load_scene(session: &mut GameSession, scene: &str) {
    let from = session.active_scene().to_string();
    session
        .handle_scene_event(SceneEvent::Loaded { scene: scene.to_string() })
        .expect("scene loaded");
    session
        .handle_scene_event(SceneEvent::ActiveChanged { from, to: scene.to_string() })
        .expect("active scene changed");
}

fn placed(session: &mut GameSession) -> &mut MemoryPlacedObjects {
    session
        .store_mut()
        .providers_mut()
        .placed
        .as_any_mut()
        .downcast_mut()
        .expect("memory placed objects")
}

fn inventory(session: &GameSession) -> &MemoryInventory {
    session
        .store()
        .providers()
        .inventory
        .as_any()
        .downcast_ref()
        .expect("memory inventory")
}

#[test]
fn main_menu_tears_down_and_next_scene_rebuilds() {
    init_logs();
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = build_session(dir.path(), false);

    load_scene(&mut session, "Meadow");
    session.store_mut().load("Story0").expect("load slot");
    session
        .pickups_mut()
        .register("Meadow", "wood", Vec3::new(3.0, 0.0, 3.0), None)
        .expect("register");

    load_scene(&mut session, "MainMenu");
    assert!(session.store().active_slot().is_none());
    assert!(!session.store().autosave_running());
    assert_eq!(session.pickups().state(), RegistryState::Destroyed);

    load_scene(&mut session, "Meadow");
    assert_eq!(session.pickups().state(), RegistryState::Active);
    assert_eq!(session.pickups().drops_in("Meadow").len(), 1);

    session.tick(FRAME);
    assert_eq!(session.pickups().spawner().live_count(), 1);
}

#[test]
fn scene_switch_saves_the_active_slot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = build_session(dir.path(), false);
    load_scene(&mut session, "Meadow");
    session.store_mut().load("Story0").expect("load slot");

    load_scene(&mut session, "Cave");
    let header = session
        .store()
        .load_metadata("Story0")
        .expect("metadata")
        .expect("saved on scene switch");
    assert_eq!(header.location, "Cave");
}

#[test]
fn collecting_a_pickup_moves_it_into_the_inventory() {
    init_logs();
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = build_session(dir.path(), false);
    load_scene(&mut session, "Meadow");
    session.store_mut().load("Story0").expect("load slot");

    let at = Vec3::new(1.0, 0.0, 1.0);
    session.pickups_mut().spawn_now("Meadow", "clay", at).expect("spawn");

    let removed = session
        .collect_pickup("clay", at.offset(0.01, 0.0, 0.0), None)
        .expect("collect");
    assert_eq!(removed, 1);
    assert_eq!(inventory(&session).material_count("clay"), 1);
    assert_eq!(session.pickups().total_drops(), 0);

    let saves = session.store().save_count();
    session.tick(FRAME);
    assert_eq!(session.store().save_count(), saves + 1, "inventory change saves");
}

#[test]
fn sleeping_into_a_new_day_rolls_drops() {
    init_logs();
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = build_session(dir.path(), false);
    load_scene(&mut session, "Meadow");

    let chair_at = Vec3::new(10.0, 0.0, -4.0);
    placed(&mut session).place("oak_chair", "Meadow", chair_at);
    placed(&mut session).place("oak_chair", "Cave", Vec3::ZERO);
    session
        .pickups_mut()
        .register("Meadow", "wood", Vec3::new(50.0, 0.0, 50.0), None)
        .expect("yesterday's pickup");

    let mut clock = GameClock::new(None);
    let day = clock.sleep_until(6.0 * 60.0);
    assert_eq!(day, 2);

    assert!(session.on_sleep_advanced_day(day).expect("advance day"));
    assert_eq!(session.pickups().total_drops(), 0, "yesterday's pickups are cleared");
    assert!(!session.on_sleep_advanced_day(day).expect("same day again"));

    let RolloverStatus::Rolled(summary) = session.tick(FRAME) else {
        panic!("roll should run as soon as placed objects are ready");
    };
    assert_eq!(summary.day, 2);
    assert_eq!(summary.spawned, 1);
    assert_eq!(summary.registered, 1);
    assert!(!summary.timed_out);

    let meadow = session.pickups().drops_in("Meadow");
    assert_eq!(meadow.len(), 1);
    assert_eq!(meadow[0].material_id, "wood");
    let p = meadow[0].position;
    assert_eq!(p.y, chair_at.y + 1.0);
    let dx = p.x - chair_at.x;
    let dz = p.z - chair_at.z;
    assert!(dx * dx + dz * dz <= 1.0 + 1e-4);
    assert_eq!(session.pickups().drops_in("Cave").len(), 1);
    assert_eq!(session.pickups().spawner().live_count(), 1);

    assert_eq!(session.tick(FRAME), RolloverStatus::Idle);
}

#[test]
fn drop_roll_waits_for_placed_objects_then_gives_up() {
    init_logs();
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = build_session(dir.path(), true);
    load_scene(&mut session, "Meadow");
    placed(&mut session).place("oak_chair", "Meadow", Vec3::ZERO);

    session.on_sleep_advanced_day(2).expect("advance day");
    assert_eq!(session.tick(1.0), RolloverStatus::Waiting { day: 2 });
    assert!(session.rollover_pending());

    let RolloverStatus::Rolled(summary) = session.tick(1.5) else {
        panic!("roll should proceed after the timeout");
    };
    assert!(summary.timed_out);
    assert_eq!(summary.spawned, 1);
    assert!(!session.rollover_pending());
}

#[test]
fn drop_roll_runs_once_placed_objects_finish_loading() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = build_session(dir.path(), true);
    load_scene(&mut session, "Meadow");
    placed(&mut session).place("oak_chair", "Cave", Vec3::ZERO);

    session.on_sleep_advanced_day(3).expect("advance day");
    assert_eq!(session.tick(0.5), RolloverStatus::Waiting { day: 3 });
    placed(&mut session).finish_loading();

    let RolloverStatus::Rolled(summary) = session.tick(0.5) else {
        panic!("roll should run once loading finished");
    };
    assert!(!summary.timed_out);
    assert_eq!(summary.registered, 1);
    assert_eq!(session.pickups().spawner().live_count(), 0);
}

#[test]
fn main_menu_drops_a_pending_roll() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = build_session(dir.path(), true);
    load_scene(&mut session, "Meadow");
    session.on_sleep_advanced_day(2).expect("advance day");
    assert!(session.rollover_pending());

    load_scene(&mut session, "MainMenu");
    assert!(!session.rollover_pending());
    assert_eq!(session.tick(5.0), RolloverStatus::Idle);
}

#[test]
fn sleeping_while_the_registry_is_down_keeps_the_day_open() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = build_session(dir.path(), false);
    load_scene(&mut session, "Meadow");
    load_scene(&mut session, "MainMenu");

    assert!(session.on_sleep_advanced_day(2).is_err(), "registry is destroyed");
    assert!(!session.rollover_pending());

    load_scene(&mut session, "Meadow");
    placed(&mut session).place("oak_chair", "Meadow", Vec3::ZERO);
    assert!(session.on_sleep_advanced_day(2).expect("retry same day"));
    let RolloverStatus::Rolled(summary) = session.tick(FRAME) else {
        panic!("roll should run for the retried day");
    };
    assert_eq!(summary.day, 2);
    assert_eq!(summary.spawned, 1);
}

#[test]
fn collecting_at_a_shared_anchor_keeps_other_materials() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = build_session(dir.path(), false);
    load_scene(&mut session, "Meadow");
    session.store_mut().load("Story0").expect("load slot");

    let pickups = session.pickups_mut();
    pickups.register("Meadow", "wood", Vec3::ZERO, Some("tree-1")).expect("wood");
    pickups.register("Meadow", "clay", Vec3::ZERO, Some("tree-1")).expect("clay");

    let removed = session
        .collect_pickup("clay", Vec3::new(9.0, 0.0, 9.0), Some("tree-1"))
        .expect("collect");
    assert_eq!(removed, 1);
    let meadow = session.pickups().drops_in("Meadow");
    assert_eq!(meadow.len(), 1);
    assert_eq!(meadow[0].material_id, "wood");
}

#[test]
fn shutdown_saves_slot_and_pickups() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let mut session = build_session(dir.path(), false);
        load_scene(&mut session, "Meadow");
        session.store_mut().load("Story0").expect("load slot");
        session
            .pickups_mut()
            .register("Meadow", "wood", Vec3::ZERO, None)
            .expect("register");
        session.shutdown().expect("shutdown");
    }

    let session = build_session(dir.path(), false);
    assert!(session.store().has_slot("Story0").expect("has slot"));
    assert_eq!(session.pickups().drops_in("Meadow").len(), 1);
}

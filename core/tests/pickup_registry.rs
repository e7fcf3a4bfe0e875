//! World pickup registry: duplicate rule, scene respawn, teardown and blob
//! persistence.

use haven_core::{
    collab::MemorySpawner,
    config::SaveConfig,
    error::SaveError,
    pickup::{RegistryState, WorldPickupRegistry},
    prefs::{PrefStore, SqlitePrefs},
    types::Vec3,
};
use std::path::Path;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn in_memory_registry(config: &SaveConfig) -> WorldPickupRegistry {
    let prefs = SqlitePrefs::in_memory().expect("in-memory prefs");
    WorldPickupRegistry::open(config, Box::new(prefs), Box::new(MemorySpawner::new()))
        .expect("open registry")
}

fn file_registry(config: &SaveConfig, db: &Path) -> WorldPickupRegistry {
    let prefs = SqlitePrefs::open(db).expect("file prefs");
    WorldPickupRegistry::open(config, Box::new(prefs), Box::new(MemorySpawner::new()))
        .expect("open registry")
}

fn test_config() -> SaveConfig {
    SaveConfig::default_test(Path::new("unused"))
}

#[test]
fn register_is_idempotent_and_remove_of_unknown_is_a_no_op() {
    init_logs();
    let mut registry = in_memory_registry(&test_config());
    let at = Vec3::new(4.0, 0.5, -2.0);

    assert!(registry.register("Meadow", "wood", at, None).expect("first"));
    assert!(!registry.register("Meadow", "wood", at, None).expect("second"));
    assert_eq!(registry.drops_in("Meadow").len(), 1);

    assert_eq!(registry.remove("Meadow", "clay", at, None).expect("remove"), 0);
    assert_eq!(registry.remove("Cave", "wood", at, None).expect("remove"), 0);
    assert_eq!(registry.remove("Meadow", "wood", at, None).expect("remove"), 1);
    assert_eq!(registry.remove("Meadow", "wood", at, None).expect("remove"), 0);
    assert_eq!(registry.total_drops(), 0);
}

#[test]
fn duplicate_tolerance_boundary() {
    let mut registry = in_memory_registry(&test_config());
    registry.register("Meadow", "wood", Vec3::ZERO, None).expect("register");

    // Squared distance 0.01 is outside the tolerance.
    assert!(!registry.is_registered("Meadow", "wood", Vec3::new(0.1, 0.0, 0.0), None));
    // Squared distance ~0.0099 is inside it.
    assert!(registry.is_registered("Meadow", "wood", Vec3::new(0.0995, 0.0, 0.0), None));
    // Same spot, other material.
    assert!(!registry.is_registered("Meadow", "clay", Vec3::ZERO, None));
    // Same spot, other scene.
    assert!(!registry.is_registered("Cave", "wood", Vec3::ZERO, None));
}

#[test]
fn anchor_id_identifies_a_pickup_of_its_material() {
    let mut registry = in_memory_registry(&test_config());
    registry
        .register("Meadow", "wood", Vec3::ZERO, Some("tree-7"))
        .expect("register");

    assert!(registry.is_registered("Meadow", "wood", Vec3::new(30.0, 0.0, 0.0), Some("tree-7")));
    assert!(!registry
        .register("Meadow", "wood", Vec3::new(30.0, 0.0, 0.0), Some("tree-7"))
        .expect("register again"));
    assert!(registry.register("Meadow", "wood", Vec3::ZERO, Some("tree-8")).expect("other anchor"));
    assert_eq!(registry.remove("Meadow", "wood", Vec3::ZERO, Some("tree-7")).expect("remove"), 1);
    assert_eq!(registry.drops_in("Meadow").len(), 1);
}

#[test]
fn two_materials_can_share_one_anchor() {
    init_logs();
    let mut registry = in_memory_registry(&test_config());
    assert!(registry.register("Meadow", "wood", Vec3::ZERO, Some("tree-1")).expect("wood"));
    assert!(registry.register("Meadow", "stone", Vec3::ZERO, Some("tree-1")).expect("stone"));
    assert_eq!(registry.drops_in("Meadow").len(), 2);

    assert_eq!(registry.remove("Meadow", "stone", Vec3::ZERO, Some("tree-1")).expect("remove"), 1);
    assert!(registry.is_registered("Meadow", "wood", Vec3::ZERO, Some("tree-1")));
    assert!(!registry.is_registered("Meadow", "stone", Vec3::ZERO, Some("tree-1")));
}

#[test]
fn scene_load_respawns_pickups_one_tick_later() {
    init_logs();
    let mut registry = in_memory_registry(&test_config());
    registry.register("Meadow", "wood", Vec3::new(1.0, 0.0, 0.0), None).expect("register");
    registry.register("Meadow", "clay", Vec3::new(2.0, 0.0, 0.0), Some("pit-1")).expect("register");
    registry.register("Cave", "clay", Vec3::ZERO, None).expect("register");

    assert_eq!(registry.handle_scene_loaded("Meadow").expect("load"), RegistryState::Active);
    assert_eq!(registry.spawner().live_count(), 0);

    assert_eq!(registry.tick(), 2);
    assert_eq!(registry.spawner().live_count(), 2);
    assert_eq!(registry.tick(), 0, "respawn happens once per load");
}

#[test]
fn missing_template_skips_spawn_but_keeps_records() {
    init_logs();
    let mut config = test_config();
    config.pickup_template = None;
    let mut registry = in_memory_registry(&config);
    registry.register("Meadow", "wood", Vec3::ZERO, None).expect("register");

    registry.handle_scene_loaded("Meadow").expect("load");
    assert_eq!(registry.tick(), 0);
    assert_eq!(registry.spawner().live_count(), 0);
    assert_eq!(registry.drops_in("Meadow").len(), 1);
}

#[test]
fn main_menu_persists_and_tears_down() {
    init_logs();
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("prefs.sqlite3");
    let config = test_config();

    {
        let mut registry = file_registry(&config, &db);
        registry.register("Meadow", "wood", Vec3::ZERO, None).expect("register");
        let state = registry.handle_scene_loaded("MainMenu").expect("main menu");
        assert_eq!(state, RegistryState::Destroyed);

        assert!(matches!(
            registry.register("Meadow", "clay", Vec3::ZERO, None),
            Err(SaveError::RegistryDestroyed)
        ));
        registry.handle_scene_loaded("Meadow").expect("ignored after teardown");
        assert_eq!(registry.tick(), 0);
    }

    let reopened = file_registry(&config, &db);
    assert_eq!(reopened.drops_in("Meadow").len(), 1);
}

#[test]
fn reopen_reads_the_blob_again() {
    let mut registry = in_memory_registry(&test_config());
    registry.register("Meadow", "wood", Vec3::ZERO, None).expect("register");
    registry.handle_scene_loaded("MainMenu").expect("main menu");

    registry.reopen().expect("reopen");
    assert_eq!(registry.state(), RegistryState::Active);
    assert!(registry.is_registered("Meadow", "wood", Vec3::ZERO, None));
}

#[test]
fn clear_all_survives_restart() {
    init_logs();
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("prefs.sqlite3");
    let config = test_config();

    {
        let mut registry = file_registry(&config, &db);
        registry.register("Meadow", "wood", Vec3::ZERO, None).expect("register");
        registry.register("Cave", "clay", Vec3::new(0.0, 1.0, 0.0), None).expect("register");
        registry.save_to_blob().expect("save");
        registry.handle_scene_loaded("Meadow").expect("load");
        registry.tick();
        assert_eq!(registry.spawner().live_count(), 1);

        registry.clear_all().expect("clear");
        assert_eq!(registry.spawner().live_count(), 0);
        assert_eq!(registry.total_drops(), 0);
    }

    let mut restarted = file_registry(&config, &db);
    assert_eq!(restarted.total_drops(), 0);
    restarted.handle_scene_loaded("Cave").expect("load");
    assert_eq!(restarted.tick(), 0);
}

#[test]
fn blob_uses_scene_list_layout() {
    let config = test_config();
    let mut prefs = SqlitePrefs::in_memory().expect("prefs");
    prefs
        .set_string(
            &config.pickup_blob_key,
            r#"{"scenes":[{"sceneName":"Meadow","drops":[
                {"materialID":"wood","position":{"x":1.0,"y":0.0,"z":0.0},"anchorID":""},
                {"materialID":"clay","position":{"x":2.0,"y":0.0,"z":0.0},"anchorID":"pit-1"}
            ]}]}"#,
        )
        .expect("seed blob");

    let registry =
        WorldPickupRegistry::open(&config, Box::new(prefs), Box::new(MemorySpawner::new()))
            .expect("open");
    let drops = registry.drops_in("Meadow");
    assert_eq!(drops.len(), 2);
    assert_eq!(drops[0].anchor_id, None);
    assert_eq!(drops[1].anchor_id.as_deref(), Some("pit-1"));
}

#[test]
fn malformed_blob_is_an_error() {
    let config = test_config();
    let mut prefs = SqlitePrefs::in_memory().expect("prefs");
    prefs.set_string(&config.pickup_blob_key, "[oops").expect("seed blob");

    let result =
        WorldPickupRegistry::open(&config, Box::new(prefs), Box::new(MemorySpawner::new()));
    assert!(matches!(result, Err(SaveError::Serialization(_))));
}

//! slot-tool: inspect and exercise save slots from the command line.
//!
//! Usage:
//!   slot-tool list    [--root ./saves] [--channel release] [--config save.json]
//!   slot-tool show    <slot>
//!   slot-tool delete  <slot>
//!   slot-tool pickups
//!   slot-tool demo    [slot] [--days 3]

use anyhow::{bail, Context, Result};
use haven_core::{
    clock::GameClock,
    codec,
    collab::{in_memory_providers, MemoryPlacedObjects, MemorySpawner, StaticCatalog},
    config::{BuildChannel, SaveConfig},
    drops::RolloverStatus,
    event::{change_channel, SceneEvent},
    fsio,
    pickup::WorldPickupRegistry,
    prefs::SqlitePrefs,
    provider::SnapshotProvider,
    session::GameSession,
    slot_store::SlotSnapshotStore,
    snapshot::{SnapshotHeader, VariantFlags},
    types::{SlotKey, Vec3},
};
use std::env;
use std::path::PathBuf;

const DEMO_SCENE: &str = "Meadow";
const DEMO_FRAME_SECS: f64 = 1.0 / 30.0;
const WAKE_MINUTES: f32 = 6.0 * 60.0;

#[derive(serde::Serialize)]
struct SlotSummary {
    slot:              String,
    kind:              String,
    #[serde(flatten)]
    header:            SnapshotHeader,
    money:             i64,
    milestone_index:   u32,
    day:               u32,
    inventory_entries: usize,
    legacy_units:      usize,
    placed_objects:    usize,
    color_overrides:   usize,
    flags:             String,
}

#[derive(serde::Serialize)]
struct DemoReport {
    slot:         String,
    started_at:   String,
    frames:       u64,
    saves:        u64,
    days_rolled:  u32,
    drops_total:  usize,
    live_pickups: usize,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let positional: Vec<&str> = positional_args(&args);
    let config = build_config(&args)?;

    match positional.as_slice() {
        ["list"] => list(&config),
        ["show", slot] => show(&config, slot),
        ["delete", slot] => delete(&config, slot),
        ["pickups"] => pickups(&config),
        ["demo"] => demo(&config, "Story0", parse_arg(&args, "--days", 3u32)),
        ["demo", slot] => demo(&config, slot, parse_arg(&args, "--days", 3u32)),
        _ => {
            eprintln!("usage: slot-tool <list|show <slot>|delete <slot>|pickups|demo [slot]>");
            bail!("unrecognised command line: {:?}", &args[1..]);
        }
    }
}

// ── Commands ───────────────────────────────────────────────────────

fn list(config: &SaveConfig) -> Result<()> {
    let store = headless_store(config);
    let slots = store.list_slots()?;
    println!("{} slots in {}", slots.len(), config.slot_dir().display());
    for slot in slots {
        match store.load_metadata(slot.as_str()) {
            Ok(Some(h)) => println!(
                "  {:<12} {:<8} {:<20} {:>8.0}s  {:<16} {}",
                slot.as_str(),
                format!("{:?}", slot.kind()),
                h.save_date,
                h.play_time,
                h.chapter_name,
                h.location
            ),
            Ok(None) => println!("  {:<12} (vanished)", slot.as_str()),
            Err(e) => println!("  {:<12} CORRUPT: {e}", slot.as_str()),
        }
    }
    Ok(())
}

fn show(config: &SaveConfig, key: &str) -> Result<()> {
    let slot = SlotKey::parse(key)?.context("slot key must not be empty")?;
    let path = config.slot_path(&slot);
    let json = fsio::read_optional(&path)?
        .with_context(|| format!("no save file at {}", path.display()))?;
    let snapshot = codec::decode(slot.kind(), &json)
        .with_context(|| format!("cannot decode {}", path.display()))?;

    let body = &snapshot.body;
    let summary = SlotSummary {
        slot:              slot.to_string(),
        kind:              format!("{:?}", slot.kind()),
        header:            snapshot.header.clone(),
        money:             body.money,
        milestone_index:   body.milestone_index,
        day:               body.clock.current_day,
        inventory_entries: body.inventory.len(),
        legacy_units:      body.legacy_inventory.len(),
        placed_objects:    body.placed_objects.len(),
        color_overrides:   body.independent_colors.values().map(Vec::len).sum(),
        flags:             match snapshot.variant {
            VariantFlags::Story { has_seen_opening } => format!("opening_seen={has_seen_opening}"),
            VariantFlags::Creative { unlimited_money } => format!("unlimited_money={unlimited_money}"),
        },
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn delete(config: &SaveConfig, key: &str) -> Result<()> {
    let mut store = headless_store(config);
    if !store.has_slot(key)? {
        println!("slot {key} has no save file");
        return Ok(());
    }
    store.delete(key)?;
    println!("deleted slot {key}");
    Ok(())
}

fn pickups(config: &SaveConfig) -> Result<()> {
    let prefs = SqlitePrefs::open(&config.prefs_file())?;
    let registry = WorldPickupRegistry::open(config, Box::new(prefs), Box::new(MemorySpawner::new()))?;
    println!("{} pickups in {}", registry.total_drops(), config.prefs_file().display());
    for scene in registry.scenes() {
        println!("  {scene}:");
        for drop in registry.drops_in(scene) {
            println!(
                "    {:<12} {}  anchor={}",
                drop.material_id,
                drop.position,
                drop.anchor_id.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}

/// Drive a headless session: load a slot, play a little, sleep through a
/// few days, collect what dropped, then return to the main menu.
fn demo(config: &SaveConfig, slot: &str, days: u32) -> Result<()> {
    let started_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let (notifier, changes) = change_channel();
    let providers = in_memory_providers(demo_catalog(), &["Arrival", "First Harvest"], &notifier);
    let prefs = SqlitePrefs::open(&config.prefs_file())?;
    let mut session = GameSession::start(
        config.clone(),
        providers,
        changes,
        Box::new(prefs),
        Box::new(MemorySpawner::new()),
    )?;

    enter_scene(&mut session, DEMO_SCENE)?;
    let created = session.store_mut().load(slot)?;
    println!("slot {slot}: {}", if created { "created" } else { "loaded" });

    if let Some(placed) = session
        .store_mut()
        .providers_mut()
        .placed
        .as_any_mut()
        .downcast_mut::<MemoryPlacedObjects>()
    {
        if placed.records_in_scene(DEMO_SCENE).is_empty() {
            placed.place("oak_chair", DEMO_SCENE, Vec3::new(2.0, 0.0, 3.0));
            placed.place("fern_pot", DEMO_SCENE, Vec3::new(-1.5, 0.0, 0.5));
        }
    }

    let mut days_rolled = 0;
    for _ in 0..days {
        let Some(clock) = session
            .store_mut()
            .providers_mut()
            .clock
            .as_any_mut()
            .downcast_mut::<GameClock>()
        else {
            bail!("demo session needs the built-in clock");
        };
        let day = clock.sleep_until(WAKE_MINUTES);
        if !session.on_sleep_advanced_day(day)? {
            continue;
        }
        for _ in 0..30 {
            if let RolloverStatus::Rolled(summary) = session.tick(DEMO_FRAME_SECS) {
                println!(
                    "day {}: {} spawned, {} registered elsewhere",
                    summary.day, summary.spawned, summary.registered
                );
                days_rolled += 1;
                break;
            }
        }
        let first = session
            .pickups()
            .drops_in(DEMO_SCENE)
            .first()
            .map(|d| (d.material_id.clone(), d.position, d.anchor_id.clone()));
        if let Some((material, position, anchor)) = first {
            session.collect_pickup(&material, position, anchor.as_deref())?;
            println!("  collected {material}");
        }
        session.tick(DEMO_FRAME_SECS);
    }

    let report = DemoReport {
        slot:         slot.to_string(),
        started_at,
        frames:       session.frame(),
        saves:        session.store().save_count(),
        days_rolled,
        drops_total:  session.pickups().total_drops(),
        live_pickups: session.pickups().spawner().live_count(),
    };

    enter_scene(&mut session, &config.main_menu_scene)?;
    session.shutdown()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

// ── Helpers ────────────────────────────────────────────────────────

fn enter_scene(session: &mut GameSession, scene: &str) -> Result<()> {
    let from = session.active_scene().to_string();
    session.handle_scene_event(SceneEvent::Loaded { scene: scene.to_string() })?;
    session.handle_scene_event(SceneEvent::ActiveChanged { from, to: scene.to_string() })?;
    Ok(())
}

fn demo_catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with_material("wood")
        .with_material("fiber")
        .with_material("clay")
        .with_furniture("oak_chair", &[("wood", 0.6), ("fiber", 0.2)])
        .with_furniture("fern_pot", &[("fiber", 0.8), ("None", 1.0)])
}

/// Store over throwaway collaborators; enough for file-level commands.
fn headless_store(config: &SaveConfig) -> SlotSnapshotStore {
    let (notifier, changes) = change_channel();
    let providers = in_memory_providers(demo_catalog(), &[], &notifier);
    SlotSnapshotStore::new(config.clone(), providers, changes)
}

fn build_config(args: &[String]) -> Result<SaveConfig> {
    let mut config = match flag_value(args, "--config") {
        Some(path) => SaveConfig::load(&PathBuf::from(path))?,
        None => SaveConfig::default(),
    };
    if let Some(root) = flag_value(args, "--root") {
        config.persistent_root = PathBuf::from(root);
    }
    if let Some(channel) = flag_value(args, "--channel") {
        config.build_channel = match channel {
            "editor" => BuildChannel::Editor,
            "demo" => BuildChannel::Demo,
            "release" => BuildChannel::Release,
            other => bail!("unknown build channel '{other}' (editor, demo, release)"),
        };
    }
    Ok(config)
}

/// Arguments that are neither flags nor flag values.
fn positional_args(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args.iter().skip(1) {
        if skip_next {
            skip_next = false;
        } else if arg.starts_with("--") {
            skip_next = true;
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

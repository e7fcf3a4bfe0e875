//! Game session: the one object that owns the slot store, the pickup
//! registry and the day-rollover roller for a running process.
//!
//! The host forwards scene events, ticks and gameplay actions here; nothing
//! else holds on to the store or the registry.
//!
//! RULES:
//!   - Loading the main menu tears the store and the registry down. Both
//!     come back on their own the next time a gameplay scene loads.
//!   - Tick-path failures are logged and absorbed; explicit calls return them.
//!   - One writer per file and per blob: only this session writes either.

use crate::{
    config::SaveConfig,
    drops::{RolloverDrops, RolloverStatus},
    error::SaveResult,
    event::{ChangeQueue, SceneEvent},
    pickup::{RegistryState, WorldPickupRegistry},
    prefs::PrefStore,
    provider::{PickupSpawner, Providers},
    slot_store::SlotSnapshotStore,
    types::{SceneName, Vec3},
};

pub struct GameSession {
    store:        SlotSnapshotStore,
    pickups:      WorldPickupRegistry,
    rollover:     RolloverDrops,
    active_scene: SceneName,
    frame:        u64,
}

impl GameSession {
    /// Wire the store and the registry over their collaborators. The
    /// registry reads its blob immediately.
    pub fn start(
        config:    SaveConfig,
        providers: Providers,
        changes:   ChangeQueue,
        prefs:     Box<dyn PrefStore>,
        spawner:   Box<dyn PickupSpawner>,
    ) -> SaveResult<Self> {
        let pickups = WorldPickupRegistry::open(&config, prefs, spawner)?;
        let rollover = RolloverDrops::new(config.rollover.clone());
        let store = SlotSnapshotStore::new(config, providers, changes);
        log::info!("[session] started");
        Ok(Self {
            store,
            pickups,
            rollover,
            active_scene: String::new(),
            frame: 0,
        })
    }

    pub fn store(&self) -> &SlotSnapshotStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SlotSnapshotStore {
        &mut self.store
    }

    pub fn pickups(&self) -> &WorldPickupRegistry {
        &self.pickups
    }

    pub fn pickups_mut(&mut self) -> &mut WorldPickupRegistry {
        &mut self.pickups
    }

    pub fn active_scene(&self) -> &str {
        &self.active_scene
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn rollover_pending(&self) -> bool {
        self.rollover.is_waiting()
    }

    // ── Scene events ───────────────────────────────────────────────

    pub fn handle_scene_event(&mut self, event: SceneEvent) -> SaveResult<()> {
        match event {
            SceneEvent::Loaded { scene } => self.on_scene_loaded(&scene),
            SceneEvent::ActiveChanged { from, to } => {
                log::debug!("[session] active scene {from:?} -> {to:?}");
                self.active_scene = to.clone();
                self.store.on_active_scene_changed(&to);
                Ok(())
            }
        }
    }

    fn on_scene_loaded(&mut self, scene: &str) -> SaveResult<()> {
        self.active_scene = scene.to_string();
        self.store.set_active_scene(scene);

        if self.store.config().is_main_menu(scene) {
            log::info!("[session] main menu loaded; tearing down store and registry");
            self.store.teardown();
            self.rollover.cancel();
            self.pickups.handle_scene_loaded(scene)?;
            return Ok(());
        }

        if self.pickups.state() == RegistryState::Destroyed {
            self.pickups.reopen()?;
        }
        self.store.providers_mut().placed.load_scene(scene);
        self.pickups.handle_scene_loaded(scene)?;
        Ok(())
    }

    // ── Tick ───────────────────────────────────────────────────────

    /// Per-frame step. Order: store saves, queued pickup respawn, then any
    /// pending day-rollover roll.
    pub fn tick(&mut self, dt_secs: f64) -> RolloverStatus {
        self.frame += 1;
        self.store.tick(dt_secs);
        self.pickups.tick();

        let providers = self.store.providers();
        match self.rollover.tick(
            dt_secs,
            providers.placed.as_ref(),
            providers.catalog.as_ref(),
            &mut self.pickups,
            &self.active_scene,
        ) {
            Ok(status) => status,
            Err(e) => {
                log::error!("[session] frame {} drop roll failed: {e}", self.frame);
                RolloverStatus::Idle
            }
        }
    }

    // ── Gameplay actions ───────────────────────────────────────────

    /// The player picked up a pickup in the active scene: one unit of its
    /// material goes to the inventory and its record is forgotten.
    pub fn collect_pickup(
        &mut self,
        material_id: &str,
        position:    Vec3,
        anchor_id:   Option<&str>,
    ) -> SaveResult<usize> {
        self.store.providers_mut().inventory.add_material(material_id, 1);
        let removed = self
            .pickups
            .remove(&self.active_scene, material_id, position, anchor_id)?;
        log::debug!(
            "[session] scene={} collected {material_id} ({removed} records removed)",
            self.active_scene
        );
        Ok(removed)
    }

    /// Sleeping moved the clock to `day`. Yesterday's pickups disappear and
    /// a fresh drop roll is queued for the next ticks. The day only counts
    /// as processed once the clear went through.
    pub fn on_sleep_advanced_day(&mut self, day: u32) -> SaveResult<bool> {
        if !self.rollover.is_new_day(day) {
            log::debug!("[session] day {day} already processed, ignoring");
            return Ok(false);
        }
        self.pickups.clear_all()?;
        Ok(self.rollover.on_sleep_advanced_day(day))
    }

    /// Process exit: save the active slot and persist the pickup blob.
    pub fn shutdown(&mut self) -> SaveResult<()> {
        self.store.shutdown()?;
        self.pickups.shutdown()?;
        log::info!("[session] shut down after {} frames", self.frame);
        Ok(())
    }
}

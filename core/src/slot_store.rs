//! The slot snapshot store: single authority for the active slot and for
//! round-tripping a full snapshot to disk.
//!
//! RESTORE ORDER (fixed, documented, never reordered):
//!   1. Player pose
//!   2. Inventory            (legacy flat-list fallback)
//!   3. Placed objects       (then the active scene is loaded)
//!   4. Clock
//!   5. Money
//!   6. Milestone index      (silent, no notification)
//!   7. Environment totals
//!   8. Milestone re-notify  (needs environment totals from step 7)
//!   9. Color overrides and hue presets
//!  10. Wardrobe selections
//!
//! RULES:
//!   - A Snapshot is built fresh on every save and never mutated afterwards.
//!   - Saves are whole-file overwrites via write-temp-then-rename.
//!   - A save file that cannot be decoded is an error on every read path.
//!     The active slot is only switched once the file decoded cleanly.
//!   - Tick-driven saves (change notifications, autosave timer) log and
//!     absorb failures; explicit calls return them.

use crate::{
    codec,
    config::SaveConfig,
    error::{SaveError, SaveResult},
    event::ChangeQueue,
    fsio,
    migrate,
    provider::{Providers, SlotListener},
    snapshot::{Snapshot, SnapshotBody, SnapshotHeader, VariantFlags},
    types::{SceneName, SlotKey, SlotKind},
};
use std::collections::BTreeMap;

const SAVE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Recurring autosave timer, advanced by `tick`.
#[derive(Debug, Clone)]
struct AutosaveTimer {
    interval_secs: f64,
    elapsed_secs:  f64,
    running:       bool,
}

impl AutosaveTimer {
    fn new(interval_secs: f64) -> Self {
        Self { interval_secs, elapsed_secs: 0.0, running: false }
    }

    /// Advance; returns true each time a full interval has passed.
    fn advance(&mut self, dt_secs: f64) -> bool {
        if !self.running {
            return false;
        }
        self.elapsed_secs += dt_secs.max(0.0);
        if self.elapsed_secs >= self.interval_secs {
            self.elapsed_secs -= self.interval_secs;
            return true;
        }
        false
    }
}

pub struct SlotSnapshotStore {
    config:       SaveConfig,
    providers:    Providers,
    changes:      ChangeQueue,
    listeners:    Vec<Box<dyn SlotListener>>,
    active_slot:  Option<SlotKey>,
    active_scene: SceneName,
    /// Variant flags of the active slot, carried into every save.
    flags:        VariantFlags,
    autosave:     AutosaveTimer,
    play_time:    f64,
    save_count:   u64,
}

impl SlotSnapshotStore {
    pub fn new(config: SaveConfig, providers: Providers, changes: ChangeQueue) -> Self {
        let autosave = AutosaveTimer::new(config.autosave_interval_secs);
        Self {
            config,
            providers,
            changes,
            listeners:    Vec::new(),
            active_slot:  None,
            active_scene: String::new(),
            flags:        VariantFlags::Story { has_seen_opening: false },
            autosave,
            play_time:    0.0,
            save_count:   0,
        }
    }

    pub fn config(&self) -> &SaveConfig {
        &self.config
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    pub fn providers_mut(&mut self) -> &mut Providers {
        &mut self.providers
    }

    pub fn active_slot(&self) -> Option<&SlotKey> {
        self.active_slot.as_ref()
    }

    pub fn active_scene(&self) -> &str {
        &self.active_scene
    }

    pub fn set_active_scene(&mut self, scene: &str) {
        self.active_scene = scene.to_string();
    }

    pub fn autosave_running(&self) -> bool {
        self.autosave.running
    }

    /// Number of snapshot files written by this store.
    pub fn save_count(&self) -> u64 {
        self.save_count
    }

    pub fn play_time(&self) -> f64 {
        self.play_time
    }

    pub fn add_slot_listener(&mut self, listener: Box<dyn SlotListener>) {
        self.listeners.push(listener);
    }

    pub fn variant_flags(&self) -> VariantFlags {
        self.flags
    }

    /// Record that the story opening sequence has been shown.
    pub fn mark_opening_seen(&mut self) {
        if let VariantFlags::Story { has_seen_opening } = &mut self.flags {
            *has_seen_opening = true;
        }
    }

    pub fn set_unlimited_money(&mut self, enabled: bool) {
        if let VariantFlags::Creative { unlimited_money } = &mut self.flags {
            *unlimited_money = enabled;
        }
    }

    // ── Active slot ────────────────────────────────────────────────

    /// Switch the active slot. On an actual change to a non-empty key,
    /// per-slot providers and slot listeners are told about the new key.
    pub fn set_active_slot(&mut self, key: &str, ensure_autosave: bool) -> SaveResult<()> {
        let slot = SlotKey::parse(key)?;
        let changed = slot != self.active_slot;
        self.active_slot = slot;

        if changed {
            if let Some(slot) = &self.active_slot {
                log::info!("[slots] active slot -> {slot}");
                self.flags = default_flags(slot.kind());
                self.providers.colors.activate_slot(slot);
                self.providers.hue_presets.activate_slot(slot);
                for listener in &mut self.listeners {
                    listener.on_slot_activated(slot);
                }
            }
        }
        if ensure_autosave && !self.autosave.running {
            self.autosave.running = true;
            self.autosave.elapsed_secs = 0.0;
            log::debug!(
                "[slots] autosave started (every {:.0}s)",
                self.autosave.interval_secs
            );
        }
        Ok(())
    }

    // ── Save ───────────────────────────────────────────────────────

    pub fn has_slot(&self, key: &str) -> SaveResult<bool> {
        Ok(match SlotKey::parse(key)? {
            Some(slot) => self.config.slot_path(&slot).exists(),
            None => false,
        })
    }

    /// Capture every provider and write the slot file. Blank keys are a no-op.
    pub fn save(&mut self, key: &str) -> SaveResult<()> {
        let Some(slot) = SlotKey::parse(key)? else {
            log::debug!("[slots] save requested with no slot key, ignoring");
            return Ok(());
        };
        self.set_active_slot(slot.as_str(), true)?;

        let snapshot = Snapshot {
            header:  self.fill_header(&slot),
            body:    self.capture_body(&slot),
            variant: self.flags,
        };
        let json = codec::encode(&snapshot)?;
        let path = self.config.slot_path(&slot);
        fsio::atomic_write(&path, json.as_bytes())?;
        self.save_count += 1;
        log::debug!("[slots] slot={slot} saved to {}", path.display());
        Ok(())
    }

    /// Save the active slot, if there is one.
    pub fn save_current(&mut self) -> SaveResult<()> {
        match self.active_slot.clone() {
            Some(slot) => self.save(slot.as_str()),
            None => Ok(()),
        }
    }

    fn fill_header(&self, slot: &SlotKey) -> SnapshotHeader {
        SnapshotHeader {
            save_date:           chrono::Local::now().format(SAVE_DATE_FORMAT).to_string(),
            play_time:           self.play_time,
            chapter_name:        self.providers.milestone.current_label(),
            location:            self.active_scene.clone(),
            screenshot_filename: format!("{slot}_screenshot.png"),
        }
    }

    fn capture_body(&self, slot: &SlotKey) -> SnapshotBody {
        let p = &self.providers;
        let mut independent_colors = BTreeMap::new();
        independent_colors.insert(slot.as_str().to_string(), p.colors.capture_slot(slot));
        SnapshotBody {
            player:           p.player.capture(),
            inventory:        p.inventory.capture(),
            legacy_inventory: Vec::new(),
            placed_objects:   p.placed.capture(),
            clock:            p.clock.capture(),
            money:            p.money.capture(),
            milestone_index:  p.milestone.capture(),
            environment:      p.environment.capture(),
            independent_colors,
            hue_presets:      p.hue_presets.capture_slot(slot),
            wardrobe:         p.wardrobe.capture(),
        }
    }

    // ── Load ───────────────────────────────────────────────────────

    /// Make `key` the active slot and restore every provider from its file.
    /// Returns `true` when no file existed and an empty slot was created.
    pub fn load(&mut self, key: &str) -> SaveResult<bool> {
        let Some(slot) = SlotKey::parse(key)? else {
            return Err(SaveError::InvalidSlotKey {
                key:    key.to_string(),
                reason: "cannot load an empty slot key",
            });
        };
        let existing = self.read_snapshot(&slot)?;
        self.set_active_slot(slot.as_str(), true)?;

        let created = existing.is_none();
        let snapshot = match existing {
            Some(snapshot) => snapshot,
            None => {
                log::info!("[slots] slot={slot} has no save file; starting fresh");
                self.providers.hue_presets.forget_slot(&slot);
                Snapshot::empty(slot.kind())
            }
        };
        self.flags = snapshot.variant;
        self.play_time = snapshot.header.play_time;
        self.apply(&slot, snapshot);

        // Restoring raised change notifications of its own. The state on
        // disk already matches, so they must not trigger a save.
        let echoed = self.changes.drain().len();
        log::debug!("[slots] slot={slot} restored; {echoed} change notifications discarded");
        Ok(created)
    }

    fn apply(&mut self, slot: &SlotKey, snapshot: Snapshot) {
        let p = &mut self.providers;
        let body = snapshot.body;
        log::debug!("[slots] restoring {:?}", p.restore_order());

        p.player.restore(body.player);

        if let Some(report) = migrate::restore_inventory(
            p.inventory.as_mut(),
            p.catalog.as_ref(),
            body.inventory,
            &body.legacy_inventory,
        ) {
            log::info!("[slots] slot={slot} legacy inventory migrated: {report:?}");
        }

        p.placed.restore(body.placed_objects);
        if !self.active_scene.is_empty() {
            p.placed.load_scene(&self.active_scene);
        }

        p.clock.restore(body.clock);
        p.money.restore(body.money);
        p.milestone.restore(body.milestone_index);
        p.environment.restore(body.environment);
        p.milestone.request_progress_update();

        let colors = body
            .independent_colors
            .get(slot.as_str())
            .cloned()
            .unwrap_or_default();
        p.colors.restore_slot(slot, colors);
        p.hue_presets.restore_slot(slot, body.hue_presets);

        p.wardrobe.restore(body.wardrobe);
    }

    /// Read and decode a slot file. `Ok(None)` when the file does not exist.
    fn read_snapshot(&self, slot: &SlotKey) -> SaveResult<Option<Snapshot>> {
        let path = self.config.slot_path(slot);
        let Some(json) = fsio::read_optional(&path)? else {
            return Ok(None);
        };
        codec::decode(slot.kind(), &json)
            .map(Some)
            .map_err(|source| SaveError::CorruptSnapshot {
                slot: slot.to_string(),
                source,
            })
    }

    /// Header only, for the slot picker. `Ok(None)` when the slot is empty.
    pub fn load_metadata(&self, key: &str) -> SaveResult<Option<SnapshotHeader>> {
        let Some(slot) = SlotKey::parse(key)? else {
            return Ok(None);
        };
        let Some(json) = fsio::read_optional(&self.config.slot_path(&slot))? else {
            return Ok(None);
        };
        codec::decode_header(&json)
            .map(Some)
            .map_err(|source| SaveError::CorruptSnapshot {
                slot: slot.to_string(),
                source,
            })
    }

    /// Remove the slot file and any hue presets cached for it.
    pub fn delete(&mut self, key: &str) -> SaveResult<()> {
        let Some(slot) = SlotKey::parse(key)? else {
            return Ok(());
        };
        let path = self.config.slot_path(&slot);
        match std::fs::remove_file(&path) {
            Ok(()) => log::info!("[slots] slot={slot} deleted"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.providers.hue_presets.forget_slot(&slot);
        Ok(())
    }

    /// Every slot key with a file in the current channel directory, sorted.
    pub fn list_slots(&self) -> SaveResult<Vec<SlotKey>> {
        let dir = self.config.slot_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let suffix = format!(".{}", self.config.file_extension);
        let mut slots = Vec::new();
        for entry in entries {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if let Some(stem) = name.strip_suffix(&suffix) {
                if let Some(slot) = SlotKey::parse(stem)? {
                    slots.push(slot);
                }
            }
        }
        slots.sort();
        Ok(slots)
    }

    // ── Tick and lifecycle ─────────────────────────────────────────

    /// Per-frame step: accumulates play time, saves once if any provider
    /// reported a change, and runs the autosave timer.
    pub fn tick(&mut self, dt_secs: f64) {
        self.play_time += dt_secs.max(0.0);

        let changes = self.changes.drain();
        let autosave_due = self.autosave.advance(dt_secs);
        if self.active_slot.is_none() {
            return;
        }
        if !changes.is_empty() {
            log::debug!("[slots] change-triggered save ({changes:?})");
            self.save_logged("change");
        } else if autosave_due {
            self.save_logged("autosave");
        }
    }

    /// The active scene switched. Every switch saves, except into the main
    /// menu (the session tears the store down instead).
    pub fn on_active_scene_changed(&mut self, to: &str) {
        self.active_scene = to.to_string();
        if !self.config.is_main_menu(to) {
            self.save_logged("scene change");
        }
    }

    /// Save on process exit.
    pub fn shutdown(&mut self) -> SaveResult<()> {
        self.save_current()
    }

    /// Main-menu teardown: forget the active slot, stop autosave and drop
    /// queued notifications. Afterwards the store is indistinguishable from
    /// a newly built one over the same collaborators.
    pub fn teardown(&mut self) {
        if let Some(slot) = self.active_slot.take() {
            log::info!("[slots] torn down (was slot={slot})");
        }
        self.autosave = AutosaveTimer::new(self.config.autosave_interval_secs);
        self.flags = VariantFlags::Story { has_seen_opening: false };
        self.play_time = 0.0;
        self.changes.drain();
    }

    fn save_logged(&mut self, reason: &str) {
        if let Err(e) = self.save_current() {
            log::error!("[slots] {reason} save failed: {e}");
        }
    }
}

fn default_flags(kind: SlotKind) -> VariantFlags {
    match kind {
        SlotKind::Story    => VariantFlags::Story { has_seen_opening: false },
        SlotKind::Creative => VariantFlags::Creative { unlimited_money: true },
    }
}

//! World pickup registry.
//!
//! Remembers which pickups exist in which scene, independently of the slot
//! snapshot, so they can be respawned whenever a scene loads and so
//! spawners elsewhere never register the same pickup twice.
//!
//! Lifecycle: Uninitialized -> Active (on open, reads the blob) -> Destroyed
//! (on main-menu load). A destroyed registry ignores further scene loads.
//! The whole map is persisted as one JSON blob under a single preference key,
//! on shutdown, on teardown and right after clear_all().

use crate::{
    config::SaveConfig,
    error::{SaveError, SaveResult},
    prefs::PrefStore,
    provider::PickupSpawner,
    types::{within_tolerance, ItemId, SceneName, Vec3},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One pickup lying in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropRecord {
    #[serde(rename = "materialID")]
    pub material_id: ItemId,
    pub position:    Vec3,
    #[serde(rename = "anchorID", default)]
    pub anchor_id:   Option<String>,
}

impl DropRecord {
    pub fn new(material_id: &str, position: Vec3, anchor_id: Option<&str>) -> Self {
        Self {
            material_id: material_id.to_string(),
            position,
            anchor_id: normalize_anchor(anchor_id).map(str::to_string),
        }
    }

    /// Duplicate rule: the material must always match. A non-empty anchor
    /// id then decides on its own; without one, the positions must be
    /// within tolerance.
    pub fn matches(&self, material_id: &str, position: Vec3, anchor_id: Option<&str>) -> bool {
        self.material_id == material_id
            && match normalize_anchor(anchor_id) {
                Some(anchor) => self.anchor_id.as_deref() == Some(anchor),
                None => within_tolerance(self.position.sqr_distance(position)),
            }
    }
}

/// Only the empty string counts as "no anchor"; whitespace is a real id.
fn normalize_anchor(anchor_id: Option<&str>) -> Option<&str> {
    anchor_id.filter(|a| !a.is_empty())
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneDrops {
    scene_name: SceneName,
    #[serde(default)]
    drops:      Vec<DropRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PickupBlob {
    #[serde(default)]
    scenes: Vec<SceneDrops>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Active,
    Destroyed,
}

pub struct WorldPickupRegistry {
    drops_by_scene:  BTreeMap<SceneName, Vec<DropRecord>>,
    prefs:           Box<dyn PrefStore>,
    spawner:         Box<dyn PickupSpawner>,
    blob_key:        String,
    template:        Option<String>,
    main_menu_scene: SceneName,
    state:           RegistryState,
    /// Scene whose pickups spawn on the next tick.
    pending_spawn:   Option<SceneName>,
}

impl WorldPickupRegistry {
    /// Build an active registry and read the persisted blob, if any.
    pub fn open(
        config:  &SaveConfig,
        prefs:   Box<dyn PrefStore>,
        spawner: Box<dyn PickupSpawner>,
    ) -> SaveResult<Self> {
        let mut registry = Self {
            drops_by_scene:  BTreeMap::new(),
            prefs,
            spawner,
            blob_key:        config.pickup_blob_key.clone(),
            template:        config.pickup_template.clone(),
            main_menu_scene: config.main_menu_scene.clone(),
            state:           RegistryState::Active,
            pending_spawn:   None,
        };
        registry.load_from_blob()?;
        log::info!(
            "[pickups] registry active: {} pickups across {} scenes",
            registry.total_drops(),
            registry.drops_by_scene.len()
        );
        Ok(registry)
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    /// Bring a torn-down registry back as if freshly opened: the map is
    /// re-read from the blob and scene loads are handled again.
    pub fn reopen(&mut self) -> SaveResult<()> {
        if self.state == RegistryState::Active {
            return Ok(());
        }
        self.drops_by_scene.clear();
        self.pending_spawn = None;
        self.load_from_blob()?;
        self.state = RegistryState::Active;
        log::info!("[pickups] registry reopened: {} pickups", self.total_drops());
        Ok(())
    }

    fn ensure_active(&self) -> SaveResult<()> {
        match self.state {
            RegistryState::Active    => Ok(()),
            RegistryState::Destroyed => Err(SaveError::RegistryDestroyed),
        }
    }

    // ── Queries ────────────────────────────────────────────────────

    pub fn is_registered(
        &self,
        scene:       &str,
        material_id: &str,
        position:    Vec3,
        anchor_id:   Option<&str>,
    ) -> bool {
        self.drops_by_scene
            .get(scene)
            .is_some_and(|list| list.iter().any(|d| d.matches(material_id, position, anchor_id)))
    }

    pub fn drops_in(&self, scene: &str) -> &[DropRecord] {
        self.drops_by_scene.get(scene).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Scenes that currently hold at least one record, in name order.
    pub fn scenes(&self) -> impl Iterator<Item = &str> {
        self.drops_by_scene.keys().map(String::as_str)
    }

    pub fn total_drops(&self) -> usize {
        self.drops_by_scene.values().map(Vec::len).sum()
    }

    pub fn spawner(&self) -> &dyn PickupSpawner {
        self.spawner.as_ref()
    }

    // ── Mutations ──────────────────────────────────────────────────

    /// Insert unless a matching record exists. Returns whether it was added.
    pub fn register(
        &mut self,
        scene:       &str,
        material_id: &str,
        position:    Vec3,
        anchor_id:   Option<&str>,
    ) -> SaveResult<bool> {
        self.ensure_active()?;
        if self.is_registered(scene, material_id, position, anchor_id) {
            log::debug!("[pickups] scene={scene} {material_id} at {position} already registered");
            return Ok(false);
        }
        self.drops_by_scene
            .entry(scene.to_string())
            .or_default()
            .push(DropRecord::new(material_id, position, anchor_id));
        log::debug!("[pickups] scene={scene} registered {material_id} at {position}");
        Ok(true)
    }

    /// Remove every matching record. Returns how many were removed.
    pub fn remove(
        &mut self,
        scene:       &str,
        material_id: &str,
        position:    Vec3,
        anchor_id:   Option<&str>,
    ) -> SaveResult<usize> {
        self.ensure_active()?;
        let Some(list) = self.drops_by_scene.get_mut(scene) else {
            return Ok(0);
        };
        let before = list.len();
        list.retain(|d| !d.matches(material_id, position, anchor_id));
        let removed = before - list.len();
        if list.is_empty() {
            self.drops_by_scene.remove(scene);
        }
        Ok(removed)
    }

    /// Spawn a pickup in the live scene right away and register it.
    pub fn spawn_now(
        &mut self,
        scene:       &str,
        material_id: &str,
        position:    Vec3,
    ) -> SaveResult<bool> {
        let added = self.register(scene, material_id, position, None)?;
        match &self.template {
            Some(template) if added => {
                self.spawner.spawn(template, scene, &DropRecord::new(material_id, position, None));
            }
            None => log::warn!("[pickups] no pickup template configured; {material_id} registered only"),
            _ => {}
        }
        Ok(added)
    }

    /// Destroy every live pickup, forget every record and persist the empty
    /// state so nothing respawns.
    pub fn clear_all(&mut self) -> SaveResult<()> {
        self.ensure_active()?;
        let destroyed = self.spawner.despawn_all();
        let forgotten = self.total_drops();
        self.drops_by_scene.clear();
        self.pending_spawn = None;
        log::info!("[pickups] cleared: {destroyed} live pickups destroyed, {forgotten} records dropped");
        self.save_to_blob()
    }

    // ── Scene events ───────────────────────────────────────────────

    /// React to a scene load. Loading the main menu persists and tears the
    /// registry down; any other scene queues a respawn for the next tick.
    pub fn handle_scene_loaded(&mut self, scene: &str) -> SaveResult<RegistryState> {
        if self.state == RegistryState::Destroyed {
            return Ok(self.state);
        }
        if scene == self.main_menu_scene {
            self.save_to_blob()?;
            self.pending_spawn = None;
            self.state = RegistryState::Destroyed;
            log::info!("[pickups] main menu loaded; registry torn down");
            return Ok(self.state);
        }
        self.pending_spawn = Some(scene.to_string());
        Ok(self.state)
    }

    /// Per-frame step: performs a respawn queued by the previous scene load.
    /// Returns how many pickups were spawned.
    pub fn tick(&mut self) -> usize {
        let Some(scene) = self.pending_spawn.take() else {
            return 0;
        };
        if self.state == RegistryState::Destroyed {
            return 0;
        }
        let Some(template) = self.template.as_deref() else {
            log::warn!("[pickups] scene={scene} no pickup template configured; skipping respawn");
            return 0;
        };
        let Some(list) = self.drops_by_scene.get(&scene) else {
            return 0;
        };
        for record in list {
            self.spawner.spawn(template, &scene, record);
        }
        log::debug!("[pickups] scene={scene} respawned {} pickups", list.len());
        list.len()
    }

    // ── Persistence ────────────────────────────────────────────────

    pub fn save_to_blob(&mut self) -> SaveResult<()> {
        let blob = PickupBlob {
            scenes: self
                .drops_by_scene
                .iter()
                .map(|(scene, drops)| SceneDrops {
                    scene_name: scene.clone(),
                    drops:      drops.clone(),
                })
                .collect(),
        };
        let json = serde_json::to_string(&blob)?;
        self.prefs.set_string(&self.blob_key, &json)?;
        self.prefs.flush()?;
        log::debug!("[pickups] blob saved ({} pickups)", self.total_drops());
        Ok(())
    }

    fn load_from_blob(&mut self) -> SaveResult<()> {
        let Some(json) = self.prefs.get_string(&self.blob_key)? else {
            return Ok(());
        };
        if json.trim().is_empty() {
            return Ok(());
        }
        let blob: PickupBlob = serde_json::from_str(&json)?;
        self.drops_by_scene.clear();
        for scene in blob.scenes {
            let drops: Vec<DropRecord> = scene
                .drops
                .into_iter()
                .map(|d| DropRecord::new(&d.material_id, d.position, d.anchor_id.as_deref()))
                .collect();
            if !drops.is_empty() {
                self.drops_by_scene.entry(scene.scene_name).or_default().extend(drops);
            }
        }
        Ok(())
    }

    /// Persist on process exit.
    pub fn shutdown(&mut self) -> SaveResult<()> {
        if self.state == RegistryState::Active {
            self.save_to_blob()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_matches_regardless_of_position() {
        let record = DropRecord::new("wood", Vec3::ZERO, Some("tree-3"));
        assert!(record.matches("wood", Vec3::new(50.0, 0.0, 0.0), Some("tree-3")));
        assert!(!record.matches("wood", Vec3::ZERO, Some("tree-4")));
    }

    #[test]
    fn anchor_never_overrides_material() {
        let record = DropRecord::new("wood", Vec3::ZERO, Some("tree-3"));
        assert!(!record.matches("stone", Vec3::ZERO, Some("tree-3")));
    }

    #[test]
    fn empty_anchor_falls_back_to_position() {
        let record = DropRecord::new("wood", Vec3::ZERO, Some(""));
        assert_eq!(record.anchor_id, None);
        assert!(record.matches("wood", Vec3::new(0.05, 0.0, 0.0), Some("")));
        assert!(!record.matches("stone", Vec3::ZERO, None));
    }

    #[test]
    fn whitespace_anchor_is_a_real_anchor() {
        let record = DropRecord::new("wood", Vec3::ZERO, Some("  "));
        assert_eq!(record.anchor_id.as_deref(), Some("  "));
        assert!(record.matches("wood", Vec3::new(40.0, 0.0, 0.0), Some("  ")));
        assert!(!record.matches("wood", Vec3::ZERO, Some("tree-1")));
    }
}

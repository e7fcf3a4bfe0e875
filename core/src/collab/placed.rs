//! In-memory placed-object store.
//!
//! Holds every placed furniture record across all scenes. Scene loads
//! complete immediately unless the store was built with
//! `with_async_loads`, in which case it stays busy until the host calls
//! `finish_loading`.

use crate::{
    event::{ChangeNotifier, ChangeSource},
    provider::{PlacedObjectProvider, SnapshotProvider},
    snapshot::PlacedObjectRecord,
    types::{Quat, SceneName, Vec3},
};

#[derive(Debug)]
pub struct MemoryPlacedObjects {
    records:      Vec<PlacedObjectRecord>,
    loaded_scene: Option<SceneName>,
    loading:      bool,
    async_loads:  bool,
    notifier:     Option<ChangeNotifier>,
}

impl MemoryPlacedObjects {
    pub fn new(notifier: Option<ChangeNotifier>) -> Self {
        Self {
            records: Vec::new(),
            loaded_scene: None,
            loading: false,
            async_loads: false,
            notifier,
        }
    }

    pub fn with_async_loads(mut self) -> Self {
        self.async_loads = true;
        self
    }

    /// Place a furniture item and return its fresh unique id.
    pub fn place(&mut self, furniture_id: &str, scene: &str, position: Vec3) -> String {
        let unique_id = uuid::Uuid::new_v4().to_string();
        self.records.push(PlacedObjectRecord {
            furniture_id: furniture_id.to_string(),
            position,
            rotation: Quat::IDENTITY,
            scene_name: scene.to_string(),
            unique_id: unique_id.clone(),
            ..PlacedObjectRecord::default()
        });
        self.changed();
        unique_id
    }

    /// Remove a placed object and anything parented to it.
    pub fn remove(&mut self, unique_id: &str) -> bool {
        let before = self.records.len();
        self.records
            .retain(|r| r.unique_id != unique_id && r.parent_uid != unique_id);
        let removed = self.records.len() != before;
        if removed {
            self.changed();
        }
        removed
    }

    pub fn records_in_scene(&self, scene: &str) -> Vec<&PlacedObjectRecord> {
        self.records.iter().filter(|r| r.scene_name == scene).collect()
    }

    pub fn loaded_scene(&self) -> Option<&str> {
        self.loaded_scene.as_deref()
    }

    pub fn finish_loading(&mut self) {
        self.loading = false;
    }

    fn changed(&self) {
        if let Some(n) = &self.notifier {
            n.notify(ChangeSource::PlacedObjects);
        }
    }
}

impl SnapshotProvider for MemoryPlacedObjects {
    type Fragment = Vec<PlacedObjectRecord>;

    fn name(&self) -> &'static str {
        "placed_objects"
    }

    fn capture(&self) -> Vec<PlacedObjectRecord> {
        self.records.clone()
    }

    fn restore(&mut self, fragment: Vec<PlacedObjectRecord>) {
        self.records = fragment;
        self.loaded_scene = None;
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl PlacedObjectProvider for MemoryPlacedObjects {
    fn load_scene(&mut self, scene: &str) {
        self.loaded_scene = Some(scene.to_string());
        self.loading = self.async_loads;
    }

    fn is_ready(&self) -> bool {
        !self.loading
    }
}

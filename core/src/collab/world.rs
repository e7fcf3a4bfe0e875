//! Headless pickup spawner: keeps a list of live pickups instead of
//! instantiating scene objects.

use crate::{pickup::DropRecord, provider::PickupSpawner, types::SceneName};

#[derive(Debug, Clone, PartialEq)]
pub struct LivePickup {
    pub template: String,
    pub scene:    SceneName,
    pub record:   DropRecord,
}

#[derive(Debug, Default)]
pub struct MemorySpawner {
    pub live: Vec<LivePickup>,
}

impl MemorySpawner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PickupSpawner for MemorySpawner {
    fn spawn(&mut self, template: &str, scene: &str, record: &DropRecord) {
        self.live.push(LivePickup {
            template: template.to_string(),
            scene:    scene.to_string(),
            record:   record.clone(),
        });
    }

    fn despawn_all(&mut self) -> usize {
        let n = self.live.len();
        self.live.clear();
        n
    }

    fn live_count(&self) -> usize {
        self.live.len()
    }
}

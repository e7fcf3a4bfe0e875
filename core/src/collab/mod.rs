//! Reference collaborators.
//!
//! Plain in-memory implementations of every provider trait. The slot tool
//! runs a headless session on them, and the integration tests use them as
//! the gameplay side of the store.

mod appearance;
mod inventory;
mod placed;
mod progress;
mod world;

pub use appearance::{HuePresetCache, IndependentColorCache, MemoryWardrobe};
pub use inventory::{MemoryInventory, StaticCatalog};
pub use placed::MemoryPlacedObjects;
pub use progress::{MemoryEnvironment, MemoryMilestones, MemoryMoney, MemoryPlayer};
pub use world::{LivePickup, MemorySpawner};

use crate::{clock::GameClock, event::ChangeNotifier, provider::Providers};

/// Wire a full set of in-memory collaborators. Mutating collaborators get
/// a clone of `notifier` so their changes request a save.
pub fn in_memory_providers(
    catalog:   StaticCatalog,
    milestones: &[&str],
    notifier:  &ChangeNotifier,
) -> Providers {
    Providers {
        player:      Box::new(MemoryPlayer::default()),
        inventory:   Box::new(MemoryInventory::new(Some(notifier.clone()))),
        catalog:     Box::new(catalog),
        placed:      Box::new(MemoryPlacedObjects::new(Some(notifier.clone()))),
        clock:       Box::new(GameClock::new(Some(notifier.clone()))),
        money:       Box::new(MemoryMoney::new(Some(notifier.clone()))),
        milestone:   Box::new(MemoryMilestones::new(milestones)),
        environment: Box::new(MemoryEnvironment::new(Some(notifier.clone()))),
        colors:      Box::new(IndependentColorCache::new()),
        hue_presets: Box::new(HuePresetCache::new()),
        wardrobe:    Box::new(MemoryWardrobe::default()),
    }
}

//! Provider traits: the contract every collaborator fulfils.
//!
//! RULE: The slot store only sees collaborators through these traits.
//! It pulls a fragment from each provider on save and pushes one back on
//! load. It never reaches into a collaborator's internals.

use crate::{
    clock::ClockRecord,
    pickup::DropRecord,
    snapshot::{
        EnvironmentTotals, HuePresetData, IndependentColorEntry, InventoryEntry,
        PlacedObjectRecord, PlayerPose, WardrobeSelection,
    },
    types::{Hsv, ItemId, SlotKey},
};
use std::any::Any;

/// Pull/push contract for one piece of persisted state.
pub trait SnapshotProvider {
    /// Stable name used in log lines.
    fn name(&self) -> &'static str;

    type Fragment;

    fn capture(&self) -> Self::Fragment;

    /// Replace the provider's state with `fragment`.
    fn restore(&mut self, fragment: Self::Fragment);

    /// For downcasting in tests and tooling only.
    /// The slot store never uses this.
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub trait InventoryProvider: SnapshotProvider<Fragment = Vec<InventoryEntry>> {
    fn add_material(&mut self, id: &str, quantity: u32);
    fn add_furniture(&mut self, id: &str, quantity: u32);
}

/// One entry of a furniture item's daily drop table.
#[derive(Debug, Clone, PartialEq)]
pub struct DropChance {
    pub material_id: ItemId,
    /// Probability in [0.0, 1.0] that this material drops on a given day.
    pub rate: f32,
}

/// Static item definitions: what is a material, what is furniture, and
/// what each furniture item drops overnight.
pub trait ItemCatalog {
    fn is_material(&self, id: &str) -> bool;
    fn is_furniture(&self, id: &str) -> bool;
    fn drop_table(&self, furniture_id: &str) -> Vec<DropChance>;
}

pub trait PlacedObjectProvider: SnapshotProvider<Fragment = Vec<PlacedObjectRecord>> {
    /// Instantiate the records that belong to `scene`. May finish later;
    /// see `is_ready`.
    fn load_scene(&mut self, scene: &str);

    /// False while a scene load is still in flight.
    fn is_ready(&self) -> bool;
}

/// Milestone progress. `restore` sets the index without notifying
/// listeners; `request_progress_update` re-notifies afterwards.
pub trait MilestoneProvider: SnapshotProvider<Fragment = u32> {
    fn current_label(&self) -> String;
    fn request_progress_update(&mut self);
}

/// State cached per slot for the whole process lifetime, not just for the
/// active slot.
pub trait SlotScopedProvider {
    fn name(&self) -> &'static str;

    type Fragment;

    /// The active slot changed to `slot`.
    fn activate_slot(&mut self, slot: &SlotKey);

    fn capture_slot(&self, slot: &SlotKey) -> Self::Fragment;

    fn restore_slot(&mut self, slot: &SlotKey, fragment: Self::Fragment);

    /// Drop whatever is cached for `slot`.
    fn forget_slot(&mut self, slot: &SlotKey);
}

/// Per-material color overrides, scoped to the active slot.
pub trait ColorOverrideProvider: SlotScopedProvider<Fragment = Vec<IndependentColorEntry>> {
    fn set_color(&mut self, key: &str, color: Hsv);
    fn color(&self, slot: &SlotKey, key: &str) -> Option<Hsv>;
}

/// Hook for managers that initialise once per slot.
pub trait SlotListener {
    fn on_slot_activated(&mut self, slot: &SlotKey);
}

/// World side of the pickup registry: instantiates and destroys pickup objects.
pub trait PickupSpawner {
    fn spawn(&mut self, template: &str, scene: &str, record: &DropRecord);

    /// Destroy every live pickup. Returns how many were destroyed.
    fn despawn_all(&mut self) -> usize;

    fn live_count(&self) -> usize;
}

/// Every collaborator the slot store aggregates, in restore order.
pub struct Providers {
    pub player:      Box<dyn SnapshotProvider<Fragment = PlayerPose>>,
    pub inventory:   Box<dyn InventoryProvider>,
    pub catalog:     Box<dyn ItemCatalog>,
    pub placed:      Box<dyn PlacedObjectProvider>,
    pub clock:       Box<dyn SnapshotProvider<Fragment = ClockRecord>>,
    pub money:       Box<dyn SnapshotProvider<Fragment = i64>>,
    pub milestone:   Box<dyn MilestoneProvider>,
    pub environment: Box<dyn SnapshotProvider<Fragment = EnvironmentTotals>>,
    pub colors:      Box<dyn ColorOverrideProvider>,
    pub hue_presets: Box<dyn SlotScopedProvider<Fragment = Option<HuePresetData>>>,
    pub wardrobe:    Box<dyn SnapshotProvider<Fragment = Option<Vec<WardrobeSelection>>>>,
}

impl Providers {
    /// Names in restore order, for logging.
    pub fn restore_order(&self) -> [&'static str; 9] {
        [
            self.player.name(),
            self.inventory.name(),
            self.placed.name(),
            self.clock.name(),
            self.money.name(),
            self.milestone.name(),
            self.environment.name(),
            self.hue_presets.name(),
            self.wardrobe.name(),
        ]
    }
}

//! Snapshot model: the full persisted state of one slot.
//!
//! A Snapshot is built fresh on every save from provider fragments and
//! dropped after serialization. It is never patched in place.
//! The on-disk layout lives in codec.rs; these types are the in-memory form.

use crate::{
    clock::ClockRecord,
    types::{Hsv, ItemId, Quat, SceneName, SlotKind, Vec3},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Money a brand-new story slot starts with.
pub const DEFAULT_STORY_MONEY: i64 = 2026;

/// Summary fields shown by the slot picker. Shared by both variants.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotHeader {
    pub save_date:           String,
    pub play_time:           f64,
    pub chapter_name:        String,
    pub location:            SceneName,
    pub screenshot_filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerPose {
    pub position: Vec3,
    pub rotation: Quat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    #[serde(rename = "itemID")]
    pub item_id:     ItemId,
    pub quantity:    u32,
    pub is_material: bool,
}

impl InventoryEntry {
    pub fn material(item_id: impl Into<ItemId>, quantity: u32) -> Self {
        Self { item_id: item_id.into(), quantity, is_material: true }
    }

    pub fn furniture(item_id: impl Into<ItemId>, quantity: u32) -> Self {
        Self { item_id: item_id.into(), quantity, is_material: false }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlacedObjectRecord {
    #[serde(rename = "id")]
    pub furniture_id:     ItemId,
    pub position:         Vec3,
    pub rotation:         Quat,
    pub scene_name:       SceneName,
    pub layer:            i32,
    #[serde(rename = "parentUID")]
    pub parent_uid:       String,
    #[serde(rename = "uniqueID")]
    pub unique_id:        String,
    pub wall_parent_id:   i32,
    pub wall_parent_name: String,
    pub wall_parent_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvironmentTotals {
    pub cozy:   i32,
    pub nature: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndependentColorEntry {
    pub key:   String,
    pub color: Hsv,
}

/// Saved state of one hue-preset controller group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HuePresetGroup {
    pub key_prefix:          String,
    pub selected_slot_index: i32,
    pub controller_colors:   Vec<Hsv>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HuePresetData {
    pub managers: Vec<HuePresetGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardrobeSelection {
    pub category: String,
    #[serde(rename = "itemID")]
    pub item_id:  ItemId,
}

/// Everything both variants persist.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SnapshotBody {
    pub player:           PlayerPose,
    pub inventory:        Vec<InventoryEntry>,
    /// Flat one-id-per-unit list read from old saves. Never written.
    pub legacy_inventory: Vec<ItemId>,
    pub placed_objects:   Vec<PlacedObjectRecord>,
    pub clock:            ClockRecord,
    pub money:            i64,
    pub milestone_index:  u32,
    pub environment:      EnvironmentTotals,
    /// slot key -> overrides for that slot.
    pub independent_colors: BTreeMap<String, Vec<IndependentColorEntry>>,
    pub hue_presets:      Option<HuePresetData>,
    pub wardrobe:         Option<Vec<WardrobeSelection>>,
}

/// Variant-only fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantFlags {
    Story { has_seen_opening: bool },
    Creative { unlimited_money: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub header:  SnapshotHeader,
    pub body:    SnapshotBody,
    pub variant: VariantFlags,
}

impl Snapshot {
    /// The state of a slot that has never been saved.
    pub fn empty(kind: SlotKind) -> Self {
        let (money, variant) = match kind {
            SlotKind::Story => (
                DEFAULT_STORY_MONEY,
                VariantFlags::Story { has_seen_opening: false },
            ),
            SlotKind::Creative => (0, VariantFlags::Creative { unlimited_money: true }),
        };
        Self {
            header: SnapshotHeader::default(),
            body: SnapshotBody { money, ..SnapshotBody::default() },
            variant,
        }
    }

    pub fn kind(&self) -> SlotKind {
        match self.variant {
            VariantFlags::Story { .. }    => SlotKind::Story,
            VariantFlags::Creative { .. } => SlotKind::Creative,
        }
    }
}

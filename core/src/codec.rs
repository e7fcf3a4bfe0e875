//! Snapshot file encoding.
//!
//! One wire struct per variant, written as pretty JSON. Decoding is done in
//! two steps so the legacy inventory layout stays an explicit branch:
//!   1. Parse the file into a JSON object and pull out the inventory field
//!      (`inventory` for story slots, `ownedItems` for creative slots).
//!   2. Classify that field: an array of strings is the legacy flat list,
//!      anything else must be the current entry list.
//! The rest of the object is then decoded into the variant's wire struct.

use crate::{
    clock::ClockRecord,
    snapshot::{
        EnvironmentTotals, HuePresetData, IndependentColorEntry, InventoryEntry,
        PlacedObjectRecord, PlayerPose, Snapshot, SnapshotBody, SnapshotHeader,
        VariantFlags, WardrobeSelection, DEFAULT_STORY_MONEY,
    },
    types::{ItemId, SlotKind},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const STORY_INVENTORY_FIELD: &str = "inventory";
const CREATIVE_INVENTORY_FIELD: &str = "ownedItems";
/// Story files without this field start with `DEFAULT_STORY_MONEY`.
const MONEY_FIELD: &str = "money";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColorSlotWire {
    slot_key: String,
    #[serde(default)]
    colors:   Vec<IndependentColorEntry>,
}

/// Fields shared by both variants, flattened into each file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BodyWire {
    player:          PlayerPose,
    furniture:       Vec<PlacedObjectRecord>,
    clock:           ClockRecord,
    money:           i64,
    milestone_index: u32,
    cozy:            i32,
    nature:          i32,
    independent_material_color_slots: Vec<ColorSlotWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    material_hue:       Option<HuePresetData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wardrobe_selections: Option<Vec<WardrobeSelection>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoryFile {
    #[serde(flatten)]
    header:    SnapshotHeader,
    #[serde(default)]
    inventory: Vec<InventoryEntry>,
    #[serde(flatten)]
    body:      BodyWire,
    #[serde(default)]
    has_seen_opening_panel: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreativeFile {
    #[serde(flatten)]
    header:      SnapshotHeader,
    #[serde(default)]
    owned_items: Vec<InventoryEntry>,
    #[serde(flatten)]
    body:        BodyWire,
    /// Files written before the flag existed had unlimited money.
    #[serde(default = "default_unlimited_money")]
    unlimited_money: bool,
}

fn default_unlimited_money() -> bool {
    true
}

/// What the inventory field of a file turned out to hold.
#[derive(Debug, Clone, PartialEq)]
pub enum InventoryPayload {
    Entries(Vec<InventoryEntry>),
    Legacy(Vec<ItemId>),
}

/// Classify a raw inventory field. Missing or null means an empty entry list.
pub fn classify_inventory(raw: Option<Value>) -> Result<InventoryPayload, serde_json::Error> {
    match raw {
        None | Some(Value::Null) => Ok(InventoryPayload::Entries(Vec::new())),
        Some(Value::Array(items)) if !items.is_empty() && items.iter().all(Value::is_string) => {
            let ids = items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect();
            Ok(InventoryPayload::Legacy(ids))
        }
        Some(other) => serde_json::from_value(other).map(InventoryPayload::Entries),
    }
}

// ── Encode ─────────────────────────────────────────────────────────

fn body_to_wire(body: &SnapshotBody) -> BodyWire {
    BodyWire {
        player:          body.player,
        furniture:       body.placed_objects.clone(),
        clock:           body.clock,
        money:           body.money,
        milestone_index: body.milestone_index,
        cozy:            body.environment.cozy,
        nature:          body.environment.nature,
        independent_material_color_slots: body
            .independent_colors
            .iter()
            .map(|(slot, colors)| ColorSlotWire {
                slot_key: slot.clone(),
                colors:   colors.clone(),
            })
            .collect(),
        material_hue:        body.hue_presets.clone(),
        wardrobe_selections: body.wardrobe.clone(),
    }
}

pub fn encode(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    let body = body_to_wire(&snapshot.body);
    let inventory = snapshot.body.inventory.clone();
    match snapshot.variant {
        VariantFlags::Story { has_seen_opening } => serde_json::to_string_pretty(&StoryFile {
            header: snapshot.header.clone(),
            inventory,
            body,
            has_seen_opening_panel: has_seen_opening,
        }),
        VariantFlags::Creative { unlimited_money } => serde_json::to_string_pretty(&CreativeFile {
            header: snapshot.header.clone(),
            owned_items: inventory,
            body,
            unlimited_money,
        }),
    }
}

// ── Decode ─────────────────────────────────────────────────────────

fn body_from_wire(wire: BodyWire, payload: InventoryPayload) -> SnapshotBody {
    let (inventory, legacy_inventory) = match payload {
        InventoryPayload::Entries(entries) => (entries, Vec::new()),
        InventoryPayload::Legacy(ids)      => (Vec::new(), ids),
    };
    let independent_colors: BTreeMap<String, Vec<IndependentColorEntry>> = wire
        .independent_material_color_slots
        .into_iter()
        .filter(|s| !s.slot_key.trim().is_empty())
        .map(|s| (s.slot_key.trim().to_string(), s.colors))
        .collect();
    SnapshotBody {
        player:          wire.player,
        inventory,
        legacy_inventory,
        placed_objects:  wire.furniture,
        clock:           wire.clock,
        money:           wire.money,
        milestone_index: wire.milestone_index,
        environment:     EnvironmentTotals { cozy: wire.cozy, nature: wire.nature },
        independent_colors,
        hue_presets:     wire.material_hue,
        wardrobe:        wire.wardrobe_selections,
    }
}

pub fn decode(kind: SlotKind, json: &str) -> Result<Snapshot, serde_json::Error> {
    let mut root: serde_json::Map<String, Value> = serde_json::from_str(json)?;
    let field = match kind {
        SlotKind::Story    => STORY_INVENTORY_FIELD,
        SlotKind::Creative => CREATIVE_INVENTORY_FIELD,
    };
    let payload = classify_inventory(root.remove(field))?;
    if kind == SlotKind::Story && !root.contains_key(MONEY_FIELD) {
        root.insert(MONEY_FIELD.to_string(), Value::from(DEFAULT_STORY_MONEY));
    }
    let rest = Value::Object(root);

    match kind {
        SlotKind::Story => {
            let file: StoryFile = serde_json::from_value(rest)?;
            Ok(Snapshot {
                header:  file.header,
                body:    body_from_wire(file.body, payload),
                variant: VariantFlags::Story { has_seen_opening: file.has_seen_opening_panel },
            })
        }
        SlotKind::Creative => {
            let file: CreativeFile = serde_json::from_value(rest)?;
            Ok(Snapshot {
                header:  file.header,
                body:    body_from_wire(file.body, payload),
                variant: VariantFlags::Creative { unlimited_money: file.unlimited_money },
            })
        }
    }
}

/// Parse only the summary fields. Unknown body fields are ignored.
pub fn decode_header(json: &str) -> Result<SnapshotHeader, serde_json::Error> {
    serde_json::from_str(json)
}

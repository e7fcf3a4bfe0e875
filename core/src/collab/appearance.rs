//! Color overrides, hue presets and wardrobe selections.
//!
//! Color overrides and hue presets are cached per slot for the whole process
//! lifetime, so flipping between slots without a restart keeps whatever was
//! already loaded for each of them.

use crate::{
    provider::{ColorOverrideProvider, SlotScopedProvider, SnapshotProvider},
    snapshot::{HuePresetData, IndependentColorEntry, WardrobeSelection},
    types::{Hsv, SlotKey},
};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
pub struct IndependentColorCache {
    slots:  HashMap<SlotKey, BTreeMap<String, Hsv>>,
    active: Option<SlotKey>,
}

impl IndependentColorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_slot(&self) -> Option<&SlotKey> {
        self.active.as_ref()
    }
}

impl SlotScopedProvider for IndependentColorCache {
    type Fragment = Vec<IndependentColorEntry>;

    fn name(&self) -> &'static str {
        "independent_colors"
    }

    fn activate_slot(&mut self, slot: &SlotKey) {
        self.slots.entry(slot.clone()).or_default();
        self.active = Some(slot.clone());
    }

    fn capture_slot(&self, slot: &SlotKey) -> Vec<IndependentColorEntry> {
        self.slots
            .get(slot)
            .map(|colors| {
                colors
                    .iter()
                    .map(|(key, &color)| IndependentColorEntry { key: key.clone(), color })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn restore_slot(&mut self, slot: &SlotKey, fragment: Vec<IndependentColorEntry>) {
        let colors = fragment
            .into_iter()
            .filter(|e| !e.key.trim().is_empty())
            .map(|e| (e.key.trim().to_string(), e.color))
            .collect();
        self.slots.insert(slot.clone(), colors);
    }

    fn forget_slot(&mut self, slot: &SlotKey) {
        self.slots.remove(slot);
    }
}

impl ColorOverrideProvider for IndependentColorCache {
    /// Writes go to the active slot; with no active slot they are dropped.
    fn set_color(&mut self, key: &str, color: Hsv) {
        let key = key.trim();
        if key.is_empty() {
            return;
        }
        let Some(active) = &self.active else {
            log::warn!("[colors] no active slot, ignoring override for '{key}'");
            return;
        };
        self.slots
            .entry(active.clone())
            .or_default()
            .insert(key.to_string(), color);
    }

    fn color(&self, slot: &SlotKey, key: &str) -> Option<Hsv> {
        self.slots.get(slot)?.get(key.trim()).copied()
    }
}

#[derive(Debug, Default)]
pub struct HuePresetCache {
    slots: HashMap<SlotKey, HuePresetData>,
}

impl HuePresetCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotScopedProvider for HuePresetCache {
    type Fragment = Option<HuePresetData>;

    fn name(&self) -> &'static str {
        "hue_presets"
    }

    fn activate_slot(&mut self, _slot: &SlotKey) {}

    fn capture_slot(&self, slot: &SlotKey) -> Option<HuePresetData> {
        self.slots.get(slot).cloned()
    }

    fn restore_slot(&mut self, slot: &SlotKey, fragment: Option<HuePresetData>) {
        match fragment {
            Some(data) => {
                self.slots.insert(slot.clone(), data);
            }
            None => {
                self.slots.remove(slot);
            }
        }
    }

    fn forget_slot(&mut self, slot: &SlotKey) {
        self.slots.remove(slot);
    }
}

#[derive(Debug, Default)]
pub struct MemoryWardrobe {
    pub selections: Option<Vec<WardrobeSelection>>,
}

impl SnapshotProvider for MemoryWardrobe {
    type Fragment = Option<Vec<WardrobeSelection>>;

    fn name(&self) -> &'static str {
        "wardrobe"
    }

    fn capture(&self) -> Option<Vec<WardrobeSelection>> {
        self.selections.clone()
    }

    /// A save without wardrobe data leaves the current outfit alone.
    fn restore(&mut self, fragment: Option<Vec<WardrobeSelection>>) {
        if fragment.is_some() {
            self.selections = fragment;
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

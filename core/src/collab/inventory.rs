//! In-memory inventory and item catalog.

use crate::{
    event::{ChangeNotifier, ChangeSource},
    provider::{DropChance, InventoryProvider, ItemCatalog, SnapshotProvider},
    snapshot::InventoryEntry,
    types::ItemId,
};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Default)]
pub struct MemoryInventory {
    materials: BTreeMap<ItemId, u32>,
    furniture: BTreeMap<ItemId, u32>,
    notifier:  Option<ChangeNotifier>,
}

impl MemoryInventory {
    pub fn new(notifier: Option<ChangeNotifier>) -> Self {
        Self { notifier, ..Self::default() }
    }

    pub fn material_count(&self, id: &str) -> u32 {
        self.materials.get(id).copied().unwrap_or(0)
    }

    pub fn furniture_count(&self, id: &str) -> u32 {
        self.furniture.get(id).copied().unwrap_or(0)
    }

    /// Remove up to `quantity` units. Returns how many were removed.
    pub fn remove_material(&mut self, id: &str, quantity: u32) -> u32 {
        let removed = take(&mut self.materials, id, quantity);
        if removed > 0 {
            self.changed();
        }
        removed
    }

    pub fn remove_furniture(&mut self, id: &str, quantity: u32) -> u32 {
        let removed = take(&mut self.furniture, id, quantity);
        if removed > 0 {
            self.changed();
        }
        removed
    }

    fn changed(&self) {
        if let Some(n) = &self.notifier {
            n.notify(ChangeSource::Inventory);
        }
    }
}

fn take(map: &mut BTreeMap<ItemId, u32>, id: &str, quantity: u32) -> u32 {
    let Some(have) = map.get_mut(id) else {
        return 0;
    };
    let removed = quantity.min(*have);
    *have -= removed;
    if *have == 0 {
        map.remove(id);
    }
    removed
}

impl SnapshotProvider for MemoryInventory {
    type Fragment = Vec<InventoryEntry>;

    fn name(&self) -> &'static str {
        "inventory"
    }

    /// Furniture first, then materials; each sorted by id.
    fn capture(&self) -> Vec<InventoryEntry> {
        self.furniture
            .iter()
            .map(|(id, &n)| InventoryEntry::furniture(id.clone(), n))
            .chain(
                self.materials
                    .iter()
                    .map(|(id, &n)| InventoryEntry::material(id.clone(), n)),
            )
            .collect()
    }

    fn restore(&mut self, fragment: Vec<InventoryEntry>) {
        self.materials.clear();
        self.furniture.clear();
        for entry in fragment.into_iter().filter(|e| e.quantity > 0) {
            let map = if entry.is_material { &mut self.materials } else { &mut self.furniture };
            *map.entry(entry.item_id).or_insert(0) += entry.quantity;
        }
        self.changed();
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl InventoryProvider for MemoryInventory {
    fn add_material(&mut self, id: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        *self.materials.entry(id.to_string()).or_insert(0) += quantity;
        self.changed();
    }

    fn add_furniture(&mut self, id: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        *self.furniture.entry(id.to_string()).or_insert(0) += quantity;
        self.changed();
    }
}

/// Catalog built in code or from a config file.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    materials: HashSet<ItemId>,
    furniture: HashMap<ItemId, Vec<DropChance>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_material(mut self, id: &str) -> Self {
        self.materials.insert(id.to_string());
        self
    }

    pub fn with_furniture(mut self, id: &str, drops: &[(&str, f32)]) -> Self {
        let table = drops
            .iter()
            .map(|&(material_id, rate)| DropChance {
                material_id: material_id.to_string(),
                rate,
            })
            .collect();
        self.furniture.insert(id.to_string(), table);
        self
    }
}

impl ItemCatalog for StaticCatalog {
    fn is_material(&self, id: &str) -> bool {
        self.materials.contains(id)
    }

    fn is_furniture(&self, id: &str) -> bool {
        self.furniture.contains_key(id)
    }

    fn drop_table(&self, furniture_id: &str) -> Vec<DropChance> {
        self.furniture.get(furniture_id).cloned().unwrap_or_default()
    }
}

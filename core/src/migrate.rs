//! Inventory restore, including migration of the legacy flat id list.
//!
//! Current saves carry quantity-aware entries and are applied as-is.
//! Old saves carry one id string per owned unit. Those are counted, then
//! each distinct id is resolved against the material registry first and
//! the furniture registry second. Ids neither registry knows are logged
//! and dropped; the rest of the inventory still loads.

use crate::{
    provider::{InventoryProvider, ItemCatalog},
    snapshot::InventoryEntry,
    types::ItemId,
};

/// What a legacy migration did, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub materials: Vec<(ItemId, u32)>,
    pub furniture: Vec<(ItemId, u32)>,
    pub skipped:   Vec<ItemId>,
}

/// Count trimmed ids, keeping first-seen order. Blank ids are ignored.
pub fn count_legacy_ids(ids: &[ItemId]) -> Vec<(ItemId, u32)> {
    let mut counts: Vec<(ItemId, u32)> = Vec::new();
    for raw in ids {
        let id = raw.trim();
        if id.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(seen, _)| seen == id) {
            Some((_, n)) => *n += 1,
            None => counts.push((id.to_string(), 1)),
        }
    }
    counts
}

/// Replace the inventory with the saved one. Returns a report when the
/// legacy branch ran, `None` otherwise.
pub fn restore_inventory(
    inventory: &mut dyn InventoryProvider,
    catalog:   &dyn ItemCatalog,
    entries:   Vec<InventoryEntry>,
    legacy:    &[ItemId],
) -> Option<MigrationReport> {
    if !entries.is_empty() || legacy.is_empty() {
        inventory.restore(entries);
        return None;
    }

    inventory.restore(Vec::new());
    let mut report = MigrationReport::default();
    for (id, quantity) in count_legacy_ids(legacy) {
        if catalog.is_material(&id) {
            inventory.add_material(&id, quantity);
            report.materials.push((id, quantity));
        } else if catalog.is_furniture(&id) {
            inventory.add_furniture(&id, quantity);
            report.furniture.push((id, quantity));
        } else {
            log::warn!("[migrate] unknown legacy item id '{id}' (x{quantity}), skipping");
            report.skipped.push(id);
        }
    }
    log::info!(
        "[migrate] legacy inventory migrated: {} material ids, {} furniture ids, {} skipped",
        report.materials.len(),
        report.furniture.len(),
        report.skipped.len()
    );
    Some(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_trimmed_ids_in_order() {
        let ids: Vec<ItemId> = vec![" wood".into(), "stone".into(), "wood ".into(), "".into()];
        assert_eq!(
            count_legacy_ids(&ids),
            vec![("wood".to_string(), 2), ("stone".to_string(), 1)]
        );
    }
}

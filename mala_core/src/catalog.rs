//! # Item Catalog
//!
//! The ordered collection of items available to patterns and to the finder.
//! Order is insertion order; identity is always the [`ItemId`].
//!
//! ## Example
//!
//! ```rust
//! use mala_core::catalog::Catalog;
//! use mala_core::items::Item;
//!
//! let mut catalog = Catalog::new();
//! let id = catalog.add(Item::bead("Tulsi 6mm", 6.0, 1.5, 0.3, "Tulsi")).unwrap();
//!
//! catalog.update(id, |item| item.weight_grams = 0.35).unwrap();
//! assert_eq!(catalog.get(id).unwrap().weight_grams, 0.35);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{MalaError, MalaResult};
use crate::items::{Item, ItemId};

/// Materials always offered by the finder's material filter
pub const STANDARD_MATERIALS: [&str; 3] = ["Rudraksha", "Tulsi", "Crystal"];

/// Label used for beads with an empty material
pub const OTHER_MATERIAL: &str = "Other";

/// Ordered item catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    items: Vec<Item>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from items, validating each.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> MalaResult<Self> {
        let mut catalog = Catalog::new();
        for item in items {
            catalog.add(item)?;
        }
        Ok(catalog)
    }

    /// The starter catalog: three Rudraksha beads, three mani and two caps.
    pub fn with_defaults() -> Self {
        let items = vec![
            Item::bead("Rudraksha 6mm", 6.0, 1.5, 0.5, "Rudraksha").with_color("#8B4513"),
            Item::bead("Rudraksha 8mm", 8.0, 1.8, 0.8, "Rudraksha").with_color("#A0522D"),
            Item::bead("Rudraksha 10mm", 10.0, 2.0, 1.2, "Rudraksha").with_color("#CD853F"),
            Item::mani("Mani 4mm", 4.0, 24, 1.2, 0.35).with_color("#FFD700"),
            Item::mani("Mani 5mm", 5.0, 22, 1.5, 0.55).with_color("#FFC125"),
            Item::mani("Mani 6mm", 6.0, 20, 1.8, 0.85).with_color("#FFB90F"),
            Item::cap("Cap 5.2mm", 5.2, 4.0, 2.46, 26, 1.2, 0.12).with_color("#DAA520"),
            Item::cap("Cap 8mm", 8.0, 5.0, 3.0, 24, 1.5, 0.4).with_color("#B8860B"),
        ];
        Catalog { items }
    }

    /// Add an item. Returns its id.
    ///
    /// Fails if the item is invalid or its id is already present.
    pub fn add(&mut self, item: Item) -> MalaResult<ItemId> {
        item.validate()?;
        if self.contains(item.id) {
            return Err(MalaError::invalid_input(
                "id",
                item.id.to_string(),
                "An item with this id already exists",
            ));
        }
        let id = item.id;
        debug!(id = %id, kind = item.kind_name(), name = %item.display_name, "Adding catalog item");
        self.items.push(item);
        Ok(id)
    }

    /// Apply an edit to the item with this id.
    ///
    /// The edit runs on a copy; the catalog only changes if the edited item
    /// still validates. The id cannot be changed.
    pub fn update(&mut self, id: ItemId, edit: impl FnOnce(&mut Item)) -> MalaResult<()> {
        let pos = self.position(id).ok_or_else(|| MalaError::item_not_found(id))?;
        let mut edited = self.items[pos].clone();
        edit(&mut edited);
        edited.id = id;
        edited.validate()?;
        debug!(id = %id, "Updating catalog item");
        self.items[pos] = edited;
        Ok(())
    }

    /// Replace the item with this id wholesale, keeping the id.
    pub fn replace(&mut self, id: ItemId, item: Item) -> MalaResult<()> {
        self.update(id, |slot| *slot = item)
    }

    /// Remove an item by id, returning it.
    pub fn remove(&mut self, id: ItemId) -> MalaResult<Item> {
        let pos = self.position(id).ok_or_else(|| MalaError::item_not_found(id))?;
        debug!(id = %id, "Removing catalog item");
        Ok(self.items.remove(pos))
    }

    /// Get an item by id
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }

    /// Find the first item with this display name
    pub fn find_by_name(&self, display_name: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.display_name == display_name)
    }

    /// All items in catalog order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn beads(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|i| i.is_bead())
    }

    pub fn caps(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|i| i.is_cap())
    }

    pub fn manis(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|i| i.is_mani())
    }

    /// Bead material labels: the standard list first, then any others in catalog order.
    pub fn materials(&self) -> Vec<String> {
        let mut materials: Vec<String> = STANDARD_MATERIALS.iter().map(|m| m.to_string()).collect();
        for bead in self.beads().filter_map(Item::as_bead) {
            let label = material_label(&bead.material);
            if !materials.iter().any(|m| m == label) {
                materials.push(label.to_string());
            }
        }
        materials
    }
}

/// The material a bead is filtered under; empty labels read as "Other".
pub fn material_label(material: &str) -> &str {
    if material.trim().is_empty() {
        OTHER_MATERIAL
    } else {
        material
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_contents() {
        let catalog = Catalog::with_defaults();
        assert_eq!(catalog.beads().count(), 3);
        assert_eq!(catalog.manis().count(), 3);
        assert_eq!(catalog.caps().count(), 2);
        assert!(catalog.items().iter().all(|i| i.validate().is_ok()));

        let cap = catalog.find_by_name("Cap 5.2mm").unwrap();
        assert_eq!(cap.as_cap().unwrap().height_mm, 2.46);
    }

    #[test]
    fn test_add_update_remove() {
        let mut catalog = Catalog::new();
        let id = catalog.add(Item::bead("Crystal 8mm", 8.0, 1.5, 1.1, "Crystal")).unwrap();
        assert_eq!(catalog.len(), 1);

        catalog.update(id, |i| i.display_name = "Clear Crystal 8mm".to_string()).unwrap();
        assert_eq!(catalog.get(id).unwrap().display_name, "Clear Crystal 8mm");

        let removed = catalog.remove(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(catalog.is_empty());
        assert!(catalog.remove(id).is_err());
    }

    #[test]
    fn test_update_rejects_invalid_edit() {
        let mut catalog = Catalog::new();
        let id = catalog.add(Item::bead("Tulsi 6mm", 6.0, 1.5, 0.3, "Tulsi")).unwrap();

        let result = catalog.update(id, |i| i.weight_grams = -2.0);
        assert!(result.is_err());
        assert_eq!(catalog.get(id).unwrap().weight_grams, 0.3);
    }

    #[test]
    fn test_update_keeps_id() {
        let mut catalog = Catalog::new();
        let id = catalog.add(Item::bead("Tulsi 6mm", 6.0, 1.5, 0.3, "Tulsi")).unwrap();
        let other = Item::bead("Tulsi 7mm", 7.0, 1.5, 0.4, "Tulsi");
        catalog.replace(id, other).unwrap();
        assert_eq!(catalog.get(id).unwrap().display_name, "Tulsi 7mm");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut catalog = Catalog::new();
        let bead = Item::bead("Tulsi 6mm", 6.0, 1.5, 0.3, "Tulsi");
        catalog.add(bead.clone()).unwrap();
        assert!(catalog.add(bead).is_err());
    }

    #[test]
    fn test_materials_list() {
        let mut catalog = Catalog::with_defaults();
        catalog.add(Item::bead("Sandalwood 8mm", 8.0, 1.5, 0.6, "Sandalwood")).unwrap();
        catalog.add(Item::bead("Mystery 7mm", 7.0, 1.5, 0.6, "")).unwrap();

        let materials = catalog.materials();
        assert_eq!(&materials[..3], &["Rudraksha", "Tulsi", "Crystal"]);
        assert!(materials.contains(&"Sandalwood".to_string()));
        assert!(materials.contains(&"Other".to_string()));
        assert_eq!(materials.iter().filter(|m| *m == "Rudraksha").count(), 1);
    }
}

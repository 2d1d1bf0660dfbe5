//! Pattern expansion.
//!
//! Turns a [`Pattern`] into the flat, ordered list of physical pieces. The
//! only rewrite rule is `Bead → Cap(left) Bead Cap(right)` when caps are
//! active; everything else is emitted as-is.
//!
//! ```rust
//! use mala_core::calculations::expand::{expand, CapSide};
//! use mala_core::catalog::Catalog;
//! use mala_core::pattern::Pattern;
//!
//! let catalog = Catalog::with_defaults();
//! let bead = catalog.find_by_name("Rudraksha 8mm").unwrap().id;
//! let cap = catalog.find_by_name("Cap 5.2mm").unwrap().id;
//!
//! let pattern = Pattern::new("Capped").with_entry(bead, 2).with_caps(cap);
//! let pieces = expand(&pattern, &catalog);
//!
//! assert_eq!(pieces.len(), 6);
//! assert_eq!(pieces[0].cap_side, Some(CapSide::Left));
//! assert_eq!(pieces[2].cap_side, Some(CapSide::Right));
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Catalog;
use crate::items::Item;
use crate::pattern::Pattern;

/// Which side of its bead a cap sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapSide {
    Left,
    Right,
}

/// One physical piece in build order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandedItem {
    /// The catalog item this piece is made of
    pub item: Item,

    /// Set for caps seated by the cap rule
    pub cap_side: Option<CapSide>,
}

impl ExpandedItem {
    fn plain(item: &Item) -> Self {
        ExpandedItem {
            item: item.clone(),
            cap_side: None,
        }
    }

    fn cap(item: &Item, side: CapSide) -> Self {
        ExpandedItem {
            item: item.clone(),
            cap_side: Some(side),
        }
    }
}

/// The cap used for expansion: toggle on, a cap selected, and that cap present in the catalog.
pub fn active_cap<'a>(pattern: &Pattern, catalog: &'a Catalog) -> Option<&'a Item> {
    if !pattern.include_caps {
        return None;
    }
    let cap = catalog.get(pattern.selected_cap_id?)?;
    cap.is_cap().then_some(cap)
}

/// Expand a pattern into its pieces.
///
/// Entries that reference items no longer in the catalog are skipped. The
/// output depends only on the inputs.
pub fn expand(pattern: &Pattern, catalog: &Catalog) -> Vec<ExpandedItem> {
    let cap = active_cap(pattern, catalog);
    let mut pieces = Vec::new();
    let mut skipped = 0usize;

    for _ in 0..pattern.repeat_count {
        for entry in &pattern.entries {
            let Some(item) = catalog.get(entry.item_id) else {
                skipped += 1;
                continue;
            };
            for _ in 0..entry.count {
                match cap {
                    Some(cap) if item.is_bead() => {
                        pieces.push(ExpandedItem::cap(cap, CapSide::Left));
                        pieces.push(ExpandedItem::plain(item));
                        pieces.push(ExpandedItem::cap(cap, CapSide::Right));
                    }
                    _ => pieces.push(ExpandedItem::plain(item)),
                }
            }
        }
    }

    if skipped > 0 {
        debug!(skipped, "Skipped pattern entries with missing catalog items");
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::Item;

    fn setup() -> (Catalog, Item, Item, Item) {
        let bead = Item::bead("Rudraksha 8mm", 8.0, 1.8, 0.8, "Rudraksha");
        let mani = Item::mani("Mani 4mm", 4.0, 24, 1.2, 0.35);
        let cap = Item::cap("Cap 8.2mm", 8.2, 7.0, 2.46, 26, 1.2, 0.12);
        let catalog = Catalog::from_items([bead.clone(), mani.clone(), cap.clone()]).unwrap();
        (catalog, bead, mani, cap)
    }

    #[test]
    fn test_caps_triple_each_bead() {
        let (catalog, bead, mani, cap) = setup();
        let pattern = Pattern::new("Test")
            .with_entry(bead.id, 2)
            .with_entry(mani.id, 3)
            .with_caps(cap.id)
            .with_repeat(4);

        let pieces = expand(&pattern, &catalog);
        let beads = pieces.iter().filter(|p| p.item.is_bead()).count();
        let caps = pieces.iter().filter(|p| p.item.is_cap()).count();
        let manis = pieces.iter().filter(|p| p.item.is_mani()).count();

        assert_eq!(beads, 8);
        assert_eq!(caps, 16);
        assert_eq!(manis, 12);
        assert_eq!(pieces.len(), 3 * beads + manis);
    }

    #[test]
    fn test_order_follows_pattern_and_repeats() {
        let (catalog, bead, mani, cap) = setup();
        let pattern = Pattern::new("Test")
            .with_entry(bead.id, 1)
            .with_entry(mani.id, 1)
            .with_caps(cap.id)
            .with_repeat(2);

        let kinds: Vec<_> = expand(&pattern, &catalog)
            .iter()
            .map(|p| (p.item.kind_name(), p.cap_side))
            .collect();
        let unit = [
            ("Cap", Some(CapSide::Left)),
            ("Bead", None),
            ("Cap", Some(CapSide::Right)),
            ("Mani", None),
        ];
        assert_eq!(kinds, [unit, unit].concat());
    }

    #[test]
    fn test_caps_off_emits_items_as_is() {
        let (catalog, bead, _, cap) = setup();
        let mut pattern = Pattern::new("Test").with_entry(bead.id, 3).with_caps(cap.id);
        pattern.include_caps = false;

        let pieces = expand(&pattern, &catalog);
        assert_eq!(pieces.len(), 3);
        assert!(pieces.iter().all(|p| p.cap_side.is_none()));
    }

    #[test]
    fn test_missing_item_skipped() {
        let (mut catalog, bead, mani, _) = setup();
        let pattern = Pattern::new("Test").with_entry(bead.id, 2).with_entry(mani.id, 2);
        catalog.remove(mani.id).unwrap();

        let pieces = expand(&pattern, &catalog);
        assert_eq!(pieces.len(), 2);
        assert!(pieces.iter().all(|p| p.item.is_bead()));
    }

    #[test]
    fn test_deleted_cap_disables_rule() {
        let (mut catalog, bead, _, cap) = setup();
        let pattern = Pattern::new("Test").with_entry(bead.id, 2).with_caps(cap.id);
        catalog.remove(cap.id).unwrap();

        assert_eq!(expand(&pattern, &catalog).len(), 2);
    }

    #[test]
    fn test_deterministic() {
        let (catalog, bead, mani, cap) = setup();
        let pattern = Pattern::new("Test")
            .with_entry(bead.id, 5)
            .with_entry(mani.id, 4)
            .with_caps(cap.id);
        assert_eq!(expand(&pattern, &catalog), expand(&pattern, &catalog));
    }
}

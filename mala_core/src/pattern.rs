//! # Patterns
//!
//! A pattern is the compact description of a mala: an ordered list of
//! `(item, count)` entries repeated `repeat_count` times, a cap toggle, and
//! the joint settings. Caps are never stored as entries; when the toggle is
//! on, the expander seats a cap on each side of every bead.
//!
//! ## Example
//!
//! ```rust
//! use mala_core::catalog::Catalog;
//! use mala_core::pattern::Pattern;
//!
//! let catalog = Catalog::with_defaults();
//! let bead = catalog.find_by_name("Rudraksha 8mm").unwrap().id;
//! let mani = catalog.find_by_name("Mani 4mm").unwrap().id;
//! let cap = catalog.find_by_name("Cap 5.2mm").unwrap().id;
//!
//! let pattern = Pattern::new("54 + 53")
//!     .with_entry(bead, 54)
//!     .with_entry(mani, 53)
//!     .with_caps(cap);
//!
//! let summary = pattern.summary(&catalog);
//! assert_eq!(summary.cap_count, 108);
//! assert_eq!(summary.total_pieces, 54 + 53 + 108);
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::expand::active_cap;
use crate::catalog::Catalog;
use crate::errors::{MalaError, MalaResult};
use crate::items::ItemId;
use crate::settings::KadiSettings;

/// Identity of a pattern
pub type PatternId = Uuid;

/// One `(item, count)` entry of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub item_id: ItemId,
    pub count: u32,
}

/// A mala pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: PatternId,

    /// User label (e.g., "Standard 108 Mala")
    pub name: String,

    /// Entries in string order
    pub entries: Vec<PatternEntry>,

    /// How many times the entry sequence is repeated
    pub repeat_count: u32,

    /// Whether each bead gets a cap on both sides
    pub include_caps: bool,

    /// The cap used when `include_caps` is on
    pub selected_cap_id: Option<ItemId>,

    /// Joint settings (one joint per mala)
    pub kadi: KadiSettings,
}

impl Default for Pattern {
    fn default() -> Self {
        Pattern::new("Custom Pattern")
    }
}

impl Pattern {
    /// Create an empty pattern repeated once, without caps or joint.
    pub fn new(name: impl Into<String>) -> Self {
        Pattern {
            id: Uuid::new_v4(),
            name: name.into(),
            entries: Vec::new(),
            repeat_count: 1,
            include_caps: false,
            selected_cap_id: None,
            kadi: KadiSettings::default(),
        }
    }

    /// Add an entry and return self (builder pattern). See [`Pattern::add_entry`].
    pub fn with_entry(mut self, item_id: ItemId, count: u32) -> Self {
        self.add_entry(item_id, count);
        self
    }

    /// Enable caps using this cap item (builder pattern)
    pub fn with_caps(mut self, cap_id: ItemId) -> Self {
        self.include_caps = true;
        self.selected_cap_id = Some(cap_id);
        self
    }

    /// Set the repeat count (builder pattern)
    pub fn with_repeat(mut self, repeat_count: u32) -> Self {
        self.repeat_count = repeat_count;
        self
    }

    /// Set the joint (builder pattern)
    pub fn with_kadi(mut self, kadi: KadiSettings) -> Self {
        self.kadi = kadi;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add `count` of an item. Merges into an existing entry for the same
    /// item; a zero count is ignored.
    pub fn add_entry(&mut self, item_id: ItemId, count: u32) {
        if count == 0 {
            return;
        }
        match self.entries.iter_mut().find(|e| e.item_id == item_id) {
            Some(entry) => entry.count = entry.count.saturating_add(count),
            None => self.entries.push(PatternEntry { item_id, count }),
        }
    }

    /// Set the count of the entry at `index`. A zero count removes the entry.
    pub fn set_count(&mut self, index: usize, count: u32) -> MalaResult<()> {
        if index >= self.entries.len() {
            return Err(MalaError::invalid_input(
                "index",
                index.to_string(),
                format!("Pattern has {} entries", self.entries.len()),
            ));
        }
        if count == 0 {
            self.entries.remove(index);
        } else {
            self.entries[index].count = count;
        }
        Ok(())
    }

    /// Remove the entry at `index`
    pub fn remove_entry(&mut self, index: usize) -> Option<PatternEntry> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    /// Move the entry at `index` one place earlier. Returns false at the start.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.entries.len() {
            return false;
        }
        self.entries.swap(index, index - 1);
        true
    }

    /// Move the entry at `index` one place later. Returns false at the end.
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.entries.len() {
            return false;
        }
        self.entries.swap(index, index + 1);
        true
    }

    /// Remove all entries, disable caps and reset the joint.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.include_caps = false;
        self.kadi = KadiSettings::default();
    }

    /// Piece counts without expanding the pattern.
    ///
    /// Entries whose item is missing from the catalog are not counted, and
    /// caps only count while the selected cap is still in the catalog.
    pub fn summary(&self, catalog: &Catalog) -> PatternSummary {
        let mut bead_count = 0u32;
        let mut mani_count = 0u32;
        for entry in &self.entries {
            match catalog.get(entry.item_id) {
                Some(item) if item.is_bead() => bead_count = bead_count.saturating_add(entry.count),
                Some(item) if item.is_mani() => mani_count = mani_count.saturating_add(entry.count),
                _ => {}
            }
        }
        bead_count = bead_count.saturating_mul(self.repeat_count);
        mani_count = mani_count.saturating_mul(self.repeat_count);
        let cap_count = if active_cap(self, catalog).is_some() {
            bead_count.saturating_mul(2)
        } else {
            0
        };
        let kadi = u32::from(self.kadi.enabled);
        PatternSummary {
            bead_count,
            mani_count,
            cap_count,
            total_pieces: bead_count
                .saturating_add(mani_count)
                .saturating_add(cap_count)
                .saturating_add(kadi),
        }
    }

    /// Build a preset from the first bead (and first mani) of the catalog.
    ///
    /// Returns `None` if the catalog has no beads.
    pub fn from_preset(preset: Preset, catalog: &Catalog) -> Option<Pattern> {
        let bead = catalog.beads().next()?;
        let mani = catalog.manis().next();
        let (beads, manis) = preset.counts();

        let mut pattern = Pattern::new(preset.name()).with_entry(bead.id, beads);
        if let Some(mani) = mani {
            pattern.add_entry(mani.id, manis);
        }
        Some(pattern)
    }
}

/// Piece counts of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PatternSummary {
    pub bead_count: u32,
    pub mani_count: u32,
    pub cap_count: u32,
    pub total_pieces: u32,
}

/// Canonical quick-start patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preset {
    /// 108 beads
    Standard108,
    /// 54 beads + 53 mani
    Beads54Mani53,
    /// 27 beads + 26 mani
    Beads27Mani26,
}

impl Preset {
    pub fn name(&self) -> &'static str {
        match self {
            Preset::Standard108 => "Standard 108 Mala",
            Preset::Beads54Mani53 => "54 Bead + 53 Mani",
            Preset::Beads27Mani26 => "27 Bead + 26 Mani",
        }
    }

    /// (bead count, mani count)
    pub fn counts(&self) -> (u32, u32) {
        match self {
            Preset::Standard108 => (108, 0),
            Preset::Beads54Mani53 => (54, 53),
            Preset::Beads27Mani26 => (27, 26),
        }
    }
}

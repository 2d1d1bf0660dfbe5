//! # Length, Weight and Gold Calculator
//!
//! Aggregates an expanded piece sequence into a [`CalculationResult`].
//!
//! ## Rules
//!
//! - Beads and mani contribute their length dimension; caps contribute
//!   `max(0, height − cap_overlap)`
//! - A cap and its bead are separated by `cap_bead_gap_mm`; every other
//!   adjacent pair by `uniform_gap_mm`; no gap at the ends
//! - An enabled joint adds its size and weight once
//! - With the measured set-length method and at least one set, the total
//!   length is rebuilt from the measured set length
//! - Mani, caps and the joint are gold; beads never are
//! - Thread weight adds to total weight only
//!
//! ## Example
//!
//! ```rust
//! use mala_core::calculations::calculator::calculate;
//! use mala_core::catalog::Catalog;
//! use mala_core::pattern::Pattern;
//! use mala_core::settings::{GapSettings, GoldRates};
//!
//! let catalog = Catalog::with_defaults();
//! let bead = catalog.find_by_name("Rudraksha 8mm").unwrap().id;
//! let pattern = Pattern::new("Plain 108").with_entry(bead, 108);
//!
//! let result = calculate(&pattern, &catalog, &GapSettings::default(), &GoldRates::default()).unwrap();
//! assert_eq!(result.total_pieces, 108);
//! assert_eq!(result.gold_weight_grams, 0.0);
//!
//! // An empty pattern has nothing to show
//! let empty = Pattern::new("Empty");
//! assert!(calculate(&empty, &catalog, &GapSettings::default(), &GoldRates::default()).is_none());
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::expand::{expand, ExpandedItem};
use crate::calculations::geometry::{effective_cap_height_mm, units_per_inch, SetGeometry, StrandLayout};
use crate::catalog::Catalog;
use crate::items::{Item, ItemId};
use crate::pattern::Pattern;
use crate::settings::{GapSettings, GoldRates, KadiSettings};
use crate::units::{mm_to_inches, ratio_or_zero};

/// Label of the joint line in the breakdown
pub const KADI_LABEL: &str = "Kadi (Joint)";

/// Label of the thread line in the breakdown
pub const THREAD_LABEL: &str = "Thread/Wire";

/// What a breakdown line aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum BreakdownKey {
    /// All pieces of one catalog item
    Item(ItemId),
    /// The joint
    Kadi,
    /// Thread/wire weight
    Thread,
}

/// Pieces and weight attributed to one item (or to the joint/thread).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownLine {
    pub key: BreakdownKey,

    /// Display label, resolved when the line was created
    pub label: String,

    pub pieces: u32,
    pub weight_grams: f64,
    pub is_gold: bool,
}

/// Derived metrics of a pattern. Recomputed on every input change.
///
/// ## JSON Example
///
/// ```json
/// {
///   "total_pieces": 9,
///   "total_length_mm": 39.76,
///   "total_length_in": 1.565,
///   "total_weight_grams": 3.12,
///   "gold_weight_grams": 0.72,
///   "gold_cost": 4752.0,
///   "set_count": 3,
///   "set_length_mm": 12.92,
///   "set_length_with_gap_mm": 13.42,
///   "sets_per_inch": 1.893
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    // === Counts ===
    /// All pieces including the joint
    pub total_pieces: u32,
    pub bead_count: u32,
    pub cap_count: u32,
    pub mani_count: u32,

    /// Per-item breakdown in first-appearance order, then joint and thread
    pub breakdown: Vec<BreakdownLine>,

    // === Length ===
    pub total_length_mm: f64,
    pub total_length_in: f64,

    /// Number of adjacent pairs separated by the uniform gap
    pub uniform_gap_count: u32,

    /// Whether the total length was rebuilt from the measured set length
    pub measured_length_applied: bool,

    // === Weight ===
    /// Pieces + joint + thread
    pub total_weight_grams: f64,
    pub gold_weight_grams: f64,
    /// Gold weight × rate
    pub gold_cost: f64,

    // === Density ===
    pub pieces_per_inch: f64,
    pub average_piece_weight_grams: f64,
    pub average_piece_length_mm: f64,

    // === Sets (only when caps are on and a bead exists) ===
    pub set_count: u32,
    pub set_length_mm: f64,
    pub set_length_with_gap_mm: f64,
    pub sets_per_inch: f64,

    /// The pieces in build order
    pub expanded_items: Vec<ExpandedItem>,
}

impl CalculationResult {
    /// Breakdown line for a catalog item
    pub fn line_for(&self, item_id: ItemId) -> Option<&BreakdownLine> {
        self.breakdown.iter().find(|l| l.key == BreakdownKey::Item(item_id))
    }

    /// Breakdown line for the joint or thread
    pub fn line(&self, key: BreakdownKey) -> Option<&BreakdownLine> {
        self.breakdown.iter().find(|l| l.key == key)
    }
}

/// Expand a pattern and calculate it.
///
/// Returns `None` for an empty pattern or when no pieces survive expansion.
pub fn calculate(
    pattern: &Pattern,
    catalog: &Catalog,
    settings: &GapSettings,
    rates: &GoldRates,
) -> Option<CalculationResult> {
    if pattern.is_empty() {
        return None;
    }
    calculate_expanded(expand(pattern, catalog), &pattern.kadi, settings, rates)
}

/// Calculate an already expanded sequence.
///
/// Set metrics are taken from the first bead and the first cap seated by the
/// cap rule; caps carried as plain entries never form sets.
/// Returns `None` for an empty sequence.
pub fn calculate_expanded(
    expanded: Vec<ExpandedItem>,
    kadi: &KadiSettings,
    settings: &GapSettings,
    rates: &GoldRates,
) -> Option<CalculationResult> {
    if expanded.is_empty() {
        return None;
    }

    let mut totals = Totals::default();
    for (i, piece) in expanded.iter().enumerate() {
        let item = &piece.item;
        totals.length_mm += match item.as_cap() {
            Some(cap) => effective_cap_height_mm(cap.height_mm, settings.cap_overlap_mm),
            None => item.length_contribution_mm(),
        };

        if let Some(next) = expanded.get(i + 1) {
            if is_cap_bead_joint(item, &next.item) {
                totals.length_mm += settings.cap_bead_gap_mm;
            } else {
                totals.length_mm += settings.uniform_gap_mm;
                totals.uniform_gap_count += 1;
            }
        }

        totals.add_piece(item);
    }

    if kadi.enabled {
        totals.length_mm += kadi.size_mm;
        totals.weight_grams += kadi.weight_grams;
        totals.gold_weight_grams += kadi.weight_grams;
        totals.breakdown.push(BreakdownLine {
            key: BreakdownKey::Kadi,
            label: KADI_LABEL.to_string(),
            pieces: 1,
            weight_grams: kadi.weight_grams,
            is_gold: true,
        });
    }

    if settings.thread_weight_grams > 0.0 {
        totals.weight_grams += settings.thread_weight_grams;
        totals.breakdown.push(BreakdownLine {
            key: BreakdownKey::Thread,
            label: THREAD_LABEL.to_string(),
            pieces: 0,
            weight_grams: settings.thread_weight_grams,
            is_gold: false,
        });
    }

    // Sets exist only where the cap rule seated caps
    let first_bead = expanded.iter().find_map(|p| p.item.as_bead());
    let first_cap = expanded
        .iter()
        .filter(|p| p.cap_side.is_some())
        .find_map(|p| p.item.as_cap());
    let set = match (first_bead, first_cap) {
        (Some(bead), Some(cap)) if totals.bead_count > 0 => Some(SetGeometry::resolve(
            bead.diameter_mm,
            cap.height_mm,
            settings.cap_overlap_mm,
            settings,
        )),
        _ => None,
    };
    let set_count = if set.is_some() { totals.bead_count } else { 0 };
    let set_length_mm = set.map_or(0.0, |s| s.set_length_mm);
    let set_length_with_gap_mm = if set.is_some() {
        set_length_mm + settings.uniform_gap_mm
    } else {
        0.0
    };

    let mut measured_length_applied = false;
    if let Some(set) = set.filter(|s| s.measured && set_count > 0) {
        let mani_length_mm: f64 = expanded
            .iter()
            .filter(|p| p.item.is_mani())
            .map(|p| p.item.length_contribution_mm())
            .sum();
        let strand = StrandLayout {
            unit_count: set_count,
            unit_length_mm: set.set_length_mm,
            mani_count: totals.mani_count,
            mani_length_mm,
            gap_mm: settings.uniform_gap_mm,
            unit_includes_gap: settings.measured_set_includes_gap,
        }
        .measure();
        totals.length_mm = strand.total_mm + kadi.length_mm();
        totals.uniform_gap_count = strand.gap_count;
        measured_length_applied = true;
    }

    let total_pieces = u32::try_from(expanded.len())
        .unwrap_or(u32::MAX)
        .saturating_add(u32::from(kadi.enabled));
    let total_length_in = mm_to_inches(totals.length_mm);
    let gold_cost = totals.gold_weight_grams * rates.rate;

    debug!(
        pieces = total_pieces,
        length_mm = totals.length_mm,
        weight_g = totals.weight_grams,
        measured = measured_length_applied,
        "Calculated mala"
    );

    Some(CalculationResult {
        total_pieces,
        bead_count: totals.bead_count,
        cap_count: totals.cap_count,
        mani_count: totals.mani_count,
        breakdown: totals.breakdown,
        total_length_mm: totals.length_mm,
        total_length_in,
        uniform_gap_count: totals.uniform_gap_count,
        measured_length_applied,
        total_weight_grams: totals.weight_grams,
        gold_weight_grams: totals.gold_weight_grams,
        gold_cost,
        pieces_per_inch: ratio_or_zero(f64::from(total_pieces), total_length_in),
        average_piece_weight_grams: ratio_or_zero(totals.weight_grams, f64::from(total_pieces)),
        average_piece_length_mm: ratio_or_zero(totals.length_mm, f64::from(total_pieces)),
        set_count,
        set_length_mm,
        set_length_with_gap_mm,
        sets_per_inch: if set.is_some() {
            units_per_inch(set_length_mm, settings.uniform_gap_mm)
        } else {
            0.0
        },
        expanded_items: expanded,
    })
}

fn is_cap_bead_joint(a: &Item, b: &Item) -> bool {
    (a.is_cap() && b.is_bead()) || (a.is_bead() && b.is_cap())
}

#[derive(Default)]
struct Totals {
    length_mm: f64,
    uniform_gap_count: u32,
    weight_grams: f64,
    gold_weight_grams: f64,
    bead_count: u32,
    cap_count: u32,
    mani_count: u32,
    breakdown: Vec<BreakdownLine>,
}

impl Totals {
    fn add_piece(&mut self, item: &Item) {
        self.weight_grams += item.weight_grams;
        if item.is_gold() {
            self.gold_weight_grams += item.weight_grams;
        }
        if item.is_bead() {
            self.bead_count += 1;
        } else if item.is_cap() {
            self.cap_count += 1;
        } else if item.is_mani() {
            self.mani_count += 1;
        }

        let key = BreakdownKey::Item(item.id);
        match self.breakdown.iter_mut().find(|l| l.key == key) {
            Some(line) => {
                line.pieces += 1;
                line.weight_grams += item.weight_grams;
            }
            None => self.breakdown.push(BreakdownLine {
                key,
                label: item.display_name.clone(),
                pieces: 1,
                weight_grams: item.weight_grams,
                is_gold: item.is_gold(),
            }),
        }
    }
}

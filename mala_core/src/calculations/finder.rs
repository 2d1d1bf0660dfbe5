//! # Combination Finder
//!
//! Searches bead × cap × mani × gap × bead-count for the malas closest to a
//! customer's target length and weight.
//!
//! ## Search space
//!
//! - Beads: material filter, then size preference. A stage that filters out
//!   everything is dropped rather than returning nothing.
//! - Caps: those not more than 0.5mm wider than the bead, else the smallest cap
//! - Mani: every catalog mani when requested, else none
//! - Gaps: 0.5mm steps from `gap_min_mm` to `gap_max_mm`
//! - Bead counts: the fixed count, or ±10 around the estimate plus the
//!   canonical counts 27, 36, 54, 72 and 108
//!
//! The joint is never part of the match: the target length has the joint
//! subtracted before it is compared to the beaded portion.
//!
//! ## Example
//!
//! ```rust
//! use mala_core::calculations::finder::{find_combinations, CustomerRequirements, FinderStatus};
//! use mala_core::catalog::Catalog;
//! use mala_core::settings::GapSettings;
//!
//! let catalog = Catalog::with_defaults();
//! let requirements = CustomerRequirements::default().with_gap_range(0.5, 1.0);
//!
//! let outcome = find_combinations(&catalog, &requirements, &GapSettings::default()).unwrap();
//! assert_eq!(outcome.status, FinderStatus::Found);
//! assert!(outcome.combinations.len() <= 10);
//!
//! let best = &outcome.combinations[0];
//! println!("{} × {} → {:.2}in", best.bead_count, best.bead.display_name, best.length_in);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::geometry::{units_per_inch, SetGeometry, StrandLayout};
use crate::catalog::{material_label, Catalog};
use crate::errors::{ensure_non_negative, MalaError, MalaResult};
use crate::items::Item;
use crate::pattern::Pattern;
use crate::settings::{GapSettings, KadiSettings};
use crate::units::{mm_to_inches, MM_PER_INCH};

/// Maximum number of combinations returned
pub const MAX_RESULTS: usize = 10;

/// Canonical mala bead counts always tried in auto mode
pub const REFERENCE_BEAD_COUNTS: [u32; 5] = [27, 36, 54, 72, 108];

/// Gap search step (mm)
pub const GAP_STEP_MM: f64 = 0.5;

/// A cap may be at most this much wider than its bead (mm)
pub const CAP_WIDTH_ALLOWANCE_MM: f64 = 0.5;

/// Tolerance of [`BeadSizePreference::Exact`] (mm)
pub const EXACT_SIZE_TOLERANCE_MM: f64 = 1.0;

/// Hard limit of [`LengthPriority::Exact`] (mm)
pub const EXACT_LENGTH_TOLERANCE_MM: f64 = 5.0;

/// Hard limit of [`LengthPriority::Approximate`] (mm, one inch)
pub const APPROXIMATE_LENGTH_TOLERANCE_MM: f64 = 25.4;

/// Hard limit of [`WeightPriority::Exact`] (g)
pub const EXACT_WEIGHT_TOLERANCE_GRAMS: f64 = 5.0;

/// Smallest bead count tried around the estimate
const MIN_ESTIMATED_BEAD_COUNT: i64 = 5;

/// Spread tried on each side of the estimate
const ESTIMATE_SPREAD: i64 = 10;

/// How strictly the length target is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthPriority {
    /// Within 5mm
    Exact,
    /// Within one inch
    #[default]
    Approximate,
    /// At least the target, no upper bound
    Minimum,
}

impl LengthPriority {
    fn accepts(self, beaded_length_mm: f64, target_mm: f64) -> bool {
        let diff = (beaded_length_mm - target_mm).abs();
        match self {
            LengthPriority::Exact => diff <= EXACT_LENGTH_TOLERANCE_MM,
            LengthPriority::Approximate => diff <= APPROXIMATE_LENGTH_TOLERANCE_MM,
            LengthPriority::Minimum => beaded_length_mm >= target_mm,
        }
    }
}

/// How strictly the weight target is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPriority {
    /// Within 5g
    Exact,
    /// At most the target
    Max,
    /// No filter, weight does not score
    #[default]
    NotImportant,
}

impl WeightPriority {
    fn accepts(self, weight_grams: f64, target_grams: f64) -> bool {
        match self {
            WeightPriority::Exact => (weight_grams - target_grams).abs() <= EXACT_WEIGHT_TOLERANCE_GRAMS,
            WeightPriority::Max => weight_grams <= target_grams,
            WeightPriority::NotImportant => true,
        }
    }
}

/// Which score dominates the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPriority {
    #[default]
    Length,
    Weight,
    Balanced,
}

impl MatchPriority {
    /// Combined score; lower is better.
    pub fn combine(self, length_score: f64, weight_score: f64) -> f64 {
        match self {
            MatchPriority::Length => length_score * 2.0 + weight_score * 0.5,
            MatchPriority::Weight => length_score * 0.5 + weight_score * 2.0,
            MatchPriority::Balanced => length_score + weight_score,
        }
    }
}

/// How many beads to try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeadCountMode {
    /// Estimate from the target length
    #[default]
    Auto,
    /// Exactly this many beads
    Fixed(u32),
}

/// Which bead materials qualify.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialFilter {
    #[default]
    All,
    /// Only these materials; an empty bead material matches "Other"
    Only(Vec<String>),
}

impl MaterialFilter {
    pub fn matches(&self, material: &str) -> bool {
        match self {
            MaterialFilter::All => true,
            MaterialFilter::Only(materials) => {
                let label = material_label(material);
                materials.iter().any(|m| m == label)
            }
        }
    }
}

/// Preferred bead diameter.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeadSizePreference {
    #[default]
    Any,
    /// Within ±1mm of this diameter
    Exact { diameter_mm: f64 },
    /// Inclusive range
    Range { min_mm: f64, max_mm: f64 },
}

impl BeadSizePreference {
    pub fn matches(&self, diameter_mm: f64) -> bool {
        match *self {
            BeadSizePreference::Any => true,
            BeadSizePreference::Exact { diameter_mm: wanted } => {
                (diameter_mm - wanted).abs() <= EXACT_SIZE_TOLERANCE_MM
            }
            BeadSizePreference::Range { min_mm, max_mm } => diameter_mm >= min_mm && diameter_mm <= max_mm,
        }
    }
}

/// How many mani go with a bead count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManiCountMode {
    /// One fewer than the beads, interleaved
    #[default]
    Auto,
    /// A fixed number
    Custom(u32),
    /// One mani per `n` beads, rounded down
    Ratio(u32),
}

impl ManiCountMode {
    /// Mani count for a bead count
    pub fn count_for(self, bead_count: u32) -> u32 {
        match self {
            ManiCountMode::Auto => bead_count.saturating_sub(1),
            ManiCountMode::Custom(count) => count,
            ManiCountMode::Ratio(ratio) => bead_count.checked_div(ratio).unwrap_or(0),
        }
    }
}

/// A flat allowance for gold wire between pieces, averaged from a range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoldAllowance {
    pub min_grams: f64,
    pub max_grams: f64,
}

impl Default for GoldAllowance {
    fn default() -> Self {
        GoldAllowance {
            min_grams: 3.0,
            max_grams: 5.0,
        }
    }
}

impl GoldAllowance {
    pub fn average_grams(&self) -> f64 {
        (self.min_grams + self.max_grams) / 2.0
    }
}

/// What the customer asked for.
///
/// ## JSON Example
///
/// ```json
/// {
///   "target_length_in": 24.0,
///   "length_priority": "approximate",
///   "target_weight_grams": 50.0,
///   "weight_priority": "not_important",
///   "bead_count": "auto",
///   "materials": "all",
///   "bead_size": { "range": { "min_mm": 6.0, "max_mm": 10.0 } },
///   "include_mani": true,
///   "mani_count": { "ratio": 2 },
///   "include_caps": true,
///   "kadi": { "enabled": true, "size_mm": 8.0, "weight_grams": 0.5 },
///   "gap_gold_allowance": null,
///   "gap_min_mm": 0.5,
///   "gap_max_mm": 1.5,
///   "cap_overlap_mm": null,
///   "match_priority": "length"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRequirements {
    // === Targets ===
    /// Finished length including the joint (inches)
    pub target_length_in: f64,
    pub length_priority: LengthPriority,
    pub target_weight_grams: f64,
    pub weight_priority: WeightPriority,

    // === Beads ===
    pub bead_count: BeadCountMode,
    pub materials: MaterialFilter,
    pub bead_size: BeadSizePreference,

    // === Gold ===
    pub include_mani: bool,
    pub mani_count: ManiCountMode,
    pub include_caps: bool,
    pub kadi: KadiSettings,

    /// Gold wire allowance added to gold weight only
    pub gap_gold_allowance: Option<GoldAllowance>,

    // === Spacing ===
    pub gap_min_mm: f64,
    pub gap_max_mm: f64,

    /// Overrides the session cap overlap when set
    pub cap_overlap_mm: Option<f64>,

    pub match_priority: MatchPriority,
}

impl Default for CustomerRequirements {
    fn default() -> Self {
        CustomerRequirements {
            target_length_in: 24.0,
            length_priority: LengthPriority::default(),
            target_weight_grams: 50.0,
            weight_priority: WeightPriority::default(),
            bead_count: BeadCountMode::default(),
            materials: MaterialFilter::default(),
            bead_size: BeadSizePreference::default(),
            include_mani: false,
            mani_count: ManiCountMode::default(),
            include_caps: true,
            kadi: KadiSettings::default(),
            gap_gold_allowance: None,
            gap_min_mm: 3.0,
            gap_max_mm: 3.0,
            cap_overlap_mm: None,
            match_priority: MatchPriority::default(),
        }
    }
}

impl CustomerRequirements {
    pub fn validate(&self) -> MalaResult<()> {
        ensure_non_negative("target_length_in", self.target_length_in)?;
        ensure_non_negative("target_weight_grams", self.target_weight_grams)?;
        ensure_non_negative("gap_min_mm", self.gap_min_mm)?;
        ensure_non_negative("gap_max_mm", self.gap_max_mm)?;
        if let Some(overlap) = self.cap_overlap_mm {
            ensure_non_negative("cap_overlap_mm", overlap)?;
        }
        if let Some(allowance) = &self.gap_gold_allowance {
            ensure_non_negative("gap_gold_allowance.min_grams", allowance.min_grams)?;
            ensure_non_negative("gap_gold_allowance.max_grams", allowance.max_grams)?;
        }
        if self.mani_count == ManiCountMode::Ratio(0) {
            return Err(MalaError::invalid_input(
                "mani_count",
                "ratio 0",
                "Mani ratio must be at least 1",
            ));
        }
        self.kadi.validate()
    }

    /// Target length of the beaded portion: total target minus the joint (mm)
    pub fn target_beaded_length_mm(&self) -> f64 {
        self.target_length_in * MM_PER_INCH - self.kadi.length_mm()
    }

    // === Builder methods ===

    pub fn with_target_length(mut self, inches: f64, priority: LengthPriority) -> Self {
        self.target_length_in = inches;
        self.length_priority = priority;
        self
    }

    pub fn with_target_weight(mut self, grams: f64, priority: WeightPriority) -> Self {
        self.target_weight_grams = grams;
        self.weight_priority = priority;
        self
    }

    pub fn with_bead_count(mut self, mode: BeadCountMode) -> Self {
        self.bead_count = mode;
        self
    }

    pub fn with_materials(mut self, materials: MaterialFilter) -> Self {
        self.materials = materials;
        self
    }

    pub fn with_bead_size(mut self, preference: BeadSizePreference) -> Self {
        self.bead_size = preference;
        self
    }

    /// Include mani counted by `mode`
    pub fn with_mani(mut self, mode: ManiCountMode) -> Self {
        self.include_mani = true;
        self.mani_count = mode;
        self
    }

    pub fn without_caps(mut self) -> Self {
        self.include_caps = false;
        self
    }

    pub fn with_kadi(mut self, kadi: KadiSettings) -> Self {
        self.kadi = kadi;
        self
    }

    pub fn with_gap_range(mut self, min_mm: f64, max_mm: f64) -> Self {
        self.gap_min_mm = min_mm;
        self.gap_max_mm = max_mm;
        self
    }

    pub fn with_gap_gold_allowance(mut self, allowance: GoldAllowance) -> Self {
        self.gap_gold_allowance = Some(allowance);
        self
    }

    pub fn with_match_priority(mut self, priority: MatchPriority) -> Self {
        self.match_priority = priority;
        self
    }
}

/// Where a combination's length comes from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LengthBreakdown {
    /// One set (or bare bead) (mm)
    pub set_length_mm: f64,
    pub sets_length_mm: f64,
    pub mani_length_mm: f64,
    pub gaps_length_mm: f64,
    pub kadi_length_mm: f64,
    pub total_gaps: u32,
}

/// One candidate mala.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    pub bead: Item,
    pub cap: Option<Item>,
    pub mani: Option<Item>,

    pub bead_count: u32,
    pub mani_count: u32,
    pub cap_count: u32,
    pub gap_mm: f64,

    /// Beaded portion plus the joint (mm)
    pub length_mm: f64,
    pub length_in: f64,
    /// Length that was matched against the target (mm)
    pub beaded_length_mm: f64,

    /// Beads + caps + mani + joint
    pub weight_grams: f64,
    /// Caps + mani + joint + wire allowance
    pub gold_weight_grams: f64,

    pub sets_per_inch: f64,

    /// Percentage deviation from the beaded target
    pub length_score: f64,
    /// Percentage deviation from the weight target (0 when weight is not important)
    pub weight_score: f64,
    /// Priority-weighted score; lower is better
    pub total_score: f64,

    pub breakdown: LengthBreakdown,
}

impl Combination {
    /// Identity of the candidate: bead, cap, mani, gap and bead count.
    pub fn key(&self) -> String {
        let cap = self.cap.as_ref().map_or_else(|| "nocap".to_string(), |c| c.id.to_string());
        let mani = self.mani.as_ref().map_or_else(|| "nomani".to_string(), |m| m.id.to_string());
        format!("{}-{}-{}-{}-{}", self.bead.id, cap, mani, self.gap_mm, self.bead_count)
    }

    /// Display match quality, 0–100
    pub fn match_percentage(&self) -> f64 {
        (100.0 - self.total_score).clamp(0.0, 100.0)
    }

    /// Build the pattern this combination describes.
    pub fn to_pattern(&self, kadi: KadiSettings) -> Pattern {
        let mut pattern = Pattern::new(format!("Mala Finder - {}", self.bead.display_name))
            .with_entry(self.bead.id, self.bead_count)
            .with_kadi(kadi);
        if let Some(mani) = &self.mani {
            pattern.add_entry(mani.id, self.mani_count);
        }
        if let Some(cap) = &self.cap {
            pattern = pattern.with_caps(cap.id);
        }
        pattern
    }
}

/// Overall result of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinderStatus {
    Found,
    /// Every candidate violated a hard length or weight limit
    NoCombinations,
    /// The catalog has no beads
    NoBeadsAvailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinderOutcome {
    pub status: FinderStatus,

    /// Best first, at most [`MAX_RESULTS`]
    pub combinations: Vec<Combination>,

    /// Candidates evaluated before the hard filters
    pub candidates_evaluated: usize,

    /// Candidates that passed the hard filters
    pub candidates_accepted: usize,
}

impl FinderOutcome {
    fn no_beads() -> Self {
        FinderOutcome {
            status: FinderStatus::NoBeadsAvailable,
            combinations: Vec::new(),
            candidates_evaluated: 0,
            candidates_accepted: 0,
        }
    }
}

/// Search the catalog for the combinations closest to the requirements.
///
/// Fails only for invalid requirements. An empty result is reported through
/// [`FinderOutcome::status`].
pub fn find_combinations(
    catalog: &Catalog,
    requirements: &CustomerRequirements,
    settings: &GapSettings,
) -> MalaResult<FinderOutcome> {
    requirements.validate()?;

    let beads = candidate_beads(catalog, requirements);
    if beads.is_empty() {
        warn!("No beads available for the combination search");
        return Ok(FinderOutcome::no_beads());
    }

    let gaps = gap_steps(requirements.gap_min_mm, requirements.gap_max_mm);
    let manis: Vec<Option<&Item>> = if requirements.include_mani && catalog.manis().next().is_some() {
        catalog.manis().map(Some).collect()
    } else {
        vec![None]
    };
    let target_mm = requirements.target_beaded_length_mm();
    let cap_overlap_mm = requirements.cap_overlap_mm.unwrap_or(settings.cap_overlap_mm);

    debug!(
        beads = beads.len(),
        manis = manis.len(),
        gaps = gaps.len(),
        target_mm,
        "Starting combination search"
    );

    let mut combinations = Vec::new();
    let mut candidates_evaluated = 0usize;

    for &bead in &beads {
        let Some(bead_spec) = bead.as_bead() else {
            continue;
        };
        for cap in candidate_caps(catalog, bead_spec.diameter_mm, requirements.include_caps) {
            let set_length_mm = match cap.and_then(Item::as_cap) {
                Some(cap_spec) => {
                    SetGeometry::resolve(bead_spec.diameter_mm, cap_spec.height_mm, cap_overlap_mm, settings)
                        .set_length_mm
                }
                None => bead_spec.diameter_mm,
            };
            let unit_includes_gap = cap.is_some()
                && settings.active_measured_set_length_mm().is_some()
                && settings.measured_set_includes_gap;

            for &mani in &manis {
                for &gap_mm in &gaps {
                    for bead_count in bead_counts(requirements.bead_count, target_mm, set_length_mm + gap_mm) {
                        candidates_evaluated += 1;
                        let candidate = Candidate {
                            bead,
                            cap,
                            mani,
                            gap_mm,
                            bead_count,
                            set_length_mm,
                            unit_includes_gap,
                        };
                        if let Some(combination) = candidate.evaluate(requirements, target_mm) {
                            combinations.push(combination);
                        }
                    }
                }
            }
        }
    }

    let candidates_accepted = combinations.len();
    combinations.sort_by(|a, b| a.total_score.total_cmp(&b.total_score));
    combinations.truncate(MAX_RESULTS);

    debug!(
        evaluated = candidates_evaluated,
        accepted = candidates_accepted,
        returned = combinations.len(),
        "Combination search finished"
    );

    let status = if combinations.is_empty() {
        FinderStatus::NoCombinations
    } else {
        FinderStatus::Found
    };

    Ok(FinderOutcome {
        status,
        combinations,
        candidates_evaluated,
        candidates_accepted,
    })
}

/// Turn a combination into a pattern and the gap settings to go with it.
///
/// The uniform gap is overwritten with the combination's gap; every other
/// setting is kept.
pub fn adopt(
    combination: &Combination,
    requirements: &CustomerRequirements,
    settings: &GapSettings,
) -> (Pattern, GapSettings) {
    let pattern = combination.to_pattern(requirements.kadi);
    let settings = settings.clone().with_uniform_gap(combination.gap_mm);
    (pattern, settings)
}

struct Candidate<'a> {
    bead: &'a Item,
    cap: Option<&'a Item>,
    mani: Option<&'a Item>,
    gap_mm: f64,
    bead_count: u32,
    set_length_mm: f64,
    unit_includes_gap: bool,
}

impl Candidate<'_> {
    fn evaluate(&self, requirements: &CustomerRequirements, target_mm: f64) -> Option<Combination> {
        let mani_count = match self.mani {
            Some(_) => requirements.mani_count.count_for(self.bead_count),
            None => 0,
        };
        let cap_count = if self.cap.is_some() { self.bead_count.saturating_mul(2) } else { 0 };

        let strand = StrandLayout {
            unit_count: self.bead_count,
            unit_length_mm: self.set_length_mm,
            mani_count,
            mani_length_mm: self
                .mani
                .map_or(0.0, |m| f64::from(mani_count) * m.length_contribution_mm()),
            gap_mm: self.gap_mm,
            unit_includes_gap: self.unit_includes_gap,
        }
        .measure();

        let kadi_length_mm = requirements.kadi.length_mm();
        let beaded_length_mm = strand.total_mm;
        let length_mm = beaded_length_mm + kadi_length_mm;

        let bead_weight = f64::from(self.bead_count) * self.bead.weight_grams;
        let cap_weight = self.cap.map_or(0.0, |c| f64::from(cap_count) * c.weight_grams);
        let mani_weight = self.mani.map_or(0.0, |m| f64::from(mani_count) * m.weight_grams);
        let kadi_weight = requirements.kadi.weight();
        let allowance = requirements.gap_gold_allowance.map_or(0.0, |a| a.average_grams());

        let weight_grams = bead_weight + cap_weight + mani_weight + kadi_weight;
        let gold_weight_grams = cap_weight + mani_weight + kadi_weight + allowance;

        if !requirements.length_priority.accepts(beaded_length_mm, target_mm)
            || !requirements
                .weight_priority
                .accepts(weight_grams, requirements.target_weight_grams)
        {
            return None;
        }

        let length_score = percent_deviation(beaded_length_mm, target_mm);
        let weight_score = match requirements.weight_priority {
            WeightPriority::NotImportant => 0.0,
            _ => percent_deviation(weight_grams, requirements.target_weight_grams),
        };

        Some(Combination {
            bead: self.bead.clone(),
            cap: self.cap.cloned(),
            mani: self.mani.cloned(),
            bead_count: self.bead_count,
            mani_count,
            cap_count,
            gap_mm: self.gap_mm,
            length_mm,
            length_in: mm_to_inches(length_mm),
            beaded_length_mm,
            weight_grams,
            gold_weight_grams,
            sets_per_inch: units_per_inch(self.set_length_mm, self.gap_mm),
            length_score,
            weight_score,
            total_score: requirements.match_priority.combine(length_score, weight_score),
            breakdown: LengthBreakdown {
                set_length_mm: self.set_length_mm,
                sets_length_mm: strand.units_length_mm,
                mani_length_mm: strand.mani_length_mm,
                gaps_length_mm: strand.gaps_length_mm,
                kadi_length_mm,
                total_gaps: strand.gap_count,
            },
        })
    }
}

/// |actual − target| / target × 100, 0 for a non-positive target
fn percent_deviation(actual: f64, target: f64) -> f64 {
    if target > 0.0 {
        (actual - target).abs() / target * 100.0
    } else {
        0.0
    }
}

fn candidate_beads<'a>(catalog: &'a Catalog, requirements: &CustomerRequirements) -> Vec<&'a Item> {
    let all: Vec<&Item> = catalog.beads().collect();
    let by_material: Vec<&Item> = all
        .iter()
        .copied()
        .filter(|b| b.as_bead().is_some_and(|s| requirements.materials.matches(&s.material)))
        .collect();

    let by_size: Vec<&Item> = by_material
        .iter()
        .copied()
        .filter(|b| b.as_bead().is_some_and(|s| requirements.bead_size.matches(s.diameter_mm)))
        .collect();

    let beads = if by_size.is_empty() {
        if requirements.bead_size != BeadSizePreference::Any && !by_material.is_empty() {
            warn!("No beads match the size preference, ignoring it");
        }
        by_material
    } else {
        by_size
    };

    if beads.is_empty() && !all.is_empty() {
        warn!("No beads match the material filter, using every bead");
        return all;
    }
    beads
}

/// Caps to try with a bead; `[None]` when caps are off or the catalog has none.
fn candidate_caps(catalog: &Catalog, bead_diameter_mm: f64, include_caps: bool) -> Vec<Option<&Item>> {
    if !include_caps {
        return vec![None];
    }
    let outer = |c: &Item| c.as_cap().map_or(f64::INFINITY, |s| s.outer_diameter_mm);

    let fitting: Vec<Option<&Item>> = catalog
        .caps()
        .filter(|&c| outer(c) <= bead_diameter_mm + CAP_WIDTH_ALLOWANCE_MM)
        .map(Some)
        .collect();
    if !fitting.is_empty() {
        return fitting;
    }

    // First of the narrowest caps
    let smallest = catalog.caps().fold(None::<&Item>, |best, c| match best {
        Some(b) if outer(b) <= outer(c) => Some(b),
        _ => Some(c),
    });
    vec![smallest]
}

/// Gap values from `min_mm` to `max_mm` in 0.5mm steps, `[min_mm]` for an empty range.
fn gap_steps(min_mm: f64, max_mm: f64) -> Vec<f64> {
    if max_mm < min_mm {
        return vec![min_mm];
    }
    let steps = ((max_mm - min_mm) / GAP_STEP_MM + 1e-9).floor() as u32;
    (0..=steps).map(|i| min_mm + f64::from(i) * GAP_STEP_MM).collect()
}

/// Bead counts to try for one unit length.
fn bead_counts(mode: BeadCountMode, target_mm: f64, unit_length_mm: f64) -> Vec<u32> {
    match mode {
        BeadCountMode::Fixed(count) => vec![count],
        BeadCountMode::Auto => {
            let estimate = if unit_length_mm > 0.0 {
                (target_mm / unit_length_mm).round() as i64
            } else {
                0
            };
            let low = (estimate - ESTIMATE_SPREAD).max(MIN_ESTIMATED_BEAD_COUNT);
            let high = estimate.saturating_add(ESTIMATE_SPREAD);

            let mut counts: Vec<u32> = (low..=high).filter_map(|c| u32::try_from(c).ok()).collect();
            for reference in REFERENCE_BEAD_COUNTS {
                if !counts.contains(&reference) {
                    counts.push(reference);
                }
            }
            counts
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::calculator::calculate;
    use crate::settings::GoldRates;

    fn search(catalog: &Catalog, requirements: &CustomerRequirements) -> FinderOutcome {
        find_combinations(catalog, requirements, &GapSettings::default()).unwrap()
    }

    #[test]
    fn test_no_beads_reports_status() {
        let outcome = search(&Catalog::new(), &CustomerRequirements::default());
        assert_eq!(outcome.status, FinderStatus::NoBeadsAvailable);
        assert!(outcome.combinations.is_empty());

        let mut catalog = Catalog::with_defaults();
        let beads: Vec<_> = catalog.beads().map(|b| b.id).collect();
        for id in beads {
            catalog.remove(id).unwrap();
        }
        let outcome = search(&catalog, &CustomerRequirements::default());
        assert_eq!(outcome.status, FinderStatus::NoBeadsAvailable);
    }

    #[test]
    fn test_out_of_range_bead_still_found() {
        let bead = Item::bead("Lotus 20mm", 20.0, 2.0, 2.0, "Lotus");
        let catalog = Catalog::from_items([bead.clone()]).unwrap();
        let requirements = CustomerRequirements::default()
            .with_materials(MaterialFilter::Only(vec!["Tulsi".to_string()]))
            .with_bead_size(BeadSizePreference::Range { min_mm: 4.0, max_mm: 8.0 });

        let outcome = search(&catalog, &requirements);
        assert_eq!(outcome.status, FinderStatus::Found);
        assert!(!outcome.combinations.is_empty());
        assert!(outcome.combinations.iter().all(|c| c.bead.id == bead.id));
    }

    #[test]
    fn test_ranking_is_ascending() {
        let catalog = Catalog::with_defaults();
        let requirements = CustomerRequirements::default().with_gap_range(0.5, 2.0);
        let outcome = search(&catalog, &requirements);

        assert_eq!(outcome.combinations.len(), MAX_RESULTS);
        assert!(outcome.candidates_accepted >= MAX_RESULTS);
        for pair in outcome.combinations.windows(2) {
            assert!(pair[0].total_score <= pair[1].total_score);
            // Weight does not score, so length alone decides
            assert!(pair[0].length_score <= pair[1].length_score);
        }
    }

    #[test]
    fn test_kadi_subtracted_from_target() {
        let catalog = Catalog::with_defaults();
        let requirements = CustomerRequirements::default().with_kadi(KadiSettings::enabled(8.0, 0.5));
        let target = 24.0 * 25.4 - 8.0;
        assert!((requirements.target_beaded_length_mm() - target).abs() < 1e-9);

        let outcome = search(&catalog, &requirements);
        assert!(!outcome.combinations.is_empty());
        for c in &outcome.combinations {
            assert!((c.length_mm - c.beaded_length_mm - 8.0).abs() < 1e-9);
            let expected = (c.beaded_length_mm - target).abs() / target * 100.0;
            assert!((c.length_score - expected).abs() < 1e-9);
            assert!(c.weight_grams >= 0.5);
        }
    }

    #[test]
    fn test_hard_length_filters() {
        let catalog = Catalog::with_defaults();
        let target = 24.0 * 25.4;

        let exact = CustomerRequirements::default()
            .with_target_length(24.0, LengthPriority::Exact)
            .with_gap_range(0.5, 3.0);
        for c in search(&catalog, &exact).combinations {
            assert!((c.beaded_length_mm - target).abs() <= 5.0);
        }

        let minimum = CustomerRequirements::default().with_target_length(24.0, LengthPriority::Minimum);
        let outcome = search(&catalog, &minimum);
        assert!(!outcome.combinations.is_empty());
        for c in outcome.combinations {
            assert!(c.beaded_length_mm >= target);
        }
    }

    #[test]
    fn test_approximate_length_within_an_inch() {
        let catalog = Catalog::with_defaults();
        let target = 24.0 * 25.4;

        let requirements = CustomerRequirements::default()
            .with_target_length(24.0, LengthPriority::Approximate)
            .with_gap_range(0.5, 3.0);
        let outcome = search(&catalog, &requirements);
        assert_eq!(outcome.status, FinderStatus::Found);
        for c in &outcome.combinations {
            assert!((c.beaded_length_mm - target).abs() <= APPROXIMATE_LENGTH_TOLERANCE_MM);
        }
        assert!(outcome.candidates_accepted < outcome.candidates_evaluated);

        // Five beads cannot come within an inch of 24in
        let too_few = requirements.with_bead_count(BeadCountMode::Fixed(5));
        let outcome = search(&catalog, &too_few);
        assert_eq!(outcome.status, FinderStatus::NoCombinations);
        assert!(outcome.combinations.is_empty());
        assert!(outcome.candidates_evaluated > 0);
    }

    #[test]
    fn test_hard_weight_filters() {
        let catalog = Catalog::with_defaults();
        let max = CustomerRequirements::default().with_target_weight(40.0, WeightPriority::Max);
        let outcome = search(&catalog, &max);
        assert!(!outcome.combinations.is_empty());
        assert!(outcome.combinations.iter().all(|c| c.weight_grams <= 40.0));
        assert!(outcome.combinations.iter().all(|c| c.weight_score > 0.0 || c.weight_grams == 40.0));

        let impossible = CustomerRequirements::default()
            .with_bead_count(BeadCountMode::Fixed(27))
            .with_target_weight(1000.0, WeightPriority::Exact);
        let outcome = search(&catalog, &impossible);
        assert_eq!(outcome.status, FinderStatus::NoCombinations);
        assert!(outcome.combinations.is_empty());
        assert!(outcome.candidates_evaluated > 0);
    }

    #[test]
    fn test_fixed_count_and_mani_modes() {
        let catalog = Catalog::with_defaults();
        let requirements = CustomerRequirements::default()
            .with_target_length(40.0, LengthPriority::Minimum)
            .with_bead_count(BeadCountMode::Fixed(108))
            .with_mani(ManiCountMode::Auto);
        let outcome = search(&catalog, &requirements);
        assert!(!outcome.combinations.is_empty());
        for c in &outcome.combinations {
            assert_eq!(c.bead_count, 108);
            assert_eq!(c.mani_count, 107);
            assert_eq!(c.cap_count, 216);
            assert!(c.mani.is_some());
        }

        assert_eq!(ManiCountMode::Ratio(2).count_for(54), 27);
        assert_eq!(ManiCountMode::Ratio(4).count_for(27), 6);
        assert_eq!(ManiCountMode::Custom(53).count_for(108), 53);
        assert_eq!(ManiCountMode::Auto.count_for(0), 0);
    }

    #[test]
    fn test_zero_mani_ratio_rejected() {
        let requirements = CustomerRequirements::default().with_mani(ManiCountMode::Ratio(0));
        let err = find_combinations(&Catalog::with_defaults(), &requirements, &GapSettings::default());
        assert!(matches!(err, Err(MalaError::InvalidInput { .. })));
    }

    #[test]
    fn test_cap_candidates() {
        let catalog = Catalog::with_defaults();

        // 6mm bead fits only the 5.2mm cap
        let caps = candidate_caps(&catalog, 6.0, true);
        assert_eq!(caps.len(), 1);
        assert_eq!(caps[0].unwrap().display_name, "Cap 5.2mm");

        // 10mm bead fits both
        assert_eq!(candidate_caps(&catalog, 10.0, true).len(), 2);

        // 3mm bead fits none, falls back to the smallest
        let caps = candidate_caps(&catalog, 3.0, true);
        assert_eq!(caps.len(), 1);
        assert_eq!(caps[0].unwrap().display_name, "Cap 5.2mm");

        assert_eq!(candidate_caps(&catalog, 8.0, false), vec![None]);
        assert_eq!(candidate_caps(&Catalog::new(), 8.0, true), vec![None]);
    }

    #[test]
    fn test_gap_steps() {
        assert_eq!(gap_steps(3.0, 3.0), vec![3.0]);
        assert_eq!(gap_steps(2.0, 4.0), vec![2.0, 2.5, 3.0, 3.5, 4.0]);
        assert_eq!(gap_steps(0.5, 1.2), vec![0.5, 1.0]);
        assert_eq!(gap_steps(4.0, 2.0), vec![4.0]);
    }

    #[test]
    fn test_bead_counts_union_reference_sizes() {
        assert_eq!(bead_counts(BeadCountMode::Fixed(54), 600.0, 10.0), vec![54]);

        // 609.6 / 23 rounds to 27
        let counts = bead_counts(BeadCountMode::Auto, 609.6, 23.0);
        assert_eq!(counts.len(), 21 + 3);
        assert_eq!(counts[0], 17);
        assert!(counts.contains(&37));
        for reference in REFERENCE_BEAD_COUNTS {
            assert_eq!(counts.iter().filter(|&&c| c == reference).count(), 1);
        }

        let small = bead_counts(BeadCountMode::Auto, 10.0, 23.0);
        assert_eq!(small[..6], [5, 6, 7, 8, 9, 10]);
        assert_eq!(small.len(), 6 + 5);
    }

    #[test]
    fn test_material_and_size_filters() {
        let mut catalog = Catalog::with_defaults();
        catalog.add(Item::bead("Tulsi 6mm", 6.0, 1.5, 0.3, "Tulsi")).unwrap();
        catalog.add(Item::bead("Mystery 7mm", 7.0, 1.5, 0.4, "")).unwrap();

        let tulsi = CustomerRequirements::default().with_materials(MaterialFilter::Only(vec!["Tulsi".to_string()]));
        let beads = candidate_beads(&catalog, &tulsi);
        assert_eq!(beads.len(), 1);
        assert_eq!(beads[0].display_name, "Tulsi 6mm");

        let other = CustomerRequirements::default().with_materials(MaterialFilter::Only(vec!["Other".to_string()]));
        assert_eq!(candidate_beads(&catalog, &other)[0].display_name, "Mystery 7mm");

        let exact = CustomerRequirements::default().with_bead_size(BeadSizePreference::Exact { diameter_mm: 9.0 });
        let sizes: Vec<f64> = candidate_beads(&catalog, &exact)
            .iter()
            .filter_map(|b| b.as_bead().map(|s| s.diameter_mm))
            .collect();
        assert_eq!(sizes, vec![8.0, 10.0]);
    }

    #[test]
    fn test_gold_allowance_counts_toward_gold_only() {
        let catalog = Catalog::with_defaults();
        let requirements = CustomerRequirements::default()
            .with_bead_count(BeadCountMode::Fixed(54))
            .with_target_length(24.0, LengthPriority::Minimum)
            .with_gap_gold_allowance(GoldAllowance::default());
        let outcome = search(&catalog, &requirements);
        assert!(!outcome.combinations.is_empty());
        for c in &outcome.combinations {
            let cap = c.cap.as_ref().map_or(0.0, |cap| f64::from(c.cap_count) * cap.weight_grams);
            assert!((c.gold_weight_grams - cap - 4.0).abs() < 1e-9);
            let beads = 54.0 * c.bead.weight_grams;
            assert!((c.weight_grams - beads - cap).abs() < 1e-9);
        }
    }

    #[test]
    fn test_scores_and_combination_helpers() {
        assert_eq!(MatchPriority::Length.combine(2.0, 4.0), 6.0);
        assert_eq!(MatchPriority::Weight.combine(2.0, 4.0), 9.0);
        assert_eq!(MatchPriority::Balanced.combine(2.0, 4.0), 6.0);
        assert_eq!(percent_deviation(110.0, 100.0), 10.0);
        assert_eq!(percent_deviation(5.0, 0.0), 0.0);

        let outcome = search(&Catalog::with_defaults(), &CustomerRequirements::default());
        let best = &outcome.combinations[0];
        assert!(best.match_percentage() <= 100.0 && best.match_percentage() >= 0.0);
        assert!(best.key().contains(&best.bead.id.to_string()));

        let mut keys: Vec<String> = outcome.combinations.iter().map(Combination::key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), outcome.combinations.len());
    }

    #[test]
    fn test_adopted_pattern_reproduces_combination() {
        let catalog = Catalog::with_defaults();
        let settings = GapSettings::default();
        let requirements = CustomerRequirements::default()
            .with_mani(ManiCountMode::Ratio(2))
            .with_kadi(KadiSettings::enabled(8.0, 0.5))
            .with_gap_range(0.5, 1.5);
        let outcome = find_combinations(&catalog, &requirements, &settings).unwrap();
        let combination = &outcome.combinations[0];

        let (pattern, adopted) = adopt(combination, &requirements, &settings);
        assert_eq!(pattern.name, format!("Mala Finder - {}", combination.bead.display_name));
        assert_eq!(pattern.repeat_count, 1);
        assert_eq!(pattern.entries[0].count, combination.bead_count);
        assert_eq!(adopted.uniform_gap_mm, combination.gap_mm);
        assert_eq!(adopted.cap_overlap_mm, settings.cap_overlap_mm);
        assert!(pattern.kadi.enabled);

        let result = calculate(&pattern, &catalog, &adopted, &GoldRates::default()).unwrap();
        assert!((result.total_length_mm - combination.length_mm).abs() < 1e-6);
        assert!((result.total_weight_grams - combination.weight_grams).abs() < 1e-6);
        assert!((result.gold_weight_grams - combination.gold_weight_grams).abs() < 1e-6);
        assert_eq!(result.cap_count, combination.cap_count);
    }

    #[test]
    fn test_measured_set_length_applies_with_caps() {
        let catalog = Catalog::with_defaults();
        let settings = GapSettings::default().with_measured_set_length(15.0, false);
        let requirements = CustomerRequirements::default();
        let outcome = find_combinations(&catalog, &requirements, &settings).unwrap();
        assert!(outcome
            .combinations
            .iter()
            .all(|c| c.cap.is_some() && c.breakdown.set_length_mm == 15.0));

        let no_caps = requirements.without_caps();
        let outcome = find_combinations(&catalog, &no_caps, &settings).unwrap();
        for c in &outcome.combinations {
            assert_eq!(c.breakdown.set_length_mm, c.bead.as_bead().unwrap().diameter_mm);
        }
    }

    #[test]
    fn test_requirements_json_roundtrip() {
        let requirements = CustomerRequirements::default()
            .with_mani(ManiCountMode::Ratio(2))
            .with_bead_size(BeadSizePreference::Range { min_mm: 6.0, max_mm: 10.0 });
        let json = serde_json::to_string(&requirements).unwrap();
        assert!(json.contains("\"approximate\""));
        let back: CustomerRequirements = serde_json::from_str(&json).unwrap();
        assert_eq!(back, requirements);
    }
}

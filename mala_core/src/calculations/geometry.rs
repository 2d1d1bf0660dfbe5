//! Set and strand geometry shared by the calculator and the finder.
//!
//! A *set* is one cap-bead-cap triple. Its length is either derived from the
//! components or taken from a physical measurement. A *strand* is a run of
//! units (sets, or bare beads) and mani separated by a uniform gap.

use serde::{Deserialize, Serialize};

use crate::settings::GapSettings;
use crate::units::{ratio_or_zero, MM_PER_INCH};

/// Cap height that shows outside the bead: `max(0, height − overlap)`.
pub fn effective_cap_height_mm(cap_height_mm: f64, cap_overlap_mm: f64) -> f64 {
    (cap_height_mm - cap_overlap_mm).max(0.0)
}

/// Component-derived set length: cap + gap + bead + gap + cap.
pub fn component_set_length_mm(bead_diameter_mm: f64, effective_cap_height_mm: f64, cap_bead_gap_mm: f64) -> f64 {
    2.0 * effective_cap_height_mm + 2.0 * cap_bead_gap_mm + bead_diameter_mm
}

/// How many units of `unit_length_mm + gap_mm` fit in one inch (0 for a zero unit).
pub fn units_per_inch(unit_length_mm: f64, gap_mm: f64) -> f64 {
    ratio_or_zero(MM_PER_INCH, unit_length_mm + gap_mm)
}

/// Resolved geometry of one cap-bead-cap set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetGeometry {
    /// Cap height after overlap (mm)
    pub effective_cap_height_mm: f64,

    /// Length derived from the components (mm)
    pub component_length_mm: f64,

    /// Length in force: the measured value when the measured method is active,
    /// otherwise the component length (mm)
    pub set_length_mm: f64,

    /// Whether `set_length_mm` came from a measurement
    pub measured: bool,
}

impl SetGeometry {
    /// Resolve set geometry for a bead and cap under the given settings.
    ///
    /// `cap_overlap_mm` is passed separately so callers can override the
    /// session overlap.
    pub fn resolve(bead_diameter_mm: f64, cap_height_mm: f64, cap_overlap_mm: f64, settings: &GapSettings) -> Self {
        let effective_cap_height_mm = effective_cap_height_mm(cap_height_mm, cap_overlap_mm);
        let component_length_mm =
            component_set_length_mm(bead_diameter_mm, effective_cap_height_mm, settings.cap_bead_gap_mm);
        let measured = settings.active_measured_set_length_mm();

        SetGeometry {
            effective_cap_height_mm,
            component_length_mm,
            set_length_mm: measured.unwrap_or(component_length_mm),
            measured: measured.is_some(),
        }
    }
}

/// A strand reduced to its length-relevant counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrandLayout {
    /// Number of units (sets, or beads when there are no caps)
    pub unit_count: u32,

    /// Length of one unit (mm)
    pub unit_length_mm: f64,

    /// Number of mani pieces
    pub mani_count: u32,

    /// Combined length of all mani (mm)
    pub mani_length_mm: f64,

    /// Gap between adjacent units/mani (mm)
    pub gap_mm: f64,

    /// Whether each unit length already includes its trailing gap
    pub unit_includes_gap: bool,
}

/// Length breakdown of a strand, excluding the joint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StrandLength {
    pub units_length_mm: f64,
    pub mani_length_mm: f64,
    pub gap_count: u32,
    pub gaps_length_mm: f64,
    pub total_mm: f64,
}

impl StrandLayout {
    /// Sum the strand: units + mani + gaps.
    ///
    /// Gaps fall between adjacent pieces, never at the ends. When units carry
    /// their own gap, only the mani add one each.
    pub fn measure(&self) -> StrandLength {
        let gap_count = if self.unit_includes_gap {
            self.mani_count
        } else {
            (self.unit_count + self.mani_count).saturating_sub(1)
        };
        let units_length_mm = f64::from(self.unit_count) * self.unit_length_mm;
        let gaps_length_mm = f64::from(gap_count) * self.gap_mm;
        StrandLength {
            units_length_mm,
            mani_length_mm: self.mani_length_mm,
            gap_count,
            gaps_length_mm,
            total_mm: units_length_mm + self.mani_length_mm + gaps_length_mm,
        }
    }
}

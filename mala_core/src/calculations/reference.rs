//! Set reference measurement.
//!
//! Lay a number of finished sets side by side, measure them, and derive the
//! per-set length (gap included) from the sample. The result can be used as
//! the measured set length of the session.
//!
//! ```rust
//! use mala_core::calculations::reference::{ReferenceLength, SetReference};
//!
//! let sample = SetReference::new(10, ReferenceLength::Inches(5.0));
//! let measurement = sample.measure().unwrap();
//! assert!((measurement.set_length_with_gap_mm - 12.7).abs() < 1e-9);
//! assert!((measurement.sets_per_inch - 2.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

use crate::settings::GapSettings;
use crate::units::{inches_to_mm, mm_to_inches, ratio_or_zero, MM_PER_INCH};

/// Target set counts offered for projection
pub const TARGET_SET_PRESETS: [u32; 3] = [27, 54, 108];

/// Measured length of a sample, in the unit it was measured in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceLength {
    Inches(f64),
    Millimeters(f64),
}

impl ReferenceLength {
    pub fn to_mm(self) -> f64 {
        match self {
            ReferenceLength::Inches(inches) => inches_to_mm(inches),
            ReferenceLength::Millimeters(mm) => mm,
        }
    }
}

/// A physical sample of consecutive sets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetReference {
    pub sample_set_count: u32,
    pub sample_length: ReferenceLength,
}

impl Default for SetReference {
    fn default() -> Self {
        SetReference {
            sample_set_count: 10,
            sample_length: ReferenceLength::Inches(1.0),
        }
    }
}

/// What a sample says about one set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMeasurement {
    /// Length of one set including its gap (mm)
    pub set_length_with_gap_mm: f64,
    pub sets_per_inch: f64,
}

/// Projected length of a number of sets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedLength {
    pub set_count: u32,
    pub length_mm: f64,
    pub length_in: f64,
}

impl SetReference {
    pub fn new(sample_set_count: u32, sample_length: ReferenceLength) -> Self {
        SetReference {
            sample_set_count,
            sample_length,
        }
    }

    /// Per-set length and density. `None` without sets or without a positive length.
    pub fn measure(&self) -> Option<ReferenceMeasurement> {
        let length_mm = self.sample_length.to_mm();
        if self.sample_set_count == 0 || !length_mm.is_finite() || length_mm <= 0.0 {
            return None;
        }
        let set_length_with_gap_mm = length_mm / f64::from(self.sample_set_count);
        Some(ReferenceMeasurement {
            set_length_with_gap_mm,
            sets_per_inch: ratio_or_zero(MM_PER_INCH, set_length_with_gap_mm),
        })
    }

    /// Length of `set_count` sets strung like the sample.
    pub fn length_for_sets(&self, set_count: u32) -> Option<ProjectedLength> {
        let measurement = self.measure()?;
        let length_mm = f64::from(set_count) * measurement.set_length_with_gap_mm;
        Some(ProjectedLength {
            set_count,
            length_mm,
            length_in: mm_to_inches(length_mm),
        })
    }

    /// Projections for each of [`TARGET_SET_PRESETS`]; empty for an invalid sample.
    pub fn preset_projections(&self) -> Vec<ProjectedLength> {
        TARGET_SET_PRESETS
            .iter()
            .filter_map(|&count| self.length_for_sets(count))
            .collect()
    }

    /// Use the sample as the measured set length. The sample already includes the gaps.
    pub fn apply_to(&self, settings: &GapSettings) -> Option<GapSettings> {
        let measurement = self.measure()?;
        Some(
            settings
                .clone()
                .with_measured_set_length(measurement.set_length_with_gap_mm, true),
        )
    }
}

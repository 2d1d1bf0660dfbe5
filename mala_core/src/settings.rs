//! # Session Settings
//!
//! Global geometry and pricing settings. These are replaced wholesale on edit,
//! never patched field-by-field from outside.
//!
//! ```text
//! GapSettings   uniform gap, cap-bead gap, cap overlap, thread, set-length method
//! GoldRates     currency per gram of gold
//! KadiSettings  the single optional joint (enabled, size, weight)
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{ensure_non_negative, MalaResult};

/// How the length of one cap-bead-cap set is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetLengthMethod {
    /// 2×(cap height − overlap) + 2×cap-bead gap + bead diameter
    #[default]
    Components,
    /// A directly measured physical set length
    Measured,
}

/// Geometry settings shared by every calculation in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapSettings {
    /// Gap between adjacent pieces other than cap/bead joints (mm)
    pub uniform_gap_mm: f64,

    /// Gap between a cap and the bead it sits on (mm, normally 0)
    pub cap_bead_gap_mm: f64,

    /// Depth the cap fits into the bead hole (mm); reduces effective cap height
    pub cap_overlap_mm: f64,

    /// Thread/wire thickness (mm), informational
    pub thread_thickness_mm: f64,

    /// Total thread/wire weight (g), added to total weight only
    pub thread_weight_grams: f64,

    /// Which set-length method applies
    pub set_length_method: SetLengthMethod,

    /// Physically measured set length (mm), used by [`SetLengthMethod::Measured`]
    pub measured_set_length_mm: f64,

    /// Whether the measured length already includes the gap to the next piece
    pub measured_set_includes_gap: bool,
}

impl Default for GapSettings {
    fn default() -> Self {
        GapSettings {
            uniform_gap_mm: 0.5,
            cap_bead_gap_mm: 0.0,
            cap_overlap_mm: 0.0,
            thread_thickness_mm: 0.8,
            thread_weight_grams: 0.0,
            set_length_method: SetLengthMethod::Components,
            measured_set_length_mm: 6.25,
            measured_set_includes_gap: false,
        }
    }
}

impl GapSettings {
    /// Validate that every length and weight is non-negative.
    pub fn validate(&self) -> MalaResult<()> {
        ensure_non_negative("uniform_gap_mm", self.uniform_gap_mm)?;
        ensure_non_negative("cap_bead_gap_mm", self.cap_bead_gap_mm)?;
        ensure_non_negative("cap_overlap_mm", self.cap_overlap_mm)?;
        ensure_non_negative("thread_thickness_mm", self.thread_thickness_mm)?;
        ensure_non_negative("thread_weight_grams", self.thread_weight_grams)?;
        ensure_non_negative("measured_set_length_mm", self.measured_set_length_mm)?;
        Ok(())
    }

    /// The measured set length, if the measured method is active and the value is usable.
    pub fn active_measured_set_length_mm(&self) -> Option<f64> {
        match self.set_length_method {
            SetLengthMethod::Measured if self.measured_set_length_mm > 0.0 => Some(self.measured_set_length_mm),
            _ => None,
        }
    }

    /// Return a copy with a different uniform gap (builder pattern)
    pub fn with_uniform_gap(mut self, gap_mm: f64) -> Self {
        self.uniform_gap_mm = gap_mm;
        self
    }

    /// Return a copy using a measured set length (builder pattern)
    pub fn with_measured_set_length(mut self, length_mm: f64, includes_gap: bool) -> Self {
        self.set_length_method = SetLengthMethod::Measured;
        self.measured_set_length_mm = length_mm;
        self.measured_set_includes_gap = includes_gap;
        self
    }
}

/// Gold pricing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoldRates {
    /// Currency units per gram
    pub rate: f64,
}

impl Default for GoldRates {
    fn default() -> Self {
        GoldRates { rate: 6600.0 }
    }
}

impl GoldRates {
    pub fn validate(&self) -> MalaResult<()> {
        ensure_non_negative("rate", self.rate)
    }
}

/// The single joint (kadi) of a mala. Added once, outside the repeated sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KadiSettings {
    pub enabled: bool,
    /// Length added to the mala (mm)
    pub size_mm: f64,
    pub weight_grams: f64,
}

impl Default for KadiSettings {
    fn default() -> Self {
        KadiSettings {
            enabled: false,
            size_mm: 8.0,
            weight_grams: 0.5,
        }
    }
}

impl KadiSettings {
    /// An enabled joint with the given size and weight
    pub fn enabled(size_mm: f64, weight_grams: f64) -> Self {
        KadiSettings {
            enabled: true,
            size_mm,
            weight_grams,
        }
    }

    pub fn validate(&self) -> MalaResult<()> {
        ensure_non_negative("kadi.size_mm", self.size_mm)?;
        ensure_non_negative("kadi.weight_grams", self.weight_grams)
    }

    /// Length contributed to the mala (0 when disabled)
    pub fn length_mm(&self) -> f64 {
        if self.enabled {
            self.size_mm
        } else {
            0.0
        }
    }

    /// Weight contributed to the mala (0 when disabled)
    pub fn weight(&self) -> f64 {
        if self.enabled {
            self.weight_grams
        } else {
            0.0
        }
    }
}

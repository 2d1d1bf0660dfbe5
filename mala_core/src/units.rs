//! # Unit Types
//!
//! Lightweight newtype wrappers for the units a mala is measured in, plus the
//! wire gauge lookup used for mani and cap wire.
//!
//! - Length: millimeters (mm) for geometry, inches (in) for customer-facing targets
//! - Wire: American Wire Gauge (AWG), mapped to mm
//!
//! ## Example
//!
//! ```rust
//! use mala_core::units::{Inches, Millimeters};
//!
//! let strand = Millimeters(609.6);
//! let inches: Inches = strand.into();
//! assert!((inches.0 - 24.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// Millimeters per inch (exact)
pub const MM_PER_INCH: f64 = 25.4;

// ============================================================================
// Length Units
// ============================================================================

/// Length in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

/// Length in inches
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inches(pub f64);

impl From<Millimeters> for Inches {
    fn from(mm: Millimeters) -> Self {
        Inches(mm.0 / MM_PER_INCH)
    }
}

impl From<Inches> for Millimeters {
    fn from(inches: Inches) -> Self {
        Millimeters(inches.0 * MM_PER_INCH)
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Millimeters);
impl_arithmetic!(Inches);

/// Convert millimeters to inches.
pub fn mm_to_inches(mm: f64) -> f64 {
    Inches::from(Millimeters(mm)).0
}

/// Convert inches to millimeters.
pub fn inches_to_mm(inches: f64) -> f64 {
    Millimeters::from(Inches(inches)).0
}

// ============================================================================
// Wire Gauge
// ============================================================================

/// Wire diameter in mm for an AWG gauge, `None` for gauges outside the table.
pub fn wire_gauge_mm(awg: u8) -> Option<f64> {
    let mm = match awg {
        10 => 2.588,
        12 => 2.053,
        14 => 1.628,
        16 => 1.291,
        18 => 1.024,
        20 => 0.812,
        22 => 0.644,
        24 => 0.511,
        26 => 0.405,
        28 => 0.321,
        30 => 0.255,
        _ => return None,
    };
    Some(mm)
}

/// Divide, returning 0 when the denominator is zero or the result is not finite.
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_to_inches() {
        let mm = Millimeters(254.0);
        let inches: Inches = mm.into();
        assert!((inches.0 - 10.0).abs() < 1e-12);
        assert!((inches_to_mm(24.0) - 609.6).abs() < 1e-9);
    }

    #[test]
    fn test_arithmetic() {
        let a = Millimeters(1.5);
        let b = Millimeters(0.5);
        assert_eq!((a + b).0, 2.0);
        assert_eq!((a - b).0, 1.0);
        assert_eq!((a * 2.0).0, 3.0);
        assert_eq!((a / 3.0).0, 0.5);
    }

    #[test]
    fn test_wire_gauge_table() {
        assert_eq!(wire_gauge_mm(24), Some(0.511));
        assert_eq!(wire_gauge_mm(26), Some(0.405));
        assert_eq!(wire_gauge_mm(25), None);
        assert!((10..=30).step_by(2).all(|g| wire_gauge_mm(g).is_some()));
    }

    #[test]
    fn test_ratio_or_zero() {
        assert_eq!(ratio_or_zero(5.0, 0.0), 0.0);
        assert_eq!(ratio_or_zero(5.0, 2.0), 2.5);
    }

    #[test]
    fn test_serialization() {
        let mm = Millimeters(14.92);
        let json = serde_json::to_string(&mm).unwrap();
        assert_eq!(json, "14.92");
    }
}

//! # Mala Calculations
//!
//! Pure functions over a catalog, a pattern and the session settings. Nothing
//! here holds state; the [`Session`](crate::session::Session) decides when to
//! call them.
//!
//! ## Pipeline
//!
//! ```text
//! Pattern ──expand──▶ [ExpandedItem] ──calculate_expanded──▶ CalculationResult
//!
//! CustomerRequirements ──find_combinations──▶ FinderOutcome ──adopt──▶ Pattern
//! ```
//!
//! ## Modules
//!
//! - [`geometry`] - Set and strand length helpers shared by calculator and finder
//! - [`expand`] - The cap rewrite rule
//! - [`calculator`] - Length, weight and gold totals
//! - [`finder`] - Combination search and adoption
//! - [`reference`] - Set length from a measured sample

pub mod calculator;
pub mod expand;
pub mod finder;
pub mod geometry;
pub mod reference;

// Re-export commonly used types
pub use calculator::{calculate, calculate_expanded, BreakdownKey, BreakdownLine, CalculationResult};
pub use expand::{expand, CapSide, ExpandedItem};
pub use finder::{adopt, find_combinations, Combination, CustomerRequirements, FinderOutcome, FinderStatus};
pub use geometry::{SetGeometry, StrandLayout, StrandLength};
pub use reference::{ReferenceLength, ReferenceMeasurement, SetReference};

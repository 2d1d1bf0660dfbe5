//! # mala_core - Mala Design Calculation Engine
//!
//! `mala_core` computes the physical length, weight and gold content of a
//! mala (prayer-bead string) from a compact pattern, and searches a catalog
//! for the bead/cap/mani combinations that best hit a customer's target.
//! All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Pure**: Calculations take the catalog and settings as arguments
//! - **Absent, not zero**: An empty pattern yields `None`, never a zeroed result
//! - **Id-keyed**: Items are referenced and aggregated by id, never by name
//! - **JSON-First**: All types implement Serialize/Deserialize
//!
//! ## Quick Start
//!
//! ```rust
//! use mala_core::{calculate, Catalog, GapSettings, GoldRates, Pattern};
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
//! let result = calculate(&pattern, &catalog, &GapSettings::default(), &GoldRates::default()).unwrap();
//! println!(
//!     "{:.2}in, {:.2}g ({:.2}g gold)",
//!     result.total_length_in, result.total_weight_grams, result.gold_weight_grams
//! );
//! assert_eq!(result.cap_count, 108);
//! ```
//!
//! ## Modules
//!
//! - [`items`] - Bead, mani, cap and kadi items
//! - [`catalog`] - The ordered item catalog
//! - [`pattern`] - Patterns, editing operations and presets
//! - [`settings`] - Gap settings, gold rates, joint settings
//! - [`calculations`] - Expansion, calculation, combination search
//! - [`session`] - Application state with memoized recalculation
//! - [`units`] - Type-safe unit wrappers and the wire gauge table
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod catalog;
pub mod errors;
pub mod items;
pub mod pattern;
pub mod session;
pub mod settings;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{calculate, expand, find_combinations, CalculationResult, Combination, CustomerRequirements};
pub use catalog::Catalog;
pub use errors::{MalaError, MalaResult};
pub use items::{Item, ItemId, ItemKind};
pub use pattern::{Pattern, PatternEntry, PatternId};
pub use session::Session;
pub use settings::{GapSettings, GoldRates, KadiSettings, SetLengthMethod};

//! # Session State
//!
//! The `Session` is the explicit application state: catalog, settings, the
//! current pattern and any saved patterns. Every change replaces a whole
//! value and bumps the revision; the calculation is recomputed only when the
//! revision moved.
//!
//! ## Structure
//!
//! ```text
//! Session
//! ├── meta: SessionMetadata (created, modified, revision)
//! ├── catalog: Catalog
//! ├── gap_settings / gold_rates
//! ├── current_pattern: Option<Pattern>   (set by commit_pattern or adopt_combination)
//! └── saved_patterns: Vec<Pattern>
//! ```
//!
//! ## Example
//!
//! ```rust
//! use mala_core::pattern::Pattern;
//! use mala_core::session::Session;
//!
//! let mut session = Session::new();
//! let bead = session.catalog().find_by_name("Rudraksha 8mm").unwrap().id;
//!
//! session.commit_pattern(Pattern::new("Plain 108").with_entry(bead, 108));
//! let result = session.calculation().unwrap();
//! assert_eq!(result.total_pieces, 108);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calculations::calculator::{calculate, CalculationResult};
use crate::calculations::finder::{self, Combination, CustomerRequirements, FinderOutcome};
use crate::catalog::Catalog;
use crate::errors::{MalaError, MalaResult};
use crate::items::{Item, ItemId};
use crate::pattern::{Pattern, PatternId};
use crate::settings::{GapSettings, GoldRates};

/// Session bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,

    /// Bumped on every change to an input of the calculation
    pub revision: u64,
}

/// A memoized calculation and the revision it was computed at.
#[derive(Debug, Clone)]
struct CachedCalculation {
    revision: u64,
    result: Option<CalculationResult>,
}

/// Application state for one designer session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub meta: SessionMetadata,
    catalog: Catalog,
    gap_settings: GapSettings,
    gold_rates: GoldRates,
    current_pattern: Option<Pattern>,
    saved_patterns: Vec<Pattern>,

    #[serde(skip)]
    cache: Option<CachedCalculation>,

    #[serde(skip)]
    recalculations: u64,
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Session {
    /// A session over the default catalog with default settings.
    pub fn new() -> Self {
        Session::with_catalog(Catalog::with_defaults())
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        let now = Utc::now();
        Session {
            meta: SessionMetadata {
                created: now,
                modified: now,
                revision: 0,
            },
            catalog,
            gap_settings: GapSettings::default(),
            gold_rates: GoldRates::default(),
            current_pattern: None,
            saved_patterns: Vec::new(),
            cache: None,
            recalculations: 0,
        }
    }

    // === Accessors ===

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn gap_settings(&self) -> &GapSettings {
        &self.gap_settings
    }

    pub fn gold_rates(&self) -> &GoldRates {
        &self.gold_rates
    }

    pub fn current_pattern(&self) -> Option<&Pattern> {
        self.current_pattern.as_ref()
    }

    pub fn saved_patterns(&self) -> &[Pattern] {
        &self.saved_patterns
    }

    pub fn revision(&self) -> u64 {
        self.meta.revision
    }

    /// How many times the calculation actually ran
    pub fn recalculations(&self) -> u64 {
        self.recalculations
    }

    /// Mark an input as changed.
    fn touch(&mut self) {
        self.meta.modified = Utc::now();
        self.meta.revision += 1;
    }

    // === Settings ===

    /// Replace the gap settings. Rejected settings leave the session unchanged.
    pub fn set_gap_settings(&mut self, settings: GapSettings) -> MalaResult<()> {
        settings.validate()?;
        self.gap_settings = settings;
        self.touch();
        Ok(())
    }

    pub fn set_gold_rates(&mut self, rates: GoldRates) -> MalaResult<()> {
        rates.validate()?;
        self.gold_rates = rates;
        self.touch();
        Ok(())
    }

    // === Catalog ===

    pub fn set_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
        self.touch();
    }

    pub fn add_item(&mut self, item: Item) -> MalaResult<ItemId> {
        let id = self.catalog.add(item)?;
        self.touch();
        Ok(id)
    }

    pub fn update_item(&mut self, id: ItemId, edit: impl FnOnce(&mut Item)) -> MalaResult<()> {
        self.catalog.update(id, edit)?;
        self.touch();
        Ok(())
    }

    /// Remove an item. Patterns that reference it skip it from now on.
    pub fn remove_item(&mut self, id: ItemId) -> MalaResult<Item> {
        let item = self.catalog.remove(id)?;
        self.touch();
        Ok(item)
    }

    // === Pattern ===

    /// Make `pattern` the current pattern once its edits have settled.
    pub fn commit_pattern(&mut self, pattern: Pattern) {
        info!(id = %pattern.id, name = %pattern.name, entries = pattern.entries.len(), "Pattern committed");
        self.current_pattern = Some(pattern);
        self.touch();
    }

    pub fn clear_pattern(&mut self) {
        if self.current_pattern.take().is_some() {
            self.touch();
        }
    }

    /// The calculation for the current state, recomputed only after a change.
    ///
    /// `None` when there is no pattern or it produces no pieces.
    pub fn calculation(&mut self) -> Option<&CalculationResult> {
        let revision = self.meta.revision;
        let fresh = self.cache.as_ref().is_some_and(|c| c.revision == revision);
        if !fresh {
            let result = self
                .current_pattern
                .as_ref()
                .and_then(|p| calculate(p, &self.catalog, &self.gap_settings, &self.gold_rates));
            self.recalculations += 1;
            debug!(revision, present = result.is_some(), "Recalculated");
            self.cache = Some(CachedCalculation { revision, result });
        }
        self.cache.as_ref().and_then(|c| c.result.as_ref())
    }

    /// Save the current pattern, replacing a saved pattern with the same id.
    pub fn save_current_pattern(&mut self) -> MalaResult<PatternId> {
        let pattern = self
            .current_pattern
            .clone()
            .ok_or_else(|| MalaError::missing_field("current_pattern"))?;
        let id = pattern.id;
        match self.saved_patterns.iter_mut().find(|p| p.id == id) {
            Some(slot) => *slot = pattern,
            None => self.saved_patterns.push(pattern),
        }
        info!(id = %id, saved = self.saved_patterns.len(), "Pattern saved");
        self.meta.modified = Utc::now();
        Ok(id)
    }

    /// Make a saved pattern current.
    pub fn load_pattern(&mut self, id: PatternId) -> MalaResult<()> {
        let pattern = self
            .saved_patterns
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| MalaError::pattern_not_found(id))?;
        self.commit_pattern(pattern);
        Ok(())
    }

    pub fn delete_saved_pattern(&mut self, id: PatternId) -> MalaResult<Pattern> {
        let pos = self
            .saved_patterns
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| MalaError::pattern_not_found(id))?;
        self.meta.modified = Utc::now();
        Ok(self.saved_patterns.remove(pos))
    }

    // === Finder ===

    /// Search the session catalog under the session gap settings.
    pub fn find_combinations(&self, requirements: &CustomerRequirements) -> MalaResult<FinderOutcome> {
        finder::find_combinations(&self.catalog, requirements, &self.gap_settings)
    }

    /// Make a found combination the current pattern and take over its gap.
    pub fn adopt_combination(&mut self, combination: &Combination, requirements: &CustomerRequirements) {
        let (pattern, settings) = finder::adopt(combination, requirements, &self.gap_settings);
        info!(
            bead = %combination.bead.display_name,
            beads = combination.bead_count,
            gap_mm = combination.gap_mm,
            "Adopting combination"
        );
        self.gap_settings = settings;
        self.commit_pattern(pattern);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::finder::ManiCountMode;

    fn bead_id(session: &Session) -> ItemId {
        session.catalog().find_by_name("Rudraksha 8mm").unwrap().id
    }

    #[test]
    fn test_new_session_has_no_result() {
        let mut session = Session::new();
        assert_eq!(session.revision(), 0);
        assert!(session.calculation().is_none());
    }

    #[test]
    fn test_calculation_is_memoized() {
        let mut session = Session::new();
        let bead = bead_id(&session);
        session.commit_pattern(Pattern::new("Test").with_entry(bead, 27));

        assert_eq!(session.calculation().unwrap().total_pieces, 27);
        assert_eq!(session.calculation().unwrap().total_pieces, 27);
        assert_eq!(session.recalculations(), 1);

        session
            .set_gap_settings(GapSettings::default().with_uniform_gap(1.0))
            .unwrap();
        assert!((session.calculation().unwrap().total_length_mm - (27.0 * 8.0 + 26.0)).abs() < 1e-9);
        assert_eq!(session.recalculations(), 2);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut session = Session::new();
        let before = session.revision();
        assert!(session.set_gap_settings(GapSettings::default().with_uniform_gap(-0.5)).is_err());
        assert!(session.set_gold_rates(GoldRates { rate: -1.0 }).is_err());
        assert_eq!(session.revision(), before);
        assert_eq!(session.gap_settings(), &GapSettings::default());
    }

    #[test]
    fn test_catalog_edits_invalidate() {
        let mut session = Session::new();
        let bead = bead_id(&session);
        session.commit_pattern(Pattern::new("Test").with_entry(bead, 10));
        let before = session.calculation().unwrap().total_weight_grams;

        session.update_item(bead, |item| item.weight_grams = 1.0).unwrap();
        let after = session.calculation().unwrap().total_weight_grams;
        assert!((before - 8.0).abs() < 1e-9);
        assert!((after - 10.0).abs() < 1e-9);

        session.remove_item(bead).unwrap();
        assert!(session.calculation().is_none());
    }

    #[test]
    fn test_save_and_load_patterns() {
        let mut session = Session::new();
        assert!(session.save_current_pattern().is_err());

        let bead = bead_id(&session);
        let mut pattern = Pattern::new("First").with_entry(bead, 54);
        session.commit_pattern(pattern.clone());
        let id = session.save_current_pattern().unwrap();

        pattern.name = "Renamed".to_string();
        session.commit_pattern(pattern);
        session.save_current_pattern().unwrap();
        assert_eq!(session.saved_patterns().len(), 1);
        assert_eq!(session.saved_patterns()[0].name, "Renamed");

        session.clear_pattern();
        assert!(session.current_pattern().is_none());
        session.load_pattern(id).unwrap();
        assert_eq!(session.current_pattern().unwrap().name, "Renamed");

        assert!(session.load_pattern(uuid::Uuid::new_v4()).is_err());
        session.delete_saved_pattern(id).unwrap();
        assert!(session.saved_patterns().is_empty());
    }

    #[test]
    fn test_adopt_combination_replaces_pattern_and_gap() {
        let mut session = Session::new();
        let requirements = CustomerRequirements::default()
            .with_mani(ManiCountMode::Auto)
            .with_gap_range(1.0, 2.0);
        let outcome = session.find_combinations(&requirements).unwrap();
        let best = outcome.combinations[0].clone();

        session.adopt_combination(&best, &requirements);
        assert_eq!(session.gap_settings().uniform_gap_mm, best.gap_mm);

        let result = session.calculation().unwrap();
        assert_eq!(result.bead_count, best.bead_count);
        assert_eq!(result.mani_count, best.mani_count);
        assert!((result.total_length_mm - best.length_mm).abs() < 1e-6);
    }

    #[test]
    fn test_session_json_skips_cache() {
        let mut session = Session::new();
        let bead = bead_id(&session);
        session.commit_pattern(Pattern::new("Test").with_entry(bead, 3));
        session.calculation();

        let json = serde_json::to_string(&session).unwrap();
        assert!(!json.contains("cache"));
        let mut restored: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.calculation().unwrap().total_pieces, 3);
    }
}

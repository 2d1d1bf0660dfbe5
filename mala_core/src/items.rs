//! # Catalog Items
//!
//! Physical components a mala is strung from. Every item shares an id, a
//! display name, a weight and a display color; the geometry fields differ per
//! variant and live in [`ItemKind`].
//!
//! ## Variants
//!
//! - **Bead**: the main strung piece (Rudraksha, Tulsi, Crystal, ...)
//! - **Mani**: a gold ball spacer interleaved with beads
//! - **Cap**: a half-round gold end cap seated on each side of a bead
//! - **Kadi**: the joint/clasp, attached once per mala
//!
//! ## JSON Serialization
//!
//! The variant is carried in a `"type"` discriminator next to the shared fields:
//!
//! ```json
//! {
//!   "id": "0f8c0e9e-3b4a-4f43-9d2e-8d0c7d8f1b11",
//!   "display_name": "Rudraksha 8mm",
//!   "weight_grams": 0.8,
//!   "color": "#A0522D",
//!   "type": "Bead",
//!   "diameter_mm": 8.0,
//!   "hole_diameter_mm": 1.8,
//!   "material": "Rudraksha"
//! }
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ensure_non_negative, MalaError, MalaResult};
use crate::units::wire_gauge_mm;

/// Stable identity of a catalog item. Never positional.
pub type ItemId = Uuid;

/// Default display colors per variant
const BEAD_COLOR: &str = "#8B4513";
const MANI_COLOR: &str = "#FFD700";
const CAP_COLOR: &str = "#DAA520";
const KADI_COLOR: &str = "#B8860B";

/// Bead geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeadSpec {
    /// Outer diameter along the string (mm)
    pub diameter_mm: f64,
    /// Drilled hole diameter (mm)
    pub hole_diameter_mm: f64,
    /// Material label used by the finder's material filter
    pub material: String,
}

/// Mani (gold ball) geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManiSpec {
    /// Ball diameter (mm)
    pub ball_gauge_mm: f64,
    /// Length the ball adds along the string (mm), edited independently of the gauge
    pub height_mm: f64,
    /// Wire gauge (AWG)
    pub wire_gauge_awg: u8,
    /// Wire diameter resolved from the gauge table (mm)
    pub wire_gauge_mm: f64,
    /// Hole diameter (mm)
    pub hole_diameter_mm: f64,
}

/// Half-round cap geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapSpec {
    /// Outer diameter of the cap rim (mm)
    pub outer_diameter_mm: f64,
    /// Inner diameter, must fit over the paired bead (mm)
    pub inner_diameter_mm: f64,
    /// Height the cap adds before overlap correction (mm)
    pub height_mm: f64,
    /// Wire gauge (AWG)
    pub wire_gauge_awg: u8,
    /// Wire diameter resolved from the gauge table (mm)
    pub wire_gauge_mm: f64,
    /// Hole diameter (mm)
    pub hole_diameter_mm: f64,
}

/// Joint/clasp geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KadiSpec {
    /// Length added to the mala (mm)
    pub length_mm: f64,
    /// Width (mm)
    pub width_mm: f64,
}

/// Variant-specific part of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ItemKind {
    Bead(BeadSpec),
    Mani(ManiSpec),
    Cap(CapSpec),
    Kadi(KadiSpec),
}

impl ItemKind {
    /// Variant name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ItemKind::Bead(_) => "Bead",
            ItemKind::Mani(_) => "Mani",
            ItemKind::Cap(_) => "Cap",
            ItemKind::Kadi(_) => "Kadi",
        }
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable identifier
    pub id: ItemId,

    /// Human-readable name (e.g., "Rudraksha 8mm")
    pub display_name: String,

    /// Weight of one piece in grams
    pub weight_grams: f64,

    /// Display color (CSS hex)
    pub color: String,

    /// Variant geometry
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl Item {
    fn with_kind(display_name: impl Into<String>, weight_grams: f64, color: &str, kind: ItemKind) -> Self {
        Item {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            weight_grams,
            color: color.to_string(),
            kind,
        }
    }

    /// Create a bead.
    ///
    /// ```rust
    /// use mala_core::items::Item;
    ///
    /// let bead = Item::bead("Rudraksha 8mm", 8.0, 1.8, 0.8, "Rudraksha");
    /// assert_eq!(bead.length_contribution_mm(), 8.0);
    /// assert!(!bead.is_gold());
    /// ```
    pub fn bead(
        display_name: impl Into<String>,
        diameter_mm: f64,
        hole_diameter_mm: f64,
        weight_grams: f64,
        material: impl Into<String>,
    ) -> Self {
        Self::with_kind(
            display_name,
            weight_grams,
            BEAD_COLOR,
            ItemKind::Bead(BeadSpec {
                diameter_mm,
                hole_diameter_mm,
                material: material.into(),
            }),
        )
    }

    /// Create a mani whose height equals its ball gauge (use [`Item::with_height`] to change it).
    pub fn mani(
        display_name: impl Into<String>,
        ball_gauge_mm: f64,
        wire_gauge_awg: u8,
        hole_diameter_mm: f64,
        weight_grams: f64,
    ) -> Self {
        Self::with_kind(
            display_name,
            weight_grams,
            MANI_COLOR,
            ItemKind::Mani(ManiSpec {
                ball_gauge_mm,
                height_mm: ball_gauge_mm,
                wire_gauge_awg,
                wire_gauge_mm: wire_gauge_mm(wire_gauge_awg).unwrap_or(0.0),
                hole_diameter_mm,
            }),
        )
    }

    /// Create a half-round cap.
    pub fn cap(
        display_name: impl Into<String>,
        outer_diameter_mm: f64,
        inner_diameter_mm: f64,
        height_mm: f64,
        wire_gauge_awg: u8,
        hole_diameter_mm: f64,
        weight_grams: f64,
    ) -> Self {
        Self::with_kind(
            display_name,
            weight_grams,
            CAP_COLOR,
            ItemKind::Cap(CapSpec {
                outer_diameter_mm,
                inner_diameter_mm,
                height_mm,
                wire_gauge_awg,
                wire_gauge_mm: wire_gauge_mm(wire_gauge_awg).unwrap_or(0.0),
                hole_diameter_mm,
            }),
        )
    }

    /// Create a joint/clasp.
    pub fn kadi(display_name: impl Into<String>, length_mm: f64, width_mm: f64, weight_grams: f64) -> Self {
        Self::with_kind(
            display_name,
            weight_grams,
            KADI_COLOR,
            ItemKind::Kadi(KadiSpec { length_mm, width_mm }),
        )
    }

    /// Replace the generated id (builder pattern)
    pub fn with_id(mut self, id: ItemId) -> Self {
        self.id = id;
        self
    }

    /// Set the display color (builder pattern)
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the length contribution of a mani or cap (builder pattern).
    ///
    /// Has no effect on beads and kadis, whose length is their diameter/length.
    pub fn with_height(mut self, height_mm: f64) -> Self {
        match &mut self.kind {
            ItemKind::Mani(m) => m.height_mm = height_mm,
            ItemKind::Cap(c) => c.height_mm = height_mm,
            ItemKind::Bead(_) | ItemKind::Kadi(_) => {}
        }
        self
    }

    /// The dimension this item adds to the mala's length (mm).
    ///
    /// Caps report their raw height; overlap correction happens in the calculator.
    pub fn length_contribution_mm(&self) -> f64 {
        match &self.kind {
            ItemKind::Bead(b) => b.diameter_mm,
            ItemKind::Mani(m) => m.height_mm,
            ItemKind::Cap(c) => c.height_mm,
            ItemKind::Kadi(k) => k.length_mm,
        }
    }

    /// The diameter used when drawing the item (mm).
    pub fn display_diameter_mm(&self) -> f64 {
        match &self.kind {
            ItemKind::Bead(b) => b.diameter_mm,
            ItemKind::Mani(m) => m.ball_gauge_mm,
            ItemKind::Cap(c) => c.outer_diameter_mm,
            ItemKind::Kadi(k) => k.width_mm,
        }
    }

    /// Whether the item's weight counts toward gold weight and cost.
    pub fn is_gold(&self) -> bool {
        match self.kind {
            ItemKind::Bead(_) => false,
            ItemKind::Mani(_) | ItemKind::Cap(_) | ItemKind::Kadi(_) => true,
        }
    }

    /// Variant name ("Bead", "Mani", "Cap", "Kadi")
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn as_bead(&self) -> Option<&BeadSpec> {
        match &self.kind {
            ItemKind::Bead(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_mani(&self) -> Option<&ManiSpec> {
        match &self.kind {
            ItemKind::Mani(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_cap(&self) -> Option<&CapSpec> {
        match &self.kind {
            ItemKind::Cap(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_bead(&self) -> bool {
        matches!(self.kind, ItemKind::Bead(_))
    }

    pub fn is_cap(&self) -> bool {
        matches!(self.kind, ItemKind::Cap(_))
    }

    pub fn is_mani(&self) -> bool {
        matches!(self.kind, ItemKind::Mani(_))
    }

    /// Validate that weight and geometry are non-negative.
    pub fn validate(&self) -> MalaResult<()> {
        if self.display_name.trim().is_empty() {
            return Err(MalaError::missing_field("display_name"));
        }
        ensure_non_negative("weight_grams", self.weight_grams)?;
        match &self.kind {
            ItemKind::Bead(b) => {
                ensure_non_negative("diameter_mm", b.diameter_mm)?;
                ensure_non_negative("hole_diameter_mm", b.hole_diameter_mm)?;
            }
            ItemKind::Mani(m) => {
                ensure_non_negative("ball_gauge_mm", m.ball_gauge_mm)?;
                ensure_non_negative("height_mm", m.height_mm)?;
                ensure_non_negative("wire_gauge_mm", m.wire_gauge_mm)?;
                ensure_non_negative("hole_diameter_mm", m.hole_diameter_mm)?;
            }
            ItemKind::Cap(c) => {
                ensure_non_negative("outer_diameter_mm", c.outer_diameter_mm)?;
                ensure_non_negative("inner_diameter_mm", c.inner_diameter_mm)?;
                ensure_non_negative("height_mm", c.height_mm)?;
                ensure_non_negative("wire_gauge_mm", c.wire_gauge_mm)?;
                ensure_non_negative("hole_diameter_mm", c.hole_diameter_mm)?;
                if c.inner_diameter_mm > c.outer_diameter_mm {
                    return Err(MalaError::invalid_input(
                        "inner_diameter_mm",
                        c.inner_diameter_mm.to_string(),
                        "Inner diameter cannot exceed outer diameter",
                    ));
                }
            }
            ItemKind::Kadi(k) => {
                ensure_non_negative("length_mm", k.length_mm)?;
                ensure_non_negative("width_mm", k.width_mm)?;
            }
        }
        Ok(())
    }
}

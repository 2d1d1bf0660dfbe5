use clap::{Args, Parser, Subcommand, ValueEnum};

use mala_core::calculations::finder::{
    BeadCountMode, BeadSizePreference, CustomerRequirements, GoldAllowance, LengthPriority, ManiCountMode,
    MatchPriority, MaterialFilter, WeightPriority,
};
use mala_core::calculations::reference::{ReferenceLength, SetReference};
use mala_core::pattern::Preset;
use mala_core::settings::{GapSettings, GoldRates, KadiSettings};

#[derive(Parser)]
#[command(name = "mala")]
#[command(about = "Mala designer - length, weight and gold calculator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the default catalog
    Catalog,

    /// Calculate a pattern
    Calc(CalcArgs),

    /// Find bead combinations for a target length and weight
    Find(FindArgs),

    /// Derive set length from a measured sample
    Reference(ReferenceArgs),
}

#[derive(Args)]
pub struct GapArgs {
    /// Gap between pieces (mm)
    #[arg(long, default_value = "0.5")]
    pub gap: f64,

    /// Gap between a cap and its bead (mm)
    #[arg(long, default_value = "0")]
    pub cap_bead_gap: f64,

    /// Depth a cap sits into the bead (mm)
    #[arg(long, default_value = "0")]
    pub cap_overlap: f64,

    /// Thread/wire weight (g)
    #[arg(long, default_value = "0")]
    pub thread_weight: f64,

    /// Use a measured set length (mm) instead of the components
    #[arg(long)]
    pub measured_set_length: Option<f64>,

    /// The measured set length already includes the gap
    #[arg(long, requires = "measured_set_length")]
    pub measured_includes_gap: bool,
}

impl GapArgs {
    pub fn to_settings(&self) -> GapSettings {
        let settings = GapSettings {
            uniform_gap_mm: self.gap,
            cap_bead_gap_mm: self.cap_bead_gap,
            cap_overlap_mm: self.cap_overlap,
            thread_weight_grams: self.thread_weight,
            ..GapSettings::default()
        };
        match self.measured_set_length {
            Some(length) => settings.with_measured_set_length(length, self.measured_includes_gap),
            None => settings,
        }
    }
}

#[derive(Args)]
pub struct CalcArgs {
    /// Start from a preset (uses the first catalog bead and mani)
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Bead name from the catalog
    #[arg(short, long, default_value = "Rudraksha 8mm")]
    pub bead: String,

    /// Beads per repeat
    #[arg(short, long, default_value = "108")]
    pub count: u32,

    /// Mani name from the catalog
    #[arg(short, long)]
    pub mani: Option<String>,

    /// Mani per repeat (default: one fewer than the beads)
    #[arg(long, requires = "mani")]
    pub mani_count: Option<u32>,

    /// Cap name from the catalog; enables caps
    #[arg(long)]
    pub cap: Option<String>,

    /// Repeat the sequence
    #[arg(short, long, default_value = "1")]
    pub repeat: u32,

    /// Add a joint of this size (mm)
    #[arg(long)]
    pub kadi_size: Option<f64>,

    /// Joint weight (g)
    #[arg(long, default_value = "0.5")]
    pub kadi_weight: f64,

    /// Gold rate per gram
    #[arg(long, default_value = "6600")]
    pub gold_rate: f64,

    /// Print every piece in order
    #[arg(long)]
    pub pieces: bool,

    #[command(flatten)]
    pub gaps: GapArgs,
}

impl CalcArgs {
    pub fn kadi(&self) -> KadiSettings {
        match self.kadi_size {
            Some(size) => KadiSettings::enabled(size, self.kadi_weight),
            None => KadiSettings::default(),
        }
    }

    pub fn gold_rates(&self) -> GoldRates {
        GoldRates { rate: self.gold_rate }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PresetArg {
    /// 108 beads
    #[value(name = "108")]
    Standard108,
    /// 54 beads + 53 mani
    #[value(name = "54")]
    Beads54,
    /// 27 beads + 26 mani
    #[value(name = "27")]
    Beads27,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Standard108 => Preset::Standard108,
            PresetArg::Beads54 => Preset::Beads54Mani53,
            PresetArg::Beads27 => Preset::Beads27Mani26,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LengthPriorityArg {
    Exact,
    Approximate,
    Minimum,
}

impl From<LengthPriorityArg> for LengthPriority {
    fn from(arg: LengthPriorityArg) -> Self {
        match arg {
            LengthPriorityArg::Exact => LengthPriority::Exact,
            LengthPriorityArg::Approximate => LengthPriority::Approximate,
            LengthPriorityArg::Minimum => LengthPriority::Minimum,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum WeightPriorityArg {
    Exact,
    Max,
    NotImportant,
}

impl From<WeightPriorityArg> for WeightPriority {
    fn from(arg: WeightPriorityArg) -> Self {
        match arg {
            WeightPriorityArg::Exact => WeightPriority::Exact,
            WeightPriorityArg::Max => WeightPriority::Max,
            WeightPriorityArg::NotImportant => WeightPriority::NotImportant,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum MatchPriorityArg {
    Length,
    Weight,
    Balanced,
}

impl From<MatchPriorityArg> for MatchPriority {
    fn from(arg: MatchPriorityArg) -> Self {
        match arg {
            MatchPriorityArg::Length => MatchPriority::Length,
            MatchPriorityArg::Weight => MatchPriority::Weight,
            MatchPriorityArg::Balanced => MatchPriority::Balanced,
        }
    }
}

#[derive(Args)]
pub struct FindArgs {
    /// Target length including the joint (inches)
    #[arg(short, long, default_value = "24")]
    pub length: f64,

    #[arg(long, value_enum, default_value = "approximate")]
    pub length_priority: LengthPriorityArg,

    /// Target weight (g)
    #[arg(short, long, default_value = "50")]
    pub weight: f64,

    #[arg(long, value_enum, default_value = "not-important")]
    pub weight_priority: WeightPriorityArg,

    /// Fixed bead count (default: estimate)
    #[arg(short, long)]
    pub beads: Option<u32>,

    /// Only these materials (repeatable)
    #[arg(long)]
    pub material: Vec<String>,

    /// Preferred bead size, ±1mm (mm)
    #[arg(long, conflicts_with_all = ["size_min", "size_max"])]
    pub size: Option<f64>,

    /// Smallest bead (mm)
    #[arg(long, requires = "size_max")]
    pub size_min: Option<f64>,

    /// Largest bead (mm)
    #[arg(long, requires = "size_min")]
    pub size_max: Option<f64>,

    /// Include mani, one fewer than the beads
    #[arg(short, long)]
    pub mani: bool,

    /// Fixed number of mani
    #[arg(long, requires = "mani", conflicts_with = "mani_ratio")]
    pub mani_custom: Option<u32>,

    /// One mani per N beads
    #[arg(long, requires = "mani")]
    pub mani_ratio: Option<u32>,

    /// Leave out caps
    #[arg(long)]
    pub no_caps: bool,

    /// Add a joint of this size (mm)
    #[arg(long)]
    pub kadi_size: Option<f64>,

    /// Joint weight (g)
    #[arg(long, default_value = "0.5")]
    pub kadi_weight: f64,

    /// Smallest gap (mm)
    #[arg(long, default_value = "3")]
    pub gap_min: f64,

    /// Largest gap (mm)
    #[arg(long, default_value = "3")]
    pub gap_max: f64,

    /// Gold wire allowance range (g), e.g. --gap-gold 3 5
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    pub gap_gold: Option<Vec<f64>>,

    /// Cap overlap for the search (mm); default is the session value
    #[arg(long)]
    pub cap_overlap: Option<f64>,

    #[arg(long, value_enum, default_value = "length")]
    pub priority: MatchPriorityArg,

    /// Adopt the Nth result (1-based) and calculate it
    #[arg(long)]
    pub adopt: Option<usize>,
}

impl FindArgs {
    pub fn to_requirements(&self) -> CustomerRequirements {
        let mut requirements = CustomerRequirements::default()
            .with_target_length(self.length, self.length_priority.into())
            .with_target_weight(self.weight, self.weight_priority.into())
            .with_gap_range(self.gap_min, self.gap_max)
            .with_match_priority(self.priority.into());

        if let Some(count) = self.beads {
            requirements = requirements.with_bead_count(BeadCountMode::Fixed(count));
        }
        if !self.material.is_empty() {
            requirements = requirements.with_materials(MaterialFilter::Only(self.material.clone()));
        }
        requirements.bead_size = match (self.size, self.size_min, self.size_max) {
            (Some(diameter_mm), _, _) => BeadSizePreference::Exact { diameter_mm },
            (None, Some(min_mm), Some(max_mm)) => BeadSizePreference::Range { min_mm, max_mm },
            _ => BeadSizePreference::Any,
        };
        if self.mani {
            let mode = match (self.mani_custom, self.mani_ratio) {
                (Some(count), _) => ManiCountMode::Custom(count),
                (None, Some(ratio)) => ManiCountMode::Ratio(ratio),
                (None, None) => ManiCountMode::Auto,
            };
            requirements = requirements.with_mani(mode);
        }
        if self.no_caps {
            requirements = requirements.without_caps();
        }
        if let Some(size) = self.kadi_size {
            requirements = requirements.with_kadi(KadiSettings::enabled(size, self.kadi_weight));
        }
        if let Some([min_grams, max_grams]) = self.gap_gold.as_deref() {
            requirements = requirements.with_gap_gold_allowance(GoldAllowance {
                min_grams: *min_grams,
                max_grams: *max_grams,
            });
        }
        requirements.cap_overlap_mm = self.cap_overlap;
        requirements
    }
}

#[derive(Args)]
pub struct ReferenceArgs {
    /// Sets in the sample
    #[arg(short, long, default_value = "10")]
    pub sets: u32,

    /// Sample length in inches
    #[arg(long, conflicts_with = "mm", default_value = "1")]
    pub inches: f64,

    /// Sample length in millimeters
    #[arg(long)]
    pub mm: Option<f64>,

    /// Project the length of this many sets (default: 27, 54 and 108)
    #[arg(short, long)]
    pub target: Option<u32>,
}

impl ReferenceArgs {
    pub fn to_reference(&self) -> SetReference {
        let length = match self.mm {
            Some(mm) => ReferenceLength::Millimeters(mm),
            None => ReferenceLength::Inches(self.inches),
        };
        SetReference::new(self.sets, length)
    }
}

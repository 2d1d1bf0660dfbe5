//! # Mala CLI Application
//!
//! Terminal front end over `mala_core`: calculate a pattern, search for
//! combinations, or derive a set length from a sample. Human-readable output
//! by default, JSON with `--json`.

mod cli;

use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mala_core::calculations::calculator::CalculationResult;
use mala_core::calculations::finder::{FinderOutcome, FinderStatus};
use mala_core::calculations::reference::{ProjectedLength, ReferenceMeasurement};
use mala_core::catalog::Catalog;
use mala_core::items::{Item, ItemKind};
use mala_core::pattern::Pattern;
use mala_core::session::Session;
use mala_core::{MalaError, SetLengthMethod};

use cli::{CalcArgs, Cli, Commands, FindArgs, ReferenceArgs};

const RULE: &str = "═══════════════════════════════════════════════════════";

/// Install the log subscriber.
///
/// `RUST_LOG` wins; otherwise warnings, plus core info (debug with `--verbose`).
fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,mala_core=debug,mala=debug" } else { "warn,mala_core=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(mala_error) = e.downcast_ref::<MalaError>() {
                if let Ok(json) = serde_json::to_string_pretty(mala_error) {
                    eprintln!();
                    eprintln!("Error JSON ({}):", mala_error.error_code());
                    eprintln!("{}", json);
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Catalog => run_catalog(cli.json),
        Commands::Calc(args) => run_calc(args, cli.json),
        Commands::Find(args) => run_find(args, cli.json),
        Commands::Reference(args) => run_reference(args, cli.json),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn header(title: &str) {
    println!("{}", RULE);
    println!("  {}", title);
    println!("{}", RULE);
}

// === catalog ===

fn run_catalog(json: bool) -> Result<()> {
    let catalog = Catalog::with_defaults();
    if json {
        return print_json(&catalog);
    }

    header("CATALOG");
    for item in catalog.items() {
        println!(
            "  {:<5} {:<16} {:>6.2}g  {}",
            item.kind_name(),
            item.display_name,
            item.weight_grams,
            describe(item)
        );
    }
    println!();
    println!("Materials: {}", catalog.materials().join(", "));
    Ok(())
}

fn describe(item: &Item) -> String {
    match &item.kind {
        ItemKind::Bead(b) => format!("⌀{}mm, hole {}mm, {}", b.diameter_mm, b.hole_diameter_mm, b.material),
        ItemKind::Mani(m) => format!(
            "⌀{}mm, height {}mm, {} AWG ({:.3}mm)",
            m.ball_gauge_mm, m.height_mm, m.wire_gauge_awg, m.wire_gauge_mm
        ),
        ItemKind::Cap(c) => format!(
            "outer {}mm, inner {}mm, height {}mm, {} AWG",
            c.outer_diameter_mm, c.inner_diameter_mm, c.height_mm, c.wire_gauge_awg
        ),
        ItemKind::Kadi(k) => format!("{}mm × {}mm", k.length_mm, k.width_mm),
    }
}

// === calc ===

/// Look up a catalog item by name and check its kind.
fn lookup<'a>(catalog: &'a Catalog, name: &str, kind: &str) -> Result<&'a Item> {
    let item = catalog
        .find_by_name(name)
        .ok_or_else(|| anyhow!("No catalog item named '{}' (see `mala catalog`)", name))?;
    if item.kind_name() != kind {
        return Err(MalaError::wrong_item_kind(item.id, kind, item.kind_name()).into());
    }
    Ok(item)
}

fn pattern_from_args(args: &CalcArgs, catalog: &Catalog) -> Result<Pattern> {
    let mut pattern = match args.preset {
        Some(preset) => {
            Pattern::from_preset(preset.into(), catalog).ok_or_else(|| anyhow!("Catalog has no beads"))?
        }
        None => {
            let bead = lookup(catalog, &args.bead, "Bead")?;
            let mut pattern = Pattern::new("CLI Pattern").with_entry(bead.id, args.count);
            if let Some(name) = &args.mani {
                let mani = lookup(catalog, name, "Mani")?;
                let count = args.mani_count.unwrap_or(args.count.saturating_sub(1));
                pattern.add_entry(mani.id, count);
            }
            pattern
        }
    };

    if let Some(name) = &args.cap {
        pattern = pattern.with_caps(lookup(catalog, name, "Cap")?.id);
    }
    Ok(pattern.with_repeat(args.repeat).with_kadi(args.kadi()))
}

fn run_calc(args: &CalcArgs, json: bool) -> Result<()> {
    let mut session = Session::new();
    session.set_gap_settings(args.gaps.to_settings())?;
    session.set_gold_rates(args.gold_rates())?;

    let pattern = pattern_from_args(args, session.catalog())?;
    let summary = pattern.summary(session.catalog());
    debug!(pieces = summary.total_pieces, "Pattern built from arguments");
    session.commit_pattern(pattern);

    let measured = session.gap_settings().set_length_method == SetLengthMethod::Measured;
    let rate = session.gold_rates().rate;
    let result = session
        .calculation()
        .ok_or_else(|| anyhow!("Pattern has no pieces"))?;

    if json {
        return print_json(result);
    }
    print_calculation(result, measured, rate, args.pieces);
    Ok(())
}

fn print_calculation(result: &CalculationResult, measured: bool, rate: f64, pieces: bool) {
    header("MALA CALCULATION");
    println!();
    println!(
        "Pieces:   {} ({} beads, {} caps, {} mani)",
        result.total_pieces, result.bead_count, result.cap_count, result.mani_count
    );
    let method = if result.measured_length_applied {
        " (measured sets)"
    } else if measured {
        " (components, no sets)"
    } else {
        ""
    };
    println!(
        "Length:   {:.2} mm = {:.2}\"{}",
        result.total_length_mm, result.total_length_in, method
    );
    println!("Weight:   {:.2} g", result.total_weight_grams);
    println!("Gold:     {:.2} g × {:.0} = {:.0}", result.gold_weight_grams, rate, result.gold_cost);
    println!();
    println!("Breakdown:");
    for line in &result.breakdown {
        println!(
            "  {:<18} {:>5} pcs {:>8.2} g {}",
            line.label,
            line.pieces,
            line.weight_grams,
            if line.is_gold { "[GOLD]" } else { "" }
        );
    }
    println!();
    println!("Density:");
    println!(
        "  {:.2} pieces/inch, {:.3} g/piece, {:.2} mm/piece",
        result.pieces_per_inch, result.average_piece_weight_grams, result.average_piece_length_mm
    );
    if result.set_count > 0 {
        println!(
            "  {} sets of {:.2} mm ({:.2} mm with gap), {:.2} sets/inch",
            result.set_count, result.set_length_mm, result.set_length_with_gap_mm, result.sets_per_inch
        );
    }
    if pieces {
        println!();
        println!("Sequence:");
        let names: Vec<&str> = result.expanded_items.iter().map(|p| p.item.display_name.as_str()).collect();
        println!("  {}", names.join(" · "));
    }
    println!("{}", RULE);
}

// === find ===

fn run_find(args: &FindArgs, json: bool) -> Result<()> {
    let mut session = Session::new();
    let requirements = args.to_requirements();
    let outcome = session.find_combinations(&requirements)?;

    let Some(n) = args.adopt else {
        if json {
            return print_json(&outcome);
        }
        print_outcome(&outcome);
        return Ok(());
    };

    let combination = n
        .checked_sub(1)
        .and_then(|i| outcome.combinations.get(i))
        .ok_or_else(|| anyhow!("No result #{} ({} found)", n, outcome.combinations.len()))?
        .clone();
    session.adopt_combination(&combination, &requirements);

    let rate = session.gold_rates().rate;
    let result = session
        .calculation()
        .ok_or_else(|| anyhow!("Adopted pattern has no pieces"))?;
    if json {
        return print_json(result);
    }
    print_outcome(&outcome);
    println!();
    print_calculation(result, false, rate, false);
    Ok(())
}

fn print_outcome(outcome: &FinderOutcome) {
    header("MALA FINDER");
    match outcome.status {
        FinderStatus::NoBeadsAvailable => {
            println!("  No beads available. Add beads to the catalog first.");
            return;
        }
        FinderStatus::NoCombinations => {
            println!(
                "  No combinations found ({} evaluated). Try relaxing the length or weight priority.",
                outcome.candidates_evaluated
            );
            return;
        }
        FinderStatus::Found => {}
    }

    println!(
        "  {} of {} candidates matched; best {}:",
        outcome.candidates_accepted,
        outcome.candidates_evaluated,
        outcome.combinations.len()
    );
    println!();
    println!(
        "  #  {:<16} {:>5} {:<10} {:<9} {:>4} {:>5} {:>8} {:>7} {:>6}",
        "Bead", "Count", "Cap", "Mani", "Gap", "Mani#", "Length", "Weight", "Match"
    );
    for (i, c) in outcome.combinations.iter().enumerate() {
        println!(
            "  {:<2} {:<16} {:>5} {:<10} {:<9} {:>4.1} {:>5} {:>7.2}\" {:>6.1}g {:>5.1}%",
            i + 1,
            c.bead.display_name,
            c.bead_count,
            c.cap.as_ref().map_or("-", |cap| cap.display_name.as_str()),
            c.mani.as_ref().map_or("-", |mani| mani.display_name.as_str()),
            c.gap_mm,
            c.mani_count,
            c.length_in,
            c.weight_grams,
            c.match_percentage()
        );
    }
}

// === reference ===

fn run_reference(args: &ReferenceArgs, json: bool) -> Result<()> {
    let reference = args.to_reference();
    let measurement = reference
        .measure()
        .ok_or_else(|| anyhow!("Sample needs at least one set and a positive length"))?;
    let projected: Vec<ProjectedLength> = match args.target {
        Some(count) => reference.length_for_sets(count).into_iter().collect(),
        None => reference.preset_projections(),
    };

    if json {
        #[derive(Serialize)]
        struct Output {
            measurement: ReferenceMeasurement,
            projected: Vec<ProjectedLength>,
        }
        return print_json(&Output { measurement, projected });
    }

    header("SET REFERENCE");
    println!("  Set length (with gap): {:.2} mm", measurement.set_length_with_gap_mm);
    println!("  Sets per inch:         {:.2}", measurement.sets_per_inch);
    for p in &projected {
        println!("  {:>3} sets:              {:.1} mm = {:.2}\"", p.set_count, p.length_mm, p.length_in);
    }
    println!("{}", RULE);
    Ok(())
}

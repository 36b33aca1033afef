//! # hepmatch CLI
//!
//! Command-line front end for inspecting HepMC ASCII event files.
//!
//! ## Usage
//!
//! ```bash
//! # Summarize a file: events, mean cross-section, weights, beams
//! hepmatch info events.hepmc
//!
//! # Parse-only pass reporting warnings and non-fatal parse errors
//! hepmatch validate events.hepmc
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use hepmatch::hepmc::HepmcReader;

/// hepmatch - HepMC event ingestion and truth matching
#[derive(Parser)]
#[command(name = "hepmatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a HepMC file: event count, mean cross-section, weights
    Info {
        /// Input HepMC file path
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Parse a HepMC file and report warnings and non-fatal parse errors
    Validate {
        /// Input HepMC file path
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Info { input } => run_info(input),
        Commands::Validate { input } => run_validate(input),
    }
}

fn run_info(input: PathBuf) -> Result<()> {
    let mut reader = HepmcReader::open(&input)
        .with_context(|| format!("Failed to open HepMC file: {}", input.display()))?;

    let mut n_events = 0u64;
    let mut n_particles = 0u64;
    for event in reader.events() {
        let event = event.with_context(|| format!("Failed to parse {}", input.display()))?;
        n_events += 1;
        n_particles += event.particles.len() as u64;
        info!(
            "event {}: {} particles, weight {}",
            event.number,
            event.particles.len(),
            event.weight
        );
    }

    let summary = reader.finalize();
    let sample = reader.sample();

    println!("File: {}", input.display());
    println!("Events parsed:        {}", n_events);
    println!("Particles parsed:     {}", n_particles);
    println!(
        "Mean cross-section:   {} +/- {} (over {} accumulated events)",
        summary.xsection, summary.xsection_error, summary.nevents
    );
    if !sample.weight_names.is_empty() {
        println!("Declared weights:     {}", sample.weight_names.join(", "));
    }
    if sample.beam_pdg_id != (0, 0) {
        println!(
            "Beams:                PDG {} / {} (PDF sets {} / {})",
            sample.beam_pdg_id.0, sample.beam_pdg_id.1, sample.beam_pdf_id.0, sample.beam_pdf_id.1
        );
    }

    Ok(())
}

fn run_validate(input: PathBuf) -> Result<()> {
    let mut reader = HepmcReader::open(&input)
        .with_context(|| format!("Failed to open HepMC file: {}", input.display()))?;

    let mut n_events = 0u64;
    let mut hard_error = None;
    for event in reader.events() {
        match event {
            Ok(_) => n_events += 1,
            Err(err) => {
                hard_error = Some(err);
                break;
            }
        }
    }

    let session = reader.session();
    println!("File: {}", input.display());
    println!("Events parsed:          {}", n_events);
    println!("Warnings:               {}", session.warnings);
    println!("Non-fatal parse errors: {}", session.soft_errors);

    if let Some(err) = hard_error {
        anyhow::bail!("validation failed: {}", err);
    }
    if session.soft_errors > 0 {
        anyhow::bail!("validation found {} parse errors", session.soft_errors);
    }
    println!("OK");
    Ok(())
}

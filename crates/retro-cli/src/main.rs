//! Retroshade - `retro-theme` entry point
//!
//! Runs the full theming pipeline over an HTML file and writes the themed
//! document out, or checks that reverting restores the page exactly.

mod args;

use std::fs;

use anyhow::{bail, Context, Result};
use clap::Parser;
use retro_engine::{EngineConfig, Preferences, RetroEngine};
use retro_html::{serialize, HtmlParser};
use tracing_subscriber::EnvFilter;

use crate::args::CliArgs;

/// Upper bound on event-loop turns; a full scan always ends at its ceiling
const MAX_TURNS: usize = 100_000;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    if let Err(err) = run(args) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    let mut doc = HtmlParser::new().parse_file(&args.input)?;
    tracing::info!(input = %args.input.display(), nodes = doc.tree.len(), "parsed document");
    let original = serialize(&doc);

    let mut engine = build_engine(config, &args)?;
    engine.start(&mut doc);
    let turns = engine.run_until_idle(&mut doc, MAX_TURNS);

    let stats = engine.stats();
    tracing::info!(
        turns,
        elements = stats.elements_scanned,
        applied = stats.plans_applied,
        aborted = stats.full_scans_aborted,
        "theming finished"
    );

    if args.revert_check {
        engine.revert_all(&mut doc);
        if serialize(&doc) != original {
            bail!("revert did not restore {}", args.input.display());
        }
        println!("revert check passed: {}", args.input.display());
        return Ok(());
    }

    let themed = serialize(&doc);
    match &args.output {
        Some(path) => fs::write(path, themed)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{themed}"),
    }
    Ok(())
}

fn build_engine(config: EngineConfig, args: &CliArgs) -> Result<RetroEngine> {
    let preferences = Preferences {
        mode: args.mode.as_mode(),
        intensity: args.intensity,
        ..Default::default()
    };
    let engine = RetroEngine::new(config, preferences)
        .context("invalid engine settings")?
        .with_prefers_dark(args.prefers_dark);
    Ok(engine)
}

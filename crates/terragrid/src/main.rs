//! # TERRAGRID Host
//!
//! Headless host for the generation core. Loads a world description,
//! generates it, reveals it frame by frame and reports what was placed.
//!
//! ## Usage
//!
//! ```bash
//! terragrid --config config/default_world.toml --seed 42 --regenerations 3
//! terragrid --strategy noise_terrain --preview-dir previews --fast
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

mod clock;
mod presentation;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use terragrid_procedural::{
    ChaChaSource, GenerationError, GenerationSession, Generator, PlacementSink,
    PopulationScheduler, StrategyKind, TileDescriptor, WorldConfig,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::clock::FrameClock;
use crate::presentation::{write_previews, DescriptorNames, PlacementTally};

/// Ways a host run can fail.
#[derive(Error, Debug)]
enum HostError {
    /// The core refused the request.
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// Preview output failed.
    #[error("preview output failed: {0}")]
    Io(#[from] std::io::Error),
    /// Bad command line.
    #[error("{0}")]
    Usage(String),
}

/// Parsed command line.
#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    seed: Option<u64>,
    strategy: Option<StrategyKind>,
    regenerations: u64,
    preview_dir: Option<PathBuf>,
    fast: bool,
}

fn print_help() {
    println!("Usage: terragrid [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>        World description (TOML)");
    println!("  -s, --seed <SEED>          Seed for noise and random draws");
    println!("      --strategy <NAME>      random_fill | clustered_prefab | noise_terrain");
    println!("  -n, --regenerations <NUM>  Generation passes to run (default: 1)");
    println!("  -p, --preview-dir <DIR>    Write preview buffers as PGM images");
    println!("      --fast                 Do not wait between reveal frames");
    println!("  -h, --help                 Show this help");
}

/// Parses `args` (without the program name). `Ok(None)` means help was shown.
fn parse_args(args: &[String]) -> Result<Option<Options>, HostError> {
    let mut options = Options {
        regenerations: 1,
        ..Options::default()
    };

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || {
            i += 1;
            args.get(i)
                .cloned()
                .ok_or_else(|| HostError::Usage(format!("{flag} needs a value")))
        };

        match flag {
            "--config" | "-c" => options.config = Some(PathBuf::from(value()?)),
            "--seed" | "-s" => {
                let raw = value()?;
                options.seed = Some(
                    raw.parse()
                        .map_err(|_| HostError::Usage(format!("invalid seed `{raw}`")))?,
                );
            }
            "--strategy" => options.strategy = Some(value()?.parse()?),
            "--regenerations" | "-n" => {
                let raw = value()?;
                options.regenerations = raw
                    .parse()
                    .map_err(|_| HostError::Usage(format!("invalid pass count `{raw}`")))?;
            }
            "--preview-dir" | "-p" => options.preview_dir = Some(PathBuf::from(value()?)),
            "--fast" => options.fast = true,
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            other => return Err(HostError::Usage(format!("unknown option `{other}`"))),
        }
        i += 1;
    }

    Ok(Some(options))
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64)
}

/// Steps `scheduler` once per frame until the reveal finishes.
fn reveal(
    scheduler: &mut PopulationScheduler<'_>,
    clock: &mut FrameClock,
    sink: &mut dyn PlacementSink,
    fast: bool,
) {
    loop {
        if !fast {
            clock.wait_for_frame();
        }
        if clock.timed(|| scheduler.step(&mut *sink)).is_finished() {
            return;
        }
    }
}

fn report(
    session: &GenerationSession,
    tally: &PlacementTally,
    names: &DescriptorNames,
    frames: u64,
) {
    let dims = session.dimensions();
    println!(
        "┌─ PASS {} ({}) ─────────────────────────────────────────────",
        session.generation(),
        session.strategy()
    );
    println!("│ Grid:               {}x{}x{}", dims.width, dims.height, dims.depth);
    println!("│ Placements:         {}", tally.total());
    println!("│ Frames:             {frames}");
    if let Some((first, last)) = tally.bounds() {
        println!(
            "│ Span:               ({}, {}, {}) .. ({}, {}, {})",
            first.x, first.y, first.z, last.x, last.y, last.z
        );
    }
    let snow = tally.count(TileDescriptor::Snow);
    if snow > 0 {
        println!("│ Snow Cover:         {snow}");
    }
    let origin = session.origin();
    println!(
        "│ Noise Origin:       ({:.3}, {:.3}, {:.3})",
        origin.x, origin.y, origin.z
    );
    for (name, count) in tally.summary(names) {
        println!("│   {name:<18}{count}");
    }
    println!("└──────────────────────────────────────────────────────────────");
}

fn run(options: &Options) -> Result<(), HostError> {
    let mut config = match &options.config {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };
    if let Some(strategy) = options.strategy {
        config.strategy = strategy;
    }
    // The chosen seed drives noise and draws alike, so it can be replayed with --seed.
    let seed = options.seed.or(config.seed).unwrap_or_else(clock_seed);
    config.seed = Some(seed);

    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Strategy:           {}", config.strategy);
    println!(
        "│ Grid:               {}x{}x{}",
        config.dimensions.width, config.dimensions.height, config.dimensions.depth
    );
    println!("│ Seed:               {seed}");
    println!("│ Paced Reveal:       {}", config.reveal.paced);
    println!("│ Passes:             {}", options.regenerations);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let names = DescriptorNames::from_config(&config);
    let mut clock = FrameClock::new(config.reveal.frames_per_second);
    let mut generator = Generator::new(config)?;
    let mut rng = ChaChaSource::from_seed(seed);
    let started = Instant::now();

    for _ in 0..options.regenerations {
        // Any scheduler from the previous pass is gone by now.
        let session = generator.regenerate(&mut rng)?;
        let mut tally = PlacementTally::new();
        clock.reset_stats();
        let frames_before = clock.frames();

        match session.scheduler()? {
            Some(mut scheduler) => reveal(&mut scheduler, &mut clock, &mut tally, options.fast),
            None => {
                session.emit_all(&mut tally);
            }
        }

        if let (Some(dir), Some(previews)) = (&options.preview_dir, session.previews()) {
            let written =
                write_previews(dir, session.generation(), session.dimensions(), previews)?;
            if !written.is_empty() {
                tracing::info!(count = written.len(), dir = %dir.display(), "previews written");
            }
        }

        report(session, &tally, &names, clock.frames() - frames_before);

        let stats = clock.stats();
        if stats.steps > 0 {
            tracing::debug!(
                frame_us = clock.frame_duration().as_micros() as u64,
                mean_us = stats.mean().as_micros() as u64,
                fastest_us = stats.fastest.as_micros() as u64,
                slowest_us = stats.slowest.as_micros() as u64,
                overruns = stats.overruns,
                "reveal timing"
            );
        }
    }

    tracing::info!(
        passes = generator.generation(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         TERRAGRID                                                ║");
    println!("║         PROCEDURAL TILE WORLDS                                   ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "invalid arguments");
            print_help();
            return ExitCode::FAILURE;
        }
    };

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "generation refused");
            ExitCode::FAILURE
        }
    }
}

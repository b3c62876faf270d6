//! OnMove session CLI application.
//!
//! Lists the sessions of an OnMove 500 / 500 HR export directory and dumps
//! their tracks to CSV.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use onmove_core::{output, DecodeStats, SessionCatalog, Variant};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

/// Session extractor for OnMove 500 / 500 HR GPS watches.
///
/// Reads the .OMH/.OMD file pairs of a watch export directory.
#[derive(Parser, Debug)]
#[command(name = "onmove")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the .OMH/.OMD files
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Watch model.
    ///
    /// - "onmove500": fixed-stride bodies
    /// - "onmove500hr": sentinel-delimited bodies with heart rate
    #[arg(short, long, default_value = "onmove500")]
    device: String,

    /// Directory to write CSV files into (summary.csv plus one file per session)
    ///
    /// Without it, sessions are only listed.
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Only decode the track of this session number
    #[arg(short, long, value_name = "NUM")]
    session: Option<u32>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(args: &Args) {
    let level = match (args.quiet, args.verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, _) => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let variant = Variant::from_str(&args.device).context("Invalid device")?;
    let start_time = Instant::now();

    let mut catalog = SessionCatalog::open(&args.path, variant)
        .with_context(|| format!("Failed to list sessions in {:?}", args.path))?;

    for session in catalog.sessions() {
        let s = &session.summary;
        println!(
            "{:>3}  {:<16} {}  {:>6}s  {:>7}m  {:>5} pts",
            session.number,
            session.id.to_string(),
            s.start_time.format("%Y-%m-%d %H:%M"),
            s.duration_seconds,
            s.distance_meters,
            s.point_count
        );
    }
    for (id, e) in catalog.rejected() {
        eprintln!("Discarded {}: {}", id, e);
    }

    let Some(out_dir) = &args.output else {
        return Ok(());
    };
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {:?}", out_dir))?;

    let numbers: Vec<u32> = match args.session {
        Some(n) => vec![n],
        None => catalog.sessions().iter().map(|s| s.number).collect(),
    };

    // Setup progress bar
    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(numbers.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}")?,
        );
        pb
    };

    let mut totals = DecodeStats::default();
    for number in numbers {
        let session = catalog
            .load_track(number)
            .with_context(|| format!("Failed to load session {}", number))?;
        progress.set_message(session.id.to_string());

        let csv_path = out_dir.join(format!("{}.csv", session.id));
        output::write_track_csv(&csv_path, session)
            .with_context(|| format!("Failed to write {:?}", csv_path))?;

        if let Some(track) = &session.track {
            totals += track.stats;
        }
        progress.inc(1);
    }

    let summary_path = out_dir.join("summary.csv");
    output::write_summary_csv(&summary_path, catalog.sessions())
        .context("Failed to write summary CSV")?;

    let total_duration = start_time.elapsed();
    progress.finish_with_message(format!(
        "Done! Decoded {} points in {:.2}s",
        totals.points,
        total_duration.as_secs_f64()
    ));

    if !args.quiet {
        eprintln!();
        eprintln!("Summary:");
        eprintln!("  Input:        {:?}", args.path);
        eprintln!("  Output:       {:?}", out_dir);
        eprintln!("  Device:       {}", variant);
        eprintln!("  Sessions:     {}", catalog.len());
        eprintln!("  Points:       {}", totals.points);
        eprintln!("  Skipped:      {} lines", totals.unrecognized_lines);
        eprintln!(
            "  Dropped:      {} points, {} bytes",
            totals.truncated_points, totals.trailing_bytes
        );
        eprintln!("  Duration:     {:.3}s", total_duration.as_secs_f64());
    }

    Ok(())
}

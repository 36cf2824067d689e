use clap::Parser;
use serde::Serialize;
use std::fs;
use std::io::{self, prelude::*};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tletypes::prelude::*;
use tracker_lib::{
    batch::resolve_all_parallel, config::Config, PositionResolver, Sgp4Propagator,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version)]
struct Opts {
    /// Tracker configuration toml file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resolve positions at this RFC 3339 instant instead of the current time
    #[arg(long, conflicts_with = "watch")]
    at: Option<UtcTimestamp>,

    /// Print one JSON object per record instead of text
    #[arg(long)]
    json: bool,

    /// Re-resolve at the current time on this interval (e.g. '500ms', '5s')
    /// until interrupted
    #[arg(long, value_parser = humantime::parse_duration)]
    watch: Option<Duration>,

    /// Plain-text three-line element set feed, '-' reads stdin
    feed: PathBuf,
}

#[derive(Serialize)]
struct OutputRow<'a> {
    name: &'a str,
    instant: &'a UtcTimestamp,
    #[serde(flatten)]
    outcome: &'a ResolutionOutcome,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let opts = Opts::parse();

    let cfg = match opts.config.as_ref() {
        Some(p) => Config::load(p)?,
        None => Config::default(),
    };

    let raw = if opts.feed.as_os_str() == "-" {
        let mut s = String::new();
        io::stdin().read_to_string(&mut s)?;
        s
    } else {
        fs::read_to_string(&opts.feed)?
    };

    let records = cfg.select(&tlefeed::parse_element_set(&raw))?;
    info!(records = records.len(), "Loaded element sets");

    let propagator = Sgp4Propagator::new().with_max_epoch_age(cfg.max_epoch_age()?);
    let resolver = PositionResolver::new(propagator).with_line_checks(cfg.verify_checksums());
    let workers = cfg.workers()?;

    let mut stdout = io::stdout().lock();

    let Some(interval) = opts.watch else {
        let instant = opts.at.unwrap_or_else(chrono::Utc::now);
        let outcomes = resolve_all_parallel(&resolver, &records, &instant, workers);
        return print_outcomes(&mut stdout, &records, &instant, &outcomes, opts.json);
    };

    let intr = interruptor::Interruptor::new();
    let intr_clone = intr.clone();
    ctrlc::set_handler(move || {
        if intr_clone.is_set() {
            // 128 + SIGINT
            std::process::exit(130);
        } else {
            intr_clone.set();
        }
    })?;

    while !intr.is_set() {
        let started = Instant::now();
        let instant = chrono::Utc::now();
        let outcomes = resolve_all_parallel(&resolver, &records, &instant, workers);
        print_outcomes(&mut stdout, &records, &instant, &outcomes, opts.json)?;

        // Sleep in short slices so an interrupt is noticed promptly
        while !intr.is_set() && started.elapsed() < interval {
            let remaining = interval.saturating_sub(started.elapsed());
            std::thread::sleep(remaining.min(Duration::from_millis(100)));
        }
    }

    Ok(())
}

fn print_outcomes<W: Write>(
    out: &mut W,
    records: &[ElementRecord],
    instant: &UtcTimestamp,
    outcomes: &[ResolutionOutcome],
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    for (record, outcome) in records.iter().zip(outcomes.iter()) {
        if json {
            let row = OutputRow {
                name: &record.name,
                instant,
                outcome,
            };
            writeln!(out, "{}", serde_json::to_string(&row)?)?;
        } else {
            match outcome {
                ResolutionOutcome::Position(p) => writeln!(out, "{:<24} {p}", record.name)?,
                ResolutionOutcome::Failure(f) => {
                    writeln!(out, "{:<24} {}: {}", record.name, f.kind, f.detail)?
                }
            }
        }
    }
    out.flush()?;
    Ok(())
}

mod interruptor {
    use std::sync::atomic::{AtomicBool, Ordering::SeqCst};
    use std::sync::Arc;

    #[derive(Clone, Debug)]
    #[repr(transparent)]
    pub struct Interruptor(Arc<AtomicBool>);

    impl Interruptor {
        pub fn new() -> Self {
            Interruptor(Arc::new(AtomicBool::new(false)))
        }

        pub fn set(&self) {
            self.0.store(true, SeqCst);
        }

        pub fn is_set(&self) -> bool {
            self.0.load(SeqCst)
        }
    }

    impl Default for Interruptor {
        fn default() -> Self {
            Self::new()
        }
    }
}

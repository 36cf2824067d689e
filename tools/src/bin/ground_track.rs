// cargo run --bin ground-track --release -- --catalog-number 25544 --duration 5400 --dt 10.0 stations.txt /tmp/iss_track.txt

use clap::{ArgGroup, Parser};
use std::fs::{self, File};
use std::io::prelude::*;
use std::path::PathBuf;

use tletypes::prelude::*;
use tracker_lib::{
    batch::{instants, resolve_track, track_len, MAX_TRACK_LEN},
    units::Time,
    PositionResolver, Sgp4Propagator,
};

/// Write the ground track of one object over a time span
#[derive(Parser, Debug)]
#[command(version)]
#[command(group(ArgGroup::new("select").required(true).args(["name", "catalog_number"])))]
struct Opts {
    /// Record name, as it appears in the feed
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// NORAD catalog number
    #[arg(short = 'i', long)]
    catalog_number: Option<u32>,

    /// Start instant (RFC 3339), defaults to the element set epoch
    #[arg(short = 's', long)]
    start: Option<UtcTimestamp>,

    /// Duration in seconds
    #[arg(short = 'd', long)]
    duration: f64,

    /// Time step (dt) in seconds
    #[arg(short = 't', long)]
    dt: f64,

    /// Plain-text three-line element set feed
    feed: PathBuf,

    /// Output file path to write
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let opts = Opts::parse();

    let records = tlefeed::parse_element_set(&fs::read_to_string(&opts.feed)?);
    let record = records
        .iter()
        .find(|r| match (&opts.name, opts.catalog_number) {
            (Some(name), _) => &r.name == name,
            (None, Some(id)) => r.catalog_number() == Some(id),
            (None, None) => false,
        })
        .ok_or("No record in the feed matches the selection")?;

    let start = match opts.start {
        Some(t) => t,
        None => tlefeed::epoch(&record.line1)?,
    };
    let step = Time::from_secs(opts.dt);
    let count = track_len(Time::from_secs(opts.duration), step).ok_or_else(|| {
        format!(
            "dt must be positive and duration non-negative, with at most {MAX_TRACK_LEN} instants"
        )
    })?;
    let ts = instants(&start, step, count)
        .ok_or("Track extends past the representable time range")?;

    let resolver = PositionResolver::new(Sgp4Propagator::new()).with_line_checks(true);
    let track = resolve_track(&resolver, record, &ts);

    let mut output = File::create(opts.output)?;
    for (t, outcome) in ts.iter().zip(track.iter()) {
        match outcome {
            ResolutionOutcome::Position(p) => writeln!(
                &mut output,
                "{} {} {} {}",
                t.to_rfc3339(),
                p.latitude_deg,
                p.longitude_deg,
                p.altitude_km
            )?,
            ResolutionOutcome::Failure(f) => {
                writeln!(&mut output, "{} {} {}", t.to_rfc3339(), f.kind, f.detail)?
            }
        }
    }

    Ok(())
}

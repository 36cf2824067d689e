//! Fan-out over many records or many instants.
//!
//! Each resolution depends only on its arguments, so work can run in any order.
//! Results always come back in input order.

use std::num::NonZeroUsize;

use tletypes::prelude::*;

use crate::{
    resolver::PositionResolver,
    units::{offset, Time},
    PropagationCapability,
};

/// One outcome per record, in record order
pub fn resolve_all<P: PropagationCapability>(
    resolver: &PositionResolver<P>,
    records: &[ElementRecord],
    instant: &UtcTimestamp,
) -> Vec<ResolutionOutcome> {
    records
        .iter()
        .map(|record| resolver.resolve(record, instant))
        .collect()
}

/// One outcome per instant, in instant order
pub fn resolve_track<P: PropagationCapability>(
    resolver: &PositionResolver<P>,
    record: &ElementRecord,
    instants: &[UtcTimestamp],
) -> Vec<ResolutionOutcome> {
    instants
        .iter()
        .map(|instant| resolver.resolve(record, instant))
        .collect()
}

/// `resolve_all` split across scoped worker threads
pub fn resolve_all_parallel<P>(
    resolver: &PositionResolver<P>,
    records: &[ElementRecord],
    instant: &UtcTimestamp,
    workers: NonZeroUsize,
) -> Vec<ResolutionOutcome>
where
    P: PropagationCapability + Sync,
{
    if workers.get() == 1 || records.len() < 2 {
        return resolve_all(resolver, records, instant);
    }

    let chunk_size = records.len().div_ceil(workers.get());
    std::thread::scope(|scope| {
        let handles: Vec<_> = records
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || resolve_all(resolver, chunk, instant)))
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    })
}

/// Longest track `track_len` will plan
pub const MAX_TRACK_LEN: usize = 1 << 24;

/// `count` instants starting at `start`, `step` apart. `None` when any of them
/// falls outside the representable range.
pub fn instants(start: &UtcTimestamp, step: Time, count: usize) -> Option<Vec<UtcTimestamp>> {
    (0..count)
        .map(|i| offset(start, i as f64 * step))
        .collect()
}

/// Number of instants covering `duration` in `step` increments, both ends
/// included. `None` for a non-positive step, a negative or non-finite duration,
/// or more than `MAX_TRACK_LEN` instants.
pub fn track_len(duration: Time, step: Time) -> Option<usize> {
    let (duration, step) = (duration.as_secs(), step.as_secs());
    if !(step > 0.0) || !(duration >= 0.0) || !duration.is_finite() {
        return None;
    }
    let steps = (duration / step).floor();
    if !steps.is_finite() || steps >= MAX_TRACK_LEN as f64 {
        return None;
    }
    Some(steps as usize + 1)
}

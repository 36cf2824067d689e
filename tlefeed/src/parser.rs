//! A forgiving parser for plain-text, three-line element set feeds
//!
//! Feeds come from an external and occasionally inconsistent source, so parsing
//! never fails. Malformed or truncated input yields fewer records.

use crate::LINE_DELIMITER;
use nom::{
    bytes::complete::take_till,
    character::complete::char,
    combinator::{eof, not, opt},
    multi::fold_many0,
    IResult,
};
use tletypes::prelude::*;
use tracing::debug;

/// Lines per record: name, line 1, line 2
const RECORD_STRIDE: usize = 3;

/// Split a feed into records, in feed order.
///
/// Blank lines are discarded before grouping, so stray separators never shift
/// record boundaries. A trailing group of one or two lines is dropped.
/// Records sharing a name are all kept.
pub fn parse_element_set(raw: &str) -> Vec<ElementRecord> {
    let lines = match content_lines(raw) {
        Ok((_, lines)) => lines,
        Err(e) => {
            debug!(error = %e, "Element set feed could not be split into lines");
            return Vec::new();
        }
    };

    let leftover = lines.len() % RECORD_STRIDE;
    if leftover != 0 {
        debug!(
            lines = leftover,
            "Dropping trailing partial element set from feed"
        );
    }

    lines
        .chunks_exact(RECORD_STRIDE)
        .map(|group| ElementRecord::new(group[0], group[1], group[2]))
        .collect()
}

fn content_lines(s: &str) -> IResult<&str, Vec<&str>> {
    fold_many0(raw_line, Vec::new, |mut lines: Vec<&str>, line| {
        if !line.trim().is_empty() {
            lines.push(line);
        }
        lines
    })(s)
}

fn raw_line(s: &str) -> IResult<&str, &str> {
    // Always consume something, fold_many0 rejects empty matches
    let (s, _) = not(eof)(s)?;
    let (s, line) = take_till(|c| c == LINE_DELIMITER)(s)?;
    let (s, _) = opt(char(LINE_DELIMITER))(s)?;
    Ok((s, line.trim_end_matches('\r')))
}

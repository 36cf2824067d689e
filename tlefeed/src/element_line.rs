//! Lexical checks for the two fixed-format element lines
//!
//! Only the columns needed to catch transport damage are read: the line number,
//! the catalog number, the classification and the modulo-10 checksum.
//! Everything else is left to the propagator.

use crate::LINE_LENGTH;
use chrono::{Duration, NaiveDate};
use nom::{
    bytes::complete::take,
    character::complete::{char, one_of, satisfy},
    combinator::map,
    error::ErrorKind,
    Err::Error,
};
use tletypes::prelude::*;

pub type Result<I, O, E = LineError> = std::result::Result<(I, O), nom::Err<E>>;

/// Column span (0-based, exclusive end) of the epoch year and day-of-year in line 1
const EPOCH_YEAR: std::ops::Range<usize> = 18..20;
const EPOCH_DAY: std::ops::Range<usize> = 20..32;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LineError {
    #[error("Element line is empty")]
    Empty,
    #[error("Element line must be 69 ASCII characters, found {found}")]
    Length { found: usize },
    #[error("Expected element line {expected}")]
    LineNumber { expected: LineNumber },
    #[error("Invalid catalog number")]
    CatalogNumber,
    #[error("Invalid classification, expected one of 'U', 'C' or 'S'")]
    Classification,
    #[error("Checksum mismatch, computed {expected} but line carries {found}")]
    Checksum { expected: u8, found: u8 },
    #[error("Catalog number mismatch between line 1 ({line1}) and line 2 ({line2})")]
    CatalogMismatch { line1: u32, line2: u32 },
    #[error("Invalid epoch")]
    Epoch,
    #[error("Parse error ({0:?})")]
    Nom(ErrorKind),
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LineNumber {
    One,
    Two,
}

impl LineNumber {
    fn as_char(self) -> char {
        match self {
            LineNumber::One => '1',
            LineNumber::Two => '2',
        }
    }
}

impl std::fmt::Display for LineNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// The lexically validated parts of an element line
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ElementLine {
    pub number: LineNumber,
    pub catalog_number: u32,
    /// Only carried by line 1
    pub classification: Option<char>,
    pub checksum: u8,
}

pub fn check_element_line(
    line: &str,
    expected: LineNumber,
) -> std::result::Result<ElementLine, LineError> {
    if line.is_empty() {
        return Err(LineError::Empty);
    }
    if !line.is_ascii() || line.len() != LINE_LENGTH {
        return Err(LineError::Length {
            found: line.chars().count(),
        });
    }

    let (_, parsed) = element_line(line, expected).map_err(flatten)?;

    let computed = checksum(&line[..LINE_LENGTH - 1]);
    if computed != parsed.checksum {
        return Err(LineError::Checksum {
            expected: computed,
            found: parsed.checksum,
        });
    }

    Ok(parsed)
}

/// Check both lines of a record and that they describe the same object
pub fn check_element_pair(
    line1: &str,
    line2: &str,
) -> std::result::Result<(ElementLine, ElementLine), LineError> {
    let l1 = check_element_line(line1, LineNumber::One)?;
    let l2 = check_element_line(line2, LineNumber::Two)?;
    if l1.catalog_number != l2.catalog_number {
        return Err(LineError::CatalogMismatch {
            line1: l1.catalog_number,
            line2: l2.catalog_number,
        });
    }
    Ok((l1, l2))
}

/// The element set epoch carried by line 1.
///
/// Two-digit years below 57 are in the 2000s.
pub fn epoch(line1: &str) -> std::result::Result<UtcTimestamp, LineError> {
    let year = line1
        .get(EPOCH_YEAR)
        .and_then(|y| y.parse::<i32>().ok())
        .ok_or(LineError::Epoch)?;
    let day = line1
        .get(EPOCH_DAY)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| (1.0..367.0).contains(d))
        .ok_or(LineError::Epoch)?;

    let year = if year < 57 { 2000 + year } else { 1900 + year };
    let start_of_year = NaiveDate::from_yo_opt(year, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or(LineError::Epoch)?;
    let offset = Duration::microseconds(((day - 1.0) * 86_400e6).round() as i64);

    Ok((start_of_year + offset).and_utc())
}

/// Sum of all digits, plus one per minus sign, modulo 10
fn checksum(s: &str) -> u8 {
    let sum: u32 = s
        .chars()
        .map(|c| match c {
            '-' => 1,
            c => c.to_digit(10).unwrap_or(0),
        })
        .sum();
    (sum % 10) as u8
}

fn flatten(e: nom::Err<LineError>) -> LineError {
    match e {
        nom::Err::Error(e) | nom::Err::Failure(e) => e,
        nom::Err::Incomplete(_) => LineError::Nom(ErrorKind::Complete),
    }
}

fn element_line(line: &str, expected: LineNumber) -> Result<&str, ElementLine> {
    let (s, _) = line_number(line, expected)?;
    let (s, catalog_number) = catalog_number(s)?;
    let (_, classification) = match expected {
        LineNumber::One => map(classification, Some)(s)?,
        LineNumber::Two => map(char(' '), |_| None::<char>)(s)?,
    };
    let (s, checksum) = checksum_digit(&line[LINE_LENGTH - 1..])?;
    Ok((
        s,
        ElementLine {
            number: expected,
            catalog_number,
            classification,
            checksum,
        },
    ))
}

fn line_number(s: &str, expected: LineNumber) -> Result<&str, char> {
    let (s, n) = char::<_, LineError>(expected.as_char())(s)
        .map_err(|_| Error(LineError::LineNumber { expected }))?;
    let (s, _) = char(' ')(s)?;
    Ok((s, n))
}

/// Five columns, either all digits (blank padded) or an Alpha-5 letter followed
/// by four digits.
fn catalog_number(s: &str) -> Result<&str, u32> {
    let (s, field) = take::<_, _, LineError>(5usize)(s)?;
    let number = decode_catalog_number(field).ok_or(Error(LineError::CatalogNumber))?;
    Ok((s, number))
}

fn decode_catalog_number(field: &str) -> Option<u32> {
    let mut chars = field.chars();
    let lead = chars.next()?;
    let rest = chars.as_str();
    if lead.is_ascii_uppercase() {
        // Alpha-5 skips I and O, A = 10
        let offset = match lead {
            'I' | 'O' => return None,
            'A'..='H' => 0,
            'J'..='N' => 1,
            _ => 2,
        };
        let value = lead as u32 - 'A' as u32 + 10 - offset;
        if rest.len() != 4 || !rest.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(value * 10_000 + rest.parse::<u32>().ok()?)
    } else {
        let digits = field.trim_start();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

fn classification(s: &str) -> Result<&str, char> {
    one_of::<_, _, LineError>("UCS")(s).map_err(|_| Error(LineError::Classification))
}

fn checksum_digit(s: &str) -> Result<&str, u8> {
    let (s, d) = satisfy(|c| c.is_ascii_digit())(s)?;
    Ok((s, d as u8 - b'0'))
}

impl<I> nom::error::ParseError<I> for LineError {
    fn from_error_kind(_: I, kind: ErrorKind) -> Self {
        LineError::Nom(kind)
    }

    fn append(_: I, _: ErrorKind, other: Self) -> Self {
        other
    }
}

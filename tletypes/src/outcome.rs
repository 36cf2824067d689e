use derive_more::Display;
use serde::Serialize;

use crate::position::Position;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Element lines missing, empty, or rejected by the propagator's state builder
    #[display(fmt = "malformed record")]
    MalformedRecord,

    /// The propagator ran but has no valid solution for the instant
    /// (decayed object, elements far past their epoch)
    #[display(fmt = "propagation unavailable")]
    PropagationUnavailable,

    /// The propagator raised an unexpected error
    #[display(fmt = "propagation error")]
    PropagationError,
}

#[derive(Clone, PartialEq, Debug, Serialize, thiserror::Error)]
#[error("{record_name}: {kind}, {detail}")]
pub struct Failure {
    pub kind: FailureKind,
    pub detail: String,
    pub record_name: String,
}

impl Failure {
    pub fn new<D: Into<String>, N: Into<String>>(kind: FailureKind, detail: D, record_name: N) -> Self {
        Self {
            kind,
            detail: detail.into(),
            record_name: record_name.into(),
        }
    }
}

/// Result of resolving one record at one instant. There are no partial positions.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ResolutionOutcome {
    Position(Position),
    Failure(Failure),
}

impl ResolutionOutcome {
    pub fn is_position(&self) -> bool {
        matches!(self, ResolutionOutcome::Position(_))
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            ResolutionOutcome::Position(p) => Some(p),
            ResolutionOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            ResolutionOutcome::Position(_) => None,
            ResolutionOutcome::Failure(f) => Some(f),
        }
    }

    pub fn into_result(self) -> Result<Position, Failure> {
        match self {
            ResolutionOutcome::Position(p) => Ok(p),
            ResolutionOutcome::Failure(f) => Err(f),
        }
    }
}

impl From<Position> for ResolutionOutcome {
    fn from(value: Position) -> Self {
        ResolutionOutcome::Position(value)
    }
}

impl From<Failure> for ResolutionOutcome {
    fn from(value: Failure) -> Self {
        ResolutionOutcome::Failure(value)
    }
}

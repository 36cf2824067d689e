use tletypes::prelude::*;

pub mod batch;
pub mod config;
pub mod resolver;
pub mod sgp4_capability;
pub mod units;

pub use crate::resolver::{resolve, PositionResolver};
pub use crate::sgp4_capability::Sgp4Propagator;

/// A numerical propagator, injected into the `PositionResolver`.
///
/// Implementations are expected to be pure: the same inputs always produce the
/// same outputs, so callers may invoke them concurrently and in any order.
pub trait PropagationCapability {
    /// Whatever the numerical method needs, built from the two element lines.
    type State;

    /// The unit of `GeodeticVector::height` produced by `eci_to_geodetic`.
    const HEIGHT_UNIT: HeightUnit;

    fn build_state(&self, line1: &str, line2: &str) -> Result<Self::State, BuildError>;

    /// `Ok(None)` means the model ran but has no solution for the instant,
    /// e.g. the object has decayed.
    fn propagate(
        &self,
        state: &Self::State,
        instant: &UtcTimestamp,
    ) -> Result<Option<EciVector>, PropagationError>;

    /// Must account for Earth's rotation at `instant`.
    fn eci_to_geodetic(&self, eci: &EciVector, instant: &UtcTimestamp) -> GeodeticVector;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct BuildError(pub String);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct PropagationError(pub String);

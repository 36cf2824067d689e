//! Resolves element records into geographic positions through an injected
//! `PropagationCapability`.
//!
//! Every failure is caught here and classified into a `FailureKind`. Nothing
//! escapes `resolve` and no placeholder coordinates are ever produced.

use tletypes::prelude::*;
use tracing::{debug, warn};

use crate::{
    units::{Angle, Length},
    BuildError, PropagationCapability, PropagationError,
};

/// Rounding noise tolerated at the poles when converting radians to degrees
const LATITUDE_SLOP_DEG: f64 = 1e-9;

#[derive(Debug, thiserror::Error)]
enum ResolveError {
    #[error("Element line 1 is empty")]
    EmptyLine1,
    #[error("Element line 2 is empty")]
    EmptyLine2,
    #[error(transparent)]
    Lexical(#[from] tlefeed::LineError),
    #[error("Propagator rejected the element set. {0}")]
    Build(#[from] BuildError),
    #[error("No solution at {0}")]
    NoSolution(UtcTimestamp),
    #[error("Propagator failed. {0}")]
    Propagation(#[from] PropagationError),
    #[error("Propagator produced a non-finite position vector")]
    NonFiniteVector,
    #[error("Geodetic conversion produced an invalid result {0}")]
    InvalidGeodetic(GeodeticVector),
}

impl ResolveError {
    fn kind(&self) -> FailureKind {
        use ResolveError::*;
        match self {
            EmptyLine1 | EmptyLine2 | Lexical(_) | Build(_) => FailureKind::MalformedRecord,
            NoSolution(_) => FailureKind::PropagationUnavailable,
            Propagation(_) | NonFiniteVector | InvalidGeodetic(_) => {
                FailureKind::PropagationError
            }
        }
    }
}

/// Turns `(record, instant)` pairs into `ResolutionOutcome`s.
///
/// Holds no state besides the capability, so a shared reference can be used
/// from many threads at once when the capability is `Sync`.
#[derive(Debug, Clone)]
pub struct PositionResolver<P> {
    propagator: P,
    check_lines: bool,
}

impl<P: PropagationCapability> PositionResolver<P> {
    pub fn new(propagator: P) -> Self {
        Self {
            propagator,
            check_lines: false,
        }
    }

    /// Run the lexical line-number, catalog number and checksum checks before
    /// handing lines to the propagator.
    pub fn with_line_checks(mut self, enabled: bool) -> Self {
        self.check_lines = enabled;
        self
    }

    pub fn propagator(&self) -> &P {
        &self.propagator
    }

    pub fn resolve(&self, record: &ElementRecord, instant: &UtcTimestamp) -> ResolutionOutcome {
        match self.try_resolve(record, instant) {
            Ok(position) => {
                debug!(
                    name = record.name.as_str(),
                    %instant,
                    lat = position.latitude_deg,
                    lon = position.longitude_deg,
                    alt_km = position.altitude_km,
                    "Resolved position"
                );
                ResolutionOutcome::Position(position)
            }
            Err(e) => {
                let failure = Failure::new(e.kind(), e.to_string(), record.name.as_str());
                warn!(
                    name = record.name.as_str(),
                    %instant,
                    kind = %failure.kind,
                    detail = failure.detail.as_str(),
                    "Position unavailable"
                );
                ResolutionOutcome::Failure(failure)
            }
        }
    }

    fn try_resolve(
        &self,
        record: &ElementRecord,
        instant: &UtcTimestamp,
    ) -> Result<Position, ResolveError> {
        // Fields are public, so a record may not have come through `ElementRecord::new`
        if record.line1.trim().is_empty() {
            return Err(ResolveError::EmptyLine1);
        }
        if record.line2.trim().is_empty() {
            return Err(ResolveError::EmptyLine2);
        }
        if self.check_lines {
            tlefeed::check_element_pair(&record.line1, &record.line2)?;
        }

        let state = self.propagator.build_state(&record.line1, &record.line2)?;

        let eci = self
            .propagator
            .propagate(&state, instant)?
            .ok_or(ResolveError::NoSolution(*instant))?;
        if !eci.iter().all(|c| c.is_finite()) {
            return Err(ResolveError::NonFiniteVector);
        }

        // Sidereal time must come from the same instant used for propagation
        let geodetic = self.propagator.eci_to_geodetic(&eci, instant);
        geodetic_to_position(geodetic, P::HEIGHT_UNIT)
    }
}

/// Resolve one record with a borrowed capability
pub fn resolve<P: PropagationCapability>(
    record: &ElementRecord,
    instant: &UtcTimestamp,
    propagator: &P,
) -> ResolutionOutcome {
    PositionResolver::new(propagator).resolve(record, instant)
}

impl<P: PropagationCapability> PropagationCapability for &P {
    type State = P::State;
    const HEIGHT_UNIT: HeightUnit = P::HEIGHT_UNIT;

    fn build_state(&self, line1: &str, line2: &str) -> Result<Self::State, BuildError> {
        (**self).build_state(line1, line2)
    }

    fn propagate(
        &self,
        state: &Self::State,
        instant: &UtcTimestamp,
    ) -> Result<Option<EciVector>, PropagationError> {
        (**self).propagate(state, instant)
    }

    fn eci_to_geodetic(&self, eci: &EciVector, instant: &UtcTimestamp) -> GeodeticVector {
        (**self).eci_to_geodetic(eci, instant)
    }
}

fn geodetic_to_position(g: GeodeticVector, unit: HeightUnit) -> Result<Position, ResolveError> {
    let finite = g.latitude_rad.is_finite() && g.longitude_rad.is_finite() && g.height.is_finite();
    let latitude = Angle::from_radians(g.latitude_rad);
    if !finite || latitude.as_degrees().abs() > 90.0 + LATITUDE_SLOP_DEG {
        return Err(ResolveError::InvalidGeodetic(g));
    }

    Ok(Position {
        latitude_deg: latitude.as_degrees().clamp(-90.0, 90.0),
        longitude_deg: Angle::from_radians(g.longitude_rad)
            .wrap_longitude()
            .as_degrees(),
        altitude_km: Length::from_height(g.height, unit).as_kilometers(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;
    use std::f64::consts::{FRAC_PI_2, PI};
    use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};
    use std::sync::Mutex;

    const EARTH_RADIUS_KM: f64 = 6378.137;

    /// Spherical-earth test double keyed on line 1
    #[derive(Default)]
    struct StubPropagator {
        build_calls: AtomicUsize,
        instants: Mutex<Vec<(&'static str, usize)>>,
        longitude_offset_rad: f64,
    }

    impl PropagationCapability for StubPropagator {
        type State = String;
        const HEIGHT_UNIT: HeightUnit = HeightUnit::Kilometers;

        fn build_state(&self, line1: &str, _line2: &str) -> Result<String, BuildError> {
            self.build_calls.fetch_add(1, SeqCst);
            if line1 == "BAD" {
                Err(BuildError("checksum".to_string()))
            } else {
                Ok(line1.to_string())
            }
        }

        fn propagate(
            &self,
            state: &String,
            instant: &UtcTimestamp,
        ) -> Result<Option<EciVector>, PropagationError> {
            self.instants
                .lock()
                .unwrap()
                .push(("propagate", instant as *const _ as usize));
            match state.as_str() {
                "DECAYED" => Ok(None),
                "DIVERGED" => Err(PropagationError("diverged".to_string())),
                "NAN" => Ok(Some(EciVector::new(f64::NAN, 0.0, 0.0))),
                "ORIGIN" => Ok(Some(EciVector::new(0.0, 0.0, 0.0))),
                _ => Ok(Some(EciVector::new(0.0, EARTH_RADIUS_KM + 400.0, 0.0))),
            }
        }

        fn eci_to_geodetic(&self, eci: &EciVector, instant: &UtcTimestamp) -> GeodeticVector {
            self.instants
                .lock()
                .unwrap()
                .push(("eci_to_geodetic", instant as *const _ as usize));
            let r = eci.norm();
            GeodeticVector {
                latitude_rad: (eci.z / r).asin(),
                longitude_rad: eci.y.atan2(eci.x) + self.longitude_offset_rad,
                height: r - EARTH_RADIUS_KM,
            }
        }
    }

    struct MetersPropagator;

    impl PropagationCapability for MetersPropagator {
        type State = ();
        const HEIGHT_UNIT: HeightUnit = HeightUnit::Meters;

        fn build_state(&self, _: &str, _: &str) -> Result<(), BuildError> {
            Ok(())
        }

        fn propagate(&self, _: &(), _: &UtcTimestamp) -> Result<Option<EciVector>, PropagationError> {
            Ok(Some(EciVector::new(1.0, 0.0, 0.0)))
        }

        fn eci_to_geodetic(&self, _: &EciVector, _: &UtcTimestamp) -> GeodeticVector {
            GeodeticVector {
                latitude_rad: -FRAC_PI_2,
                longitude_rad: PI,
                height: 408_500.0,
            }
        }
    }

    fn instant() -> UtcTimestamp {
        chrono::Utc.with_ymd_and_hms(2023, 7, 9, 12, 0, 0).unwrap()
    }

    fn record(line1: &str) -> ElementRecord {
        ElementRecord::new("SAT", line1, "LINE2")
    }

    fn failure_kind(outcome: &ResolutionOutcome) -> FailureKind {
        outcome.failure().expect("expected a failure").kind
    }

    #[test]
    fn empty_lines_never_reach_the_propagator() {
        let p = StubPropagator::default();
        let r = PositionResolver::new(&p);
        let t = instant();

        for rec in [
            ElementRecord::new("SAT", "", "LINE2"),
            ElementRecord::new("SAT", "LINE1", ""),
            ElementRecord::new("SAT", "   ", "\t"),
        ] {
            let outcome = r.resolve(&rec, &t);
            assert_eq!(failure_kind(&outcome), FailureKind::MalformedRecord);
            assert_eq!(outcome.failure().unwrap().record_name, "SAT");
        }
        assert_eq!(p.build_calls.load(SeqCst), 0);
        assert!(p.instants.lock().unwrap().is_empty());
    }

    #[test]
    fn untrimmed_blank_lines_never_reach_the_propagator() {
        let p = StubPropagator::default();
        let t = instant();
        for rec in [
            ElementRecord {
                name: "SAT".to_string(),
                line1: "   ".to_string(),
                line2: "LINE2".to_string(),
            },
            ElementRecord {
                name: "SAT".to_string(),
                line1: "LINE1".to_string(),
                line2: "\t\r\n".to_string(),
            },
        ] {
            let outcome = resolve(&rec, &t, &p);
            assert_eq!(failure_kind(&outcome), FailureKind::MalformedRecord);
        }
        assert_eq!(p.build_calls.load(SeqCst), 0);
    }

    #[test]
    fn build_failure_is_malformed() {
        let outcome = resolve(&record("BAD"), &instant(), &StubPropagator::default());
        let f = outcome.failure().unwrap();
        assert_eq!(f.kind, FailureKind::MalformedRecord);
        assert!(f.detail.contains("checksum"));
    }

    #[test]
    fn no_solution_is_unavailable() {
        let outcome = resolve(&record("DECAYED"), &instant(), &StubPropagator::default());
        assert_eq!(failure_kind(&outcome), FailureKind::PropagationUnavailable);
        assert!(outcome.position().is_none());
    }

    #[test]
    fn raised_error_is_propagation_error() {
        let outcome = resolve(&record("DIVERGED"), &instant(), &StubPropagator::default());
        let f = outcome.failure().unwrap();
        assert_eq!(f.kind, FailureKind::PropagationError);
        assert!(f.detail.contains("diverged"));

        let outcome = resolve(&record("NAN"), &instant(), &StubPropagator::default());
        assert_eq!(failure_kind(&outcome), FailureKind::PropagationError);

        // Zero radius makes the stub's latitude NaN
        let outcome = resolve(&record("ORIGIN"), &instant(), &StubPropagator::default());
        assert_eq!(failure_kind(&outcome), FailureKind::PropagationError);
    }

    #[test]
    fn failures_never_look_like_the_origin() {
        let p = StubPropagator::default();
        for line1 in ["", "BAD", "DECAYED", "DIVERGED", "NAN", "ORIGIN"] {
            let outcome = resolve(&record(line1), &instant(), &p);
            assert!(outcome.position().is_none(), "{line1} produced a position");
        }
    }

    #[test]
    fn position() {
        let outcome = resolve(&record("OK"), &instant(), &StubPropagator::default());
        let p = outcome.position().unwrap();
        assert_relative_eq!(p.latitude_deg, 0.0);
        assert_relative_eq!(p.longitude_deg, 90.0);
        assert_relative_eq!(p.altitude_km, 400.0, epsilon = 1e-9);
    }

    #[test]
    fn longitude_is_normalized() {
        let p = StubPropagator {
            longitude_offset_rad: 3.0 * PI,
            ..Default::default()
        };
        let outcome = resolve(&record("OK"), &instant(), &p);
        let pos = outcome.position().unwrap();
        assert_relative_eq!(pos.longitude_deg, -90.0, epsilon = 1e-9);
        assert!((-180.0..=180.0).contains(&pos.longitude_deg));
        assert!((-90.0..=90.0).contains(&pos.latitude_deg));
    }

    #[test]
    fn height_unit_is_converted_once() {
        let outcome = resolve(&record("OK"), &instant(), &MetersPropagator);
        let p = outcome.position().unwrap();
        assert_relative_eq!(p.altitude_km, 408.5);
        assert_relative_eq!(p.latitude_deg, -90.0);
        assert_relative_eq!(p.longitude_deg, -180.0);
    }

    #[test]
    fn geodetic_conversion_uses_the_propagation_instant() {
        let p = StubPropagator::default();
        let t = instant();
        let outcome = resolve(&record("OK"), &t, &p);
        assert!(outcome.is_position());

        let calls = p.instants.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "propagate");
        assert_eq!(calls[1].0, "eci_to_geodetic");
        assert_eq!(calls[0].1, calls[1].1);
        assert_eq!(calls[0].1, &t as *const _ as usize);
    }

    #[test]
    fn deterministic() {
        let p = StubPropagator::default();
        let r = PositionResolver::new(&p);
        let t = instant();
        let rec = record("OK");
        assert_eq!(r.resolve(&rec, &t), r.resolve(&rec, &t));
    }

    #[test]
    fn line_checks() {
        let p = StubPropagator::default();
        let r = PositionResolver::new(&p).with_line_checks(true);
        let outcome = r.resolve(&record("OK"), &instant());
        assert_eq!(failure_kind(&outcome), FailureKind::MalformedRecord);
        assert!(outcome.failure().unwrap().detail.contains("69"));
        assert_eq!(p.build_calls.load(SeqCst), 0);
    }
}

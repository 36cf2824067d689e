//! SGP4/SDP4 propagation backed by the `sgp4` crate.
//!
//! SGP4 reports TEME positions in kilometers. Geodetic conversion rotates TEME
//! by Greenwich mean sidereal time into an Earth-fixed frame and hands the
//! result to `nav_types` for the WGS84 solution, which is in meters.

use std::f64::consts::TAU;

use nav_types::{ECEF, WGS84};
use tletypes::prelude::*;
use tracing::debug;

use crate::{
    units::{Length, Time},
    BuildError, PropagationCapability, PropagationError,
};

/// J2000 epoch in Julian days
const J2000_JD: f64 = 2_451_545.0;

/// Julian day of the Unix epoch
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

const DAY_S: f64 = 86_400.0;

const JULIAN_YEAR_DAYS: f64 = 365.25;

/// Greenwich mean sidereal time (IAU 1982), radians in [0, 2π).
///
/// UT1 is approximated by UTC.
pub fn gmst(instant: &UtcTimestamp) -> f64 {
    let jd = UNIX_EPOCH_JD + instant.timestamp_micros() as f64 / (DAY_S * 1e6);
    let years_since_j2000 = (jd - J2000_JD) / JULIAN_YEAR_DAYS;
    sgp4::iau_epoch_to_sidereal_time(years_since_j2000).rem_euclid(TAU)
}

/// Rotate a TEME vector into the Earth-fixed frame at `instant`
pub fn teme_to_ecef(teme: &EciVector, instant: &UtcTimestamp) -> EciVector {
    let (s, c) = gmst(instant).sin_cos();
    EciVector::new(
        c * teme.x + s * teme.y,
        -s * teme.x + c * teme.y,
        teme.z,
    )
}

/// Propagator state for one element set
pub struct Sgp4State {
    pub elements: sgp4::Elements,
    constants: sgp4::Constants,
}

#[derive(Debug, Clone, Default)]
pub struct Sgp4Propagator {
    max_epoch_age: Option<Time>,
}

impl Sgp4Propagator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report no solution for instants farther than `age` from the element
    /// epoch, in either direction. Accuracy degrades with distance from epoch.
    pub fn with_max_epoch_age(mut self, age: Option<Time>) -> Self {
        self.max_epoch_age = age;
        self
    }
}

impl PropagationCapability for Sgp4Propagator {
    type State = Sgp4State;
    const HEIGHT_UNIT: HeightUnit = HeightUnit::Meters;

    fn build_state(&self, line1: &str, line2: &str) -> Result<Sgp4State, BuildError> {
        let elements = sgp4::Elements::from_tle(None, line1.as_bytes(), line2.as_bytes())
            .map_err(|e| BuildError(format!("Invalid element set: {e:?}")))?;
        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| BuildError(format!("SGP4 initialization failed: {e:?}")))?;
        Ok(Sgp4State {
            elements,
            constants,
        })
    }

    fn propagate(
        &self,
        state: &Sgp4State,
        instant: &UtcTimestamp,
    ) -> Result<Option<EciVector>, PropagationError> {
        let minutes = state
            .elements
            .datetime_to_minutes_since_epoch(&instant.naive_utc())
            .map_err(|e| PropagationError(format!("Instant {instant} is out of range: {e:?}")))?;

        if let Some(max_age) = self.max_epoch_age {
            let age = Time::from_minutes(minutes.0).abs();
            if age > max_age {
                debug!(
                    norad_id = state.elements.norad_id,
                    age = ?age,
                    "Element set is too far from its epoch"
                );
                return Ok(None);
            }
        }

        // Every model error (eccentricity out of range, negative semi-latus
        // rectum) means the orbit has decayed or the elements are unusable
        // at this instant
        match state.constants.propagate(minutes) {
            Ok(prediction) => Ok(Some(EciVector::new(
                prediction.position[0],
                prediction.position[1],
                prediction.position[2],
            ))),
            Err(e) => {
                debug!(
                    norad_id = state.elements.norad_id,
                    error = ?e,
                    "SGP4 has no solution"
                );
                Ok(None)
            }
        }
    }

    fn eci_to_geodetic(&self, eci: &EciVector, instant: &UtcTimestamp) -> GeodeticVector {
        let ecef_km = teme_to_ecef(eci, instant);
        let ecef = ECEF::new(
            Length::from_kilometers(ecef_km.x).as_meters(),
            Length::from_kilometers(ecef_km.y).as_meters(),
            Length::from_kilometers(ecef_km.z).as_meters(),
        );
        let wgs = WGS84::from(ecef);
        GeodeticVector {
            latitude_rad: wgs.latitude_radians(),
            longitude_rad: wgs.longitude_radians(),
            height: wgs.altitude(),
        }
    }
}

//! A lightweight uom-ish set of quantities, just enough to pin the units
//! crossing the propagator boundary.

use std::ops::Mul;

use tletypes::prelude::{HeightUnit, UtcTimestamp};

#[derive(Copy, Clone, PartialEq, PartialOrd)]
pub struct Length {
    meters: f64,
}

impl std::fmt::Debug for Length {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} m", self.meters)
    }
}

impl Length {
    pub fn from_meters(meters: f64) -> Length {
        Length { meters }
    }

    pub fn from_kilometers(km: f64) -> Length {
        Length {
            meters: km * 1000.0,
        }
    }

    /// Interpret a raw height reported in `unit`
    pub fn from_height(height: f64, unit: HeightUnit) -> Length {
        match unit {
            HeightUnit::Meters => Length::from_meters(height),
            HeightUnit::Kilometers => Length::from_kilometers(height),
        }
    }

    pub fn as_meters(&self) -> f64 {
        self.meters
    }

    pub fn as_kilometers(&self) -> f64 {
        self.meters / 1000.0
    }
}

#[derive(Copy, Clone, PartialEq, PartialOrd)]
pub struct Time {
    seconds: f64,
}

impl std::fmt::Debug for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} s", self.seconds)
    }
}

impl Time {
    pub fn from_std_duration(duration: std::time::Duration) -> Time {
        Time {
            seconds: duration.as_secs_f64(),
        }
    }

    pub fn from_minutes(minutes: f64) -> Time {
        Self::from_secs(minutes * 60.0)
    }

    pub fn from_secs(seconds: f64) -> Time {
        Time { seconds }
    }

    pub fn as_secs(&self) -> f64 {
        self.seconds
    }

    pub fn abs(&self) -> Time {
        Time {
            seconds: self.seconds.abs(),
        }
    }
}

impl Mul<Time> for f64 {
    type Output = Time;

    fn mul(self, rhs: Time) -> Self::Output {
        Time::from_secs(self * rhs.as_secs())
    }
}

/// Shift an instant, rounded to the nanosecond. `None` when the shift is not
/// finite or the result is outside the representable range.
pub fn offset(instant: &UtcTimestamp, dt: Time) -> Option<UtcTimestamp> {
    let magnitude = std::time::Duration::try_from_secs_f64(dt.as_secs().abs()).ok()?;
    let delta = chrono::Duration::from_std(magnitude).ok()?;
    if dt.as_secs() < 0.0 {
        instant.checked_sub_signed(delta)
    } else {
        instant.checked_add_signed(delta)
    }
}

#[derive(Copy, Clone, PartialEq, PartialOrd)]
pub struct Angle {
    degrees: f64,
}

impl std::fmt::Debug for Angle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees)
    }
}

impl Angle {
    pub fn from_degrees(degrees: f64) -> Angle {
        Angle { degrees }
    }

    pub fn from_radians(radians: f64) -> Angle {
        Angle {
            degrees: radians.to_degrees(),
        }
    }

    pub fn as_degrees(&self) -> f64 {
        self.degrees
    }

    /// Wrapped into [-180, 180)
    pub fn wrap_longitude(&self) -> Angle {
        let degrees = (self.degrees + 180.0).rem_euclid(360.0) - 180.0;
        // rem_euclid can round up to the modulus for inputs just below a multiple
        Angle {
            degrees: if degrees >= 180.0 { -180.0 } else { degrees },
        }
    }
}

use derive_more::Display;
use serde::Serialize;

/// Geographic location of one object at one instant.
///
/// Latitude is within [-90, 90], longitude is normalized to [-180, 180).
/// Altitude is relative to the WGS84 ellipsoid and is not clamped. It can
/// dip slightly below zero near the surface.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Display, Serialize)]
#[display(
    fmt = "lat {:.2}°, lon {:.2}°, alt {:.2} km",
    "latitude_deg",
    "longitude_deg",
    "altitude_km"
)]
pub struct Position {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

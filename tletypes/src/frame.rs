use derive_more::Display;

/// Position, [km], expressed in an Earth-centered inertial frame (TEME for SGP4)
pub type EciVector = na::Vector3<f64>;

/// Geodetic coordinates as reported by a propagation capability
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default, Display)]
#[display(
    fmt = "{{lat: {} rad, lon: {} rad, height: {}}}",
    "latitude_rad",
    "longitude_rad",
    "height"
)]
pub struct GeodeticVector {
    /// Latitude, [rad]
    pub latitude_rad: f64,

    /// Longitude, [rad], any range
    pub longitude_rad: f64,

    /// Height above the reference ellipsoid, in the capability's `HeightUnit`
    pub height: f64,
}

/// Linear unit of `GeodeticVector::height`
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum HeightUnit {
    #[display(fmt = "m")]
    Meters,
    #[display(fmt = "km")]
    Kilometers,
}

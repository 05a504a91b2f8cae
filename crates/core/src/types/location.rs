//! Geographic location of a store.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Mean Earth radius used for great-circle distances.
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    /// Create a validated point.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Coordinates` if either value is not finite or
    /// is outside longitude [-180, 180] / latitude [-90, 90].
    pub fn new(lng: f64, lat: f64) -> Result<Self, ValidationError> {
        if !lng.is_finite() || !lat.is_finite() {
            return Err(ValidationError::Coordinates(
                "You must supply coordinates!".to_owned(),
            ));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(ValidationError::Coordinates(format!(
                "longitude {lng} is outside -180..180"
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::Coordinates(format!(
                "latitude {lat} is outside -90..90"
            )));
        }
        Ok(Self { lng, lat })
    }

    /// Haversine great-circle distance to `other` in meters.
    #[must_use]
    pub fn distance_m(&self, other: &Self) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        EARTH_RADIUS_METERS * 2.0 * a.sqrt().asin()
    }

    /// Latitude/longitude half-widths (degrees) of a box enclosing a circle of
    /// `radius_m` around this point.
    ///
    /// Near the poles the longitude span saturates at 180 degrees.
    #[must_use]
    pub fn bounding_deltas(&self, radius_m: f64) -> (f64, f64) {
        let angular = radius_m / EARTH_RADIUS_METERS;
        let lat_delta = angular.to_degrees();

        let ratio = angular.sin() / self.lat.to_radians().cos();
        let lng_delta = if ratio.is_finite() && ratio < 1.0 {
            ratio.asin().to_degrees()
        } else {
            180.0
        };
        (lat_delta, lng_delta)
    }
}

/// GeoJSON-style type tag. Only points are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointType {
    #[default]
    Point,
}

/// Store location: a typed point plus a human-readable address.
///
/// Serializes as `{"type":"Point","coordinates":[lng,lat],"address":"..."}`.
/// Deserializing runs the same checks as [`Location::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLocation")]
pub struct Location {
    #[serde(rename = "type", default)]
    pub kind: PointType,
    pub coordinates: [f64; 2],
    pub address: String,
}

/// Unchecked wire form of [`Location`].
#[derive(Deserialize)]
struct RawLocation {
    #[serde(rename = "type", default)]
    _kind: PointType,
    coordinates: [f64; 2],
    address: String,
}

impl TryFrom<RawLocation> for Location {
    type Error = ValidationError;

    fn try_from(raw: RawLocation) -> Result<Self, Self::Error> {
        let [lng, lat] = raw.coordinates;
        Self::new(GeoPoint::new(lng, lat)?, &raw.address)
    }
}

impl Location {
    /// Build a location from a validated point and an address.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Required` if the address is blank.
    pub fn new(point: GeoPoint, address: &str) -> Result<Self, ValidationError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ValidationError::Required("You must supply an address!"));
        }
        Ok(Self {
            kind: PointType::Point,
            coordinates: [point.lng, point.lat],
            address: address.to_owned(),
        })
    }

    /// The coordinate pair as a point.
    #[must_use]
    pub const fn point(&self) -> GeoPoint {
        let [lng, lat] = self.coordinates;
        GeoPoint { lng, lat }
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.coordinates[0]
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.coordinates[1]
    }
}

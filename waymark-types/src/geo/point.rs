use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Point on the surface of a celestial body.
pub trait GeoPoint {
    /// Numeric type used to represent coordinates.
    type Num: Float;

    /// Latitude in degrees.
    fn lat(&self) -> Self::Num;
    /// Longitude in degrees.
    fn lon(&self) -> Self::Num;

    /// Latitude in radians.
    fn lat_rad(&self) -> Self::Num {
        self.lat().to_radians()
    }

    /// Longitude in radians.
    fn lon_rad(&self) -> Self::Num {
        self.lon().to_radians()
    }
}

/// Geographic point that can be constructed from its coordinates.
pub trait NewGeoPoint<N = f64>: GeoPoint<Num = N> + Sized {
    /// Creates a point from latitude and longitude in degrees.
    fn latlon(lat: N, lon: N) -> Self;

    /// Creates a point from longitude and latitude in degrees.
    fn lonlat(lon: N, lat: N) -> Self {
        Self::latlon(lat, lon)
    }
}

/// 2d point on the surface of a celestial body.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct GeoPoint2d {
    lat: f64,
    lon: f64,
}

impl GeoPoint for GeoPoint2d {
    type Num = f64;

    fn lat(&self) -> f64 {
        self.lat
    }

    fn lon(&self) -> f64 {
        self.lon
    }
}

impl NewGeoPoint<f64> for GeoPoint2d {
    fn latlon(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<(f64, f64)> for GeoPoint2d {
    /// Converts a `(longitude, latitude)` pair.
    fn from((lon, lat): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

/// Creates a new [`GeoPoint2d`] from longitude and latitude values (in degrees).
///
/// ```
/// use waymark_types::geo::GeoPoint;
/// use waymark_types::lonlat;
///
/// let point = lonlat!(52.0, 38.0);
/// assert_eq!(point.lat(), 38.0);
/// ```
#[macro_export]
macro_rules! lonlat {
    ($lon:expr, $lat:expr) => {
        <$crate::geo::GeoPoint2d as $crate::geo::NewGeoPoint<f64>>::lonlat($lon, $lat)
    };
}

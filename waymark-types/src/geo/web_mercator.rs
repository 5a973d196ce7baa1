use std::marker::PhantomData;

use crate::cartesian::NewCartesianPoint2d;
use crate::geo::datum::Datum;
use crate::geo::point::NewGeoPoint;
use crate::geo::projection::Projection;

/// Spherical Mercator projection (EPSG:3857) as used by the web maps.
#[derive(Debug, Copy, Clone)]
pub struct WebMercator<In, Out> {
    datum: Datum,
    phantom_in: PhantomData<In>,
    phantom_out: PhantomData<Out>,
}

impl<In, Out> WebMercator<In, Out> {
    /// Creates a new projection over the given datum.
    pub fn new(datum: Datum) -> Self {
        Self {
            datum,
            phantom_in: Default::default(),
            phantom_out: Default::default(),
        }
    }

    /// Datum of the projection.
    pub fn datum(&self) -> Datum {
        self.datum
    }
}

impl<In, Out> Default for WebMercator<In, Out> {
    fn default() -> Self {
        Self::new(Datum::WGS84)
    }
}

impl<In: NewGeoPoint<f64>, Out: NewCartesianPoint2d<f64>> Projection for WebMercator<In, Out> {
    type InPoint = In;
    type OutPoint = Out;

    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint> {
        if input.lat().abs() >= 90.0 {
            return None;
        }

        let x = self.datum.semimajor() * input.lon_rad();
        let y = self.datum.semimajor()
            * (std::f64::consts::FRAC_PI_4 + input.lat_rad() / 2.0)
                .tan()
                .ln();

        if x.is_finite() && y.is_finite() {
            Some(Self::OutPoint::new(x, y))
        } else {
            None
        }
    }

    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint> {
        let lat = std::f64::consts::FRAC_PI_2
            - 2.0 * (-input.y() / self.datum.semimajor()).exp().atan();
        let lon = input.x() / self.datum.semimajor();

        if lat.is_finite() && lon.is_finite() {
            Some(Self::InPoint::latlon(lat.to_degrees(), lon.to_degrees()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartesian::Point2d;
    use crate::geo::{GeoPoint, GeoPoint2d};
    use crate::lonlat;
    use approx::assert_abs_diff_eq;

    fn projection() -> WebMercator<GeoPoint2d, Point2d> {
        WebMercator::default()
    }

    #[test]
    fn project_known_points() {
        let projection = projection();

        let origin = projection.project(&lonlat!(0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(origin, Point2d::new(0.0, 0.0), epsilon = 1e-9);

        let east = projection.project(&lonlat!(180.0, 0.0)).unwrap();
        assert_abs_diff_eq!(east.x, 20037508.342789244, epsilon = 1e-6);

        let north = projection.project(&lonlat!(0.0, 85.0511287798)).unwrap();
        assert_abs_diff_eq!(north.y, 20037508.342789244, epsilon = 1e-2);
    }

    #[test]
    fn poles_cannot_be_projected() {
        let projection = projection();
        assert!(projection.project(&lonlat!(0.0, 90.0)).is_none());
        assert!(projection.project(&lonlat!(0.0, -90.0)).is_none());
    }

    #[test]
    fn unproject_reverses_project() {
        let projection = projection();
        let point = lonlat!(-74.00796, 40.70361);
        let projected = projection.project(&point).unwrap();
        let back = projection.unproject(&projected).unwrap();

        assert_abs_diff_eq!(back.lon(), point.lon(), epsilon = 1e-9);
        assert_abs_diff_eq!(back.lat(), point.lat(), epsilon = 1e-9);
    }
}

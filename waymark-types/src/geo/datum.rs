/// Reference ellipsoid of a celestial body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datum {
    semimajor: f64,
}

impl Datum {
    /// Datum used by GPS and the web maps.
    pub const WGS84: Self = Datum {
        semimajor: 6_378_137.0,
    };

    /// Semimajor axis of the ellipsoid in meters.
    pub fn semimajor(&self) -> f64 {
        self.semimajor
    }

    /// Length of the equator in meters, assuming a spherical body with the radius of the semimajor axis.
    pub fn equator_length(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.semimajor
    }
}

impl Default for Datum {
    fn default() -> Self {
        Self::WGS84
    }
}

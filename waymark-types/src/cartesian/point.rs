use nalgebra::{Point2, Scalar};
use num_traits::Num;

/// 2d point in cartesian coordinates with `f64` components.
pub type Point2d = Point2<f64>;

/// Point in 2d cartesian coordinate space.
pub trait CartesianPoint2d {
    /// Numeric type of the coordinates.
    type Num: Num + Copy + PartialOrd + Scalar;

    /// X coordinate.
    fn x(&self) -> Self::Num;
    /// Y coordinate.
    fn y(&self) -> Self::Num;
}

/// Cartesian point that can be constructed from its coordinates.
pub trait NewCartesianPoint2d<Num = f64>: CartesianPoint2d<Num = Num> {
    /// Creates a new point.
    fn new(x: Num, y: Num) -> Self;
}

impl<N: Num + Copy + PartialOrd + Scalar> CartesianPoint2d for Point2<N> {
    type Num = N;

    fn x(&self) -> N {
        self.x
    }

    fn y(&self) -> N {
        self.y
    }
}

impl<N: Num + Copy + PartialOrd + Scalar> NewCartesianPoint2d<N> for Point2<N> {
    fn new(x: N, y: N) -> Self {
        Point2::new(x, y)
    }
}


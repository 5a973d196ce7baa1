use nalgebra::{Point2, Scalar};
use num_traits::Num;
use serde::{Deserialize, Serialize};

use crate::cartesian::point::CartesianPoint2d;

/// Axis-aligned rectangle, used as a bounding box of geometries.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect<N = f64> {
    /// Minimum x coordinate.
    pub x_min: N,
    /// Minimum y coordinate.
    pub y_min: N,
    /// Maximum x coordinate.
    pub x_max: N,
    /// Maximum y coordinate.
    pub y_max: N,
}

impl<N: Num + Copy + PartialOrd + Scalar> Rect<N> {
    /// Creates a new rectangle. The coordinates are not normalized, so `x_min` is expected to be not greater than
    /// `x_max`, and `y_min` not greater than `y_max`.
    pub fn new(x_min: N, y_min: N, x_max: N, y_max: N) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Rectangle of zero size located at the given point.
    pub fn from_point(p: &impl CartesianPoint2d<Num = N>) -> Self {
        Self {
            x_min: p.x(),
            x_max: p.x(),
            y_min: p.y(),
            y_max: p.y(),
        }
    }

    /// Smallest rectangle containing all the given points. Returns `None` if the iterator is empty.
    pub fn from_points<'a, P: CartesianPoint2d<Num = N> + 'a>(
        mut points: impl Iterator<Item = &'a P>,
    ) -> Option<Self> {
        let first = points.next()?;
        let mut rect = Self::from_point(first);
        for p in points {
            rect.expand(p);
        }

        Some(rect)
    }

    /// Grows the rectangle so that it contains the given point.
    pub fn expand(&mut self, p: &impl CartesianPoint2d<Num = N>) {
        if self.x_min > p.x() {
            self.x_min = p.x();
        }
        if self.y_min > p.y() {
            self.y_min = p.y();
        }
        if self.x_max < p.x() {
            self.x_max = p.x();
        }
        if self.y_max < p.y() {
            self.y_max = p.y();
        }
    }

    /// Minimum x coordinate.
    pub fn x_min(&self) -> N {
        self.x_min
    }

    /// Maximum x coordinate.
    pub fn x_max(&self) -> N {
        self.x_max
    }

    /// Minimum y coordinate.
    pub fn y_min(&self) -> N {
        self.y_min
    }

    /// Maximum y coordinate.
    pub fn y_max(&self) -> N {
        self.y_max
    }

    /// Width of the rectangle.
    pub fn width(&self) -> N {
        self.x_max - self.x_min
    }

    /// Height of the rectangle.
    pub fn height(&self) -> N {
        self.y_max - self.y_min
    }

    /// Corner with the minimum coordinates (south-west corner for maps with north up).
    pub fn min_corner(&self) -> Point2<N> {
        Point2::new(self.x_min, self.y_min)
    }

    /// Corner with the maximum coordinates.
    pub fn max_corner(&self) -> Point2<N> {
        Point2::new(self.x_max, self.y_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_by_points() {
        let mut rect = Rect::from_point(&Point2::new(1.0, 1.0));
        assert_eq!(rect.width(), 0.0);

        rect.expand(&Point2::new(-1.0, 3.0));
        rect.expand(&Point2::new(0.0, 0.0));
        assert_eq!(rect, Rect::new(-1.0, 0.0, 1.0, 3.0));
        assert_eq!(rect.min_corner(), Point2::new(-1.0, 0.0));
        assert_eq!(rect.max_corner(), Point2::new(1.0, 3.0));
        assert_eq!(rect.height(), 3.0);
    }

    #[test]
    fn from_points() {
        let points = [Point2::new(2.0, -1.0), Point2::new(-2.0, 5.0)];
        let rect = Rect::from_points(points.iter()).unwrap();
        assert_eq!(rect, Rect::new(-2.0, -1.0, 2.0, 5.0));

        let empty: [Point2<f64>; 0] = [];
        assert!(Rect::from_points(empty.iter()).is_none());
    }
}

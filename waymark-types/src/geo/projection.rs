/// Projection converts points from one coordinate system into another.
pub trait Projection {
    /// Type of the input point.
    type InPoint;
    /// Type of the output point.
    type OutPoint;

    /// Projects a point. Returns `None` if the point cannot be represented in the output coordinates.
    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint>;

    /// Converts a point back into the input coordinates.
    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint>;
}

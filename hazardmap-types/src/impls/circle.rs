/// Circle given by its center and radius in the units of the coordinate reference system.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle<P> {
    /// Center of the circle.
    pub center: P,
    /// Radius in the units of the coordinates.
    pub radius: f64,
}

impl<P> Circle<P> {
    /// Creates a new circle.
    pub fn new(center: P, radius: f64) -> Self {
        Self { center, radius }
    }
}

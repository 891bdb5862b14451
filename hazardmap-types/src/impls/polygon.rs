use crate::impls::Contour;

/// Polygon with an outer contour and an optional set of holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon<P> {
    /// Outer boundary.
    pub outer_contour: Contour<P>,
    /// Holes.
    pub inner_contours: Vec<Contour<P>>,
}

impl<P> Polygon<P> {
    /// Creates a new polygon.
    pub fn new(outer_contour: Contour<P>, inner_contours: Vec<Contour<P>>) -> Self {
        Self {
            outer_contour,
            inner_contours,
        }
    }

    /// Iterates over all contours of the polygon, outer one first.
    pub fn iter_contours(&self) -> impl Iterator<Item = &Contour<P>> + '_ {
        std::iter::once(&self.outer_contour).chain(self.inner_contours.iter())
    }

    /// Converts the points with the given function.
    pub fn try_map<Q>(&self, f: &mut impl FnMut(&P) -> Option<Q>) -> Option<Polygon<Q>> {
        Some(Polygon {
            outer_contour: self.outer_contour.try_map(f)?,
            inner_contours: self
                .inner_contours
                .iter()
                .map(|c| c.try_map(f))
                .collect::<Option<Vec<_>>>()?,
        })
    }
}

impl<P> From<Contour<P>> for Polygon<P> {
    fn from(value: Contour<P>) -> Self {
        Self::new(value, vec![])
    }
}

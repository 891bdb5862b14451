/// Sequence of points connected by straight segments (a line string).
///
/// A closed contour implicitly connects the last point with the first one; the closing point
/// is not repeated in `points`.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour<P> {
    points: Vec<P>,
    is_closed: bool,
}

impl<P> Contour<P> {
    /// Creates a new contour.
    pub fn new(points: Vec<P>, is_closed: bool) -> Self {
        Self { points, is_closed }
    }

    /// Creates an open contour.
    pub fn open(points: Vec<P>) -> Self {
        Self::new(points, false)
    }

    /// Creates a closed contour.
    pub fn closed(points: Vec<P>) -> Self {
        Self::new(points, true)
    }

    /// Whether the contour is closed.
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// Points of the contour, without the closing point.
    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// Iterates over the points of the contour.
    pub fn iter_points(&self) -> impl Iterator<Item = &P> + '_ {
        self.points.iter()
    }

    /// Iterates over the points of the contour and repeats the first point at the end if the
    /// contour is closed.
    pub fn iter_points_closing(&self) -> impl Iterator<Item = &P> + '_ {
        let closing = if self.is_closed {
            self.points.first()
        } else {
            None
        };
        self.points.iter().chain(closing)
    }

    /// Converts the contour into a closed one. Returns `None` if the contour has less than three
    /// points.
    pub fn into_closed(self) -> Option<Self> {
        if self.points.len() < 3 {
            return None;
        }

        Some(Self {
            points: self.points,
            is_closed: true,
        })
    }

    /// Converts the points with the given function, failing if any of the points fails.
    pub fn try_map<Q>(&self, f: &mut impl FnMut(&P) -> Option<Q>) -> Option<Contour<Q>> {
        Some(Contour {
            points: self.points.iter().map(f).collect::<Option<Vec<_>>>()?,
            is_closed: self.is_closed,
        })
    }
}

impl<P: PartialEq> Contour<P> {
    /// Builds a contour from a coordinate sequence as it appears in GeoJSON and KML, where a
    /// closed ring repeats its first point at the end.
    pub fn from_ring_points(mut points: Vec<P>) -> Self {
        let is_closed = points.len() > 1 && points.first() == points.last();
        if is_closed {
            points.pop();
        }

        Self::new(points, is_closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_points_are_closed() {
        let contour = Contour::from_ring_points(vec![1, 2, 3, 1]);
        assert!(contour.is_closed());
        assert_eq!(contour.points(), &[1, 2, 3]);
        assert_eq!(
            contour.iter_points_closing().copied().collect::<Vec<_>>(),
            vec![1, 2, 3, 1]
        );

        let line = Contour::from_ring_points(vec![1, 2, 3]);
        assert!(!line.is_closed());
        assert_eq!(line.iter_points_closing().count(), 3);
    }
}

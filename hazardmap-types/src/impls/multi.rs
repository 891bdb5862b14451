use crate::impls::{Contour, Polygon};

macro_rules! multi_geometry {
    ($(#[$meta:meta])* $name:ident, $part:ty, $accessor:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name<P>(Vec<$part>);

        impl<P> $name<P> {
            /// Parts of the geometry.
            pub fn $accessor(&self) -> &[$part] {
                &self.0
            }

            /// Number of parts.
            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// Returns true if the geometry has no parts.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl<P> From<Vec<$part>> for $name<P> {
            fn from(value: Vec<$part>) -> Self {
                Self(value)
            }
        }
    };
}

multi_geometry!(
    /// Set of points.
    MultiPoint,
    P,
    points
);
multi_geometry!(
    /// Set of line strings.
    MultiContour,
    Contour<P>,
    contours
);
multi_geometry!(
    /// Set of polygons.
    MultiPolygon,
    Polygon<P>,
    polygons
);

impl<P> MultiPoint<P> {
    /// Converts the points with the given function.
    pub fn try_map<Q>(&self, f: &mut impl FnMut(&P) -> Option<Q>) -> Option<MultiPoint<Q>> {
        Some(MultiPoint(self.0.iter().map(f).collect::<Option<Vec<_>>>()?))
    }
}

impl<P> MultiContour<P> {
    /// Converts the points with the given function.
    pub fn try_map<Q>(&self, f: &mut impl FnMut(&P) -> Option<Q>) -> Option<MultiContour<Q>> {
        Some(MultiContour(
            self.0
                .iter()
                .map(|c| c.try_map(f))
                .collect::<Option<Vec<_>>>()?,
        ))
    }
}

impl<P> MultiPolygon<P> {
    /// Converts the points with the given function.
    pub fn try_map<Q>(&self, f: &mut impl FnMut(&P) -> Option<Q>) -> Option<MultiPolygon<Q>> {
        Some(MultiPolygon(
            self.0
                .iter()
                .map(|p| p.try_map(f))
                .collect::<Option<Vec<_>>>()?,
        ))
    }
}

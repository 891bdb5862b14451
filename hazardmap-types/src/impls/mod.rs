//! Concrete geometry types used by [`Geom`](crate::Geom).

mod circle;
mod contour;
mod multi;
mod polygon;

pub use circle::Circle;
pub use contour::Contour;
pub use multi::{MultiContour, MultiPoint, MultiPolygon};
pub use polygon::Polygon;

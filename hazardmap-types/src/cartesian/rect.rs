use nalgebra::{Point2, Scalar};
use num_traits::{FromPrimitive, Num};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect<N = f64> {
    x_min: N,
    y_min: N,
    x_max: N,
    y_max: N,
}

impl<N: Num + Copy + PartialOrd + Scalar + FromPrimitive> Rect<N> {
    /// Creates a new rectangle. The corners are normalized so that `min <= max` on both axes.
    pub fn new(x1: N, y1: N, x2: N, y2: N) -> Self {
        let (x_min, x_max) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (y_min, y_max) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Minimum x.
    pub fn x_min(&self) -> N {
        self.x_min
    }

    /// Maximum x.
    pub fn x_max(&self) -> N {
        self.x_max
    }

    /// Minimum y.
    pub fn y_min(&self) -> N {
        self.y_min
    }

    /// Maximum y.
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

    /// Center point.
    pub fn center(&self) -> Point2<N> {
        let two = N::from_f64(2.0).unwrap_or_else(|| N::one() + N::one());
        Point2::new(
            (self.x_min + self.x_max) / two,
            (self.y_min + self.y_max) / two,
        )
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn merge(&self, other: Self) -> Self {
        Self {
            x_min: min(self.x_min, other.x_min),
            y_min: min(self.y_min, other.y_min),
            x_max: max(self.x_max, other.x_max),
            y_max: max(self.y_max, other.y_max),
        }
    }

    /// Intersection of the two rectangles. If they do not intersect, the result has zero or
    /// negative size and [`Rect::intersects`] of the inputs is false.
    pub fn limit(&self, other: Self) -> Self {
        Self {
            x_min: max(self.x_min, other.x_min),
            y_min: max(self.y_min, other.y_min),
            x_max: min(self.x_max, other.x_max),
            y_max: min(self.y_max, other.y_max),
        }
    }

    /// Bounding rectangle of the points. Returns `None` for an empty iterator.
    pub fn from_points<'a>(mut points: impl Iterator<Item = &'a Point2<N>>) -> Option<Self> {
        let first = points.next()?;
        let mut rect = Self::from_point(first);
        for p in points {
            rect.x_min = min(rect.x_min, p.x);
            rect.y_min = min(rect.y_min, p.y);
            rect.x_max = max(rect.x_max, p.x);
            rect.y_max = max(rect.y_max, p.y);
        }

        Some(rect)
    }

    /// Rectangle of zero size at the point.
    pub fn from_point(p: &Point2<N>) -> Self {
        Self {
            x_min: p.x,
            y_min: p.y,
            x_max: p.x,
            y_max: p.y,
        }
    }

    /// Returns true if the point is inside the rectangle or on its border.
    pub fn contains(&self, point: &Point2<N>) -> bool {
        self.x_min <= point.x
            && self.x_max >= point.x
            && self.y_min <= point.y
            && self.y_max >= point.y
    }

    /// Returns true if the rectangles share at least one point.
    pub fn intersects(&self, other: &Self) -> bool {
        self.x_min <= other.x_max
            && self.x_max >= other.x_min
            && self.y_min <= other.y_max
            && self.y_max >= other.y_min
    }

    /// Scales the rectangle around its center.
    pub fn magnify(&self, factor: N) -> Self {
        let two = N::from_f64(2.0).unwrap_or_else(|| N::one() + N::one());
        let center = self.center();
        let half_width = self.width() / two * factor;
        let half_height = self.height() / two * factor;
        Self {
            x_min: center.x - half_width,
            x_max: center.x + half_width,
            y_min: center.y - half_height,
            y_max: center.y + half_height,
        }
    }

    /// Grows the rectangle by `amount` on every side.
    pub fn expand(&self, amount: N) -> Self {
        Self {
            x_min: self.x_min - amount,
            y_min: self.y_min - amount,
            x_max: self.x_max + amount,
            y_max: self.y_max + amount,
        }
    }
}

fn min<N: PartialOrd>(a: N, b: N) -> N {
    if a < b {
        a
    } else {
        b
    }
}

fn max<N: PartialOrd>(a: N, b: N) -> N {
    if a > b {
        a
    } else {
        b
    }
}

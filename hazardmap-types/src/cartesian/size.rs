use num_traits::{FromPrimitive, Num};
use serde::{Deserialize, Serialize};

/// Size of a rectangular area, for example a map window in pixels.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Size<N = f64> {
    width: N,
    height: N,
}

impl<N: Num + FromPrimitive + Copy + PartialOrd> Size<N> {
    /// Creates a new instance.
    pub fn new(width: N, height: N) -> Self {
        Self { width, height }
    }

    /// Width.
    pub fn width(&self) -> N {
        self.width
    }

    /// Height.
    pub fn height(&self) -> N {
        self.height
    }

    /// Half of the width.
    pub fn half_width(&self) -> N {
        self.width / N::from_f64(2.0).unwrap_or_else(N::one)
    }

    /// Half of the height.
    pub fn half_height(&self) -> N {
        self.height / N::from_f64(2.0).unwrap_or_else(N::one)
    }

    /// Returns true if either of the dimensions is zero.
    pub fn is_zero(&self) -> bool {
        self.width == N::zero() || self.height == N::zero()
    }
}

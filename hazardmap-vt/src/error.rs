use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TilingError {
    #[error("tile {z}/{x}/{y} is outside of the index")]
    InvalidTile { z: u32, x: u32, y: u32 },

    #[error("{0}")]
    Generic(String),
}

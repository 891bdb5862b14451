//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypesError {
    /// Geometry conversion error.
    #[error("invalid input geometry: {0}")]
    Conversion(String),
    /// A coordinate reference system was requested by a name that was never registered.
    #[error("coordinate reference system '{0}' is not registered")]
    UnknownCrs(String),
    /// A custom coordinate reference system definition could not be parsed.
    #[error("invalid definition of coordinate reference system '{name}': {reason}")]
    InvalidDefinition {
        /// Name the definition was registered under.
        name: String,
        /// Description of the problem.
        reason: String,
    },
    /// A coordinate could not be converted between two references.
    #[error("failed to project coordinates from {source_crs} to {target_crs}")]
    Projection {
        /// Source reference name.
        source_crs: String,
        /// Target reference name.
        target_crs: String,
    },
}

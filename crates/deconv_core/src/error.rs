//! Error taxonomy for the preconditioning kernel.
//!
//! Every check runs at the top of an operation, before any allocation or
//! parallel dispatch, so a failed call never leaves partial output behind.

use thiserror::Error;

/// Errors raised by padding, recentering, filtering and pixel conversion.
#[derive(Debug, Error)]
pub enum DeconvError {
    /// Array shapes (or ranks) that must agree do not.
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// A boundary policy name that is not one of zero, periodic or reflexive.
    #[error("invalid boundary policy: {0:?}")]
    InvalidBoundaryPolicy(String),

    /// PSF larger than the working grid, peak outside the PSF, or an empty
    /// symmetric window.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Out-of-range scalar parameter (regularization, thread count, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The worker pool for an execution context could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl DeconvError {
    pub(crate) fn shape_mismatch(expected: &[usize], found: &[usize]) -> Self {
        DeconvError::ShapeMismatch {
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DeconvError>;

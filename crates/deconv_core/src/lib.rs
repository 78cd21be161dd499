//! Deconvolution Preconditioning Kernel
//!
//! Boundary-aware building blocks for spectral deconvolution: padding an
//! image or PSF to a working grid under a boundary policy, recentering the
//! PSF so its peak sits at the transform origin, and building a regularized
//! inverse filter from the PSF's spectrum. Every operation is generic over
//! `f32`/`f64` and over array rank, and produces identical results whether
//! run on the caller thread or tiled over a worker pool.

pub mod array;
pub mod config;
pub mod error;
pub mod filter;
pub mod float_trait;
pub mod index_wrap;
pub mod padding;
pub mod pixels;
pub mod recenter;
pub mod tiler;
pub mod transforms;

// Re-export commonly used types at the crate root
pub use array::Samples;
pub use config::{set_default_threads, KernelConfig};
pub use error::{DeconvError, Result};
pub use filter::{build_filter, build_truncated_filter, FilterConfig, FilterKind, MagnitudePrecision};
pub use float_trait::DeconvFloat;
pub use index_wrap::{mirror, periodic};
pub use padding::{crop, pad, pad_with_policy_name, BoundaryPolicy};
pub use recenter::{circ_shift, dct_shift, recenter, PeakLocation};
pub use tiler::{ExecutionContext, TileRange};
pub use transforms::{fft_real, ifft_real, SpectralPlans};

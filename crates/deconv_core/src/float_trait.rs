//! Float trait abstraction for f32/f64 support.
//!
//! Every kernel routine is written once against [`DeconvFloat`] so that the
//! single and double precision pipelines share the same code path.

use num_traits::{Float, FromPrimitive, NumAssign};
use rustfft::FftNum;
use std::fmt::Debug;
use std::iter::Sum;

/// Trait alias for floating point types supported by the deconvolution kernel.
///
/// This trait combines all the bounds needed by the kernel:
/// - Basic float operations (Float, NumAssign)
/// - FFT compatibility (FftNum from rustfft)
/// - Conversion from primitive types (FromPrimitive)
/// - Iteration support (Sum)
/// - Debug printing
pub trait DeconvFloat:
    Float + FftNum + FromPrimitive + NumAssign + Sum + Debug + Send + Sync + 'static
{
    /// Create a value from an f64 constant.
    fn from_f64_c(val: f64) -> Self;

    /// Create a value from a usize constant.
    fn usize_as(val: usize) -> Self;

    /// Round-trip the value through `f32`.
    ///
    /// Identity for `f32`; loses precision for `f64`.
    fn narrow_to_f32(self) -> Self;
}

impl DeconvFloat for f32 {
    #[inline]
    fn from_f64_c(val: f64) -> Self {
        val as f32
    }

    #[inline]
    fn usize_as(val: usize) -> Self {
        val as f32
    }

    #[inline]
    fn narrow_to_f32(self) -> Self {
        self
    }
}

impl DeconvFloat for f64 {
    #[inline]
    fn from_f64_c(val: f64) -> Self {
        val
    }

    #[inline]
    fn usize_as(val: usize) -> Self {
        val as f64
    }

    #[inline]
    fn narrow_to_f32(self) -> Self {
        self as f32 as f64
    }
}

//! Regularized spectral inverse filters.
//!
//! Given the transform `S` of the recentered, padded PSF and a regularization
//! parameter `λ`, the filter is built element by element:
//!
//! - [`FilterKind::Truncated`]: `1 / s` where `|s| >= λ`, zero elsewhere.
//!   Frequencies the blur has all but erased are left alone instead of being
//!   amplified.
//! - [`FilterKind::Tikhonov`]: `conj(s) / (|s|^2 + λ^2)` everywhere.
//!
//! The same code serves real (DCT) and complex (FFT) spectra, in single and
//! double precision, through [`SpectralElement`].

use ndarray::{Array, ArrayView, Dimension, IntoDimension};
use num_traits::Zero;
use rustfft::num_complex::Complex;

use crate::array::Samples;
use crate::error::{DeconvError, Result};
use crate::float_trait::DeconvFloat;
use crate::tiler::ExecutionContext;

/// How the inverse is regularized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    /// Invert where the magnitude reaches λ, zero elsewhere.
    #[default]
    Truncated,
    /// Damped inverse `conj(s) / (|s|^2 + λ^2)`.
    Tikhonov,
}

/// Precision of the `|s| >= λ` comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MagnitudePrecision {
    /// Compare in the element's own precision.
    #[default]
    Native,
    /// Round the magnitude to `f32` first. Reproduces reference outputs of
    /// the legacy double-precision path.
    Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterConfig {
    pub kind: FilterKind,
    pub magnitude_precision: MagnitudePrecision,
}

impl FilterConfig {
    pub fn truncated() -> Self {
        Self::default()
    }

    pub fn tikhonov() -> Self {
        Self {
            kind: FilterKind::Tikhonov,
            ..Self::default()
        }
    }
}

/// Element of a transformed kernel spectrum.
pub trait SpectralElement: Copy + Zero + Send + Sync {
    type Real: DeconvFloat;

    fn magnitude(&self) -> Self::Real;

    /// Plain reciprocal `1 / s`.
    fn reciprocal(&self) -> Self;

    /// `conj(s) / (|s|^2 + λ^2)`; zero when the denominator vanishes.
    fn damped_reciprocal(&self, lambda: Self::Real) -> Self;
}

macro_rules! impl_real_spectral_element {
    ($($t:ty),*) => {
        $(
            impl SpectralElement for $t {
                type Real = $t;

                #[inline]
                fn magnitude(&self) -> $t {
                    self.abs()
                }

                #[inline]
                fn reciprocal(&self) -> $t {
                    1.0 / *self
                }

                #[inline]
                fn damped_reciprocal(&self, lambda: $t) -> $t {
                    let denom = *self * *self + lambda * lambda;
                    if denom == 0.0 {
                        0.0
                    } else {
                        *self / denom
                    }
                }
            }
        )*
    };
}

impl_real_spectral_element!(f32, f64);

impl<F: DeconvFloat> SpectralElement for Complex<F> {
    type Real = F;

    #[inline]
    fn magnitude(&self) -> F {
        self.norm()
    }

    #[inline]
    fn reciprocal(&self) -> Self {
        if self.im == F::zero() {
            Complex::new(F::one() / self.re, F::zero())
        } else {
            let denom = self.norm_sqr();
            Complex::new(self.re / denom, -self.im / denom)
        }
    }

    #[inline]
    fn damped_reciprocal(&self, lambda: F) -> Self {
        let denom = self.norm_sqr() + lambda * lambda;
        if denom == F::zero() {
            Complex::zero()
        } else {
            Complex::new(self.re / denom, -self.im / denom)
        }
    }
}

#[inline]
fn filter_element<S: SpectralElement>(s: S, lambda: S::Real, config: &FilterConfig) -> S {
    match config.kind {
        FilterKind::Truncated => {
            let magnitude = match config.magnitude_precision {
                MagnitudePrecision::Native => s.magnitude(),
                MagnitudePrecision::Single => s.magnitude().narrow_to_f32(),
            };
            if magnitude >= lambda {
                s.reciprocal()
            } else {
                S::zero()
            }
        }
        FilterKind::Tikhonov => s.damped_reciprocal(lambda),
    }
}

fn check_lambda<F: DeconvFloat>(lambda: F) -> Result<()> {
    if lambda.is_nan() || lambda < F::zero() {
        return Err(DeconvError::InvalidParameter(format!(
            "regularization parameter must be >= 0, got {:?}",
            lambda
        )));
    }
    Ok(())
}

/// Build the regularized inverse filter of `spectrum` for parameter `lambda`.
///
/// The spectrum is read only; the filter is a new array of the same shape.
pub fn build_filter<S, D>(
    spectrum: ArrayView<'_, S, D>,
    lambda: S::Real,
    config: &FilterConfig,
    ctx: &ExecutionContext,
) -> Result<Array<S, D>>
where
    S: SpectralElement,
    D: Dimension,
{
    check_lambda(lambda)?;
    log::debug!(
        "building {:?} filter for spectrum {:?} (lambda = {:?})",
        config.kind,
        spectrum.shape(),
        lambda
    );

    let mut filter = Array::zeros(spectrum.raw_dim());
    let samples = Samples::new(spectrum);
    ctx.run_split_mut(filter.view_mut(), |range, mut tile| {
        for (pattern, slot) in tile.indexed_iter_mut() {
            let mut index = pattern.into_dimension();
            index[0] += range.start;
            *slot = filter_element(samples.get(&index), lambda, config);
        }
        Ok(())
    })?;
    Ok(filter)
}

/// Truncated filter with default settings.
pub fn build_truncated_filter<S, D>(
    spectrum: ArrayView<'_, S, D>,
    lambda: S::Real,
    ctx: &ExecutionContext,
) -> Result<Array<S, D>>
where
    S: SpectralElement,
    D: Dimension,
{
    build_filter(spectrum, lambda, &FilterConfig::truncated(), ctx)
}

//! PSF recentering into the first-column layout of the blurring operator.
//!
//! Spectral solvers diagonalise the blurring matrix with an FFT (periodic
//! boundary) or a DCT (reflexive boundary). Both need the PSF rearranged so
//! that its centre sits at the origin:
//!
//! - [`circ_shift`] rotates the PSF circularly by the peak position.
//! - [`dct_shift`] folds the symmetric window around the peak into the origin
//!   corner, which is the kernel's contribution under even (mirrored)
//!   extension.

use std::ops::AddAssign;

use ndarray::{Array, ArrayView, Dimension, IntoDimension, Slice, Zip};
use num_traits::Zero;

use crate::error::{DeconvError, Result};
use crate::float_trait::DeconvFloat;
use crate::padding::BoundaryPolicy;

/// Coordinate of the PSF's centre (normally its brightest element).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakLocation<D: Dimension> {
    coords: D,
}

impl<D: Dimension> PeakLocation<D> {
    pub fn new<I: IntoDimension<Dim = D>>(coords: I) -> Self {
        Self {
            coords: coords.into_dimension(),
        }
    }

    /// Position of the largest element, first in row-major order on ties.
    ///
    /// NaN entries are skipped.
    pub fn locate<F: DeconvFloat>(psf: ArrayView<'_, F, D>) -> Result<Self> {
        let mut best: Option<(D::Pattern, F)> = None;
        for (pattern, &v) in psf.indexed_iter() {
            if v.is_nan() {
                continue;
            }
            match &best {
                Some((_, max)) if v <= *max => {}
                _ => best = Some((pattern, v)),
            }
        }
        best.map(|(pattern, _)| Self::new(pattern)).ok_or_else(|| {
            DeconvError::DegenerateGeometry(format!(
                "no finite maximum in PSF of shape {:?}",
                psf.shape()
            ))
        })
    }

    pub fn coords(&self) -> &[usize] {
        self.coords.slice()
    }

    pub fn dim(&self) -> &D {
        &self.coords
    }

    fn check_within(&self, shape: &[usize]) -> Result<()> {
        let coords = self.coords();
        if coords.len() != shape.len() {
            return Err(DeconvError::shape_mismatch(shape, coords));
        }
        if coords.iter().zip(shape).any(|(&c, &n)| c >= n) {
            return Err(DeconvError::DegenerateGeometry(format!(
                "peak {:?} lies outside PSF of shape {:?}",
                coords, shape
            )));
        }
        Ok(())
    }
}

/// Circularly shift `psf` so that the element at `peak` lands at the origin.
///
/// The array is cut at `peak` along every axis and the `2^ndim` blocks are
/// swapped into place: `out[j] = psf[(j + peak) mod n]`.
pub fn circ_shift<T, D>(psf: ArrayView<'_, T, D>, peak: &PeakLocation<D>) -> Result<Array<T, D>>
where
    T: Copy + Zero,
    D: Dimension,
{
    peak.check_within(psf.shape())?;
    let ndim = psf.ndim();
    let shape = psf.shape().to_vec();
    let p = peak.coords();

    let mut shifted = Array::zeros(psf.raw_dim());
    for block in 0..(1usize << ndim) {
        // bit clear: tail [p, n) -> head [0, n-p); bit set: head [0, p) -> tail [n-p, n)
        let (mut src, mut dst) = (Vec::with_capacity(ndim), Vec::with_capacity(ndim));
        for a in 0..ndim {
            let (n, pa) = (shape[a], p[a]);
            if (block >> a) & 1 == 0 {
                src.push((pa, n));
                dst.push((0, n - pa));
            } else {
                src.push((0, pa));
                dst.push((n - pa, n));
            }
        }
        shifted
            .slice_each_axis_mut(|ax| {
                let (lo, hi) = dst[ax.axis.index()];
                Slice::from(lo..hi)
            })
            .assign(&psf.slice_each_axis(|ax| {
                let (lo, hi) = src[ax.axis.index()];
                Slice::from(lo..hi)
            }));
    }
    Ok(shifted)
}

/// Half-width of the largest symmetric window around `peak` inside `shape`.
pub fn symmetric_half_window(shape: &[usize], peak: &[usize]) -> Result<usize> {
    let k = shape
        .iter()
        .zip(peak)
        .map(|(&n, &c)| (c as isize).min(n as isize - c as isize - 1))
        .min()
        .unwrap_or(-1);
    if k < 0 {
        return Err(DeconvError::DegenerateGeometry(format!(
            "no symmetric window around {:?} in shape {:?}",
            peak, shape
        )));
    }
    Ok(k as usize)
}

/// Fold the PSF around `peak` for reflexive (DCT) boundary conditions.
///
/// With `k` the half-width of the largest symmetric window around the peak,
/// the window `PP` of side `2k+1` is summed with its one-sample shifts: for
/// every offset `o` in `{0,1}^ndim`, `PP[k+o .. 2k+1]` is added into
/// `acc[0 .. k+1-o]`. The sum is written to the origin corner of an
/// otherwise zero array of the PSF's shape.
pub fn dct_shift<T, D>(psf: ArrayView<'_, T, D>, peak: &PeakLocation<D>) -> Result<Array<T, D>>
where
    T: Copy + Zero + AddAssign,
    D: Dimension,
{
    peak.check_within(psf.shape())?;
    let ndim = psf.ndim();
    let p = peak.coords();
    let k = symmetric_half_window(psf.shape(), p)?;
    let side = 2 * k + 1;

    let window = psf.slice_each_axis(|ax| {
        let c = p[ax.axis.index()];
        Slice::from(c - k..c + k + 1)
    });

    let mut acc_dim = psf.raw_dim();
    acc_dim.slice_mut().iter_mut().for_each(|n| *n = side);
    let mut acc = Array::<T, D>::zeros(acc_dim);

    for extract in 0..(1usize << ndim) {
        let offset = |axis: usize| (extract >> axis) & 1;
        let part = window.slice_each_axis(|ax| Slice::from(k + offset(ax.axis.index())..side));
        let mut dst = acc.slice_each_axis_mut(|ax| Slice::from(0..k + 1 - offset(ax.axis.index())));
        Zip::from(&mut dst).and(&part).for_each(|d, &s| *d += s);
    }

    let mut shifted = Array::zeros(psf.raw_dim());
    shifted
        .slice_each_axis_mut(|_| Slice::from(0..side))
        .assign(&acc);
    Ok(shifted)
}

/// Recenter with the algorithm matching `policy`.
///
/// Zero boundaries are solved on the padded periodic grid and use the
/// circular shift.
pub fn recenter<T, D>(
    psf: ArrayView<'_, T, D>,
    peak: &PeakLocation<D>,
    policy: BoundaryPolicy,
) -> Result<Array<T, D>>
where
    T: Copy + Zero + AddAssign,
    D: Dimension,
{
    log::debug!(
        "recentering PSF {:?} at {:?} for {} boundary",
        psf.shape(),
        peak.coords(),
        policy
    );
    match policy {
        BoundaryPolicy::Zero | BoundaryPolicy::Periodic => circ_shift(psf, peak),
        BoundaryPolicy::Reflexive => dct_shift(psf, peak),
    }
}

//! Boundary padding of images and PSFs to the working grid.
//!
//! The source is centred in the target: along every axis it starts at
//! `(target - source + 1) / 2`. With [`BoundaryPolicy::Zero`] the border stays
//! zero. With the periodic and reflexive policies the whole destination is
//! regenerated from the source through [`periodic`] or [`mirror`], so the
//! copied block and the border are produced by the same mapping.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array, ArrayView, CowArray, Dimension, IntoDimension, Slice};
use num_traits::Zero;

use crate::array::Samples;
use crate::error::{DeconvError, Result};
use crate::index_wrap::{mirror, periodic};
use crate::tiler::ExecutionContext;

/// Assumption about image content beyond its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoundaryPolicy {
    /// Content is zero outside the image.
    Zero,
    /// Content repeats circularly (FFT algebra).
    Periodic,
    /// Content is mirrored at the edges (DCT algebra).
    #[default]
    Reflexive,
}

impl BoundaryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryPolicy::Zero => "zero",
            BoundaryPolicy::Periodic => "periodic",
            BoundaryPolicy::Reflexive => "reflexive",
        }
    }
}

impl fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoundaryPolicy {
    type Err = DeconvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" | "zeros" => Ok(BoundaryPolicy::Zero),
            "periodic" | "circular" => Ok(BoundaryPolicy::Periodic),
            "reflexive" | "reflective" | "mirror" => Ok(BoundaryPolicy::Reflexive),
            _ => Err(DeconvError::InvalidBoundaryPolicy(s.to_string())),
        }
    }
}

/// Start of the source block along one axis of the padded grid.
#[inline]
pub fn centered_offset(source_len: usize, target_len: usize) -> usize {
    debug_assert!(target_len >= source_len);
    (target_len - source_len + 1) / 2
}

fn centered_offsets(source: &[usize], target: &[usize]) -> Vec<usize> {
    source
        .iter()
        .zip(target)
        .map(|(&s, &t)| centered_offset(s, t))
        .collect()
}

/// Reject shapes the padder cannot work with, before anything is allocated.
fn check_geometry(source: &[usize], target: &[usize]) -> Result<()> {
    if source.len() != target.len() {
        return Err(DeconvError::shape_mismatch(target, source));
    }
    if source.iter().any(|&s| s == 0) {
        return Err(DeconvError::DegenerateGeometry(format!(
            "source shape {:?} has an empty axis",
            source
        )));
    }
    if let Some(axis) = (0..source.len()).find(|&a| source[a] > target[a]) {
        return Err(DeconvError::DegenerateGeometry(format!(
            "source extent {} exceeds target extent {} on axis {}",
            source[axis], target[axis], axis
        )));
    }
    Ok(())
}

/// Embed `source` in an array of shape `target` under `policy`.
///
/// Returns the borrowed source when no padding is needed.
pub fn pad<'a, T, D>(
    source: ArrayView<'a, T, D>,
    target: D,
    policy: BoundaryPolicy,
    ctx: &ExecutionContext,
) -> Result<CowArray<'a, T, D>>
where
    T: Copy + Zero + Send + Sync,
    D: Dimension,
{
    if source.shape() == target.slice() {
        return Ok(CowArray::from(source));
    }
    check_geometry(source.shape(), target.slice())?;

    let offsets = centered_offsets(source.shape(), target.slice());
    log::debug!(
        "padding {:?} -> {:?} ({} boundary, offsets {:?})",
        source.shape(),
        target.slice(),
        policy,
        offsets
    );

    let padded = match policy {
        BoundaryPolicy::Zero => pad_zero(source, target, &offsets),
        BoundaryPolicy::Periodic => pad_wrapped(source, target, &offsets, periodic, ctx)?,
        BoundaryPolicy::Reflexive => pad_wrapped(source, target, &offsets, mirror, ctx)?,
    };
    Ok(CowArray::from(padded))
}

/// Text-policy entry point; unknown names fail before any work is done.
pub fn pad_with_policy_name<'a, T, D>(
    source: ArrayView<'a, T, D>,
    target: D,
    policy: &str,
    ctx: &ExecutionContext,
) -> Result<CowArray<'a, T, D>>
where
    T: Copy + Zero + Send + Sync,
    D: Dimension,
{
    let policy = policy.parse::<BoundaryPolicy>()?;
    pad(source, target, policy, ctx)
}

fn pad_zero<T, D>(source: ArrayView<'_, T, D>, target: D, offsets: &[usize]) -> Array<T, D>
where
    T: Copy + Zero,
    D: Dimension,
{
    let mut padded = Array::zeros(target);
    let shape = source.shape();
    padded
        .slice_each_axis_mut(|ax| {
            let a = ax.axis.index();
            Slice::from(offsets[a]..offsets[a] + shape[a])
        })
        .assign(&source);
    padded
}

fn pad_wrapped<T, D>(
    source: ArrayView<'_, T, D>,
    target: D,
    offsets: &[usize],
    wrap: fn(isize, usize) -> usize,
    ctx: &ExecutionContext,
) -> Result<Array<T, D>>
where
    T: Copy + Zero + Send + Sync,
    D: Dimension,
{
    let ndim = target.ndim();
    // The mapping is separable: one lookup table per axis.
    let source_index: Vec<Vec<usize>> = (0..ndim)
        .map(|a| {
            let len = source.len_of(ndarray::Axis(a));
            (0..target[a])
                .map(|d| wrap(d as isize - offsets[a] as isize, len))
                .collect()
        })
        .collect();

    let samples = Samples::new(source);
    let mut padded = Array::zeros(target);
    ctx.run_split_mut(padded.view_mut(), |range, mut tile| {
        let mut src = D::zeros(ndim);
        for (pattern, slot) in tile.indexed_iter_mut() {
            let mut dest = pattern.into_dimension();
            dest[0] += range.start;
            for (a, s) in src.slice_mut().iter_mut().enumerate() {
                *s = source_index[a][dest[a]];
            }
            *slot = samples.get(&src);
        }
        Ok(())
    })?;
    Ok(padded)
}

/// Extract the centred block of shape `shape` from a padded array.
///
/// Inverse of [`pad`] for the region the source occupied.
pub fn crop<T, D>(padded: ArrayView<'_, T, D>, shape: D) -> Result<Array<T, D>>
where
    T: Clone,
    D: Dimension,
{
    check_geometry(shape.slice(), padded.shape())?;
    let offsets = centered_offsets(shape.slice(), padded.shape());
    Ok(padded
        .slice_each_axis(|ax| {
            let a = ax.axis.index();
            Slice::from(offsets[a]..offsets[a] + shape[a])
        })
        .to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelConfig;
    use ndarray::{array, s, Array2, Array3, Ix2, Ix3};
    use rustfft::num_complex::Complex;

    struct SimpleLcg {
        state: u64,
    }

    impl SimpleLcg {
        fn new(seed: u64) -> Self {
            Self { state: seed }
        }

        fn next_f64(&mut self) -> f64 {
            self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((self.state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
        }
    }

    fn random_matrix(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
        let mut rng = SimpleLcg::new(seed);
        Array2::from_shape_fn((rows, cols), |_| rng.next_f64())
    }

    fn seq() -> ExecutionContext {
        ExecutionContext::sequential()
    }

    fn par(threads: usize) -> ExecutionContext {
        ExecutionContext::new(KernelConfig::with_threads(threads)).unwrap()
    }

    const POLICIES: [BoundaryPolicy; 3] = [
        BoundaryPolicy::Zero,
        BoundaryPolicy::Periodic,
        BoundaryPolicy::Reflexive,
    ];

    // ==================== Policy Parsing ====================

    #[test]
    fn test_policy_parse() {
        assert_eq!("zero".parse::<BoundaryPolicy>().unwrap(), BoundaryPolicy::Zero);
        assert_eq!(
            " Periodic ".parse::<BoundaryPolicy>().unwrap(),
            BoundaryPolicy::Periodic
        );
        assert_eq!(
            "REFLEXIVE".parse::<BoundaryPolicy>().unwrap(),
            BoundaryPolicy::Reflexive
        );
        assert_eq!(
            "mirror".parse::<BoundaryPolicy>().unwrap(),
            BoundaryPolicy::Reflexive
        );
    }

    #[test]
    fn test_policy_parse_rejects_unknown() {
        let err = "wrap".parse::<BoundaryPolicy>().unwrap_err();
        assert!(matches!(err, DeconvError::InvalidBoundaryPolicy(name) if name == "wrap"));
    }

    #[test]
    fn test_policy_display_roundtrip() {
        for policy in POLICIES {
            assert_eq!(policy.to_string().parse::<BoundaryPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_named_policy_fails_fast() {
        let x = random_matrix(4, 4, 1);
        let result = pad_with_policy_name(x.view(), Ix2(8, 8), "neumann", &seq());
        assert!(matches!(result, Err(DeconvError::InvalidBoundaryPolicy(_))));
    }

    // ==================== Geometry ====================

    #[test]
    fn test_offset_rounding() {
        assert_eq!(centered_offset(4, 8), 2);
        assert_eq!(centered_offset(4, 7), 2);
        assert_eq!(centered_offset(4, 6), 1);
        assert_eq!(centered_offset(5, 8), 2);
        assert_eq!(centered_offset(5, 5), 0);
        assert_eq!(centered_offset(1, 2), 1);
    }

    #[test]
    fn test_target_smaller_than_source_rejected() {
        let x = random_matrix(6, 6, 2);
        for policy in POLICIES {
            let result = pad(x.view(), Ix2(8, 5), policy, &seq());
            assert!(matches!(result, Err(DeconvError::DegenerateGeometry(_))));
        }
    }

    #[test]
    fn test_empty_source_rejected() {
        let x = Array2::<f64>::zeros((0, 3));
        let result = pad(x.view(), Ix2(4, 4), BoundaryPolicy::Periodic, &seq());
        assert!(matches!(result, Err(DeconvError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_rank_mismatch_rejected() {
        let x = Array2::<f64>::zeros((2, 2)).into_dyn();
        let result = pad(
            x.view(),
            ndarray::IxDyn(&[4, 4, 4]),
            BoundaryPolicy::Zero,
            &seq(),
        );
        assert!(matches!(result, Err(DeconvError::ShapeMismatch { .. })));
    }

    // ==================== Identity ====================

    #[test]
    fn test_identity_borrows_source() {
        let x = random_matrix(5, 7, 3);
        for policy in POLICIES {
            let padded = pad(x.view(), Ix2(5, 7), policy, &seq()).unwrap();
            assert!(padded.is_view(), "{} pad of same shape should borrow", policy);
            assert_eq!(padded, x);
        }
    }

    #[test]
    fn test_identity_holds_for_empty_source() {
        let x = Array2::<f64>::zeros((0, 3));
        for policy in POLICIES {
            let padded = pad(x.view(), Ix2(0, 3), policy, &seq()).unwrap();
            assert!(padded.is_view());
            assert_eq!(padded.dim(), (0, 3));
        }
    }

    // ==================== Zero Policy ====================

    #[test]
    fn test_zero_pad_roundtrip_crop() {
        let x = random_matrix(4, 4, 4);
        let padded = pad(x.view(), Ix2(8, 8), BoundaryPolicy::Zero, &seq()).unwrap();
        assert_eq!(padded.dim(), (8, 8));
        assert_eq!(padded.slice(s![2..6, 2..6]), x);
        let cropped = crop(padded.view(), Ix2(4, 4)).unwrap();
        assert_eq!(cropped, x);
    }

    #[test]
    fn test_zero_pad_border_is_zero() {
        let x = Array2::from_elem((3, 2), 7.0f32);
        let padded = pad(x.view(), Ix2(6, 5), BoundaryPolicy::Zero, &seq()).unwrap();
        // offsets: rows (6-3+1)/2 = 2, cols (5-2+1)/2 = 2
        for ((r, c), &v) in padded.indexed_iter() {
            let inside = (2..5).contains(&r) && (2..4).contains(&c);
            assert_eq!(v, if inside { 7.0 } else { 0.0 }, "at ({}, {})", r, c);
        }
    }

    // ==================== Periodic / Reflexive ====================

    #[test]
    fn test_periodic_pad_1d_row() {
        let x = array![[1.0, 2.0, 3.0]];
        let padded = pad(x.view(), Ix2(1, 7), BoundaryPolicy::Periodic, &seq()).unwrap();
        // offset (7-3+1)/2 = 2: dest c -> src (c-2) mod 3
        assert_eq!(padded, array![[2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0]]);
    }

    #[test]
    fn test_reflexive_pad_1d_row() {
        let x = array![[1.0, 2.0, 3.0]];
        let padded = pad(x.view(), Ix2(1, 8), BoundaryPolicy::Reflexive, &seq()).unwrap();
        // offset (8-3+1)/2 = 3: dest c -> mirror(c-3, 3)
        assert_eq!(padded, array![[3.0, 2.0, 1.0, 1.0, 2.0, 3.0, 3.0, 2.0]]);
    }

    #[test]
    fn test_wrapped_pad_keeps_source_block() {
        let x = random_matrix(5, 3, 5);
        for policy in [BoundaryPolicy::Periodic, BoundaryPolicy::Reflexive] {
            let padded = pad(x.view(), Ix2(9, 8), policy, &seq()).unwrap();
            let cropped = crop(padded.view(), Ix2(5, 3)).unwrap();
            assert_eq!(cropped, x, "{} pad must keep the source block", policy);
        }
    }

    #[test]
    fn test_reflexive_pad_2d_corners() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let padded = pad(x.view(), Ix2(4, 4), BoundaryPolicy::Reflexive, &seq()).unwrap();
        // offset 1 on both axes: index map [mirror(-1), 0, 1, mirror(2)] = [0, 0, 1, 1]
        let expected = array![
            [1.0, 1.0, 2.0, 2.0],
            [1.0, 1.0, 2.0, 2.0],
            [3.0, 3.0, 4.0, 4.0],
            [3.0, 3.0, 4.0, 4.0]
        ];
        assert_eq!(padded, expected);
    }

    #[test]
    fn test_periodic_pad_3d() {
        let x = Array3::from_shape_fn((2, 3, 2), |(s, r, c)| (s * 100 + r * 10 + c) as f64);
        let padded = pad(x.view(), Ix3(4, 5, 4), BoundaryPolicy::Periodic, &seq()).unwrap();
        let offsets = [1usize, 1, 1];
        for ((s, r, c), &v) in padded.indexed_iter() {
            let src = (
                periodic(s as isize - offsets[0] as isize, 2),
                periodic(r as isize - offsets[1] as isize, 3),
                periodic(c as isize - offsets[2] as isize, 2),
            );
            assert_eq!(v, x[src]);
        }
    }

    #[test]
    fn test_complex_elements_padded() {
        let x = Array2::from_shape_fn((2, 2), |(r, c)| Complex::new(r as f64, c as f64));
        let padded = pad(x.view(), Ix2(4, 4), BoundaryPolicy::Periodic, &seq()).unwrap();
        assert_eq!(padded[[1, 1]], Complex::new(0.0, 0.0));
        assert_eq!(padded[[0, 0]], Complex::new(1.0, 1.0));
    }

    #[test]
    fn test_source_not_mutated() {
        let x = random_matrix(3, 4, 6);
        let before = x.clone();
        for policy in POLICIES {
            let _ = pad(x.view(), Ix2(7, 9), policy, &par(3)).unwrap();
        }
        assert_eq!(x, before);
    }

    // ==================== Access Paths & Parallelism ====================

    #[test]
    fn test_strided_source_matches_contiguous() {
        let big = random_matrix(10, 12, 7);
        let view = big.slice(s![1..;2, ..;3]);
        let owned = view.to_owned();
        for policy in POLICIES {
            let from_view = pad(view, Ix2(9, 11), policy, &seq()).unwrap();
            let from_owned = pad(owned.view(), Ix2(9, 11), policy, &seq()).unwrap();
            assert_eq!(from_view, from_owned, "{} pad differs across layouts", policy);
        }
    }

    #[test]
    fn test_sequential_parallel_bit_identical() {
        let x = random_matrix(13, 11, 8);
        for policy in POLICIES {
            let a = pad(x.view(), Ix2(32, 29), policy, &seq()).unwrap();
            let b = pad(x.view(), Ix2(32, 29), policy, &par(4)).unwrap();
            assert!(
                a.iter().zip(b.iter()).all(|(p, q)| p.to_bits() == q.to_bits()),
                "{} pad differs between 1 and 4 workers",
                policy
            );
        }
    }

    #[test]
    fn test_sequential_parallel_bit_identical_3d() {
        let mut rng = SimpleLcg::new(9);
        let x = Array3::from_shape_fn((5, 6, 7), |_| rng.next_f64());
        for policy in POLICIES {
            let a = pad(x.view(), Ix3(11, 9, 10), policy, &seq()).unwrap();
            let b = pad(x.view(), Ix3(11, 9, 10), policy, &par(4)).unwrap();
            assert_eq!(a, b);
        }
    }

    // ==================== Crop ====================

    #[test]
    fn test_crop_rejects_larger_shape() {
        let x = random_matrix(4, 4, 10);
        let result = crop(x.view(), Ix2(5, 4));
        assert!(matches!(result, Err(DeconvError::DegenerateGeometry(_))));
    }
}

//! Uniform element access over contiguous and strided arrays.
//!
//! Kernel routines read their input through [`Samples`]. A standard-layout
//! input is read straight from its backing slice with a row-major linear
//! index; anything else (sliced or transposed views) is read by coordinate.
//! Both paths return the same element for the same index.

use ndarray::{ArrayView, Dimension};

/// Read-only accessor over an n-dimensional array.
pub struct Samples<'a, T, D: Dimension> {
    view: ArrayView<'a, T, D>,
    contiguous: Option<(&'a [T], Vec<usize>)>,
}

impl<'a, T: Copy, D: Dimension> Samples<'a, T, D> {
    pub fn new(view: ArrayView<'a, T, D>) -> Self {
        let contiguous = view
            .to_slice()
            .map(|data| (data, row_major_strides(view.shape())));
        Self { view, contiguous }
    }

    /// True when elements are read from the backing slice directly.
    pub fn is_contiguous(&self) -> bool {
        self.contiguous.is_some()
    }

    pub fn shape(&self) -> &[usize] {
        self.view.shape()
    }

    /// Element at `index`. The index must be in bounds.
    #[inline]
    pub fn get(&self, index: &D) -> T {
        match &self.contiguous {
            Some((data, strides)) => data[linear_index(index.slice(), strides)],
            None => self.view[index.clone()],
        }
    }
}

/// Row-major element strides for `shape`: `((s*rows + r)*cols + c)` in 3D.
pub fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

#[inline(always)]
pub fn linear_index(index: &[usize], strides: &[usize]) -> usize {
    index.iter().zip(strides).map(|(&i, &s)| i * s).sum()
}

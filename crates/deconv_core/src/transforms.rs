//! Separable N-dimensional FFT over ndarray arrays.
//!
//! Produces the complex spectra that [`crate::filter`] inverts for the
//! periodic and zero boundary policies.

use std::sync::Arc;

use ndarray::{Array, ArrayView, Axis, Dimension};
use rustfft::{num_complex::Complex, Fft, FftDirection, FftPlanner};

use crate::error::{DeconvError, Result};
use crate::float_trait::DeconvFloat;

/// Forward and inverse plans for every axis of one array shape.
pub struct SpectralPlans<F: DeconvFloat> {
    shape: Vec<usize>,
    forward: Vec<Arc<dyn Fft<F>>>,
    inverse: Vec<Arc<dyn Fft<F>>>,
}

impl<F: DeconvFloat> SpectralPlans<F> {
    pub fn new(shape: &[usize]) -> Self {
        let mut planner = FftPlanner::<F>::new();
        let forward = shape.iter().map(|&n| planner.plan_fft_forward(n)).collect();
        let inverse = shape.iter().map(|&n| planner.plan_fft_inverse(n)).collect();
        Self {
            shape: shape.to_vec(),
            forward,
            inverse,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn check(&self, shape: &[usize]) -> Result<()> {
        if self.shape != shape {
            return Err(DeconvError::shape_mismatch(&self.shape, shape));
        }
        Ok(())
    }

    fn plans(&self, direction: FftDirection) -> &[Arc<dyn Fft<F>>] {
        match direction {
            FftDirection::Forward => &self.forward,
            FftDirection::Inverse => &self.inverse,
        }
    }
}

/// Unnormalized transform of `data` along every axis, in place.
pub fn fft_in_place<F, D>(
    data: &mut Array<Complex<F>, D>,
    plans: &SpectralPlans<F>,
    direction: FftDirection,
) -> Result<()>
where
    F: DeconvFloat,
    D: Dimension,
{
    plans.check(data.shape())?;
    for (axis, plan) in plans.plans(direction).iter().enumerate() {
        let len = data.len_of(Axis(axis));
        let mut buffer = vec![Complex::new(F::zero(), F::zero()); len];
        let mut scratch = vec![Complex::new(F::zero(), F::zero()); plan.get_inplace_scratch_len()];
        for mut lane in data.lanes_mut(Axis(axis)) {
            for (b, v) in buffer.iter_mut().zip(lane.iter()) {
                *b = *v;
            }
            plan.process_with_scratch(&mut buffer, &mut scratch);
            for (v, b) in lane.iter_mut().zip(buffer.iter()) {
                *v = *b;
            }
        }
    }
    Ok(())
}

/// Forward FFT of a real array. Unnormalized.
pub fn fft_real<F, D>(input: ArrayView<'_, F, D>, plans: &SpectralPlans<F>) -> Result<Array<Complex<F>, D>>
where
    F: DeconvFloat,
    D: Dimension,
{
    plans.check(input.shape())?;
    let mut spectrum = input.mapv(|v| Complex::new(v, F::zero()));
    fft_in_place(&mut spectrum, plans, FftDirection::Forward)?;
    Ok(spectrum)
}

/// Inverse FFT keeping the real part, normalized by `1/N`.
pub fn ifft_real<F, D>(input: ArrayView<'_, Complex<F>, D>, plans: &SpectralPlans<F>) -> Result<Array<F, D>>
where
    F: DeconvFloat,
    D: Dimension,
{
    plans.check(input.shape())?;
    let mut data = input.to_owned();
    fft_in_place(&mut data, plans, FftDirection::Inverse)?;
    let norm = F::one() / F::usize_as(data.len().max(1));
    Ok(data.mapv(|v| v.re * norm))
}

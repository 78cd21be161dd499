//! Conversion between host rasters and kernel arrays.
//!
//! Rasters are addressed as `(row, col)`; `image` buffers store `(x, y)`, so
//! the adapters swap the pair. Values travel through `f64`.

use image::{ImageBuffer, Luma, Primitive};
use ndarray::{ArrayView2, ArrayView3, ArrayViewMut2, ArrayViewMut3, Axis};

use crate::error::{DeconvError, Result};
use crate::float_trait::DeconvFloat;

/// Grey-level sample type of a host raster.
pub trait RasterSample: Primitive {
    fn as_f64(self) -> f64;

    /// Convert, rounding and clamping to the representable range.
    fn from_f64_saturating(value: f64) -> Self;
}

impl RasterSample for u8 {
    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64_saturating(value: f64) -> Self {
        value.round().clamp(0.0, u8::MAX as f64) as u8
    }
}

impl RasterSample for u16 {
    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64_saturating(value: f64) -> Self {
        value.round().clamp(0.0, u16::MAX as f64) as u16
    }
}

impl RasterSample for f32 {
    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64_saturating(value: f64) -> Self {
        value as f32
    }
}

/// A 2D raster with a known size.
pub trait Raster {
    /// `(rows, cols)`.
    fn raster_shape(&self) -> (usize, usize);
}

pub trait PixelSource: Raster {
    fn sample(&self, row: usize, col: usize) -> f64;
}

pub trait PixelSink: Raster {
    fn put_sample(&mut self, row: usize, col: usize, value: f64);
}

impl<P: RasterSample> Raster for ImageBuffer<Luma<P>, Vec<P>> {
    fn raster_shape(&self) -> (usize, usize) {
        (self.height() as usize, self.width() as usize)
    }
}

impl<P: RasterSample> PixelSource for ImageBuffer<Luma<P>, Vec<P>> {
    #[inline]
    fn sample(&self, row: usize, col: usize) -> f64 {
        self.get_pixel(col as u32, row as u32).0[0].as_f64()
    }
}

impl<P: RasterSample> PixelSink for ImageBuffer<Luma<P>, Vec<P>> {
    #[inline]
    fn put_sample(&mut self, row: usize, col: usize, value: f64) {
        self.put_pixel(col as u32, row as u32, Luma([P::from_f64_saturating(value)]));
    }
}

fn check_raster<R: Raster>(raster: &R, rows: usize, cols: usize) -> Result<()> {
    let (r, c) = raster.raster_shape();
    if (r, c) != (rows, cols) {
        return Err(DeconvError::shape_mismatch(&[rows, cols], &[r, c]));
    }
    Ok(())
}

/// Copy `src` into `dest`. Shapes must match exactly.
pub fn read_into<F, S>(mut dest: ArrayViewMut2<'_, F>, src: &S) -> Result<()>
where
    F: DeconvFloat,
    S: PixelSource,
{
    let (rows, cols) = dest.dim();
    check_raster(src, rows, cols)?;
    for ((r, c), slot) in dest.indexed_iter_mut() {
        *slot = F::from_f64_c(src.sample(r, c));
    }
    Ok(())
}

/// Copy `src` into `sink`. Values strictly below `threshold` are written as 0.
pub fn write_from<F, S>(src: ArrayView2<'_, F>, sink: &mut S, threshold: Option<F>) -> Result<()>
where
    F: DeconvFloat,
    S: PixelSink,
{
    let (rows, cols) = src.dim();
    check_raster(sink, rows, cols)?;
    for ((r, c), &v) in src.indexed_iter() {
        let v = match threshold {
            Some(t) if v < t => F::zero(),
            _ => v,
        };
        sink.put_sample(r, c, v.to_f64().unwrap_or(f64::NAN));
    }
    Ok(())
}

fn check_stack_depth(expected: usize, found: usize, rows: usize, cols: usize) -> Result<()> {
    if expected != found {
        return Err(DeconvError::shape_mismatch(
            &[expected, rows, cols],
            &[found, rows, cols],
        ));
    }
    Ok(())
}

/// Read one raster per leading-axis index of `dest`.
pub fn read_stack_into<F, S>(mut dest: ArrayViewMut3<'_, F>, slices: &[S]) -> Result<()>
where
    F: DeconvFloat,
    S: PixelSource,
{
    let (depth, rows, cols) = dest.dim();
    check_stack_depth(depth, slices.len(), rows, cols)?;
    for raster in slices {
        check_raster(raster, rows, cols)?;
    }
    for (plane, raster) in dest.axis_iter_mut(Axis(0)).zip(slices) {
        read_into(plane, raster)?;
    }
    Ok(())
}

/// Write each leading-axis slice of `src` to the matching sink.
pub fn write_stack_from<F, S>(src: ArrayView3<'_, F>, sinks: &mut [S], threshold: Option<F>) -> Result<()>
where
    F: DeconvFloat,
    S: PixelSink,
{
    let (depth, rows, cols) = src.dim();
    check_stack_depth(depth, sinks.len(), rows, cols)?;
    for sink in sinks.iter() {
        check_raster(sink, rows, cols)?;
    }
    for (plane, sink) in src.axis_iter(Axis(0)).zip(sinks.iter_mut()) {
        write_from(plane, sink, threshold)?;
    }
    Ok(())
}

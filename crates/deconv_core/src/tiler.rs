//! Range tiling over the leading axis.
//!
//! Every array-producing operation in the kernel writes its destination
//! through [`ExecutionContext::run_split_mut`]. The leading axis (rows in 2D,
//! slices in 3D) is cut into contiguous [`TileRange`]s, each range gets the
//! matching disjoint sub-view of the destination, and the call returns only
//! after every range has finished. Because a range never touches another
//! range's rows, the result does not depend on the worker count.

use std::sync::Arc;

use ndarray::{ArrayViewMut, Axis, Dimension};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::KernelConfig;
use crate::error::{DeconvError, Result};

/// Half-open interval `[start, end)` over the leading axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub start: usize,
    pub end: usize,
}

impl TileRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Split `[0, len)` into `parts` ranges of `len / parts`; the last range
/// absorbs the remainder. Empty ranges are kept so the result always has
/// exactly `parts` entries.
pub fn partition(len: usize, parts: usize) -> Vec<TileRange> {
    let parts = parts.max(1);
    let chunk = len / parts;
    (0..parts)
        .map(|p| {
            let start = p * chunk;
            let end = if p == parts - 1 { len } else { start + chunk };
            TileRange::new(start, end)
        })
        .collect()
}

/// Worker pool plus the policy deciding when to use it.
///
/// Cloning is cheap; clones share the same pool.
#[derive(Clone)]
pub struct ExecutionContext {
    config: KernelConfig,
    pool: Option<Arc<ThreadPool>>,
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("config", &self.config)
            .field("pooled", &self.pool.is_some())
            .finish()
    }
}

impl ExecutionContext {
    /// Build a context with a dedicated pool of `config.threads` workers.
    pub fn new(config: KernelConfig) -> Result<Self> {
        config.validate()?;
        let pool = if config.threads > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .thread_name(|i| format!("deconv-tile-{}", i))
                .build()?;
            Some(Arc::new(pool))
        } else {
            None
        };
        log::debug!(
            "execution context: threads={} min_parallel_size={}",
            config.threads,
            config.min_parallel_size
        );
        Ok(Self { config, pool })
    }

    /// Context that always runs on the caller thread.
    pub fn sequential() -> Self {
        Self {
            config: KernelConfig::sequential(),
            pool: None,
        }
    }

    /// Context built from [`KernelConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(KernelConfig::from_env())
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn threads(&self) -> usize {
        self.config.threads
    }

    /// Ranges to dispatch, or `None` when the work stays on the caller thread.
    fn plan(&self, len: usize, total_elements: usize) -> Option<Vec<TileRange>> {
        let ranges: Vec<TileRange> = if self.config.threads <= 1
            || self.pool.is_none()
            || total_elements < self.config.min_parallel_size
        {
            Vec::new()
        } else {
            partition(len, self.config.threads)
                .into_iter()
                .filter(|r| !r.is_empty())
                .collect()
        };
        if ranges.len() <= 1 {
            log::debug!(
                "running {} leading rows ({} elements) on the caller thread",
                len,
                total_elements
            );
            return None;
        }
        log::debug!(
            "tiling {} leading rows ({} elements) into {} ranges",
            len,
            total_elements,
            ranges.len()
        );
        Some(ranges)
    }

    /// Run `body` over `[0, len)`, either once on the caller thread or once
    /// per range on the pool.
    ///
    /// All ranges complete before the first error (in range order) is
    /// returned.
    pub fn run<B>(&self, len: usize, total_elements: usize, body: B) -> Result<()>
    where
        B: Fn(TileRange) -> Result<()> + Sync,
    {
        let (ranges, pool) = match (self.plan(len, total_elements), self.pool.as_ref()) {
            (Some(ranges), Some(pool)) => (ranges, pool),
            _ => return body(TileRange::new(0, len)),
        };

        let mut outcomes: Vec<Result<()>> = ranges.iter().map(|_| Ok(())).collect();
        let body = &body;
        pool.scope(|scope| {
            for (range, slot) in ranges.iter().copied().zip(outcomes.iter_mut()) {
                scope.spawn(move |_| {
                    *slot = body(range);
                });
            }
        });
        outcomes.into_iter().collect()
    }

    /// Split `dest` along `Axis(0)` and hand every range its own sub-view.
    ///
    /// The sub-view passed with range `r` covers leading indices
    /// `r.start..r.end` of `dest`, re-based at 0.
    pub fn run_split_mut<T, D, B>(&self, dest: ArrayViewMut<'_, T, D>, body: B) -> Result<()>
    where
        T: Send,
        D: Dimension,
        B: Fn(TileRange, ArrayViewMut<'_, T, D>) -> Result<()> + Sync,
    {
        if dest.ndim() == 0 {
            return Err(DeconvError::InvalidParameter(
                "cannot tile a zero-dimensional array".to_string(),
            ));
        }
        let len = dest.len_of(Axis(0));
        let (ranges, pool) = match (self.plan(len, dest.len()), self.pool.as_ref()) {
            (Some(ranges), Some(pool)) => (ranges, pool),
            _ => return body(TileRange::new(0, len), dest),
        };

        let mut pieces = Vec::with_capacity(ranges.len());
        let mut rest = dest;
        for range in &ranges {
            let (head, tail) = rest.split_at(Axis(0), range.len());
            pieces.push((*range, head));
            rest = tail;
        }
        debug_assert_eq!(rest.len_of(Axis(0)), 0);

        let mut outcomes: Vec<Result<()>> = pieces.iter().map(|_| Ok(())).collect();
        let body = &body;
        pool.scope(|scope| {
            for ((range, view), slot) in pieces.into_iter().zip(outcomes.iter_mut()) {
                scope.spawn(move |_| {
                    *slot = body(range, view);
                });
            }
        });
        outcomes.into_iter().collect()
    }
}

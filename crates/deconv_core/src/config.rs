//! Execution configuration for the kernel.
//!
//! The worker count is an explicit value carried by [`KernelConfig`] (and the
//! [`ExecutionContext`](crate::tiler::ExecutionContext) built from it). A
//! process-wide default still exists for tuning workflows: set it once with
//! [`set_default_threads`] or through the `DECONV_THREADS` environment
//! variable, and every context built afterwards with `Default` picks it up.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{DeconvError, Result};

// =============================================================================
// Constants
// =============================================================================

/// Below this many destination elements the tiler runs on the caller thread.
/// 256 x 256 images are the smallest size where splitting pays off.
pub const DEFAULT_MIN_PARALLEL_SIZE: usize = 65_536;

const THREADS_ENV: &str = "DECONV_THREADS";
const MIN_PARALLEL_SIZE_ENV: &str = "DECONV_MIN_PARALLEL_SIZE";

/// 0 = not set, fall back to the environment / hardware.
static DEFAULT_THREADS: AtomicUsize = AtomicUsize::new(0);

/// Set the process-wide default worker count.
///
/// Passing 0 clears the override.
pub fn set_default_threads(threads: usize) {
    DEFAULT_THREADS.store(threads, Ordering::Relaxed);
}

/// Current process-wide default worker count.
///
/// Resolution order: [`set_default_threads`], `DECONV_THREADS`, then the
/// number of available hardware threads.
pub fn default_threads() -> usize {
    let stored = DEFAULT_THREADS.load(Ordering::Relaxed);
    if stored > 0 {
        return stored;
    }
    resolve_env_usize(THREADS_ENV).unwrap_or_else(available_threads)
}

fn available_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn resolve_env_usize(name: &str) -> Option<usize> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(v) if v > 0 => Some(v),
        _ => {
            log::warn!("ignoring {}={:?}: expected a positive integer", name, raw);
            None
        }
    }
}

// =============================================================================
// KernelConfig
// =============================================================================

/// Worker count and parallel threshold for tiled operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Number of workers. 1 = always sequential.
    pub threads: usize,
    /// Minimum destination size (in elements) before work is split.
    pub min_parallel_size: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            min_parallel_size: DEFAULT_MIN_PARALLEL_SIZE,
        }
    }
}

impl KernelConfig {
    /// Configuration that never leaves the caller thread.
    pub fn sequential() -> Self {
        Self {
            threads: 1,
            min_parallel_size: DEFAULT_MIN_PARALLEL_SIZE,
        }
    }

    /// Fixed worker count, splitting regardless of problem size.
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads,
            min_parallel_size: 0,
        }
    }

    /// Defaults with `DECONV_MIN_PARALLEL_SIZE` applied. The worker count
    /// comes from [`default_threads`], which already honours `DECONV_THREADS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(size) = resolve_env_usize(MIN_PARALLEL_SIZE_ENV) {
            config.min_parallel_size = size;
        }
        log::debug!(
            "kernel config: threads={} min_parallel_size={}",
            config.threads,
            config.min_parallel_size
        );
        config
    }

    /// Validate the configuration parameters.
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(DeconvError::InvalidParameter(
                "threads must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

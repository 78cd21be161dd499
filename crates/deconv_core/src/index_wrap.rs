//! Coordinate wrapping for out-of-range indices.
//!
//! Both functions fold an arbitrary integer coordinate onto `[0, n)` by first
//! reducing it modulo `2n`, which is the period of the mirrored extension.

/// Circular wrap: `periodic(i, n) == i mod n`, always in `[0, n)`.
#[inline(always)]
pub fn periodic(i: isize, n: usize) -> usize {
    debug_assert!(n > 0, "wrap length must be positive");
    let period = 2 * n as isize;
    let m = i.rem_euclid(period) as usize;
    if m < n {
        m
    } else {
        m - n
    }
}

/// Reflect-and-repeat wrap.
///
/// `-1 -> 0`, `-2 -> 1`, `n -> n-1`, `n+1 -> n-2`: the edge sample is repeated
/// once at the reflection point and never again.
#[inline(always)]
pub fn mirror(i: isize, n: usize) -> usize {
    debug_assert!(n > 0, "wrap length must be positive");
    let period = 2 * n as isize;
    let m = i.rem_euclid(period) as usize;
    if m < n {
        m
    } else {
        n - (m % n) - 1
    }
}

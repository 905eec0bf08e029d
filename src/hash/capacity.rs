//! Capacity sizing shared by every container growth path

use crate::error::{Result, RuntimeError};

/// Round `min` up to a power of two no larger than `max`.
///
/// `max` is the largest element count the backing array can represent.
/// A request above `max` always fails with `AllocationFailed`. When only the
/// rounding step overflows, `saturate` clamps to the largest power of two
/// that fits instead of failing. A `min` of zero is treated as one.
pub fn round_capacity(min: usize, max: usize, saturate: bool) -> Result<usize> {
    if min > max || max == 0 {
        return Err(RuntimeError::allocation_failed(format!(
            "capacity {} exceeds representable maximum {}",
            min, max
        )));
    }

    match min.max(1).checked_next_power_of_two() {
        Some(rounded) if rounded <= max => Ok(rounded),
        _ if saturate => Ok(floor_power_of_two(max)),
        _ => Err(RuntimeError::allocation_failed(format!(
            "capacity {} cannot be rounded to a power of two within {}",
            min, max
        ))),
    }
}

/// Largest power of two that is `<= n` (0 for 0)
#[inline]
pub fn floor_power_of_two(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        1 << (usize::BITS - 1 - n.leading_zeros())
    }
}

//! Read-ahead budget for preloading.

use crate::settings::{BtSettings, MIB};

/// Fixed preload size when buffered preload is off.
pub const DEFAULT_PRELOAD_BYTES: i64 = 32 * MIB;

/// Number of bytes to read ahead for content of `content_size` bytes.
///
/// Never exceeds the cache capacity. A `content_size` of 0 means unknown and
/// does not clamp.
pub fn preload_budget(settings: &BtSettings, content_size: u64) -> u64 {
    let capacity = settings.cache_capacity_bytes;
    if capacity <= 0 {
        return 0;
    }

    let budget = if settings.buffered_preload {
        let percent = settings.read_ahead_percent.clamp(0.0, 100.0);
        let percent = if percent.is_nan() { 0.0 } else { percent };
        ((percent / 100.0) * capacity as f64) as i64
    } else {
        DEFAULT_PRELOAD_BYTES.min(capacity)
    };

    let budget = budget.clamp(0, capacity) as u64;
    if content_size > 0 {
        budget.min(content_size)
    } else {
        budget
    }
}

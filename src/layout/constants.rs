//! Constants for the shared broadcast ring layout

/// Cache line size for alignment (64 bytes on most x86_64 systems)
pub const CACHE_LINE_SIZE: usize = 64;

/// Alignment boundary for record lengths and therefore record start offsets
pub const RECORD_ALIGNMENT: usize = CACHE_LINE_SIZE;

/// Size of the control block that trails the ring (two cache lines)
pub const TRAILER_LENGTH: usize = 2 * CACHE_LINE_SIZE;

/// Byte offset of the tail counter within the trailer
///
/// The tail counter holds the unbounded stream position of the next record
/// to be written. Producer-written with release ordering, monotonically
/// non-decreasing.
pub const TAIL_COUNTER_OFFSET: usize = 0;

/// Byte offset of the latest-record counter within the trailer
///
/// Holds the unbounded stream position of the start of the most recently
/// completed record, so a lapped receiver can resynchronize without
/// scanning.
pub const LATEST_RECORD_OFFSET: usize = 8;

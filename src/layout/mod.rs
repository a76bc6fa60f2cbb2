//! Physical layout of the shared broadcast ring
//!
//! Pure data-layout contract: the split of a region into ring plus trailing
//! control block, the record header format, and the translation between
//! unbounded stream positions and physical ring offsets. No behavior lives
//! here; the producer and every receiver attached to the same region must
//! agree on these definitions bit for bit.

pub mod constants;
pub mod geometry;
pub mod records;

pub use constants::{
    CACHE_LINE_SIZE, LATEST_RECORD_OFFSET, RECORD_ALIGNMENT, TAIL_COUNTER_OFFSET, TRAILER_LENGTH,
};
pub use geometry::{RingGeometry, StreamPosition};
pub use records::{FIRST_USER_TYPE_ID, HEADER_LENGTH, PADDING_TYPE_ID};

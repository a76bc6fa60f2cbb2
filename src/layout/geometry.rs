//! Ring geometry and the two offset coordinate systems
//!
//! Positions in the record stream are unbounded 64-bit byte offsets that only
//! ever grow; the ring itself is finite. Lapping detection and catch-up math
//! are only correct in the unbounded coordinate space, so the two systems are
//! kept distinct: [`StreamPosition`] for stream math, plain `usize` for
//! physical offsets within the region.

use crate::error::{CrierError, Result};

use super::constants::{LATEST_RECORD_OFFSET, TAIL_COUNTER_OFFSET, TRAILER_LENGTH};

/// Unbounded byte position in the record stream, never wrapped
pub type StreamPosition = u64;

/// Physical geometry of a broadcast ring region
///
/// A region of `capacity + TRAILER_LENGTH` bytes splits into the ring and a
/// trailing control block. Capacity must be a power of two so unbounded
/// positions wrap onto the ring with a single mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingGeometry {
    capacity: usize,
    mask: u64,
}

impl RingGeometry {
    /// Derive the geometry for a region of `total_size` bytes
    ///
    /// Fails when the region cannot hold the trailer, or when the remaining
    /// capacity is not a power of two greater than zero.
    pub fn for_total_size(total_size: usize) -> Result<Self> {
        if total_size < TRAILER_LENGTH {
            return Err(CrierError::insufficient_space(TRAILER_LENGTH, total_size));
        }

        let capacity = total_size - TRAILER_LENGTH;
        if !capacity.is_power_of_two() {
            return Err(CrierError::invalid_parameter(
                "capacity",
                "Capacity must be a power of 2 and greater than 0",
            ));
        }

        Ok(Self {
            capacity,
            mask: capacity as u64 - 1,
        })
    }

    /// Usable ring capacity in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total region size including the trailer
    pub fn total_size(&self) -> usize {
        self.capacity + TRAILER_LENGTH
    }

    /// Translate an unbounded stream position into a physical ring offset
    pub fn physical(&self, position: StreamPosition) -> usize {
        (position & self.mask) as usize
    }

    /// Absolute byte offset of the tail counter within the region
    pub fn tail_counter_offset(&self) -> usize {
        self.capacity + TAIL_COUNTER_OFFSET
    }

    /// Absolute byte offset of the latest-record counter within the region
    pub fn latest_record_offset(&self) -> usize {
        self.capacity + LATEST_RECORD_OFFSET
    }

    /// Largest payload a single record may carry in this ring
    pub fn max_payload_length(&self) -> usize {
        self.capacity / 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_from_total_size() {
        let geometry = RingGeometry::for_total_size(1024 + TRAILER_LENGTH).unwrap();
        assert_eq!(geometry.capacity(), 1024);
        assert_eq!(geometry.total_size(), 1024 + TRAILER_LENGTH);
    }

    #[test]
    fn test_rejects_non_power_of_two_capacity() {
        let result = RingGeometry::for_total_size(777 + TRAILER_LENGTH);
        assert!(matches!(
            result,
            Err(CrierError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let result = RingGeometry::for_total_size(TRAILER_LENGTH);
        assert!(matches!(
            result,
            Err(CrierError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_rejects_region_smaller_than_trailer() {
        let result = RingGeometry::for_total_size(TRAILER_LENGTH - 1);
        assert!(matches!(
            result,
            Err(CrierError::InsufficientSpace { .. })
        ));
    }

    #[test]
    fn test_physical_wraps_positions() {
        let geometry = RingGeometry::for_total_size(1024 + TRAILER_LENGTH).unwrap();

        assert_eq!(geometry.physical(0), 0);
        assert_eq!(geometry.physical(512), 512);
        assert_eq!(geometry.physical(1024), 0);
        assert_eq!(geometry.physical(1024 + 64), 64);
        assert_eq!(geometry.physical(5 * 1024 + 192), 192);
    }

    #[test]
    fn test_trailer_offsets() {
        let geometry = RingGeometry::for_total_size(1024 + TRAILER_LENGTH).unwrap();
        assert_eq!(geometry.tail_counter_offset(), 1024);
        assert_eq!(geometry.latest_record_offset(), 1024 + 8);
    }

    #[test]
    fn test_max_payload_length() {
        let geometry = RingGeometry::for_total_size(1024 + TRAILER_LENGTH).unwrap();
        assert_eq!(geometry.max_payload_length(), 128);
    }
}

//! Channel handle tying a shared region to broadcast endpoints

use std::{ptr::NonNull, sync::Arc};

use crate::{
    buffer::AtomicBuffer,
    error::{CrierError, Result},
    layout::{RingGeometry, StreamPosition, TRAILER_LENGTH},
    region::{RegionConfig, SharedRegion},
};

use super::{BroadcastReceiver, BroadcastTransmitter, CopyBroadcastReceiver};

/// A broadcast ring bound to a shared memory region
///
/// Owns the mapping through an [`Arc`] and vends transmitter and receiver
/// handles that keep the region alive for as long as they exist. The
/// single-writer rule is the caller's to uphold across processes; the
/// channel only enforces geometry.
#[derive(Debug)]
pub struct BroadcastChannel {
    region: Arc<SharedRegion>,
    buffer: AtomicBuffer,
    geometry: RingGeometry,
}

impl BroadcastChannel {
    /// Create a region sized for a broadcast ring and initialize it empty
    ///
    /// `config.size` must be a power-of-two capacity plus
    /// [`TRAILER_LENGTH`]; see [`total_size_for_capacity`].
    ///
    /// [`total_size_for_capacity`]: Self::total_size_for_capacity
    pub fn create(config: RegionConfig) -> Result<Self> {
        let channel = Self::from_region(SharedRegion::create(config)?)?;
        // Backing files can be recycled; start from an empty stream
        channel.buffer.fill(0, channel.buffer.len(), 0);
        Ok(channel)
    }

    /// Attach to an existing broadcast region without touching its contents
    pub fn open(config: RegionConfig) -> Result<Self> {
        Self::from_region(SharedRegion::open(config)?)
    }

    fn from_region(region: SharedRegion) -> Result<Self> {
        let geometry = RingGeometry::for_total_size(region.size())?;
        let ptr = NonNull::new(unsafe { region.as_mut_ptr() })
            .ok_or_else(|| CrierError::platform("Region mapped at null address"))?;
        // Mappings are page aligned, which satisfies the buffer's word
        // alignment requirement
        let buffer = unsafe { AtomicBuffer::from_raw_parts(ptr, region.size())? };

        Ok(Self {
            region: Arc::new(region),
            buffer,
            geometry,
        })
    }

    /// Region size needed for a ring of `capacity` bytes
    pub fn total_size_for_capacity(capacity: usize) -> usize {
        capacity + TRAILER_LENGTH
    }

    /// Create the writing endpoint; there must be at most one per ring
    pub fn transmitter(&self) -> Result<BroadcastTransmitter> {
        BroadcastTransmitter::with_region(self.buffer, Some(Arc::clone(&self.region)))
    }

    /// Create an independent polling receiver starting at stream position 0
    pub fn receiver(&self) -> Result<BroadcastReceiver> {
        BroadcastReceiver::with_region(self.buffer, Some(Arc::clone(&self.region)))
    }

    /// Create a receiver that delivers validated copies of each message
    pub fn copy_receiver(&self) -> Result<CopyBroadcastReceiver> {
        Ok(CopyBroadcastReceiver::new(self.receiver()?))
    }

    /// Usable ring capacity in bytes
    pub fn capacity(&self) -> usize {
        self.geometry.capacity()
    }

    /// Largest payload a single message may carry
    pub fn max_payload_length(&self) -> usize {
        self.geometry.max_payload_length()
    }

    /// Name of the underlying region
    pub fn name(&self) -> &str {
        self.region.name()
    }

    /// The underlying shared region
    pub fn region(&self) -> &Arc<SharedRegion> {
        &self.region
    }

    /// Current tail of the stream as published by the transmitter
    pub fn tail_position(&self) -> StreamPosition {
        self.buffer
            .get_u64_acquire(self.geometry.tail_counter_offset())
    }

    /// Stream position of the most recent completed record
    pub fn latest_record_position(&self) -> StreamPosition {
        self.buffer
            .get_u64_acquire(self.geometry.latest_record_offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_size_for_capacity() {
        assert_eq!(
            BroadcastChannel::total_size_for_capacity(1024),
            1024 + TRAILER_LENGTH
        );
    }
}

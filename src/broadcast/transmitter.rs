//! Transmitter side of the broadcast ring

use std::sync::Arc;

use crate::{
    buffer::AtomicBuffer,
    error::{CrierError, Result},
    layout::{
        records, RingGeometry, StreamPosition, FIRST_USER_TYPE_ID, PADDING_TYPE_ID,
        RECORD_ALIGNMENT,
    },
    region::SharedRegion,
};

/// The sole writer of a broadcast ring
///
/// Appends records in stream order and publishes them through the trailer
/// counters. Exactly one transmitter may be active per ring; nothing in the
/// memory protocol tolerates a second concurrent writer.
#[derive(Debug)]
pub struct BroadcastTransmitter {
    /// View over the ring region including the trailer
    buffer: AtomicBuffer,
    /// Ring geometry derived from the region size
    geometry: RingGeometry,
    /// Keeps a mapped region alive while this handle exists
    _region: Option<Arc<SharedRegion>>,
}

impl BroadcastTransmitter {
    /// Create a transmitter over an already-initialized ring region
    ///
    /// The buffer must span the full region, ring plus trailer. Fails when
    /// the implied capacity is not a power of two or cannot hold a single
    /// record.
    pub fn new(buffer: AtomicBuffer) -> Result<Self> {
        Self::with_region(buffer, None)
    }

    pub(crate) fn with_region(
        buffer: AtomicBuffer,
        region: Option<Arc<SharedRegion>>,
    ) -> Result<Self> {
        let geometry = RingGeometry::for_total_size(buffer.len())?;
        if geometry.capacity() < RECORD_ALIGNMENT {
            return Err(CrierError::invalid_parameter(
                "capacity",
                "Capacity must hold at least one record",
            ));
        }

        Ok(Self {
            buffer,
            geometry,
            _region: region,
        })
    }

    /// Usable ring capacity in bytes
    pub fn capacity(&self) -> usize {
        self.geometry.capacity()
    }

    /// Largest payload a single transmit may carry
    pub fn max_payload_length(&self) -> usize {
        self.geometry.max_payload_length()
    }

    /// Unbounded stream position of the next record to be written
    pub fn tail_position(&self) -> StreamPosition {
        // Sole writer, so a plain load of its own counter is enough
        self.buffer.get_u64(self.geometry.tail_counter_offset())
    }

    /// Append one message to the ring and publish it
    ///
    /// Never blocks and never waits on receivers; whatever occupied the
    /// claimed slots is overwritten. `type_id` must be a user type id,
    /// `FIRST_USER_TYPE_ID` or above.
    pub fn transmit(&mut self, type_id: i32, payload: &[u8]) -> Result<()> {
        if type_id < FIRST_USER_TYPE_ID {
            return Err(CrierError::invalid_parameter(
                "type_id",
                &format!("Type id must be {} or above, got {}", FIRST_USER_TYPE_ID, type_id),
            ));
        }
        if payload.len() > self.max_payload_length() {
            return Err(CrierError::insufficient_space(
                payload.len(),
                self.max_payload_length(),
            ));
        }

        let tail = self.tail_position();
        let record_length = records::aligned_record_length(payload.len());
        let physical = self.geometry.physical(tail);
        let to_boundary = self.geometry.capacity() - physical;

        let mut start = tail;
        let mut record_offset = physical;

        if record_length > to_boundary {
            // A record never straddles the physical end of the ring; fill
            // the remainder with a padding record and wrap
            self.write_padding(physical, to_boundary, tail);
            start = tail + to_boundary as u64;
            record_offset = 0;
        }

        self.buffer
            .put_u32(records::length_offset(record_offset), record_length as u32);
        self.buffer
            .put_u32(records::payload_length_offset(record_offset), payload.len() as u32);
        // Type id pairs release with the receiver's acquire loads
        self.buffer
            .put_i32_release(records::type_offset(record_offset), type_id);
        self.buffer
            .write_bytes(records::payload_offset(record_offset), payload);
        // The stamp is stored last with release ordering, so any receiver
        // that observes it also observes the header and payload beneath it
        self.buffer
            .put_u64_release(records::stamp_offset(record_offset), start);

        self.buffer
            .put_u64_release(self.geometry.latest_record_offset(), start);
        self.buffer.put_u64_release(
            self.geometry.tail_counter_offset(),
            start + record_length as u64,
        );

        Ok(())
    }

    fn write_padding(&mut self, record_offset: usize, length: usize, position: StreamPosition) {
        self.buffer
            .put_u32(records::length_offset(record_offset), length as u32);
        self.buffer.put_u32(records::payload_length_offset(record_offset), 0);
        self.buffer
            .put_i32_release(records::type_offset(record_offset), PADDING_TYPE_ID);
        self.buffer
            .put_u64_release(records::stamp_offset(record_offset), position);
    }
}

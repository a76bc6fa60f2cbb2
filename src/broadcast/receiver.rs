//! Receiver side of the broadcast ring
//!
//! A receiver owns a private cursor in unbounded stream coordinates and
//! walks the record stream one record per [`receive_next`] call. It never
//! writes to shared memory and never synchronizes with other receivers or
//! the transmitter beyond acquire loads of the trailer counters and record
//! headers.
//!
//! Freshness is a two-phase protocol. [`receive_next`] captures the
//! record's sequence stamp and type id while parsing; after the caller has
//! copied whatever payload bytes it wants, [`validate`] re-reads both
//! fields and compares. A mismatch means the transmitter wrapped back onto
//! this physical slot in the meantime and the copied bytes must be
//! discarded.
//!
//! [`receive_next`]: BroadcastReceiver::receive_next
//! [`validate`]: BroadcastReceiver::validate

use std::sync::Arc;

use crate::{
    buffer::AtomicBuffer,
    error::Result,
    layout::{records, RingGeometry, StreamPosition, PADDING_TYPE_ID, RECORD_ALIGNMENT},
    region::SharedRegion,
};

/// A polling consumer of a broadcast ring with a private cursor
///
/// Not internally synchronized; one instance belongs to one thread. Any
/// number of instances may read the same ring concurrently.
#[derive(Debug)]
pub struct BroadcastReceiver {
    /// View over the ring region including the trailer
    buffer: AtomicBuffer,
    /// Ring geometry derived from the region size
    geometry: RingGeometry,
    /// Unbounded position of the next record to attempt
    next_position: StreamPosition,
    /// Times this receiver fell behind by more than a capacity and jumped
    /// forward
    lap_count: u64,
    /// Physical offset of the record surfaced by the last successful
    /// `receive_next`
    record_offset: usize,
    /// Sequence stamp captured while parsing that record
    captured_stamp: u64,
    /// Type id captured while parsing that record
    type_id: i32,
    /// Payload length of that record
    payload_length: usize,
    /// Keeps a mapped region alive while this handle exists
    _region: Option<Arc<SharedRegion>>,
}

impl BroadcastReceiver {
    /// Create a receiver over a ring region, starting at stream position 0
    ///
    /// The buffer must span the full region, ring plus trailer. Fails when
    /// the implied capacity is not a power of two. Attaching to a ring the
    /// transmitter has already filled more than once simply laps on the
    /// first receive, which is the normal late-join path.
    pub fn new(buffer: AtomicBuffer) -> Result<Self> {
        Self::with_region(buffer, None)
    }

    pub(crate) fn with_region(
        buffer: AtomicBuffer,
        region: Option<Arc<SharedRegion>>,
    ) -> Result<Self> {
        let geometry = RingGeometry::for_total_size(buffer.len())?;

        Ok(Self {
            buffer,
            geometry,
            next_position: 0,
            lap_count: 0,
            record_offset: 0,
            captured_stamp: 0,
            type_id: 0,
            payload_length: 0,
            _region: region,
        })
    }

    /// Usable ring capacity in bytes
    pub fn capacity(&self) -> usize {
        self.geometry.capacity()
    }

    /// Times this receiver has detected it was lapped and resynchronized
    ///
    /// Every increment stands for an unknown number of records lost for
    /// good. Starts at 0 and never decreases.
    pub fn lap_count(&self) -> u64 {
        self.lap_count
    }

    /// Unbounded stream position of the next record this receiver will
    /// attempt
    pub fn next_position(&self) -> StreamPosition {
        self.next_position
    }

    /// Type id of the current record
    ///
    /// Only meaningful after a `true` return from [`receive_next`], and
    /// only trustworthy once [`validate`] has passed.
    ///
    /// [`receive_next`]: Self::receive_next
    /// [`validate`]: Self::validate
    pub fn type_id(&self) -> i32 {
        self.type_id
    }

    /// Physical offset of the current record's first payload byte
    pub fn payload_offset(&self) -> usize {
        records::payload_offset(self.record_offset)
    }

    /// Payload length of the current record in bytes
    pub fn payload_length(&self) -> usize {
        self.payload_length
    }

    /// The buffer the current record's payload can be read from
    pub fn buffer(&self) -> &AtomicBuffer {
        &self.buffer
    }

    /// Advance to the next record in the stream
    ///
    /// Returns `false` with no state change when the cursor has caught up
    /// with the transmitter. Returns `true` positioned on a parsed,
    /// non-padding record, with the accessors updated. Padding records are
    /// skipped within the same call and never surfaced.
    pub fn receive_next(&mut self) -> bool {
        let tail = self
            .buffer
            .get_u64_acquire(self.geometry.tail_counter_offset());
        let mut position = self.next_position;

        if position >= tail {
            return false;
        }

        if tail - position > self.geometry.capacity() as u64 {
            // Everything between the cursor and the transmitter's wake has
            // been overwritten; jump to the most recent completed record
            position = self
                .buffer
                .get_u64_acquire(self.geometry.latest_record_offset());
            self.lap_count += 1;
        }

        loop {
            let record_offset = self.geometry.physical(position);
            let stamp = self
                .buffer
                .get_u64_acquire(records::stamp_offset(record_offset));
            let record_length =
                self.buffer.get_u32(records::length_offset(record_offset)) as usize;
            let type_id = self
                .buffer
                .get_i32_acquire(records::type_offset(record_offset));

            // Stored lengths are already aligned; re-aligning only matters
            // for torn values and keeps the cursor on record boundaries
            position += records::align_up(record_length, RECORD_ALIGNMENT) as u64;

            if type_id != PADDING_TYPE_ID {
                self.record_offset = record_offset;
                self.captured_stamp = stamp;
                self.type_id = type_id;
                self.payload_length = self
                    .buffer
                    .get_u32(records::payload_length_offset(record_offset))
                    as usize;
                self.next_position = position;
                return true;
            }
            // Padding marks the unused span before a wrap; fall through and
            // parse the record that follows it
        }
    }

    /// Check that the current record was not overwritten since it was parsed
    ///
    /// Re-reads the record's sequence stamp and type id and compares them
    /// with the values captured by [`receive_next`]. `false` means the
    /// transmitter lapped onto this slot and any payload bytes the caller
    /// copied are garbage to be discarded. Has no effect on cursor state
    /// and may be called repeatedly.
    ///
    /// [`receive_next`]: Self::receive_next
    pub fn validate(&self) -> bool {
        let stamp = self
            .buffer
            .get_u64_acquire(records::stamp_offset(self.record_offset));
        let type_id = self
            .buffer
            .get_i32_acquire(records::type_offset(self.record_offset));

        stamp == self.captured_stamp && type_id == self.type_id
    }

    pub(crate) fn geometry(&self) -> RingGeometry {
        self.geometry
    }
}

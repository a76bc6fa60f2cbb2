//! Copying receiver that hands out validated message bytes

use crate::{
    error::{CrierError, Result},
    layout::StreamPosition,
};

use super::receiver::BroadcastReceiver;

/// A receiver that copies each message into a private scratch buffer and
/// only delivers it once the copy has been validated
///
/// The raw [`BroadcastReceiver`] surface requires the caller to copy
/// payload bytes and then check [`validate`] before trusting them. This
/// wrapper folds that protocol into a single call: the handler only ever
/// sees bytes that passed validation. The price is one memcpy per message.
///
/// [`validate`]: BroadcastReceiver::validate
#[derive(Debug)]
pub struct CopyBroadcastReceiver {
    receiver: BroadcastReceiver,
    scratch: Vec<u8>,
}

impl CopyBroadcastReceiver {
    /// Wrap a raw receiver
    pub fn new(receiver: BroadcastReceiver) -> Self {
        let scratch = vec![0u8; receiver.geometry().max_payload_length()];
        Self { receiver, scratch }
    }

    /// Usable ring capacity in bytes
    pub fn capacity(&self) -> usize {
        self.receiver.capacity()
    }

    /// Times the underlying receiver resynchronized after being lapped
    pub fn lap_count(&self) -> u64 {
        self.receiver.lap_count()
    }

    /// Receive one message, delivering a validated copy to `handler`
    ///
    /// Returns `Ok(false)` when no new message is available and `Ok(true)`
    /// after the handler ran. Returns an overrun error when the message was
    /// overwritten mid-copy; the message is lost, the receiver has already
    /// moved past it, and the next call proceeds normally.
    pub fn receive<F>(&mut self, mut handler: F) -> Result<bool>
    where
        F: FnMut(i32, &[u8]),
    {
        if !self.receiver.receive_next() {
            return Ok(false);
        }

        let length = self.receiver.payload_length();
        let offset = self.receiver.payload_offset();
        if length > self.scratch.len() {
            // A length beyond the ring maximum can only come from a record
            // torn by a concurrent overwrite
            return Err(CrierError::overrun(format!(
                "Payload length {} exceeds the {} byte ring maximum",
                length,
                self.scratch.len()
            )));
        }
        if offset + length > self.receiver.capacity() {
            // Real records never cross the end of the data section, so an
            // in-range length that does is equally torn
            return Err(CrierError::overrun(format!(
                "Payload length {} at offset {} runs past the ring data section",
                length, offset
            )));
        }

        let type_id = self.receiver.type_id();
        self.receiver
            .buffer()
            .read_bytes(offset, &mut self.scratch[..length]);

        if !self.receiver.validate() {
            return Err(CrierError::overrun(
                "Message overwritten while being copied out",
            ));
        }

        handler(type_id, &self.scratch[..length]);
        Ok(true)
    }

    /// Drain all currently available messages, returning how many were
    /// delivered
    ///
    /// Stops at the first overrun and reports it; already-delivered
    /// messages stay delivered.
    pub fn receive_all<F>(&mut self, mut handler: F) -> Result<usize>
    where
        F: FnMut(i32, &[u8]),
    {
        let mut count = 0;
        while self.receive(&mut handler)? {
            count += 1;
        }
        Ok(count)
    }

    /// Unbounded stream position this receiver will attempt next
    pub fn next_position(&self) -> StreamPosition {
        self.receiver.next_position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::BroadcastTransmitter;
    use crate::buffer::AtomicBuffer;
    use crate::layout::{records, TRAILER_LENGTH};
    use std::ptr::NonNull;

    const CAPACITY: usize = 1024;
    const MSG_TYPE_ID: i32 = 7;

    fn ring_with_capacity(capacity: usize) -> (Vec<u64>, AtomicBuffer) {
        let total_size = capacity + TRAILER_LENGTH;
        let mut storage = vec![0u64; total_size / 8];
        let ptr = NonNull::new(storage.as_mut_ptr() as *mut u8).unwrap();
        let buffer = unsafe { AtomicBuffer::from_raw_parts(ptr, total_size).unwrap() };
        (storage, buffer)
    }

    fn new_ring() -> (Vec<u64>, AtomicBuffer) {
        ring_with_capacity(CAPACITY)
    }

    #[test]
    fn test_copies_messages_out() {
        let (_storage, buffer) = new_ring();
        let mut transmitter = BroadcastTransmitter::new(buffer).unwrap();
        let mut receiver =
            CopyBroadcastReceiver::new(BroadcastReceiver::new(buffer).unwrap());

        transmitter.transmit(7, b"alpha").unwrap();
        transmitter.transmit(8, b"beta").unwrap();

        let mut seen: Vec<(i32, Vec<u8>)> = Vec::new();
        while receiver
            .receive(|type_id, bytes| seen.push((type_id, bytes.to_vec())))
            .unwrap()
        {}

        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (7, b"alpha".to_vec()));
        assert_eq!(seen[1], (8, b"beta".to_vec()));
    }

    #[test]
    fn test_receive_all_drains_available_messages() {
        let (_storage, buffer) = new_ring();
        let mut transmitter = BroadcastTransmitter::new(buffer).unwrap();
        let mut receiver =
            CopyBroadcastReceiver::new(BroadcastReceiver::new(buffer).unwrap());

        for sequence in 0..5u8 {
            transmitter.transmit(MSG_TYPE_ID, &[sequence; 16]).unwrap();
        }

        let mut count_in_handler = 0;
        let delivered = receiver
            .receive_all(|_, bytes| {
                assert_eq!(bytes, [count_in_handler as u8; 16]);
                count_in_handler += 1;
            })
            .unwrap();

        assert_eq!(delivered, 5);
        assert_eq!(receiver.receive_all(|_, _| {}).unwrap(), 0);
    }

    #[test]
    fn test_lap_count_passes_through() {
        let (_storage, buffer) = new_ring();
        let mut transmitter = BroadcastTransmitter::new(buffer).unwrap();
        let mut receiver =
            CopyBroadcastReceiver::new(BroadcastReceiver::new(buffer).unwrap());

        for sequence in 0..20u8 {
            transmitter.transmit(MSG_TYPE_ID, &[sequence; 100]).unwrap();
        }

        let mut seen: Vec<Vec<u8>> = Vec::new();
        assert!(receiver.receive(|_, bytes| seen.push(bytes.to_vec())).unwrap());
        assert_eq!(receiver.lap_count(), 1);
        assert_eq!(seen[0], [19u8; 100]);
    }

    #[test]
    fn test_torn_payload_length_reports_overrun() {
        let (_storage, buffer) = new_ring();
        let mut transmitter = BroadcastTransmitter::new(buffer).unwrap();
        let mut receiver =
            CopyBroadcastReceiver::new(BroadcastReceiver::new(buffer).unwrap());

        transmitter.transmit(MSG_TYPE_ID, b"ok").unwrap();
        // Corrupt the payload length the way a concurrent overwrite would
        buffer.put_u32(records::payload_length_offset(0), 5000);

        let result = receiver.receive(|_, _| panic!("must not deliver"));
        assert!(matches!(result, Err(CrierError::Overrun { .. })));
    }

    #[test]
    fn test_torn_length_at_ring_end_reports_overrun() {
        const LARGE_CAPACITY: usize = 4096;
        let (_storage, buffer) = ring_with_capacity(LARGE_CAPACITY);
        let mut transmitter = BroadcastTransmitter::new(buffer).unwrap();
        let mut receiver =
            CopyBroadcastReceiver::new(BroadcastReceiver::new(buffer).unwrap());

        // 64 byte records fill the ring exactly; the last starts one
        // record short of the data section end
        let record_count = LARGE_CAPACITY / 64;
        for _ in 0..record_count {
            transmitter.transmit(MSG_TYPE_ID, &[0u8; 40]).unwrap();
        }
        let last_record = LARGE_CAPACITY - 64;
        // Tear the last length to the ring maximum: plausible as a size,
        // but from this offset it runs past the data section
        buffer.put_u32(
            records::payload_length_offset(last_record),
            (LARGE_CAPACITY / 8) as u32,
        );

        let mut delivered = 0;
        let result = loop {
            match receiver.receive(|_, _| delivered += 1) {
                Ok(true) => {}
                other => break other,
            }
        };

        assert_eq!(delivered, record_count - 1);
        assert!(matches!(result, Err(CrierError::Overrun { .. })));
    }
}

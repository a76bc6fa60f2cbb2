//! Record header codec for the broadcast ring
//!
//! Every record is a fixed 24-byte header followed by payload bytes, with the
//! total length rounded up to [`RECORD_ALIGNMENT`](super::RECORD_ALIGNMENT).
//! Field layout:
//!
//! | field           | offset | width |
//! |-----------------|--------|-------|
//! | sequence stamp  | 0      | 8     |
//! | record length   | 8      | 4     |
//! | payload length  | 12     | 4     |
//! | type id         | 16     | 4     |
//! | reserved        | 20     | 4     |
//!
//! The sequence stamp carries the unbounded stream position the record was
//! written at and exists purely for torn-read detection. The record length
//! field stores the aligned total, so receivers advance their cursor by it
//! directly. The stamp and type id fields take part in the freshness
//! protocol and are accessed with acquire/release ordering; the two length
//! fields are plain loads, trusted only inside the bounded-staleness window.

use super::constants::RECORD_ALIGNMENT;

/// Reserved type id marking a padding record
///
/// A padding record's length field covers the unused distance to the wrap
/// boundary; it carries no payload and is skipped by receivers without being
/// surfaced.
pub const PADDING_TYPE_ID: i32 = -1;

/// Lowest type id available to producers (0 reads as unwritten garbage)
pub const FIRST_USER_TYPE_ID: i32 = 1;

/// Total header length in bytes; payload begins here within a record
pub const HEADER_LENGTH: usize = 24;

const STAMP_FIELD_OFFSET: usize = 0;
const LENGTH_FIELD_OFFSET: usize = 8;
const PAYLOAD_LENGTH_FIELD_OFFSET: usize = 12;
const TYPE_FIELD_OFFSET: usize = 16;

/// Byte offset of the sequence stamp field of the record at `record_offset`
pub fn stamp_offset(record_offset: usize) -> usize {
    record_offset + STAMP_FIELD_OFFSET
}

/// Byte offset of the aligned record length field
pub fn length_offset(record_offset: usize) -> usize {
    record_offset + LENGTH_FIELD_OFFSET
}

/// Byte offset of the payload length field
pub fn payload_length_offset(record_offset: usize) -> usize {
    record_offset + PAYLOAD_LENGTH_FIELD_OFFSET
}

/// Byte offset of the type id field
pub fn type_offset(record_offset: usize) -> usize {
    record_offset + TYPE_FIELD_OFFSET
}

/// Byte offset of the first payload byte
pub fn payload_offset(record_offset: usize) -> usize {
    record_offset + HEADER_LENGTH
}

/// Round `value` up to the next multiple of `alignment` (a power of two)
pub fn align_up(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

/// Total aligned record length for a payload of `payload_length` bytes
pub fn aligned_record_length(payload_length: usize) -> usize {
    align_up(HEADER_LENGTH + payload_length, RECORD_ALIGNMENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_offsets() {
        assert_eq!(stamp_offset(256), 256);
        assert_eq!(length_offset(256), 264);
        assert_eq!(payload_length_offset(256), 268);
        assert_eq!(type_offset(256), 272);
        assert_eq!(payload_offset(256), 256 + HEADER_LENGTH);
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 64), 0);
        assert_eq!(align_up(1, 64), 64);
        assert_eq!(align_up(64, 64), 64);
        assert_eq!(align_up(65, 64), 128);
        assert_eq!(align_up(24, 8), 24);
    }

    #[test]
    fn test_aligned_record_length() {
        // Header alone still occupies one alignment unit
        assert_eq!(aligned_record_length(0), RECORD_ALIGNMENT);
        assert_eq!(aligned_record_length(RECORD_ALIGNMENT - HEADER_LENGTH), RECORD_ALIGNMENT);
        assert_eq!(
            aligned_record_length(RECORD_ALIGNMENT - HEADER_LENGTH + 1),
            2 * RECORD_ALIGNMENT
        );
        assert_eq!(aligned_record_length(100), 2 * RECORD_ALIGNMENT);
    }

    #[test]
    fn test_padding_type_is_reserved() {
        assert!(PADDING_TYPE_ID < FIRST_USER_TYPE_ID);
        assert_ne!(PADDING_TYPE_ID, 0);
    }
}

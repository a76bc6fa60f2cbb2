//! # Crier - Shared Memory Broadcast Transport
//!
//! Crier is a best-effort, single-writer/multi-reader broadcast transport
//! over a fixed-size shared memory ring. One transmitter appends messages;
//! any number of receivers observe the stream without registering, without
//! flow control, and without the transmitter ever waiting on them. Loss is
//! a normal, detectable outcome: a slow receiver is lapped and
//! resynchronizes at the newest record, and a record overwritten while
//! being read is caught by a post-read validation check.
//!
//! ## Features
//!
//! - **Power-of-two ring with trailing control block**: single-mask
//!   addressing, two release-published counters
//! - **Self-describing records**: type id, payload length, and a sequence
//!   stamp for torn-read detection
//! - **Lock-free polling receivers**: private cursors, acquire/release
//!   protocol, no coordination between receivers
//! - **File-backed and memfd regions**: cross-process via `/dev/shm` files
//!   or fd passing
//! - **Validated copy receiver**: handler only ever sees bytes that passed
//!   the freshness check
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │           Shared region (mmap)               │
//! ├───────────────────────────────┬──────────────┤
//! │  Ring: capacity bytes (2^n)   │   Trailer    │
//! │  [record][record][padding]... │ tail, latest │
//! └───────────────────────────────┴──────────────┘
//!        ▲                    │
//!        │ append + release   │ acquire + poll
//! ┌──────┴──────┐      ┌──────▼──────┐ ┌─────────────┐
//! │ Transmitter │      │  Receiver   │ │ Receiver ...│
//! │  (exactly 1)│      │ (cursor, lap│ │             │
//! └─────────────┘      │  + validate)│ └─────────────┘
//!                      └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use crier::{BroadcastChannel, RegionConfig};
//!
//! # fn main() -> crier::Result<()> {
//! # let path = std::env::temp_dir().join(format!("crier_doc_{}", std::process::id()));
//! let size = BroadcastChannel::total_size_for_capacity(64 * 1024);
//! let config = RegionConfig::new("doc_ring", size).with_file_path(&path);
//! let channel = BroadcastChannel::create(config)?;
//!
//! let mut transmitter = channel.transmitter()?;
//! transmitter.transmit(1, b"hello")?;
//!
//! let mut receiver = channel.copy_receiver()?;
//! let delivered = receiver.receive(|type_id, bytes| {
//!     assert_eq!(type_id, 1);
//!     assert_eq!(bytes, b"hello");
//! })?;
//! assert!(delivered);
//! # drop(channel);
//! # std::fs::remove_file(&path).ok();
//! # Ok(())
//! # }
//! ```

pub mod broadcast;
pub mod buffer;
pub mod error;
pub mod layout;
pub mod region;

// Main API re-exports
pub use broadcast::{
    BroadcastChannel, BroadcastReceiver, BroadcastTransmitter, CopyBroadcastReceiver,
};
pub use buffer::AtomicBuffer;
pub use error::{CrierError, Result};
pub use layout::{
    RingGeometry, StreamPosition, FIRST_USER_TYPE_ID, HEADER_LENGTH, PADDING_TYPE_ID,
    RECORD_ALIGNMENT, TRAILER_LENGTH,
};
pub use region::{BackingType, RegionConfig, RegionMetadata, SharedRegion};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Default configuration constants
pub mod config {
    /// Default ring capacity for newly created channels (64KB)
    pub const DEFAULT_RING_CAPACITY: usize = 64 * 1024;

    /// Default message type id for producers that do not pick their own
    pub const DEFAULT_TYPE_ID: i32 = 1;
}

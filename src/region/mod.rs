//! Shared memory region management

pub mod config;
pub mod shared;

pub use config::{BackingType, RegionConfig};
pub use shared::{RegionMetadata, SharedRegion};

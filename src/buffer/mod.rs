//! Bounds-checked atomic access to raw shared memory

pub mod atomic;

pub use atomic::AtomicBuffer;

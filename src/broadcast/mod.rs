//! Single-writer broadcast transport over a shared memory ring
//!
//! One transmitter appends self-describing records into a power-of-two ring
//! and publishes its progress through two counters in a trailing control
//! block. Any number of receivers poll the counters and walk the stream
//! independently, each with a private cursor. Delivery is best effort: a
//! receiver that falls more than one capacity behind has lost records for
//! good and resynchronizes at the most recent one, and a record can be
//! overwritten while a receiver is still looking at it, which the receiver
//! detects after the fact rather than prevents.

pub mod channel;
pub mod copy_receiver;
pub mod receiver;
pub mod transmitter;

pub use channel::BroadcastChannel;
pub use copy_receiver::CopyBroadcastReceiver;
pub use receiver::BroadcastReceiver;
pub use transmitter::BroadcastTransmitter;

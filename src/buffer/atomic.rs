//! Atomic field access over a raw byte region
//!
//! All shared-memory loads and stores in the crate go through
//! [`AtomicBuffer`] so that bounds and alignment are checked in one place.
//! Word fields use in-place atomics with explicit orderings; payload bytes
//! use plain copies and rely on the stamp protocol above this layer to
//! detect tearing.

use std::{
    ptr::NonNull,
    sync::atomic::{AtomicI32, AtomicU32, AtomicU64, Ordering},
};

use crate::error::{CrierError, Result};

/// A borrowed view over a fixed-length byte region supporting atomic access
///
/// The view is `Copy` and carries no ownership; whoever constructs it must
/// keep the underlying memory alive and writable for as long as any copy is
/// in use.
#[derive(Debug, Clone, Copy)]
pub struct AtomicBuffer {
    /// Pointer to the start of the region
    data: NonNull<u8>,
    /// Length of the region in bytes
    len: usize,
}

impl AtomicBuffer {
    /// Create a view over existing memory
    ///
    /// # Safety
    /// The caller must ensure that:
    /// - `data` points to valid readable and writable memory of at least
    ///   `len` bytes
    /// - The memory remains valid for the lifetime of every copy of the view
    /// - No other code accesses the region except through atomic operations
    ///   compatible with the ones used here
    pub unsafe fn from_raw_parts(data: NonNull<u8>, len: usize) -> Result<Self> {
        if (data.as_ptr() as usize) % 8 != 0 {
            return Err(CrierError::alignment(data.as_ptr() as usize, 8));
        }
        Ok(Self { data, len })
    }

    /// Get the length of the region in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the region is zero-length
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get a raw pointer to the start of the region
    pub fn as_ptr(&self) -> *mut u8 {
        self.data.as_ptr()
    }

    fn bounds_check(&self, offset: usize, size: usize) {
        assert!(
            offset + size <= self.len,
            "access of {} bytes at offset {} exceeds buffer length {}",
            size,
            offset,
            self.len
        );
    }

    fn u64_at(&self, offset: usize) -> &AtomicU64 {
        self.bounds_check(offset, 8);
        assert!(offset % 8 == 0, "u64 access at unaligned offset {}", offset);
        unsafe { &*(self.data.as_ptr().add(offset) as *const AtomicU64) }
    }

    fn u32_at(&self, offset: usize) -> &AtomicU32 {
        self.bounds_check(offset, 4);
        assert!(offset % 4 == 0, "u32 access at unaligned offset {}", offset);
        unsafe { &*(self.data.as_ptr().add(offset) as *const AtomicU32) }
    }

    fn i32_at(&self, offset: usize) -> &AtomicI32 {
        self.bounds_check(offset, 4);
        assert!(offset % 4 == 0, "i32 access at unaligned offset {}", offset);
        unsafe { &*(self.data.as_ptr().add(offset) as *const AtomicI32) }
    }

    /// Plain load of a u64 field
    pub fn get_u64(&self, offset: usize) -> u64 {
        self.u64_at(offset).load(Ordering::Relaxed)
    }

    /// Acquire load of a u64 field
    pub fn get_u64_acquire(&self, offset: usize) -> u64 {
        self.u64_at(offset).load(Ordering::Acquire)
    }

    /// Plain store of a u64 field
    pub fn put_u64(&self, offset: usize, value: u64) {
        self.u64_at(offset).store(value, Ordering::Relaxed);
    }

    /// Release store of a u64 field
    pub fn put_u64_release(&self, offset: usize, value: u64) {
        self.u64_at(offset).store(value, Ordering::Release);
    }

    /// Plain load of a u32 field
    pub fn get_u32(&self, offset: usize) -> u32 {
        self.u32_at(offset).load(Ordering::Relaxed)
    }

    /// Plain store of a u32 field
    pub fn put_u32(&self, offset: usize, value: u32) {
        self.u32_at(offset).store(value, Ordering::Relaxed);
    }

    /// Plain load of an i32 field
    pub fn get_i32(&self, offset: usize) -> i32 {
        self.i32_at(offset).load(Ordering::Relaxed)
    }

    /// Acquire load of an i32 field
    pub fn get_i32_acquire(&self, offset: usize) -> i32 {
        self.i32_at(offset).load(Ordering::Acquire)
    }

    /// Plain store of an i32 field
    pub fn put_i32(&self, offset: usize, value: i32) {
        self.i32_at(offset).store(value, Ordering::Relaxed);
    }

    /// Release store of an i32 field
    pub fn put_i32_release(&self, offset: usize, value: i32) {
        self.i32_at(offset).store(value, Ordering::Release);
    }

    /// Copy bytes out of the region into `dst`
    pub fn read_bytes(&self, offset: usize, dst: &mut [u8]) {
        self.bounds_check(offset, dst.len());
        unsafe {
            std::ptr::copy_nonoverlapping(
                self.data.as_ptr().add(offset),
                dst.as_mut_ptr(),
                dst.len(),
            );
        }
    }

    /// Copy bytes from `src` into the region
    pub fn write_bytes(&self, offset: usize, src: &[u8]) {
        self.bounds_check(offset, src.len());
        unsafe {
            std::ptr::copy_nonoverlapping(
                src.as_ptr(),
                self.data.as_ptr().add(offset),
                src.len(),
            );
        }
    }

    /// Fill `len` bytes of the region with `value`
    pub fn fill(&self, offset: usize, len: usize, value: u8) {
        self.bounds_check(offset, len);
        unsafe {
            std::ptr::write_bytes(self.data.as_ptr().add(offset), value, len);
        }
    }
}

unsafe impl Send for AtomicBuffer {}
unsafe impl Sync for AtomicBuffer {}

//! Shared memory region implementation

use std::{
    ffi::CString,
    fs::{File, OpenOptions},
    os::fd::{AsRawFd, OwnedFd, RawFd},
    os::unix::fs::OpenOptionsExt,
    time::SystemTime,
};

use memmap2::{MmapMut, MmapOptions};
use nix::{
    sys::memfd::{memfd_create, MemFdCreateFlag},
    unistd::ftruncate,
};
use serde::{Deserialize, Serialize};

use crate::error::{CrierError, Result};

use super::config::{BackingType, RegionConfig};

/// Metadata describing a shared memory region
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionMetadata {
    /// Name of the region
    pub name: String,
    /// Size in bytes
    pub size: usize,
    /// Type of backing storage
    pub backing_type: BackingType,
    /// Creation timestamp
    pub created_at: SystemTime,
}

impl RegionMetadata {
    /// Create new metadata
    pub fn new(name: String, size: usize, backing_type: BackingType) -> Self {
        Self {
            name,
            size,
            backing_type,
            created_at: SystemTime::now(),
        }
    }

    /// Get age of the region in seconds
    pub fn age_seconds(&self) -> Option<u64> {
        self.created_at.elapsed().ok().map(|d| d.as_secs())
    }
}

/// A mapped shared memory region with its associated metadata
///
/// The mapping stays valid for the lifetime of the region; handles that
/// point into it hold an `Arc<SharedRegion>` to keep it alive.
#[derive(Debug)]
pub struct SharedRegion {
    /// Region metadata
    metadata: RegionMetadata,
    /// Memory-mapped region
    mmap: MmapMut,
    /// Optional file handle for file-backed regions
    _file: Option<File>,
    /// Owned file descriptor for memfd regions
    _owned_fd: Option<OwnedFd>,
    /// Raw file descriptor for fd-passing APIs
    fd: RawFd,
}

impl SharedRegion {
    /// Create or attach to a shared memory region
    pub fn new(config: RegionConfig) -> Result<Self> {
        config.validate()?;

        let (file, owned_fd, fd, size) = Self::create_backing(&config)?;
        let mmap = Self::create_mapping(&file, &owned_fd, size)?;

        let metadata = RegionMetadata::new(config.name, size, config.backing_type);

        Ok(Self {
            metadata,
            mmap,
            _file: file,
            _owned_fd: owned_fd,
            fd,
        })
    }

    /// Create a new region, overriding the configured create flag
    pub fn create(config: RegionConfig) -> Result<Self> {
        Self::new(config.with_create(true))
    }

    /// Attach to an existing region
    pub fn open(config: RegionConfig) -> Result<Self> {
        Self::new(config.with_create(false))
    }

    /// Create the backing storage for the region
    fn create_backing(config: &RegionConfig) -> Result<(Option<File>, Option<OwnedFd>, RawFd, usize)> {
        match config.backing_type {
            BackingType::FileBacked => Self::create_file_backing(config),
            #[cfg(target_os = "linux")]
            BackingType::MemFd => Self::create_memfd_backing(config),
        }
    }

    /// Create or open file-backed storage
    fn create_file_backing(
        config: &RegionConfig,
    ) -> Result<(Option<File>, Option<OwnedFd>, RawFd, usize)> {
        let path = config.resolved_file_path();

        // The mapping is writable either way, so the file is opened
        // read-write even when attaching
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(config.create)
            .truncate(false)
            .mode(config.permissions)
            .open(&path)
            .map_err(|e| CrierError::from_io(e, "Failed to open region file"))?;

        let size = if config.create {
            file.set_len(config.size as u64)
                .map_err(|e| CrierError::from_io(e, "Failed to set region file size"))?;
            config.size
        } else if config.size == 0 {
            let len = file
                .metadata()
                .map_err(|e| CrierError::from_io(e, "Failed to stat region file"))?
                .len() as usize;
            if len == 0 {
                return Err(CrierError::invalid_parameter(
                    "file_path",
                    "Existing region file is empty",
                ));
            }
            len
        } else {
            config.size
        };

        let fd = file.as_raw_fd();
        Ok((Some(file), None, fd, size))
    }

    /// Create memfd-backed storage
    #[cfg(target_os = "linux")]
    fn create_memfd_backing(
        config: &RegionConfig,
    ) -> Result<(Option<File>, Option<OwnedFd>, RawFd, usize)> {
        if !config.create {
            return Err(CrierError::invalid_parameter(
                "backing_type",
                "Cannot attach to a memfd region by name; pass its file descriptor instead",
            ));
        }

        let name_cstr = CString::new(config.name.clone())
            .map_err(|_| CrierError::invalid_parameter("name", "Name contains null bytes"))?;

        let owned_fd = memfd_create(&name_cstr, MemFdCreateFlag::MFD_CLOEXEC)
            .map_err(|e| CrierError::platform(&format!("Failed to create memfd: {}", e)))?;

        let raw_fd = owned_fd.as_raw_fd();

        ftruncate(&owned_fd, config.size as i64)
            .map_err(|e| CrierError::platform(&format!("Failed to set memfd size: {}", e)))?;

        Ok((None, Some(owned_fd), raw_fd, config.size))
    }

    /// Create the memory mapping over the backing storage
    fn create_mapping(
        file: &Option<File>,
        owned_fd: &Option<OwnedFd>,
        size: usize,
    ) -> Result<MmapMut> {
        match (file, owned_fd) {
            (Some(f), _) => unsafe {
                MmapOptions::new()
                    .len(size)
                    .map_mut(f)
                    .map_err(|e| CrierError::from_io(e, "Failed to create memory mapping"))
            },
            (None, Some(fd)) => unsafe {
                MmapOptions::new()
                    .len(size)
                    .map_mut(fd)
                    .map_err(|e| CrierError::from_io(e, "Failed to create memory mapping"))
            },
            (None, None) => Err(CrierError::platform(
                "No file or owned fd available for mapping",
            )),
        }
    }

    /// Get the region metadata
    pub fn metadata(&self) -> &RegionMetadata {
        &self.metadata
    }

    /// Get the raw memory slice
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    /// Get a mutable pointer to the start of the region
    ///
    /// # Safety
    /// The region is shared; callers must confine concurrent access to the
    /// atomic protocols built on top of it.
    pub unsafe fn as_mut_ptr(&self) -> *mut u8 {
        self.mmap.as_ptr() as *mut u8
    }

    /// Get the size of the region in bytes
    pub fn size(&self) -> usize {
        self.metadata.size
    }

    /// Get the name of the region
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Flush the mapping to its backing storage
    pub fn flush(&self) -> Result<()> {
        self.mmap
            .flush()
            .map_err(|e| CrierError::from_io(e, "Failed to flush memory mapping"))
    }

    /// Get the file descriptor backing the region
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Check if the region is file-backed
    pub fn is_file_backed(&self) -> bool {
        matches!(self.metadata.backing_type, BackingType::FileBacked)
    }

    /// Check if the region is memfd-backed
    #[cfg(target_os = "linux")]
    pub fn is_memfd_backed(&self) -> bool {
        matches!(self.metadata.backing_type, BackingType::MemFd)
    }
}

impl Drop for SharedRegion {
    fn drop(&mut self) {
        // File and OwnedFd close themselves; the raw fd needs a manual close
        // only if neither owner is present
        if self._file.is_none() && self._owned_fd.is_none() && self.fd != -1 {
            unsafe {
                libc::close(self.fd);
            }
        }
    }
}

unsafe impl Send for SharedRegion {}
unsafe impl Sync for SharedRegion {}

//! Configuration types for shared memory regions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Types of shared memory backing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackingType {
    /// File-backed shared memory
    FileBacked,
    /// Anonymous memory file descriptor (Linux-specific)
    #[cfg(target_os = "linux")]
    MemFd,
}

impl Default for BackingType {
    fn default() -> Self {
        Self::FileBacked
    }
}

impl BackingType {
    /// Check if this backing type is supported on the current platform
    pub fn is_supported(&self) -> bool {
        match self {
            BackingType::FileBacked => true,
            #[cfg(target_os = "linux")]
            BackingType::MemFd => true,
        }
    }

    /// Get a human-readable name for the backing type
    pub fn name(&self) -> &'static str {
        match self {
            BackingType::FileBacked => "file-backed",
            #[cfg(target_os = "linux")]
            BackingType::MemFd => "memfd",
        }
    }
}

/// Configuration for creating or attaching to a shared memory region
#[derive(Debug, Clone)]
pub struct RegionConfig {
    /// Name of the region
    pub name: String,
    /// Total size of the region in bytes (may be 0 when attaching to an
    /// existing file, in which case the file length is used)
    pub size: usize,
    /// Backing type for the shared memory
    pub backing_type: BackingType,
    /// Optional file path for file-backed regions
    pub file_path: Option<PathBuf>,
    /// Whether to create the region rather than attach to an existing one
    pub create: bool,
    /// Unix permissions applied when creating a backing file
    pub permissions: u32,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            size: 0,
            backing_type: BackingType::default(),
            file_path: None,
            create: true,
            permissions: 0o644,
        }
    }
}

impl RegionConfig {
    /// Create a new region configuration
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            ..Default::default()
        }
    }

    /// Set the backing type
    pub fn with_backing_type(mut self, backing_type: BackingType) -> Self {
        self.backing_type = backing_type;
        self
    }

    /// Set the file path for file-backed regions
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Set whether to create the region or attach to an existing one
    pub fn with_create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Set the permissions for the backing file
    pub fn with_permissions(mut self, permissions: u32) -> Self {
        self.permissions = permissions;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        use crate::error::CrierError;

        if self.name.is_empty() {
            return Err(CrierError::invalid_parameter(
                "name",
                "Region name cannot be empty",
            ));
        }

        if self.create && self.size == 0 {
            return Err(CrierError::invalid_parameter(
                "size",
                "Region size must be greater than 0",
            ));
        }

        if !self.backing_type.is_supported() {
            return Err(CrierError::invalid_parameter(
                "backing_type",
                &format!(
                    "Backing type {} is not supported on this platform",
                    self.backing_type.name()
                ),
            ));
        }

        Ok(())
    }

    /// Get the file path for this region, deriving one from the name if
    /// none was set
    pub fn resolved_file_path(&self) -> PathBuf {
        self.file_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("/dev/shm/crier_{}", self.name)))
    }
}

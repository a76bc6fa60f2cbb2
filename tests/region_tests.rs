//! Integration tests for shared memory regions

use std::fs::File;

use crier::region::{BackingType, RegionConfig, SharedRegion};
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_config_default() {
        let config = RegionConfig::default();
        assert_eq!(config.backing_type, BackingType::FileBacked);
        assert!(config.create);
        assert_eq!(config.permissions, 0o644);
    }

    #[test]
    fn test_create_file_backed_region() {
        let temp_dir = TempDir::new().unwrap();
        let config = RegionConfig {
            name: "test_region".to_string(),
            size: 4096,
            backing_type: BackingType::FileBacked,
            file_path: Some(temp_dir.path().join("test_shm")),
            create: true,
            permissions: 0o644,
        };

        let region = SharedRegion::new(config).unwrap();
        assert_eq!(region.name(), "test_region");
        assert_eq!(region.size(), 4096);
        assert!(region.is_file_backed());
        assert!(region.fd() >= 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_create_memfd_region() {
        let config = RegionConfig::new("test_memfd", 4096).with_backing_type(BackingType::MemFd);

        let region = SharedRegion::new(config).unwrap();
        assert_eq!(region.name(), "test_memfd");
        assert_eq!(region.size(), 4096);
        assert!(region.is_memfd_backed());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_memfd_cannot_be_attached_by_name() {
        let config = RegionConfig::new("test_memfd_attach", 4096)
            .with_backing_type(BackingType::MemFd)
            .with_create(false);

        assert!(SharedRegion::new(config).is_err());
    }

    #[test]
    fn test_attach_derives_size_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sized_shm");

        let create_config = RegionConfig::new("sized", 8192).with_file_path(&path);
        let region = SharedRegion::create(create_config).unwrap();
        unsafe {
            *region.as_mut_ptr() = 42;
        }
        region.flush().unwrap();
        drop(region);

        // Size 0 means take the length from the existing file
        let attach_config = RegionConfig::new("sized", 0).with_file_path(&path);
        let attached = SharedRegion::open(attach_config).unwrap();
        assert_eq!(attached.size(), 8192);
        assert_eq!(attached.as_slice()[0], 42);
    }

    #[test]
    fn test_attach_to_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config = RegionConfig::new("missing", 0)
            .with_file_path(temp_dir.path().join("does_not_exist"));

        assert!(SharedRegion::open(config).is_err());
    }

    #[test]
    fn test_attach_to_empty_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty_shm");
        File::create(&path).unwrap();

        let config = RegionConfig::new("empty", 0).with_file_path(&path);
        assert!(SharedRegion::open(config).is_err());
    }

    #[test]
    fn test_region_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let config = RegionConfig::new("meta_region", 4096)
            .with_file_path(temp_dir.path().join("meta_shm"));

        let region = SharedRegion::new(config).unwrap();
        let metadata = region.metadata();
        assert_eq!(metadata.name, "meta_region");
        assert_eq!(metadata.size, 4096);
        assert_eq!(metadata.backing_type, BackingType::FileBacked);
        assert!(metadata.age_seconds().is_some());
    }

    #[test]
    fn test_writes_persist_across_mappings() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("persist_shm");

        let writer_region =
            SharedRegion::create(RegionConfig::new("persist", 4096).with_file_path(&path)).unwrap();
        unsafe {
            let ptr = writer_region.as_mut_ptr();
            for i in 0..16u8 {
                *ptr.add(i as usize) = i;
            }
        }

        // A second mapping of the same file sees the same bytes
        let reader_region =
            SharedRegion::open(RegionConfig::new("persist", 0).with_file_path(&path)).unwrap();
        for i in 0..16u8 {
            assert_eq!(reader_region.as_slice()[i as usize], i);
        }
    }
}

//! File metadata queries used for change detection.

use std::path::Path;
use std::time::SystemTime;

/// Modification time of a file; `None` when it could not be determined.
pub type FileStamp = Option<SystemTime>;

/// Whether `current` should be treated as a different file version than
/// `reference`. An unknown stamp on either side always counts as changed,
/// so missing or unreadable files keep being retried.
pub fn stamp_changed(reference: FileStamp, current: FileStamp) -> bool {
    match (reference, current) {
        (Some(reference), Some(current)) => reference != current,
        _ => true,
    }
}

/// File metadata provided by the host. Never fails: errors map to `None`.
pub trait FileProbe: Send + Sync {
    /// Last modification time of `path`.
    fn modified_time(&self, path: &Path) -> FileStamp;

    /// Whether `path` currently exists.
    fn exists(&self, path: &Path) -> bool {
        self.modified_time(path).is_some()
    }
}

/// [`FileProbe`] backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsProbe;

impl FileProbe for FsProbe {
    fn modified_time(&self, path: &Path) -> FileStamp {
        match std::fs::metadata(path).and_then(|meta| meta.modified()) {
            Ok(time) => Some(time),
            Err(e) => {
                log::trace!("No modification time for {:?}: {}", path, e);
                None
            }
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_stamp_changed() {
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
        let t1 = t0 + Duration::from_secs(1);

        assert!(!stamp_changed(Some(t0), Some(t0)));
        assert!(stamp_changed(Some(t0), Some(t1)));
        assert!(stamp_changed(Some(t0), None));
        assert!(stamp_changed(None, Some(t0)));
        assert!(stamp_changed(None, None));
    }

    #[test]
    fn test_fs_probe_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no-such-file.png");
        assert_eq!(FsProbe.modified_time(&path), None);
        assert!(!FsProbe.exists(&path));
    }

    #[test]
    fn test_fs_probe_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("image.png");
        std::fs::write(&path, b"x").unwrap();
        assert!(FsProbe.modified_time(&path).is_some());
        assert!(FsProbe.exists(&path));
    }
}

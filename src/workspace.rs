//! Directory management for results and scratch space.
//!
//! All operations are destructive-safe in one direction only: they may remove what sits at the
//! exact path they are given, never anything above it. Failures carry the offending path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::log::{Console, LogSink};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("cannot remove '{}': {source}", .path.display())]
    Remove { path: PathBuf, source: io::Error },

    #[error("cannot create directory '{}': {source}", .path.display())]
    Create { path: PathBuf, source: io::Error },

    #[error("cannot read directory '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("'{name}' is not a plain directory name")]
    InvalidName { name: String },

    #[error("cannot copy '{}' to '{}': {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

/// Creates, resets and drains directories, warning through a console sink when it overwrites.
#[derive(Debug)]
pub struct Workspace {
    log: LogSink,
}

impl Workspace {
    pub fn new(console: Console) -> Self {
        Self {
            log: LogSink::new(console),
        }
    }

    /// Remove whatever is at `path` and create an empty directory there.
    ///
    /// Missing parents are created too.
    pub fn ensure_clean_directory(&self, path: &Path, warn_if_overwriting: bool) -> Result<(), WorkspaceError> {
        if let Ok(meta) = fs::symlink_metadata(path) {
            if warn_if_overwriting {
                self.log.warn(&format!("Overwriting '{}'", path.display()));
            }
            let removed = if meta.is_dir() {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            };
            removed.map_err(|source| WorkspaceError::Remove {
                path: path.to_path_buf(),
                source,
            })?;
        }
        create_dir_all(path)
    }

    /// Create `path` as a directory unless one is already there.
    ///
    /// A file (or a link that does not lead to a directory) at `path` is removed first.
    pub fn ensure_directory_exists(&self, path: &Path, warn_if_overwriting: bool) -> Result<(), WorkspaceError> {
        if path.is_dir() {
            return Ok(());
        }
        if fs::symlink_metadata(path).is_ok() {
            if warn_if_overwriting {
                self.log.warn(&format!("Overwriting '{}'", path.display()));
            }
            fs::remove_file(path).map_err(|source| WorkspaceError::Remove {
                path: path.to_path_buf(),
                source,
            })?;
        }
        create_dir_all(path)
    }

    /// Remove every entry inside `path`, keeping the directory itself.
    ///
    /// A missing directory is created, so afterwards `path` is always an empty directory.
    /// Returns the number of entries removed.
    pub fn drain_directory(&self, path: &Path) -> Result<usize, WorkspaceError> {
        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                create_dir_all(path)?;
                return Ok(0);
            }
            Err(source) => {
                return Err(WorkspaceError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|source| WorkspaceError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let entry_path = entry.path();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            let result = if is_dir {
                fs::remove_dir_all(&entry_path)
            } else {
                fs::remove_file(&entry_path)
            };
            result.map_err(|source| WorkspaceError::Remove {
                path: entry_path.clone(),
                source,
            })?;
            removed += 1;
        }
        tracing::debug!(path = %path.display(), removed, "drained directory");
        Ok(removed)
    }

    /// Copy `file` into `dir` under its own file name and return the destination.
    pub fn copy_into(&self, file: &Path, dir: &Path) -> Result<PathBuf, WorkspaceError> {
        let Some(name) = file.file_name() else {
            return Err(WorkspaceError::Copy {
                from: file.to_path_buf(),
                to: dir.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "source has no file name"),
            });
        };
        let dest = dir.join(name);
        fs::copy(file, &dest).map_err(|source| WorkspaceError::Copy {
            from: file.to_path_buf(),
            to: dest.clone(),
            source,
        })?;
        Ok(dest)
    }
}

fn create_dir_all(path: &Path) -> Result<(), WorkspaceError> {
    fs::create_dir_all(path).map_err(|source| WorkspaceError::Create {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn workspace() -> Workspace {
        Workspace::new(Console::Silent)
    }

    fn entries(path: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(path)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    // ========================================
    // ensure_clean_directory
    // ========================================

    #[test]
    fn test_clean_creates_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("a/b");
        workspace().ensure_clean_directory(&path, false).unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn test_clean_empties_existing_directory() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("results");
        fs::create_dir_all(path.join("nested")).unwrap();
        fs::write(path.join("stale.log"), "old").unwrap();
        fs::write(path.join("nested/deep.txt"), "old").unwrap();

        workspace().ensure_clean_directory(&path, true).unwrap();
        assert!(path.is_dir());
        assert!(entries(&path).is_empty());
    }

    #[test]
    fn test_clean_replaces_file() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("results");
        fs::write(&path, "not a dir").unwrap();

        workspace().ensure_clean_directory(&path, true).unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn test_clean_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("scratch");
        let ws = workspace();
        ws.ensure_clean_directory(&path, false).unwrap();
        ws.ensure_clean_directory(&path, false).unwrap();
        assert!(path.is_dir());
        assert!(entries(&path).is_empty());
    }

    // ========================================
    // ensure_directory_exists
    // ========================================

    #[test]
    fn test_exists_keeps_contents() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("results");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep.txt"), "x").unwrap();

        workspace().ensure_directory_exists(&path, true).unwrap();
        assert_eq!(entries(&path), vec!["keep.txt"]);
    }

    #[test]
    fn test_exists_replaces_file_with_directory() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("results");
        fs::write(&path, "in the way").unwrap();

        workspace().ensure_directory_exists(&path, false).unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn test_exists_creates_parents() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("x/y/z");
        workspace().ensure_directory_exists(&path, false).unwrap();
        assert!(path.is_dir());
    }

    // ========================================
    // drain_directory
    // ========================================

    #[test]
    fn test_drain_removes_files_and_subdirectories() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("work");
        fs::create_dir_all(path.join("sub/inner")).unwrap();
        fs::write(path.join("a.out"), "1").unwrap();
        fs::write(path.join("sub/inner/b.out"), "2").unwrap();

        let removed = workspace().drain_directory(&path).unwrap();
        assert_eq!(removed, 2);
        assert!(path.is_dir());
        assert!(entries(&path).is_empty());
    }

    #[test]
    fn test_drain_recreates_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("gone");
        assert_eq!(workspace().drain_directory(&path).unwrap(), 0);
        assert!(path.is_dir());
    }

    #[test]
    fn test_drain_on_file_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("file");
        fs::write(&path, "x").unwrap();
        let err = workspace().drain_directory(&path).unwrap_err();
        assert!(matches!(err, WorkspaceError::Read { .. }));
    }

    // ========================================
    // copy_into
    // ========================================

    #[test]
    fn test_copy_into_keeps_file_name() {
        let root = tempfile::tempdir().unwrap();
        let src = root.path().join("a.txt");
        let dir = root.path().join("dest");
        fs::write(&src, "payload").unwrap();
        fs::create_dir(&dir).unwrap();

        let dest = workspace().copy_into(&src, &dir).unwrap();
        assert_eq!(dest, dir.join("a.txt"));
        assert_eq!(fs::read_to_string(dest).unwrap(), "payload");
    }

    #[test]
    fn test_copy_into_missing_source() {
        let root = tempfile::tempdir().unwrap();
        let err = workspace()
            .copy_into(&root.path().join("nope.txt"), root.path())
            .unwrap_err();
        assert!(err.to_string().contains("nope.txt"));
    }
}

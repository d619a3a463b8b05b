//! Transient working files
//!
//! Concurrent requests share one directory, so names combine a millisecond
//! timestamp with a random suffix. [`TempFile`] removes its file when dropped.

use crate::Result;
use chrono::Utc;
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

const SUFFIX_LEN: usize = 9;

#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `tweet-<millis>-<random>.<ext>`
    pub fn unique_name(ext: &str) -> String {
        let random = uuid::Uuid::new_v4().simple().to_string();
        format!(
            "tweet-{}-{}.{}",
            Utc::now().timestamp_millis(),
            &random[..SUFFIX_LEN],
            ext
        )
    }

    /// Reserve a fresh path under the directory, creating it on demand.
    /// Nothing is written; the guard deletes whatever ends up at the path.
    pub fn temp_file(&self, ext: &str) -> Result<TempFile> {
        fs::create_dir_all(&self.root)?;
        Ok(TempFile {
            path: self.root.join(Self::unique_name(ext)),
        })
    }
}

/// A working file that is deleted when the guard goes out of scope
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove working file {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> WorkDir {
        WorkDir::new(std::env::temp_dir().join(format!("tweetpress-workdir-{}-{}", name, std::process::id())))
    }

    #[test]
    fn names_are_unique_and_well_formed() {
        let a = WorkDir::unique_name("pdf");
        let b = WorkDir::unique_name("pdf");
        assert_ne!(a, b);
        assert!(a.starts_with("tweet-"));
        assert!(a.ends_with(".pdf"));
        let parts: Vec<&str> = a.trim_end_matches(".pdf").split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
    }

    #[test]
    fn temp_file_is_removed_on_drop() {
        let dir = scratch("drop");
        let path = {
            let file = dir.temp_file("bin").expect("temp file");
            fs::write(file.path(), b"data").expect("write");
            assert!(file.path().exists());
            file.path().to_path_buf()
        };
        assert!(!path.exists());
        fs::remove_dir_all(dir.root()).ok();
    }

    #[test]
    fn unwritten_temp_file_drops_quietly() {
        let dir = scratch("unwritten");
        let file = dir.temp_file("png").expect("temp file");
        assert!(dir.root().is_dir());
        drop(file);
        fs::remove_dir_all(dir.root()).ok();
    }
}

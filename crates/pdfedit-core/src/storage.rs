//! File access used when opening and saving documents

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub trait Storage {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replace the contents of `path`, creating it if needed
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Local filesystem storage
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl Storage for FsStorage {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::write(path, bytes)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::copy(from, to).map(|_| ())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// Sibling path used to keep the previous file while saving over it.
///
/// Never equal to `path`: a target already carrying the backup extension
/// gets it appended a second time.
pub fn backup_path(path: &Path, extension: &str) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == extension) {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(extension);
        return PathBuf::from(name);
    }
    path.with_extension(extension)
}

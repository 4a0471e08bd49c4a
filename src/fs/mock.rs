// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, HashSet};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir,
    Symlink(PathBuf),
}

/// In-memory filesystem.
///
/// Paths are stored verbatim, so tests should stick to one style (absolute
/// paths are easiest). Parent directories are created implicitly.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<BTreeMap<PathBuf, MockEntry>>>,
    failing: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.entries.lock().unwrap();
        ensure_parents(&mut entries, &path);
        entries.insert(path, MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.entries.lock().unwrap();
        ensure_parents(&mut entries, &path);
        entries.insert(path, MockEntry::Dir);
    }

    /// Make every operation on `path` fail from now on.
    pub fn fail_on(&self, path: impl AsRef<Path>) {
        self.failing
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf());
    }

    pub fn entry(&self, path: impl AsRef<Path>) -> Option<MockEntry> {
        self.entries.lock().unwrap().get(path.as_ref()).cloned()
    }

    /// Contents of a file, if `path` is one.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.entry(path) {
            Some(MockEntry::File(data)) => Some(data),
            _ => None,
        }
    }

    /// Target of a symlink, if `path` is one.
    pub fn link_target(&self, path: impl AsRef<Path>) -> Option<PathBuf> {
        match self.entry(path) {
            Some(MockEntry::Symlink(target)) => Some(target),
            _ => None,
        }
    }

    fn check(&self, path: &Path) -> Result<()> {
        if self.failing.lock().unwrap().contains(path) {
            return Err(anyhow!("injected failure for {:?}", path));
        }
        Ok(())
    }
}

fn ensure_parents(entries: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
    let mut current = path.parent();
    while let Some(dir) = current {
        if dir.as_os_str().is_empty() {
            break;
        }
        entries
            .entry(dir.to_path_buf())
            .or_insert(MockEntry::Dir);
        current = dir.parent();
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.check(path)?;
        match self.entry(path) {
            Some(MockEntry::File(content)) => {
                String::from_utf8(content).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Symlink(target)) => self.read_to_string(&target),
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        self.check(path)?;
        match self.entry(path) {
            Some(MockEntry::File(content)) => Ok(Box::new(Cursor::new(content))),
            Some(MockEntry::Symlink(target)) => self.open_read(&target),
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.check(path)?;
        self.add_file(path, contents);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.check(path)?;
        match self.entry(path) {
            Some(MockEntry::Dir) => Ok(()),
            Some(_) => Err(anyhow!("Not a directory: {:?}", path)),
            None => {
                self.add_dir(path);
                Ok(())
            }
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries.lock().unwrap().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entry(path), Some(MockEntry::Dir))
    }

    fn symlink(&self, target: &Path, link: &Path) -> Result<()> {
        self.check(link)?;
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(link) {
            let err = std::io::Error::from(std::io::ErrorKind::AlreadyExists);
            return Err(anyhow::Error::new(err).context(format!("linking {:?}", link)));
        }
        ensure_parents(&mut entries, link);
        entries.insert(link.to_path_buf(), MockEntry::Symlink(target.to_path_buf()));
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.check(path)?;
        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::Dir) => Ok(entries
                .keys()
                .filter(|p| p.parent() == Some(path))
                .cloned()
                .collect()),
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}

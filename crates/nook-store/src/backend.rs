use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{StoreError, StoreResult};

/// Raw storage for named collections.
///
/// A backend only moves bytes; encoding, decoding and the permissive-read
/// policy live in [`crate::Collection`].
pub trait CollectionBackend: Send + Sync {
    /// Contents of the named collection, or `None` if it was never written.
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Replace the named collection wholesale.
    fn write(&self, name: &str, contents: &[u8]) -> StoreResult<()>;

    fn exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.read(name)?.is_some())
    }
}

/// One `<name>.json` file per collection inside a data directory.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so readers see either the old or the new contents.
pub struct JsonDirBackend {
    dir: PathBuf,
}

impl JsonDirBackend {
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        info!("Data directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing a collection.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl CollectionBackend for JsonDirBackend {
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.file_path(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, contents: &[u8]) -> StoreResult<()> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.file_path(name))
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.file_path(name).is_file())
    }
}

/// HashMap-backed collections for tests and embedding.
#[derive(Default)]
pub struct MemoryBackend {
    collections: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection with arbitrary bytes, valid JSON or not.
    pub fn insert_raw(&self, name: &str, contents: impl Into<Vec<u8>>) -> StoreResult<()> {
        self.write(name, &contents.into())
    }
}

impl CollectionBackend for MemoryBackend {
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        let map = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned(name.to_string()))?;
        Ok(map.get(name).cloned())
    }

    fn write(&self, name: &str, contents: &[u8]) -> StoreResult<()> {
        let mut map = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned(name.to_string()))?;
        map.insert(name.to_string(), contents.to_vec());
        Ok(())
    }
}

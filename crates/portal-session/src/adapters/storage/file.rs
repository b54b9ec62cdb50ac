use crate::error::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use fs2::FileExt;
use tracing::{debug, warn};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// File-backed key-value store holding the persisted session.
///
/// Every change takes an exclusive `fs2` lock on a sibling `.lock` file,
/// reloads the file, applies the change and rewrites the whole map (temp
/// file + rename). Two portal processes sharing a data directory therefore
/// never interleave writes, and a change made by one is not lost when the
/// other writes next. Reads are served from the map as of the last load or
/// commit.
///
/// On-disk format: `[key_len:u32][key][value_len:u32][value]...`, little
/// endian. A truncated tail is ignored on load.
pub struct FileBackedKVStore {
    data: HashMap<Vec<u8>, Vec<u8>>,
    path: PathBuf,
}

impl FileBackedKVStore {
    /// Open the store at `path`, loading whatever is already there.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        let data = match Self::load_from_file(&path) {
            Some(data) => {
                debug!(
                    "[portal] 💾 Loaded {} session keys from {}",
                    data.len(),
                    path.display()
                );
                data
            }
            None => {
                debug!("[portal] 📁 No session file at {}", path.display());
                HashMap::new()
            }
        };

        Self { data, path }
    }

    /// Path of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn load_from_file(path: &Path) -> Option<HashMap<Vec<u8>, Vec<u8>>> {
        let mut file = File::open(path).ok()?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).ok()?;

        let mut data = HashMap::new();
        let mut cursor = 0;

        while let Some(key) = read_frame(&bytes, &mut cursor) {
            let Some(value) = read_frame(&bytes, &mut cursor) else {
                break;
            };
            data.insert(key, value);
        }

        Some(data)
    }

    fn encode(data: &HashMap<Vec<u8>, Vec<u8>>) -> Vec<u8> {
        let mut bytes = Vec::new();
        for (key, value) in data {
            bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
            bytes.extend_from_slice(key);
            bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
            bytes.extend_from_slice(value);
        }
        bytes
    }

    /// Apply `change` to the on-disk map under the lock, persist it, and only
    /// then make it the live map.
    fn commit<F>(&mut self, change: F) -> Result<(), KVStoreError>
    where
        F: FnOnce(&mut HashMap<Vec<u8>, Vec<u8>>),
    {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_error)?;
            }
        }

        let lock_path = self.lock_path();
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(io_error)?;
        lock.lock_exclusive().map_err(|e| KVStoreError::LockFailed {
            path: lock_path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut next = Self::load_from_file(&self.path).unwrap_or_default();
        change(&mut next);
        let result = self.write_atomically(&Self::encode(&next));

        if let Err(e) = lock.unlock() {
            warn!("[portal] Could not release {}: {}", lock_path.display(), e);
        }
        result?;

        self.data = next;
        Ok(())
    }

    fn write_atomically(&self, bytes: &[u8]) -> Result<(), KVStoreError> {
        let temp_path = self.path.with_extension("tmp");
        let mut file = File::create(&temp_path).map_err(io_error)?;
        file.write_all(bytes).map_err(io_error)?;
        file.sync_all().map_err(io_error)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_error)
    }
}

fn read_frame(bytes: &[u8], cursor: &mut usize) -> Option<Vec<u8>> {
    let header = bytes.get(*cursor..*cursor + 4)?;
    let len = u32::from_le_bytes(header.try_into().ok()?) as usize;
    let start = *cursor + 4;
    let frame = bytes.get(start..start.checked_add(len)?)?.to_vec();
    *cursor = start + len;
    Some(frame)
}

fn io_error(e: std::io::Error) -> KVStoreError {
    KVStoreError::IOError {
        message: e.to_string(),
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.commit(|data| {
            data.insert(key.to_vec(), value.to_vec());
        })
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.commit(|data| {
            data.remove(key);
        })
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        self.commit(|data| {
            for op in operations {
                match op {
                    BatchOperation::Put { key, value } => {
                        data.insert(key, value);
                    }
                    BatchOperation::Delete { key } => {
                        data.remove(&key);
                    }
                }
            }
        })
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.data.contains_key(key))
    }
}

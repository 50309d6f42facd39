/*!
 * kvstore: log-structured key-value store
*/

mod command;
mod compaction;
mod index;
mod segment;

use std::{
    path::PathBuf,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use self::{
    command::Command,
    compaction::read_live_value,
    index::KeyIndex,
    segment::SegmentStore,
};
use crate::{config::StoreConfig, KvsEngine, KvsError, Result};

/// key-value store, both key and value are [`String`]
///
/// Every mutation is appended to a log segment on disk and the in-memory index
/// remembers where the latest value of each key lives. Once enough bytes are
/// superseded the live values are rewritten and the old segments deleted.
///
/// ```rust
/// use kvs::{KvStore, Result, KvsEngine};
/// # fn main() -> Result<()> {
/// let dir = tempfile::TempDir::new()?;
/// let store = KvStore::open(dir.path())?;
/// store.set("key1".to_owned(), "value1".to_owned())?;
/// assert_eq!(store.get("key1".to_owned())?, Some("value1".to_owned()));
/// store.remove("key1".to_owned())?;
/// assert_eq!(store.get("key1".to_owned())?, None);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct KvStore {
    state: Arc<RwLock<StoreState>>,
}

struct StoreState {
    segments: SegmentStore,
    index: KeyIndex,
    uncompacted: u64,
    /// value of `uncompacted` when the last pass failed
    compaction_floor: u64,
    config: StoreConfig,
}

impl KvStore {
    /// open the store in directory `path` with a custom [`StoreConfig`]
    pub fn open_with_config(path: impl Into<PathBuf>, config: StoreConfig) -> Result<Self> {
        let path = path.into();
        let segments = SegmentStore::open(&path, config.segment_size_limit)?;
        let index = KeyIndex::default();
        let mut uncompacted = 0;

        let mut commands = 0usize;
        for item in segments.replay_all() {
            let (pointer, command) = item?;
            commands += 1;
            match command {
                Command::Set { key, .. } => {
                    if let Some(previous) = index.update_on_set(key, pointer) {
                        uncompacted += previous.length;
                    }
                }
                Command::Remove { key } => {
                    if let Some(previous) = index.update_on_remove(&key) {
                        uncompacted += previous.length;
                    }
                    uncompacted += pointer.length;
                }
            }
        }
        log::info!(
            "opened {}: {} commands replayed, {} live keys, {} uncompacted bytes",
            path.display(),
            commands,
            index.len(),
            uncompacted
        );

        Ok(Self {
            state: Arc::new(RwLock::new(StoreState {
                segments,
                index,
                uncompacted,
                compaction_floor: 0,
                config,
            })),
        })
    }

    /// bytes of superseded commands not yet reclaimed
    pub fn uncompacted_bytes(&self) -> Result<u64> {
        Ok(self.read_state()?.uncompacted)
    }

    /// number of live keys
    pub fn len(&self) -> Result<usize> {
        Ok(self.read_state()?.index.len())
    }

    /// true if no key is set
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// run a compaction pass now, regardless of the threshold
    pub fn compact(&self) -> Result<()> {
        self.write_state()?.compact()
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|e| KvsError::StringError(e.to_string()))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|e| KvsError::StringError(e.to_string()))
    }
}

impl StoreState {
    fn set(&mut self, key: String, value: String) -> Result<()> {
        let command = Command::Set { key, value };
        let pointer = self.segments.append(&command)?;

        if let Some(previous) = self.index.update_on_set(command.into_key(), pointer) {
            self.uncompacted += previous.length;
        }
        self.maybe_compact()
    }

    fn remove(&mut self, key: String) -> Result<()> {
        if self.index.lookup(&key).is_none() {
            return Err(KvsError::KeyNotFound);
        }

        let command = Command::Remove { key };
        let pointer = self.segments.append(&command)?;

        if let Some(previous) = self.index.update_on_remove(command.key()) {
            self.uncompacted += previous.length;
        }
        self.uncompacted += pointer.length;
        self.maybe_compact()
    }

    /// the triggering mutation is already durable, so a failed pass is only logged
    fn maybe_compact(&mut self) -> Result<()> {
        let pending = self.uncompacted.saturating_sub(self.compaction_floor);
        if pending > self.config.compaction_threshold {
            if let Err(e) = self.compact() {
                log::error!("compaction failed, retrying after more writes: {}", e);
                self.compaction_floor = self.uncompacted;
            }
        }
        Ok(())
    }

    fn compact(&mut self) -> Result<()> {
        log::info!(
            "compaction started, {} uncompacted bytes",
            self.uncompacted
        );
        let report = compaction::compact(&mut self.segments, &self.index)?;
        self.uncompacted = 0;
        self.compaction_floor = 0;
        log::info!(
            "compaction finished: {} live keys, {} segments removed, {} -> {} bytes",
            report.live_keys,
            report.removed_segments,
            report.bytes_before,
            report.bytes_after
        );
        Ok(())
    }
}

impl KvsEngine for KvStore {
    fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    fn set(&self, key: String, value: String) -> Result<()> {
        self.write_state()?.set(key, value)
    }

    fn get(&self, key: String) -> Result<Option<String>> {
        let state = self.read_state()?;
        let pointer = match state.index.lookup(&key) {
            Some(pointer) => pointer,
            None => return Ok(None),
        };

        Ok(Some(read_live_value(&state.segments, &key, pointer)?))
    }

    fn remove(&self, key: String) -> Result<()> {
        self.write_state()?.remove(key)
    }
}

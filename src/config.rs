/*!
 * tunables for the store and the wire
 */

use std::{
    fmt::{self, Display},
    fs,
    path::Path,
};

use clap::ValueEnum;

use crate::{codec::Framing, KvsError, Result};

const ENGINE_MARKER: &str = "engine";

/// bytes of superseded commands tolerated before a compaction pass
pub const DEFAULT_COMPACTION_THRESHOLD: u64 = 1024 * 1024;
/// bytes an active segment may hold before it is sealed
pub const DEFAULT_SEGMENT_SIZE_LIMIT: u64 = 4 * 1024 * 1024;

/// knobs of [`KvStore`](crate::KvStore)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// compaction runs once uncompacted bytes exceed this value
    pub compaction_threshold: u64,
    /// the active segment is rolled once it grows past this size
    pub segment_size_limit: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
            segment_size_limit: DEFAULT_SEGMENT_SIZE_LIMIT,
        }
    }
}

impl StoreConfig {
    /// override the compaction threshold
    pub fn compaction_threshold(mut self, bytes: u64) -> Self {
        self.compaction_threshold = bytes;
        self
    }

    /// override the segment size limit
    pub fn segment_size_limit(mut self, bytes: u64) -> Self {
        self.segment_size_limit = bytes;
        self
    }
}

/// available storage engines
#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum Engine {
    /// the log-structured [`KvStore`](crate::KvStore)
    Kvs,
    /// [`SledKvsEngine`](crate::SledKvsEngine)
    Sled,
}

impl Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Kvs => write!(f, "kvs"),
            Engine::Sled => write!(f, "sled"),
        }
    }
}

impl Engine {
    /// record `self` as the engine owning `dir`, or fail if another engine already does
    pub fn claim(self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let marker = dir.join(ENGINE_MARKER);

        if !marker.try_exists()? {
            fs::write(marker, self.to_string())?;
            return Ok(());
        }

        let found = fs::read_to_string(marker)?;
        if found.trim() != self.to_string() {
            return Err(KvsError::UnmatchedEngine {
                expected: self.to_string(),
                found: found.trim().to_owned(),
            });
        }
        Ok(())
    }
}

/// knobs shared by [`KvsServer`](crate::KvsServer) and [`KvsClient`](crate::KvsClient)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WireConfig {
    /// how messages are delimited on the stream
    pub framing: Framing,
    /// largest length-prefixed frame accepted
    pub max_frame_size: u64,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            framing: Framing::LengthPrefixed,
            max_frame_size: 16 * 1024 * 1024,
        }
    }
}

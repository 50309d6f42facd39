/*!
 * sled wrapper
 */

use std::path::PathBuf;

use sled::Db;

use crate::{KvsEngine, KvsError, Result};

/// A wrapper for sled
#[derive(Clone)]
pub struct SledKvsEngine {
    db: Db,
}

impl SledKvsEngine {
    /// wrap an already opened sled database
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

impl KvsEngine for SledKvsEngine {
    fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(sled::open(path.into())?))
    }

    fn set(&self, key: String, value: String) -> Result<()> {
        self.db.insert(key.as_bytes(), value.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }

    fn get(&self, key: String) -> Result<Option<String>> {
        self.db
            .get(key)?
            .map(|x| -> Result<_> { Ok(String::from_utf8(x.to_vec())?) })
            .transpose()
    }

    fn remove(&self, key: String) -> Result<()> {
        self.db.remove(key)?.ok_or(KvsError::KeyNotFound)?;
        self.db.flush()?;
        Ok(())
    }
}

/*!
 * engine trait
 */

use std::path::PathBuf;

use crate::Result;

/// kv engine trait
///
/// Handles are cheap to clone and every clone refers to the same data, so one
/// engine can be shared by all connections of a server.
pub trait KvsEngine: Clone + Send + 'static {
    /// open the engine over the directory `path`, creating it if needed
    fn open(path: impl Into<PathBuf>) -> Result<Self>;
    /// set a key-value pair
    fn set(&self, key: String, value: String) -> Result<()>;
    /// get value for a key, `None` if the key is absent
    fn get(&self, key: String) -> Result<Option<String>>;
    /// remove a key, fails with [`KvsError::KeyNotFound`](crate::KvsError::KeyNotFound) if absent
    fn remove(&self, key: String) -> Result<()>;
}

/*!
 * kvs: A key-value store
 *
 * [`KvStore`] keeps data in append-only log segments and compacts them in
 * place, [`SledKvsEngine`] delegates to sled. Both implement [`KvsEngine`] and
 * can be served over tcp by [`KvsServer`] and reached with [`KvsClient`].
*/

#![deny(missing_docs)]

mod client;
mod codec;
mod config;
mod engine;
mod kvstore;
mod req_resp;
mod result;
mod server;
mod sled_kvs_engine;
pub mod thread_pool;

pub use client::KvsClient;
pub use codec::{read_message, write_message, Framing};
pub use config::{Engine, StoreConfig, WireConfig};
pub use engine::KvsEngine;
pub use kvstore::KvStore;
pub use req_resp::{Request, Response};
pub use result::{KvsError, Result};
pub use server::KvsServer;
pub use sled_kvs_engine::SledKvsEngine;

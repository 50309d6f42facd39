/*!
 * result wrapper
 */

use std::{io, num::ParseIntError, string::FromUtf8Error};

use failure::Fail;

/// result type
pub type Result<T> = core::result::Result<T, KvsError>;

/// error kind of the whole crate
#[derive(Fail, Debug)]
pub enum KvsError {
    /// key not found
    #[fail(display = "Key not found")]
    KeyNotFound,
    /// a log pointer resolved to a command that is not a `Set`
    #[fail(
        display = "Unexpected command type at segment {} offset {}",
        generation, offset
    )]
    UnexpectedCommandType {
        /// segment the pointer addressed
        generation: u64,
        /// byte offset inside the segment
        offset: u64,
    },
    /// serde_json error
    #[fail(display = "{}", _0)]
    Serde(#[cause] serde_json::Error),
    /// std io error
    #[fail(display = "{}", _0)]
    Io(#[cause] io::Error),
    /// stored bytes are not valid utf-8
    #[fail(display = "{}", _0)]
    Utf8(#[cause] FromUtf8Error),
    /// sled error
    #[fail(display = "{}", _0)]
    Sled(#[cause] sled::Error),
    /// malformed segment generation
    #[fail(display = "{}", _0)]
    ParseInt(#[cause] ParseIntError),
    /// data directory was created by another engine
    #[fail(display = "Engine mismatch: data belongs to {}, requested {}", found, expected)]
    UnmatchedEngine {
        /// engine requested on startup
        expected: String,
        /// engine recorded in the data directory
        found: String,
    },
    /// a frame on the wire is larger than allowed
    #[fail(display = "Frame of {} bytes exceeds limit of {} bytes", size, limit)]
    FrameTooLarge {
        /// announced frame size
        size: u64,
        /// configured maximum
        limit: u64,
    },
    /// error with a plain message, also used for `Err` responses from a server
    #[fail(display = "{}", _0)]
    StringError(String),
}

impl From<serde_json::Error> for KvsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

impl From<io::Error> for KvsError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<FromUtf8Error> for KvsError {
    fn from(value: FromUtf8Error) -> Self {
        Self::Utf8(value)
    }
}

impl From<sled::Error> for KvsError {
    fn from(value: sled::Error) -> Self {
        Self::Sled(value)
    }
}

impl From<ParseIntError> for KvsError {
    fn from(value: ParseIntError) -> Self {
        Self::ParseInt(value)
    }
}

impl From<rayon::ThreadPoolBuildError> for KvsError {
    fn from(value: rayon::ThreadPoolBuildError) -> Self {
        Self::StringError(value.to_string())
    }
}

impl From<log::SetLoggerError> for KvsError {
    fn from(value: log::SetLoggerError) -> Self {
        Self::StringError(value.to_string())
    }
}

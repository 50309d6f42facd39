/*!
 * request and response in network
 */
use serde::{Deserialize, Serialize};

use crate::{KvsError, Result};

/// request in network
#[derive(Serialize, Deserialize, Debug)]
pub enum Request {
    /// get value for key
    Get {
        /// key
        key: String,
    },
    /// set key-value pair
    Set {
        /// key
        key: String,
        /// value
        value: String,
    },
    /// remove key
    Remove {
        /// key
        key: String,
    },
}

/// response in network, exactly one per [`Request`]
#[derive(Serialize, Deserialize, Debug)]
pub enum Response {
    /// request succeeded, `value` is only ever present for a hit on `Get`
    Ok {
        /// value of a `Get`
        value: Option<String>,
    },
    /// request failed on the server
    Err {
        /// display form of the server side error
        message: String,
    },
}

impl Response {
    /// turn the outcome of an engine call into a response
    pub fn from_result(result: Result<Option<String>>) -> Self {
        match result {
            Ok(value) => Response::Ok { value },
            Err(e) => Response::Err {
                message: e.to_string(),
            },
        }
    }

    /// turn the response back into the caller facing outcome
    pub fn into_result(self) -> Result<Option<String>> {
        match self {
            Response::Ok { value } => Ok(value),
            Response::Err { message } => Err(KvsError::StringError(message)),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::Result;

/// one mutation as recorded in a segment
///
/// Serialized as externally tagged JSON, e.g. `{"Set":{"key":"k","value":"v"}}`,
/// so every record names its own variant.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Set { key: String, value: String },
    Remove { key: String },
}

impl Command {
    pub(crate) fn key(&self) -> &str {
        match self {
            Command::Set { key, .. } | Command::Remove { key } => key,
        }
    }

    pub(crate) fn into_key(self) -> String {
        match self {
            Command::Set { key, .. } | Command::Remove { key } => key,
        }
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// byte range of one serialized command inside a segment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LogPointer {
    pub(crate) generation: u64,
    pub(crate) offset: u64,
    pub(crate) length: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_carries_the_variant_tag() {
        let set = Command::Set {
            key: "k".to_owned(),
            value: "v".to_owned(),
        };
        let remove = Command::Remove { key: "k".to_owned() };

        assert_eq!(
            String::from_utf8(set.encode().unwrap()).unwrap(),
            r#"{"Set":{"key":"k","value":"v"}}"#
        );
        assert_eq!(
            String::from_utf8(remove.encode().unwrap()).unwrap(),
            r#"{"Remove":{"key":"k"}}"#
        );
        assert_eq!(remove.key(), "k");
    }
}

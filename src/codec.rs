/*!
 * message framing on a byte stream
 */

use std::io::{BufRead, Write};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Deserializer;

use crate::{config::WireConfig, KvsError, Result};

const LENGTH_PREFIX_SIZE: usize = 4;

/// how consecutive messages are told apart on one connection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Framing {
    /// back-to-back JSON values, each one delimits itself
    Json,
    /// 4-byte big-endian length followed by a JSON body
    LengthPrefixed,
}

/// encode `message` and flush it to `writer`
pub fn write_message<W, T>(writer: &mut W, config: &WireConfig, message: &T) -> Result<()>
where
    W: Write,
    T: Serialize,
{
    let json = serde_json::to_vec(message)?;

    if config.framing == Framing::LengthPrefixed {
        if json.len() as u64 > config.max_frame_size || json.len() > u32::MAX as usize {
            return Err(KvsError::FrameTooLarge {
                size: json.len() as u64,
                limit: config.max_frame_size,
            });
        }
        writer.write_all(&(json.len() as u32).to_be_bytes())?;
    }
    writer.write_all(&json)?;
    writer.flush()?;

    Ok(())
}

/// decode one message from `reader`
///
/// `Ok(None)` means the peer closed the stream cleanly between two messages.
pub fn read_message<R, T>(reader: &mut R, config: &WireConfig) -> Result<Option<T>>
where
    R: BufRead,
    T: DeserializeOwned,
{
    match config.framing {
        Framing::Json => Deserializer::from_reader(reader)
            .into_iter::<T>()
            .next()
            .transpose()
            .map_err(KvsError::from),
        Framing::LengthPrefixed => {
            if reader.fill_buf()?.is_empty() {
                return Ok(None);
            }

            let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
            reader.read_exact(&mut prefix)?;
            let size = u32::from_be_bytes(prefix) as u64;
            if size > config.max_frame_size {
                return Err(KvsError::FrameTooLarge {
                    size,
                    limit: config.max_frame_size,
                });
            }

            let mut body = vec![0u8; size as usize];
            reader.read_exact(&mut body)?;
            Ok(Some(serde_json::from_slice(&body)?))
        }
    }
}

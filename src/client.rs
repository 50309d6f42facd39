/*!
 * client: one request and one response per call over a kept-alive connection
 */

use std::{
    io::{BufReader, BufWriter},
    net::{SocketAddr, TcpStream},
};

use crate::{
    codec::{read_message, write_message},
    config::WireConfig,
    KvsError, Request, Response, Result,
};

/// client of a [`KvsServer`](crate::KvsServer)
pub struct KvsClient {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    wire: WireConfig,
}

impl KvsClient {
    /// connect to a server at `addr`
    pub fn connect(addr: SocketAddr, wire: WireConfig) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
            wire,
        })
    }

    /// get value for `key`, `None` if the server has no such key
    pub fn get(&mut self, key: String) -> Result<Option<String>> {
        self.round_trip(Request::Get { key })
    }

    /// set `key` to `value`
    pub fn set(&mut self, key: String, value: String) -> Result<()> {
        self.round_trip(Request::Set { key, value }).map(|_| ())
    }

    /// remove `key`, an absent key is reported by the server as an error
    pub fn remove(&mut self, key: String) -> Result<()> {
        self.round_trip(Request::Remove { key }).map(|_| ())
    }

    fn round_trip(&mut self, request: Request) -> Result<Option<String>> {
        write_message(&mut self.writer, &self.wire, &request)?;

        let response: Response = read_message(&mut self.reader, &self.wire)?.ok_or_else(|| {
            KvsError::StringError("connection closed before a response arrived".to_owned())
        })?;
        response.into_result()
    }
}

/*!
 * server: serve a [`KvsEngine`] over tcp
 */

use std::{
    io::{BufReader, BufWriter},
    net::{SocketAddr, TcpListener, TcpStream},
};

use crate::{
    codec::{read_message, write_message},
    config::WireConfig,
    thread_pool::ThreadPool,
    KvsEngine, Request, Response, Result,
};

/// accepts connections and answers each request with exactly one response
pub struct KvsServer<E: KvsEngine, P: ThreadPool> {
    engine: E,
    pool: P,
    wire: WireConfig,
}

impl<E: KvsEngine, P: ThreadPool> KvsServer<E, P> {
    /// create a server over `engine`, connections run on `pool`
    pub fn new(engine: E, pool: P, wire: WireConfig) -> Self {
        Self { engine, pool, wire }
    }

    /// bind `addr` and serve forever
    pub fn run(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)?;
        log::info!("listening on {}", listener.local_addr()?);
        self.serve(listener)
    }

    /// serve connections arriving on an already bound `listener`
    pub fn serve(self, listener: TcpListener) -> Result<()> {
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    log::error!("accept failed: {}", e);
                    continue;
                }
            };

            let engine = self.engine.clone();
            let wire = self.wire;
            self.pool.spawn(move || {
                let peer = stream
                    .peer_addr()
                    .map_or_else(|_| "unknown peer".to_owned(), |addr| addr.to_string());
                log::debug!("receive a connection {}", peer);

                match process(engine, stream, &wire) {
                    Ok(()) => log::debug!("connection {} closed", peer),
                    Err(e) => log::error!("connection {} dropped: {}", peer, e),
                }
            });
        }

        Ok(())
    }
}

fn process(engine: impl KvsEngine, stream: TcpStream, wire: &WireConfig) -> Result<()> {
    let mut reader = BufReader::new(&stream);
    let mut writer = BufWriter::new(&stream);

    while let Some(request) = read_message::<_, Request>(&mut reader, wire)? {
        log::debug!("request {:?}", request);

        let response = match request {
            Request::Get { key } => Response::from_result(engine.get(key)),
            Request::Set { key, value } => {
                Response::from_result(engine.set(key, value).map(|_| None))
            }
            Request::Remove { key } => Response::from_result(engine.remove(key).map(|_| None)),
        };
        log::debug!("response {:?}", response);

        write_message(&mut writer, wire, &response)?;
    }

    Ok(())
}

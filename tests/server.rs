use std::{
    io::{BufReader, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    thread,
};

use crossbeam_utils::sync::WaitGroup;
use kvs::{
    read_message,
    thread_pool::{RayonThreadPool, SharedQueueThreadPool, ThreadPool},
    Framing, KvStore, KvsClient, KvsEngine, KvsError, KvsServer, Response, Result, SledKvsEngine,
    WireConfig,
};
use tempfile::TempDir;

fn spawn_server<E: KvsEngine, P: ThreadPool + Send + 'static>(
    engine: E,
    pool: P,
    wire: WireConfig,
) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    thread::spawn(move || KvsServer::new(engine, pool, wire).serve(listener));
    Ok(addr)
}

fn check_round_trips(addr: SocketAddr, wire: WireConfig) -> Result<()> {
    let mut client = KvsClient::connect(addr, wire)?;

    assert_eq!(client.get("a".to_owned())?, None);
    client.set("a".to_owned(), "1".to_owned())?;
    assert_eq!(client.get("a".to_owned())?, Some("1".to_owned()));
    client.set("a".to_owned(), "2".to_owned())?;
    assert_eq!(client.get("a".to_owned())?, Some("2".to_owned()));
    client.remove("a".to_owned())?;
    assert_eq!(client.get("a".to_owned())?, None);

    match client.remove("a".to_owned()) {
        Err(KvsError::StringError(message)) => assert_eq!(message, "Key not found"),
        other => panic!("unexpected outcome {:?}", other),
    }

    // the connection is still usable after an error response
    client.set("b".to_owned(), "3".to_owned())?;
    assert_eq!(client.get("b".to_owned())?, Some("3".to_owned()));
    Ok(())
}

#[test]
fn kvs_over_length_prefixed_frames() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let wire = WireConfig::default();
    let addr = spawn_server(
        KvStore::open(temp_dir.path())?,
        SharedQueueThreadPool::new(2)?,
        wire,
    )?;
    check_round_trips(addr, wire)
}

#[test]
fn kvs_over_json_stream() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let wire = WireConfig {
        framing: Framing::Json,
        ..WireConfig::default()
    };
    let addr = spawn_server(
        KvStore::open(temp_dir.path())?,
        RayonThreadPool::new(2)?,
        wire,
    )?;
    check_round_trips(addr, wire)
}

#[test]
fn sled_behaves_like_kvs() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let wire = WireConfig::default();
    let addr = spawn_server(
        SledKvsEngine::open(temp_dir.path())?,
        SharedQueueThreadPool::new(2)?,
        wire,
    )?;
    check_round_trips(addr, wire)
}

#[test]
fn garbage_closes_only_that_connection() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let wire = WireConfig {
        framing: Framing::Json,
        ..WireConfig::default()
    };
    let addr = spawn_server(
        KvStore::open(temp_dir.path())?,
        SharedQueueThreadPool::new(2)?,
        wire,
    )?;

    let mut bad = TcpStream::connect(addr)?;
    bad.write_all(b"this is not json")?;
    bad.flush()?;
    let mut reader = BufReader::new(bad);
    assert!(!matches!(
        read_message::<_, Response>(&mut reader, &wire),
        Ok(Some(_))
    ));

    let mut client = KvsClient::connect(addr, wire)?;
    client.set("k".to_owned(), "v".to_owned())?;
    assert_eq!(client.get("k".to_owned())?, Some("v".to_owned()));
    Ok(())
}

#[test]
fn many_clients_share_one_engine() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let wire = WireConfig::default();
    let addr = spawn_server(
        KvStore::open(temp_dir.path())?,
        SharedQueueThreadPool::new(4)?,
        wire,
    )?;

    let wg = WaitGroup::new();
    for id in 0..8 {
        let wg = wg.clone();
        thread::spawn(move || {
            let mut client = KvsClient::connect(addr, wire).unwrap();
            for i in 0..20 {
                client
                    .set(format!("client{id}-key{i}"), format!("value{i}"))
                    .unwrap();
            }
            drop(wg);
        });
    }
    wg.wait();

    let mut client = KvsClient::connect(addr, wire)?;
    for id in 0..8 {
        for i in 0..20 {
            assert_eq!(
                client.get(format!("client{id}-key{i}"))?,
                Some(format!("value{i}"))
            );
        }
    }
    Ok(())
}

use std::{
    net::{SocketAddr, TcpListener},
    process::Command,
    thread,
};

use assert_cmd::prelude::*;
use kvs::{
    thread_pool::{SharedQueueThreadPool, ThreadPool},
    Engine, KvStore, KvsEngine, KvsServer, Result, WireConfig,
};
use predicates::{
    ord::eq,
    str::{contains, PredicateStrExt},
};
use tempfile::TempDir;

fn spawn_kvs_server(temp_dir: &TempDir) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let server = KvsServer::new(
        KvStore::open(temp_dir.path())?,
        SharedQueueThreadPool::new(2)?,
        WireConfig::default(),
    );
    thread::spawn(move || server.serve(listener));
    Ok(addr)
}

#[test]
fn client_get_set_rm() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let addr = spawn_kvs_server(&temp_dir)?.to_string();

    Command::cargo_bin("kvs-client")
        .unwrap()
        .args(&["get", "key1", "--addr", &addr])
        .assert()
        .success()
        .stdout(eq("Key not found").trim());

    Command::cargo_bin("kvs-client")
        .unwrap()
        .args(&["set", "key1", "value1", "--addr", &addr])
        .assert()
        .success()
        .stdout(eq("").trim());

    Command::cargo_bin("kvs-client")
        .unwrap()
        .args(&["get", "key1", "--addr", &addr])
        .assert()
        .success()
        .stdout(eq("value1").trim());

    Command::cargo_bin("kvs-client")
        .unwrap()
        .args(&["rm", "key1", "--addr", &addr])
        .assert()
        .success();

    Command::cargo_bin("kvs-client")
        .unwrap()
        .args(&["rm", "key1", "--addr", &addr])
        .assert()
        .failure()
        .stderr(contains("Key not found"));
    Ok(())
}

#[test]
fn client_without_server_fails() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?.to_string();
    drop(listener);

    Command::cargo_bin("kvs-client")
        .unwrap()
        .args(&["get", "key1", "--addr", &addr])
        .assert()
        .failure();
    Ok(())
}

#[test]
fn server_refuses_foreign_data_directory() -> Result<()> {
    let temp_dir = TempDir::new()?;
    Engine::Kvs.claim(temp_dir.path())?;

    Command::cargo_bin("kvs-server")
        .unwrap()
        .args(&["--engine", "sled", "--addr", "127.0.0.1:0", "--dir"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(contains("Engine mismatch"));
    Ok(())
}

use std::{
    env::current_dir,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use clap::{Parser, ValueEnum};
use kvs::{
    thread_pool::{RayonThreadPool, SharedQueueThreadPool, ThreadPool},
    Engine, KvStore, KvsEngine, KvsServer, Result, SledKvsEngine, WireConfig,
};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[arg(long, default_value_t = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 4000))]
    addr: SocketAddr,
    #[arg(long, value_enum, default_value_t = Engine::Kvs)]
    engine: Engine,
    /// data directory, defaults to the current directory
    #[arg(long)]
    dir: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Pool::SharedQueue)]
    pool: Pool,
    /// worker threads, defaults to the number of cpus
    #[arg(long)]
    threads: Option<u32>,
    /// more output per occurrence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Pool {
    SharedQueue,
    Rayon,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        log::error!("{}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    stderrlog::new()
        .verbosity(2 + cli.verbose as usize)
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;

    let dir = match cli.dir {
        Some(dir) => dir,
        None => current_dir()?,
    };
    log::info!(
        "version: {}, engine: {}, address: {}, directory: {}",
        env!("CARGO_PKG_VERSION"),
        cli.engine,
        cli.addr,
        dir.display()
    );

    cli.engine.claim(&dir)?;

    let threads = cli.threads.unwrap_or_else(|| num_cpus::get() as u32);
    match cli.engine {
        Engine::Kvs => run_with_pool(KvStore::open(dir)?, cli.pool, threads, cli.addr),
        Engine::Sled => run_with_pool(SledKvsEngine::open(dir)?, cli.pool, threads, cli.addr),
    }
}

fn run_with_pool(engine: impl KvsEngine, pool: Pool, threads: u32, addr: SocketAddr) -> Result<()> {
    let wire = WireConfig::default();
    match pool {
        Pool::SharedQueue => {
            KvsServer::new(engine, SharedQueueThreadPool::new(threads)?, wire).run(addr)
        }
        Pool::Rayon => KvsServer::new(engine, RayonThreadPool::new(threads)?, wire).run(addr),
    }
}

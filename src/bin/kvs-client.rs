use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::{Parser, Subcommand};
use kvs::{KvsClient, Result, WireConfig};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Get {
        key: String,
        #[arg(long, default_value_t = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 4000))]
        addr: SocketAddr,
    },
    Set {
        key: String,
        value: String,
        #[arg(long, default_value_t = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 4000))]
        addr: SocketAddr,
    },
    Rm {
        key: String,
        #[arg(long, default_value_t = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 4000))]
        addr: SocketAddr,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Get { key, addr } => {
            match KvsClient::connect(addr, WireConfig::default())?.get(key)? {
                Some(value) => println!("{value}"),
                None => println!("Key not found"),
            }
        }
        Commands::Set { key, value, addr } => {
            KvsClient::connect(addr, WireConfig::default())?.set(key, value)?
        }
        Commands::Rm { key, addr } => KvsClient::connect(addr, WireConfig::default())?.remove(key)?,
    };

    Ok(())
}

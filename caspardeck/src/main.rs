//! caspardeck: HyperDeck emulator for CasparCG.
//!
//! Accepts deck-protocol controllers (ATEM switchers, automation) over TCP
//! and plays the requested clips on a CasparCG server over AMCP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::info;

use caspar_client::{CasparClient, ConnectionConfig, Layer};

mod catalog;
mod config;
mod device;
mod logging;
mod server;

use catalog::{ClipCatalog, DEFAULT_REFRESH_INTERVAL};
use config::ConfigFile;
use server::{Dispatcher, Server, ServerConfig};

/// caspardeck - HyperDeck emulator for CasparCG
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on for controllers [default: 0.0.0.0:9993]
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// CasparCG host [default: 127.0.0.1]
    #[arg(long, env = "CASPAR_HOST")]
    caspar_host: Option<String>,

    /// CasparCG AMCP port [default: 5250]
    #[arg(long, env = "CASPAR_PORT")]
    caspar_port: Option<u16>,

    /// CasparCG channel to play on [default: 1]
    #[arg(long)]
    channel: Option<u32>,

    /// CasparCG layer to play on [default: 1]
    #[arg(long)]
    layer: Option<u32>,

    /// Configuration file path
    #[arg(short = 'f', long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory where log files are stored [default: logs]
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Number of days to keep log files [default: 7]
    #[arg(long)]
    log_retention_days: Option<u64>,
}

/// Effective settings after merging command line, file and defaults.
#[derive(Debug)]
struct Settings {
    listen: SocketAddr,
    connection: ConnectionConfig,
    refresh_interval: Duration,
    log_dir: PathBuf,
    log_retention_days: u64,
    log_level: Option<String>,
}

impl Settings {
    fn resolve(args: Args, file: ConfigFile) -> Result<Self, Box<dyn std::error::Error>> {
        let listen = match (args.listen, file.server.listen) {
            (Some(addr), _) => addr,
            (None, Some(addr)) => addr.parse()?,
            (None, None) => SocketAddr::from(([0, 0, 0, 0], hyperdeck_protocol::DEFAULT_PORT)),
        };

        let defaults = ConnectionConfig::default();
        let default_layer = Layer::new(
            args.channel
                .or(file.caspar.channel)
                .unwrap_or(defaults.default_layer.channel),
            args.layer
                .or(file.caspar.layer)
                .unwrap_or(defaults.default_layer.layer),
        );
        let connection = ConnectionConfig {
            host: args.caspar_host.or(file.caspar.host).unwrap_or(defaults.host),
            port: args.caspar_port.or(file.caspar.port).unwrap_or(defaults.port),
            default_layer,
            connect_timeout: file
                .caspar
                .connect_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
        };

        Ok(Self {
            listen,
            connection,
            refresh_interval: file
                .catalog
                .refresh_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REFRESH_INTERVAL),
            log_dir: args
                .log_dir
                .or(file.logging.log_dir.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("logs")),
            log_retention_days: args
                .log_retention_days
                .or(file.logging.retention_days)
                .unwrap_or(7),
            log_level: file.logging.level,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Explicit path > auto-detect > defaults
    let file_config = match config::locate(args.config.clone()) {
        Some(path) => match config::load_config(&path) {
            Ok(c) => {
                eprintln!("Loaded config from: {}", path.display());
                c
            }
            Err(e) => {
                eprintln!("{}", e);
                return Err(e.into());
            }
        },
        None => ConfigFile::default(),
    };

    let verbose = args.verbose;
    let settings = Settings::resolve(args, file_config)?;

    logging::init_logging(
        &settings.log_dir,
        settings.log_retention_days,
        verbose,
        settings.log_level.as_deref(),
    )?;

    info!("caspardeck starting...");
    info!("  Listen address: {}", settings.listen);
    info!("  CasparCG: {}", settings.connection.addr());
    info!("  Channel-layer: {}", settings.connection.default_layer);
    info!("  Clip refresh interval: {:?}", settings.refresh_interval);

    let client = Arc::new(CasparClient::new(settings.connection));
    let catalog = Arc::new(ClipCatalog::new(Arc::clone(&client), settings.refresh_interval));
    let dispatcher = Arc::new(Dispatcher::new(client, catalog));

    let server = Server::new(
        ServerConfig {
            listen_addr: settings.listen,
        },
        dispatcher,
    );
    server.run().await?;

    Ok(())
}

//! Codebreak terminal client.
//!
//! # Usage
//!
//! ```bash
//! # Codemaker: wait for a codebreaker on port 7070
//! codebreak host --bind 0.0.0.0:7070
//!
//! # Codebreaker: connect and start guessing
//! codebreak join 192.168.1.20:7070
//!
//! # Harder board (both sides must agree)
//! codebreak --colors 8 --holes 5 host
//! ```

use std::time::Duration;

use clap::{Parser, Subcommand};
use codebreak_app::{Runtime, RuntimeConfig, SystemEnv};
use codebreak_cli::{Console, TcpTransport};
use codebreak_core::{GameConfig, PeerId, SessionConfig};
use tokio::io::BufReader;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Two-player code-breaking over TCP
#[derive(Parser, Debug)]
#[command(name = "codebreak")]
#[command(about = "Two-player code-breaking game over a direct TCP connection")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    /// Colors in play (4-10)
    #[arg(long, global = true, default_value_t = 6)]
    colors: usize,

    /// Code length (4-6)
    #[arg(long, global = true, default_value_t = 4)]
    holes: usize,

    /// Attempts allowed (5-10)
    #[arg(long, global = true, default_value_t = 10)]
    attempts: usize,

    /// Seconds to wait for feedback before giving up on the peer
    #[arg(long, global = true, default_value_t = 30)]
    verify_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Wait for a codebreaker and play codemaker
    Host {
        /// Address to listen on
        #[arg(short, long, default_value = "0.0.0.0:7070")]
        bind: String,
    },
    /// Connect to a codemaker and play codebreaker
    Join {
        /// Codemaker address (host:port)
        peer: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    let game = GameConfig::new(args.colors, args.holes, args.attempts)?;
    let config = RuntimeConfig {
        session: SessionConfig { game, verify_timeout: Duration::from_secs(args.verify_timeout) },
        ..RuntimeConfig::default()
    };
    let env = SystemEnv::new();

    let (transport, local_id, peer) = match args.mode {
        Mode::Host { bind } => {
            let transport = TcpTransport::bind(&bind).await?;
            let local_id = transport
                .local_addr()
                .map_or_else(|| PeerId::new(bind.clone()), |addr| PeerId::new(addr.to_string()));
            (transport, local_id, None)
        },
        Mode::Join { peer } => {
            (TcpTransport::outbound_only(), PeerId::random(&env), Some(PeerId::new(peer)))
        },
    };

    tracing::info!(local = %local_id, "starting session");

    let (runtime, handle, notices) = Runtime::new(transport, env, local_id, config);
    let task = tokio::spawn(runtime.run());

    if let Some(peer) = peer {
        handle.connect(peer).await?;
    }

    let console = Console::new(handle, notices, BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    console.run().await?;

    task.await?;
    Ok(())
}

//! Resilient network audio-stream player.
//!
//! Resolves a server address to a transport (TCP or HTTP/HTTPS), opens a
//! byte stream, wraps it in the configured buffering/statistics
//! decorators, and plays it as raw s16le PCM via CPAL. A supervision loop
//! monitors playback liveness and reconnects with capped linear backoff
//! whenever the connection or the stream dies.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pcm_player::sink::CpalSink;
use stream_player::supervisor::Supervisor;
use stream_player::transport::TransportRegistry;
use stream_player::{address, cli, prompt};

fn main() -> Result<()> {
    let args = cli::Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,stream_player=info")),
        )
        .init();

    let _ = ctrlc::set_handler(|| std::process::exit(130));

    let config = args.client_config();
    config.validate()?;

    let server_addr = match args.address.clone() {
        Some(addr) => {
            address::validate(&addr)
                .map_err(|reason| anyhow::anyhow!("invalid address {addr:?}: {reason}"))?;
            addr
        }
        None => {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut out = std::io::stdout();
            match prompt::read_address(&mut input, &mut out)? {
                Some(addr) => addr,
                None => {
                    tracing::info!("no address provided, exiting");
                    return Ok(());
                }
            }
        }
    };

    let sink = CpalSink::new(args.sink_config());
    tracing::info!("press Ctrl+C to stop");
    let mut supervisor = Supervisor::new(server_addr, config, TransportRegistry::default(), sink);
    supervisor.run()
}

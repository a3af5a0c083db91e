use clap::Parser;

use crate::config::Config;
use pcm_player::config::SinkConfig;

#[derive(Parser, Debug)]
#[command(
    name = "stream-player",
    version,
    about = "Resilient network audio-stream player"
)]
pub struct Args {
    /// Server address: HOST:PORT, tcp://HOST:PORT, or http(s)://HOST/PATH.
    /// Prompted interactively when omitted.
    pub address: Option<String>,

    /// Playback sample rate in Hz
    #[arg(long, default_value_t = 48_000)]
    pub sample_rate: u32,

    /// Playback channel count
    #[arg(long, default_value_t = 2)]
    pub channels: u16,

    /// Buffered reader capacity in bytes
    #[arg(long, default_value_t = 10 * 1024)]
    pub buffer_size: usize,

    /// Disable the buffering decorator
    #[arg(long)]
    pub no_buffering: bool,

    /// Enable the statistics decorator
    #[arg(long)]
    pub stats: bool,

    /// Use a specific output device by substring match
    #[arg(long)]
    pub device: Option<String>,
}

impl Args {
    pub fn client_config(&self) -> Config {
        Config {
            sample_rate: self.sample_rate,
            channels: self.channels,
            buffer_size: self.buffer_size,
            enable_buffering: !self.no_buffering,
            enable_stats: self.stats,
        }
    }

    pub fn sink_config(&self) -> SinkConfig {
        SinkConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            device: self.device.clone(),
            ..SinkConfig::default()
        }
    }
}

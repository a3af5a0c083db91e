use anyhow::{Result, bail};

/// Client configuration, fixed at construction.
#[derive(Clone, Debug)]
pub struct Config {
    /// Stream sample rate in Hz, passed through to the sink.
    pub sample_rate: u32,
    /// Interleaved channel count, passed through to the sink.
    pub channels: u16,
    /// BufferedReader capacity in bytes.
    pub buffer_size: usize,
    /// Wrap the transport stream in a BufferedReader.
    pub enable_buffering: bool,
    /// Wrap the (possibly buffered) stream in a StatsReader.
    pub enable_stats: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            buffer_size: 10 * 1024,
            enable_buffering: true,
            enable_stats: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.enable_buffering && self.buffer_size == 0 {
            bail!("buffer size must be positive when buffering is enabled");
        }
        Ok(())
    }
}

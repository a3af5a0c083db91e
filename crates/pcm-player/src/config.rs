/// Output format parameters for the PCM sink.
#[derive(Clone, Debug)]
pub struct SinkConfig {
    /// Stream sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Optional output device substring match (case-insensitive).
    pub device: Option<String>,
    /// Depth of the bounded chunk queue between the feeder thread and the
    /// output callback. Each chunk holds one stream read's worth of samples.
    pub queue_chunks: usize,
}

impl Default for SinkConfig {
    /// Defaults matching a stereo 48 kHz s16le stream.
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            device: None,
            queue_chunks: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_stereo_48k() {
        let cfg = SinkConfig::default();
        assert_eq!(cfg.sample_rate, 48_000);
        assert_eq!(cfg.channels, 2);
        assert!(cfg.device.is_none());
        assert!(cfg.queue_chunks > 0);
    }
}

//! Stream decorators and the chain builder.
//!
//! Decorators implement the same [`ByteStream`] contract as the raw
//! transport stream and each own exactly one upstream, so they compose by
//! construction order: buffering sits closest to the transport, then
//! statistics.

mod buffered;
mod stats;

pub use buffered::BufferedReader;
pub use stats::{StatsReader, StreamStats};

use pcm_player::stream::ByteStream;

use crate::config::Config;

/// Composes the configured decorators around a raw transport stream.
pub struct ReaderChain;

impl ReaderChain {
    /// Wrap `raw` per `config`, returning the final stream and a
    /// human-readable chain description (used for logging only).
    pub fn build(raw: Box<dyn ByteStream>, config: &Config) -> (Box<dyn ByteStream>, String) {
        let mut stream = raw;
        let mut parts: Vec<String> = Vec::new();

        if config.enable_buffering {
            parts.push(format!("Buffered({}KB)", config.buffer_size / 1024));
            stream = Box::new(BufferedReader::new(stream, config.buffer_size));
        }
        if config.enable_stats {
            parts.push("Stats".to_string());
            stream = Box::new(StatsReader::new(stream));
        }
        if parts.is_empty() {
            parts.push("PassThrough".to_string());
        }

        (stream, parts.join(" -> "))
    }
}

/// Format a byte count with 1024-based units for human-readable totals.
pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0usize;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    const SUFFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];
    format!("{:.1} {}B", bytes as f64 / div as f64, SUFFIXES[exp])
}

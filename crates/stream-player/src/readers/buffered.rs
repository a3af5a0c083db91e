//! Buffering decorator.

use std::io::{self, Read};
use std::time::{Duration, Instant};

use pcm_player::stream::ByteStream;

use super::format_bytes;

/// Emit a buffer status line at least this often.
const LOG_INTERVAL: Duration = Duration::from_secs(3);
/// Also emit one every this many reads.
const LOG_EVERY_READS: u64 = 100;

/// Serves reads from a fixed-capacity buffer, refilling with exactly one
/// upstream read when fully drained.
///
/// This bounds upstream call frequency, not per-call latency: a refill
/// that comes back short is not topped up, and the next call serves
/// whatever was filled. Upstream errors are surfaced as-is, never retried
/// here.
pub struct BufferedReader {
    upstream: Box<dyn ByteStream>,
    buffer: Vec<u8>,
    pos: usize,
    end: usize,
    created: Instant,
    last_log: Instant,
    read_count: u64,
    total_filled: u64,
    total_served: u64,
}

impl BufferedReader {
    pub fn new(upstream: Box<dyn ByteStream>, capacity: usize) -> Self {
        tracing::info!(capacity_kb = capacity / 1024, "buffered reader created");
        let now = Instant::now();
        Self {
            upstream,
            buffer: vec![0u8; capacity],
            pos: 0,
            end: 0,
            created: now,
            last_log: now,
            read_count: 0,
            total_filled: 0,
            total_served: 0,
        }
    }

    /// Share of upstream bytes actually delivered to the caller, in percent.
    fn efficiency(&self) -> f64 {
        if self.total_filled == 0 {
            0.0
        } else {
            self.total_served as f64 / self.total_filled as f64 * 100.0
        }
    }

    fn log_status(&mut self, action: &'static str, bytes: usize, available: usize) {
        let now = Instant::now();
        if self.read_count % LOG_EVERY_READS != 0 && now.duration_since(self.last_log) <= LOG_INTERVAL
        {
            return;
        }
        let usage = if self.buffer.is_empty() {
            0.0
        } else {
            let reference = if action == "filled" { bytes } else { available };
            reference as f64 / self.buffer.len() as f64 * 100.0
        };
        tracing::debug!(
            action,
            bytes,
            buffer_used_pct = format_args!("{usage:.1}"),
            efficiency_pct = format_args!("{:.1}", self.efficiency()),
            reads = self.read_count,
            "buffer status"
        );
        self.last_log = now;
    }
}

impl Read for BufferedReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        self.read_count += 1;

        // Unread bytes remain: serve them without touching upstream.
        if self.pos < self.end {
            let available = self.end - self.pos;
            let n = available.min(out.len());
            out[..n].copy_from_slice(&self.buffer[self.pos..self.pos + n]);
            self.pos += n;
            self.total_served += n as u64;
            self.log_status("serving", n, available);
            return Ok(n);
        }

        // Fully drained: one upstream read into the whole buffer.
        let filled = self.upstream.read(&mut self.buffer).inspect_err(|e| {
            tracing::warn!("buffered reader upstream error: {e}");
        })?;
        self.pos = 0;
        self.end = filled;
        self.total_filled += filled as u64;

        let n = filled.min(out.len());
        out[..n].copy_from_slice(&self.buffer[..n]);
        self.pos = n;
        self.total_served += n as u64;
        self.log_status("filled", filled, filled);
        Ok(n)
    }
}

impl ByteStream for BufferedReader {
    fn close(&mut self) -> io::Result<()> {
        tracing::info!(
            elapsed_s = self.created.elapsed().as_secs(),
            filled = %format_bytes(self.total_filled),
            served = %format_bytes(self.total_served),
            efficiency_pct = format_args!("{:.1}", self.efficiency()),
            reads = self.read_count,
            "buffered reader closed"
        );
        self.upstream.close()
    }
}

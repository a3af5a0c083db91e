//! Statistics decorator.

use std::io::{self, Read};
use std::time::{Duration, Instant};

use pcm_player::stream::ByteStream;

use super::format_bytes;

/// Minimum gap between periodic snapshot emissions.
const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(5);

/// Counters maintained by [`StatsReader`].
///
/// All counters are monotonically non-decreasing except
/// `current_bitrate_kbps`, which is recomputed on every read. Bitrates
/// use decimal kilo (1000-based); human-readable byte totals use
/// 1024-based units when logged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StreamStats {
    pub bytes_transferred: u64,
    pub read_operations: u64,
    pub error_count: u64,
    pub current_bitrate_kbps: f64,
    pub average_bitrate_kbps: f64,
}

/// Passes every read through unmodified, instrumenting byte, operation,
/// and error counters plus per-call and cumulative bitrates.
pub struct StatsReader {
    upstream: Box<dyn ByteStream>,
    stats: StreamStats,
    started: Instant,
    last_snapshot: Instant,
}

impl StatsReader {
    pub fn new(upstream: Box<dyn ByteStream>) -> Self {
        let now = Instant::now();
        Self {
            upstream,
            stats: StreamStats::default(),
            started: now,
            last_snapshot: now,
        }
    }

    /// Current counter values.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    fn log_snapshot(&self) {
        tracing::info!(
            reads = self.stats.read_operations,
            transferred = %format_bytes(self.stats.bytes_transferred),
            errors = self.stats.error_count,
            avg_kbps = format_args!("{:.1}", self.stats.average_bitrate_kbps),
            "stream stats"
        );
    }
}

impl Read for StatsReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let call_start = Instant::now();
        let result = self.upstream.read(out);

        let n = *result.as_ref().unwrap_or(&0);
        self.stats.bytes_transferred += n as u64;
        self.stats.read_operations += 1;
        if result.is_err() {
            self.stats.error_count += 1;
        }

        let call = call_start.elapsed();
        if !call.is_zero() {
            self.stats.current_bitrate_kbps = (n as f64 * 8.0) / call.as_secs_f64() / 1000.0;
        }
        let total = self.started.elapsed();
        if !total.is_zero() {
            self.stats.average_bitrate_kbps =
                (self.stats.bytes_transferred as f64 * 8.0) / total.as_secs_f64() / 1000.0;
        }

        if self.last_snapshot.elapsed() > SNAPSHOT_INTERVAL {
            self.log_snapshot();
            self.last_snapshot = Instant::now();
        }

        result
    }
}

impl ByteStream for StatsReader {
    fn close(&mut self) -> io::Result<()> {
        // Final snapshot before the counters go away.
        self.log_snapshot();
        self.upstream.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::testing::{ScriptedStream, Step};
    use std::sync::atomic::Ordering;

    #[test]
    fn passes_bytes_through_unmodified() {
        let (raw, _) = ScriptedStream::from_chunks(vec![b"abcd".to_vec(), b"ef".to_vec()]);
        let mut reader = StatsReader::new(Box::new(raw));

        let mut out = [0u8; 8];
        assert_eq!(reader.read(&mut out).expect("read"), 4);
        assert_eq!(&out[..4], b"abcd");
        assert_eq!(reader.read(&mut out).expect("read"), 2);
        assert_eq!(&out[..2], b"ef");
    }

    #[test]
    fn counts_reads_bytes_and_errors() {
        let (raw, _) = ScriptedStream::new(vec![
            Step::Data(b"abc".to_vec()),
            Step::Fail(io::ErrorKind::ConnectionReset),
            Step::Data(b"de".to_vec()),
        ]);
        let mut reader = StatsReader::new(Box::new(raw));

        let mut out = [0u8; 8];
        assert_eq!(reader.read(&mut out).expect("data"), 3);
        assert!(reader.read(&mut out).is_err());
        assert_eq!(reader.read(&mut out).expect("data"), 2);
        // EOF still counts as a read operation.
        assert_eq!(reader.read(&mut out).expect("eof"), 0);

        let stats = reader.stats();
        assert_eq!(stats.bytes_transferred, 5);
        assert_eq!(stats.read_operations, 4);
        assert_eq!(stats.error_count, 1);
    }

    #[test]
    fn average_bitrate_tracks_total_bytes_over_elapsed_time() {
        let (raw, _) = ScriptedStream::from_chunks(vec![vec![0u8; 1000]]);
        let mut reader = StatsReader::new(Box::new(raw));

        let mut out = [0u8; 1000];
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(reader.read(&mut out).expect("read"), 1000);

        // 8000 bits over >=20 ms is at most 400 kbps and positive.
        let avg = reader.stats().average_bitrate_kbps;
        assert!(avg > 0.0);
        assert!(avg <= 8000.0 / 20.0, "avg {avg}");
    }

    #[test]
    fn close_emits_final_snapshot_and_propagates() {
        let (raw, closed) = ScriptedStream::from_chunks(vec![]);
        let mut reader = StatsReader::new(Box::new(raw));
        reader.close().expect("close");
        assert!(closed.load(Ordering::Relaxed));
    }
}

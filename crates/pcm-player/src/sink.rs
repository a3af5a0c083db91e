//! Raw PCM playback sink.
//!
//! One playback session at a time: a feeder thread pulls s16le bytes from
//! the stream into a bounded chunk queue, and the CPAL output callback
//! drains the queue, converting samples to the device format. Underruns
//! are filled with silence.
//!
//! The liveness flag goes false when the feeder hits a read error, or when
//! it hits end-of-stream and the queued samples drain.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use cpal::traits::{DeviceTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::config::SinkConfig;
use crate::device;
use crate::stream::ByteStream;

/// Grace period between pausing the output stream and joining the feeder.
const STOP_GRACE: Duration = Duration::from_millis(50);
/// Bytes pulled from the stream per feeder read.
const FEED_READ_BYTES: usize = 4096;
/// How long one blocked queue send waits before re-checking the cancel flag.
const SEND_TICK: Duration = Duration::from_millis(100);

/// Playback sink contract: start consuming a stream, report liveness, stop.
pub trait PlaybackSink {
    /// Begin playback of `stream`, replacing any previous session.
    fn play(&mut self, stream: Box<dyn ByteStream>) -> Result<()>;
    /// Whether the sink is still actively consuming the stream.
    fn is_playing(&self) -> bool;
    /// Stop playback and release the session's resources.
    fn stop(&mut self);
}

/// CPAL-backed sink playing interleaved s16le PCM.
pub struct CpalSink {
    config: SinkConfig,
    session: Option<Session>,
}

struct Session {
    stream: cpal::Stream,
    playing: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
    feeder: Option<JoinHandle<()>>,
}

impl CpalSink {
    pub fn new(config: SinkConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }
}

impl PlaybackSink for CpalSink {
    fn play(&mut self, stream: Box<dyn ByteStream>) -> Result<()> {
        self.stop();

        let host = cpal::default_host();
        let device = device::pick_device(&host, self.config.device.as_deref())?;
        let supported = device::pick_output_config(
            &device,
            self.config.sample_rate,
            self.config.channels,
        )?;
        let sample_format = supported.sample_format();
        let stream_config: cpal::StreamConfig = supported.into();
        tracing::info!(
            device = %device.description()?,
            rate_hz = stream_config.sample_rate,
            channels = stream_config.channels,
            format = ?sample_format,
            "output device"
        );

        let playing = Arc::new(AtomicBool::new(true));
        let cancel = Arc::new(AtomicBool::new(false));
        let done = Arc::new(AtomicBool::new(false));
        let (tx, rx) = crossbeam_channel::bounded::<Vec<i16>>(self.config.queue_chunks.max(1));

        let feeder = {
            let cancel = cancel.clone();
            let playing = playing.clone();
            let done = done.clone();
            std::thread::spawn(move || feed_stream(stream, tx, cancel, playing, done))
        };

        let out = build_output_stream(
            &device,
            &stream_config,
            sample_format,
            rx,
            playing.clone(),
            done,
        )?;
        out.play().context("start output stream")?;

        self.session = Some(Session {
            stream: out,
            playing,
            cancel,
            feeder: Some(feeder),
        });
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.playing.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    fn stop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        session.cancel.store(true, Ordering::Relaxed);
        if let Err(e) = session.stream.pause() {
            tracing::warn!("pause failed during stop: {e}");
        }
        std::thread::sleep(STOP_GRACE);
        if let Some(join) = session.feeder.take() {
            let _ = join.join();
        }
        session.playing.store(false, Ordering::Relaxed);
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Feeder loop: read bytes, decode to samples, push to the queue.
///
/// Exits on cancel, end-of-stream, or a read error; the stream is closed
/// on the way out and `done` is raised before the sender drops.
fn feed_stream(
    mut stream: Box<dyn ByteStream>,
    tx: Sender<Vec<i16>>,
    cancel: Arc<AtomicBool>,
    playing: Arc<AtomicBool>,
    done: Arc<AtomicBool>,
) {
    let mut buf = [0u8; FEED_READ_BYTES];
    let mut carry: Option<u8> = None;

    'feed: loop {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        match stream.read(&mut buf) {
            Ok(0) => {
                tracing::info!("stream ended");
                break;
            }
            Ok(n) => {
                let samples = decode_s16le(&mut carry, &buf[..n]);
                if samples.is_empty() {
                    continue;
                }
                let mut pending = samples;
                loop {
                    match tx.send_timeout(pending, SEND_TICK) {
                        Ok(()) => break,
                        Err(crossbeam_channel::SendTimeoutError::Timeout(v)) => {
                            if cancel.load(Ordering::Relaxed) {
                                break 'feed;
                            }
                            pending = v;
                        }
                        Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => break 'feed,
                    }
                }
            }
            Err(e) => {
                tracing::warn!("stream read failed: {e}");
                playing.store(false, Ordering::Relaxed);
                break;
            }
        }
    }

    done.store(true, Ordering::Relaxed);
    if let Err(e) = stream.close() {
        tracing::warn!("stream close failed: {e}");
    }
}

/// Decode little-endian signed 16-bit samples, carrying an odd trailing
/// byte over to the next call.
fn decode_s16le(carry: &mut Option<u8>, bytes: &[u8]) -> Vec<i16> {
    let mut samples = Vec::with_capacity(bytes.len() / 2 + 1);
    let mut iter = bytes.iter().copied();

    if let Some(lo) = carry.take() {
        match iter.next() {
            Some(hi) => samples.push(i16::from_le_bytes([lo, hi])),
            None => {
                *carry = Some(lo);
                return samples;
            }
        }
    }

    loop {
        let Some(lo) = iter.next() else { break };
        match iter.next() {
            Some(hi) => samples.push(i16::from_le_bytes([lo, hi])),
            None => {
                *carry = Some(lo);
                break;
            }
        }
    }
    samples
}

/// Build the CPAL output stream for whatever sample format the device wants.
fn build_output_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    rx: Receiver<Vec<i16>>,
    playing: Arc<AtomicBool>,
    done: Arc<AtomicBool>,
) -> Result<cpal::Stream> {
    match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(device, config, rx, playing, done),
        cpal::SampleFormat::I16 => build_stream::<i16>(device, config, rx, playing, done),
        cpal::SampleFormat::I32 => build_stream::<i32>(device, config, rx, playing, done),
        cpal::SampleFormat::U16 => build_stream::<u16>(device, config, rx, playing, done),
        other => Err(anyhow!("Unsupported sample format: {other:?}")),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<Vec<i16>>,
    playing: Arc<AtomicBool>,
    done: Arc<AtomicBool>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<i16>,
{
    let err_fn = |err| tracing::warn!("output stream error: {err}");

    let mut pending: Vec<i16> = Vec::new();
    let mut pos = 0usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _| {
            let mut i = 0usize;
            while i < data.len() {
                if pos >= pending.len() {
                    match rx.try_recv() {
                        Ok(chunk) => {
                            pending = chunk;
                            pos = 0;
                        }
                        Err(TryRecvError::Empty) => {
                            if done.load(Ordering::Relaxed) {
                                playing.store(false, Ordering::Relaxed);
                            }
                            fill_silence(&mut data[i..]);
                            return;
                        }
                        Err(TryRecvError::Disconnected) => {
                            playing.store(false, Ordering::Relaxed);
                            fill_silence(&mut data[i..]);
                            return;
                        }
                    }
                }
                data[i] = T::from_sample(pending[pos]);
                i += 1;
                pos += 1;
            }
        },
        err_fn,
        None,
    )?;
    Ok(stream)
}

fn fill_silence<T: cpal::SizedSample + cpal::FromSample<i16>>(data: &mut [T]) {
    for slot in data.iter_mut() {
        *slot = T::from_sample(0i16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_pairs_bytes_little_endian() {
        let mut carry = None;
        let samples = decode_s16le(&mut carry, &[0x01, 0x00, 0x00, 0x80]);
        assert_eq!(samples, vec![1, i16::MIN]);
        assert!(carry.is_none());
    }

    #[test]
    fn decode_carries_odd_trailing_byte() {
        let mut carry = None;
        let samples = decode_s16le(&mut carry, &[0x34, 0x12, 0xAB]);
        assert_eq!(samples, vec![0x1234]);
        assert_eq!(carry, Some(0xAB));

        let samples = decode_s16le(&mut carry, &[0xCD]);
        assert_eq!(samples, vec![i16::from_le_bytes([0xAB, 0xCD])]);
        assert!(carry.is_none());
    }

    #[test]
    fn decode_keeps_carry_when_input_empty() {
        let mut carry = Some(0x7F);
        let samples = decode_s16le(&mut carry, &[]);
        assert!(samples.is_empty());
        assert_eq!(carry, Some(0x7F));
    }

    #[test]
    fn feeder_closes_stream_and_raises_done() {
        struct Counted {
            data: std::io::Cursor<Vec<u8>>,
            closed: Arc<AtomicBool>,
        }
        impl std::io::Read for Counted {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                self.data.read(buf)
            }
        }
        impl ByteStream for Counted {
            fn close(&mut self) -> std::io::Result<()> {
                self.closed.store(true, Ordering::Relaxed);
                Ok(())
            }
        }

        let closed = Arc::new(AtomicBool::new(false));
        let stream = Box::new(Counted {
            data: std::io::Cursor::new(vec![0u8; 8]),
            closed: closed.clone(),
        });
        let (tx, rx) = crossbeam_channel::bounded(8);
        let playing = Arc::new(AtomicBool::new(true));
        let done = Arc::new(AtomicBool::new(false));

        feed_stream(
            stream,
            tx,
            Arc::new(AtomicBool::new(false)),
            playing.clone(),
            done.clone(),
        );

        assert!(done.load(Ordering::Relaxed));
        assert!(closed.load(Ordering::Relaxed));
        // EOF alone does not clear the liveness flag; the callback does
        // that once the queue drains.
        assert!(playing.load(Ordering::Relaxed));
        let total: usize = rx.try_iter().map(|c| c.len()).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn feeder_clears_liveness_on_read_error() {
        struct Failing;
        impl std::io::Read for Failing {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "reset",
                ))
            }
        }
        impl ByteStream for Failing {
            fn close(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let (tx, _rx) = crossbeam_channel::bounded(8);
        let playing = Arc::new(AtomicBool::new(true));
        let done = Arc::new(AtomicBool::new(false));

        feed_stream(
            Box::new(Failing),
            tx,
            Arc::new(AtomicBool::new(false)),
            playing.clone(),
            done.clone(),
        );

        assert!(!playing.load(Ordering::Relaxed));
        assert!(done.load(Ordering::Relaxed));
    }
}

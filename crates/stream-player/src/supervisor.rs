//! Connection supervision: connect, play, monitor, reconnect.
//!
//! One cycle: select a transport, connect, build the reader chain, hand
//! the stream to the sink, then poll the sink's liveness until it drops.
//! Connect failures back off linearly (3 s per attempt, capped at 60 s)
//! and are retried forever; a lost stream tears down and reconnects after
//! a short grace delay with the attempt counter already reset. No failure
//! is fatal to the process.

use std::time::Duration;

use anyhow::{Context, Result};
use pcm_player::sink::PlaybackSink;

use crate::config::Config;
use crate::readers::ReaderChain;
use crate::transport::TransportRegistry;

/// Timing knobs for the supervision loop. Tests shrink these.
#[derive(Clone, Debug)]
pub struct SupervisorTiming {
    /// Linear backoff step per failed connect attempt.
    pub backoff_step: Duration,
    /// Backoff ceiling.
    pub max_backoff: Duration,
    /// Liveness poll interval while playing.
    pub poll_interval: Duration,
    /// Delay between teardown of a lost stream and the next connect.
    pub reconnect_grace: Duration,
}

impl Default for SupervisorTiming {
    fn default() -> Self {
        Self {
            backoff_step: Duration::from_secs(3),
            max_backoff: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
            reconnect_grace: Duration::from_secs(2),
        }
    }
}

/// Delay before reconnect attempt `attempt` (1-based): capped linear.
pub fn backoff_delay(attempt: u32, timing: &SupervisorTiming) -> Duration {
    timing
        .backoff_step
        .saturating_mul(attempt)
        .min(timing.max_backoff)
}

/// Outcome of one supervision cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Connect failed; backoff was applied.
    ConnectFailed,
    /// Playback started and later stopped (stream death or end).
    StreamEnded,
}

/// Owns the reconnect loop and, for the duration of each cycle, the
/// stream and sink session it created.
pub struct Supervisor<S: PlaybackSink> {
    address: String,
    config: Config,
    registry: TransportRegistry,
    sink: S,
    timing: SupervisorTiming,
    attempts: u32,
}

impl<S: PlaybackSink> Supervisor<S> {
    pub fn new(address: String, config: Config, registry: TransportRegistry, sink: S) -> Self {
        Self {
            address,
            config,
            registry,
            sink,
            timing: SupervisorTiming::default(),
            attempts: 0,
        }
    }

    pub fn with_timing(mut self, timing: SupervisorTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Run forever. The only exit is process termination.
    pub fn run(&mut self) -> ! {
        tracing::info!(address = %self.address, "starting playback");
        loop {
            self.run_cycle();
        }
    }

    /// Run a bounded number of cycles, reporting each outcome.
    pub fn run_cycles(&mut self, cycles: usize) -> Vec<CycleOutcome> {
        (0..cycles).map(|_| self.run_cycle()).collect()
    }

    fn run_cycle(&mut self) -> CycleOutcome {
        tracing::info!(address = %self.address, "connecting");
        if let Err(e) = self.connect_and_play() {
            self.attempts += 1;
            let delay = backoff_delay(self.attempts, &self.timing);
            tracing::warn!(
                attempt = self.attempts,
                retry_in_s = delay.as_secs_f64(),
                "connection failed: {e:#}"
            );
            std::thread::sleep(delay);
            return CycleOutcome::ConnectFailed;
        }

        tracing::info!("connected");
        self.attempts = 0;

        self.monitor();

        // Teardown must fully complete before the next connect attempt so
        // two sinks or streams never overlap.
        self.sink.stop();
        tracing::info!("connection lost, reconnecting");
        std::thread::sleep(self.timing.reconnect_grace);
        CycleOutcome::StreamEnded
    }

    fn connect_and_play(&mut self) -> Result<()> {
        let (raw, transport_name) = {
            let transport = self.registry.select(&self.address);
            let raw = transport
                .connect(&self.address)
                .with_context(|| format!("connect via {}", transport.name()))?;
            (raw, transport.name())
        };

        let (stream, chain) = ReaderChain::build(raw, &self.config);
        tracing::info!(
            transport = transport_name,
            chain = %chain,
            "starting playback session"
        );
        self.sink.play(stream).context("start playback")
    }

    /// Poll the sink's liveness flag; returns once it observes false.
    fn monitor(&self) {
        loop {
            std::thread::sleep(self.timing.poll_interval);
            if !self.sink.is_playing() {
                tracing::info!("playback stopped");
                return;
            }
        }
    }
}

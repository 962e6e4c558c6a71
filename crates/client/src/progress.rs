//! Simulated progress for a blocking agent call.
//!
//! The gateway reports no intermediate progress, so while a call is in flight
//! the simulator advances a capped percentage on a timer. The real call is the
//! only thing that moves it to 100%.
//!
//! ```text
//! Idle ──begin──▶ Running ──complete──▶ Completing ──reset──▶ Idle
//!                    │
//!                    └──cancel──▶ Idle
//! ```

use std::future::Future;
use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, Result};

/// Labels shown while running, picked by how far progress is towards the cap.
pub const PHASE_LABELS: [&str; 5] = [
    "Initializing agent",
    "Analyzing request",
    "Generating content",
    "Refining output",
    "Finalizing",
];

pub const COMPLETE_LABEL: &str = "Complete";
pub const IDLE_LABEL: &str = "Ready";

/// Lifecycle state of the simulated progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    /// No call in flight.
    Idle,
    /// Call in flight; percent advances on each tick up to the cap.
    Running,
    /// Call resolved; percent is 100.
    Completing,
}

/// What a renderer shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Current lifecycle state.
    pub phase: ProgressPhase,

    /// Percentage in `0..=100`.
    pub percent: u8,

    /// Status text for the current percentage.
    pub label: &'static str,
}

impl ProgressSnapshot {
    fn idle() -> Self {
        Self {
            phase: ProgressPhase::Idle,
            percent: 0,
            label: IDLE_LABEL,
        }
    }
}

/// Timing and increments of the progress simulation.
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Interval between increments.
    pub tick: Duration,
    /// Highest percentage shown before the call resolves.
    pub cap: u8,
    /// Smallest increment per tick.
    pub min_step: u8,

    /// Largest increment per tick; raised to `min_step` if lower.
    pub max_step: u8,
    /// Fixed seed for reproducible increments.
    pub seed: Option<u64>,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(800),
            cap: 90,
            min_step: 2,
            max_step: 8,
            seed: None,
        }
    }
}

/// Drives a [`ProgressSnapshot`] through [`ProgressPhase`] and publishes it on
/// a watch channel.
pub struct ProgressSimulator {
    config: ProgressConfig,
    rng: StdRng,
    tx: watch::Sender<ProgressSnapshot>,
}

impl ProgressSimulator {
    pub fn new(mut config: ProgressConfig) -> Self {
        config.cap = config.cap.min(99);
        config.max_step = config.max_step.max(config.min_step);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (tx, _) = watch::channel(ProgressSnapshot::idle());
        Self { config, rng, tx }
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        *self.tx.borrow()
    }

    pub fn phase(&self) -> ProgressPhase {
        self.snapshot().phase
    }

    /// Enter `Running` at 0%.
    pub fn begin(&mut self) {
        self.publish(ProgressPhase::Running, 0, PHASE_LABELS[0]);
    }

    /// Apply one timer tick. No effect outside `Running`.
    pub fn advance(&mut self) {
        let current = self.snapshot();
        if current.phase != ProgressPhase::Running {
            return;
        }

        let step = self.rng.gen_range(self.config.min_step..=self.config.max_step);
        let percent = current.percent.saturating_add(step).min(self.config.cap);
        self.publish(ProgressPhase::Running, percent, self.label_for(percent));
    }

    /// The real call resolved: 100% and the terminal label.
    pub fn complete(&mut self) {
        self.publish(ProgressPhase::Completing, 100, COMPLETE_LABEL);
    }

    pub fn reset(&mut self) {
        self.tx.send_replace(ProgressSnapshot::idle());
    }

    /// Drive `call` to completion while ticking the simulated progress.
    ///
    /// The timer lives only inside this future, so it stops exactly once:
    /// when `call` resolves (progress moves to `Completing`) or when `cancel`
    /// fires (progress returns to `Idle` and `call` is dropped).
    pub async fn run<F>(&mut self, call: F, cancel: &CancellationToken) -> Result<F::Output>
    where
        F: Future,
    {
        self.begin();

        let mut ticker = tokio::time::interval_at(Instant::now() + self.config.tick, self.config.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(call);

        let output = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Execution cancelled; progress reset");
                    self.reset();
                    return Err(ClientError::Cancelled);
                }
                output = &mut call => break output,
                _ = ticker.tick() => self.advance(),
            }
        };

        self.complete();
        Ok(output)
    }

    fn label_for(&self, percent: u8) -> &'static str {
        let slot = percent as usize * PHASE_LABELS.len() / (self.config.cap as usize + 1);
        PHASE_LABELS[slot.min(PHASE_LABELS.len() - 1)]
    }

    fn publish(&self, phase: ProgressPhase, percent: u8, label: &'static str) {
        self.tx.send_replace(ProgressSnapshot {
            phase,
            percent,
            label,
        });
    }
}

impl Default for ProgressSimulator {
    fn default() -> Self {
        Self::new(ProgressConfig::default())
    }
}

//! Background loop feeding device lines into the state store.

use crate::error::Result;
use crate::telemetry::parser::parse_line;
use crate::telemetry::store::StateStore;
use crate::telemetry::traits::DeviceLink;
use std::thread;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Longest pause between attempts while the device keeps failing.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Timing knobs for the reader loop.
#[derive(Debug, Clone, Copy)]
pub struct ReaderConfig {
    /// Upper bound on a single line read
    pub read_timeout: Duration,
    /// Pause when the device has nothing to say
    pub poll_interval: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(crate::DEFAULT_READ_TIMEOUT_MS),
            poll_interval: Duration::from_millis(crate::DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

/// What a single iteration of the loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A non-empty update was merged into the store
    Merged,
    /// A line arrived but carried no recognized fields
    Ignored,
    /// No complete line was available this cycle
    Idle,
    /// A read or decode error was logged and skipped
    Failed,
}

/// Sole writer of the [`StateStore`].
pub struct ReaderLoop<D> {
    device: D,
    store: StateStore,
    config: ReaderConfig,
    consecutive_failures: u32,
}

impl<D: DeviceLink> ReaderLoop<D> {
    /// Create a reader loop over `device` writing into `store`.
    pub fn new(device: D, store: StateStore, config: ReaderConfig) -> Self {
        Self {
            device,
            store,
            config,
            consecutive_failures: 0,
        }
    }

    /// Failed iterations since the last successful one.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Run one iteration: read at most one line and merge it.
    ///
    /// Errors are logged and reported as [`StepOutcome::Failed`]; they never
    /// escape the loop. Only the first error of a failing streak is logged
    /// above `debug`.
    pub fn step(&mut self) -> StepOutcome {
        match self.try_step() {
            Ok(outcome) => {
                if self.consecutive_failures > 0 {
                    info!(
                        "Device {} recovered after {} failed reads",
                        self.device.address(),
                        self.consecutive_failures
                    );
                    self.consecutive_failures = 0;
                }
                outcome
            }
            Err(e) => {
                let address = self.device.address();
                if !e.is_recoverable() {
                    error!("Device error on {}: {}", address, e);
                } else if self.consecutive_failures == 0 {
                    warn!("Device read error on {}: {}", address, e);
                } else {
                    debug!(
                        "Device read error on {} ({} in a row): {}",
                        address,
                        self.consecutive_failures + 1,
                        e
                    );
                }
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                StepOutcome::Failed
            }
        }
    }

    /// Pause before the next attempt: `poll_interval`, doubled for each
    /// repeated failure up to [`MAX_RETRY_DELAY`].
    fn retry_delay(&self) -> Duration {
        let doublings = self.consecutive_failures.saturating_sub(1).min(16);
        let delay = self.config.poll_interval.saturating_mul(1 << doublings);
        delay.min(MAX_RETRY_DELAY.max(self.config.poll_interval))
    }

    fn try_step(&mut self) -> Result<StepOutcome> {
        if !self.device.has_data_available()? {
            return Ok(StepOutcome::Idle);
        }

        let Some(line) = self.device.read_line(self.config.read_timeout)? else {
            return Ok(StepOutcome::Idle);
        };
        debug!("Received: {}", line);

        let update = parse_line(&line);
        if !self.store.merge(&update) {
            return Ok(StepOutcome::Ignored);
        }

        info!("Updated reading: {:?}", self.store.snapshot());
        Ok(StepOutcome::Merged)
    }

    /// Loop until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// Blocks the calling thread; see [`ReaderLoop::spawn`].
    pub fn run(mut self, shutdown: watch::Receiver<bool>) {
        info!("Reader loop started on {}", self.device.address());

        while !shutdown_requested(&shutdown) {
            match self.step() {
                StepOutcome::Idle => thread::sleep(self.config.poll_interval),
                StepOutcome::Failed => thread::sleep(self.retry_delay()),
                StepOutcome::Merged | StepOutcome::Ignored => {}
            }
        }

        info!("Reader loop stopped");
    }
}

impl<D: DeviceLink + 'static> ReaderLoop<D> {
    /// Run the loop on tokio's blocking pool.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || self.run(shutdown))
    }
}

/// True once shutdown was signalled or the signalling side went away.
fn shutdown_requested(shutdown: &watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return true;
    }
    shutdown.has_changed().is_err()
}

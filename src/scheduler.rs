// ABOUTME: Fixed-rate submission loop: one logical message per tick, segmented and submitted in order
// ABOUTME: Stops on max count or a shutdown signal between ticks, then waits out the drain period

use crate::client::{SmppTransmitter, SubmitError};
use crate::config::{ConfigError, SendConfig};
use crate::datatypes::{Address, SubmitSm, validity_period};
use crate::encoding::EncodingError;
use crate::segment::segment;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info, warn};

/// Called with the running totals after every tick
pub type ProgressObserver = Box<dyn Fn(&RunStats) + Send + Sync>;

/// Why a run ended early. `index` is the 1-based logical message number.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("message {index}: {source}")]
    Encoding {
        index: u64,
        #[source]
        source: EncodingError,
    },

    #[error("message {index}, segment {segment}/{total}: {source}")]
    Submit {
        index: u64,
        segment: usize,
        total: usize,
        #[source]
        source: SubmitError,
    },
}

impl RunError {
    /// True when the session is gone and waiting for receipts is pointless
    pub fn is_session_closed(&self) -> bool {
        matches!(
            self,
            RunError::Submit {
                source: SubmitError::SessionClosed,
                ..
            }
        )
    }
}

/// Throughput of one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    /// Logical messages fully submitted
    pub sent: u64,
    /// submit_sm PDUs handed to the session
    pub segments: u64,
    pub started: Instant,
    pub elapsed: Duration,
}

impl RunStats {
    fn new(started: Instant) -> Self {
        Self {
            sent: 0,
            segments: 0,
            started,
            elapsed: Duration::ZERO,
        }
    }

    /// Achieved messages per second
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.sent as f64 / secs } else { 0.0 }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} messages ({} segments) in {:.3}s, {:.2} msg/s",
            self.sent,
            self.segments,
            self.elapsed.as_secs_f64(),
            self.rate()
        )
    }
}

/// Paces submissions at the configured rate.
///
/// Counters live on the `RunStats` of a single `run`, so two schedulers never
/// share state.
pub struct Scheduler {
    config: SendConfig,
    source: Address,
    destination: Address,
    shutdown: watch::Receiver<bool>,
    observer: Option<ProgressObserver>,
}

impl Scheduler {
    pub fn new(config: SendConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let source = config.source_address()?;
        let destination = config.destination_address()?;
        // A receiver whose sender is gone never reports shutdown
        let (_, shutdown) = watch::channel(false);

        Ok(Self {
            config,
            source,
            destination,
            shutdown,
            observer: None,
        })
    }

    /// Stop at the next tick once `true` is sent
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_observer(mut self, observer: impl Fn(&RunStats) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn config(&self) -> &SendConfig {
        &self.config
    }

    /// Run the tick loop on the calling task, then wait out the drain period.
    ///
    /// The drain also follows a failed run, except when the failure is
    /// [`SubmitError::SessionClosed`]: nothing can arrive on a closed session.
    pub async fn run<T: SmppTransmitter>(&self, transmitter: &mut T) -> Result<RunStats, RunError> {
        let period = self.config.period();
        let max_count = self.config.max_count();
        let started = Instant::now();
        let mut stats = RunStats::new(started);
        let mut shutdown = self.shutdown.clone();

        let mut ticker = interval_at(started + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            rate = self.config.rate,
            encoding = %self.config.encoding,
            multi_segment = self.config.multi_segment,
            max_count = ?max_count,
            "starting submission"
        );

        let outcome = loop {
            if max_count.is_some_and(|max| stats.sent >= max) {
                break Ok(());
            }

            tokio::select! {
                biased;

                () = shutdown_requested(&mut shutdown) => {
                    info!("shutdown requested, stopping submission");
                    break Ok(());
                }
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.send_one(transmitter, &mut stats).await {
                break Err(e);
            }

            stats.elapsed = started.elapsed();
            info!(sent = stats.sent, "Speed is: {:.2} msg/s", stats.rate());
            if let Some(observer) = &self.observer {
                observer(&stats);
            }
        };

        stats.elapsed = started.elapsed();
        match &outcome {
            Ok(()) => info!(%stats, "submission finished"),
            Err(e) => warn!(%stats, error = %e, "submission aborted"),
        }

        let session_gone = outcome.as_ref().is_err_and(RunError::is_session_closed);
        if !self.config.drain.is_zero() && !session_gone {
            info!("Waiting for deliver_sm for {:?}", self.config.drain);
            sleep(self.config.drain).await;
        }

        outcome.map(|()| stats)
    }

    async fn send_one<T: SmppTransmitter>(
        &self,
        transmitter: &mut T,
        stats: &mut RunStats,
    ) -> Result<(), RunError> {
        let index = stats.sent + 1;
        let units = segment(
            &self.config.text,
            self.config.encoding,
            self.config.multi_segment,
        )
        .map_err(|source| RunError::Encoding { index, source })?;

        let validity = validity_period(self.config.ttl_secs);
        let total = units.len();

        for (i, unit) in units.into_iter().enumerate() {
            let pdu = SubmitSm::new(
                self.source.clone(),
                self.destination.clone(),
                unit.data_coding(),
                unit.payload.clone(),
            )
            .with_esm_class(unit.esm_class())
            .with_validity_period(validity.as_str())
            .with_registered_delivery(self.config.registered_delivery)
            .with_service_type(self.config.service_type.as_str());

            debug!(index, segment = i + 1, total, "submitting");
            transmitter
                .submit(pdu)
                .await
                .map_err(|source| RunError::Submit {
                    index,
                    segment: i + 1,
                    total,
                    source,
                })?;
            stats.segments += 1;
        }

        stats.sent += 1;
        Ok(())
    }
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

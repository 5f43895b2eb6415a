//! Scheduled refresh over the whole verified population.
//!
//! The scheduler walks the distinct verified identities in fixed-size
//! batches: batches run sequentially with a pause in between, members of
//! a batch in parallel. Repeated ledger faults trip a circuit breaker
//! that suspends scheduled ticks for a cooldown window; manual runs are
//! never gated, only serialized against ticks.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use siglink_types::Timestamp;

use crate::engine::{RefreshOutcome, SyncEngine};
use crate::error::SyncError;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    /// Pause between scheduled ticks.
    pub interval: Duration,
    /// Identities refreshed concurrently per batch.
    pub batch_size: usize,
    /// Pause between consecutive batches within one run.
    pub batch_delay: Duration,
    /// Ledger-fault skips that trip the breaker.
    pub breaker_threshold: u32,
    /// How long the breaker stays open once tripped.
    pub breaker_cooldown_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
            batch_size: 25,
            batch_delay: Duration::from_secs(2),
            breaker_threshold: 10,
            breaker_cooldown_secs: 1800,
        }
    }
}

/// Tally of one full run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    /// Identities whose portfolio committed.
    pub processed: u64,
    /// Identities whose cycle failed on a store error.
    pub errors: u64,
    /// Identities abandoned on a ledger fault (stale state kept).
    pub skipped: u64,
    pub duration_ms: u64,
}

#[derive(Default)]
struct BreakerState {
    /// Ledger-fault skips accumulated across consecutive faulty runs.
    faults: u32,
    open_until: Option<Timestamp>,
}

pub struct SyncScheduler {
    engine: Arc<SyncEngine>,
    config: SchedulerConfig,
    breaker: Mutex<BreakerState>,
    /// Serializes manual runs against scheduled ticks.
    run_lock: tokio::sync::Mutex<()>,
    shutdown: broadcast::Sender<()>,
}

impl SyncScheduler {
    pub fn new(engine: Arc<SyncEngine>, config: SchedulerConfig) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            engine,
            config,
            breaker: Mutex::new(BreakerState::default()),
            run_lock: tokio::sync::Mutex::new(()),
            shutdown,
        }
    }

    /// Run one full population refresh. Never gated by the breaker; this
    /// is also the manual-trigger entry point.
    pub async fn run_once(&self, now: Timestamp) -> Result<SyncSummary, SyncError> {
        let _run = self.run_lock.lock().await;
        let started = Instant::now();
        let mut summary = SyncSummary::default();

        let identities = self.engine.store().verified_identities()?;
        let mut batches = identities.chunks(self.config.batch_size.max(1)).peekable();
        while let Some(batch) = batches.next() {
            let results = join_all(
                batch
                    .iter()
                    .map(|identity| self.engine.refresh_identity(identity, now)),
            )
            .await;
            for (identity, result) in batch.iter().zip(results) {
                match result {
                    Ok(RefreshOutcome::Updated { .. }) => summary.processed += 1,
                    Ok(RefreshOutcome::GatewayFault) => summary.skipped += 1,
                    Err(e) => {
                        summary.errors += 1;
                        tracing::error!(identity = %identity, error = %e, "refresh failed");
                    }
                }
            }
            if batches.peek().is_some() {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;
        self.record_faults(&summary, now);
        tracing::info!(
            processed = summary.processed,
            errors = summary.errors,
            skipped = summary.skipped,
            duration_ms = summary.duration_ms,
            "sync run complete"
        );
        Ok(summary)
    }

    /// One scheduled tick. Returns `None` without touching the ledger
    /// while the breaker is open.
    pub async fn tick(&self, now: Timestamp) -> Result<Option<SyncSummary>, SyncError> {
        {
            let mut breaker = self.breaker.lock().unwrap();
            if let Some(until) = breaker.open_until {
                if !until.is_past(now) {
                    tracing::debug!(open_until = %until, "breaker open, tick suspended");
                    return Ok(None);
                }
                breaker.open_until = None;
                breaker.faults = 0;
                tracing::info!("breaker cooldown elapsed, resuming");
            }
        }
        self.run_once(now).await.map(Some)
    }

    fn record_faults(&self, summary: &SyncSummary, now: Timestamp) {
        let mut breaker = self.breaker.lock().unwrap();
        if summary.skipped == 0 {
            breaker.faults = 0;
            return;
        }
        breaker.faults = breaker.faults.saturating_add(summary.skipped as u32);
        if breaker.open_until.is_none() && breaker.faults >= self.config.breaker_threshold {
            let until = now.plus_secs(self.config.breaker_cooldown_secs);
            breaker.open_until = Some(until);
            tracing::warn!(
                faults = breaker.faults,
                open_until = %until,
                "ledger fault threshold crossed, breaker opened"
            );
        }
    }

    /// Spawn the timer loop. Ticks run until [`stop`](Self::stop).
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        let mut shutdown = self.shutdown.subscribe();
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(scheduler.config.interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first interval tick fires immediately; swallow it so the
            // initial refresh happens one interval after startup.
            timer.tick().await;
            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        if let Err(e) = scheduler.tick(Timestamp::now()).await {
                            tracing::error!(error = %e, "scheduled sync failed");
                        }
                    }
                    _ = shutdown.recv() => break,
                }
            }
        })
    }

    pub fn stop(&self) {
        let _ = self.shutdown.send(());
    }
}

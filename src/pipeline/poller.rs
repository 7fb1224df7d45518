//! Background mailbox polling.
//!
//! Runs the pipeline against a [`MailSource`] on a fixed interval until
//! the returned shutdown flag is raised. Counters live in an injected
//! [`PollStats`] rather than process globals, so concurrent pollers and
//! tests never interfere.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::PipelineError;
use crate::mail::RawMessage;
use crate::store::TransactionStore;

use super::Pipeline;

/// Anything that can hand the poller a batch of not-yet-seen messages.
#[async_trait]
pub trait MailSource: Send + Sync {
    async fn fetch_new(&self) -> Result<Vec<RawMessage>, PipelineError>;
}

/// Per-poller counters.
#[derive(Debug, Default)]
pub struct PollStats {
    pub cycles: AtomicU64,
    pub scanned: AtomicU64,
    pub extracted: AtomicU64,
    pub stored: AtomicU64,
    pub duplicates: AtomicU64,
    pub errors: AtomicU64,
}

impl PollStats {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Spawn the polling loop. Raising the returned flag makes the loop
/// exit at its next tick; fetch and store failures are counted and the
/// loop keeps going.
pub fn spawn_poller(
    pipeline: Arc<Pipeline>,
    source: Arc<dyn MailSource>,
    store: Arc<dyn TransactionStore>,
    user_key: String,
    poll_interval: Duration,
    stats: Arc<PollStats>,
) -> (JoinHandle<()>, Arc<AtomicBool>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);

    let handle = tokio::spawn(async move {
        info!(interval_secs = poll_interval.as_secs(), "poller started");
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            ticker.tick().await;
            if shutdown_flag.load(Ordering::Relaxed) {
                info!("poller stopping");
                break;
            }
            stats.cycles.fetch_add(1, Ordering::Relaxed);

            let messages = match source.fetch_new().await {
                Ok(messages) => messages,
                Err(err) => {
                    stats.errors.fetch_add(1, Ordering::Relaxed);
                    warn!(error = %err, "mail fetch failed");
                    continue;
                }
            };
            stats
                .scanned
                .fetch_add(messages.len() as u64, Ordering::Relaxed);

            let records = pipeline.process_batch(&messages);
            stats
                .extracted
                .fetch_add(records.len() as u64, Ordering::Relaxed);

            for record in &records {
                match store.store_if_new(&user_key, record).await {
                    Ok(outcome) if outcome.stored() => {
                        stats.stored.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(_) => {
                        stats.duplicates.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) => {
                        stats.errors.fetch_add(1, Ordering::Relaxed);
                        error!(id = %record.id, error = %err, "store failed");
                    }
                }
            }
        }
    });

    (handle, shutdown)
}

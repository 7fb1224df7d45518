//! finmail CLI: read a batch of raw mail-provider messages as JSON
//! (from a file argument or stdin), run the extraction pipeline, store
//! the results, and print the stored records as JSON.

use std::io::Read;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use finmail::config::AppConfig;
use finmail::error::{ConfigError, Result, StoreError};
use finmail::mail::RawMessage;
use finmail::pipeline::Pipeline;
use finmail::store::{MemoryStore, RestStore, TransactionStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    // A broken entity model is a startup failure, never a silent
    // degradation at extraction time.
    let pipeline = Pipeline::new()?;

    let messages = read_messages()?;
    info!(count = messages.len(), "messages loaded");

    let store: Arc<dyn TransactionStore> = match &config.store_url {
        Some(url) => {
            info!(url = %url, "using REST store");
            Arc::new(RestStore::new(url.clone()))
        }
        None => Arc::new(MemoryStore::new()),
    };

    let records = pipeline.process_batch(&messages);
    let mut stored = Vec::with_capacity(records.len());
    for record in records {
        match store.store_if_new(&config.user_key, &record).await? {
            outcome if outcome.stored() => stored.push(record),
            _ => warn!(id = %record.id, "duplicate transaction skipped"),
        }
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&stored).map_err(StoreError::from)?
    );
    Ok(())
}

/// Messages come from the file named by the first argument, or stdin.
fn read_messages() -> Result<Vec<RawMessage>> {
    let raw = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path).map_err(ConfigError::Io)?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(ConfigError::Io)?;
            buf
        }
    };
    let messages = serde_json::from_str(&raw).map_err(StoreError::from)?;
    Ok(messages)
}

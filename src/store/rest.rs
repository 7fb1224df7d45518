//! REST-backed store against a Firebase-style JSON document tree.
//!
//! The history for a user lives at `{base}/{user}/transactions.json` as
//! a plain JSON array (`null` when the path has never been written).
//! Writes are read-modify-write of the whole array; the dedup check runs
//! against the freshly fetched history.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::record::TransactionRecord;

use super::{StoreOutcome, TransactionStore, duplicate_reason, push_capped};

pub struct RestStore {
    client: Client,
    base_url: String,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn transactions_url(&self, user_key: &str) -> String {
        format!("{}/{}/transactions.json", self.base_url, user_key)
    }

    async fn fetch_history(&self, user_key: &str) -> Result<Vec<TransactionRecord>, StoreError> {
        let response = self.client.get(self.transactions_url(user_key)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                code: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let history: Option<Vec<TransactionRecord>> = response.json().await?;
        Ok(history.unwrap_or_default())
    }

    async fn put_history(
        &self,
        user_key: &str,
        history: &[TransactionRecord],
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.transactions_url(user_key))
            .json(history)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                code: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for RestStore {
    async fn store_if_new(
        &self,
        user_key: &str,
        record: &TransactionRecord,
    ) -> Result<StoreOutcome, StoreError> {
        let mut history = self.fetch_history(user_key).await?;
        if let Some(reason) = duplicate_reason(&history, record) {
            debug!(user = user_key, id = %record.id, ?reason, "duplicate rejected");
            return Ok(StoreOutcome::Duplicate(reason));
        }
        push_capped(&mut history, record.clone());
        self.put_history(user_key, &history).await?;
        info!(user = user_key, id = %record.id, "transaction stored");
        Ok(StoreOutcome::Stored)
    }

    async fn recent(&self, user_key: &str) -> Result<Vec<TransactionRecord>, StoreError> {
        self.fetch_history(user_key).await
    }
}

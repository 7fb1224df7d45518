//! In-process store, used by the CLI and in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::record::TransactionRecord;

use super::{StoreOutcome, TransactionStore, duplicate_reason, push_capped};

#[derive(Default)]
pub struct MemoryStore {
    histories: RwLock<HashMap<String, Vec<TransactionRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn store_if_new(
        &self,
        user_key: &str,
        record: &TransactionRecord,
    ) -> Result<StoreOutcome, StoreError> {
        let mut histories = self.histories.write().await;
        let history = histories.entry(user_key.to_string()).or_default();
        if let Some(reason) = duplicate_reason(history, record) {
            debug!(user = user_key, id = %record.id, ?reason, "duplicate rejected");
            return Ok(StoreOutcome::Duplicate(reason));
        }
        push_capped(history, record.clone());
        Ok(StoreOutcome::Stored)
    }

    async fn recent(&self, user_key: &str) -> Result<Vec<TransactionRecord>, StoreError> {
        Ok(self
            .histories
            .read()
            .await
            .get(user_key)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::record;
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn stores_then_rejects_same_id() {
        let store = MemoryStore::new();
        let r = record("m1", dec!(100), "Swiggy");
        assert!(store.store_if_new("u", &r).await.unwrap().stored());
        assert!(!store.store_if_new("u", &r).await.unwrap().stored());
    }

    #[tokio::test]
    async fn rejects_field_collision_across_ids() {
        let store = MemoryStore::new();
        let first = record("m1", dec!(100), "Swiggy");
        let second = record("m2", dec!(100), "Swiggy");
        assert!(store.store_if_new("u", &first).await.unwrap().stored());
        assert!(!store.store_if_new("u", &second).await.unwrap().stored());
    }

    #[tokio::test]
    async fn users_have_independent_histories() {
        let store = MemoryStore::new();
        let r = record("m1", dec!(100), "Swiggy");
        assert!(store.store_if_new("alice", &r).await.unwrap().stored());
        assert!(store.store_if_new("bob", &r).await.unwrap().stored());
        assert_eq!(store.recent("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn recent_is_newest_first() {
        let store = MemoryStore::new();
        store
            .store_if_new("u", &record("m1", dec!(100), "Swiggy"))
            .await
            .unwrap();
        store
            .store_if_new("u", &record("m2", dec!(200), "Zomato"))
            .await
            .unwrap();
        let history = store.recent("u").await.unwrap();
        assert_eq!(history[0].id, "m2");
        assert_eq!(history[1].id, "m1");
    }
}

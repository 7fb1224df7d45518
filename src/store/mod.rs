//! Deduplicating transaction storage.
//!
//! Both backends share the same dedup contract: reject an id already
//! seen, then reject an `(amount, date, merchant)` collision, then
//! prepend to a history capped at the newest [`HISTORY_CAP`] records.

pub mod memory;
pub mod rest;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::TransactionRecord;

pub use memory::MemoryStore;
pub use rest::RestStore;

/// Most recent records kept per user.
pub const HISTORY_CAP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateReason {
    SameId,
    SameAmountDateMerchant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Stored,
    Duplicate(DuplicateReason),
}

impl StoreOutcome {
    pub fn stored(&self) -> bool {
        matches!(self, StoreOutcome::Stored)
    }
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Store `record` for `user_key` unless the dedup rules reject it.
    async fn store_if_new(
        &self,
        user_key: &str,
        record: &TransactionRecord,
    ) -> Result<StoreOutcome, StoreError>;

    /// The user's history, newest first.
    async fn recent(&self, user_key: &str) -> Result<Vec<TransactionRecord>, StoreError>;
}

/// Dedup check against an existing history. Id collisions win over
/// field collisions so the caller gets the most specific reason.
pub(crate) fn duplicate_reason(
    existing: &[TransactionRecord],
    record: &TransactionRecord,
) -> Option<DuplicateReason> {
    if existing.iter().any(|r| r.id == record.id) {
        return Some(DuplicateReason::SameId);
    }
    if existing.iter().any(|r| {
        r.amount == record.amount && r.date == record.date && r.merchant == record.merchant
    }) {
        return Some(DuplicateReason::SameAmountDateMerchant);
    }
    None
}

/// Prepend and cap, newest first.
pub(crate) fn push_capped(history: &mut Vec<TransactionRecord>, record: TransactionRecord) {
    history.insert(0, record);
    history.truncate(HISTORY_CAP);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Currency, Direction, Mode, Provenance, RawFields, assemble};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    pub(crate) fn record(id: &str, amount: Decimal, merchant: &str) -> TransactionRecord {
        assemble(
            RawFields {
                amount,
                currency: Currency::Inr,
                merchant: Some(merchant.to_string()),
                date: NaiveDate::from_ymd_opt(2025, 7, 20).unwrap(),
                direction: Direction::Debit,
                mode: Mode::Upi,
                category: Default::default(),
                reference_number: None,
                card_last_four: None,
                account_number: None,
                bank_account: None,
                description: "test".to_string(),
                available_balance: None,
                confidence: 1.0,
            },
            Provenance {
                message_id: id.to_string(),
                subject: None,
                sender: None,
            },
        )
    }

    #[test]
    fn same_id_is_rejected_first() {
        let existing = vec![record("a", dec!(100), "Swiggy")];
        let dup = record("a", dec!(999), "Other");
        assert_eq!(
            duplicate_reason(&existing, &dup),
            Some(DuplicateReason::SameId)
        );
    }

    #[test]
    fn same_amount_date_merchant_is_rejected() {
        let existing = vec![record("a", dec!(100), "Swiggy")];
        let dup = record("b", dec!(100), "Swiggy");
        assert_eq!(
            duplicate_reason(&existing, &dup),
            Some(DuplicateReason::SameAmountDateMerchant)
        );
    }

    #[test]
    fn distinct_records_pass() {
        let existing = vec![record("a", dec!(100), "Swiggy")];
        let fresh = record("b", dec!(200), "Zomato");
        assert_eq!(duplicate_reason(&existing, &fresh), None);
    }

    #[test]
    fn history_is_capped_newest_first() {
        let mut history = Vec::new();
        for i in 0..(HISTORY_CAP + 10) {
            push_capped(
                &mut history,
                record(&format!("id-{i}"), dec!(10) + Decimal::from(i as u32), "M"),
            );
        }
        assert_eq!(history.len(), HISTORY_CAP);
        assert_eq!(history[0].id, format!("id-{}", HISTORY_CAP + 9));
    }
}

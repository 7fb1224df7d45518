use std::sync::Arc;

use tracing::{debug, info};

use crate::classify::{Classifier, MessageKind};
use crate::decode::BodyDecoder;
use crate::error::ModelError;
use crate::extract::{FieldExtractor, ner::EntityTagger};
use crate::mail::RawMessage;
use crate::record::{Provenance, TransactionRecord, assemble};

/// The full per-message transformation. Holds no mutable state; one
/// instance is shared across however many messages or tasks need it.
pub struct Pipeline {
    decoder: BodyDecoder,
    classifier: Classifier,
    extractor: FieldExtractor,
}

impl Pipeline {
    /// Build the pipeline, compiling the entity model up front.
    /// Extraction quality depends on the model, so a broken pattern
    /// set stops the process at startup instead of degrading silently.
    pub fn new() -> Result<Self, ModelError> {
        let tagger = Arc::new(EntityTagger::new()?);
        Ok(Self {
            decoder: BodyDecoder::new(),
            classifier: Classifier::new(),
            extractor: FieldExtractor::new(tagger),
        })
    }

    /// Run one message through the pipeline. `None` when the message is
    /// not a transaction or no plausible amount could be extracted.
    pub fn process(&self, message: &RawMessage) -> Option<TransactionRecord> {
        let body = self.decoder.decode(&message.payload);
        let classification =
            self.classifier
                .classify(message.subject(), message.sender(), &body);
        if classification.kind != MessageKind::Transaction {
            debug!(
                id = %message.id,
                kind = ?classification.kind,
                financial_score = classification.financial_score,
                transaction_score = classification.transaction_score,
                "not a transaction"
            );
            return None;
        }

        let Some(fields) = self.extractor.extract(&body) else {
            debug!(id = %message.id, "no transaction detected");
            return None;
        };

        let record = assemble(
            fields,
            Provenance {
                message_id: message.id.clone(),
                subject: Some(message.subject().to_string()).filter(|s| !s.is_empty()),
                sender: Some(message.sender().to_string()).filter(|s| !s.is_empty()),
            },
        );
        info!(
            id = %record.id,
            amount = %record.amount,
            merchant = record.merchant.as_deref().unwrap_or("-"),
            "transaction extracted"
        );
        Some(record)
    }

    /// Process a batch sequentially. Messages that yield nothing are
    /// skipped; one bad message never stops the batch.
    pub fn process_batch(&self, messages: &[RawMessage]) -> Vec<TransactionRecord> {
        let records: Vec<TransactionRecord> =
            messages.iter().filter_map(|m| self.process(m)).collect();
        info!(
            scanned = messages.len(),
            extracted = records.len(),
            "batch processed"
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::Payload;
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use rust_decimal_macros::dec;

    fn message(id: &str, subject: &str, sender: &str, body: &str) -> RawMessage {
        let json = serde_json::json!({
            "id": id,
            "payload": {
                "mimeType": "text/plain",
                "headers": [
                    {"name": "Subject", "value": subject},
                    {"name": "From", "value": sender},
                ],
                "body": {"data": URL_SAFE_NO_PAD.encode(body)},
            },
        });
        serde_json::from_value(json).expect("valid message")
    }

    fn pipeline() -> Pipeline {
        Pipeline::new().expect("entity model compiles")
    }

    #[test]
    fn bank_alert_becomes_a_record() {
        let record = pipeline()
            .process(&message(
                "msg-1",
                "You have done a UPI txn",
                "alerts@hdfcbank.net",
                "Rs.1,500.00 has been debited from account XX1234 on 20-07-2025. \
                 UPI reference number is 425692851472.",
            ))
            .expect("transaction record");
        assert_eq!(record.amount, dec!(1500.00));
        assert_eq!(record.id, "msg-1");
        assert_eq!(record.email_from.as_deref(), Some("alerts@hdfcbank.net"));
    }

    #[test]
    fn order_confirmation_yields_nothing() {
        assert!(pipeline()
            .process(&message(
                "msg-2",
                "Your order has shipped",
                "ship-confirm@amazon.in",
                "Your Amazon order has shipped and will arrive Friday",
            ))
            .is_none());
    }

    #[test]
    fn transaction_without_amount_yields_nothing() {
        assert!(pipeline()
            .process(&message(
                "msg-3",
                "Payment update",
                "alerts@hdfcbank.net",
                "A payment was debited via UPI. Reference number is pending. \
                 Transaction id pending. Contact your branch.",
            ))
            .is_none());
    }

    #[test]
    fn batch_skips_non_transactions() {
        let p = pipeline();
        let records = p.process_batch(&[
            message(
                "msg-1",
                "UPI txn",
                "alerts@hdfcbank.net",
                "Rs.500.00 has been debited from account XX9876 on 01-08-2025. \
                 UPI reference number is 111122223333.",
            ),
            message("msg-2", "Newsletter", "news@dealsite.com", "save on gas this week"),
        ]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "msg-1");
    }
}

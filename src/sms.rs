//! SMS-style transaction parsing.
//!
//! Bank SMS bodies are short and already plain text, so there is no
//! decode/classify stage; a keyword gate stands in for the classifier
//! and the regular field extractor does the rest. OTP and promotional
//! texts fail either the gate or the amount extraction.

use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::extract::{FieldExtractor, ner::EntityTagger};
use crate::record::{Provenance, TransactionRecord, assemble};

#[derive(Debug, Clone)]
pub struct SmsMessage {
    pub id: String,
    pub sender: String,
    pub text: String,
}

pub struct SmsParser {
    gate: Regex,
    otp: Regex,
    extractor: FieldExtractor,
}

impl SmsParser {
    pub fn new(tagger: Arc<EntityTagger>) -> Self {
        Self {
            gate: Regex::new(
                r"(?i)\b(?:debited|credited|withdrawn|transferred|paid|payment|spent|purchase|txn|transaction)\b",
            )
            .unwrap(),
            otp: Regex::new(r"(?i)\botp\b|one\s+time\s+password|do\s+not\s+share").unwrap(),
            extractor: FieldExtractor::new(tagger),
        }
    }

    /// Parse one SMS. `None` for non-transactional texts or texts with
    /// no plausible amount.
    pub fn parse(&self, sms: &SmsMessage) -> Option<TransactionRecord> {
        if self.otp.is_match(&sms.text) {
            debug!(id = %sms.id, "otp text skipped");
            return None;
        }
        if !self.gate.is_match(&sms.text) {
            debug!(id = %sms.id, "no transaction keyword");
            return None;
        }
        let fields = self.extractor.extract(&sms.text)?;
        Some(assemble(
            fields,
            Provenance {
                message_id: sms.id.clone(),
                subject: None,
                sender: Some(sms.sender.clone()).filter(|s| !s.is_empty()),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Direction;
    use rust_decimal_macros::dec;

    fn parser() -> SmsParser {
        SmsParser::new(Arc::new(EntityTagger::new().expect("patterns compile")))
    }

    fn sms(id: &str, sender: &str, text: &str) -> SmsMessage {
        SmsMessage {
            id: id.to_string(),
            sender: sender.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn parses_bank_debit_sms() {
        let record = parser()
            .parse(&sms(
                "sms-1",
                "VM-HDFCBK",
                "Rs.450.00 debited from a/c XX1234 on 12-08-2025 via UPI. \
                 Available balance is Rs.12,340.50",
            ))
            .expect("transaction");
        assert_eq!(record.amount, dec!(450.00));
        assert_eq!(record.credit_or_debit, Direction::Debit);
        assert_eq!(record.available_balance, Some(dec!(12340.50)));
        assert_eq!(record.email_from.as_deref(), Some("VM-HDFCBK"));
    }

    #[test]
    fn otp_sms_is_skipped() {
        assert!(parser()
            .parse(&sms(
                "sms-2",
                "VM-HDFCBK",
                "Your OTP for txn of Rs.450.00 is 482913. Do not share it.",
            ))
            .is_none());
    }

    #[test]
    fn promotional_sms_is_skipped() {
        assert!(parser()
            .parse(&sms(
                "sms-3",
                "DM-OFFERS",
                "Flat 50% off on your next order. T&C apply.",
            ))
            .is_none());
    }

    #[test]
    fn keyword_without_amount_is_skipped() {
        assert!(parser()
            .parse(&sms("sms-4", "VM-HDFCBK", "Your payment could not be completed"))
            .is_none());
    }
}

//! Keyword-scored email classifier.
//!
//! Two fixed pattern families score the concatenated (subject, sender,
//! body) text: financial-institution names (worth 2 each, presence only)
//! and transaction vocabulary (worth 1 per occurrence). A message is a
//! transaction when both scores clear paired thresholds, with a second
//! looser pair for vocabulary-heavy messages from lesser-known senders.

use regex::Regex;

/// The classifier's verdict for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// A financial transaction notification — goes to the field extractor.
    Transaction,
    /// An order/shipping confirmation.
    Order,
    /// A periodic statement or bill.
    Statement,
    /// Everything else.
    Other,
}

/// Classification result with its contributing scores, kept for
/// debuggability. Never persisted.
#[derive(Debug, Clone, Copy)]
pub struct Classification {
    pub kind: MessageKind,
    pub financial_score: u32,
    pub transaction_score: u32,
}

pub struct Classifier {
    institution_patterns: Vec<Regex>,
    action_patterns: Vec<Regex>,
}

impl Classifier {
    pub fn new() -> Self {
        let institution_patterns = [
            // Banks
            r"hdfc\s*bank",
            r"axis\s*bank",
            r"icici\s*bank",
            r"sbi\s*bank",
            r"kotak\s*bank",
            r"yes\s*bank",
            r"pnb\s*bank",
            r"canara\s*bank",
            r"bank\s*of\s*baroda",
            r"union\s*bank",
            r"indian\s*bank",
            // Payment gateways
            r"razorpay",
            r"paytm",
            r"phonepe",
            r"googlepay",
            r"amazon\s*pay",
            r"paypal",
            r"stripe",
            r"cashfree",
            r"instamojo",
            // Card networks (word-boundary aware — short tokens)
            r"\bvisa\b",
            r"\bmastercard\b",
            r"american\s*express",
            r"\brupay\b",
            // Brokerages and funds
            r"mutual\s*fund",
            r"zerodha",
            r"groww",
            r"upstox",
            r"angel\s*broking",
        ];

        let action_patterns = [
            // Transaction verbs/nouns
            r"debited",
            r"credited",
            r"payment",
            r"transaction",
            r"charged",
            r"refund",
            r"withdrawal",
            r"deposit",
            r"transfer",
            r"purchase",
            // Currency-amount shapes
            r"rs\.?\s*\d+",
            r"inr\s*\d+",
            r"₹\s*\d+",
            r"\$\s*\d+",
            // Payment methods
            r"\bupi\b",
            r"\bneft\b",
            r"\bimps\b",
            r"\brtgs\b",
            r"credit\s*card",
            r"debit\s*card",
            // Reference-number phrase markers
            r"reference\s*number",
            r"transaction\s*id",
            r"receipt\s*number",
            r"order\s*id",
            r"payment\s*id",
        ];

        Self {
            institution_patterns: institution_patterns
                .iter()
                .map(|p| Regex::new(p).unwrap())
                .collect(),
            action_patterns: action_patterns
                .iter()
                .map(|p| Regex::new(p).unwrap())
                .collect(),
        }
    }

    /// Classify a message. Deterministic; no failure path.
    pub fn classify(&self, subject: &str, sender: &str, body: &str) -> Classification {
        let full_text = format!("{subject} {sender} {body}").to_lowercase();

        let financial_score: u32 = self
            .institution_patterns
            .iter()
            .filter(|p| p.is_match(&full_text))
            .count() as u32
            * 2;

        let transaction_score: u32 = self
            .action_patterns
            .iter()
            .map(|p| p.find_iter(&full_text).count() as u32)
            .sum();

        // First match wins.
        let kind = if financial_score >= 2 && transaction_score >= 3 {
            MessageKind::Transaction
        } else if financial_score >= 1 && transaction_score >= 5 {
            MessageKind::Transaction
        } else if full_text.contains("amazon")
            && (full_text.contains("order") || full_text.contains("shipped"))
        {
            MessageKind::Order
        } else if (full_text.contains("statement") || full_text.contains("bill"))
            && financial_score >= 1
        {
            MessageKind::Statement
        } else {
            MessageKind::Other
        };

        Classification {
            kind,
            financial_score,
            transaction_score,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

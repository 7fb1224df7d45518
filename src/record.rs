//! Canonical transaction record and its assembly from raw extracted
//! fields.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Inr,
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Inr => "₹",
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Credit,
    #[default]
    Debit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Upi,
    #[default]
    Card,
    BankTransfer,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Shopping,
    Food,
    Gas,
    Groceries,
    Entertainment,
    Transportation,
    Utilities,
    Healthcare,
    P2p,
    BankTransfer,
    #[default]
    Other,
}

/// Everything the field extractor could pull out of one message body.
/// Optional throughout except `amount` — extraction without an amount
/// yields no `RawFields` at all.
#[derive(Debug, Clone)]
pub struct RawFields {
    pub amount: Decimal,
    pub currency: Currency,
    pub merchant: Option<String>,
    pub date: NaiveDate,
    pub direction: Direction,
    pub mode: Mode,
    pub category: Category,
    pub reference_number: Option<String>,
    pub card_last_four: Option<String>,
    pub account_number: Option<String>,
    pub bank_account: Option<String>,
    pub description: String,
    pub available_balance: Option<Decimal>,
    /// Fraction of the seven core fields that resolved, in [0, 1].
    pub confidence: f64,
}

/// Where the record came from.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub message_id: String,
    pub subject: Option<String>,
    pub sender: Option<String>,
}

/// The canonical output shape. Constructed once per transaction message
/// via [`assemble`] and immutable afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: Currency,
    pub merchant: Option<String>,
    #[serde(with = "day_month_year")]
    pub date: NaiveDate,
    pub credit_or_debit: Direction,
    pub mode: Mode,
    pub category: Category,
    pub reference_number: Option<String>,
    pub card_last_four: Option<String>,
    pub account_number: Option<String>,
    pub from_account: Option<String>,
    pub to_account: Option<String>,
    pub description: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::str_option"
    )]
    pub available_balance: Option<Decimal>,
    pub confidence: f64,
    pub email_subject: Option<String>,
    pub email_from: Option<String>,
    pub transaction_identifier_id: String,
}

/// Serialize dates as `DD-MM-YY`, the dashboard's display format.
mod day_month_year {
    use chrono::NaiveDate;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%d-%m-%y";

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDate::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Map extracted fields plus message provenance into the canonical
/// record. Direction decides which side of the transfer the account
/// sits on: a debit leaves our account, a credit lands in it. The bank
/// name is preferred; a masked account fragment stands in when no bank
/// name was extracted.
pub fn assemble(fields: RawFields, provenance: Provenance) -> TransactionRecord {
    let account = fields
        .bank_account
        .clone()
        .or_else(|| fields.account_number.clone());
    let (from_account, to_account) = match fields.direction {
        Direction::Debit => (account, None),
        Direction::Credit => (None, account),
    };

    TransactionRecord {
        id: provenance.message_id.clone(),
        amount: fields.amount,
        currency: fields.currency,
        merchant: fields.merchant,
        date: fields.date,
        credit_or_debit: fields.direction,
        mode: fields.mode,
        category: fields.category,
        reference_number: fields.reference_number,
        card_last_four: fields.card_last_four,
        account_number: fields.account_number,
        from_account,
        to_account,
        description: fields.description,
        available_balance: fields.available_balance,
        confidence: fields.confidence,
        email_subject: provenance.subject,
        email_from: provenance.sender,
        transaction_identifier_id: provenance.message_id,
    }
}

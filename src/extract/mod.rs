//! Transaction field extraction.
//!
//! Every field has its own ordered pattern cascade, tried
//! most-specific-first with an entity-tagger fallback where one applies.
//! The first pattern yielding an in-range value wins. Amount is the only
//! hard gate: no amount, no [`RawFields`].

pub mod ner;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use crate::record::{Category, Currency, Direction, Mode, RawFields};
use ner::{EntityLabel, EntityTagger};

const MIN_AMOUNT: &str = "0.01";
const MAX_AMOUNT: &str = "100000";

pub struct FieldExtractor {
    tagger: Arc<EntityTagger>,
    amount_patterns: Vec<Regex>,
    balance_patterns: Vec<Regex>,
    currency_usd: Regex,
    currency_eur: Regex,
    currency_gbp: Regex,
    currency_inr: Regex,
    debit_words: Regex,
    credit_words: Regex,
    card_usage: Regex,
    mode_upi: Regex,
    mode_card: Regex,
    mode_bank: Regex,
    mode_wallet: Regex,
    merchant_patterns: Vec<Regex>,
    vpa_handle: Regex,
    date_patterns: Vec<Regex>,
    reference_patterns: Vec<Regex>,
    card_patterns: Vec<Regex>,
    account_patterns: Vec<Regex>,
    bank_patterns: Vec<Regex>,
    categories: Vec<(Category, Vec<&'static str>)>,
    sentence_split: Regex,
    sentence_amount: Regex,
    sentence_action: Regex,
}

impl FieldExtractor {
    pub fn new(tagger: Arc<EntityTagger>) -> Self {
        let amount = r"[\d,]+(?:\.\d{1,2})?";

        // Transaction-anchored patterns first; bare currency shapes last.
        // A generic pattern tried early would capture balance figures.
        let amount_patterns = [
            format!(r"(?i)(?:rs\.?|inr|₹)\s*({amount})\s+has\s+been\s+(?:debited|credited)"),
            format!(r"(?i)(?:₹|rs\.?|inr)\s*({amount})\s+paid\s+successfully"),
            format!(r"(?i)(?:rs\.?|inr|₹)\s*({amount})\s+(?:debited|credited)"),
            format!(r"(?i)(?:debited|credited)\s+(?:with|for|by)\s+(?:rs\.?|inr|₹)\s*({amount})"),
            format!(r"(?i)(?:payment|paid)\s+of\s+(?:rs\.?|inr|₹)\s*({amount})"),
            format!(r"(?i)amount\s+of\s+(?:rs\.?|inr|₹)\s*({amount})"),
            format!(r"(?i)(?:charged|spent)\s+(?:rs\.?|inr|₹|\$)\s*({amount})"),
            format!(r"(?i)(?:rs\.?|inr|₹)\s*({amount})\s+(?:was|is)\s+(?:debited|credited|paid)"),
            format!(r"(?i)transaction\s+of\s+(?:rs\.?|inr|₹|\$)\s*({amount})"),
            format!(r"(?i)(?:sent|received|transferred)\s+(?:rs\.?|inr|₹)\s*({amount})"),
            format!(r"(?i)\$\s*({amount})\s+(?:was\s+)?(?:charged|debited|paid)"),
            format!(r"(?i)(?:payment|paid|charged)\s+(?:of\s+)?\$\s*({amount})"),
            format!(r"(?i)€\s*({amount})|(?i)\beur\s*({amount})"),
            format!(r"(?i)£\s*({amount})|(?i)\bgbp\s*({amount})"),
            format!(r"₹\s*({amount})"),
            format!(r"(?i)\brs\.?\s*({amount})"),
            format!(r"(?i)\binr\s*({amount})"),
            format!(r"\$\s*({amount})"),
        ];

        let balance_patterns = [
            format!(
                r"(?i)(?:available|avl\.?)\s+(?:balance|limit)\s+(?:is\s+)?(?:now\s+)?(?:rs\.?|inr|₹|\$)?\s*({amount})"
            ),
            format!(r"(?i)\b(?:balance|bal)\s*(?:is|:)\s*(?:rs\.?|inr|₹|\$)?\s*({amount})"),
        ];

        let merchant_patterns = [
            r"To:\s+([A-Za-z][A-Za-z ]*?)\s+(?:₹|Payment\s+Id)",
            r"(?i)to\s+vpa\s+[\w.\-]+@\w+\s+([A-Za-z][A-Za-z ]+?)\s+on\b",
            r"(?i)(?:paid\s+to|payment\s+to|sent\s+to)\s+([A-Z][\w &.\-]+?)(?:\s+(?:on|for|via|using)\b|[.,\n]|$)",
            r"\b(?:at|from)\s+([A-Z][A-Za-z&.\-]+(?:\s+[A-Z][A-Za-z&.\-]+)*)(?:\s+on\b|[.,\n]|$)",
        ];

        let date_patterns = [
            r"(?i)\bon\s+(\d{1,2}-\d{1,2}-\d{4})",
            r"(?i)\bon\s+(\d{1,2}-\d{1,2}-\d{2})\b",
            r"(?i)\bon\s+(\d{1,2}/\d{1,2}/\d{2,4})",
            r"(?i)paid\s+on\s+(\d{1,2}\s+[A-Za-z]{3,9},?\s+\d{4})",
            r"(?i)\bon\s+(\d{1,2}\s+[A-Za-z]{3,9},?\s+\d{4})",
            r"(\d{1,2}-\d{1,2}-\d{4})",
            r"(\d{1,2}/\d{1,2}/\d{4})",
            r"(\d{1,2}\s+[A-Za-z]{3,9},?\s+\d{4})",
        ];

        let reference_patterns = [
            r"\b(pay_[A-Za-z0-9_]{8,})\b",
            r"(?i)(?:reference\s+number|ref\s+no\.?|reference)\s*(?:is|:)?\s*([A-Za-z0-9]{6,})",
            r"(?i)(?:transaction\s+id|txn\s+id|payment\s+id|order\s+id|utr)\s*(?:is|:)?\s*([A-Za-z0-9_\-]{6,})",
            r"(?i)\bupi\b.*?(\d{12})\b",
            r"(?i)reference.*?(\d{10,18})\b",
        ];

        let card_patterns = [
            r"(?i)card\s+(?:no\.?\s*)?(?:ending\s+(?:in\s+)?)?[Xx*\s]*(\d{4})\b",
            r"(?i)ending\s+(?:in\s+)?(\d{4})\b",
            r"\*{2,}\s*(\d{4})\b",
        ];

        let account_patterns = [
            r"(?i)account\s+(?:no\.?\s*|number\s*)?[Xx*]*(\d{4,})\b",
            r"(?i)a/c\s+(?:no\.?\s*)?[Xx*]*(\d{4,})\b",
        ];

        let bank_patterns = [
            r"(?i)\b((?:HDFC|ICICI|Axis|SBI|Kotak|Yes|PNB|Canara|Union|Indian|IDFC|IndusInd)\s*Bank)\b",
            r"(?i)(?:from|in)\s+your\s+([A-Z][A-Za-z ]+?)\s+account\b",
        ];

        let categories = vec![
            (
                Category::Food,
                vec![
                    "swiggy", "zomato", "restaurant", "cafe", "pizza", "dominos", "mcdonalds",
                    "starbucks", "dining", "food",
                ],
            ),
            (
                Category::Shopping,
                vec![
                    "amazon", "flipkart", "myntra", "ajio", "decathlon", "mall", "store",
                    "shopping",
                ],
            ),
            (
                Category::Gas,
                vec!["petrol", "fuel", "gas station", "hpcl", "bpcl", "indianoil", "shell"],
            ),
            (
                Category::Groceries,
                vec![
                    "bigbasket", "blinkit", "zepto", "grofers", "dmart", "grocery", "supermarket",
                ],
            ),
            (
                Category::Entertainment,
                vec![
                    "netflix", "spotify", "hotstar", "bookmyshow", "movie", "cinema", "gaming",
                ],
            ),
            (
                Category::Transportation,
                vec![
                    "uber", "ola", "rapido", "irctc", "makemytrip", "metro", "cab", "taxi",
                    "flight", "train",
                ],
            ),
            (
                Category::Utilities,
                vec![
                    "electricity", "broadband", "recharge", "postpaid", "dth", "jio", "airtel",
                    "vodafone",
                ],
            ),
            (
                Category::Healthcare,
                vec![
                    "pharmacy", "hospital", "clinic", "apollo", "medplus", "1mg", "netmeds",
                    "medical",
                ],
            ),
            (Category::P2p, vec!["sent to", "received from", "vpa"]),
            (Category::BankTransfer, vec!["neft", "imps", "rtgs", "transfer"]),
        ];

        Self {
            tagger,
            amount_patterns: compile_all(&amount_patterns),
            balance_patterns: compile_all(&balance_patterns),
            currency_usd: Regex::new(r"(?i)\$|\busd\b").unwrap(),
            currency_eur: Regex::new(r"(?i)€|\beur\b").unwrap(),
            currency_gbp: Regex::new(r"(?i)£|\bgbp\b").unwrap(),
            currency_inr: Regex::new(r"(?i)₹|\brs\.?|\binr\b").unwrap(),
            debit_words: Regex::new(r"(?i)\bdebited\b|\bdebit\b").unwrap(),
            credit_words: Regex::new(r"(?i)\bcredited\b|\breceived\b").unwrap(),
            card_usage: Regex::new(
                r"(?i)(?:using|with|on|via)\s+your\s+credit\s+card|credit\s+card\s+(?:was\s+)?used",
            )
            .unwrap(),
            mode_upi: Regex::new(r"(?i)\bupi\b|\bvpa\b").unwrap(),
            mode_card: Regex::new(r"(?i)\bcard\b").unwrap(),
            mode_bank: Regex::new(r"(?i)\bneft\b|\bimps\b|\brtgs\b").unwrap(),
            mode_wallet: Regex::new(r"(?i)paytm|phonepe|google\s*pay|\bgpay\b").unwrap(),
            merchant_patterns: compile_all(&merchant_patterns),
            vpa_handle: Regex::new(r"\b([\w.\-]+@[a-z]+)\b").unwrap(),
            date_patterns: compile_all(&date_patterns),
            reference_patterns: compile_all(&reference_patterns),
            card_patterns: compile_all(&card_patterns),
            account_patterns: compile_all(&account_patterns),
            bank_patterns: compile_all(&bank_patterns),
            categories,
            // Period only ends a sentence before whitespace/end, so the
            // dot in "Rs.1,500.00" never splits.
            sentence_split: Regex::new(r"[.!?](?:\s+|$)|\n").unwrap(),
            sentence_amount: Regex::new(r"(?i)(?:rs\.?|inr|₹|\$|€|£)\s*[\d,]+").unwrap(),
            sentence_action: Regex::new(
                r"(?i)\b(?:debited|credited|paid|charged|transferred|received|spent|payment)\b",
            )
            .unwrap(),
        }
    }

    /// Extract all transaction fields from a cleaned body. Returns `None`
    /// only when no plausible amount was found.
    pub fn extract(&self, text: &str) -> Option<RawFields> {
        let entities = self.tagger.tag(text);

        let (amount, amount_span) = match self.extract_amount(text, &entities) {
            Some(found) => found,
            None => {
                debug!("no plausible amount found");
                return None;
            }
        };
        let currency = self.infer_currency(text, amount_span);
        let direction = self.extract_direction(text);
        let mode = self.extract_mode(text);
        let merchant = self.extract_merchant(text, &entities);
        let (date, date_from_text) = self.extract_date(text, &entities);
        let reference_number = self.extract_reference(text);
        let card_last_four = first_capture(&self.card_patterns, text);
        let account_number = first_capture(&self.account_patterns, text);
        let bank_account = first_capture(&self.bank_patterns, text)
            .map(|b| b.trim().to_string());
        let category = self.extract_category(text, merchant.as_deref());
        let (description, description_from_text) =
            self.extract_description(text, currency, amount);
        let available_balance = self.extract_balance(text);

        let direction_resolved = self.debit_words.is_match(text)
            || self.credit_words.is_match(text)
            || self.card_usage.is_match(text);
        let resolved = [
            true, // amount, by construction
            merchant.is_some(),
            date_from_text,
            direction_resolved,
            card_last_four.is_some() || account_number.is_some(),
            category != Category::Other,
            description_from_text,
        ];
        let confidence =
            resolved.iter().filter(|r| **r).count() as f64 / resolved.len() as f64;

        Some(RawFields {
            amount,
            currency,
            merchant,
            date,
            direction,
            mode,
            category,
            reference_number,
            card_last_four,
            account_number,
            bank_account,
            description,
            available_balance,
            confidence,
        })
    }

    /// First cascade hit whose value sits in `(0.01, 100000]` and does
    /// not overlap a balance phrase.
    fn extract_amount(&self, text: &str, entities: &[ner::Entity]) -> Option<(Decimal, usize)> {
        let balance_spans: Vec<(usize, usize)> = self
            .balance_patterns
            .iter()
            .flat_map(|p| p.find_iter(text).map(|m| (m.start(), m.end())))
            .collect();
        let in_balance =
            |start: usize, end: usize| balance_spans.iter().any(|&(s, e)| start < e && s < end);

        for pattern in &self.amount_patterns {
            for caps in pattern.captures_iter(text) {
                let Some(m) = caps.iter().skip(1).flatten().next() else {
                    continue;
                };
                if in_balance(m.start(), m.end()) {
                    continue;
                }
                if let Some(amount) = parse_amount(m.as_str()) {
                    return Some((amount, m.start()));
                }
            }
        }

        for entity in entities {
            if entity.label != EntityLabel::Money {
                continue;
            }
            let digits: String = entity
                .text
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
                .collect();
            if let Some(amount) = parse_amount(&digits) {
                if let Some(pos) = text.find(entity.text.as_str()) {
                    if !in_balance(pos, pos + entity.text.len()) {
                        return Some((amount, pos));
                    }
                }
            }
        }
        None
    }

    /// Currency from the 40 or so bytes before the amount, then anywhere
    /// in the text, then INR.
    fn infer_currency(&self, text: &str, amount_start: usize) -> Currency {
        let mut window_start = amount_start.saturating_sub(40);
        while window_start > 0 && !text.is_char_boundary(window_start) {
            window_start -= 1;
        }
        let mut window_end = (amount_start + 8).min(text.len());
        while window_end < text.len() && !text.is_char_boundary(window_end) {
            window_end += 1;
        }
        for scope in [&text[window_start..window_end], text] {
            if self.currency_usd.is_match(scope) {
                return Currency::Usd;
            }
            if self.currency_eur.is_match(scope) {
                return Currency::Eur;
            }
            if self.currency_gbp.is_match(scope) {
                return Currency::Gbp;
            }
            if self.currency_inr.is_match(scope) {
                return Currency::Inr;
            }
        }
        Currency::Inr
    }

    fn extract_direction(&self, text: &str) -> Direction {
        if self.debit_words.is_match(text) {
            Direction::Debit
        } else if self.credit_words.is_match(text) {
            Direction::Credit
        } else if self.card_usage.is_match(text) {
            // Paying with a credit card is still money going out.
            Direction::Debit
        } else {
            Direction::Debit
        }
    }

    fn extract_mode(&self, text: &str) -> Mode {
        if self.mode_upi.is_match(text) {
            Mode::Upi
        } else if self.mode_card.is_match(text) {
            Mode::Card
        } else if self.mode_bank.is_match(text) {
            Mode::BankTransfer
        } else if self.mode_wallet.is_match(text) {
            Mode::Upi
        } else {
            Mode::Card
        }
    }

    /// Pattern matches and ORG/PERSON entities are pooled; the most
    /// frequent cleaned candidate wins, earliest-seen breaking ties.
    fn extract_merchant(&self, text: &str, entities: &[ner::Entity]) -> Option<String> {
        let mut candidates: Vec<String> = Vec::new();

        for pattern in &self.merchant_patterns {
            for caps in pattern.captures_iter(text) {
                if let Some(m) = caps.get(1) {
                    if let Some(cleaned) = clean_merchant(m.as_str()) {
                        candidates.push(cleaned);
                    }
                }
            }
        }
        for entity in entities {
            if matches!(entity.label, EntityLabel::Org | EntityLabel::Person) {
                if let Some(cleaned) = clean_merchant(&entity.text) {
                    candidates.push(cleaned);
                }
            }
        }
        if candidates.is_empty() {
            // A bare UPI handle is better than nothing.
            return self
                .vpa_handle
                .find(text)
                .map(|m| m.as_str().to_string());
        }

        let mut best: Option<(&str, usize)> = None;
        for candidate in &candidates {
            let count = candidates.iter().filter(|c| *c == candidate).count();
            match best {
                Some((_, best_count)) if best_count >= count => {}
                _ => best = Some((candidate, count)),
            }
        }
        best.map(|(name, _)| name.to_string())
    }

    /// Returns the date plus whether it came from the text (as opposed
    /// to the current-date fallback).
    fn extract_date(&self, text: &str, entities: &[ner::Entity]) -> (NaiveDate, bool) {
        for pattern in &self.date_patterns {
            for caps in pattern.captures_iter(text) {
                if let Some(date) = caps.get(1).and_then(|m| parse_date(m.as_str())) {
                    return (date, true);
                }
            }
        }
        for entity in entities {
            if entity.label == EntityLabel::Date {
                if let Some(date) = parse_date(&entity.text) {
                    return (date, true);
                }
            }
        }
        (Utc::now().date_naive(), false)
    }

    fn extract_reference(&self, text: &str) -> Option<String> {
        first_capture(&self.reference_patterns, text)
    }

    fn extract_category(&self, text: &str, merchant: Option<&str>) -> Category {
        let haystack = format!("{} {}", merchant.unwrap_or(""), text).to_lowercase();
        for (category, keywords) in &self.categories {
            if keywords.iter().any(|k| haystack.contains(k)) {
                return *category;
            }
        }
        Category::Other
    }

    /// A full sentence carrying both an amount shape and an action verb,
    /// else a synthesized summary. The bool reports which one happened.
    fn extract_description(
        &self,
        text: &str,
        currency: Currency,
        amount: Decimal,
    ) -> (String, bool) {
        for sentence in self.sentence_split.split(text) {
            let sentence = sentence.trim();
            if sentence.len() < 10 || sentence.len() > 200 {
                continue;
            }
            if self.sentence_amount.is_match(sentence) && self.sentence_action.is_match(sentence) {
                return (sentence.to_string(), true);
            }
        }
        (
            format!("Transaction of {}{} processed", currency.symbol(), amount),
            false,
        )
    }

    // Balances are not gated by the transaction-amount range.
    fn extract_balance(&self, text: &str) -> Option<Decimal> {
        for pattern in &self.balance_patterns {
            if let Some(caps) = pattern.captures(text) {
                if let Some(m) = caps.get(1) {
                    if let Ok(balance) = m.as_str().replace(',', "").parse::<Decimal>() {
                        return Some(balance.round_dp(2));
                    }
                }
            }
        }
        None
    }
}

fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p.as_ref()).unwrap())
        .collect()
}

fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(text) {
            if let Some(m) = caps.get(1) {
                return Some(m.as_str().to_string());
            }
        }
    }
    None
}

/// Parse a thousands-separated amount and check the plausibility range
/// for a personal transaction.
fn parse_amount(raw: &str) -> Option<Decimal> {
    let normalized = raw.replace(',', "");
    let amount: Decimal = normalized.parse().ok()?;
    let min: Decimal = MIN_AMOUNT.parse().ok()?;
    let max: Decimal = MAX_AMOUNT.parse().ok()?;
    if amount > min && amount <= max {
        Some(amount.round_dp(2))
    } else {
        None
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 10] = [
        "%d-%m-%Y",
        "%d-%m-%y",
        "%d/%m/%Y",
        "%d/%m/%y",
        "%d %b, %Y",
        "%d %b %Y",
        "%d %B, %Y",
        "%d %B %Y",
        "%b %d, %Y",
        "%B %d, %Y",
    ];
    let raw = raw.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Normalize a merchant candidate: strip dangling connective words and
/// non-name characters, reject generic transaction vocabulary.
fn clean_merchant(raw: &str) -> Option<String> {
    const STOPWORDS: [&str; 12] = [
        "paid",
        "payment",
        "successfully",
        "transaction",
        "reference",
        "account",
        "number",
        "credited",
        "debited",
        "upi",
        "your",
        "dear",
    ];

    let mut cleaned: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || " @.-_&".contains(*c))
        .collect::<String>()
        .trim()
        .to_string();
    for suffix in [" on", " at", " via"] {
        if let Some(stripped) = cleaned.strip_suffix(suffix) {
            cleaned = stripped.trim_end().to_string();
        }
    }
    if cleaned.len() < 2 {
        return None;
    }
    let lowered = cleaned.to_lowercase();
    if lowered
        .split_whitespace()
        .any(|word| STOPWORDS.contains(&word))
    {
        return None;
    }
    Some(cleaned)
}

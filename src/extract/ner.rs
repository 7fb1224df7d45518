//! Rule-and-lexicon entity tagger.
//!
//! A small stand-in for a pretrained NER model: money and date spans are
//! shape-matched, organizations come from a merchant/brand lexicon plus
//! uppercase-run detection, persons from adjacent title-cased word pairs.
//! Built once per process and shared read-only across the pipeline.

use regex::Regex;

use crate::error::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityLabel {
    Money,
    Date,
    Org,
    Person,
}

/// A labeled span of the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
}

pub struct EntityTagger {
    money: Regex,
    date: Regex,
    brand: Regex,
    uppercase_run: Regex,
    titlecase_pair: Regex,
}

impl EntityTagger {
    /// Compile the tagger's patterns. Fails fast on an invalid pattern
    /// so the process never runs with a partially built model.
    pub fn new() -> Result<Self, ModelError> {
        Ok(Self {
            money: Regex::new(
                r"(?:Rs\.?|INR|₹|\$|USD|€|EUR|£|GBP)\s*\d{1,3}(?:,\d{2,3})*(?:\.\d{1,2})?",
            )?,
            date: Regex::new(
                r"(?x)
                \d{1,2}[-/]\d{1,2}[-/]\d{2,4}
                | \d{1,2}\s+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*,?\s+\d{4}
                | (?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+\d{1,2},?\s+\d{4}
                ",
            )?,
            brand: Regex::new(
                r"(?i)\b(?:Amazon|Flipkart|Swiggy|Zomato|Uber|Ola|Netflix|Spotify|Myntra|BigBasket|Blinkit|Zepto|Dominos|McDonalds|Starbucks|Reliance|Jio|Airtel|Vodafone|Paytm|PhonePe|Razorpay|IRCTC|MakeMyTrip|BookMyShow|Netplay|Decathlon)\b",
            )?,
            uppercase_run: Regex::new(r"\b[A-Z][A-Z&]{2,}(?:\s+[A-Z][A-Z&]{2,})*\b")?,
            titlecase_pair: Regex::new(r"\b[A-Z][a-z]{2,}\s+[A-Z][a-z]{2,}\b")?,
        })
    }

    /// Extract labeled entities. Later rules skip spans already claimed
    /// by an earlier rule, so a sum inside a date cannot double-report.
    pub fn tag(&self, text: &str) -> Vec<Entity> {
        let mut entities = Vec::new();
        let mut claimed: Vec<(usize, usize)> = Vec::new();

        let push = |entities: &mut Vec<Entity>,
                    claimed: &mut Vec<(usize, usize)>,
                    start: usize,
                    end: usize,
                    span: &str,
                    label: EntityLabel| {
            if claimed.iter().any(|&(s, e)| start < e && s < end) {
                return;
            }
            claimed.push((start, end));
            entities.push(Entity {
                text: span.to_string(),
                label,
            });
        };

        for m in self.money.find_iter(text) {
            push(
                &mut entities,
                &mut claimed,
                m.start(),
                m.end(),
                m.as_str(),
                EntityLabel::Money,
            );
        }
        for m in self.date.find_iter(text) {
            push(
                &mut entities,
                &mut claimed,
                m.start(),
                m.end(),
                m.as_str(),
                EntityLabel::Date,
            );
        }
        for m in self.brand.find_iter(text) {
            push(
                &mut entities,
                &mut claimed,
                m.start(),
                m.end(),
                m.as_str(),
                EntityLabel::Org,
            );
        }
        for m in self.uppercase_run.find_iter(text) {
            // Currency/mode tokens look like uppercase runs but are not
            // organizations.
            if matches!(
                m.as_str(),
                "INR" | "USD" | "EUR" | "GBP" | "UPI" | "NEFT" | "IMPS" | "RTGS" | "OTP"
            ) {
                continue;
            }
            push(
                &mut entities,
                &mut claimed,
                m.start(),
                m.end(),
                m.as_str(),
                EntityLabel::Org,
            );
        }
        for m in self.titlecase_pair.find_iter(text) {
            push(
                &mut entities,
                &mut claimed,
                m.start(),
                m.end(),
                m.as_str(),
                EntityLabel::Person,
            );
        }

        entities
    }
}

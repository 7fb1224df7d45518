//! finmail — extracts financial-transaction records from email and
//! SMS-style notifications.

pub mod classify;
pub mod config;
pub mod decode;
pub mod error;
pub mod extract;
pub mod mail;
pub mod pipeline;
pub mod record;
pub mod sms;
pub mod store;

//! End-to-end pipeline scenarios: raw provider-shaped messages in,
//! canonical records (or nothing) out, dedup at the store boundary.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rust_decimal_macros::dec;

use finmail::mail::RawMessage;
use finmail::pipeline::Pipeline;
use finmail::record::{Direction, Mode};
use finmail::store::{MemoryStore, TransactionStore};

fn message(id: &str, subject: &str, sender: &str, body: &str) -> RawMessage {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "payload": {
            "mimeType": "text/plain",
            "headers": [
                {"name": "Subject", "value": subject},
                {"name": "From", "value": sender},
            ],
            "body": {"data": URL_SAFE_NO_PAD.encode(body)},
        },
    }))
    .expect("valid message json")
}

fn pipeline() -> Pipeline {
    Pipeline::new().expect("entity model compiles")
}

#[test]
fn upi_debit_alert_extracts_all_core_fields() {
    let record = pipeline()
        .process(&message(
            "m-upi-1",
            "You have done a UPI txn",
            "alerts@hdfcbank.net",
            "Rs.1,500.00 has been debited from account XX1234 on 20-07-2025. \
             UPI reference number is 425692851472.",
        ))
        .expect("transaction record");
    assert_eq!(record.amount, dec!(1500.00));
    assert_eq!(record.credit_or_debit, Direction::Debit);
    assert_eq!(record.mode, Mode::Upi);
    assert_eq!(record.reference_number.as_deref(), Some("425692851472"));
    assert_eq!(record.from_account.as_deref(), Some("1234"));
    assert_eq!(record.to_account, None);
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["date"], "20-07-25");
}

#[test]
fn gateway_receipt_extracts_merchant_and_payment_id() {
    let record = pipeline()
        .process(&message(
            "m-rzp-1",
            "Payment successful",
            "no-reply@razorpay.com",
            "₹210.00 Paid Successfully To: Netplay Payment Id pay_QmX8YS1PDNwFUJ \
             Paid On 28 Jun, 2025",
        ))
        .expect("transaction record");
    assert_eq!(record.amount, dec!(210.00));
    assert_eq!(record.merchant.as_deref(), Some("Netplay"));
    assert_eq!(
        record.reference_number.as_deref(),
        Some("pay_QmX8YS1PDNwFUJ")
    );
    assert_eq!(record.credit_or_debit, Direction::Debit);
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["date"], "28-06-25");
}

#[test]
fn shipping_confirmation_emits_nothing() {
    assert!(pipeline()
        .process(&message(
            "m-amz-1",
            "Your order has shipped",
            "ship-confirm@amazon.in",
            "Your Amazon order has shipped and will arrive Friday",
        ))
        .is_none());
}

#[test]
fn newsletter_emits_nothing() {
    assert!(pipeline()
        .process(&message(
            "m-news-1",
            "Monthly newsletter",
            "news@dealsite.com",
            "Monthly newsletter: save on gas this week",
        ))
        .is_none());
}

#[tokio::test]
async fn second_copy_with_different_id_is_rejected_by_store() {
    let p = pipeline();
    let body = "Rs.750.00 has been debited from account XX5678 on 11-08-2025. \
                UPI reference number is 909090909090.";
    let first = p
        .process(&message("m-dup-a", "UPI txn", "alerts@hdfcbank.net", body))
        .unwrap();
    let second = p
        .process(&message("m-dup-b", "UPI txn", "alerts@hdfcbank.net", body))
        .unwrap();
    assert_ne!(first.id, second.id);

    let store = MemoryStore::new();
    assert!(store.store_if_new("u", &first).await.unwrap().stored());
    assert!(!store.store_if_new("u", &second).await.unwrap().stored());
}

#[tokio::test]
async fn same_id_stored_twice_is_rejected() {
    let p = pipeline();
    let record = p
        .process(&message(
            "m-same",
            "UPI txn",
            "alerts@hdfcbank.net",
            "Rs.80.00 has been debited from account XX1111 on 02-08-2025. \
             UPI reference number is 123123123123.",
        ))
        .unwrap();
    let store = MemoryStore::new();
    assert!(store.store_if_new("u", &record).await.unwrap().stored());
    assert!(!store.store_if_new("u", &record).await.unwrap().stored());
}

#[test]
fn records_respect_amount_range_and_account_exclusivity() {
    let p = pipeline();
    let bodies = [
        "Rs.1,500.00 has been debited from your HDFC Bank account on 20-07-2025. \
         UPI reference number is 425692851472.",
        "Rs.2,000.00 credited to your account. Received Rs.2,000 from Rahul Sharma \
         via IMPS on 05-06-2025. ICICI Bank reference number is 777888999000.",
    ];
    for (i, body) in bodies.iter().enumerate() {
        let record = p
            .process(&message(
                &format!("m-inv-{i}"),
                "Transaction alert",
                "alerts@hdfcbank.net",
                body,
            ))
            .expect("transaction record");
        assert!(record.amount > dec!(0.01) && record.amount <= dec!(100000));
        assert!(
            record.from_account.is_some() != record.to_account.is_some()
                || (record.from_account.is_none() && record.to_account.is_none())
        );
        match record.credit_or_debit {
            Direction::Debit => assert!(record.to_account.is_none()),
            Direction::Credit => assert!(record.from_account.is_none()),
        }
    }
}

#[test]
fn html_body_is_decoded_before_extraction() {
    let html = "<html><head><style>.x{color:red}</style></head><body>\
                <p>Rs.320.00 has been debited from account XX4321 on 15-08-2025.</p>\
                <p>UPI reference number is 555566667777.</p></body></html>";
    let record = pipeline()
        .process(&message(
            "m-html-1",
            "Transaction alert",
            "alerts@axisbank.com",
            html,
        ))
        .expect("transaction record");
    assert_eq!(record.amount, dec!(320.00));
    assert_eq!(record.reference_number.as_deref(), Some("555566667777"));
}

#[test]
fn multipart_message_uses_all_parts() {
    let plain = "See the details below.";
    let html = "<p>₹99.00 Paid Successfully To: Decathlon Payment Id pay_Ab12Cd34Ef56 \
                Paid On 3 Aug, 2025</p>";
    let raw: RawMessage = serde_json::from_value(serde_json::json!({
        "id": "m-multi-1",
        "payload": {
            "mimeType": "multipart/alternative",
            "headers": [
                {"name": "Subject", "value": "Payment successful"},
                {"name": "From", "value": "no-reply@razorpay.com"},
            ],
            "parts": [
                {
                    "mimeType": "text/plain",
                    "body": {"data": URL_SAFE_NO_PAD.encode(plain)},
                },
                {
                    "mimeType": "text/html",
                    "body": {"data": URL_SAFE_NO_PAD.encode(html)},
                },
            ],
        },
    }))
    .unwrap();
    let record = pipeline().process(&raw).expect("transaction record");
    assert_eq!(record.amount, dec!(99.00));
    assert_eq!(record.merchant.as_deref(), Some("Decathlon"));
}

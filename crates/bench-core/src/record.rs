//! Synthetic transaction records.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transaction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Completed,
    Pending,
    Failed,
    Refunded,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Completed,
        Status::Pending,
        Status::Failed,
        Status::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Completed => "completed",
            Status::Pending => "pending",
            Status::Failed => "failed",
            Status::Refunded => "refunded",
        }
    }
}

/// Payment method used for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
    BankTransfer,
    Crypto,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::Paypal,
        PaymentMethod::BankTransfer,
        PaymentMethod::Crypto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Crypto => "crypto",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    Mobile,
    Desktop,
    Tablet,
}

impl Device {
    pub const ALL: [Device; 3] = [Device::Mobile, Device::Desktop, Device::Tablet];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Browser {
    Chrome,
    Firefox,
    Safari,
    Edge,
}

impl Browser {
    pub const ALL: [Browser; 4] = [
        Browser::Chrome,
        Browser::Firefox,
        Browser::Safari,
        Browser::Edge,
    ];
}

/// Where the customer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficSource {
    Direct,
    Organic,
    Referral,
    Social,
    Email,
}

impl TrafficSource {
    pub const ALL: [TrafficSource; 5] = [
        TrafficSource::Direct,
        TrafficSource::Organic,
        TrafficSource::Referral,
        TrafficSource::Social,
        TrafficSource::Email,
    ];
}

/// Nested metadata stored as JSON by the backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub device: Device,
    pub browser: Browser,
    pub source: TrafficSource,
}

/// One fake transaction, created fresh for every insert and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticRecord {
    pub id: Uuid,
    pub user_id: i32,
    pub product_id: i32,
    pub transaction_date: NaiveDateTime,
    /// Two decimal places, within [1.00, 1000.00].
    pub amount: Decimal,
    pub status: Status,
    pub payment_method: PaymentMethod,
    pub customer_name: String,
    pub email: String,
    pub shipping_address: String,
    pub metadata: RecordMetadata,
}

impl SyntheticRecord {
    pub fn metadata_json(&self) -> serde_json::Value {
        serde_json::to_value(self.metadata).unwrap_or(serde_json::Value::Null)
    }
}

/// A row of the join benchmark's business table.
///
/// The indexed columns stay flat; everything else travels in `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub id: Uuid,
    pub partition_key: String,
    pub transaction_date: NaiveDateTime,
    pub amount: Decimal,
    pub status: Status,
    pub payload: serde_json::Value,
}

impl BusinessRecord {
    /// Reshape a synthetic record into a business row of `partition_key`.
    pub fn from_record(record: SyntheticRecord, partition_key: impl Into<String>) -> Self {
        let payload = serde_json::json!({
            "user_id": record.user_id,
            "product_id": record.product_id,
            "customer_name": record.customer_name,
            "email": record.email,
            "shipping_address": record.shipping_address,
            "payment_method": record.payment_method,
            "metadata": record.metadata,
        });

        Self {
            id: record.id,
            partition_key: partition_key.into(),
            transaction_date: record.transaction_date,
            amount: record.amount,
            status: record.status,
            payload,
        }
    }
}

/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Data layer - domain models shared across endpoints
[UPDATE]: When API schema changes or new types added
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier that the API serves as either a number or a string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(u64),
    Text(String),
}

/// Pi Network user as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pi_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pi_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    pub balance: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PiUser {
    /// Shallow-merge a refreshed copy over this one
    ///
    /// Required fields always take the updated value; optional fields keep
    /// the cached value when the update omits them.
    pub fn merge(&mut self, update: PiUser) {
        if update.id.is_some() {
            self.id = update.id;
        }
        self.username = update.username;
        if update.pi_username.is_some() {
            self.pi_username = update.pi_username;
        }
        if update.pi_uid.is_some() {
            self.pi_uid = update.pi_uid;
        }
        if update.wallet_address.is_some() {
            self.wallet_address = update.wallet_address;
        }
        self.balance = update.balance;
        if update.name.is_some() {
            self.name = update.name;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Payment,
    Withdrawal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    /// Query-string value for transaction filters
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

/// Application the transaction belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRef {
    pub id: ResourceId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: ResourceId,
    pub transaction_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<ApplicationRef>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u32,
    pub per_page: u32,
    pub current_page: u32,
    pub last_page: u32,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionStats {
    pub total_amount: Decimal,
    pub total_transactions: u32,
    pub completed_count: u32,
    pub pending_count: u32,
    pub failed_count: u32,
}

/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust request structs with serialization support
[POS]:    Data layer - request bodies and query filters
[UPDATE]: When API schema changes or new types added
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::models::TransactionStatus;

/// Body for POST /api/auth/pi-login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub application_id: String,
    pub scopes: String,
    pub callback_url: String,
}

/// Body for POST /api/secure/auth/validate-callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateCallbackRequest {
    pub api_key: String,
    pub callback_token: String,
    pub signature: String,
    pub timestamp: i64,
}

/// Body for POST /api/app/user-details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetailsRequest {
    pub token: String,
    pub application_id: String,
}

/// Body for POST /api/app/make-payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub token: String,
    pub application_id: String,
    pub amount: Decimal,
    pub memo: String,
}

/// Query filters for GET /api/user/transactions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilters {
    pub status: Option<TransactionStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl TransactionFilters {
    /// Render the filters as query-string pairs, skipping unset fields
    pub(crate) fn to_query(&self) -> Vec<String> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(format!("status={}", status.as_str()));
        }
        if let Some(page) = self.page {
            params.push(format!("page={page}"));
        }
        if let Some(per_page) = self.per_page {
            params.push(format!("per_page={per_page}"));
        }
        params
    }
}

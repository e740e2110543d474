//! Wire types for the ledger backend API.
//!
//! Field names mirror the backend's JSON exactly. Timestamps are carried
//! as the backend's formatted strings; the client does not reinterpret
//! them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// Standard response envelope: `{"code":200,"message":"ok","data":...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

/// Envelope code indicating success.
pub const API_SUCCESS: i64 = 200;

impl<T> ApiResponse<T> {
    /// Check the envelope code without consuming the payload.
    pub fn is_success(&self) -> bool {
        self.code == API_SUCCESS
    }

    /// Unwrap the payload, converting a failure code into an error.
    pub fn into_data(self) -> Result<T, ClientError> {
        if !self.is_success() {
            return Err(ClientError::Api {
                code: self.code,
                message: self.message,
            });
        }
        self.data.ok_or(ClientError::Api {
            code: self.code,
            message: "missing response data".to_string(),
        })
    }

    /// Discard the payload, keeping only the success/failure outcome.
    pub fn into_unit(self) -> Result<(), ClientError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(ClientError::Api {
                code: self.code,
                message: self.message,
            })
        }
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_info: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub expense_time: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateExpenseRequest {
    pub amount: f64,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub expense_time: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateExpenseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Income {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    #[serde(rename = "type")]
    pub income_type: String,
    pub income_time: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateIncomeRequest {
    pub amount: f64,
    #[serde(rename = "type")]
    pub income_type: String,
    pub income_time: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateIncomeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub income_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseCategory {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Aggregate income/expense totals over a date range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncomeExpenseSummary {
    pub total_income: f64,
    pub total_expense: f64,
}

/// An AI model configured on the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiModel {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Request body for the streaming chat endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AiChatRequest {
    pub model_id: i64,
    pub message: String,
}

/// Request body for the streaming analysis endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub model_id: i64,
    pub start_time: String,
    pub end_time: String,
}

/// One saved chat exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistoryItem {
    pub id: i64,
    #[serde(default)]
    pub user_text: Option<String>,
    #[serde(default)]
    pub ai_text: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One saved analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisHistoryItem {
    pub id: i64,
    #[serde(default)]
    pub ai_text: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Filters for expense listings.
#[derive(Debug, Clone, Default)]
pub struct ExpenseListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub category: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Filters for income listings.
#[derive(Debug, Clone, Default)]
pub struct IncomeListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub income_type: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Date range for the statistics summary.
#[derive(Debug, Clone, Default)]
pub struct SummaryQuery {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Paging for history listings.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    pub model_id: i64,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

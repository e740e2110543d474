//! Typed API client for the ledger backend.
//!
//! Thin wrappers over the [`HttpClient`] seam for the ordinary CRUD
//! endpoints, plus entry points into the streaming decoder for the AI
//! endpoints. Every request carries the stored bearer token; a 401
//! response clears the credentials and routes the session to login, the
//! same way the streaming path does.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::{
    AiChatRequest, AiModel, AnalysisHistoryItem, AnalysisRequest, ApiResponse, ChatHistoryItem,
    CreateExpenseRequest, CreateIncomeRequest, Expense, ExpenseCategory, ExpenseListQuery,
    HistoryQuery, Income, IncomeExpenseSummary, IncomeListQuery, LoginRequest, LoginResponse,
    PageResponse, RegisterRequest, SummaryQuery, UpdateExpenseRequest, UpdateIncomeRequest, User,
};
use crate::stream::{CancelHandle, StreamDecoder, StreamHandlers};
use crate::traits::{CredentialsProvider, Headers, HttpClient, Response, SessionNavigator};

/// Client for the ledger backend API.
pub struct ApiClient<H, C, N> {
    config: Config,
    http: Arc<H>,
    credentials: Arc<C>,
    navigator: Arc<N>,
    decoder: StreamDecoder<H, C, N>,
}

impl<H, C, N> ApiClient<H, C, N>
where
    H: HttpClient + 'static,
    C: CredentialsProvider + 'static,
    N: SessionNavigator + 'static,
{
    pub fn new(config: Config, http: Arc<H>, credentials: Arc<C>, navigator: Arc<N>) -> Self {
        let decoder = StreamDecoder::new(
            config.clone(),
            Arc::clone(&http),
            Arc::clone(&credentials),
            Arc::clone(&navigator),
        );
        Self {
            config,
            http,
            credentials,
            navigator,
            decoder,
        }
    }

    /// The configured backend origin.
    pub fn config(&self) -> &Config {
        &self.config
    }

    // Auth

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.post_json("/auth/login", request).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        self.post_json("/auth/register", request).await
    }

    pub async fn get_profile(&self) -> Result<User> {
        self.get_json("/auth/profile").await
    }

    // Expenses

    pub async fn list_expenses(&self, query: &ExpenseListQuery) -> Result<PageResponse<Expense>> {
        let qs = query_string(&[
            ("page", query.page.map(|v| v.to_string())),
            ("page_size", query.page_size.map(|v| v.to_string())),
            ("category", query.category.clone()),
            ("start_time", query.start_time.clone()),
            ("end_time", query.end_time.clone()),
        ]);
        self.get_json(&format!("/expenses{}", qs)).await
    }

    pub async fn get_expense(&self, id: i64) -> Result<Expense> {
        self.get_json(&format!("/expenses/{}", id)).await
    }

    pub async fn create_expense(&self, request: &CreateExpenseRequest) -> Result<Expense> {
        self.post_json("/expenses", request).await
    }

    pub async fn update_expense(
        &self,
        id: i64,
        request: &UpdateExpenseRequest,
    ) -> Result<Expense> {
        self.put_json(&format!("/expenses/{}", id), request).await
    }

    pub async fn delete_expense(&self, id: i64) -> Result<()> {
        self.delete_unit(&format!("/expenses/{}", id)).await
    }

    // Incomes

    pub async fn list_incomes(&self, query: &IncomeListQuery) -> Result<PageResponse<Income>> {
        let qs = query_string(&[
            ("page", query.page.map(|v| v.to_string())),
            ("page_size", query.page_size.map(|v| v.to_string())),
            ("type", query.income_type.clone()),
            ("start_time", query.start_time.clone()),
            ("end_time", query.end_time.clone()),
        ]);
        self.get_json(&format!("/incomes{}", qs)).await
    }

    pub async fn get_income(&self, id: i64) -> Result<Income> {
        self.get_json(&format!("/incomes/{}", id)).await
    }

    pub async fn create_income(&self, request: &CreateIncomeRequest) -> Result<Income> {
        self.post_json("/incomes", request).await
    }

    pub async fn update_income(&self, id: i64, request: &UpdateIncomeRequest) -> Result<Income> {
        self.put_json(&format!("/incomes/{}", id), request).await
    }

    pub async fn delete_income(&self, id: i64) -> Result<()> {
        self.delete_unit(&format!("/incomes/{}", id)).await
    }

    // Categories and statistics

    pub async fn list_categories(&self) -> Result<Vec<ExpenseCategory>> {
        self.get_json("/categories").await
    }

    pub async fn summary(&self, query: &SummaryQuery) -> Result<IncomeExpenseSummary> {
        let qs = query_string(&[
            ("start_time", query.start_time.clone()),
            ("end_time", query.end_time.clone()),
        ]);
        self.get_json(&format!("/statistics/summary{}", qs)).await
    }

    // AI

    pub async fn list_ai_models(&self) -> Result<Vec<AiModel>> {
        self.get_json("/ai-models").await
    }

    /// Start a streaming chat exchange. See [`StreamDecoder::start`].
    pub fn stream_chat(&self, request: &AiChatRequest, handlers: StreamHandlers) -> CancelHandle {
        self.decoder.start("/ai-chat", request, handlers)
    }

    /// Start a streaming spending-analysis exchange.
    pub fn stream_analysis(
        &self,
        request: &AnalysisRequest,
        handlers: StreamHandlers,
    ) -> CancelHandle {
        self.decoder.start("/ai-analysis", request, handlers)
    }

    pub async fn chat_history(&self, query: &HistoryQuery) -> Result<PageResponse<ChatHistoryItem>> {
        let qs = history_query_string(query);
        self.get_json(&format!("/ai-chat/history{}", qs)).await
    }

    pub async fn delete_chat_history(&self, id: i64) -> Result<()> {
        self.delete_unit(&format!("/ai-chat/history/{}", id)).await
    }

    pub async fn analysis_history(
        &self,
        query: &HistoryQuery,
    ) -> Result<PageResponse<AnalysisHistoryItem>> {
        let qs = history_query_string(query);
        self.get_json(&format!("/ai-analysis/history{}", qs)).await
    }

    pub async fn delete_analysis_history(&self, id: i64) -> Result<()> {
        self.delete_unit(&format!("/ai-analysis/history/{}", id))
            .await
    }

    // Request plumbing

    async fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        match self.credentials.load().await {
            Ok(Some(creds)) => {
                if let Some(token) = creds.token {
                    headers.insert("Authorization".to_string(), format!("Bearer {}", token));
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read stored credentials"),
        }
        headers
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.config.api_url(path);
        let response = self.http.get(&url, &self.headers().await).await?;
        self.unwrap_envelope(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.config.api_url(path);
        let body = serde_json::to_string(body)?;
        let response = self.http.post(&url, &body, &self.headers().await).await?;
        self.unwrap_envelope(response).await
    }

    async fn put_json<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.config.api_url(path);
        let body = serde_json::to_string(body)?;
        let response = self.http.put(&url, &body, &self.headers().await).await?;
        self.unwrap_envelope(response).await
    }

    async fn delete_unit(&self, path: &str) -> Result<()> {
        let url = self.config.api_url(path);
        let response = self.http.delete(&url, &self.headers().await).await?;
        self.check_session(&response).await?;
        let envelope: ApiResponse = response.json()?;
        envelope.into_unit()
    }

    async fn unwrap_envelope<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        self.check_session(&response).await?;
        let envelope: ApiResponse<T> = response.json()?;
        envelope.into_data()
    }

    /// Shared 401 interceptor: clear credentials and abandon the session.
    async fn check_session(&self, response: &Response) -> Result<()> {
        if response.status == 401 {
            warn!("credential rejected, redirecting to login");
            if let Err(e) = self.credentials.clear().await {
                warn!(error = %e, "failed to clear rejected credentials");
            }
            self.navigator.go_to_login();
            return Err(ClientError::Unauthorized);
        }
        if !response.is_success() {
            return Err(ClientError::Server {
                status: response.status,
                message: response.text().unwrap_or_default(),
            });
        }
        Ok(())
    }
}

/// Build a query string from optional parameters, URL-encoding values.
fn query_string(params: &[(&str, Option<String>)]) -> String {
    let parts: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .map(|v| format!("{}={}", key, urlencoding::encode(v)))
        })
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

fn history_query_string(query: &HistoryQuery) -> String {
    query_string(&[
        ("model_id", Some(query.model_id.to_string())),
        ("page", query.page.map(|v| v.to_string())),
        ("page_size", query.page_size.map(|v| v.to_string())),
    ])
}

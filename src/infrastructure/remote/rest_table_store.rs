use crate::application::ports::{RemoteQuery, RemoteTableStore, SortDirection};
use crate::domain::entities::{PendingChange, Record};
use crate::domain::value_objects::ChangeOperation;
use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Client for a PostgREST-style table API (`/rest/v1/{table}`).
#[derive(Clone)]
pub struct RestTableStore {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl RestTableStore {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Err(AppError::ConfigurationError(
                "Remote base URL is empty".to_string(),
            ));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|value| !value.trim().is_empty()),
            http,
        })
    }

    /// `None` when no remote URL is configured.
    pub fn from_config(config: &RemoteConfig) -> Result<Option<Self>, AppError> {
        match &config.base_url {
            Some(url) => Self::new(
                url.clone(),
                config.api_key.clone(),
                Duration::from_secs(config.timeout_secs),
            )
            .map(Some),
            None => Ok(None),
        }
    }

    fn request(&self, method: Method, table: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        let builder = self.http.request(method, url);
        if let Some(key) = &self.api_key {
            builder
                .header("apikey", key)
                .header("Authorization", format!("Bearer {key}"))
        } else {
            builder
        }
    }
}

/// Query string pairs for a select.
fn query_params(query: &RemoteQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), query.projection().to_string())];
    for (column, value) in query.filters() {
        params.push((column.clone(), filter_expression(value)));
    }
    if let Some((column, direction)) = query.order() {
        let suffix = match direction {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        };
        params.push(("order".to_string(), format!("{column}.{suffix}")));
    }
    params
}

fn filter_expression(value: &Value) -> String {
    match value {
        Value::Null => "is.null".to_string(),
        Value::String(s) => format!("eq.{s}"),
        other => format!("eq.{other}"),
    }
}

async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = resp.status();
    if status.is_success() || status == StatusCode::NOT_MODIFIED {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(AppError::Remote(format!("{status} - {body}")))
}

#[async_trait]
impl RemoteTableStore for RestTableStore {
    async fn select(&self, table: &str, query: &RemoteQuery) -> Result<Vec<Record>, AppError> {
        let resp = self
            .request(Method::GET, table)
            .query(&query_params(query))
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        let rows: Vec<Record> = resp
            .json()
            .await
            .map_err(|err| AppError::Remote(format!("Unexpected response for {table}: {err}")))?;
        debug!(table = %table, rows = rows.len(), "Remote select");
        Ok(rows)
    }

    async fn apply_change(&self, change: &PendingChange) -> Result<(), AppError> {
        let table = change.table_name.as_str();
        let id_filter = [("id", filter_expression(&Value::String(change.record_id.clone())))];
        let builder = match change.operation {
            ChangeOperation::Insert => self
                .request(Method::POST, table)
                .header("Prefer", "resolution=merge-duplicates")
                .json(&change.data),
            ChangeOperation::Update => self
                .request(Method::PATCH, table)
                .query(&id_filter)
                .json(&change.data),
            ChangeOperation::Delete => self.request(Method::DELETE, table).query(&id_filter),
        };
        ensure_success(builder.send().await?).await?;
        debug!(id = %change.id, "Pending change pushed");
        Ok(())
    }
}

use crate::domain::entities::{PendingChange, Record};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A filtered select against the remote table API.
///
/// `select` takes the remote projection syntax, including embedded relations,
/// e.g. `*, printer_assignments(*, clients(*))`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteQuery {
    select: String,
    filters: Vec<(String, Value)>,
    order: Option<(String, SortDirection)>,
}

impl Default for RemoteQuery {
    fn default() -> Self {
        Self {
            select: "*".to_string(),
            filters: Vec::new(),
            order: None,
        }
    }
}

impl RemoteQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = columns.into();
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order = Some((column.into(), direction));
        self
    }

    pub fn projection(&self) -> &str {
        &self.select
    }

    pub fn filters(&self) -> &[(String, Value)] {
        &self.filters
    }

    pub fn order(&self) -> Option<&(String, SortDirection)> {
        self.order.as_ref()
    }
}

/// Network table API the mirror is populated from.
#[async_trait]
pub trait RemoteTableStore: Send + Sync {
    async fn select(&self, table: &str, query: &RemoteQuery) -> Result<Vec<Record>, AppError>;
    /// Pushes one queued local write to the server.
    async fn apply_change(&self, change: &PendingChange) -> Result<(), AppError>;
}

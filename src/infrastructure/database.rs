// Entity Store Interface - whole-document persistence for forum aggregates
// Documents are opaque JSON values keyed by (collection, id); there are no
// partial-field updates and no cross-document transactions.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{AppError, AppResult};

/// Equality filter over top-level document fields. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    equals: Vec<(String, Value)>,
}

impl DocumentFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.equals
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected))
    }
}

/// Low-level store contract. Implementations return documents in insertion order.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Value>>;

    /// Insert or replace the whole document.
    async fn save_whole(&self, collection: &str, id: &str, document: Value) -> AppResult<()>;

    /// Returns false when nothing was stored under `id`.
    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool>;

    async fn find_all(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        skip: usize,
        limit: Option<usize>,
    ) -> AppResult<Vec<Value>>;

    /// Release connections. Called once during server shutdown.
    async fn close(&self);
}

/// A typed aggregate stored as one document.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;
    /// Name used in NotFound errors.
    const KIND: &'static str;

    fn id(&self) -> &str;
}

/// 1-based page request, translated to skip/limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default = "PageRequest::default_page")]
    pub page: usize,
    #[serde(default = "PageRequest::default_limit")]
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: Self::default_page(),
            limit: Self::default_limit(),
        }
    }
}

impl PageRequest {
    pub const MAX_LIMIT: usize = 100;

    fn default_page() -> usize {
        1
    }

    fn default_limit() -> usize {
        20
    }

    pub fn limit(&self) -> usize {
        self.limit.clamp(1, Self::MAX_LIMIT)
    }

    pub fn skip(&self) -> usize {
        self.page.max(1).saturating_sub(1).saturating_mul(self.limit())
    }
}

/// Typed access to an `EntityStore`.
#[derive(Clone)]
pub struct DocumentRepository {
    store: Arc<dyn EntityStore>,
}

impl DocumentRepository {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    pub async fn find<D: Document>(&self, id: &str) -> AppResult<Option<D>> {
        match self.store.get(D::COLLECTION, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn get<D: Document>(&self, id: &str) -> AppResult<D> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(D::KIND.to_string()))
    }

    pub async fn save<D: Document>(&self, document: &D) -> AppResult<()> {
        let value = serde_json::to_value(document)?;
        self.store.save_whole(D::COLLECTION, document.id(), value).await
    }

    /// Deletes the document, failing with NotFound if it was absent.
    pub async fn delete<D: Document>(&self, id: &str) -> AppResult<()> {
        if self.store.delete(D::COLLECTION, id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(D::KIND.to_string()))
        }
    }

    pub async fn find_all<D: Document>(
        &self,
        filter: &DocumentFilter,
        skip: usize,
        limit: Option<usize>,
    ) -> AppResult<Vec<D>> {
        self.store
            .find_all(D::COLLECTION, filter, skip, limit)
            .await?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(AppError::from))
            .collect()
    }

    pub async fn page<D: Document>(&self, filter: &DocumentFilter, page: PageRequest) -> AppResult<Vec<D>> {
        self.find_all(filter, page.skip(), Some(page.limit())).await
    }
}

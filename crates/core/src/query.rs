//! List query parameters and the paginated list envelope.
//!
//! Admin list endpoints accept `page`, `limit`, `search` and a handful of
//! field filters. Responses come back either as a bare array or wrapped in
//! an object with a pagination block; [`decode_list_page`] accepts both.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default number of rows per page.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Maximum number of rows per page.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Envelope keys tried, in order, when looking for the item array.
const ENVELOPE_KEYS: &[&str] = &["data", "items"];

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided page number to 1 or more.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Filters, search and pagination for a list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub is_active: Option<bool>,
    pub category: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn sort(mut self, sort_by: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = Some(order);
        self
    }

    /// Query-string pairs in a stable order. Unset and blank values are
    /// omitted; `page` and `limit` are clamped when present.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if self.page.is_some() {
            pairs.push(("page", clamp_page(self.page).to_string()));
        }
        if self.limit.is_some() {
            pairs.push((
                "limit",
                clamp_limit(self.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT).to_string(),
            ));
        }

        let text_filters = [
            ("search", &self.search),
            ("status", &self.status),
            ("category", &self.category),
            ("sortBy", &self.sort_by),
        ];
        for (key, value) in text_filters {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((key, v.to_string()));
            }
        }

        if let Some(active) = self.is_active {
            pairs.push(("isActive", active.to_string()));
        }
        if let Some(order) = self.sort_order {
            pairs.push(("sortOrder", order.as_str().to_string()));
        }

        pairs
    }
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(default)]
    pub total_pages: i64,
}

/// One page of a list response.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

/// Decode a list response body.
///
/// Accepts a bare array, or an object holding the array under `data`,
/// `items` or `resource_key` (e.g. `"convocatorias"`), optionally with a
/// `pagination` object.
pub fn decode_list_page<T: DeserializeOwned>(
    body: serde_json::Value,
    resource_key: &str,
) -> Result<ListPage<T>, CoreError> {
    let (items, pagination) = match body {
        serde_json::Value::Array(items) => (items, None),
        serde_json::Value::Object(mut obj) => {
            let items = ENVELOPE_KEYS
                .iter()
                .copied()
                .chain(std::iter::once(resource_key))
                .find_map(|key| match obj.remove(key) {
                    Some(serde_json::Value::Array(items)) => Some(items),
                    _ => None,
                })
                .ok_or_else(|| {
                    CoreError::Validation(format!(
                        "List response has no item array (looked for data, items, {resource_key})"
                    ))
                })?;
            let pagination = match obj.remove("pagination") {
                Some(p) if !p.is_null() => Some(serde_json::from_value(p).map_err(|e| {
                    CoreError::Validation(format!("Malformed pagination block: {e}"))
                })?),
                _ => None,
            };
            (items, pagination)
        }
        other => {
            return Err(CoreError::Validation(format!(
                "List response must be an array or object, got {other}"
            )))
        }
    };

    let items = items
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| CoreError::Validation(format!("Malformed list item: {e}")))?;

    Ok(ListPage { items, pagination })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

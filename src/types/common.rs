//! Types shared by every EKDSend resource.

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::DEFAULT_LIST_LIMIT;

/// Reads an explicit `null` as the field's default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Envelope wrapping single-resource responses: `{"data": T}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataEnvelope<T> {
    /// The wrapped resource.
    pub data: T,
}

/// A page of results from a list endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct PaginatedResponse<T> {
    /// Items on this page. A `null` list reads as empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<T>,
    /// Total number of items across all pages.
    #[serde(default)]
    pub total: u64,
    /// Page size used for this request.
    #[serde(default)]
    pub limit: u64,
    /// Offset of the first item on this page.
    #[serde(default)]
    pub offset: u64,
}

impl<T> PaginatedResponse<T> {
    /// Returns true if there are more pages after this one.
    pub fn has_more(&self) -> bool {
        self.next_offset() < self.total
    }

    /// Returns the offset for the next page.
    pub fn next_offset(&self) -> u64 {
        self.offset.saturating_add(self.limit)
    }

    /// Returns the number of items on this page.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if this page has no items.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns an iterator over the items on this page.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }
}

impl<T> IntoIterator for PaginatedResponse<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

/// Filters and paging for SMS and call listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// Page size.
    pub limit: u32,
    /// Number of items to skip.
    pub offset: u32,
    /// Only return items with this status.
    pub status: Option<String>,
    /// Only return items created on or after this date.
    pub from_date: Option<String>,
    /// Only return items created on or before this date.
    pub to_date: Option<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
            status: None,
            from_date: None,
            to_date: None,
        }
    }
}

impl ListParams {
    /// Creates parameters for the first page with the default size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the offset.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Filters by status.
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Filters by earliest creation date.
    pub fn from_date(mut self, date: impl Into<String>) -> Self {
        self.from_date = Some(date.into());
        self
    }

    /// Filters by latest creation date.
    pub fn to_date(mut self, date: impl Into<String>) -> Self {
        self.to_date = Some(date.into());
        self
    }

    /// Builds the query pairs; empty filters are omitted.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];

        let filters = [
            ("status", &self.status),
            ("from_date", &self.from_date),
            ("to_date", &self.to_date),
        ];
        for (name, value) in filters {
            if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
                query.push((name, value.clone()));
            }
        }

        query
    }
}

//! Query projection
//!
//! Builds equality-predicate searches with simple pagination over entity
//! collections (wallets, wallet transactions, treasure transactions) and
//! streams matches into a JSON array. Independent of the balance engine.

use crate::{error::Result, store::Store, types::DocType};
use serde_json::Value;

/// Matches returned when no page is requested
pub const DEFAULT_LIMIT: usize = 10;

/// One page of search results: 1-based page number and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number
    pub page: u64,
    /// Matches per page
    pub page_size: u64,
}

impl Page {
    /// Skip/limit pair for this page
    pub fn skip_limit(&self) -> (usize, usize) {
        let skip = self.page.saturating_sub(1).saturating_mul(self.page_size);
        (skip as usize, self.page_size as usize)
    }
}

/// Run an equality-predicate search over one document type.
pub fn search(
    store: &Store,
    doc_type: DocType,
    filter: Option<&serde_json::Map<String, Value>>,
    page: Option<Page>,
) -> Result<Vec<Value>> {
    let (skip, limit) = page.map(|p| p.skip_limit()).unwrap_or((0, DEFAULT_LIMIT));

    tracing::debug!(%doc_type, skip, limit, "Running search");

    store.query_by_doc_type(doc_type, filter, skip, limit)
}

/// Serialize matches into a JSON array payload.
pub fn to_json_array(docs: &[Value]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(docs)?)
}

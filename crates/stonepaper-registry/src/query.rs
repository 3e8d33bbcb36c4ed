use std::sync::Arc;

use stonepaper_store::{QueryResult, RichQuery, Selector};
use stonepaper_types::{DocHash, DocumentRecord, RECORD_TYPE};
use tracing::debug;

use crate::args::parse_lookup;
use crate::error::{RegistryError, RegistryResult};

/// Selector-based document lookup.
///
/// Builds a selector on the record-type tag and `docHash` and hands it to the
/// rich-query engine. The engine matches on field name and JSON type, so the
/// selector fields mirror the record encoding exactly.
#[derive(Clone)]
pub struct QueryExecutor {
    engine: Arc<dyn RichQuery>,
}

impl QueryExecutor {
    pub fn new(engine: Arc<dyn RichQuery>) -> Self {
        Self { engine }
    }

    /// The selector matching the record registered under `hash`.
    pub fn selector_for(hash: &DocHash) -> Selector {
        Selector::new()
            .field_eq("docType", RECORD_TYPE)
            .field_eq("docHash", hash.as_str())
    }

    /// `getDoc` (selector form): returns the raw serialized result set.
    ///
    /// An unregistered hash yields an empty result set, not an error.
    pub fn get_doc(&self, args: &[String]) -> RegistryResult<Vec<u8>> {
        let hash = parse_lookup(args)?;
        self.run(&hash)
    }

    /// Typed lookup: decode every matching record.
    pub fn find(&self, hash: &DocHash) -> RegistryResult<Vec<DocumentRecord>> {
        let raw = self.run(hash)?;
        let rows = QueryResult::decode_set(&raw).map_err(RegistryError::Query)?;
        rows.into_iter()
            .map(|row| Ok(DocumentRecord::from_json_value(row.record)?))
            .collect()
    }

    fn run(&self, hash: &DocHash) -> RegistryResult<Vec<u8>> {
        let query = Self::selector_for(hash)
            .to_query_string()
            .map_err(RegistryError::Query)?;
        debug!(hash = %hash.short(), "executing selector lookup");
        self.engine.query(&query).map_err(RegistryError::Query)
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor").finish_non_exhaustive()
    }
}

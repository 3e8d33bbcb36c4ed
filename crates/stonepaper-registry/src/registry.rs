use std::sync::Arc;

use stonepaper_identity::{IdentityProvider, IdentityResolver};
use stonepaper_store::{RichQuery, StateStore};
use stonepaper_types::{DocHash, DocumentRecord, Timestamp};
use tracing::{debug, warn};

use crate::args::{parse_lookup, CreateDocArgs};
use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::query::QueryExecutor;

/// The document registry service.
///
/// Holds the injected ledger collaborators for one invocation context and
/// owns the create/read workflow. Every mutation path validates its
/// arguments completely before touching the store.
pub struct Registry {
    store: Arc<dyn StateStore>,
    query: QueryExecutor,
    identity: Arc<dyn IdentityProvider>,
    resolver: IdentityResolver,
    config: RegistryConfig,
}

impl Registry {
    /// Create a registry over the given collaborators.
    pub fn new(
        store: Arc<dyn StateStore>,
        query: Arc<dyn RichQuery>,
        identity: Arc<dyn IdentityProvider>,
        config: RegistryConfig,
    ) -> Self {
        let resolver = IdentityResolver::new(config.attribute_name.clone());
        Self {
            store,
            query: QueryExecutor::new(query),
            identity,
            resolver,
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The selector-based lookup path.
    pub fn query_executor(&self) -> &QueryExecutor {
        &self.query
    }

    /// `createDoc`: validate string arguments and register the document.
    pub fn create_doc(&self, args: &[String]) -> RegistryResult<()> {
        let request = CreateDocArgs::parse(args, self.config.creator_mode)?;
        self.register(&request).map(|_| ())
    }

    /// Register a validated request and return the stored record.
    ///
    /// Fails with [`RegistryError::Duplicate`] if the hash is already
    /// present; nothing is written in that case. The existence check and the
    /// write are not atomic here: uniqueness under concurrent registrations
    /// relies on the ledger rejecting the losing transaction at commit.
    pub fn register(&self, request: &CreateDocArgs) -> RegistryResult<DocumentRecord> {
        let key = request.hash.as_str();

        let existing = self
            .store
            .get_state(key)
            .map_err(|e| RegistryError::storage("get", e))?;
        if existing.is_some() {
            warn!(hash = %request.hash, "hash already registered");
            return Err(RegistryError::Duplicate(request.hash.to_string()));
        }

        let time = Timestamp::now().to_rfc3339();
        let creator = self
            .resolver
            .resolve(self.identity.as_ref(), request.creator.as_deref())?;

        let record = DocumentRecord {
            doc_hash: request.hash.clone(),
            database: request.database,
            time,
            creator,
            sub_contract: request.sub_contract.clone(),
            contract_type: request.contract_type,
        };
        let encoded = record.encode()?;

        self.store
            .put_state(key, &encoded)
            .map_err(|e| RegistryError::storage("put", e))?;
        debug!(hash = %request.hash.short(), creator = %record.creator, "document registered");
        Ok(record)
    }

    /// `getDoc` (direct-key form): returns the stored bytes unchanged.
    pub fn get_doc(&self, args: &[String]) -> RegistryResult<Vec<u8>> {
        let hash = parse_lookup(args)?;
        self.fetch_raw(&hash)
    }

    /// Fetch and decode the record registered under `hash`.
    pub fn fetch(&self, hash: &DocHash) -> RegistryResult<DocumentRecord> {
        let raw = self.fetch_raw(hash)?;
        Ok(DocumentRecord::decode(&raw)?)
    }

    fn fetch_raw(&self, hash: &DocHash) -> RegistryResult<Vec<u8>> {
        self.store
            .get_state(hash.as_str())
            .map_err(|e| RegistryError::storage("get", e))?
            .ok_or_else(|| RegistryError::NotFound(hash.to_string()))
    }

    /// `setDatabase`: reserved for record mutation; not implemented.
    pub fn set_database(&self, _args: &[String]) -> RegistryResult<Vec<u8>> {
        Err(RegistryError::NotImplemented("setDatabase"))
    }

    /// `setName`: reserved for record mutation; not implemented.
    pub fn set_name(&self, _args: &[String]) -> RegistryResult<Vec<u8>> {
        Err(RegistryError::NotImplemented("setName"))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

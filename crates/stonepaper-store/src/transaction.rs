use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryStateStore;
use crate::traits::StateStore;

/// An optimistic transaction over an [`InMemoryStateStore`].
///
/// Models ledger transaction simulation: reads observe committed state and
/// record the version they saw, writes are buffered. A transaction does not
/// read its own buffered writes. [`Transaction::commit`] re-checks every read
/// version and rejects the whole write set with
/// [`StoreError::MvccConflict`] if any key changed since it was read.
///
/// Two transactions that both read an absent key and then both write it will
/// both simulate successfully; only the first to commit wins.
pub struct Transaction {
    store: Arc<InMemoryStateStore>,
    inner: Mutex<TxState>,
}

#[derive(Default)]
struct TxState {
    closed: bool,
    reads: BTreeMap<String, Option<u64>>,
    writes: BTreeMap<String, Vec<u8>>,
}

impl Transaction {
    pub(crate) fn new(store: Arc<InMemoryStateStore>) -> Self {
        Self {
            store,
            inner: Mutex::new(TxState::default()),
        }
    }

    /// Keys read so far, with the version observed (`None` = absent).
    pub fn read_set(&self) -> StoreResult<BTreeMap<String, Option<u64>>> {
        Ok(self.lock()?.reads.clone())
    }

    /// Keys written so far.
    pub fn write_keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.lock()?.writes.keys().cloned().collect())
    }

    /// Validate the read set and apply the buffered writes atomically.
    ///
    /// Returns the commit height, or the current height unchanged when the
    /// transaction wrote nothing.
    pub fn commit(&self) -> StoreResult<u64> {
        let mut tx = self.lock()?;
        if tx.closed {
            return Err(StoreError::TransactionClosed);
        }
        tx.closed = true;

        let mut state = self.store.write_state()?;
        for (key, seen) in &tx.reads {
            if state.version_of(key) != *seen {
                warn!(key = %key, "transaction invalidated by concurrent write");
                return Err(StoreError::MvccConflict { key: key.clone() });
            }
        }
        if tx.writes.is_empty() {
            return Ok(state.height);
        }

        let height = state.apply(tx.writes.iter());
        debug!(height, writes = tx.writes.len(), "transaction committed");
        Ok(height)
    }

    /// Discard the transaction.
    pub fn abort(&self) -> StoreResult<()> {
        let mut tx = self.lock()?;
        if tx.closed {
            return Err(StoreError::TransactionClosed);
        }
        tx.closed = true;
        tx.writes.clear();
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, TxState>> {
        self.inner.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl StateStore for Transaction {
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let mut tx = self.lock()?;
        if tx.closed {
            return Err(StoreError::TransactionClosed);
        }
        let state = self.store.read_state()?;
        let entry = state.entries.get(key);
        tx.reads
            .entry(key.to_string())
            .or_insert_with(|| entry.map(|e| e.version));
        Ok(entry.map(|e| e.value.clone()))
    }

    fn put_state(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let mut tx = self.lock()?;
        if tx.closed {
            return Err(StoreError::TransactionClosed);
        }
        tx.writes.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (reads, writes) = self
            .lock()
            .map(|tx| (tx.reads.len(), tx.writes.len()))
            .unwrap_or((0, 0));
        f.debug_struct("Transaction")
            .field("reads", &reads)
            .field("writes", &writes)
            .finish()
    }
}

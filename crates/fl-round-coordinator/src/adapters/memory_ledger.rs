//! In-memory ledger with the transaction semantics the contract relies on.
//!
//! - Writes are buffered per transaction and readable by that transaction.
//! - Every committed key carries the height of the commit that wrote it.
//!   Point reads record the version they saw; range scans record the keys
//!   and versions they saw. Commit fails on any change (MVCC conflict or
//!   phantom read) and applies nothing.
//! - Private partitions are readable only by member organizations.
//! - Events reach the emitter only after a successful commit.
//! - Time is a settable logical clock; each transaction reads it once.

use crate::config::DEFAULT_ORG_PARTITION_PREFIX;
use crate::domain::{CompositeKey, CoordinatorError, LedgerError, Partition};
use crate::ports::{EventEmitter, Invocation, LedgerStub, NoopEventEmitter, PrincipalResolver};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Initial logical time (ms).
pub const GENESIS_TIME_MS: u64 = 1_700_000_000_000;

#[derive(Clone, Debug)]
struct Versioned {
    value: Vec<u8>,
    version: u64,
}

#[derive(Clone, Debug, Default)]
struct WorldState {
    partitions: HashMap<Partition, BTreeMap<String, Versioned>>,
    height: u64,
}

impl WorldState {
    fn get(&self, partition: &Partition, key: &str) -> Option<&Versioned> {
        self.partitions.get(partition).and_then(|map| map.get(key))
    }

    fn range(&self, partition: &Partition, prefix: &str) -> Vec<(String, Versioned)> {
        self.partitions
            .get(partition)
            .map(|map| {
                map.range(prefix.to_string()..)
                    .take_while(|(key, _)| key.starts_with(prefix))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn versions(&self, partition: &Partition, prefix: &str) -> Vec<(String, u64)> {
        self.range(partition, prefix)
            .into_iter()
            .map(|(key, value)| (key, value.version))
            .collect()
    }
}

/// In-memory ledger for tests and local simulation.
pub struct InMemoryLedger {
    state: RwLock<WorldState>,
    clock_ms: RwLock<u64>,
    /// Explicit collection membership: collection -> organizations.
    collection_members: RwLock<HashMap<String, BTreeSet<String>>>,
    implicit_org_prefix: String,
    emitter: Arc<dyn EventEmitter>,
}

impl InMemoryLedger {
    /// Create an empty ledger that drops events.
    pub fn new() -> Self {
        Self::with_emitter(Arc::new(NoopEventEmitter))
    }

    /// Create an empty ledger delivering committed events to `emitter`.
    pub fn with_emitter(emitter: Arc<dyn EventEmitter>) -> Self {
        Self {
            state: RwLock::new(WorldState::default()),
            clock_ms: RwLock::new(GENESIS_TIME_MS),
            collection_members: RwLock::new(HashMap::new()),
            implicit_org_prefix: DEFAULT_ORG_PARTITION_PREFIX.to_string(),
            emitter,
        }
    }

    /// Use a different prefix for per-organization collections.
    pub fn with_implicit_org_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.implicit_org_prefix = prefix.into();
        self
    }

    /// Copy of the committed state, clock and policies, sharing the emitter.
    pub fn fork(&self) -> Self {
        Self {
            state: RwLock::new(self.state.read().clone()),
            clock_ms: RwLock::new(*self.clock_ms.read()),
            collection_members: RwLock::new(self.collection_members.read().clone()),
            implicit_org_prefix: self.implicit_org_prefix.clone(),
            emitter: Arc::clone(&self.emitter),
        }
    }

    /// Set current time for testing.
    pub fn set_time(&self, time_ms: u64) {
        *self.clock_ms.write() = time_ms;
    }

    /// Advance time for testing.
    pub fn advance_time(&self, ms: u64) {
        *self.clock_ms.write() += ms;
    }

    /// Current logical time.
    pub fn now_ms(&self) -> u64 {
        *self.clock_ms.read()
    }

    /// Number of committed write transactions.
    pub fn height(&self) -> u64 {
        self.state.read().height
    }

    /// Restrict reads of a collection to the given organizations.
    pub fn restrict_collection<I, S>(&self, collection: &str, organizations: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collection_members.write().insert(
            collection.to_string(),
            organizations.into_iter().map(Into::into).collect(),
        );
    }

    /// Whether `organization` may read `partition`.
    ///
    /// Explicit membership wins; otherwise a per-organization collection is
    /// readable by its own organization only and any other collection is
    /// open.
    pub fn can_read(&self, partition: &Partition, organization: &str) -> bool {
        let Some(collection) = partition.collection() else {
            return true;
        };
        if let Some(members) = self.collection_members.read().get(collection) {
            return members.contains(organization);
        }
        match collection.strip_prefix(&self.implicit_org_prefix) {
            Some(owner) => owner == organization,
            None => true,
        }
    }

    /// Committed value of a key.
    pub fn committed_value(&self, partition: &Partition, key: &CompositeKey) -> Option<Vec<u8>> {
        self.state
            .read()
            .get(partition, key.as_str())
            .map(|v| v.value.clone())
    }

    /// Committed keys under a prefix.
    pub fn committed_keys(&self, partition: &Partition, prefix: &CompositeKey) -> Vec<CompositeKey> {
        self.state
            .read()
            .range(partition, prefix.as_str())
            .into_iter()
            .map(|(key, _)| CompositeKey::from_raw(key))
            .collect()
    }

    /// Write a raw value outside any transaction (seeding legacy data).
    pub fn seed_raw(&self, partition: &Partition, key: &CompositeKey, value: Vec<u8>) {
        let mut state = self.state.write();
        state.height += 1;
        let version = state.height;
        state
            .partitions
            .entry(partition.clone())
            .or_default()
            .insert(key.as_str().to_string(), Versioned { value, version });
    }

    /// Begin a transaction with a fresh transaction id at the current time.
    pub fn begin(&self, creator_organization: &str) -> MemoryStub<'_> {
        self.begin_with_tx_id(creator_organization, Uuid::new_v4().to_string())
    }

    /// Begin a transaction with a given id (replaying a proposal).
    pub fn begin_with_tx_id(
        &self,
        creator_organization: &str,
        tx_id: impl Into<String>,
    ) -> MemoryStub<'_> {
        MemoryStub {
            ledger: self,
            tx_id: tx_id.into(),
            timestamp_ms: self.now_ms(),
            creator_organization: creator_organization.to_string(),
            reads: BTreeMap::new(),
            ranges: Vec::new(),
            writes: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Run `f` as one transaction for the resolved caller.
    ///
    /// Commits on `Ok`; discards every write and event on `Err`.
    pub fn execute<T, F>(&self, resolver: &dyn PrincipalResolver, f: F) -> Result<T, CoordinatorError>
    where
        F: FnOnce(&mut Invocation<'_>) -> Result<T, CoordinatorError>,
    {
        let principal = resolver.current_principal()?;
        let mut stub = self.begin(&principal.organization_id);
        let outcome = {
            let mut inv = Invocation::new(&mut stub, &principal)?;
            f(&mut inv)
        };

        match outcome {
            Ok(value) => {
                stub.commit()?;
                Ok(value)
            }
            Err(e) => {
                debug!(tx_id = %stub.tx_id, error = %e, "Transaction discarded");
                Err(e)
            }
        }
    }

    fn validate_and_apply(&self, stub: MemoryStub<'_>) -> Result<u64, LedgerError> {
        let mut state = self.state.write();

        for ((partition, key), seen) in &stub.reads {
            let current = state.get(partition, key).map(|v| v.version);
            if current != *seen {
                return Err(LedgerError::MvccConflict {
                    partition: partition.to_string(),
                    key: CompositeKey::from_raw(key.clone()).to_string(),
                });
            }
        }
        for range in &stub.ranges {
            if state.versions(&range.partition, &range.prefix) != range.observed {
                return Err(LedgerError::PhantomRead {
                    partition: range.partition.to_string(),
                    prefix: CompositeKey::from_raw(range.prefix.clone()).to_string(),
                });
            }
        }

        if stub.writes.is_empty() {
            return Ok(state.height);
        }

        state.height += 1;
        let version = state.height;
        for ((partition, key), pending) in stub.writes {
            let map = state.partitions.entry(partition).or_default();
            match pending {
                Some(value) => {
                    map.insert(key, Versioned { value, version });
                }
                None => {
                    map.remove(&key);
                }
            }
        }
        Ok(version)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct RangeRead {
    partition: Partition,
    prefix: String,
    observed: Vec<(String, u64)>,
}

/// One open transaction against an [`InMemoryLedger`].
pub struct MemoryStub<'l> {
    ledger: &'l InMemoryLedger,
    tx_id: String,
    timestamp_ms: u64,
    creator_organization: String,
    reads: BTreeMap<(Partition, String), Option<u64>>,
    ranges: Vec<RangeRead>,
    writes: BTreeMap<(Partition, String), Option<Vec<u8>>>,
    events: Vec<(String, Vec<u8>)>,
}

impl MemoryStub<'_> {
    /// Validate the read set and apply the writes, then deliver events.
    ///
    /// Returns the height the transaction committed at.
    pub fn commit(self) -> Result<u64, LedgerError> {
        let ledger = self.ledger;
        let tx_id = self.tx_id.clone();
        let events = self.events.clone();
        let writes = self.writes.len();

        match ledger.validate_and_apply(self) {
            Ok(height) => {
                for (name, payload) in &events {
                    ledger.emitter.emit(name, payload);
                }
                debug!(
                    tx_id = %tx_id,
                    height,
                    writes,
                    events = events.len(),
                    "Transaction committed"
                );
                Ok(height)
            }
            Err(e) => {
                warn!(tx_id = %tx_id, error = %e, "Transaction invalidated");
                Err(e)
            }
        }
    }

    /// Abandon the transaction.
    pub fn discard(self) {
        debug!(tx_id = %self.tx_id, "Transaction discarded");
    }

    /// Number of buffered writes and deletes.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    fn check_read(&self, partition: &Partition) -> Result<(), LedgerError> {
        if self.ledger.can_read(partition, &self.creator_organization) {
            return Ok(());
        }
        Err(LedgerError::AccessDenied {
            partition: partition.to_string(),
            organization: self.creator_organization.clone(),
        })
    }
}

impl LedgerStub for MemoryStub<'_> {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn tx_timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    fn creator_organization(&self) -> &str {
        &self.creator_organization
    }

    fn get_state(
        &mut self,
        partition: &Partition,
        key: &CompositeKey,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        self.check_read(partition)?;
        let id = (partition.clone(), key.as_str().to_string());
        if let Some(pending) = self.writes.get(&id) {
            return Ok(pending.clone());
        }

        let ledger = self.ledger;
        let state = ledger.state.read();
        let current = state.get(partition, key.as_str());
        self.reads
            .entry(id)
            .or_insert_with(|| current.map(|v| v.version));
        Ok(current.map(|v| v.value.clone()))
    }

    fn put_state(
        &mut self,
        partition: &Partition,
        key: &CompositeKey,
        value: Vec<u8>,
    ) -> Result<(), LedgerError> {
        if value.is_empty() {
            return Err(LedgerError::Backend(format!(
                "empty value for key {}",
                key
            )));
        }
        self.writes
            .insert((partition.clone(), key.as_str().to_string()), Some(value));
        Ok(())
    }

    fn delete_state(
        &mut self,
        partition: &Partition,
        key: &CompositeKey,
    ) -> Result<(), LedgerError> {
        self.writes
            .insert((partition.clone(), key.as_str().to_string()), None);
        Ok(())
    }

    fn scan_prefix(
        &mut self,
        partition: &Partition,
        prefix: &CompositeKey,
    ) -> Result<Vec<(CompositeKey, Vec<u8>)>, LedgerError> {
        self.check_read(partition)?;
        let committed = self.ledger.state.read().range(partition, prefix.as_str());
        self.ranges.push(RangeRead {
            partition: partition.clone(),
            prefix: prefix.as_str().to_string(),
            observed: committed
                .iter()
                .map(|(key, value)| (key.clone(), value.version))
                .collect(),
        });

        let mut merged: BTreeMap<String, Vec<u8>> = committed
            .into_iter()
            .map(|(key, value)| (key, value.value))
            .collect();
        for ((p, key), pending) in &self.writes {
            if p != partition || !key.starts_with(prefix.as_str()) {
                continue;
            }
            match pending {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged
            .into_iter()
            .map(|(key, value)| (CompositeKey::from_raw(key), value))
            .collect())
    }

    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> Result<(), LedgerError> {
        self.events.push((name.to_string(), payload));
        Ok(())
    }
}

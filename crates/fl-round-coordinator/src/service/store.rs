//! Typed record access over the transaction stub.
//!
//! Records are JSON. Counters are JSON integers updated read-then-write
//! inside the current transaction; the ledger's MVCC validation serializes
//! concurrent increments, so no value is ever cached across invocations.

use crate::domain::{CompositeKey, CoordinatorError, Partition};
use crate::ports::Invocation;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

/// Read and decode a record.
pub(crate) fn get_record<T: DeserializeOwned>(
    inv: &mut Invocation<'_>,
    partition: &Partition,
    key: &CompositeKey,
) -> Result<Option<T>, CoordinatorError> {
    match inv.stub().get_state(partition, key)? {
        Some(bytes) if !bytes.is_empty() => Ok(Some(serde_json::from_slice(&bytes)?)),
        _ => Ok(None),
    }
}

/// Whether a non-empty record exists.
pub(crate) fn record_exists(
    inv: &mut Invocation<'_>,
    partition: &Partition,
    key: &CompositeKey,
) -> Result<bool, CoordinatorError> {
    Ok(inv
        .stub()
        .get_state(partition, key)?
        .is_some_and(|bytes| !bytes.is_empty()))
}

/// Encode and write a record.
pub(crate) fn put_record<T: Serialize>(
    inv: &mut Invocation<'_>,
    partition: &Partition,
    key: &CompositeKey,
    record: &T,
) -> Result<(), CoordinatorError> {
    let bytes = serde_json::to_vec(record)?;
    inv.stub().put_state(partition, key, bytes)?;
    Ok(())
}

/// Delete a record.
pub(crate) fn delete_record(
    inv: &mut Invocation<'_>,
    partition: &Partition,
    key: &CompositeKey,
) -> Result<(), CoordinatorError> {
    inv.stub().delete_state(partition, key)?;
    Ok(())
}

/// Decode every record under `prefix`.
///
/// Empty or malformed values are skipped and logged.
pub(crate) fn scan_records<T: DeserializeOwned>(
    inv: &mut Invocation<'_>,
    partition: &Partition,
    prefix: &CompositeKey,
) -> Result<Vec<(CompositeKey, T)>, CoordinatorError> {
    let entries = inv.stub().scan_prefix(partition, prefix)?;
    let mut records = Vec::with_capacity(entries.len());
    for (key, bytes) in entries {
        if bytes.is_empty() {
            warn!(key = %key, partition = %partition, "Skipping empty record");
            continue;
        }
        match serde_json::from_slice::<T>(&bytes) {
            Ok(record) => records.push((key, record)),
            Err(e) => {
                warn!(key = %key, partition = %partition, error = %e, "Skipping malformed record");
            }
        }
    }
    Ok(records)
}

/// Current counter value, zero when absent.
pub(crate) fn read_counter(
    inv: &mut Invocation<'_>,
    partition: &Partition,
    key: &CompositeKey,
) -> Result<u64, CoordinatorError> {
    Ok(get_record::<u64>(inv, partition, key)?.unwrap_or(0))
}

/// Increment a counter and return the new value.
pub(crate) fn increment(
    inv: &mut Invocation<'_>,
    partition: &Partition,
    key: &CompositeKey,
) -> Result<u64, CoordinatorError> {
    let next = read_counter(inv, partition, key)?
        .checked_add(1)
        .ok_or_else(|| CoordinatorError::InvalidArgument(format!("counter {} overflow", key)))?;
    put_record(inv, partition, key, &next)?;
    Ok(next)
}

//! # Outbound Ports
//!
//! Traits for the external collaborators of the contract: the ledger
//! transaction stub, the identity layer and the event transport.

use crate::domain::{
    CompositeKey, CoordinatorError, LedgerError, Partition, Principal, Role, RoleSet,
};
use serde::Serialize;

/// Ledger access for one transaction - outbound port.
///
/// Every read and write goes through the same stub, so the whole invocation
/// commits or aborts as a unit. Reads see the transaction's own writes.
pub trait LedgerStub {
    /// Transaction id agreed by all endorsers.
    fn tx_id(&self) -> &str;

    /// Transaction timestamp (ms), identical on every endorser.
    fn tx_timestamp_ms(&self) -> u64;

    /// Organization (MSP) of the transaction creator.
    fn creator_organization(&self) -> &str;

    /// Read a value.
    fn get_state(
        &mut self,
        partition: &Partition,
        key: &CompositeKey,
    ) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Write a value.
    fn put_state(
        &mut self,
        partition: &Partition,
        key: &CompositeKey,
        value: Vec<u8>,
    ) -> Result<(), LedgerError>;

    /// Delete a value. Deleting an absent key is not an error.
    fn delete_state(&mut self, partition: &Partition, key: &CompositeKey)
        -> Result<(), LedgerError>;

    /// All entries under `prefix`, sorted by key.
    fn scan_prefix(
        &mut self,
        partition: &Partition,
        prefix: &CompositeKey,
    ) -> Result<Vec<(CompositeKey, Vec<u8>)>, LedgerError>;

    /// Queue a named event. Delivered only if the transaction commits.
    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> Result<(), LedgerError>;
}

/// Identity of the transaction creator - outbound port.
pub trait PrincipalResolver {
    /// Resolve the caller.
    fn current_principal(&self) -> Result<Principal, CoordinatorError>;
}

impl PrincipalResolver for Principal {
    fn current_principal(&self) -> Result<Principal, CoordinatorError> {
        Ok(self.clone())
    }
}

/// Event transport - outbound port.
///
/// Fire-and-forget: delivery failures are the transport's concern.
pub trait EventEmitter: Send + Sync {
    /// Publish a committed event.
    fn emit(&self, name: &str, payload: &[u8]);
}

/// One contract invocation: the transaction stub plus the caller, resolved
/// once.
pub struct Invocation<'a> {
    stub: &'a mut dyn LedgerStub,
    principal: Principal,
    roles: RoleSet,
}

impl<'a> Invocation<'a> {
    /// Bind a stub and resolve the caller.
    pub fn new(
        stub: &'a mut dyn LedgerStub,
        resolver: &dyn PrincipalResolver,
    ) -> Result<Self, CoordinatorError> {
        let principal = resolver.current_principal()?;
        if principal.username.is_empty() || principal.client_id.is_empty() {
            return Err(CoordinatorError::InvalidArgument(
                "principal has no client id or username".to_string(),
            ));
        }
        let roles = principal.roles();
        Ok(Self {
            stub,
            principal,
            roles,
        })
    }

    /// Caller.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Roles asserted by the caller.
    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    /// Whether the caller holds `role`.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    /// Transaction id.
    pub fn tx_id(&self) -> &str {
        self.stub.tx_id()
    }

    /// Transaction timestamp (ms).
    pub fn now_ms(&self) -> u64 {
        self.stub.tx_timestamp_ms()
    }

    /// Transaction stub.
    pub fn stub(&mut self) -> &mut (dyn LedgerStub + 'a) {
        &mut *self.stub
    }

    /// Queue an event with a JSON payload.
    pub fn emit<T: Serialize>(&mut self, name: &str, payload: &T) -> Result<(), CoordinatorError> {
        let bytes = serde_json::to_vec(payload)?;
        self.stub.set_event(name, bytes)?;
        Ok(())
    }
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Resolver that always fails, as an identity layer would for a
/// certificate it cannot parse.
#[derive(Clone, Debug, Default)]
pub struct UnresolvablePrincipal;

impl PrincipalResolver for UnresolvablePrincipal {
    fn current_principal(&self) -> Result<Principal, CoordinatorError> {
        Err(CoordinatorError::InvalidArgument(
            "creator identity could not be resolved".to_string(),
        ))
    }
}

/// Emitter that drops every event.
#[derive(Clone, Debug, Default)]
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn emit(&self, _name: &str, _payload: &[u8]) {}
}

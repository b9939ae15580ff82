//! # Domain Value Objects
//!
//! Immutable value types for round coordination.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Hash type (32-byte Keccak-256).
pub type Hash = [u8; 32];

/// Attribute value that asserts a role.
pub const ROLE_ASSERTED: &str = "true";

/// Model training state machine.
///
/// `Initiated -> Started -> Finished`, never backward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModelStatus {
    /// Registered, training not started.
    #[default]
    Initiated,
    /// Rounds in progress.
    Started,
    /// All rounds published (terminal).
    Finished,
}

impl ModelStatus {
    /// Check if transition is valid.
    ///
    /// `Started -> Started` is the round advance performed by the finalizer.
    pub fn can_transition_to(&self, next: ModelStatus) -> bool {
        matches!(
            (self, next),
            (Self::Initiated, Self::Started)
                | (Self::Started, Self::Started)
                | (Self::Started, Self::Finished)
        )
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initiated => write!(f, "Initiated"),
            Self::Started => write!(f, "Started"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

/// Roles asserted through certificate attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Trains locally and submits secrets.
    #[serde(rename = "trainer")]
    Trainer,
    /// Combines secrets and submits aggregated secrets.
    #[serde(rename = "aggregator")]
    Aggregator,
    /// Publishes the end-of-round model.
    #[serde(rename = "leadAggregator")]
    LeadAggregator,
    /// Creates models and starts training.
    #[serde(rename = "flAdmin")]
    FlAdmin,
}

/// Precedence used only by the informational role query.
///
/// The order is part of the public contract and is kept as published.
pub const ROLE_PRECEDENCE: [Role; 4] = [
    Role::Aggregator,
    Role::Trainer,
    Role::LeadAggregator,
    Role::FlAdmin,
];

impl Role {
    /// Certificate attribute name asserting this role.
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::Trainer => "trainer",
            Self::Aggregator => "aggregator",
            Self::LeadAggregator => "leadAggregator",
            Self::FlAdmin => "flAdmin",
        }
    }

    /// All roles.
    pub fn all() -> [Role; 4] {
        [
            Self::Trainer,
            Self::Aggregator,
            Self::LeadAggregator,
            Self::FlAdmin,
        ]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute())
    }
}

/// Roles held by one principal, resolved once per invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    /// Resolve roles from an attribute map. Only the exact value `"true"`
    /// asserts a role.
    pub fn from_attributes(attributes: &BTreeMap<String, String>) -> Self {
        let roles = Role::all()
            .into_iter()
            .filter(|role| {
                attributes
                    .get(role.attribute())
                    .is_some_and(|value| value == ROLE_ASSERTED)
            })
            .collect();
        Self(roles)
    }

    /// Check membership.
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Whether no role is held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First held role in [`ROLE_PRECEDENCE`] order.
    pub fn primary(&self) -> Option<Role> {
        ROLE_PRECEDENCE.into_iter().find(|role| self.contains(*role))
    }

    /// Iterate held roles.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Ledger storage scope.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Partition {
    /// World-readable state.
    Public,
    /// Private data collection visible to its member organizations.
    Private(String),
}

impl Partition {
    /// Private partition by name.
    pub fn private(name: impl Into<String>) -> Self {
        Self::Private(name.into())
    }

    /// Collection name, `None` for the public partition.
    pub fn collection(&self) -> Option<&str> {
        match self {
            Self::Public => None,
            Self::Private(name) => Some(name),
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private(name) => write!(f, "private:{}", name),
        }
    }
}

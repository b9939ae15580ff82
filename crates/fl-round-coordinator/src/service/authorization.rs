//! Role guard. The single gate every role-restricted operation passes.

use crate::domain::{CoordinatorError, Role};
use crate::ports::Invocation;
use fl_telemetry::{metric_inc, metrics};
use tracing::warn;

/// Fail with `Unauthorized` unless the caller asserts `role = true`.
pub(crate) fn require_role(inv: &Invocation<'_>, role: Role) -> Result<(), CoordinatorError> {
    if inv.has_role(role) {
        return Ok(());
    }

    let principal = inv.principal();
    warn!(
        client_id = %principal.client_id,
        organization = %principal.organization_id,
        required = %role,
        "Caller lacks required role"
    );
    metric_inc!(metrics::AUTHORIZATION_DENIALS, &[role.attribute()]);
    Err(CoordinatorError::Unauthorized {
        role,
        client_id: principal.client_id.clone(),
    })
}

//! Scope authorization for authenticated Hawk principals.

use crate::credentials::Scope;
use crate::error::AuthError;
use crate::hawk::HawkPrincipal;

/// Admit the principal if the route needs no scope, or the principal holds
/// the required scope (directly or via the `*` wildcard).
pub fn require_scope(principal: &HawkPrincipal, required: Option<Scope>) -> Result<(), AuthError> {
    match required {
        None => Ok(()),
        Some(scope) if principal.has_scope(scope) => Ok(()),
        Some(scope) => {
            tracing::debug!(
                credential_id = principal.credential_id(),
                required_scope = %scope,
                "Insufficient scope"
            );
            Err(AuthError::InsufficientScope { required: scope })
        }
    }
}

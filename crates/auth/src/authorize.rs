use thiserror::Error;

use tallyforge_core::TenantId;

use crate::permissions::Permission;
use crate::principal::Principal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("tenant mismatch")]
    TenantMismatch,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error("forbidden: admin role required")]
    AdminRequired,
}

/// Authorize a principal within the active tenant.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(
    principal: &Principal,
    active_tenant_id: TenantId,
    required: &Permission,
) -> Result<(), AuthzError> {
    if principal.tenant_id != active_tenant_id {
        return Err(AuthzError::TenantMismatch);
    }

    if principal.has_permission(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.to_string()))
    }
}

/// Require the `admin` role (or superuser) within the active tenant.
pub fn require_admin(principal: &Principal, active_tenant_id: TenantId) -> Result<(), AuthzError> {
    if principal.tenant_id != active_tenant_id {
        return Err(AuthzError::TenantMismatch);
    }
    if principal.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::AdminRequired)
    }
}

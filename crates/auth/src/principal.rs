use serde::{Deserialize, Serialize};

use tallyforge_core::{TenantId, UserId};

use crate::permissions::Permission;
use crate::role::ADMIN_ROLE;

/// A fully resolved principal for authorization decisions.
///
/// Built from the tenant directory for the acting user: role names plus the
/// union of every permission those roles grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub is_superuser: bool,
    pub roles: Vec<String>,
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r == name)
    }

    pub fn is_admin(&self) -> bool {
        self.is_superuser || self.has_role(ADMIN_ROLE)
    }

    /// Superusers hold every permission; everyone else needs a matching grant.
    pub fn has_permission(&self, required: &Permission) -> bool {
        self.is_superuser || self.permissions.iter().any(|p| p.grants(required))
    }
}

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tallyforge_core::{DomainError, DomainResult, Entity, RoleId, TenantId};

use crate::permissions::Permission;

/// Name of the built-in administrator role.
pub const ADMIN_ROLE: &str = "admin";

/// Tenant-scoped role owning a set of permissions.
///
/// System roles are seeded at provisioning and cannot be deleted or renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub is_system: bool,
    pub permissions: BTreeSet<Permission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Role {
    type Id = RoleId;
    const KIND: &'static str = "role";

    fn id(&self) -> RoleId {
        self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, Default)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Replaces the full permission set when present.
    pub permissions: Option<Vec<Permission>>,
}

pub(crate) fn validate_role_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() || name.len() > 100 {
        return Err(DomainError::validation("role name must be 1..=100 characters"));
    }
    Ok(name.to_string())
}

impl Role {
    pub fn new(
        tenant_id: TenantId,
        new: NewRole,
        is_system: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id: RoleId::new(),
            tenant_id,
            name: validate_role_name(&new.name)?,
            description: new.description,
            is_system,
            permissions: new.permissions.into_iter().collect(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.name == ADMIN_ROLE
    }

    pub fn grants(&self, required: &Permission) -> bool {
        self.permissions.iter().any(|p| p.grants(required))
    }

    pub fn grant(&mut self, permission: Permission, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.permissions.insert(permission.clone()) {
            return Err(DomainError::conflict(format!(
                "role '{}' already has permission {permission}",
                self.name
            )));
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn revoke(&mut self, permission: &Permission, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.permissions.remove(permission) {
            return Err(DomainError::not_found("permission", permission));
        }
        self.updated_at = now;
        Ok(())
    }
}

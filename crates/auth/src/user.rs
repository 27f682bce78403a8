//! Tenant-scoped user identities.
//!
//! Users are soft-deleted: the row stays (for attribution on journals and
//! invoices) but is hidden from listings and can no longer act.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tallyforge_core::{DomainError, DomainResult, Entity, TenantId, UserId};

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// # Invariants
/// - A user belongs to exactly one tenant (tenant_id is immutable).
/// - Email is lower-cased and unique within the tenant.
/// - A deleted user is never active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub email: String,
    /// Opaque hash owned by the authentication collaborator.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_superuser: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<UserId>,
}

impl Entity for User {
    type Id = UserId;
    const KIND: &'static str = "user";

    fn id(&self) -> UserId {
        self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub is_superuser: bool,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

/// Listing filter. `search` matches email, first or last name, ignoring case.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

pub(crate) fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim();
    if email.is_empty() || email.len() > 255 || !email.contains('@') {
        return Err(DomainError::validation("invalid email format"));
    }
    Ok(email.to_lowercase())
}

impl User {
    pub fn new(tenant_id: TenantId, new: NewUser, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: UserId::new(),
            tenant_id,
            email: normalize_email(&new.email)?,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            phone: new.phone,
            is_active: true,
            is_verified: new.is_verified,
            is_superuser: new.is_superuser,
            last_login_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            deleted_by: None,
        })
    }

    /// "First Last", falling back to the email when both names are blank.
    pub fn full_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            self.email.clone()
        } else {
            parts.join(" ")
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Can this user act (authenticate, issue commands)?
    pub fn can_act(&self) -> bool {
        self.is_active && !self.is_deleted()
    }

    pub fn matches(&self, filter: &UserFilter) -> bool {
        if self.is_deleted() {
            return false;
        }
        if let Some(active) = filter.is_active {
            if self.is_active != active {
                return false;
            }
        }
        match filter.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                [Some(self.email.as_str()), self.first_name.as_deref(), self.last_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .any(|field| field.to_lowercase().contains(&term))
            }
            _ => true,
        }
    }

    pub fn apply_update(&mut self, update: UserUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if self.is_deleted() {
            return Err(DomainError::conflict("user has been deleted"));
        }
        if update.first_name.is_some() {
            self.first_name = update.first_name;
        }
        if update.last_name.is_some() {
            self.last_name = update.last_name;
        }
        if update.phone.is_some() {
            self.phone = update.phone;
        }
        if let Some(active) = update.is_active {
            self.is_active = active;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn soft_delete(&mut self, by: UserId, now: DateTime<Utc>) -> DomainResult<()> {
        if by == self.id {
            return Err(DomainError::forbidden("users cannot delete themselves"));
        }
        if self.is_deleted() {
            return Err(DomainError::conflict("user has already been deleted"));
        }
        self.deleted_at = Some(now);
        self.deleted_by = Some(by);
        self.is_active = false;
        self.updated_at = now;
        Ok(())
    }
}

//! Identity and tenant lifecycle events.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tallyforge_core::{TenantId, UserId};
use tallyforge_events::{Event, catalog};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserCreated {
    pub user_id: UserId,
    pub email: String,
    #[serde(skip)]
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserUpdated {
    pub user_id: UserId,
    pub is_active: bool,
    #[serde(skip)]
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDeleted {
    pub user_id: UserId,
    pub deleted_by: UserId,
    #[serde(skip)]
    pub occurred_at: DateTime<Utc>,
}

/// Events raised by [`crate::Directory`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum IdentityEvent {
    UserCreated(UserCreated),
    UserUpdated(UserUpdated),
    UserDeleted(UserDeleted),
}

impl Event for IdentityEvent {
    fn event_type(&self) -> &'static str {
        match self {
            IdentityEvent::UserCreated(_) => catalog::USER_CREATED,
            IdentityEvent::UserUpdated(_) => catalog::USER_UPDATED,
            IdentityEvent::UserDeleted(_) => catalog::USER_DELETED,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            IdentityEvent::UserCreated(e) => e.occurred_at,
            IdentityEvent::UserUpdated(e) => e.occurred_at,
            IdentityEvent::UserDeleted(e) => e.occurred_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TenantEvent {
    Created {
        tenant_id: TenantId,
        slug: String,
        #[serde(skip)]
        occurred_at: DateTime<Utc>,
    },
    Provisioned {
        tenant_id: TenantId,
        admin_user_id: UserId,
        accounts_seeded: usize,
        tax_rates_seeded: usize,
        #[serde(skip)]
        occurred_at: DateTime<Utc>,
    },
    Suspended {
        tenant_id: TenantId,
        #[serde(skip)]
        occurred_at: DateTime<Utc>,
    },
}

impl Event for TenantEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TenantEvent::Created { .. } => catalog::TENANT_CREATED,
            TenantEvent::Provisioned { .. } => catalog::TENANT_PROVISIONED,
            TenantEvent::Suspended { .. } => catalog::TENANT_SUSPENDED,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            TenantEvent::Created { occurred_at, .. }
            | TenantEvent::Provisioned { occurred_at, .. }
            | TenantEvent::Suspended { occurred_at, .. } => *occurred_at,
        }
    }
}

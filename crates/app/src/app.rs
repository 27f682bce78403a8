//! The application facade and its request pipeline.
//!
//! Every tenant-scoped operation runs the same steps:
//! 1. load the tenant's books (unknown tenant is `NotFound`)
//! 2. reject suspended or churned tenants
//! 3. resolve the acting user into a principal (`Unauthorized` otherwise)
//! 4. check the required permission
//! 5. run the domain operation as one store transaction
//! 6. publish the recorded events once committed

use tallyforge_auth::{Action, Permission, Principal, authorize, require_admin};
use tallyforge_events::{EventBus, EventEnvelope, InMemoryEventBus};
use tallyforge_infra::{Settings, Store, TenantBooks};

use crate::context::RequestContext;
use crate::errors::{AppError, AppResult};

/// What the acting principal must hold for an operation.
#[derive(Debug, Clone)]
pub enum Required {
    /// Any active user of the tenant.
    Member,
    Permission(Permission),
    Admin,
}

pub(crate) fn needs(resource: &'static str, action: Action) -> Required {
    Required::Permission(Permission::new(resource, action))
}

pub struct App<B = InMemoryEventBus<EventEnvelope>> {
    settings: Settings,
    store: Store<B>,
}

impl App {
    /// In-process app over an in-memory bus.
    pub fn in_memory(settings: Settings) -> Self {
        Self::new(settings, InMemoryEventBus::new())
    }
}

impl<B> App<B>
where
    B: EventBus<EventEnvelope>,
{
    pub fn new(settings: Settings, bus: B) -> Self {
        Self {
            settings,
            store: Store::new(bus),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Store<B> {
        &self.store
    }

    pub fn bus(&self) -> &B {
        self.store.bus()
    }

    /// Run a mutating operation.
    pub(crate) fn execute<T, F>(&self, ctx: &RequestContext, required: Required, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut TenantBooks, &Principal) -> AppResult<T>,
    {
        self.store.transaction(ctx.tenant_id, ctx.actor(), |books| {
            let principal = admit(books, ctx, &required)?;
            f(books, &principal)
        })
    }

    /// Run a read-only operation.
    pub(crate) fn query<T, F>(&self, ctx: &RequestContext, required: Required, f: F) -> AppResult<T>
    where
        F: FnOnce(&TenantBooks) -> AppResult<T>,
    {
        self.store.read(ctx.tenant_id, |books| {
            admit(books, ctx, &required)?;
            f(books)
        })?
    }
}

pub(crate) fn admit(
    books: &TenantBooks,
    ctx: &RequestContext,
    required: &Required,
) -> AppResult<Principal> {
    if !books.tenant.accepts_requests() {
        return Err(AppError::TenantSuspended(ctx.tenant_id));
    }
    let principal = books.directory.principal_for(ctx.user_id)?;
    match required {
        Required::Member => {}
        Required::Permission(permission) => authorize(&principal, ctx.tenant_id, permission)?,
        Required::Admin => require_admin(&principal, ctx.tenant_id)?,
    }
    Ok(principal)
}

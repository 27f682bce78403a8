//! In-memory, tenant-partitioned transactional store.
//!
//! Each tenant's [`TenantBooks`] sits behind its own lock. A transaction
//! works on a clone of the books and swaps it in only when the closure
//! returns `Ok`, so a failed request leaves no partial state. Events recorded
//! during the transaction are published after the swap.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::{debug, info};

use tallyforge_core::{DomainError, TenantId, UserId};
use tallyforge_events::{EventBus, EventEnvelope, InMemoryEventBus, publish_best_effort};

use crate::books::TenantBooks;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("tenant {0} not found")]
    TenantNotFound(TenantId),

    #[error("store lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

type Shared = Arc<RwLock<TenantBooks>>;

pub struct Store<B = InMemoryEventBus<EventEnvelope>> {
    tenants: RwLock<HashMap<TenantId, Shared>>,
    bus: B,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(InMemoryEventBus::new())
    }
}

impl<B> Store<B>
where
    B: EventBus<EventEnvelope>,
{
    pub fn new(bus: B) -> Self {
        Self {
            tenants: RwLock::new(HashMap::new()),
            bus,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Register a fully prepared tenant and publish whatever it recorded.
    ///
    /// Slugs and custom domains are unique across the store.
    pub fn create_tenant(
        &self,
        mut books: TenantBooks,
        actor: Option<UserId>,
    ) -> Result<TenantId, StoreError> {
        let tenant_id = books.tenant_id();
        let envelopes = {
            let mut tenants = self.tenants.write().map_err(|_| StoreError::Poisoned)?;
            for shared in tenants.values() {
                let existing = shared.read().map_err(|_| StoreError::Poisoned)?;
                if existing.tenant.slug == books.tenant.slug {
                    return Err(DomainError::conflict(format!(
                        "tenant with slug {} already exists",
                        books.tenant.slug
                    ))
                    .into());
                }
                if books.tenant.domain.is_some() && existing.tenant.domain == books.tenant.domain {
                    return Err(DomainError::conflict("tenant domain is already in use").into());
                }
            }
            let envelopes = books.drain_envelopes(actor);
            tenants.insert(tenant_id, Arc::new(RwLock::new(books)));
            envelopes
        };
        info!(%tenant_id, "tenant registered");
        publish_best_effort(&self.bus, envelopes);
        Ok(tenant_id)
    }

    fn handle(&self, tenant_id: TenantId) -> Result<Shared, StoreError> {
        let tenants = self.tenants.read().map_err(|_| StoreError::Poisoned)?;
        tenants
            .get(&tenant_id)
            .cloned()
            .ok_or(StoreError::TenantNotFound(tenant_id))
    }

    /// Run `f` as one unit of work against a tenant's books.
    ///
    /// The tenant's write lock is held for the whole closure, which also
    /// serializes journal and invoice number assignment.
    pub fn transaction<T, E, F>(&self, tenant_id: TenantId, actor: Option<UserId>, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut TenantBooks) -> Result<T, E>,
    {
        let shared = self.handle(tenant_id)?;
        let (value, envelopes) = {
            let mut committed = shared.write().map_err(|_| StoreError::Poisoned)?;
            let mut draft = committed.clone();
            let value = f(&mut draft)?;
            let envelopes = draft.drain_envelopes(actor);
            *committed = draft;
            (value, envelopes)
        };
        self.publish(tenant_id, envelopes);
        Ok(value)
    }

    /// [`Store::transaction`] for changes that may set a tenant's custom
    /// domain.
    ///
    /// The registry stays write-locked until the commit, so no other tenant
    /// can take the same domain in between. A domain already held by another
    /// tenant fails the whole transaction with `Conflict`.
    pub fn transaction_claiming_domain<T, E, F>(
        &self,
        tenant_id: TenantId,
        actor: Option<UserId>,
        f: F,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut TenantBooks) -> Result<T, E>,
    {
        let (value, envelopes) = {
            let tenants = self.tenants.write().map_err(|_| StoreError::Poisoned)?;
            let shared = tenants
                .get(&tenant_id)
                .ok_or(StoreError::TenantNotFound(tenant_id))?;
            let mut committed = shared.write().map_err(|_| StoreError::Poisoned)?;
            let mut draft = committed.clone();
            let value = f(&mut draft)?;

            if draft.tenant.domain != committed.tenant.domain {
                if let Some(domain) = draft.tenant.domain.as_deref() {
                    for (id, other) in tenants.iter().filter(|(id, _)| **id != tenant_id) {
                        let other = other.read().map_err(|_| StoreError::Poisoned)?;
                        if other.tenant.domain.as_deref() == Some(domain) {
                            debug!(%tenant_id, holder = %id, domain, "domain claim refused");
                            return Err(StoreError::from(DomainError::conflict(
                                "tenant domain is already in use",
                            ))
                            .into());
                        }
                    }
                }
            }

            let envelopes = draft.drain_envelopes(actor);
            *committed = draft;
            (value, envelopes)
        };
        self.publish(tenant_id, envelopes);
        Ok(value)
    }

    fn publish(&self, tenant_id: TenantId, envelopes: Vec<EventEnvelope>) {
        if !envelopes.is_empty() {
            let published = publish_best_effort(&self.bus, envelopes);
            debug!(%tenant_id, published, "transaction committed");
        }
    }

    /// Read-only access to a tenant's books.
    pub fn read<T>(
        &self,
        tenant_id: TenantId,
        f: impl FnOnce(&TenantBooks) -> T,
    ) -> Result<T, StoreError> {
        let shared = self.handle(tenant_id)?;
        let books = shared.read().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&books))
    }

    pub fn find_by_slug(&self, slug: &str) -> Result<Option<TenantId>, StoreError> {
        let tenants = self.tenants.read().map_err(|_| StoreError::Poisoned)?;
        for (id, shared) in tenants.iter() {
            let books = shared.read().map_err(|_| StoreError::Poisoned)?;
            if books.tenant.slug == slug {
                return Ok(Some(*id));
            }
        }
        Ok(None)
    }

    pub fn tenant_ids(&self) -> Result<Vec<TenantId>, StoreError> {
        let tenants = self.tenants.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tenants.keys().copied().collect())
    }
}

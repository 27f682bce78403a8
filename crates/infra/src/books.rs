//! Per-tenant aggregate state and its pending-event outbox.

use tracing::warn;

use tallyforge_accounting::{Ledger, PostingPolicy};
use tallyforge_auth::{Directory, Tenant, TenantEvent};
use tallyforge_core::{TenantId, UserId};
use tallyforge_events::{Event, EventEnvelope};
use tallyforge_invoicing::{InvoiceBook, InvoicingPolicy};

/// Everything one tenant owns.
///
/// Cloned per transaction; the clone is discarded if the unit of work fails.
#[derive(Debug, Clone)]
pub struct TenantBooks {
    pub tenant: Tenant,
    pub directory: Directory,
    pub ledger: Ledger,
    pub invoices: InvoiceBook,
    tenant_events: Vec<TenantEvent>,
}

impl TenantBooks {
    pub fn new(tenant: Tenant, posting: PostingPolicy, invoicing: InvoicingPolicy) -> Self {
        let tenant_id = tenant.id;
        Self {
            tenant,
            directory: Directory::new(tenant_id),
            ledger: Ledger::new(tenant_id, posting),
            invoices: InvoiceBook::new(tenant_id, invoicing),
            tenant_events: Vec::new(),
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant.id
    }

    /// Queue a tenant lifecycle event for publication after commit.
    pub fn record(&mut self, event: TenantEvent) {
        self.tenant_events.push(event);
    }

    /// Drain every pending event into envelopes, tenant events first.
    ///
    /// An event that fails to serialize is logged and dropped; it never
    /// fails the unit of work that produced it.
    pub fn drain_envelopes(&mut self, actor: Option<UserId>) -> Vec<EventEnvelope> {
        let tenant_id = self.tenant_id();
        let mut out = Vec::new();
        wrap_all(tenant_id, actor, std::mem::take(&mut self.tenant_events), &mut out);
        wrap_all(tenant_id, actor, self.directory.take_events(), &mut out);
        wrap_all(tenant_id, actor, self.ledger.take_events(), &mut out);
        wrap_all(tenant_id, actor, self.invoices.take_events(), &mut out);
        out
    }
}

fn wrap_all<E: Event>(
    tenant_id: TenantId,
    actor: Option<UserId>,
    events: Vec<E>,
    out: &mut Vec<EventEnvelope>,
) {
    for event in events {
        match EventEnvelope::wrap(tenant_id, &event) {
            Ok(envelope) => out.push(envelope.with_actor(actor)),
            Err(error) => {
                warn!(%tenant_id, event_type = event.event_type(), %error, "dropping unserializable event");
            }
        }
    }
}

//! Customers, vendors, invoices, notes and aging.

use chrono::NaiveDate;
use tracing::info;

use tallyforge_auth::{Action, resources};
use tallyforge_core::{CustomerId, InvoiceId, VendorId};
use tallyforge_events::{EventBus, EventEnvelope};
use tallyforge_invoicing::{
    AgingReport, Customer, Invoice, InvoiceFilter, InvoiceUpdate, NewInvoice, NewParty,
    PartyUpdate, Vendor,
};

use crate::app::{App, needs};
use crate::context::RequestContext;
use crate::errors::AppResult;

impl<B> App<B>
where
    B: EventBus<EventEnvelope>,
{
    // ─────────────────────────────────────────────────────────────────────
    // Customers
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_customer(&self, ctx: &RequestContext, new: NewParty) -> AppResult<Customer> {
        self.execute(ctx, needs(resources::CUSTOMERS, Action::Create), |books, _| {
            Ok(books.invoices.create_customer(new, &books.ledger, ctx.now)?)
        })
    }

    pub fn get_customer(&self, ctx: &RequestContext, id: CustomerId) -> AppResult<Customer> {
        self.query(ctx, needs(resources::CUSTOMERS, Action::Read), |books| {
            Ok(books.invoices.customer(id)?.clone())
        })
    }

    pub fn list_customers(
        &self,
        ctx: &RequestContext,
        active_only: bool,
        skip: usize,
        limit: Option<usize>,
    ) -> AppResult<Vec<Customer>> {
        self.query(ctx, needs(resources::CUSTOMERS, Action::Read), |books| {
            Ok(books
                .invoices
                .list_customers(active_only, skip, limit)
                .into_iter()
                .cloned()
                .collect())
        })
    }

    pub fn update_customer(
        &self,
        ctx: &RequestContext,
        id: CustomerId,
        update: PartyUpdate,
    ) -> AppResult<Customer> {
        self.execute(ctx, needs(resources::CUSTOMERS, Action::Update), |books, _| {
            Ok(books.invoices.update_customer(id, update, &books.ledger, ctx.now)?)
        })
    }

    pub fn deactivate_customer(&self, ctx: &RequestContext, id: CustomerId) -> AppResult<Customer> {
        self.execute(ctx, needs(resources::CUSTOMERS, Action::Update), |books, _| {
            Ok(books.invoices.deactivate_customer(id, ctx.now)?)
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Vendors
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_vendor(&self, ctx: &RequestContext, new: NewParty) -> AppResult<Vendor> {
        self.execute(ctx, needs(resources::VENDORS, Action::Create), |books, _| {
            Ok(books.invoices.create_vendor(new, &books.ledger, ctx.now)?)
        })
    }

    pub fn get_vendor(&self, ctx: &RequestContext, id: VendorId) -> AppResult<Vendor> {
        self.query(ctx, needs(resources::VENDORS, Action::Read), |books| {
            Ok(books.invoices.vendor(id)?.clone())
        })
    }

    pub fn list_vendors(
        &self,
        ctx: &RequestContext,
        active_only: bool,
        skip: usize,
        limit: Option<usize>,
    ) -> AppResult<Vec<Vendor>> {
        self.query(ctx, needs(resources::VENDORS, Action::Read), |books| {
            Ok(books
                .invoices
                .list_vendors(active_only, skip, limit)
                .into_iter()
                .cloned()
                .collect())
        })
    }

    pub fn update_vendor(&self, ctx: &RequestContext, id: VendorId, update: PartyUpdate) -> AppResult<Vendor> {
        self.execute(ctx, needs(resources::VENDORS, Action::Update), |books, _| {
            Ok(books.invoices.update_vendor(id, update, &books.ledger, ctx.now)?)
        })
    }

    pub fn deactivate_vendor(&self, ctx: &RequestContext, id: VendorId) -> AppResult<Vendor> {
        self.execute(ctx, needs(resources::VENDORS, Action::Update), |books, _| {
            Ok(books.invoices.deactivate_vendor(id, ctx.now)?)
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Invoices
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_invoice(&self, ctx: &RequestContext, new: NewInvoice) -> AppResult<Invoice> {
        self.execute(ctx, needs(resources::INVOICES, Action::Create), |books, _| {
            Ok(books
                .invoices
                .create_invoice(new, &books.ledger, ctx.actor(), ctx.now)?)
        })
    }

    pub fn get_invoice(&self, ctx: &RequestContext, id: InvoiceId) -> AppResult<Invoice> {
        self.query(ctx, needs(resources::INVOICES, Action::Read), |books| {
            Ok(books.invoices.invoice(id)?.clone())
        })
    }

    pub fn list_invoices(&self, ctx: &RequestContext, filter: &InvoiceFilter) -> AppResult<Vec<Invoice>> {
        self.query(ctx, needs(resources::INVOICES, Action::Read), |books| {
            Ok(books
                .invoices
                .list_invoices(filter)
                .into_iter()
                .cloned()
                .collect())
        })
    }

    pub fn update_invoice(
        &self,
        ctx: &RequestContext,
        id: InvoiceId,
        update: InvoiceUpdate,
    ) -> AppResult<Invoice> {
        self.execute(ctx, needs(resources::INVOICES, Action::Update), |books, _| {
            Ok(books
                .invoices
                .update_invoice(id, update, &books.ledger, ctx.now)?)
        })
    }

    /// Post a draft invoice to the ledger. The invoice and its journal entry
    /// commit together or not at all.
    pub fn submit_invoice(&self, ctx: &RequestContext, id: InvoiceId) -> AppResult<Invoice> {
        self.execute(ctx, needs(resources::INVOICES, Action::Update), |books, _| {
            Ok(books
                .invoices
                .submit_invoice(id, &mut books.ledger, ctx.actor(), ctx.today, ctx.now)?)
        })
    }

    pub fn cancel_invoice(&self, ctx: &RequestContext, id: InvoiceId) -> AppResult<Invoice> {
        self.execute(ctx, needs(resources::INVOICES, Action::Update), |books, _| {
            Ok(books
                .invoices
                .cancel_invoice(id, &mut books.ledger, ctx.actor(), ctx.today, ctx.now)?)
        })
    }

    pub fn issue_credit_note(&self, ctx: &RequestContext, original: InvoiceId) -> AppResult<Invoice> {
        let note = self.execute(ctx, needs(resources::INVOICES, Action::Create), |books, _| {
            Ok(books
                .invoices
                .issue_credit_note(original, ctx.actor(), ctx.today, ctx.now)?)
        })?;
        info!(tenant_id = %ctx.tenant_id, invoice_number = note.invoice_number, "credit note drafted");
        Ok(note)
    }

    pub fn issue_debit_note(&self, ctx: &RequestContext, original: InvoiceId) -> AppResult<Invoice> {
        let note = self.execute(ctx, needs(resources::INVOICES, Action::Create), |books, _| {
            Ok(books
                .invoices
                .issue_debit_note(original, ctx.actor(), ctx.today, ctx.now)?)
        })?;
        info!(tenant_id = %ctx.tenant_id, invoice_number = note.invoice_number, "debit note drafted");
        Ok(note)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Aging
    // ─────────────────────────────────────────────────────────────────────

    pub fn ar_aging(&self, ctx: &RequestContext, as_of: NaiveDate) -> AppResult<AgingReport> {
        self.query(ctx, needs(resources::REPORTS, Action::Read), |books| {
            Ok(books.invoices.ar_aging(as_of))
        })
    }

    pub fn ap_aging(&self, ctx: &RequestContext, as_of: NaiveDate) -> AppResult<AgingReport> {
        self.query(ctx, needs(resources::REPORTS, Action::Read), |books| {
            Ok(books.invoices.ap_aging(as_of))
        })
    }
}

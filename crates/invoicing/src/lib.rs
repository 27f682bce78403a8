//! `tallyforge-invoicing`: customers, vendors, invoices and aging.
//!
//! An [`InvoiceBook`] holds a tenant's parties and invoices. Submitting or
//! cancelling an invoice posts to the tenant's [`tallyforge_accounting::Ledger`],
//! which the caller passes in alongside.

pub mod aging;
pub mod book;
pub mod events;
pub mod invoice;
pub mod party;
pub mod posting;

pub use aging::{AgingBucket, AgingBuckets, AgingReport, AgingRow};
pub use book::{InvoiceBook, InvoicingPolicy};
pub use events::InvoiceEvent;
pub use invoice::{
    Invoice, InvoiceFilter, InvoiceLine, InvoiceStatus, InvoiceType, InvoiceUpdate, NewInvoice,
    NewInvoiceLine, PartyRef, PartyType, line_total,
};
pub use party::{Customer, NewParty, Party, PartyProfile, PartyUpdate, Vendor};

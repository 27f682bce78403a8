//! `tallyforge-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model, entity tables, money helpers,
//! pagination and Indian tax identifiers.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod page;
pub mod tax_id;
pub mod value_object;

pub use entity::{Entity, Table};
pub use error::{DomainError, DomainResult};
pub use id::{
    AccountId, CustomerId, FiscalYearId, InvoiceId, JournalEntryId, RoleId, TaxRateId, TenantId,
    UserId, VendorId,
};
pub use money::{
    AMOUNT_LIMIT, BALANCE_EPSILON, QUANTITY_LIMIT, check_stored, checked_sum, round_amount, round_rate,
};
pub use page::{Page, PageRequest};
pub use tax_id::{Gstin, Pan};
pub use value_object::ValueObject;

//! Stable event type names.

pub const USER_CREATED: &str = "user.created";
pub const USER_UPDATED: &str = "user.updated";
pub const USER_DELETED: &str = "user.deleted";

pub const TENANT_CREATED: &str = "tenant.created";
pub const TENANT_PROVISIONED: &str = "tenant.provisioned";
pub const TENANT_SUSPENDED: &str = "tenant.suspended";

pub const JOURNAL_POSTED: &str = "finance.journal_posted";
pub const FISCAL_YEAR_CLOSED: &str = "finance.fiscal_year_closed";

pub const INVOICE_SUBMITTED: &str = "invoice.submitted";
pub const INVOICE_CANCELLED: &str = "invoice.cancelled";
pub const CREDIT_NOTE_ISSUED: &str = "invoice.credit_note_issued";
pub const DEBIT_NOTE_ISSUED: &str = "invoice.debit_note_issued";

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use tallyforge_core::{InvoiceId, JournalEntryId, UserId};
use tallyforge_events::{Event, catalog};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InvoiceEvent {
    Submitted {
        invoice_id: InvoiceId,
        invoice_number: u64,
        journal_entry_id: JournalEntryId,
        total: Decimal,
        submitted_by: Option<UserId>,
        #[serde(skip)]
        occurred_at: DateTime<Utc>,
    },
    Cancelled {
        invoice_id: InvoiceId,
        invoice_number: u64,
        reversal_entry_id: JournalEntryId,
        cancelled_by: Option<UserId>,
        #[serde(skip)]
        occurred_at: DateTime<Utc>,
    },
    CreditNoteIssued {
        invoice_id: InvoiceId,
        invoice_number: u64,
        reversal_of: InvoiceId,
        #[serde(skip)]
        occurred_at: DateTime<Utc>,
    },
    DebitNoteIssued {
        invoice_id: InvoiceId,
        invoice_number: u64,
        reversal_of: InvoiceId,
        #[serde(skip)]
        occurred_at: DateTime<Utc>,
    },
}

impl Event for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::Submitted { .. } => catalog::INVOICE_SUBMITTED,
            InvoiceEvent::Cancelled { .. } => catalog::INVOICE_CANCELLED,
            InvoiceEvent::CreditNoteIssued { .. } => catalog::CREDIT_NOTE_ISSUED,
            InvoiceEvent::DebitNoteIssued { .. } => catalog::DEBIT_NOTE_ISSUED,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceEvent::Submitted { occurred_at, .. }
            | InvoiceEvent::Cancelled { occurred_at, .. }
            | InvoiceEvent::CreditNoteIssued { occurred_at, .. }
            | InvoiceEvent::DebitNoteIssued { occurred_at, .. } => *occurred_at,
        }
    }
}

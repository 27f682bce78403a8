//! Journal entries generated by invoice submission.

use rust_decimal::Decimal;

use tallyforge_accounting::{Ledger, NewJournalEntry, NewJournalLine};
use tallyforge_core::{AccountId, DomainError, DomainResult};

use crate::invoice::{Invoice, InvoiceType, PartyType};

/// Which side the revenue/expense and tax lines land on. The party's
/// control account takes the opposite side for the invoice total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Credit line and tax accounts, debit the control account.
    CreditLines,
    /// Debit line and tax accounts, credit the control account.
    DebitLines,
}

/// Direction for an invoice type and counterparty.
///
/// | type        | party    | direction   |
/// |-------------|----------|-------------|
/// | sales       | customer | CreditLines |
/// | debit_note  | vendor   | CreditLines |
/// | purchase    | vendor   | DebitLines  |
/// | credit_note | customer | DebitLines  |
pub fn direction(invoice_type: InvoiceType, party_type: PartyType) -> DomainResult<Direction> {
    match (invoice_type, party_type) {
        (InvoiceType::Sales, PartyType::Customer) | (InvoiceType::DebitNote, PartyType::Vendor) => {
            Ok(Direction::CreditLines)
        }
        (InvoiceType::Purchase, PartyType::Vendor)
        | (InvoiceType::CreditNote, PartyType::Customer) => Ok(Direction::DebitLines),
        (t, p) => Err(DomainError::validation(format!(
            "invoice type {t:?} cannot be raised against a {p:?}"
        ))),
    }
}

fn line(direction: Direction, account_id: AccountId, amount: Decimal) -> NewJournalLine {
    match direction {
        Direction::CreditLines => NewJournalLine::credit(account_id, amount),
        Direction::DebitLines => NewJournalLine::debit(account_id, amount),
    }
}

/// Build the balanced entry for a priced invoice. Zero amounts produce no
/// line.
pub fn journal_for(
    invoice: &Invoice,
    control_account_id: AccountId,
    ledger: &Ledger,
) -> DomainResult<NewJournalEntry> {
    let direction = direction(invoice.invoice_type, invoice.party.party_type())?;
    let mut lines = Vec::with_capacity(invoice.lines.len() * 2 + 1);

    for invoice_line in &invoice.lines {
        if invoice_line.line_total > Decimal::ZERO {
            lines.push(
                line(direction, invoice_line.account_id, invoice_line.line_total)
                    .described(invoice_line.description.clone()),
            );
        }
        if let Some(rate_id) = invoice_line.tax_rate_id {
            if invoice_line.tax_amount > Decimal::ZERO {
                let rate = ledger.tax_rate(rate_id)?;
                lines.push(
                    line(direction, rate.account_id, invoice_line.tax_amount)
                        .described(rate.name.clone()),
                );
            }
        }
    }

    let control = match direction {
        Direction::CreditLines => NewJournalLine::debit(control_account_id, invoice.total),
        Direction::DebitLines => NewJournalLine::credit(control_account_id, invoice.total),
    };
    lines.push(control);

    Ok(NewJournalEntry {
        posting_date: invoice.invoice_date,
        description: Some(format!(
            "{} {}",
            invoice.invoice_type.label(),
            invoice.invoice_number
        )),
        reference: Some(format!("INV-{}", invoice.invoice_number)),
        lines,
    })
}

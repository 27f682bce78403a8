use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallyforge_accounting::Ledger;
use tallyforge_core::{
    AMOUNT_LIMIT, AccountId, CustomerId, DomainError, DomainResult, Entity, InvoiceId,
    JournalEntryId, QUANTITY_LIMIT, TaxRateId, TenantId, UserId, VendorId, check_stored,
    round_amount,
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    Sales,
    Purchase,
    CreditNote,
    DebitNote,
}

impl InvoiceType {
    /// Human label used in journal descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sales => "Sales",
            Self::Purchase => "Purchase",
            Self::CreditNote => "Credit note",
            Self::DebitNote => "Debit note",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyType {
    Customer,
    Vendor,
}

/// The counterparty of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "party_type", content = "party_id", rename_all = "lowercase")]
pub enum PartyRef {
    Customer(CustomerId),
    Vendor(VendorId),
}

impl PartyRef {
    pub fn party_type(&self) -> PartyType {
        match self {
            Self::Customer(_) => PartyType::Customer,
            Self::Vendor(_) => PartyType::Vendor,
        }
    }

    pub fn as_uuid(&self) -> Uuid {
        match self {
            Self::Customer(id) => *id.as_uuid(),
            Self::Vendor(id) => *id.as_uuid(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Submitted,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub line_number: u32,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
    pub account_id: AccountId,
    pub tax_rate_id: Option<TaxRateId>,
    pub tax_amount: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub tenant_id: TenantId,
    pub invoice_number: u64,
    pub invoice_type: InvoiceType,
    #[serde(flatten)]
    pub party: PartyRef,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub currency_code: String,
    pub exchange_rate: Decimal,
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub total: Decimal,
    pub journal_entry_id: Option<JournalEntryId>,
    /// For credit and debit notes, the invoice they adjust.
    pub reversal_of: Option<InvoiceId>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<InvoiceLine>,
}

impl Entity for Invoice {
    type Id = InvoiceId;
    const KIND: &'static str = "invoice";

    fn id(&self) -> InvoiceId {
        self.id
    }
}

impl Invoice {
    pub fn is_draft(&self) -> bool {
        self.status == InvoiceStatus::Draft
    }

    /// Recompute header totals from the lines.
    pub(crate) fn set_lines(&mut self, lines: Vec<InvoiceLine>) {
        self.subtotal = lines.iter().map(|l| l.line_total).sum();
        self.total_tax = lines.iter().map(|l| l.tax_amount).sum();
        self.total = self.subtotal + self.total_tax;
        self.lines = lines;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInvoiceLine {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount_percent: Decimal,
    pub account_id: AccountId,
    pub tax_rate_id: Option<TaxRateId>,
}

impl From<&InvoiceLine> for NewInvoiceLine {
    fn from(line: &InvoiceLine) -> Self {
        Self {
            description: line.description.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            discount_percent: line.discount_percent,
            account_id: line.account_id,
            tax_rate_id: line.tax_rate_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_type: InvoiceType,
    pub party: PartyRef,
    pub invoice_date: NaiveDate,
    /// Defaults to the invoice date plus the party's payment terms.
    pub due_date: Option<NaiveDate>,
    /// Defaults to the party's currency.
    pub currency_code: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub lines: Vec<NewInvoiceLine>,
}

/// Changes to a draft. `lines`, when present, replaces every line.
#[derive(Debug, Clone, Default)]
pub struct InvoiceUpdate {
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub lines: Option<Vec<NewInvoiceLine>>,
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub invoice_type: Option<InvoiceType>,
    pub party: Option<PartyRef>,
    pub status: Option<InvoiceStatus>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl InvoiceFilter {
    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.invoice_type.is_none_or(|t| invoice.invoice_type == t)
            && self.party.is_none_or(|p| invoice.party == p)
            && self.status.is_none_or(|s| invoice.status == s)
    }
}

/// `quantity × unit_price × (1 − discount / 100)`, rounded to paise.
pub fn line_total(
    quantity: Decimal,
    unit_price: Decimal,
    discount_percent: Decimal,
) -> DomainResult<Decimal> {
    let factor = Decimal::ONE - discount_percent / Decimal::ONE_HUNDRED;
    let total = quantity
        .checked_mul(unit_price)
        .and_then(|gross| gross.checked_mul(factor))
        .map(round_amount)
        .ok_or_else(|| DomainError::validation("line total is out of range"))?;
    check_stored("line total", total, AMOUNT_LIMIT)?;
    Ok(total)
}

fn check_line_shape(idx: usize, line: &NewInvoiceLine) -> DomainResult<()> {
    let n = idx + 1;
    if line.description.trim().is_empty() {
        return Err(DomainError::validation(format!("line {n}: description is required")));
    }
    if line.quantity <= Decimal::ZERO {
        return Err(DomainError::validation(format!("line {n}: quantity must be positive")));
    }
    check_stored(&format!("line {n}: quantity"), line.quantity, QUANTITY_LIMIT)?;
    check_stored(&format!("line {n}: unit price"), line.unit_price, AMOUNT_LIMIT)?;
    if line.unit_price < Decimal::ZERO {
        return Err(DomainError::validation(format!(
            "line {n}: unit price cannot be negative"
        )));
    }
    if line.discount_percent < Decimal::ZERO || line.discount_percent > Decimal::ONE_HUNDRED {
        return Err(DomainError::validation(format!(
            "line {n}: discount must be between 0 and 100"
        )));
    }
    Ok(())
}

/// Validate lines against the ledger and price them with current tax
/// rates.
pub(crate) fn price_lines(ledger: &Ledger, lines: &[NewInvoiceLine]) -> DomainResult<Vec<InvoiceLine>> {
    if lines.is_empty() {
        return Err(DomainError::validation("invoice must have at least one line"));
    }

    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            check_line_shape(idx, line)?;

            let postable = ledger
                .account(line.account_id)
                .map(|a| a.is_postable())
                .unwrap_or(false);
            if !postable {
                return Err(DomainError::validation(format!(
                    "line account {} must be an active leaf account",
                    line.account_id
                )));
            }

            let total = line_total(line.quantity, line.unit_price, line.discount_percent)?;
            let tax_amount = match line.tax_rate_id {
                Some(id) => match ledger.tax_rate(id) {
                    Ok(rate) if rate.is_active => rate.compute_tax(total),
                    _ => {
                        return Err(DomainError::validation(format!(
                            "tax rate {id} not found or inactive"
                        )));
                    }
                },
                None => Decimal::ZERO,
            };

            Ok(InvoiceLine {
                line_number: idx as u32 + 1,
                description: line.description.trim().to_string(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                discount_percent: line.discount_percent,
                account_id: line.account_id,
                tax_rate_id: line.tax_rate_id,
                tax_amount,
                line_total: total,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn discount_applies_before_rounding() {
        assert_eq!(line_total(dec!(3), dec!(33.333), dec!(10)).unwrap(), dec!(90.00));
        assert_eq!(line_total(dec!(1), dec!(0.015), dec!(0)).unwrap(), dec!(0.02));
        assert_eq!(line_total(dec!(2), dec!(500), dec!(100)).unwrap(), dec!(0));
    }

    #[test]
    fn oversized_line_totals_are_errors_not_panics() {
        assert_eq!(
            line_total(dec!(10), Decimal::MAX, dec!(0)).unwrap_err(),
            DomainError::validation("line total is out of range")
        );
        assert!(line_total(dec!(99999999), dec!(99999999999999), dec!(0)).is_err());
    }

    #[test]
    fn party_ref_serializes_flat() {
        let id = CustomerId::new();
        let json = serde_json::to_value(PartyRef::Customer(id)).unwrap();
        assert_eq!(json["party_type"], "customer");
        assert_eq!(json["party_id"], id.to_string());
    }

    #[test]
    fn invoice_type_labels() {
        assert_eq!(InvoiceType::CreditNote.label(), "Credit note");
        assert_eq!(
            serde_json::to_string(&InvoiceType::DebitNote).unwrap(),
            "\"debit_note\""
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

        #[test]
        fn line_total_never_exceeds_gross(
            qty in 1i64..10_000,
            price in 0i64..1_000_000,
            discount in 0i64..=10_000,
        ) {
            let quantity = Decimal::new(qty, 2);
            let unit_price = Decimal::new(price, 2);
            let discount = Decimal::new(discount, 2);
            let total = line_total(quantity, unit_price, discount).unwrap();
            prop_assert!(total >= Decimal::ZERO);
            prop_assert!(total <= round_amount(quantity * unit_price));
        }
    }
}

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;

use tallyforge_accounting::Ledger;
use tallyforge_accounting::account::validate_currency;
use tallyforge_core::money::EXCHANGE_RATE_SCALE;
use tallyforge_core::{
    AccountId, CustomerId, DomainError, DomainResult, InvoiceId, Table, TenantId, UserId,
    VendorId, page,
};

use crate::events::InvoiceEvent;
use crate::invoice::{
    Invoice, InvoiceFilter, InvoiceStatus, InvoiceType, InvoiceUpdate, NewInvoice,
    NewInvoiceLine, PartyRef, price_lines,
};
use crate::party::{Customer, NewParty, Party, PartyProfile, PartyUpdate, Vendor, new_party, update_party};
use crate::posting;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicingPolicy {
    /// Invoice numbers start at `number_base + 1`.
    pub number_base: u64,
    pub default_payment_terms_days: u32,
}

impl Default for InvoicingPolicy {
    fn default() -> Self {
        Self {
            number_base: 1000,
            default_payment_terms_days: 30,
        }
    }
}

/// A tenant's parties and invoices.
#[derive(Debug, Clone)]
pub struct InvoiceBook {
    tenant_id: TenantId,
    policy: InvoicingPolicy,
    pub(crate) customers: Table<Customer>,
    pub(crate) vendors: Table<Vendor>,
    pub(crate) invoices: Table<Invoice>,
    events: Vec<InvoiceEvent>,
}

fn list_parties<P: Party>(table: &Table<P>, active_only: bool, skip: usize, limit: Option<usize>) -> Vec<&P> {
    let rows = table.select(
        |p| !active_only || p.is_active(),
        |a, b| a.profile().legal_name.cmp(&b.profile().legal_name),
    );
    page::window(rows, skip, limit)
}

impl InvoiceBook {
    pub fn new(tenant_id: TenantId, policy: InvoicingPolicy) -> Self {
        Self {
            tenant_id,
            policy,
            customers: Table::new(),
            vendors: Table::new(),
            invoices: Table::new(),
            events: Vec::new(),
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn take_events(&mut self) -> Vec<InvoiceEvent> {
        std::mem::take(&mut self.events)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Customers
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_customer(&mut self, new: NewParty, ledger: &Ledger, now: DateTime<Utc>) -> DomainResult<Customer> {
        let customer: Customer = new_party(
            CustomerId::new(),
            self.tenant_id,
            &new,
            ledger,
            self.policy.default_payment_terms_days,
            now,
        )?;
        self.customers.insert(customer.clone());
        Ok(customer)
    }

    pub fn customer(&self, id: CustomerId) -> DomainResult<&Customer> {
        self.customers.require(id)
    }

    /// Ordered by legal name.
    pub fn list_customers(&self, active_only: bool, skip: usize, limit: Option<usize>) -> Vec<&Customer> {
        list_parties(&self.customers, active_only, skip, limit)
    }

    pub fn update_customer(
        &mut self,
        id: CustomerId,
        update: PartyUpdate,
        ledger: &Ledger,
        now: DateTime<Utc>,
    ) -> DomainResult<Customer> {
        let mut customer = self.customers.require(id)?.clone();
        update_party(&mut customer, &update, ledger, now)?;
        self.customers.insert(customer.clone());
        Ok(customer)
    }

    pub fn deactivate_customer(&mut self, id: CustomerId, now: DateTime<Utc>) -> DomainResult<Customer> {
        let customer = self.customers.require_mut(id)?;
        customer.set_active(false);
        customer.touch(now);
        Ok(customer.clone())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Vendors
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_vendor(&mut self, new: NewParty, ledger: &Ledger, now: DateTime<Utc>) -> DomainResult<Vendor> {
        let vendor: Vendor = new_party(
            VendorId::new(),
            self.tenant_id,
            &new,
            ledger,
            self.policy.default_payment_terms_days,
            now,
        )?;
        self.vendors.insert(vendor.clone());
        Ok(vendor)
    }

    pub fn vendor(&self, id: VendorId) -> DomainResult<&Vendor> {
        self.vendors.require(id)
    }

    pub fn list_vendors(&self, active_only: bool, skip: usize, limit: Option<usize>) -> Vec<&Vendor> {
        list_parties(&self.vendors, active_only, skip, limit)
    }

    pub fn update_vendor(
        &mut self,
        id: VendorId,
        update: PartyUpdate,
        ledger: &Ledger,
        now: DateTime<Utc>,
    ) -> DomainResult<Vendor> {
        let mut vendor = self.vendors.require(id)?.clone();
        update_party(&mut vendor, &update, ledger, now)?;
        self.vendors.insert(vendor.clone());
        Ok(vendor)
    }

    pub fn deactivate_vendor(&mut self, id: VendorId, now: DateTime<Utc>) -> DomainResult<Vendor> {
        let vendor = self.vendors.require_mut(id)?;
        vendor.set_active(false);
        vendor.touch(now);
        Ok(vendor.clone())
    }

    /// Profile and control account of an active party.
    pub fn active_party(&self, party: PartyRef) -> DomainResult<(&PartyProfile, AccountId)> {
        fn active<P: Party>(table: &Table<P>, id: P::Id) -> DomainResult<(&PartyProfile, AccountId)> {
            match table.get(id) {
                Some(p) if p.is_active() => Ok((p.profile(), p.control_account_id())),
                _ => Err(DomainError::not_found(P::KIND, format!("{id} (or inactive)"))),
            }
        }
        match party {
            PartyRef::Customer(id) => active(&self.customers, id),
            PartyRef::Vendor(id) => active(&self.vendors, id),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Invoices
    // ─────────────────────────────────────────────────────────────────────

    fn next_invoice_number(&self) -> u64 {
        self.invoices
            .iter()
            .map(|i| i.invoice_number)
            .max()
            .unwrap_or(self.policy.number_base)
            + 1
    }

    pub fn create_invoice(
        &mut self,
        new: NewInvoice,
        ledger: &Ledger,
        created_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> DomainResult<Invoice> {
        posting::direction(new.invoice_type, new.party.party_type())?;
        let (profile, _) = self.active_party(new.party)?;

        let due_date = match new.due_date {
            Some(due) => due,
            None => new
                .invoice_date
                .checked_add_days(Days::new(u64::from(profile.payment_terms_days)))
                .ok_or_else(|| DomainError::validation("due date out of range"))?,
        };
        check_dates(new.invoice_date, due_date)?;
        let currency_code = validate_currency(
            new.currency_code.as_deref().unwrap_or(&profile.currency_code),
        )?;
        let exchange_rate = match new.exchange_rate {
            Some(rate) if rate <= Decimal::ZERO => {
                return Err(DomainError::validation("exchange rate must be positive"));
            }
            Some(rate) => rate.round_dp(EXCHANGE_RATE_SCALE),
            None => Decimal::ONE,
        };
        let lines = price_lines(ledger, &new.lines)?;

        let mut invoice = Invoice {
            id: InvoiceId::new(),
            tenant_id: self.tenant_id,
            invoice_number: self.next_invoice_number(),
            invoice_type: new.invoice_type,
            party: new.party,
            invoice_date: new.invoice_date,
            due_date,
            status: InvoiceStatus::Draft,
            currency_code,
            exchange_rate,
            subtotal: Decimal::ZERO,
            total_tax: Decimal::ZERO,
            total: Decimal::ZERO,
            journal_entry_id: None,
            reversal_of: None,
            notes: new.notes,
            terms: new.terms,
            created_by,
            created_at: now,
            updated_at: now,
            lines: Vec::new(),
        };
        invoice.set_lines(lines);
        self.invoices.insert(invoice.clone());
        Ok(invoice)
    }

    pub fn invoice(&self, id: InvoiceId) -> DomainResult<&Invoice> {
        self.invoices.require(id)
    }

    /// Newest invoice date first, then highest number.
    pub fn list_invoices(&self, filter: &InvoiceFilter) -> Vec<&Invoice> {
        let rows = self.invoices.select(
            |i| filter.matches(i),
            |a, b| {
                b.invoice_date
                    .cmp(&a.invoice_date)
                    .then(b.invoice_number.cmp(&a.invoice_number))
            },
        );
        page::window(rows, filter.skip, filter.limit)
    }

    pub fn update_invoice(
        &mut self,
        id: InvoiceId,
        update: InvoiceUpdate,
        ledger: &Ledger,
        now: DateTime<Utc>,
    ) -> DomainResult<Invoice> {
        let mut invoice = self.invoices.require(id)?.clone();
        if !invoice.is_draft() {
            return Err(DomainError::forbidden("invoice is immutable once submitted"));
        }

        if let Some(date) = update.invoice_date {
            invoice.invoice_date = date;
        }
        if let Some(date) = update.due_date {
            invoice.due_date = date;
        }
        check_dates(invoice.invoice_date, invoice.due_date)?;
        if update.notes.is_some() {
            invoice.notes = update.notes;
        }
        if update.terms.is_some() {
            invoice.terms = update.terms;
        }
        if let Some(lines) = update.lines {
            invoice.set_lines(price_lines(ledger, &lines)?);
        }
        invoice.updated_at = now;

        self.invoices.insert(invoice.clone());
        Ok(invoice)
    }

    /// Re-price a draft with current tax rates and post its journal entry.
    pub fn submit_invoice(
        &mut self,
        id: InvoiceId,
        ledger: &mut Ledger,
        submitted_by: Option<UserId>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<Invoice> {
        let mut invoice = self.invoices.require(id)?.clone();
        if !invoice.is_draft() {
            return Err(DomainError::validation("only draft invoices can be submitted"));
        }
        if invoice.lines.is_empty() {
            return Err(DomainError::validation("cannot submit an invoice with no lines"));
        }
        let (_, control_account_id) = self.active_party(invoice.party)?;

        let current: Vec<NewInvoiceLine> = invoice.lines.iter().map(NewInvoiceLine::from).collect();
        invoice.set_lines(price_lines(ledger, &current)?);

        let journal = posting::journal_for(&invoice, control_account_id, ledger)?;
        let entry = ledger.post_journal_entry(journal, submitted_by, today, now)?;

        invoice.journal_entry_id = Some(entry.id);
        invoice.status = InvoiceStatus::Submitted;
        invoice.updated_at = now;

        info!(
            tenant_id = %self.tenant_id,
            invoice_number = invoice.invoice_number,
            entry_number = entry.entry_number,
            total = %invoice.total,
            "invoice submitted"
        );
        self.events.push(InvoiceEvent::Submitted {
            invoice_id: invoice.id,
            invoice_number: invoice.invoice_number,
            journal_entry_id: entry.id,
            total: invoice.total,
            submitted_by,
            occurred_at: now,
        });
        self.invoices.insert(invoice.clone());
        Ok(invoice)
    }

    /// Reverse the posted journal entry, dated `today`.
    pub fn cancel_invoice(
        &mut self,
        id: InvoiceId,
        ledger: &mut Ledger,
        cancelled_by: Option<UserId>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<Invoice> {
        let mut invoice = self.invoices.require(id)?.clone();
        if invoice.status != InvoiceStatus::Submitted {
            return Err(DomainError::validation("only submitted invoices can be cancelled"));
        }
        let Some(entry_id) = invoice.journal_entry_id else {
            return Err(DomainError::invariant(format!(
                "submitted invoice {} has no journal entry",
                invoice.invoice_number
            )));
        };

        let reversal = ledger.reverse_journal_entry(
            entry_id,
            today,
            Some(format!("Cancellation of invoice {}", invoice.invoice_number)),
            cancelled_by,
            now,
        )?;

        invoice.status = InvoiceStatus::Cancelled;
        invoice.updated_at = now;

        info!(
            tenant_id = %self.tenant_id,
            invoice_number = invoice.invoice_number,
            "invoice cancelled"
        );
        self.events.push(InvoiceEvent::Cancelled {
            invoice_id: invoice.id,
            invoice_number: invoice.invoice_number,
            reversal_entry_id: reversal.id,
            cancelled_by,
            occurred_at: now,
        });
        self.invoices.insert(invoice.clone());
        Ok(invoice)
    }

    /// Draft credit note cloning a submitted sales invoice.
    pub fn issue_credit_note(
        &mut self,
        original_id: InvoiceId,
        created_by: Option<UserId>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<Invoice> {
        let note = self.draft_note(original_id, InvoiceType::CreditNote, created_by, today, now)?;
        self.events.push(InvoiceEvent::CreditNoteIssued {
            invoice_id: note.id,
            invoice_number: note.invoice_number,
            reversal_of: original_id,
            occurred_at: now,
        });
        Ok(note)
    }

    /// Draft debit note cloning a submitted purchase invoice.
    pub fn issue_debit_note(
        &mut self,
        original_id: InvoiceId,
        created_by: Option<UserId>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<Invoice> {
        let note = self.draft_note(original_id, InvoiceType::DebitNote, created_by, today, now)?;
        self.events.push(InvoiceEvent::DebitNoteIssued {
            invoice_id: note.id,
            invoice_number: note.invoice_number,
            reversal_of: original_id,
            occurred_at: now,
        });
        Ok(note)
    }

    fn draft_note(
        &mut self,
        original_id: InvoiceId,
        note_type: InvoiceType,
        created_by: Option<UserId>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<Invoice> {
        let (label, against) = match note_type {
            InvoiceType::CreditNote => ("credit", InvoiceType::Sales),
            _ => ("debit", InvoiceType::Purchase),
        };
        let original = self.invoices.require(original_id)?;
        match original.status {
            InvoiceStatus::Cancelled => {
                return Err(DomainError::validation(format!(
                    "cannot issue {label} note against a cancelled invoice"
                )));
            }
            InvoiceStatus::Draft => {
                return Err(DomainError::validation(format!(
                    "can only issue {label} note against submitted invoice"
                )));
            }
            InvoiceStatus::Submitted => {}
        }
        if original.invoice_type != against {
            return Err(DomainError::validation(format!(
                "{label} notes can only be issued against {} invoices",
                against.label().to_lowercase()
            )));
        }

        let mut note = Invoice {
            id: InvoiceId::new(),
            tenant_id: self.tenant_id,
            invoice_number: self.next_invoice_number(),
            invoice_type: note_type,
            party: original.party,
            invoice_date: today,
            due_date: today,
            status: InvoiceStatus::Draft,
            currency_code: original.currency_code.clone(),
            exchange_rate: original.exchange_rate,
            subtotal: Decimal::ZERO,
            total_tax: Decimal::ZERO,
            total: Decimal::ZERO,
            journal_entry_id: None,
            reversal_of: Some(original_id),
            notes: None,
            terms: None,
            created_by,
            created_at: now,
            updated_at: now,
            lines: Vec::new(),
        };
        note.set_lines(original.lines.clone());
        self.invoices.insert(note.clone());
        Ok(note)
    }
}

fn check_dates(invoice_date: NaiveDate, due_date: NaiveDate) -> DomainResult<()> {
    if due_date < invoice_date {
        return Err(DomainError::validation(
            "due date must be on or after the invoice date",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Books, books, date, sale_line};
    use rust_decimal_macros::dec;
    use tallyforge_accounting::JournalFilter;
    use tallyforge_accounting::seed::codes;

    fn sales(b: &Books, lines: Vec<NewInvoiceLine>) -> NewInvoice {
        NewInvoice {
            invoice_type: InvoiceType::Sales,
            party: PartyRef::Customer(b.customer),
            invoice_date: date(2024, 6, 1),
            due_date: None,
            currency_code: None,
            exchange_rate: None,
            notes: None,
            terms: None,
            lines,
        }
    }

    fn purchase(b: &Books, lines: Vec<NewInvoiceLine>) -> NewInvoice {
        NewInvoice {
            invoice_type: InvoiceType::Purchase,
            party: PartyRef::Vendor(b.vendor),
            ..sales(b, lines)
        }
    }

    #[test]
    fn numbers_start_after_the_base() {
        let mut b = books();
        let line = sale_line(&b, dec!(100), None);
        let first = b.book.create_invoice(sales(&b, vec![line.clone()]), &b.ledger, None, Utc::now()).unwrap();
        let second = b.book.create_invoice(sales(&b, vec![line]), &b.ledger, None, Utc::now()).unwrap();
        assert_eq!(first.invoice_number, 1001);
        assert_eq!(second.invoice_number, 1002);
    }

    #[test]
    fn due_date_defaults_to_payment_terms() {
        let mut b = books();
        let line = sale_line(&b, dec!(100), None);
        let invoice = b.book.create_invoice(sales(&b, vec![line]), &b.ledger, None, Utc::now()).unwrap();
        assert_eq!(invoice.due_date, date(2024, 7, 1));
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.exchange_rate, Decimal::ONE);
    }

    #[test]
    fn create_computes_totals() {
        let mut b = books();
        let tax = Some(b.output_igst_18);
        let lines = vec![sale_line(&b, dec!(1000), tax), sale_line(&b, dec!(250), None)];
        let invoice = b.book.create_invoice(sales(&b, lines), &b.ledger, None, Utc::now()).unwrap();
        assert_eq!(invoice.subtotal, dec!(1250));
        assert_eq!(invoice.total_tax, dec!(180));
        assert_eq!(invoice.total, dec!(1430));
    }

    #[test]
    fn sales_to_a_vendor_is_rejected() {
        let mut b = books();
        let line = sale_line(&b, dec!(100), None);
        let mut new = sales(&b, vec![line]);
        new.party = PartyRef::Vendor(b.vendor);
        assert!(matches!(
            b.book.create_invoice(new, &b.ledger, None, Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn inactive_customer_cannot_be_invoiced() {
        let mut b = books();
        b.book.deactivate_customer(b.customer, Utc::now()).unwrap();
        let line = sale_line(&b, dec!(100), None);
        let err = b.book.create_invoice(sales(&b, vec![line]), &b.ledger, None, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "customer", .. }));
    }

    #[test]
    fn due_before_invoice_date_is_rejected() {
        let mut b = books();
        let line = sale_line(&b, dec!(100), None);
        let mut new = sales(&b, vec![line]);
        new.due_date = Some(date(2024, 5, 31));
        assert!(b.book.create_invoice(new, &b.ledger, None, Utc::now()).is_err());
    }

    #[test]
    fn oversized_prices_are_rejected() {
        let mut b = books();
        let mut line = sale_line(&b, dec!(100), None);
        line.unit_price = Decimal::MAX;
        line.quantity = dec!(10);
        let err = b.book.create_invoice(sales(&b, vec![line.clone()]), &b.ledger, None, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("line 1: unit price must be less than"));

        line.unit_price = dec!(99999999999999);
        line.quantity = dec!(99999999);
        let err = b.book.create_invoice(sales(&b, vec![line]), &b.ledger, None, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("line total must be less than"));
    }

    #[test]
    fn group_line_account_is_rejected() {
        let mut b = books();
        let mut line = sale_line(&b, dec!(100), None);
        line.account_id = b.ledger.account_by_code("4000").unwrap().id;
        let err = b.book.create_invoice(sales(&b, vec![line]), &b.ledger, None, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("active leaf account"));
    }

    #[test]
    fn submitting_a_sale_posts_a_balanced_entry() {
        let mut b = books();
        let tax = Some(b.output_igst_18);
        let line = sale_line(&b, dec!(1000), tax);
        let invoice = b.book.create_invoice(sales(&b, vec![line]), &b.ledger, None, Utc::now()).unwrap();
        let submitted = b
            .book
            .submit_invoice(invoice.id, &mut b.ledger, None, date(2024, 6, 1), Utc::now())
            .unwrap();

        assert_eq!(submitted.status, InvoiceStatus::Submitted);
        let entry = b.ledger.journal_entry(submitted.journal_entry_id.unwrap()).unwrap();
        assert_eq!(entry.description.as_deref(), Some("Sales 1001"));
        assert_eq!(entry.reference.as_deref(), Some("INV-1001"));
        assert_eq!(entry.total_debit(), dec!(1180));
        assert_eq!(entry.total_credit(), dec!(1180));

        let receivables = b.ledger.account_by_code(codes::RECEIVABLES).unwrap().id;
        let igst = b.ledger.account_by_code("2122").unwrap().id;
        assert!(entry.lines.iter().any(|l| l.account_id == receivables && l.debit == dec!(1180)));
        assert!(entry.lines.iter().any(|l| l.account_id == igst && l.credit == dec!(180)));

        let events = b.book.take_events();
        let InvoiceEvent::Submitted { journal_entry_id, .. } = &events[0] else {
            panic!("expected Submitted, got {:?}", events[0]);
        };
        assert_eq!(*journal_entry_id, entry.id);
    }

    #[test]
    fn purchase_debits_expense_and_input_credit() {
        let mut b = books();
        let rent = b.ledger.account_by_code("5220").unwrap().id;
        let line = NewInvoiceLine {
            account_id: rent,
            tax_rate_id: Some(b.input_cgst_9),
            ..sale_line(&b, dec!(200), None)
        };
        let invoice = b.book.create_invoice(purchase(&b, vec![line]), &b.ledger, None, Utc::now()).unwrap();
        let submitted = b
            .book
            .submit_invoice(invoice.id, &mut b.ledger, None, date(2024, 6, 1), Utc::now())
            .unwrap();

        let entry = b.ledger.journal_entry(submitted.journal_entry_id.unwrap()).unwrap();
        let payables = b.ledger.account_by_code(codes::PAYABLES).unwrap().id;
        assert!(entry.lines.iter().any(|l| l.account_id == rent && l.debit == dec!(200)));
        assert!(entry.lines.iter().any(|l| l.account_id == payables && l.credit == dec!(218)));
    }

    #[test]
    fn zero_rated_tax_adds_no_journal_line() {
        let mut b = books();
        let tax = Some(b.output_igst_0);
        let line = sale_line(&b, dec!(500), tax);
        let invoice = b.book.create_invoice(sales(&b, vec![line]), &b.ledger, None, Utc::now()).unwrap();
        let submitted = b
            .book
            .submit_invoice(invoice.id, &mut b.ledger, None, date(2024, 6, 1), Utc::now())
            .unwrap();
        let entry = b.ledger.journal_entry(submitted.journal_entry_id.unwrap()).unwrap();
        assert_eq!(entry.lines.len(), 2);
    }

    #[test]
    fn submitted_invoices_are_immutable() {
        let mut b = books();
        let line = sale_line(&b, dec!(100), None);
        let invoice = b.book.create_invoice(sales(&b, vec![line]), &b.ledger, None, Utc::now()).unwrap();
        b.book
            .submit_invoice(invoice.id, &mut b.ledger, None, date(2024, 6, 1), Utc::now())
            .unwrap();

        let update = InvoiceUpdate {
            notes: Some("late edit".to_string()),
            ..Default::default()
        };
        assert_eq!(
            b.book.update_invoice(invoice.id, update, &b.ledger, Utc::now()).unwrap_err(),
            DomainError::forbidden("invoice is immutable once submitted")
        );
        assert!(b
            .book
            .submit_invoice(invoice.id, &mut b.ledger, None, date(2024, 6, 1), Utc::now())
            .is_err());
    }

    #[test]
    fn update_replaces_lines_and_totals() {
        let mut b = books();
        let line = sale_line(&b, dec!(100), None);
        let invoice = b.book.create_invoice(sales(&b, vec![line]), &b.ledger, None, Utc::now()).unwrap();
        let update = InvoiceUpdate {
            lines: Some(vec![sale_line(&b, dec!(40), None), sale_line(&b, dec!(60), None)]),
            ..Default::default()
        };
        let updated = b.book.update_invoice(invoice.id, update, &b.ledger, Utc::now()).unwrap();
        assert_eq!(updated.lines.len(), 2);
        assert_eq!(updated.lines[1].line_number, 2);
        assert_eq!(updated.total, dec!(100));
    }

    #[test]
    fn failed_posting_leaves_the_draft_untouched() {
        let mut b = books();
        let line = sale_line(&b, dec!(100), None);
        let mut new = sales(&b, vec![line]);
        new.invoice_date = date(2023, 6, 1);
        let invoice = b.book.create_invoice(new, &b.ledger, None, Utc::now()).unwrap();
        assert!(b
            .book
            .submit_invoice(invoice.id, &mut b.ledger, None, date(2024, 6, 1), Utc::now())
            .is_err());
        assert_eq!(b.book.invoice(invoice.id).unwrap().status, InvoiceStatus::Draft);
        assert!(b.book.take_events().is_empty());
    }

    #[test]
    fn cancelling_reverses_the_entry() {
        let mut b = books();
        let line = sale_line(&b, dec!(100), None);
        let invoice = b.book.create_invoice(sales(&b, vec![line]), &b.ledger, None, Utc::now()).unwrap();
        let submitted = b
            .book
            .submit_invoice(invoice.id, &mut b.ledger, None, date(2024, 6, 1), Utc::now())
            .unwrap();
        let cancelled = b
            .book
            .cancel_invoice(invoice.id, &mut b.ledger, None, date(2024, 6, 5), Utc::now())
            .unwrap();
        assert_eq!(cancelled.status, InvoiceStatus::Cancelled);

        let original = b.ledger.journal_entry(submitted.journal_entry_id.unwrap()).unwrap();
        let reversal = b.ledger.journal_entry(original.reversed_by.unwrap()).unwrap();
        assert_eq!(reversal.posting_date, date(2024, 6, 5));
        assert_eq!(reversal.description.as_deref(), Some("Cancellation of invoice 1001"));

        assert!(b
            .book
            .cancel_invoice(invoice.id, &mut b.ledger, None, date(2024, 6, 5), Utc::now())
            .is_err());
    }

    #[test]
    fn credit_note_clones_a_submitted_sale() {
        let mut b = books();
        let tax = Some(b.output_igst_18);
        let line = sale_line(&b, dec!(1000), tax);
        let invoice = b.book.create_invoice(sales(&b, vec![line]), &b.ledger, None, Utc::now()).unwrap();
        b.book
            .submit_invoice(invoice.id, &mut b.ledger, None, date(2024, 6, 1), Utc::now())
            .unwrap();
        b.book.take_events();

        let note = b
            .book
            .issue_credit_note(invoice.id, None, date(2024, 6, 10), Utc::now())
            .unwrap();
        assert_eq!(note.invoice_type, InvoiceType::CreditNote);
        assert_eq!(note.reversal_of, Some(invoice.id));
        assert_eq!(note.status, InvoiceStatus::Draft);
        assert_eq!(note.invoice_date, date(2024, 6, 10));
        assert_eq!(note.lines.len(), 1);

        let submitted = b
            .book
            .submit_invoice(note.id, &mut b.ledger, None, date(2024, 6, 10), Utc::now())
            .unwrap();
        let entry = b.ledger.journal_entry(submitted.journal_entry_id.unwrap()).unwrap();
        let receivables = b.ledger.account_by_code(codes::RECEIVABLES).unwrap().id;
        assert!(entry.lines.iter().any(|l| l.account_id == receivables && l.credit == dec!(1180)));

        let events = b.book.take_events();
        assert!(matches!(events[0], InvoiceEvent::CreditNoteIssued { reversal_of, .. } if reversal_of == invoice.id));
    }

    #[test]
    fn credit_note_needs_a_live_sales_invoice() {
        let mut b = books();
        let line = sale_line(&b, dec!(100), None);
        let draft = b.book.create_invoice(sales(&b, vec![line.clone()]), &b.ledger, None, Utc::now()).unwrap();
        assert!(b.book.issue_credit_note(draft.id, None, date(2024, 6, 2), Utc::now()).is_err());

        let bill = b.book.create_invoice(purchase(&b, vec![line.clone()]), &b.ledger, None, Utc::now()).unwrap();
        b.book
            .submit_invoice(bill.id, &mut b.ledger, None, date(2024, 6, 1), Utc::now())
            .unwrap();
        assert_eq!(
            b.book.issue_credit_note(bill.id, None, date(2024, 6, 2), Utc::now()).unwrap_err(),
            DomainError::validation("credit notes can only be issued against sales invoices")
        );

        let sale = b.book.create_invoice(sales(&b, vec![line]), &b.ledger, None, Utc::now()).unwrap();
        b.book
            .submit_invoice(sale.id, &mut b.ledger, None, date(2024, 6, 1), Utc::now())
            .unwrap();
        b.book
            .cancel_invoice(sale.id, &mut b.ledger, None, date(2024, 6, 1), Utc::now())
            .unwrap();
        assert_eq!(
            b.book.issue_credit_note(sale.id, None, date(2024, 6, 2), Utc::now()).unwrap_err(),
            DomainError::validation("cannot issue credit note against a cancelled invoice")
        );
    }

    #[test]
    fn debit_note_against_a_purchase_credits_the_expense() {
        let mut b = books();
        let line = sale_line(&b, dec!(300), None);
        let bill = b.book.create_invoice(purchase(&b, vec![line]), &b.ledger, None, Utc::now()).unwrap();
        b.book
            .submit_invoice(bill.id, &mut b.ledger, None, date(2024, 6, 1), Utc::now())
            .unwrap();
        let note = b
            .book
            .issue_debit_note(bill.id, None, date(2024, 6, 3), Utc::now())
            .unwrap();
        let submitted = b
            .book
            .submit_invoice(note.id, &mut b.ledger, None, date(2024, 6, 3), Utc::now())
            .unwrap();
        let entry = b.ledger.journal_entry(submitted.journal_entry_id.unwrap()).unwrap();
        let payables = b.ledger.account_by_code(codes::PAYABLES).unwrap().id;
        assert!(entry.lines.iter().any(|l| l.account_id == payables && l.debit == dec!(300)));
        assert_eq!(b.ledger.list_journal_entries(&JournalFilter::default()).len(), 2);
    }

    #[test]
    fn listing_orders_by_date_then_number() {
        let mut b = books();
        let line = sale_line(&b, dec!(100), None);
        let mut early = sales(&b, vec![line.clone()]);
        early.invoice_date = date(2024, 5, 1);
        b.book.create_invoice(early, &b.ledger, None, Utc::now()).unwrap();
        b.book.create_invoice(sales(&b, vec![line.clone()]), &b.ledger, None, Utc::now()).unwrap();
        b.book.create_invoice(sales(&b, vec![line.clone()]), &b.ledger, None, Utc::now()).unwrap();
        b.book.create_invoice(purchase(&b, vec![line]), &b.ledger, None, Utc::now()).unwrap();

        let numbers: Vec<u64> = b
            .book
            .list_invoices(&InvoiceFilter {
                invoice_type: Some(InvoiceType::Sales),
                ..Default::default()
            })
            .iter()
            .map(|i| i.invoice_number)
            .collect();
        assert_eq!(numbers, vec![1003, 1002, 1001]);
    }

    #[test]
    fn customers_list_by_legal_name() {
        let mut b = books();
        let receivables = b.ledger.account_by_code(codes::RECEIVABLES).unwrap().id;
        b.book
            .create_customer(
                NewParty {
                    legal_name: "Aardvark Exports".to_string(),
                    account_id: receivables,
                    ..Default::default()
                },
                &b.ledger,
                Utc::now(),
            )
            .unwrap();
        let names: Vec<&str> = b
            .book
            .list_customers(true, 0, None)
            .iter()
            .map(|c| c.profile.legal_name.as_str())
            .collect();
        assert_eq!(names, vec!["Aardvark Exports", "Bharat Retail"]);

        b.book.deactivate_customer(b.customer, Utc::now()).unwrap();
        assert_eq!(b.book.list_customers(true, 0, None).len(), 1);
        assert_eq!(b.book.list_customers(false, 1, Some(5)).len(), 1);
    }
}

//! Chart of accounts, fiscal years, journals, trial balance and tax rates.

use chrono::NaiveDate;

use tallyforge_accounting::{
    Account, AccountNode, AccountUpdate, FiscalYear, JournalEntry, JournalFilter, NewAccount,
    NewFiscalYear, NewJournalEntry, NewTaxRate, TaxRate, TaxRateUpdate, TrialBalance,
};
use tallyforge_auth::{Action, resources};
use tallyforge_core::{AccountId, FiscalYearId, JournalEntryId, TaxRateId};
use tallyforge_events::{EventBus, EventEnvelope};

use crate::app::{App, needs};
use crate::context::RequestContext;
use crate::errors::AppResult;

impl<B> App<B>
where
    B: EventBus<EventEnvelope>,
{
    // ─────────────────────────────────────────────────────────────────────
    // Accounts
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_account(&self, ctx: &RequestContext, new: NewAccount) -> AppResult<Account> {
        self.execute(ctx, needs(resources::ACCOUNTS, Action::Create), |books, _| {
            Ok(books.ledger.create_account(new, ctx.now)?)
        })
    }

    pub fn get_account(&self, ctx: &RequestContext, id: AccountId) -> AppResult<Account> {
        self.query(ctx, needs(resources::ACCOUNTS, Action::Read), |books| {
            Ok(books.ledger.account(id)?.clone())
        })
    }

    pub fn list_accounts(&self, ctx: &RequestContext, include_inactive: bool) -> AppResult<Vec<Account>> {
        self.query(ctx, needs(resources::ACCOUNTS, Action::Read), |books| {
            Ok(books
                .ledger
                .list_accounts(include_inactive)
                .into_iter()
                .cloned()
                .collect())
        })
    }

    pub fn update_account(
        &self,
        ctx: &RequestContext,
        id: AccountId,
        update: AccountUpdate,
    ) -> AppResult<Account> {
        self.execute(ctx, needs(resources::ACCOUNTS, Action::Update), |books, _| {
            Ok(books.ledger.update_account(id, update, ctx.now)?)
        })
    }

    pub fn deactivate_account(&self, ctx: &RequestContext, id: AccountId) -> AppResult<Account> {
        self.execute(ctx, needs(resources::ACCOUNTS, Action::Update), |books, _| {
            Ok(books.ledger.deactivate_account(id, ctx.now)?)
        })
    }

    pub fn account_path(&self, ctx: &RequestContext, id: AccountId) -> AppResult<Vec<String>> {
        self.query(ctx, needs(resources::ACCOUNTS, Action::Read), |books| {
            Ok(books.ledger.account_path(id)?)
        })
    }

    pub fn account_tree(&self, ctx: &RequestContext, include_inactive: bool) -> AppResult<Vec<AccountNode>> {
        self.query(ctx, needs(resources::ACCOUNTS, Action::Read), |books| {
            Ok(books.ledger.account_tree(include_inactive))
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Fiscal years
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_fiscal_year(&self, ctx: &RequestContext, new: NewFiscalYear) -> AppResult<FiscalYear> {
        self.execute(ctx, needs(resources::FISCAL_YEARS, Action::Create), |books, _| {
            Ok(books.ledger.create_fiscal_year(new, ctx.now)?)
        })
    }

    pub fn get_fiscal_year(&self, ctx: &RequestContext, id: FiscalYearId) -> AppResult<FiscalYear> {
        self.query(ctx, needs(resources::FISCAL_YEARS, Action::Read), |books| {
            Ok(books.ledger.fiscal_year(id)?.clone())
        })
    }

    pub fn list_fiscal_years(&self, ctx: &RequestContext) -> AppResult<Vec<FiscalYear>> {
        self.query(ctx, needs(resources::FISCAL_YEARS, Action::Read), |books| {
            Ok(books.ledger.list_fiscal_years().into_iter().cloned().collect())
        })
    }

    pub fn close_fiscal_year(&self, ctx: &RequestContext, id: FiscalYearId) -> AppResult<FiscalYear> {
        self.execute(ctx, needs(resources::FISCAL_YEARS, Action::Update), |books, _| {
            Ok(books.ledger.close_fiscal_year(id, ctx.actor(), ctx.now)?)
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Journal entries
    // ─────────────────────────────────────────────────────────────────────

    pub fn post_journal_entry(&self, ctx: &RequestContext, new: NewJournalEntry) -> AppResult<JournalEntry> {
        self.execute(ctx, needs(resources::JOURNAL_ENTRIES, Action::Create), |books, _| {
            Ok(books
                .ledger
                .post_journal_entry(new, ctx.actor(), ctx.today, ctx.now)?)
        })
    }

    pub fn reverse_journal_entry(
        &self,
        ctx: &RequestContext,
        id: JournalEntryId,
        reversal_date: NaiveDate,
        description: Option<String>,
    ) -> AppResult<JournalEntry> {
        self.execute(ctx, needs(resources::JOURNAL_ENTRIES, Action::Create), |books, _| {
            Ok(books
                .ledger
                .reverse_journal_entry(id, reversal_date, description, ctx.actor(), ctx.now)?)
        })
    }

    pub fn get_journal_entry(&self, ctx: &RequestContext, id: JournalEntryId) -> AppResult<JournalEntry> {
        self.query(ctx, needs(resources::JOURNAL_ENTRIES, Action::Read), |books| {
            Ok(books.ledger.journal_entry(id)?.clone())
        })
    }

    pub fn list_journal_entries(
        &self,
        ctx: &RequestContext,
        filter: &JournalFilter,
    ) -> AppResult<Vec<JournalEntry>> {
        self.query(ctx, needs(resources::JOURNAL_ENTRIES, Action::Read), |books| {
            Ok(books
                .ledger
                .list_journal_entries(filter)
                .into_iter()
                .cloned()
                .collect())
        })
    }

    pub fn trial_balance(
        &self,
        ctx: &RequestContext,
        fiscal_year_id: FiscalYearId,
        as_of: Option<NaiveDate>,
    ) -> AppResult<TrialBalance> {
        self.query(ctx, needs(resources::REPORTS, Action::Read), |books| {
            Ok(books.ledger.trial_balance(fiscal_year_id, as_of)?)
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tax rates
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_tax_rate(&self, ctx: &RequestContext, new: NewTaxRate) -> AppResult<TaxRate> {
        self.execute(ctx, needs(resources::TAX_RATES, Action::Create), |books, _| {
            Ok(books.ledger.create_tax_rate(new, ctx.now)?)
        })
    }

    pub fn get_tax_rate(&self, ctx: &RequestContext, id: TaxRateId) -> AppResult<TaxRate> {
        self.query(ctx, needs(resources::TAX_RATES, Action::Read), |books| {
            Ok(books.ledger.tax_rate(id)?.clone())
        })
    }

    pub fn list_tax_rates(&self, ctx: &RequestContext, active_only: bool) -> AppResult<Vec<TaxRate>> {
        self.query(ctx, needs(resources::TAX_RATES, Action::Read), |books| {
            Ok(books
                .ledger
                .list_tax_rates(active_only)
                .into_iter()
                .cloned()
                .collect())
        })
    }

    pub fn update_tax_rate(
        &self,
        ctx: &RequestContext,
        id: TaxRateId,
        update: TaxRateUpdate,
    ) -> AppResult<TaxRate> {
        self.execute(ctx, needs(resources::TAX_RATES, Action::Update), |books, _| {
            Ok(books.ledger.update_tax_rate(id, update)?)
        })
    }

    pub fn deactivate_tax_rate(&self, ctx: &RequestContext, id: TaxRateId) -> AppResult<TaxRate> {
        self.execute(ctx, needs(resources::TAX_RATES, Action::Update), |books, _| {
            Ok(books.ledger.deactivate_tax_rate(id)?)
        })
    }
}

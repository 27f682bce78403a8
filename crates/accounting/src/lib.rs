//! `tallyforge-accounting`: double-entry general ledger.
//!
//! One [`Ledger`] per tenant owns the chart of accounts, fiscal years,
//! journal entries and GST rates. Every posting goes through
//! [`Ledger::post_journal_entry`], which enforces balanced lines, leaf-only
//! accounts and an open fiscal year.

pub mod account;
pub mod events;
pub mod fiscal_year;
pub mod journal;
pub mod ledger;
pub mod seed;
pub mod tax;
pub mod trial_balance;

pub use account::{Account, AccountNode, AccountType, AccountUpdate, NewAccount};
pub use events::FinanceEvent;
pub use fiscal_year::{FiscalYear, FiscalYearStatus, NewFiscalYear, indian_fiscal_year};
pub use journal::{
    JournalEntry, JournalFilter, JournalLine, JournalStatus, NewJournalEntry, NewJournalLine,
    validate_lines,
};
pub use ledger::{Ledger, PostingPolicy};
pub use tax::{NewTaxRate, TaxRate, TaxRateUpdate, TaxType};
pub use trial_balance::{TrialBalance, TrialBalanceRow};

//! Journal entries and the balanced-lines rule.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallyforge_core::money::nearly_equal;
use tallyforge_core::{
    AMOUNT_LIMIT, AccountId, DomainError, DomainResult, Entity, FiscalYearId, JournalEntryId,
    TenantId, UserId, check_stored, checked_sum,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalStatus {
    Draft,
    Posted,
    Cancelled,
}

/// One side of a journal entry (immutable once posted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub line_number: u32,
    pub account_id: AccountId,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: JournalEntryId,
    pub tenant_id: TenantId,
    pub entry_number: u64,
    pub fiscal_year_id: FiscalYearId,
    pub posting_date: NaiveDate,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub status: JournalStatus,
    pub reversal_of: Option<JournalEntryId>,
    pub reversed_by: Option<JournalEntryId>,
    pub created_by: Option<UserId>,
    pub posted_at: DateTime<Utc>,
    pub lines: Vec<JournalLine>,
}

impl Entity for JournalEntry {
    type Id = JournalEntryId;
    const KIND: &'static str = "journal entry";

    fn id(&self) -> JournalEntryId {
        self.id
    }
}

impl JournalEntry {
    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }

    pub fn touches(&self, account_id: AccountId) -> bool {
        self.lines.iter().any(|l| l.account_id == account_id)
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed_by.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJournalLine {
    pub account_id: AccountId,
    #[serde(default)]
    pub debit: Decimal,
    #[serde(default)]
    pub credit: Decimal,
    pub description: Option<String>,
}

impl NewJournalLine {
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            description: None,
        }
    }

    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            description: None,
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJournalEntry {
    pub posting_date: NaiveDate,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub lines: Vec<NewJournalLine>,
}

/// Listing filter; `None` fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct JournalFilter {
    pub fiscal_year_id: Option<FiscalYearId>,
    pub status: Option<JournalStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub account_id: Option<AccountId>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl JournalFilter {
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        self.fiscal_year_id.is_none_or(|fy| entry.fiscal_year_id == fy)
            && self.status.is_none_or(|s| entry.status == s)
            && self.from_date.is_none_or(|d| entry.posting_date >= d)
            && self.to_date.is_none_or(|d| entry.posting_date <= d)
            && self.account_id.is_none_or(|a| entry.touches(a))
    }
}

/// Check the double-entry shape of a set of lines.
///
/// - at least two lines
/// - every line carries exactly one positive side, never a negative amount
/// - every amount fits the stored precision (see [`check_stored`])
/// - total debits equal total credits within [`tallyforge_core::BALANCE_EPSILON`]
///
/// Returns the (debit, credit) totals.
pub fn validate_lines(lines: &[NewJournalLine]) -> DomainResult<(Decimal, Decimal)> {
    if lines.len() < 2 {
        return Err(DomainError::validation("at least 2 lines required"));
    }

    for (idx, line) in lines.iter().enumerate() {
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "line {}: amounts cannot be negative",
                idx + 1
            )));
        }
        check_stored(&format!("line {} debit", idx + 1), line.debit, AMOUNT_LIMIT)?;
        check_stored(&format!("line {} credit", idx + 1), line.credit, AMOUNT_LIMIT)?;
        let has_debit = line.debit > Decimal::ZERO;
        let has_credit = line.credit > Decimal::ZERO;
        if has_debit == has_credit {
            return Err(DomainError::validation(format!(
                "line {}: each line must have exactly one of debit > 0 or credit > 0",
                idx + 1
            )));
        }
    }

    let total_debit = checked_sum(lines.iter().map(|l| l.debit))?;
    let total_credit = checked_sum(lines.iter().map(|l| l.credit))?;
    if !nearly_equal(total_debit, total_credit) {
        return Err(DomainError::validation(format!(
            "debit ({total_debit}) and credit ({total_credit}) totals must match"
        )));
    }

    Ok((total_debit, total_credit))
}

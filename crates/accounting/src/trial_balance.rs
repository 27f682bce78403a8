use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use tallyforge_core::money::nearly_equal;
use tallyforge_core::{AccountId, DomainResult, FiscalYearId};

use crate::account::AccountType;
use crate::journal::JournalStatus;
use crate::ledger::Ledger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalanceRow {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    /// In the account's natural sign.
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalance {
    pub fiscal_year_id: FiscalYearId,
    pub as_of: Option<NaiveDate>,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub is_balanced: bool,
}

impl Ledger {
    /// Per-account totals of posted entries in a fiscal year, ordered by
    /// account code. Accounts without activity are omitted.
    pub fn trial_balance(
        &self,
        fiscal_year_id: FiscalYearId,
        as_of: Option<NaiveDate>,
    ) -> DomainResult<TrialBalance> {
        self.fiscal_year(fiscal_year_id)?;

        let mut sums: HashMap<AccountId, (Decimal, Decimal)> = HashMap::new();
        let entries = self.entries.iter().filter(|e| {
            e.status == JournalStatus::Posted
                && e.fiscal_year_id == fiscal_year_id
                && as_of.is_none_or(|d| e.posting_date <= d)
        });
        for line in entries.flat_map(|e| &e.lines) {
            let sum = sums.entry(line.account_id).or_default();
            sum.0 += line.debit;
            sum.1 += line.credit;
        }

        let mut rows: Vec<TrialBalanceRow> = sums
            .into_iter()
            .filter_map(|(account_id, (debit, credit))| {
                let account = self.accounts.get(account_id)?;
                Some(TrialBalanceRow {
                    account_id,
                    code: account.code.clone(),
                    name: account.name.clone(),
                    account_type: account.account_type,
                    total_debit: debit,
                    total_credit: credit,
                    balance: account.account_type.signed_balance(debit, credit),
                })
            })
            .collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));

        let total_debit: Decimal = rows.iter().map(|r| r.total_debit).sum();
        let total_credit: Decimal = rows.iter().map(|r| r.total_credit).sum();
        Ok(TrialBalance {
            fiscal_year_id,
            as_of,
            rows,
            total_debit,
            total_credit,
            is_balanced: nearly_equal(total_debit, total_credit),
        })
    }
}

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::info;

use tallyforge_core::{
    AccountId, DomainError, DomainResult, JournalEntryId, Table, TenantId, UserId, page,
};

use crate::account::{
    Account, AccountNode, AccountUpdate, NewAccount, validate_code, validate_currency,
    validate_name,
};
use crate::events::{FinanceEvent, JournalPosted};
use crate::fiscal_year::FiscalYear;
use crate::journal::{
    JournalEntry, JournalFilter, JournalLine, JournalStatus, NewJournalEntry, validate_lines,
};
use crate::tax::TaxRate;

/// Tenant-level posting rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingPolicy {
    /// How far past "today" a posting date may lie.
    pub max_future_days: i64,
    pub default_currency: String,
}

impl Default for PostingPolicy {
    fn default() -> Self {
        Self {
            max_future_days: 7,
            default_currency: "INR".to_string(),
        }
    }
}

/// A tenant's general ledger.
///
/// # Invariants
/// - Every journal entry balances (see [`validate_lines`]).
/// - Only active leaf accounts of this tenant receive postings.
/// - Every entry's posting date falls inside an open fiscal year at post time.
/// - Entry numbers are unique and increasing per tenant.
#[derive(Debug, Clone)]
pub struct Ledger {
    tenant_id: TenantId,
    policy: PostingPolicy,
    pub(crate) accounts: Table<Account>,
    pub(crate) fiscal_years: Table<FiscalYear>,
    pub(crate) entries: Table<JournalEntry>,
    pub(crate) tax_rates: Table<TaxRate>,
    pub(crate) events: Vec<FinanceEvent>,
}

impl Ledger {
    pub fn new(tenant_id: TenantId, policy: PostingPolicy) -> Self {
        Self {
            tenant_id,
            policy,
            accounts: Table::new(),
            fiscal_years: Table::new(),
            entries: Table::new(),
            tax_rates: Table::new(),
            events: Vec::new(),
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn policy(&self) -> &PostingPolicy {
        &self.policy
    }

    /// Drain events raised since the last call.
    pub fn take_events(&mut self) -> Vec<FinanceEvent> {
        std::mem::take(&mut self.events)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Chart of accounts
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_account(&mut self, new: NewAccount, now: DateTime<Utc>) -> DomainResult<Account> {
        let code = validate_code(&new.code)?;
        let name = validate_name(&new.name)?;
        let currency_code = validate_currency(
            new.currency_code
                .as_deref()
                .unwrap_or(&self.policy.default_currency),
        )?;

        if let Some(parent_id) = new.parent_id {
            let parent = self.accounts.require(parent_id)?;
            if !parent.is_group {
                return Err(DomainError::validation("parent account must be a group account"));
            }
        }
        if self.account_by_code(&code).is_some() {
            return Err(DomainError::conflict(format!("account code {code} already exists")));
        }

        let account = Account {
            id: AccountId::new(),
            tenant_id: self.tenant_id,
            code,
            name,
            account_type: new.account_type,
            parent_id: new.parent_id,
            is_group: new.is_group,
            currency_code,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.accounts.insert(account.clone());
        Ok(account)
    }

    pub fn account(&self, id: AccountId) -> DomainResult<&Account> {
        self.accounts.require(id)
    }

    pub fn account_by_code(&self, code: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.code == code)
    }

    /// Accounts ordered by code.
    pub fn list_accounts(&self, include_inactive: bool) -> Vec<&Account> {
        self.accounts
            .select(|a| include_inactive || a.is_active, |a, b| a.code.cmp(&b.code))
    }

    pub fn update_account(
        &mut self,
        id: AccountId,
        update: AccountUpdate,
        now: DateTime<Utc>,
    ) -> DomainResult<Account> {
        self.accounts.require(id)?;
        if update.is_active == Some(false) {
            self.ensure_unused(id)?;
        }
        let name = update.name.as_deref().map(validate_name).transpose()?;

        let account = self.accounts.require_mut(id)?;
        if let Some(name) = name {
            account.name = name;
        }
        if let Some(active) = update.is_active {
            account.is_active = active;
        }
        account.updated_at = now;
        Ok(account.clone())
    }

    /// Deactivate an account that no journal line references.
    pub fn deactivate_account(&mut self, id: AccountId, now: DateTime<Utc>) -> DomainResult<Account> {
        self.update_account(
            id,
            AccountUpdate {
                name: None,
                is_active: Some(false),
            },
            now,
        )
    }

    fn ensure_unused(&self, id: AccountId) -> DomainResult<()> {
        if self.entries.iter().any(|e| e.touches(id)) {
            return Err(DomainError::conflict(
                "cannot deactivate account with existing journal lines",
            ));
        }
        Ok(())
    }

    /// Names from the root group down to the account itself.
    pub fn account_path(&self, id: AccountId) -> DomainResult<Vec<String>> {
        let mut current = self.accounts.require(id)?;
        let mut path = vec![current.name.clone()];
        let mut seen = HashSet::from([current.id]);
        while let Some(parent_id) = current.parent_id {
            let Some(parent) = self.accounts.get(parent_id) else {
                break;
            };
            if !seen.insert(parent.id) {
                break;
            }
            path.push(parent.name.clone());
            current = parent;
        }
        path.reverse();
        Ok(path)
    }

    /// The chart as a forest, each level ordered by code.
    pub fn account_tree(&self, include_inactive: bool) -> Vec<AccountNode> {
        let accounts = self.list_accounts(include_inactive);
        let present: HashSet<AccountId> = accounts.iter().map(|a| a.id).collect();
        let mut children: HashMap<Option<AccountId>, Vec<&Account>> = HashMap::new();
        for account in &accounts {
            // Orphans (parent filtered out) surface at the top level.
            let parent = account.parent_id.filter(|p| present.contains(p));
            children.entry(parent).or_default().push(account);
        }

        fn build(
            parent: Option<AccountId>,
            children: &HashMap<Option<AccountId>, Vec<&Account>>,
        ) -> Vec<AccountNode> {
            children
                .get(&parent)
                .map(|accounts| {
                    accounts
                        .iter()
                        .map(|a| AccountNode {
                            account: (*a).clone(),
                            children: build(Some(a.id), children),
                        })
                        .collect()
                })
                .unwrap_or_default()
        }

        build(None, &children)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Journal entries
    // ─────────────────────────────────────────────────────────────────────

    fn next_entry_number(&self) -> u64 {
        self.entries.iter().map(|e| e.entry_number).max().unwrap_or(0) + 1
    }

    /// Validate and post a balanced journal entry.
    pub fn post_journal_entry(
        &mut self,
        new: NewJournalEntry,
        posted_by: Option<UserId>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<JournalEntry> {
        let (total, _) = validate_lines(&new.lines)?;

        if new.posting_date > today + Duration::days(self.policy.max_future_days) {
            return Err(DomainError::validation(format!(
                "posting date cannot be more than {} days in the future",
                self.policy.max_future_days
            )));
        }

        for (idx, line) in new.lines.iter().enumerate() {
            let Some(account) = self.accounts.get(line.account_id) else {
                return Err(DomainError::validation(format!(
                    "line {}: account {} not found or doesn't belong to tenant",
                    idx + 1,
                    line.account_id
                )));
            };
            if account.is_group {
                return Err(DomainError::validation(format!(
                    "line {}: cannot post to group account {}",
                    idx + 1,
                    account.code
                )));
            }
            if !account.is_active {
                return Err(DomainError::validation(format!(
                    "line {}: account {} is inactive",
                    idx + 1,
                    account.code
                )));
            }
        }

        let fiscal_year_id = self.resolve_fiscal_year(new.posting_date)?.id;

        let entry = JournalEntry {
            id: JournalEntryId::new(),
            tenant_id: self.tenant_id,
            entry_number: self.next_entry_number(),
            fiscal_year_id,
            posting_date: new.posting_date,
            reference: new.reference,
            description: new.description,
            status: JournalStatus::Posted,
            reversal_of: None,
            reversed_by: None,
            created_by: posted_by,
            posted_at: now,
            lines: new
                .lines
                .into_iter()
                .enumerate()
                .map(|(idx, l)| JournalLine {
                    line_number: idx as u32 + 1,
                    account_id: l.account_id,
                    debit: l.debit,
                    credit: l.credit,
                    description: l.description,
                })
                .collect(),
        };

        info!(
            tenant_id = %self.tenant_id,
            entry_number = entry.entry_number,
            posting_date = %entry.posting_date,
            %total,
            "journal entry posted"
        );
        self.events.push(FinanceEvent::JournalPosted(JournalPosted {
            journal_entry_id: entry.id,
            entry_number: entry.entry_number,
            posting_date: entry.posting_date,
            total,
            posted_by,
            is_reversal: false,
            reversal_of: None,
            occurred_at: now,
        }));
        self.entries.insert(entry.clone());
        Ok(entry)
    }

    /// Post the mirror image of a posted entry and link the two.
    pub fn reverse_journal_entry(
        &mut self,
        id: JournalEntryId,
        reversal_date: NaiveDate,
        description: Option<String>,
        reversed_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> DomainResult<JournalEntry> {
        let original = self.entries.require(id)?;
        if original.status != JournalStatus::Posted {
            return Err(DomainError::conflict("cannot reverse a non-posted entry"));
        }
        if original.is_reversed() {
            return Err(DomainError::conflict("entry is already reversed"));
        }

        let fiscal_year_id = self.resolve_fiscal_year(reversal_date)?.id;
        let original_number = original.entry_number;

        let reversal = JournalEntry {
            id: JournalEntryId::new(),
            tenant_id: self.tenant_id,
            entry_number: self.next_entry_number(),
            fiscal_year_id,
            posting_date: reversal_date,
            reference: Some(format!("Reversal of #{original_number}")),
            description: Some(
                description.unwrap_or_else(|| format!("Reversal of entry #{original_number}")),
            ),
            status: JournalStatus::Posted,
            reversal_of: Some(id),
            reversed_by: None,
            created_by: reversed_by,
            posted_at: now,
            lines: original
                .lines
                .iter()
                .map(|l| JournalLine {
                    line_number: l.line_number,
                    account_id: l.account_id,
                    debit: l.credit,
                    credit: l.debit,
                    description: Some(match &l.description {
                        Some(d) => format!("Reversal: {d}"),
                        None => "Reversal".to_string(),
                    }),
                })
                .collect(),
        };

        self.entries.require_mut(id)?.reversed_by = Some(reversal.id);

        info!(
            tenant_id = %self.tenant_id,
            entry_number = reversal.entry_number,
            original_number,
            "journal entry reversed"
        );
        self.events.push(FinanceEvent::JournalPosted(JournalPosted {
            journal_entry_id: reversal.id,
            entry_number: reversal.entry_number,
            posting_date: reversal_date,
            total: reversal.total_debit(),
            posted_by: reversed_by,
            is_reversal: true,
            reversal_of: Some(id),
            occurred_at: now,
        }));
        self.entries.insert(reversal.clone());
        Ok(reversal)
    }

    pub fn journal_entry(&self, id: JournalEntryId) -> DomainResult<&JournalEntry> {
        self.entries.require(id)
    }

    /// Newest posting date first, ties broken by entry number (descending).
    pub fn list_journal_entries(&self, filter: &JournalFilter) -> Vec<&JournalEntry> {
        let rows = self.entries.select(
            |e| filter.matches(e),
            |a, b| {
                b.posting_date
                    .cmp(&a.posting_date)
                    .then(b.entry_number.cmp(&a.entry_number))
            },
        );
        page::window(rows, filter.skip, filter.limit)
    }
}

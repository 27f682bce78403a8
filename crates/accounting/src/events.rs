//! Finance events.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use tallyforge_core::{FiscalYearId, JournalEntryId, UserId};
use tallyforge_events::{Event, catalog};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalPosted {
    pub journal_entry_id: JournalEntryId,
    pub entry_number: u64,
    pub posting_date: NaiveDate,
    pub total: Decimal,
    pub posted_by: Option<UserId>,
    pub is_reversal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reversal_of: Option<JournalEntryId>,
    #[serde(skip)]
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiscalYearClosed {
    pub fiscal_year_id: FiscalYearId,
    pub name: String,
    pub closed_by: Option<UserId>,
    pub next_fiscal_year_id: Option<FiscalYearId>,
    #[serde(skip)]
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FinanceEvent {
    JournalPosted(JournalPosted),
    FiscalYearClosed(FiscalYearClosed),
}

impl Event for FinanceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FinanceEvent::JournalPosted(_) => catalog::JOURNAL_POSTED,
            FinanceEvent::FiscalYearClosed(_) => catalog::FISCAL_YEAR_CLOSED,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            FinanceEvent::JournalPosted(e) => e.occurred_at,
            FinanceEvent::FiscalYearClosed(e) => e.occurred_at,
        }
    }
}

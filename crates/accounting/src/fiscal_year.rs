//! Fiscal years and period resolution.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use tallyforge_core::{DomainError, DomainResult, Entity, FiscalYearId, TenantId, UserId};

use crate::events::{FinanceEvent, FiscalYearClosed};
use crate::ledger::Ledger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiscalYearStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYear {
    pub id: FiscalYearId,
    pub tenant_id: TenantId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: FiscalYearStatus,
    pub closed_at: Option<DateTime<Utc>>,
    pub closed_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Entity for FiscalYear {
    type Id = FiscalYearId;
    const KIND: &'static str = "fiscal year";

    fn id(&self) -> FiscalYearId {
        self.id
    }
}

impl FiscalYear {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn is_open(&self) -> bool {
        self.status == FiscalYearStatus::Open
    }
}

#[derive(Debug, Clone)]
pub struct NewFiscalYear {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: FiscalYearStatus,
}

impl NewFiscalYear {
    pub fn open(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            start_date,
            end_date,
            status: FiscalYearStatus::Open,
        }
    }
}

/// The April-to-March year containing `today`, named `FY{start}-{end}`.
pub fn indian_fiscal_year(today: NaiveDate) -> NewFiscalYear {
    let start_year = if today.month() >= 4 {
        today.year()
    } else {
        today.year() - 1
    };
    let start = NaiveDate::from_ymd_opt(start_year, 4, 1).unwrap_or(today);
    let end = NaiveDate::from_ymd_opt(start_year + 1, 3, 31).unwrap_or(today);
    NewFiscalYear::open(format!("FY{}-{}", start_year, start_year + 1), start, end)
}

/// One year starting the day after `end`.
fn following_year(end: NaiveDate) -> Option<NewFiscalYear> {
    let start = end.checked_add_days(Days::new(1))?;
    let next_end = start
        .checked_add_months(Months::new(12))?
        .checked_sub_days(Days::new(1))?;
    Some(NewFiscalYear::open(
        format!("FY{}-{}", start.year(), start.year() + 1),
        start,
        next_end,
    ))
}

impl Ledger {
    /// Years may not overlap, and at most one is open at a time.
    pub fn create_fiscal_year(
        &mut self,
        new: NewFiscalYear,
        now: DateTime<Utc>,
    ) -> DomainResult<FiscalYear> {
        let name = self.check_new_fiscal_year(&new, None)?;
        Ok(self.insert_fiscal_year(name, new, now))
    }

    /// Validate `new` against the existing years. `closing` is a year about
    /// to be closed and does not count as open. Returns the trimmed name.
    fn check_new_fiscal_year(
        &self,
        new: &NewFiscalYear,
        closing: Option<FiscalYearId>,
    ) -> DomainResult<String> {
        let name = new.name.trim();
        if name.is_empty() || name.len() > 50 {
            return Err(DomainError::validation(
                "fiscal year name must be 1..=50 characters",
            ));
        }
        if new.end_date <= new.start_date {
            return Err(DomainError::validation("end date must be after start date"));
        }
        if let Some(existing) = self.overlapping_year(new.start_date, new.end_date) {
            return Err(DomainError::conflict(format!(
                "fiscal year overlaps {} ({} to {})",
                existing.name, existing.start_date, existing.end_date
            )));
        }
        if new.status == FiscalYearStatus::Open {
            let open = self
                .fiscal_years
                .iter()
                .find(|fy| fy.is_open() && Some(fy.id) != closing);
            if let Some(open) = open {
                return Err(DomainError::conflict(format!(
                    "fiscal year {} is already open; close it first",
                    open.name
                )));
            }
        }
        Ok(name.to_string())
    }

    fn overlapping_year(&self, start: NaiveDate, end: NaiveDate) -> Option<&FiscalYear> {
        self.fiscal_years
            .iter()
            .find(|fy| fy.start_date <= end && start <= fy.end_date)
    }

    fn insert_fiscal_year(
        &mut self,
        name: String,
        new: NewFiscalYear,
        now: DateTime<Utc>,
    ) -> FiscalYear {
        let fiscal_year = FiscalYear {
            id: FiscalYearId::new(),
            tenant_id: self.tenant_id(),
            name,
            start_date: new.start_date,
            end_date: new.end_date,
            status: new.status,
            closed_at: None,
            closed_by: None,
            created_at: now,
        };
        self.fiscal_years.insert(fiscal_year.clone());
        fiscal_year
    }

    pub fn fiscal_year(&self, id: FiscalYearId) -> DomainResult<&FiscalYear> {
        self.fiscal_years.require(id)
    }

    /// Most recent first.
    pub fn list_fiscal_years(&self) -> Vec<&FiscalYear> {
        self.fiscal_years
            .select(|_| true, |a, b| b.start_date.cmp(&a.start_date))
    }

    /// The open fiscal year covering `date`.
    pub fn resolve_fiscal_year(&self, date: NaiveDate) -> DomainResult<&FiscalYear> {
        let Some(fiscal_year) = self.fiscal_years.iter().find(|fy| fy.contains(date)) else {
            return Err(DomainError::validation(format!(
                "posting date {date} does not fall in any fiscal year"
            )));
        };
        if !fiscal_year.is_open() {
            return Err(DomainError::validation(format!(
                "fiscal year {} is closed",
                fiscal_year.name
            )));
        }
        Ok(fiscal_year)
    }

    /// Close a year and open the following one unless an existing year
    /// already overlaps it.
    ///
    /// Every check runs before anything changes, so a failed close leaves
    /// the ledger as it was.
    pub fn close_fiscal_year(
        &mut self,
        id: FiscalYearId,
        closed_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> DomainResult<FiscalYear> {
        let fiscal_year = self.fiscal_years.require(id)?;
        if !fiscal_year.is_open() {
            return Err(DomainError::conflict("fiscal year is already closed"));
        }
        let end_date = fiscal_year.end_date;

        let next = following_year(end_date).ok_or_else(|| {
            DomainError::invariant(format!("no fiscal year can follow {end_date}"))
        })?;
        let next = match self.overlapping_year(next.start_date, next.end_date) {
            Some(_) => None,
            None => Some((self.check_new_fiscal_year(&next, Some(id))?, next)),
        };

        let fiscal_year = self.fiscal_years.require_mut(id)?;
        fiscal_year.status = FiscalYearStatus::Closed;
        fiscal_year.closed_at = Some(now);
        fiscal_year.closed_by = closed_by;
        let closed = fiscal_year.clone();

        let next_fiscal_year_id =
            next.map(|(name, next)| self.insert_fiscal_year(name, next, now).id);

        info!(
            tenant_id = %self.tenant_id(),
            fiscal_year = %closed.name,
            "fiscal year closed"
        );
        self.events.push(FinanceEvent::FiscalYearClosed(FiscalYearClosed {
            fiscal_year_id: closed.id,
            name: closed.name.clone(),
            closed_by,
            next_fiscal_year_id,
            occurred_at: now,
        }));
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{date, entry, fixture};
    use rust_decimal_macros::dec;

    #[test]
    fn indian_year_runs_april_to_march() {
        let fy = indian_fiscal_year(date(2025, 2, 14));
        assert_eq!(fy.name, "FY2024-2025");
        assert_eq!(fy.start_date, date(2024, 4, 1));
        assert_eq!(fy.end_date, date(2025, 3, 31));

        assert_eq!(indian_fiscal_year(date(2025, 4, 1)).name, "FY2025-2026");
    }

    #[test]
    fn following_year_handles_leap_days() {
        let next = following_year(date(2024, 2, 28)).unwrap();
        assert_eq!(next.start_date, date(2024, 2, 29));
        assert_eq!(next.end_date, date(2025, 2, 27));
        assert_eq!(next.name, "FY2024-2025");
    }

    #[test]
    fn second_open_year_conflicts() {
        let mut f = fixture();
        let err = f
            .ledger
            .create_fiscal_year(
                NewFiscalYear::open("FY2025-2026", date(2025, 4, 1), date(2026, 3, 31)),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn overlapping_years_conflict() {
        let mut f = fixture();
        let june = NewFiscalYear {
            name: "June close".to_string(),
            start_date: date(2024, 6, 1),
            end_date: date(2024, 6, 30),
            status: FiscalYearStatus::Closed,
        };
        let err = f.ledger.create_fiscal_year(june, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            DomainError::conflict("fiscal year overlaps FY2024-2025 (2024-04-01 to 2025-03-31)")
        );

        let straddling = NewFiscalYear {
            name: "Straddle".to_string(),
            start_date: date(2025, 3, 31),
            end_date: date(2025, 9, 30),
            status: FiscalYearStatus::Closed,
        };
        assert!(matches!(
            f.ledger.create_fiscal_year(straddling, Utc::now()),
            Err(DomainError::Conflict(_))
        ));

        assert_eq!(f.ledger.list_fiscal_years().len(), 1);
        let today = date(2024, 6, 15);
        assert!(f
            .ledger
            .post_journal_entry(entry(today, f.cash, f.sales, dec!(1)), None, today, Utc::now())
            .is_ok());
    }

    #[test]
    fn end_must_follow_start() {
        let mut f = fixture();
        let err = f
            .ledger
            .create_fiscal_year(
                NewFiscalYear {
                    name: "bad".to_string(),
                    start_date: date(2030, 1, 1),
                    end_date: date(2030, 1, 1),
                    status: FiscalYearStatus::Closed,
                },
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(err, DomainError::validation("end date must be after start date"));
    }

    #[test]
    fn closing_opens_the_next_year_and_blocks_posting() {
        let mut f = fixture();
        let current = f.ledger.resolve_fiscal_year(date(2024, 6, 1)).unwrap().id;
        let closed = f.ledger.close_fiscal_year(current, None, Utc::now()).unwrap();
        assert_eq!(closed.status, FiscalYearStatus::Closed);

        let next = f.ledger.resolve_fiscal_year(date(2025, 4, 1)).unwrap().clone();
        assert_eq!(next.name, "FY2025-2026");
        assert_eq!(next.end_date, date(2026, 3, 31));

        let today = date(2024, 6, 1);
        let err = f
            .ledger
            .post_journal_entry(entry(today, f.cash, f.sales, dec!(1)), None, today, Utc::now())
            .unwrap_err();
        assert_eq!(err, DomainError::validation("fiscal year FY2024-2025 is closed"));

        let events = f.ledger.take_events();
        let FinanceEvent::FiscalYearClosed(e) = &events[0] else {
            panic!("expected FiscalYearClosed, got {:?}", events[0]);
        };
        assert_eq!(e.fiscal_year_id, current);
        assert_eq!(e.next_fiscal_year_id, Some(next.id));
    }

    #[test]
    fn closing_twice_conflicts() {
        let mut f = fixture();
        let current = f.ledger.list_fiscal_years()[0].id;
        f.ledger.close_fiscal_year(current, None, Utc::now()).unwrap();
        assert_eq!(
            f.ledger.close_fiscal_year(current, None, Utc::now()).unwrap_err(),
            DomainError::conflict("fiscal year is already closed")
        );
    }

    #[test]
    fn closing_skips_creation_when_next_year_exists() {
        let mut f = fixture();
        f.ledger
            .create_fiscal_year(
                NewFiscalYear {
                    name: "FY2025-2026".to_string(),
                    start_date: date(2025, 4, 1),
                    end_date: date(2026, 3, 31),
                    status: FiscalYearStatus::Closed,
                },
                Utc::now(),
            )
            .unwrap();
        let current = f.ledger.resolve_fiscal_year(date(2024, 6, 1)).unwrap().id;
        f.ledger.close_fiscal_year(current, None, Utc::now()).unwrap();
        assert_eq!(f.ledger.list_fiscal_years().len(), 2);
    }

    #[test]
    fn failed_close_changes_nothing() {
        let mut f = fixture();
        f.ledger
            .create_fiscal_year(
                NewFiscalYear {
                    name: "FY2025-2026".to_string(),
                    start_date: date(2025, 4, 1),
                    end_date: date(2026, 3, 31),
                    status: FiscalYearStatus::Closed,
                },
                Utc::now(),
            )
            .unwrap();
        let current = f.ledger.resolve_fiscal_year(date(2024, 6, 1)).unwrap().id;
        f.ledger.close_fiscal_year(current, None, Utc::now()).unwrap();

        let last = f
            .ledger
            .create_fiscal_year(
                NewFiscalYear::open("Last", date(262_000, 1, 1), NaiveDate::MAX),
                Utc::now(),
            )
            .unwrap();
        f.ledger.take_events();

        let err = f.ledger.close_fiscal_year(last.id, None, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        let last = f.ledger.fiscal_year(last.id).unwrap();
        assert!(last.is_open());
        assert_eq!(last.closed_at, None);
        assert_eq!(f.ledger.list_fiscal_years().len(), 3);
        assert!(f.ledger.take_events().is_empty());
    }
}

//! Receivable and payable aging.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use tallyforge_core::Gstin;

use crate::book::InvoiceBook;
use crate::invoice::{Invoice, InvoiceStatus, InvoiceType, PartyRef};
use crate::party::Party;

/// Overdue band by whole days past the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgingBucket {
    Current,
    Days1To30,
    Days31To60,
    Days61To90,
    Days91Plus,
}

impl AgingBucket {
    pub fn for_days_overdue(days: i64) -> Self {
        match days {
            ..=0 => Self::Current,
            1..=30 => Self::Days1To30,
            31..=60 => Self::Days31To60,
            61..=90 => Self::Days61To90,
            _ => Self::Days91Plus,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgingBuckets {
    pub current: Decimal,
    pub days_1_30: Decimal,
    pub days_31_60: Decimal,
    pub days_61_90: Decimal,
    pub days_91_plus: Decimal,
    pub total: Decimal,
}

impl AgingBuckets {
    pub fn add(&mut self, bucket: AgingBucket, amount: Decimal) {
        let slot = match bucket {
            AgingBucket::Current => &mut self.current,
            AgingBucket::Days1To30 => &mut self.days_1_30,
            AgingBucket::Days31To60 => &mut self.days_31_60,
            AgingBucket::Days61To90 => &mut self.days_61_90,
            AgingBucket::Days91Plus => &mut self.days_91_plus,
        };
        *slot += amount;
        self.total += amount;
    }

    fn merge(&mut self, other: &AgingBuckets) {
        self.current += other.current;
        self.days_1_30 += other.days_1_30;
        self.days_31_60 += other.days_31_60;
        self.days_61_90 += other.days_61_90;
        self.days_91_plus += other.days_91_plus;
        self.total += other.total;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgingRow {
    pub party_id: Uuid,
    pub party_name: String,
    pub gstin: Option<Gstin>,
    pub buckets: AgingBuckets,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgingReport {
    pub as_of: NaiveDate,
    pub rows: Vec<AgingRow>,
    pub totals: AgingBuckets,
}

impl InvoiceBook {
    /// Open sales invoices to customers, bucketed by days overdue.
    pub fn ar_aging(&self, as_of: NaiveDate) -> AgingReport {
        self.aging(as_of, InvoiceType::Sales)
    }

    /// Open purchase invoices from vendors, bucketed by days overdue.
    pub fn ap_aging(&self, as_of: NaiveDate) -> AgingReport {
        self.aging(as_of, InvoiceType::Purchase)
    }

    fn party_row(&self, party: PartyRef) -> Option<AgingRow> {
        let (profile, party_id) = match party {
            PartyRef::Customer(id) => {
                let c = self.customers.get(id)?;
                (c.profile(), *id.as_uuid())
            }
            PartyRef::Vendor(id) => {
                let v = self.vendors.get(id)?;
                (v.profile(), *id.as_uuid())
            }
        };
        Some(AgingRow {
            party_id,
            party_name: profile.legal_name.clone(),
            gstin: profile.gstin.clone(),
            buckets: AgingBuckets::default(),
        })
    }

    fn aging(&self, as_of: NaiveDate, invoice_type: InvoiceType) -> AgingReport {
        let open = |i: &&Invoice| {
            i.invoice_type == invoice_type
                && i.status == InvoiceStatus::Submitted
                && i.invoice_date <= as_of
        };

        let mut rows: HashMap<PartyRef, AgingRow> = HashMap::new();
        for invoice in self.invoices.iter().filter(open) {
            if !rows.contains_key(&invoice.party) {
                let Some(fresh) = self.party_row(invoice.party) else {
                    continue;
                };
                rows.insert(invoice.party, fresh);
            }
            let Some(row) = rows.get_mut(&invoice.party) else {
                continue;
            };
            let days_overdue = (as_of - invoice.due_date).num_days();
            row.buckets
                .add(AgingBucket::for_days_overdue(days_overdue), invoice.total);
        }

        let mut rows: Vec<AgingRow> = rows.into_values().collect();
        rows.sort_by(|a, b| a.party_name.cmp(&b.party_name).then(a.party_id.cmp(&b.party_id)));

        let mut totals = AgingBuckets::default();
        for row in &rows {
            totals.merge(&row.buckets);
        }
        AgingReport { as_of, rows, totals }
    }
}

//! Default chart of accounts, GST rates and opening fiscal year for a new
//! tenant.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use tallyforge_core::{DomainError, DomainResult};

use crate::account::{AccountType, NewAccount};
use crate::fiscal_year::{FiscalYear, indian_fiscal_year};
use crate::ledger::Ledger;
use crate::tax::{NewTaxRate, TaxType};

use AccountType::{Asset, Equity, Expense, Liability, Revenue};

/// `(code, name, type, parent code, is_group)`, parents listed before children.
pub const CHART: &[(&str, &str, AccountType, Option<&str>, bool)] = &[
    ("1000", "Assets", Asset, None, true),
    ("1100", "Current Assets", Asset, Some("1000"), true),
    ("1110", "Cash and Cash Equivalents", Asset, Some("1100"), false),
    ("1120", "Accounts Receivable", Asset, Some("1100"), false),
    ("1130", "Inventory", Asset, Some("1100"), false),
    ("1140", "Input Tax Credit - CGST", Asset, Some("1100"), false),
    ("1141", "Input Tax Credit - SGST", Asset, Some("1100"), false),
    ("1142", "Input Tax Credit - IGST", Asset, Some("1100"), false),
    ("1200", "Fixed Assets", Asset, Some("1000"), true),
    ("1210", "Plant & Machinery", Asset, Some("1200"), false),
    ("1220", "Accumulated Depreciation", Asset, Some("1200"), false),
    ("2000", "Liabilities", Liability, None, true),
    ("2100", "Current Liabilities", Liability, Some("2000"), true),
    ("2110", "Accounts Payable", Liability, Some("2100"), false),
    ("2120", "Output Tax Payable - CGST", Liability, Some("2100"), false),
    ("2121", "Output Tax Payable - SGST", Liability, Some("2100"), false),
    ("2122", "Output Tax Payable - IGST", Liability, Some("2100"), false),
    ("2130", "TDS Payable", Liability, Some("2100"), false),
    ("2200", "Long-term Liabilities", Liability, Some("2000"), true),
    ("2210", "Bank Loans", Liability, Some("2200"), false),
    ("3000", "Equity", Equity, None, true),
    ("3100", "Owner's Capital", Equity, Some("3000"), false),
    ("3200", "Retained Earnings", Equity, Some("3000"), false),
    ("4000", "Revenue", Revenue, None, true),
    ("4100", "Sales Revenue", Revenue, Some("4000"), false),
    ("4200", "Other Income", Revenue, Some("4000"), false),
    ("5000", "Expenses", Expense, None, true),
    ("5100", "Cost of Goods Sold", Expense, Some("5000"), false),
    ("5200", "Operating Expenses", Expense, Some("5000"), true),
    ("5210", "Salaries and Wages", Expense, Some("5200"), false),
    ("5220", "Rent", Expense, Some("5200"), false),
    ("5230", "Utilities", Expense, Some("5200"), false),
    ("5240", "Marketing Expenses", Expense, Some("5200"), false),
    ("5300", "Financial Expenses", Expense, Some("5000"), true),
    ("5310", "Bank Charges", Expense, Some("5300"), false),
    ("5320", "Interest Expense", Expense, Some("5300"), false),
];

/// Well-known codes used by invoice posting.
pub mod codes {
    pub const CASH: &str = "1110";
    pub const RECEIVABLES: &str = "1120";
    pub const PAYABLES: &str = "2110";
    pub const SALES: &str = "4100";
    pub const COST_OF_GOODS_SOLD: &str = "5100";
}

/// GST slabs in percent.
const GST_SLABS: &[u32] = &[0, 5, 12, 18, 28];

/// Insert the default chart. Returns the number of accounts created.
pub fn seed_chart_of_accounts(ledger: &mut Ledger, now: DateTime<Utc>) -> DomainResult<usize> {
    for (code, name, account_type, parent, is_group) in CHART {
        let parent_id = match parent {
            Some(parent_code) => Some(
                ledger
                    .account_by_code(parent_code)
                    .ok_or_else(|| {
                        DomainError::invariant(format!("seed parent {parent_code} missing"))
                    })?
                    .id,
            ),
            None => None,
        };
        ledger.create_account(
            NewAccount {
                code: code.to_string(),
                name: name.to_string(),
                account_type: *account_type,
                parent_id,
                is_group: *is_group,
                currency_code: None,
            },
            now,
        )?;
    }
    Ok(CHART.len())
}

/// Output and input CGST/SGST (half rate) and IGST (full rate) for every
/// slab, linked to the tax payable and input credit accounts. Skipped when
/// any of those accounts is missing. Returns the number of rates created.
pub fn seed_gst_rates(ledger: &mut Ledger, now: DateTime<Utc>) -> DomainResult<usize> {
    let lookup = |code: &str| ledger.account_by_code(code).map(|a| a.id);
    let (Some(out_cgst), Some(out_sgst), Some(out_igst), Some(in_cgst), Some(in_sgst), Some(in_igst)) = (
        lookup("2120"),
        lookup("2121"),
        lookup("2122"),
        lookup("1140"),
        lookup("1141"),
        lookup("1142"),
    ) else {
        return Ok(0);
    };

    let mut created = 0;
    for slab in GST_SLABS {
        let full = Decimal::new(i64::from(*slab), 2);
        let half = full / Decimal::TWO;
        let rates = [
            ("Output", TaxType::Cgst, half, out_cgst),
            ("Output", TaxType::Sgst, half, out_sgst),
            ("Output", TaxType::Igst, full, out_igst),
            ("Input", TaxType::Cgst, half, in_cgst),
            ("Input", TaxType::Sgst, half, in_sgst),
            ("Input", TaxType::Igst, full, in_igst),
        ];
        for (side, tax_type, rate, account_id) in rates {
            ledger.create_tax_rate(
                NewTaxRate {
                    name: format!("{side} {tax_type} {slab}%"),
                    tax_type,
                    rate,
                    account_id,
                },
                now,
            )?;
            created += 1;
        }
    }
    Ok(created)
}

/// Open the April-to-March year containing `today`.
pub fn seed_fiscal_year(
    ledger: &mut Ledger,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> DomainResult<FiscalYear> {
    ledger.create_fiscal_year(indian_fiscal_year(today), now)
}

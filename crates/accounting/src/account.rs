//! Chart-of-accounts nodes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallyforge_core::{AccountId, DomainError, DomainResult, Entity, TenantId};

/// High-level account type (determines normal balance side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }

    /// Assets and expenses grow on the debit side.
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, Self::Asset | Self::Expense)
    }

    /// Balance in the account's natural sign.
    pub fn signed_balance(&self, debit: Decimal, credit: Decimal) -> Decimal {
        if self.is_debit_normal() {
            debit - credit
        } else {
            credit - debit
        }
    }
}

impl core::fmt::Display for AccountType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for AccountType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "revenue" => Ok(Self::Revenue),
            "expense" => Ok(Self::Expense),
            _ => Err(DomainError::validation(
                "account type must be one of: asset, liability, equity, revenue, expense",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub tenant_id: TenantId,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub parent_id: Option<AccountId>,
    /// Group accounts aggregate children and never receive postings.
    pub is_group: bool,
    pub currency_code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Account {
    type Id = AccountId;
    const KIND: &'static str = "account";

    fn id(&self) -> AccountId {
        self.id
    }
}

impl Account {
    pub fn is_postable(&self) -> bool {
        self.is_active && !self.is_group
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub parent_id: Option<AccountId>,
    pub is_group: bool,
    /// Defaults to the ledger's currency when absent.
    pub currency_code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// Nested view of the chart for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountNode {
    pub account: Account,
    pub children: Vec<AccountNode>,
}

pub(crate) fn validate_code(code: &str) -> DomainResult<String> {
    let code = code.trim();
    if code.is_empty() || code.len() > 20 {
        return Err(DomainError::validation("account code must be 1..=20 characters"));
    }
    Ok(code.to_string())
}

pub(crate) fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() || name.len() > 255 {
        return Err(DomainError::validation("account name must be 1..=255 characters"));
    }
    Ok(name.to_string())
}

pub fn validate_currency(code: &str) -> DomainResult<String> {
    let code = code.trim().to_uppercase();
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(DomainError::validation(format!(
            "currency code '{code}' must be three letters"
        )));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Revenue".parse::<AccountType>().unwrap(), AccountType::Revenue);
        assert!("income".parse::<AccountType>().is_err());
    }

    #[test]
    fn liabilities_are_credit_normal() {
        assert_eq!(AccountType::Liability.signed_balance(dec!(10), dec!(250)), dec!(240));
        assert_eq!(AccountType::Expense.signed_balance(dec!(10), dec!(250)), dec!(-240));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

        #[test]
        fn sign_conventions_are_mirror_images(debit in 0i64..1_000_000, credit in 0i64..1_000_000) {
            let (d, c) = (Decimal::new(debit, 2), Decimal::new(credit, 2));
            prop_assert_eq!(
                AccountType::Asset.signed_balance(d, c),
                -AccountType::Equity.signed_balance(d, c)
            );
            prop_assert_eq!(
                AccountType::Expense.signed_balance(d, c),
                -AccountType::Revenue.signed_balance(d, c)
            );
        }
    }
}

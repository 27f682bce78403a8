//! GST tax rates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallyforge_core::{
    AccountId, DomainError, DomainResult, Entity, TaxRateId, TenantId, round_amount, round_rate,
};

use crate::ledger::Ledger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaxType {
    Cgst,
    Sgst,
    Igst,
    Cess,
}

impl TaxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cgst => "CGST",
            Self::Sgst => "SGST",
            Self::Igst => "IGST",
            Self::Cess => "CESS",
        }
    }
}

impl core::fmt::Display for TaxType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate {
    pub id: TaxRateId,
    pub tenant_id: TenantId,
    pub name: String,
    pub tax_type: TaxType,
    /// Fraction in `0..=1`, four decimal places.
    pub rate: Decimal,
    /// Ledger account the tax is posted to.
    pub account_id: AccountId,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for TaxRate {
    type Id = TaxRateId;
    const KIND: &'static str = "tax rate";

    fn id(&self) -> TaxRateId {
        self.id
    }
}

impl TaxRate {
    pub fn compute_tax(&self, amount: Decimal) -> Decimal {
        round_amount(amount * self.rate)
    }
}

#[derive(Debug, Clone)]
pub struct NewTaxRate {
    pub name: String,
    pub tax_type: TaxType,
    pub rate: Decimal,
    pub account_id: AccountId,
}

#[derive(Debug, Clone, Default)]
pub struct TaxRateUpdate {
    pub name: Option<String>,
    pub rate: Option<Decimal>,
    pub is_active: Option<bool>,
}

fn validate_tax_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() || name.len() > 100 {
        return Err(DomainError::validation("tax rate name must be 1..=100 characters"));
    }
    Ok(name.to_string())
}

fn validate_rate(rate: Decimal) -> DomainResult<Decimal> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(DomainError::validation("tax rate must be between 0 and 1"));
    }
    Ok(round_rate(rate))
}

impl Ledger {
    pub fn create_tax_rate(&mut self, new: NewTaxRate, now: DateTime<Utc>) -> DomainResult<TaxRate> {
        let name = validate_tax_name(&new.name)?;
        let rate = validate_rate(new.rate)?;
        if !self.accounts.contains(new.account_id) {
            return Err(DomainError::validation(format!(
                "account {} not found",
                new.account_id
            )));
        }

        let tax_rate = TaxRate {
            id: TaxRateId::new(),
            tenant_id: self.tenant_id(),
            name,
            tax_type: new.tax_type,
            rate,
            account_id: new.account_id,
            is_active: true,
            created_at: now,
        };
        self.tax_rates.insert(tax_rate.clone());
        Ok(tax_rate)
    }

    pub fn tax_rate(&self, id: TaxRateId) -> DomainResult<&TaxRate> {
        self.tax_rates.require(id)
    }

    /// Ordered by name.
    pub fn list_tax_rates(&self, active_only: bool) -> Vec<&TaxRate> {
        self.tax_rates
            .select(|t| !active_only || t.is_active, |a, b| a.name.cmp(&b.name))
    }

    pub fn update_tax_rate(&mut self, id: TaxRateId, update: TaxRateUpdate) -> DomainResult<TaxRate> {
        let name = update.name.as_deref().map(validate_tax_name).transpose()?;
        let rate = update.rate.map(validate_rate).transpose()?;

        let tax_rate = self.tax_rates.require_mut(id)?;
        if let Some(name) = name {
            tax_rate.name = name;
        }
        if let Some(rate) = rate {
            tax_rate.rate = rate;
        }
        if let Some(active) = update.is_active {
            tax_rate.is_active = active;
        }
        Ok(tax_rate.clone())
    }

    pub fn deactivate_tax_rate(&mut self, id: TaxRateId) -> DomainResult<TaxRate> {
        self.update_tax_rate(
            id,
            TaxRateUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::fixture;
    use rust_decimal_macros::dec;

    fn gst18(account_id: AccountId) -> NewTaxRate {
        NewTaxRate {
            name: "IGST 18%".to_string(),
            tax_type: TaxType::Igst,
            rate: dec!(0.18),
            account_id,
        }
    }

    #[test]
    fn tax_is_rounded_to_paise() {
        let mut f = fixture();
        let rate = f.ledger.create_tax_rate(gst18(f.sales), Utc::now()).unwrap();
        assert_eq!(rate.compute_tax(dec!(333.33)), dec!(60.00));
        assert_eq!(rate.compute_tax(dec!(0.25)), dec!(0.05));
    }

    #[test]
    fn rate_must_be_a_fraction() {
        let mut f = fixture();
        let mut new = gst18(f.sales);
        new.rate = dec!(18);
        assert_eq!(
            f.ledger.create_tax_rate(new, Utc::now()).unwrap_err(),
            DomainError::validation("tax rate must be between 0 and 1")
        );
    }

    #[test]
    fn unknown_account_is_a_validation_error() {
        let mut f = fixture();
        let err = f.ledger.create_tax_rate(gst18(AccountId::new()), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rates_are_stored_with_four_places() {
        let mut f = fixture();
        let mut new = gst18(f.sales);
        new.rate = dec!(0.123456);
        let rate = f.ledger.create_tax_rate(new, Utc::now()).unwrap();
        assert_eq!(rate.rate, dec!(0.1235));
    }

    #[test]
    fn deactivated_rates_drop_out_of_active_listing() {
        let mut f = fixture();
        let rate = f.ledger.create_tax_rate(gst18(f.sales), Utc::now()).unwrap();
        f.ledger.deactivate_tax_rate(rate.id).unwrap();
        assert!(f.ledger.list_tax_rates(true).is_empty());
        assert_eq!(f.ledger.list_tax_rates(false).len(), 1);
    }

    #[test]
    fn tax_type_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&TaxType::Cess).unwrap(), "\"CESS\"");
    }
}

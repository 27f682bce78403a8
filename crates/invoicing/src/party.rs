//! Customers and vendors.
//!
//! Both share a [`PartyProfile`] and differ only in the control account
//! they settle against: receivables (an asset) for customers, payables (a
//! liability) for vendors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tallyforge_accounting::account::validate_currency;
use tallyforge_accounting::{AccountType, Ledger};
use tallyforge_core::{
    AccountId, CustomerId, DomainError, DomainResult, Entity, Gstin, Pan, TenantId, VendorId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyProfile {
    pub legal_name: String,
    pub display_name: Option<String>,
    pub gstin: Option<Gstin>,
    pub pan: Option<Pan>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub billing_address: Value,
    pub shipping_address: Option<Value>,
    pub currency_code: String,
    pub payment_terms_days: u32,
}

/// Input for creating either party kind. `account_id` is the control
/// account.
#[derive(Debug, Clone, Default)]
pub struct NewParty {
    pub legal_name: String,
    pub display_name: Option<String>,
    pub gstin: Option<String>,
    pub pan: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub billing_address: Option<Value>,
    pub shipping_address: Option<Value>,
    pub currency_code: Option<String>,
    pub payment_terms_days: Option<u32>,
    pub account_id: AccountId,
}

#[derive(Debug, Clone, Default)]
pub struct PartyUpdate {
    pub legal_name: Option<String>,
    pub display_name: Option<String>,
    pub gstin: Option<String>,
    pub pan: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub billing_address: Option<Value>,
    pub shipping_address: Option<Value>,
    pub currency_code: Option<String>,
    pub payment_terms_days: Option<u32>,
    pub account_id: Option<AccountId>,
}

impl PartyUpdate {
    pub fn is_empty(&self) -> bool {
        self.legal_name.is_none()
            && self.display_name.is_none()
            && self.gstin.is_none()
            && self.pan.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.billing_address.is_none()
            && self.shipping_address.is_none()
            && self.currency_code.is_none()
            && self.payment_terms_days.is_none()
            && self.account_id.is_none()
    }
}

fn validate_legal_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() || name.len() > 255 {
        return Err(DomainError::validation("legal name must be 1..=255 characters"));
    }
    Ok(name.to_string())
}

impl PartyProfile {
    fn from_new(new: &NewParty, default_terms_days: u32) -> DomainResult<Self> {
        Ok(Self {
            legal_name: validate_legal_name(&new.legal_name)?,
            display_name: new.display_name.clone(),
            gstin: new.gstin.as_deref().map(Gstin::parse).transpose()?,
            pan: new.pan.as_deref().map(Pan::parse).transpose()?,
            email: new.email.as_ref().map(|e| e.trim().to_lowercase()),
            phone: new.phone.clone(),
            billing_address: new
                .billing_address
                .clone()
                .unwrap_or_else(|| Value::Object(Default::default())),
            shipping_address: new.shipping_address.clone(),
            currency_code: validate_currency(new.currency_code.as_deref().unwrap_or("INR"))?,
            payment_terms_days: new.payment_terms_days.unwrap_or(default_terms_days),
        })
    }

    /// Validate every field first, then apply, so a bad field leaves the
    /// profile untouched.
    fn apply(&mut self, update: &PartyUpdate) -> DomainResult<()> {
        let legal_name = update.legal_name.as_deref().map(validate_legal_name).transpose()?;
        let gstin = update.gstin.as_deref().map(Gstin::parse).transpose()?;
        let pan = update.pan.as_deref().map(Pan::parse).transpose()?;
        let currency_code = update.currency_code.as_deref().map(validate_currency).transpose()?;

        if let Some(v) = legal_name {
            self.legal_name = v;
        }
        if let Some(v) = &update.display_name {
            self.display_name = Some(v.clone());
        }
        if gstin.is_some() {
            self.gstin = gstin;
        }
        if pan.is_some() {
            self.pan = pan;
        }
        if let Some(v) = &update.email {
            self.email = Some(v.trim().to_lowercase());
        }
        if let Some(v) = &update.phone {
            self.phone = Some(v.clone());
        }
        if let Some(v) = &update.billing_address {
            self.billing_address = v.clone();
        }
        if let Some(v) = &update.shipping_address {
            self.shipping_address = Some(v.clone());
        }
        if let Some(v) = currency_code {
            self.currency_code = v;
        }
        if let Some(v) = update.payment_terms_days {
            self.payment_terms_days = v;
        }
        Ok(())
    }
}

/// Behaviour shared by customers and vendors.
pub trait Party: Entity + Clone {
    /// Account type the control account must have.
    const CONTROL_TYPE: AccountType;

    fn build(
        id: Self::Id,
        tenant_id: TenantId,
        profile: PartyProfile,
        account_id: AccountId,
        now: DateTime<Utc>,
    ) -> Self;
    fn profile(&self) -> &PartyProfile;
    fn profile_mut(&mut self) -> &mut PartyProfile;
    fn control_account_id(&self) -> AccountId;
    fn set_control_account_id(&mut self, id: AccountId);
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);
    fn touch(&mut self, now: DateTime<Utc>);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub tenant_id: TenantId,
    #[serde(flatten)]
    pub profile: PartyProfile,
    pub receivable_account_id: AccountId,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub tenant_id: TenantId,
    #[serde(flatten)]
    pub profile: PartyProfile,
    pub payable_account_id: AccountId,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

macro_rules! party_impl {
    ($t:ident, $id:ident, $kind:literal, $account:ident, $control:expr) => {
        impl Entity for $t {
            type Id = $id;
            const KIND: &'static str = $kind;

            fn id(&self) -> $id {
                self.id
            }
        }

        impl Party for $t {
            const CONTROL_TYPE: AccountType = $control;

            fn build(
                id: $id,
                tenant_id: TenantId,
                profile: PartyProfile,
                account_id: AccountId,
                now: DateTime<Utc>,
            ) -> Self {
                Self {
                    id,
                    tenant_id,
                    profile,
                    $account: account_id,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                }
            }

            fn profile(&self) -> &PartyProfile {
                &self.profile
            }

            fn profile_mut(&mut self) -> &mut PartyProfile {
                &mut self.profile
            }

            fn control_account_id(&self) -> AccountId {
                self.$account
            }

            fn set_control_account_id(&mut self, id: AccountId) {
                self.$account = id;
            }

            fn is_active(&self) -> bool {
                self.is_active
            }

            fn set_active(&mut self, active: bool) {
                self.is_active = active;
            }

            fn touch(&mut self, now: DateTime<Utc>) {
                self.updated_at = now;
            }
        }
    };
}

party_impl!(Customer, CustomerId, "customer", receivable_account_id, AccountType::Asset);
party_impl!(Vendor, VendorId, "vendor", payable_account_id, AccountType::Liability);

/// A control account must be an active leaf of the party's account type.
pub(crate) fn validate_control_account<P: Party>(
    ledger: &Ledger,
    account_id: AccountId,
) -> DomainResult<()> {
    let account = ledger.account(account_id)?;
    if !account.is_active {
        return Err(DomainError::not_found("account", account_id));
    }
    if account.is_group {
        return Err(DomainError::validation("cannot link to a group account"));
    }
    if account.account_type != P::CONTROL_TYPE {
        return Err(DomainError::validation(format!(
            "account must be of type {}, but got {}",
            P::CONTROL_TYPE,
            account.account_type
        )));
    }
    Ok(())
}

pub(crate) fn new_party<P: Party>(
    id: P::Id,
    tenant_id: TenantId,
    new: &NewParty,
    ledger: &Ledger,
    default_terms_days: u32,
    now: DateTime<Utc>,
) -> DomainResult<P> {
    validate_control_account::<P>(ledger, new.account_id)?;
    let profile = PartyProfile::from_new(new, default_terms_days)?;
    Ok(P::build(id, tenant_id, profile, new.account_id, now))
}

pub(crate) fn update_party<P: Party>(
    party: &mut P,
    update: &PartyUpdate,
    ledger: &Ledger,
    now: DateTime<Utc>,
) -> DomainResult<()> {
    if update.is_empty() {
        return Err(DomainError::validation(
            "at least one field must be provided for update",
        ));
    }
    if let Some(account_id) = update.account_id {
        validate_control_account::<P>(ledger, account_id)?;
    }
    party.profile_mut().apply(update)?;
    if let Some(account_id) = update.account_id {
        party.set_control_account_id(account_id);
    }
    party.touch(now);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::seeded_ledger;
    use tallyforge_accounting::seed::codes;

    fn new_customer(ledger: &Ledger) -> NewParty {
        NewParty {
            legal_name: "  Acme Traders Pvt Ltd ".to_string(),
            gstin: Some("27aapfu0939f1zv".to_string()),
            account_id: ledger.account_by_code(codes::RECEIVABLES).unwrap().id,
            ..Default::default()
        }
    }

    #[test]
    fn customer_profile_is_normalized() {
        let ledger = seeded_ledger();
        let customer: Customer = new_party(
            CustomerId::new(),
            ledger.tenant_id(),
            &new_customer(&ledger),
            &ledger,
            30,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(customer.profile.legal_name, "Acme Traders Pvt Ltd");
        assert_eq!(customer.profile.gstin.as_ref().unwrap().as_str(), "27AAPFU0939F1ZV");
        assert_eq!(customer.profile.currency_code, "INR");
        assert_eq!(customer.profile.payment_terms_days, 30);
        assert!(customer.is_active);
    }

    #[test]
    fn vendor_needs_a_liability_account() {
        let ledger = seeded_ledger();
        let err = new_party::<Vendor>(
            VendorId::new(),
            ledger.tenant_id(),
            &new_customer(&ledger),
            &ledger,
            30,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("account must be of type liability, but got asset")
        );
    }

    #[test]
    fn group_accounts_cannot_be_control_accounts() {
        let ledger = seeded_ledger();
        let mut new = new_customer(&ledger);
        new.account_id = ledger.account_by_code("1100").unwrap().id;
        let err = new_party::<Customer>(CustomerId::new(), ledger.tenant_id(), &new, &ledger, 30, Utc::now())
            .unwrap_err();
        assert_eq!(err, DomainError::validation("cannot link to a group account"));
    }

    #[test]
    fn bad_gstin_is_rejected() {
        let ledger = seeded_ledger();
        let mut new = new_customer(&ledger);
        new.gstin = Some("27AAPFU0939F1Z".to_string());
        let err = new_party::<Customer>(CustomerId::new(), ledger.tenant_id(), &new, &ledger, 30, Utc::now())
            .unwrap_err();
        assert!(err.to_string().contains("GSTIN"));
    }

    #[test]
    fn empty_update_is_rejected() {
        let ledger = seeded_ledger();
        let mut customer: Customer = new_party(
            CustomerId::new(),
            ledger.tenant_id(),
            &new_customer(&ledger),
            &ledger,
            30,
            Utc::now(),
        )
        .unwrap();
        let err = update_party(&mut customer, &PartyUpdate::default(), &ledger, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn failed_update_changes_nothing() {
        let ledger = seeded_ledger();
        let mut customer: Customer = new_party(
            CustomerId::new(),
            ledger.tenant_id(),
            &new_customer(&ledger),
            &ledger,
            30,
            Utc::now(),
        )
        .unwrap();
        let before = customer.clone();
        let update = PartyUpdate {
            legal_name: Some("Renamed".to_string()),
            pan: Some("not-a-pan".to_string()),
            ..Default::default()
        };
        assert!(update_party(&mut customer, &update, &ledger, Utc::now()).is_err());
        assert_eq!(customer, before);
    }
}

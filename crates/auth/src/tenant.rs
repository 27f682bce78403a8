//! Tenant: the isolation boundary every other record hangs off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tallyforge_core::{DomainError, DomainResult, Entity, Gstin, Pan, TenantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    #[default]
    Trial,
    Active,
    Suspended,
    Churned,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Trial => "trial",
            TenantStatus::Active => "active",
            TenantStatus::Suspended => "suspended",
            TenantStatus::Churned => "churned",
        }
    }
}

impl core::fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantPlan {
    #[default]
    Free,
    Starter,
    Professional,
    Enterprise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub slug: String,
    pub domain: Option<String>,
    pub status: TenantStatus,
    pub plan: TenantPlan,
    pub gstin: Option<Gstin>,
    pub pan: Option<Pan>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub settings: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Tenant {
    type Id = TenantId;
    const KIND: &'static str = "tenant";

    fn id(&self) -> TenantId {
        self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewTenant {
    pub name: String,
    pub slug: String,
    pub domain: Option<String>,
    pub plan: TenantPlan,
    pub gstin: Option<String>,
    pub pan: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub settings: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct TenantUpdate {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub plan: Option<TenantPlan>,
    pub gstin: Option<String>,
    pub pan: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub settings: Option<Value>,
}

fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() || name.len() > 255 {
        return Err(DomainError::validation("tenant name must be 1..=255 characters"));
    }
    Ok(name.to_string())
}

/// Slugs are lower-case ASCII letters, digits and hyphens.
pub fn validate_slug(slug: &str) -> DomainResult<String> {
    let valid = !slug.is_empty()
        && slug.len() <= 100
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if !valid {
        return Err(DomainError::validation(format!(
            "slug '{slug}' must match ^[a-z0-9-]+$ and be at most 100 characters"
        )));
    }
    Ok(slug.to_string())
}

impl Tenant {
    pub fn create(new: NewTenant, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: TenantId::new(),
            name: validate_name(&new.name)?,
            slug: validate_slug(&new.slug)?,
            domain: new.domain.map(|d| d.trim().to_lowercase()),
            status: TenantStatus::Trial,
            plan: new.plan,
            gstin: new.gstin.as_deref().map(Gstin::parse).transpose()?,
            pan: new.pan.as_deref().map(Pan::parse).transpose()?,
            email: new.email,
            phone: new.phone,
            address: new.address,
            settings: new.settings.unwrap_or_else(|| Value::Object(Default::default())),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: TenantUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = update.name {
            self.name = validate_name(&name)?;
        }
        if let Some(domain) = update.domain {
            self.domain = Some(domain.trim().to_lowercase());
        }
        if let Some(plan) = update.plan {
            self.plan = plan;
        }
        if let Some(gstin) = update.gstin {
            self.gstin = Some(Gstin::parse(&gstin)?);
        }
        if let Some(pan) = update.pan {
            self.pan = Some(Pan::parse(&pan)?);
        }
        if update.email.is_some() {
            self.email = update.email;
        }
        if update.phone.is_some() {
            self.phone = update.phone;
        }
        if update.address.is_some() {
            self.address = update.address;
        }
        if let Some(settings) = update.settings {
            self.settings = settings;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Suspended and churned tenants are locked out of every operation.
    pub fn accepts_requests(&self) -> bool {
        !matches!(self.status, TenantStatus::Suspended | TenantStatus::Churned)
    }

    pub fn activate(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        match self.status {
            TenantStatus::Active => Err(DomainError::conflict("tenant is already active")),
            TenantStatus::Churned => Err(DomainError::conflict("churned tenants cannot be reactivated")),
            TenantStatus::Trial | TenantStatus::Suspended => {
                self.status = TenantStatus::Active;
                self.updated_at = now;
                Ok(())
            }
        }
    }

    pub fn suspend(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        match self.status {
            TenantStatus::Suspended => Err(DomainError::conflict("tenant is already suspended")),
            TenantStatus::Churned => Err(DomainError::conflict("tenant has churned")),
            TenantStatus::Trial | TenantStatus::Active => {
                self.status = TenantStatus::Suspended;
                self.updated_at = now;
                Ok(())
            }
        }
    }

    pub fn churn(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status == TenantStatus::Churned {
            return Err(DomainError::conflict("tenant has already churned"));
        }
        self.status = TenantStatus::Churned;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_tenant(slug: &str) -> NewTenant {
        NewTenant {
            name: "Acme Traders".to_string(),
            slug: slug.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn new_tenants_start_on_trial() {
        let tenant = Tenant::create(new_tenant("acme"), Utc::now()).unwrap();
        assert_eq!(tenant.status, TenantStatus::Trial);
        assert_eq!(tenant.plan, TenantPlan::Free);
        assert!(tenant.accepts_requests());
    }

    #[test]
    fn slug_rejects_upper_case_and_spaces() {
        assert!(Tenant::create(new_tenant("Acme"), Utc::now()).is_err());
        assert!(Tenant::create(new_tenant("acme traders"), Utc::now()).is_err());
        assert!(Tenant::create(new_tenant("acme-traders-2"), Utc::now()).is_ok());
    }

    #[test]
    fn suspended_tenants_are_locked_out_until_reactivated() {
        let mut tenant = Tenant::create(new_tenant("acme"), Utc::now()).unwrap();
        tenant.suspend(Utc::now()).unwrap();
        assert!(!tenant.accepts_requests());
        assert!(tenant.suspend(Utc::now()).is_err());

        tenant.activate(Utc::now()).unwrap();
        assert!(tenant.accepts_requests());
    }

    #[test]
    fn churn_is_terminal() {
        let mut tenant = Tenant::create(new_tenant("acme"), Utc::now()).unwrap();
        tenant.churn(Utc::now()).unwrap();
        assert!(tenant.activate(Utc::now()).is_err());
        assert!(!tenant.accepts_requests());
    }

    #[test]
    fn tax_ids_are_validated() {
        let mut new = new_tenant("acme");
        new.gstin = Some("bad".to_string());
        assert!(Tenant::create(new, Utc::now()).is_err());
    }
}

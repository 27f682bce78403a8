use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use tallyforge_core::{DomainError, DomainResult};

/// Resource names permissions are granted on.
pub mod resources {
    pub const TENANTS: &str = "tenants";
    pub const USERS: &str = "users";
    pub const ROLES: &str = "roles";
    pub const PERMISSIONS: &str = "permissions";
    pub const AUDIT_LOGS: &str = "audit_logs";
    pub const CUSTOMERS: &str = "customers";
    pub const VENDORS: &str = "vendors";
    pub const INVOICES: &str = "invoices";
    pub const PAYMENTS: &str = "payments";
    pub const PRODUCTS: &str = "products";
    pub const INVENTORY: &str = "inventory";
    pub const ORDERS: &str = "orders";
    pub const REPORTS: &str = "reports";
    pub const ACCOUNTS: &str = "accounts";
    pub const JOURNAL_ENTRIES: &str = "journal_entries";
    pub const FISCAL_YEARS: &str = "fiscal_years";
    pub const TAX_RATES: &str = "tax_rates";

    pub const ALL: &[&str] = &[
        TENANTS,
        USERS,
        ROLES,
        PERMISSIONS,
        AUDIT_LOGS,
        CUSTOMERS,
        VENDORS,
        INVOICES,
        PAYMENTS,
        PRODUCTS,
        INVENTORY,
        ORDERS,
        REPORTS,
        ACCOUNTS,
        JOURNAL_ENTRIES,
        FISCAL_YEARS,
        TAX_RATES,
    ];

    /// Everything except identity administration.
    pub const BUSINESS: &[&str] = &[
        CUSTOMERS,
        VENDORS,
        INVOICES,
        PAYMENTS,
        PRODUCTS,
        INVENTORY,
        ORDERS,
        REPORTS,
        ACCOUNTS,
        JOURNAL_ENTRIES,
        FISCAL_YEARS,
        TAX_RATES,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Export,
    Import,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Export,
        Action::Import,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Export => "export",
            Action::Import => "import",
        }
    }
}

impl core::str::FromStr for Action {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown action '{s}'")))
    }
}

/// A `(resource, action)` grant.
///
/// Either half may be the wildcard `"*"`; `("*", "*")` grants everything
/// inside the tenant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Permission {
    resource: Cow<'static, str>,
    action: Cow<'static, str>,
}

pub const WILDCARD: &str = "*";

impl Permission {
    pub fn new(resource: impl Into<Cow<'static, str>>, action: Action) -> Self {
        Self {
            resource: resource.into(),
            action: Cow::Borrowed(action.as_str()),
        }
    }

    /// Grant every action on every resource.
    pub fn all() -> Self {
        Self {
            resource: Cow::Borrowed(WILDCARD),
            action: Cow::Borrowed(WILDCARD),
        }
    }

    /// Grant every action on one resource.
    pub fn any_action(resource: impl Into<Cow<'static, str>>) -> Self {
        Self {
            resource: resource.into(),
            action: Cow::Borrowed(WILDCARD),
        }
    }

    /// Parse `"resource:action"` (either side may be `*`).
    pub fn parse(s: &str) -> DomainResult<Self> {
        let (resource, action) = s
            .split_once(':')
            .ok_or_else(|| DomainError::validation(format!("permission '{s}' must be resource:action")))?;
        let resource = resource.trim();
        let action = action.trim();
        if resource.is_empty() || resource.len() > 100 {
            return Err(DomainError::validation("permission resource must be 1..=100 characters"));
        }
        if action != WILDCARD {
            action.parse::<Action>()?;
        }
        Ok(Self {
            resource: Cow::Owned(resource.to_string()),
            action: Cow::Owned(action.to_string()),
        })
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn is_wildcard(&self) -> bool {
        self.resource() == WILDCARD && self.action() == WILDCARD
    }

    /// Does holding `self` satisfy a requirement for `required`?
    pub fn grants(&self, required: &Permission) -> bool {
        (self.resource() == WILDCARD || self.resource() == required.resource())
            && (self.action() == WILDCARD || self.action() == required.action())
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_permission_grants_itself_only() {
        let read = Permission::new(resources::INVOICES, Action::Read);
        assert!(read.grants(&Permission::new(resources::INVOICES, Action::Read)));
        assert!(!read.grants(&Permission::new(resources::INVOICES, Action::Update)));
        assert!(!read.grants(&Permission::new(resources::CUSTOMERS, Action::Read)));
    }

    #[test]
    fn wildcards_match_their_half() {
        let any_invoice = Permission::any_action(resources::INVOICES);
        assert!(any_invoice.grants(&Permission::new(resources::INVOICES, Action::Delete)));
        assert!(!any_invoice.grants(&Permission::new(resources::VENDORS, Action::Delete)));
        assert!(Permission::all().grants(&Permission::new(resources::VENDORS, Action::Import)));
    }

    #[test]
    fn parse_accepts_known_actions() {
        let p = Permission::parse("journal_entries:create").unwrap();
        assert_eq!(p, Permission::new(resources::JOURNAL_ENTRIES, Action::Create));
        assert_eq!(p.to_string(), "journal_entries:create");
        assert!(Permission::parse("reports:*").is_ok());
        assert!(Permission::parse("reports:approve").is_err());
        assert!(Permission::parse("reports").is_err());
    }
}

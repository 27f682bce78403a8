//! Tenant provisioning and lifecycle.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use tallyforge_accounting::{FiscalYear, seed};
use tallyforge_auth::role::ADMIN_ROLE;
use tallyforge_auth::{
    Action, NewTenant, NewUser, Principal, Tenant, TenantEvent, TenantUpdate, User, resources,
};
use tallyforge_core::{DomainError, TenantId};
use tallyforge_events::{EventBus, EventEnvelope};
use tallyforge_infra::TenantBooks;

use crate::app::{App, Required, admit, needs};
use crate::context::RequestContext;
use crate::errors::AppResult;

/// Result of [`App::provision_tenant`].
#[derive(Debug, Clone, Serialize)]
pub struct Provisioned {
    pub tenant: Tenant,
    pub admin_user: User,
    pub fiscal_year: FiscalYear,
    pub accounts_seeded: usize,
    pub tax_rates_seeded: usize,
}

impl<B> App<B>
where
    B: EventBus<EventEnvelope>,
{
    /// Create a tenant with its default roles, an admin user, the current
    /// Indian fiscal year, the standard chart of accounts and GST rates.
    ///
    /// Nothing is registered unless every step succeeds.
    pub fn provision_tenant(
        &self,
        new: NewTenant,
        admin_email: &str,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<Provisioned> {
        let tenant = Tenant::create(new, now)?;
        let tenant_id = tenant.id;
        let mut books = TenantBooks::new(
            tenant,
            self.settings().posting_policy(),
            self.settings().invoicing_policy(),
        );
        books.record(TenantEvent::Created {
            tenant_id,
            slug: books.tenant.slug.clone(),
            occurred_at: now,
        });

        books.directory.seed_system_roles(now)?;
        let admin_user = books.directory.create_user(
            NewUser {
                email: admin_email.to_string(),
                is_verified: true,
                ..Default::default()
            },
            now,
        )?;
        let admin_role = books
            .directory
            .role_by_name(ADMIN_ROLE)
            .map(|r| r.id)
            .ok_or_else(|| DomainError::invariant("admin role missing after seeding"))?;
        // The platform hands out the first admin role; no tenant user can yet.
        let platform = Principal {
            user_id: admin_user.id,
            tenant_id,
            is_superuser: true,
            roles: Vec::new(),
            permissions: Vec::new(),
        };
        books.directory.assign_role(&platform, admin_user.id, admin_role)?;

        let fiscal_year = seed::seed_fiscal_year(&mut books.ledger, today, now)?;
        let accounts_seeded = seed::seed_chart_of_accounts(&mut books.ledger, now)?;
        let tax_rates_seeded = seed::seed_gst_rates(&mut books.ledger, now)?;
        books.record(TenantEvent::Provisioned {
            tenant_id,
            admin_user_id: admin_user.id,
            accounts_seeded,
            tax_rates_seeded,
            occurred_at: now,
        });

        let tenant = books.tenant.clone();
        self.store().create_tenant(books, Some(admin_user.id))?;
        info!(
            %tenant_id,
            slug = %tenant.slug,
            accounts_seeded,
            tax_rates_seeded,
            fiscal_year = %fiscal_year.name,
            "tenant provisioned"
        );

        Ok(Provisioned {
            tenant,
            admin_user,
            fiscal_year,
            accounts_seeded,
            tax_rates_seeded,
        })
    }

    pub fn get_tenant(&self, ctx: &RequestContext) -> AppResult<Tenant> {
        self.query(ctx, needs(resources::TENANTS, Action::Read), |books| {
            Ok(books.tenant.clone())
        })
    }

    /// Slug lookup for request routing; no principal is involved.
    pub fn get_tenant_by_slug(&self, slug: &str) -> AppResult<Tenant> {
        let id = self
            .store()
            .find_by_slug(slug)?
            .ok_or_else(|| DomainError::not_found("tenant", slug))?;
        Ok(self.store().read(id, |books| books.tenant.clone())?)
    }

    /// Admin-only. A custom domain must not be held by any other tenant.
    pub fn update_tenant(&self, ctx: &RequestContext, update: TenantUpdate) -> AppResult<Tenant> {
        self.store()
            .transaction_claiming_domain(ctx.tenant_id, ctx.actor(), |books| {
                admit(books, ctx, &Required::Admin)?;
                books.tenant.apply_update(update, ctx.now)?;
                Ok(books.tenant.clone())
            })
    }

    // Lifecycle transitions are platform operations, like provisioning: no
    // tenant principal is involved and the status gate does not apply.

    /// Move a trial or suspended tenant to active.
    pub fn activate_tenant(&self, tenant_id: TenantId, now: DateTime<Utc>) -> AppResult<Tenant> {
        self.store().transaction(tenant_id, None, |books| {
            books.tenant.activate(now)?;
            info!(%tenant_id, "tenant activated");
            Ok(books.tenant.clone())
        })
    }

    pub fn suspend_tenant(&self, tenant_id: TenantId, now: DateTime<Utc>) -> AppResult<Tenant> {
        self.store().transaction(tenant_id, None, |books| {
            books.tenant.suspend(now)?;
            books.record(TenantEvent::Suspended {
                tenant_id,
                occurred_at: now,
            });
            info!(%tenant_id, "tenant suspended");
            Ok(books.tenant.clone())
        })
    }

    pub fn churn_tenant(&self, tenant_id: TenantId, now: DateTime<Utc>) -> AppResult<Tenant> {
        self.store().transaction(tenant_id, None, |books| {
            books.tenant.churn(now)?;
            info!(%tenant_id, "tenant churned");
            Ok(books.tenant.clone())
        })
    }
}

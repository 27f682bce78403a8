use chrono::{DateTime, NaiveDate, Utc};

use tallyforge_core::{TenantId, UserId};

/// Who is acting, in which tenant, and when.
///
/// The calendar date and the instant come from the caller (the HTTP edge in
/// production, fixed values in tests), never from the system clock.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(tenant_id: TenantId, user_id: UserId, today: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            tenant_id,
            user_id,
            today,
            now,
        }
    }

    /// Context stamped with the current UTC date and time.
    pub fn at_now(tenant_id: TenantId, user_id: UserId) -> Self {
        let now = Utc::now();
        Self::new(tenant_id, user_id, now.date_naive(), now)
    }

    pub fn actor(&self) -> Option<UserId> {
        Some(self.user_id)
    }
}

//! Application error taxonomy.
//!
//! Every failure a caller can see is an [`AppError`]. An outer transport maps
//! [`ErrorCategory`] to its own status codes and uses [`AppError::code`] as
//! the stable machine-readable identifier.

use thiserror::Error;

use tallyforge_auth::AuthzError;
use tallyforge_core::{DomainError, TenantId};
use tallyforge_infra::StoreError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    BadRequest,
    NotFound,
    Conflict,
    Forbidden,
    Unauthorized,
    Internal,
}

impl ErrorCategory {
    /// Conventional HTTP status for the category.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCategory::BadRequest => 400,
            ErrorCategory::Unauthorized => 401,
            ErrorCategory::Forbidden => 403,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Conflict => 409,
            ErrorCategory::Internal => 500,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error("store failure: {0}")]
    Store(StoreError),

    #[error("tenant {0} is not accepting requests")]
    TenantSuspended(TenantId),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TenantNotFound(id) => AppError::Domain(DomainError::not_found("tenant", id)),
            StoreError::Domain(err) => AppError::Domain(err),
            other => AppError::Store(other),
        }
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Domain(err) => match err {
                DomainError::Validation(_) | DomainError::InvalidId(_) => "validation_error",
                DomainError::InvariantViolation(_) => "invariant_violation",
                DomainError::NotFound { .. } => "not_found",
                DomainError::Conflict(_) => "conflict",
                DomainError::Forbidden(_) => "forbidden",
                DomainError::Unauthorized => "unauthorized",
            },
            AppError::Authz(_) => "forbidden",
            AppError::Store(_) => "store_error",
            AppError::TenantSuspended(_) => "tenant_suspended",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Domain(err) => match err {
                DomainError::Validation(_)
                | DomainError::InvalidId(_)
                | DomainError::InvariantViolation(_) => ErrorCategory::BadRequest,
                DomainError::NotFound { .. } => ErrorCategory::NotFound,
                DomainError::Conflict(_) => ErrorCategory::Conflict,
                DomainError::Forbidden(_) => ErrorCategory::Forbidden,
                DomainError::Unauthorized => ErrorCategory::Unauthorized,
            },
            AppError::Authz(_) | AppError::TenantSuspended(_) => ErrorCategory::Forbidden,
            AppError::Store(_) => ErrorCategory::Internal,
        }
    }

    /// JSON body an outer transport can return as-is.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_categories_line_up() {
        let cases = [
            (AppError::from(DomainError::validation("x")), "validation_error", 400),
            (AppError::from(DomainError::not_found("account", "1")), "not_found", 404),
            (AppError::from(DomainError::conflict("x")), "conflict", 409),
            (AppError::from(DomainError::forbidden("x")), "forbidden", 403),
            (AppError::from(DomainError::Unauthorized), "unauthorized", 401),
            (AppError::from(AuthzError::AdminRequired), "forbidden", 403),
            (AppError::TenantSuspended(TenantId::new()), "tenant_suspended", 403),
            (AppError::from(StoreError::Poisoned), "store_error", 500),
        ];
        for (err, code, status) in cases {
            assert_eq!(err.code(), code, "{err}");
            assert_eq!(err.category().http_status(), status, "{err}");
        }
    }

    #[test]
    fn missing_tenant_surfaces_as_not_found() {
        let id = TenantId::new();
        let err = AppError::from(StoreError::TenantNotFound(id));
        assert_eq!(err.code(), "not_found");
        assert_eq!(err.to_json()["message"], format!("tenant {id} not found"));
    }
}

//! `tallyforge-auth`: tenants, users and role-based access control.
//!
//! This crate is intentionally decoupled from HTTP, token formats and
//! password hashing: it owns identities and answers "may this principal do
//! that", nothing more.

pub mod authorize;
pub mod defaults;
pub mod directory;
pub mod events;
pub mod permissions;
pub mod principal;
pub mod role;
pub mod tenant;
pub mod user;

pub use authorize::{AuthzError, authorize, require_admin};
pub use directory::Directory;
pub use events::{IdentityEvent, TenantEvent};
pub use permissions::{Action, Permission, resources};
pub use principal::Principal;
pub use role::{NewRole, Role, RoleUpdate};
pub use tenant::{NewTenant, Tenant, TenantPlan, TenantStatus, TenantUpdate};
pub use user::{NewUser, User, UserFilter, UserUpdate};

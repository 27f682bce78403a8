//! Application services, one module per area. Each adds methods to [`crate::App`].

pub mod finance;
pub mod identity;
pub mod invoicing;
pub mod tenants;

pub use tenants::Provisioned;

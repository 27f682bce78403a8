//! `tallyforge-infra`: settings and the tenant-partitioned store.

pub mod books;
pub mod config;
pub mod store;

pub use books::TenantBooks;
pub use config::{Settings, SettingsError};
pub use store::{Store, StoreError};

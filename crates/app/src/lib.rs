//! `tallyforge-app`: the application boundary.
//!
//! [`App`] exposes every business operation with tenant admission,
//! authorization and transactional execution applied uniformly. Transport
//! layers (HTTP, jobs, CLIs) call into it with a [`RequestContext`].

pub mod app;
pub mod context;
pub mod errors;
pub mod services;

pub use app::{App, Required};
pub use context::RequestContext;
pub use errors::{AppError, AppResult, ErrorCategory};
pub use services::Provisioned;

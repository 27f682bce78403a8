//! Process settings.
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. optional `tallyforge.{toml,yaml,json}` in the working directory
//! 3. `TALLYFORGE__*` environment variables (after loading `.env`)

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use tallyforge_accounting::PostingPolicy;
use tallyforge_core::PageRequest;
use tallyforge_invoicing::InvoicingPolicy;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app_name: String,
    pub environment: String,
    pub log_level: String,
    /// `json` or `pretty`.
    pub log_format: String,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub default_currency: String,
    pub max_future_posting_days: i64,
    pub invoice_number_base: u64,
    pub default_payment_terms_days: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "tallyforge".to_string(),
            environment: "dev".to_string(),
            log_level: "info".to_string(),
            log_format: "json".to_string(),
            default_page_size: 20,
            max_page_size: 100,
            default_currency: "INR".to_string(),
            max_future_posting_days: 7,
            invoice_number_base: 1000,
            default_payment_terms_days: 30,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("tallyforge").required(false))
                .add_source(Environment::with_prefix("TALLYFORGE").separator("__")),
        )
    }

    /// Build from an explicit source chain (tests pass in-memory sources).
    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(SettingsError::Invalid {
                key: "default_page_size",
                reason: format!("must be in 1..={}", self.max_page_size),
            });
        }
        if self.max_future_posting_days < 0 {
            return Err(SettingsError::Invalid {
                key: "max_future_posting_days",
                reason: "cannot be negative".to_string(),
            });
        }
        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(SettingsError::Invalid {
                key: "log_format",
                reason: format!("expected json or pretty, got {}", self.log_format),
            });
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "prod"
    }

    pub fn posting_policy(&self) -> PostingPolicy {
        PostingPolicy {
            max_future_days: self.max_future_posting_days,
            default_currency: self.default_currency.clone(),
        }
    }

    pub fn invoicing_policy(&self) -> InvoicingPolicy {
        InvoicingPolicy {
            number_base: self.invoice_number_base,
            default_payment_terms_days: self.default_payment_terms_days,
        }
    }

    /// Page request clamped to the configured limits; `None` size means
    /// the default.
    pub fn page_request(&self, page: u32, page_size: Option<u32>) -> PageRequest {
        PageRequest::new(page, page_size.unwrap_or(self.default_page_size)).clamped(self.max_page_size)
    }
}

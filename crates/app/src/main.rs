//! Provision a demo tenant and print its opening trial balance.
//!
//! Usage: `tallyforge <slug> <admin-email>`

use anyhow::{Context, bail};

use tallyforge_app::{App, RequestContext};
use tallyforge_auth::NewTenant;
use tallyforge_infra::Settings;
use tallyforge_observability::LogFormat;

fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    let format: LogFormat = settings.log_format.parse()?;
    tallyforge_observability::init(&settings.log_level, format);

    let mut args = std::env::args().skip(1);
    let (Some(slug), Some(admin_email)) = (args.next(), args.next()) else {
        bail!("usage: tallyforge <slug> <admin-email>");
    };

    let app = App::in_memory(settings);
    let now = chrono::Utc::now();
    let provisioned = app.provision_tenant(
        NewTenant {
            name: slug.clone(),
            slug,
            ..Default::default()
        },
        &admin_email,
        now.date_naive(),
        now,
    )?;

    let ctx = RequestContext::new(
        provisioned.tenant.id,
        provisioned.admin_user.id,
        now.date_naive(),
        now,
    );
    let accounts = app.account_tree(&ctx, false)?;
    let trial_balance = app.trial_balance(&ctx, provisioned.fiscal_year.id, None)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "tenant": provisioned.tenant,
            "admin_user_id": provisioned.admin_user.id,
            "fiscal_year": provisioned.fiscal_year.name,
            "accounts": accounts,
            "trial_balance": trial_balance,
        }))?
    );
    Ok(())
}

//! Move the issue date of the ticked warehouse transfer (MM) documents

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use subiekt_tools::config::{DateChangeArgs, LogSettings};
use subiekt_tools::erp::{self, ErpConfig, SessionGuard};
use subiekt_tools::gui::dialogs;
use subiekt_tools::tool;
use subiekt_tools::workflow::run_date_change;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _ = DateChangeArgs::parse();

    tool::run_logged(&LogSettings::for_tool("MM_"), change_dates)
}

fn change_dates() -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let Some(plan) = dialogs::ask_new_date_and_dry_run(today, true) else {
        tracing::info!("Cancelled by the user");
        return Ok(());
    };
    tracing::info!(
        "New date: {}{}",
        plan.new_date,
        if plan.dry_run { " (dry run)" } else { "" }
    );

    let config = ErpConfig::from_env();
    let session = SessionGuard::new(erp::connect(&config).context("Login to Subiekt GT failed")?);
    let report = run_date_change(session.session(), &plan)?;

    if report.failed > 0 {
        tracing::warn!("{} documents could not be changed", report.failed);
    }
    Ok(())
}

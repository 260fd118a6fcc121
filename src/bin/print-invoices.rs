//! Print the ticked sales invoices, one template per customer

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use subiekt_tools::batch::{OutputTarget, Pacing};
use subiekt_tools::config::{LogSettings, PrintArgs, RunConfig};
use subiekt_tools::erp::{self, SessionGuard};
use subiekt_tools::gui::{dialogs, EguiTemplateSelector};
use subiekt_tools::workflow::run_invoice_batch;
use subiekt_tools::{printers, tool, TemplateStore};

const DEFAULT_DELAY_SECONDS: u64 = 5;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = PrintArgs::parse();
    let config = RunConfig::for_printing(args);

    tool::run_logged(&LogSettings::for_tool("FS_"), || print_invoices(&config))
}

fn print_invoices(config: &RunConfig) -> Result<()> {
    if let OutputTarget::Printer { name: Some(printer), .. } = &config.target {
        printers::ensure_printer_exists(printer)?;
        tracing::info!("Printer: {printer}");
    }

    let store = TemplateStore::at(config.storage.clone());
    tracing::info!("Template store: {}", store.path().display());

    let session = SessionGuard::new(erp::connect(&config.erp).context("Login to Subiekt GT failed")?);
    let report = run_invoice_batch(
        session.session(),
        &store,
        &mut EguiTemplateSelector,
        &config.target,
        || Pacing::seconds(dialogs::ask_delay_seconds(DEFAULT_DELAY_SECONDS).unwrap_or(0)),
    )?;

    tracing::info!("Printed {} documents", report.processed);
    Ok(())
}

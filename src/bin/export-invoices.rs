//! Export the ticked sales invoices to PDF, one template per customer

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use subiekt_tools::batch::{OutputTarget, Pacing};
use subiekt_tools::config::{default_export_dir, ExportArgs, LogSettings, RunConfig};
use subiekt_tools::erp::{self, SessionGuard};
use subiekt_tools::gui::{dialogs, EguiTemplateSelector};
use subiekt_tools::workflow::run_invoice_batch;
use subiekt_tools::{tool, TemplateStore};

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = ExportArgs::parse();

    tool::run_logged(&LogSettings::for_tool("FSPDF_"), || {
        let output_dir = match args.output_dir {
            Some(dir) => dir,
            None => dialogs::choose_output_dir(&default_export_dir()),
        };
        export_invoices(&RunConfig::for_export(args.storage, output_dir))
    })
}

fn export_invoices(config: &RunConfig) -> Result<()> {
    if let OutputTarget::Directory(dir) = &config.target {
        std::fs::create_dir_all(dir).with_context(|| format!("Cannot create {}", dir.display()))?;
        tracing::info!("Output folder: {}", dir.display());
    }

    let store = TemplateStore::at(config.storage.clone());
    tracing::info!("Template store: {}", store.path().display());

    let session = SessionGuard::new(erp::connect(&config.erp).context("Login to Subiekt GT failed")?);
    let report = run_invoice_batch(
        session.session(),
        &store,
        &mut EguiTemplateSelector,
        &config.target,
        Pacing::none,
    )?;

    tracing::info!("Exported {} documents", report.processed);
    Ok(())
}

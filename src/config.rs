//! Run configuration: command line flags plus `SFERA_*` environment variables

use crate::batch::OutputTarget;
use crate::erp::ErpConfig;
use clap::Parser;
use std::path::PathBuf;

/// Flags of `print-invoices`
#[derive(Parser, Debug)]
#[command(version, about = "Drukowanie faktur sprzedaży wzorem wybranym dla kontrahenta")]
pub struct PrintArgs {
    /// CSV with the remembered template per customer
    #[arg(long, value_name = "PATH")]
    pub storage: Option<PathBuf>,

    /// Printer name (system default when omitted)
    #[arg(long, value_name = "NAME")]
    pub printer: Option<String>,
}

/// Flags of `export-invoices`
#[derive(Parser, Debug)]
#[command(version, about = "Eksport faktur sprzedaży do PDF wzorem wybranym dla kontrahenta")]
pub struct ExportArgs {
    /// CSV with the remembered template per customer
    #[arg(long, value_name = "PATH")]
    pub storage: Option<PathBuf>,

    /// Output folder; asked interactively when omitted
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Flags of `change-mm-dates`; the date itself is asked for in a window
#[derive(Parser, Debug)]
#[command(version, about = "Zmiana daty wystawienia zaznaczonych dokumentów MM")]
pub struct DateChangeArgs {}

/// Everything a batch run needs, built once at startup
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub erp: ErpConfig,
    pub storage: Option<PathBuf>,
    pub target: OutputTarget,
}

impl RunConfig {
    pub fn for_printing(args: PrintArgs) -> Self {
        Self {
            erp: ErpConfig::from_env(),
            storage: args.storage,
            target: OutputTarget::Printer {
                name: args.printer.or_else(printer_from_env),
                copies: 1,
            },
        }
    }

    pub fn for_export(storage: Option<PathBuf>, output_dir: PathBuf) -> Self {
        Self {
            erp: ErpConfig::from_env(),
            storage,
            target: OutputTarget::Directory(output_dir),
        }
    }
}

/// Printer named by `SFERA_PRINTER_NAME`, if any
pub fn printer_from_env() -> Option<String> {
    std::env::var("SFERA_PRINTER_NAME")
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Suggested export folder: `wydruki` in the working directory
pub fn default_export_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_default().join("wydruki")
}

/// Where and under which prefix a tool writes its log
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub dir: PathBuf,
    pub prefix: &'static str,
}

impl LogSettings {
    /// `logs` in the working directory unless `SFERA_LOG_DIR` says otherwise
    pub fn for_tool(prefix: &'static str) -> Self {
        let dir = std::env::var_os("SFERA_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("logs"));
        Self { dir, prefix }
    }
}

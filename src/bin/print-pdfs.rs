//! Print every PDF of a folder on one printer

use anyhow::Result;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    subiekt_tools::gui::pdf_printer::run()
}

//! Sfera tools launcher - main entry point

use anyhow::Result;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    subiekt_tools::gui::launcher::run()
}

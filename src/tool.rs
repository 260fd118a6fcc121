//! Common shell of the ERP tools: daily log, the run itself, final notice

use crate::config::LogSettings;
use crate::gui::dialogs;
use crate::logging;
use anyhow::{anyhow, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::process::ExitCode;

/// Run a tool body with logging set up and the completion notice shown afterwards
///
/// The notice appears whether the run succeeded, failed or panicked.
pub fn run_logged(settings: &LogSettings, body: impl FnOnce() -> Result<()>) -> ExitCode {
    let log_file = match logging::init(settings) {
        Ok(path) => {
            tracing::info!("Started; logging to {}", path.display());
            Some(path)
        }
        Err(e) => {
            let _ = tracing_subscriber::fmt().try_init();
            tracing::warn!("Log file unavailable, console only: {e:#}");
            None
        }
    };

    let outcome = run_guarded(body);
    match &outcome {
        Ok(()) => tracing::info!("Finished"),
        Err(e) => tracing::error!("Run aborted: {e:#}"),
    }

    dialogs::show_completion(log_file.as_deref(), &settings.dir);
    if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Run `body`, turning a panic into an error so the caller still reaches cleanup
pub fn run_guarded(body: impl FnOnce() -> Result<()>) -> Result<()> {
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(anyhow!("Unexpected failure: {message}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_becomes_error() {
        let outcome = run_guarded(|| panic!("COM object vanished"));
        let err = outcome.unwrap_err();
        assert_eq!(err.to_string(), "Unexpected failure: COM object vanished");
    }

    #[test]
    fn test_formatted_panic_message_is_kept() {
        let id = 42;
        let err = run_guarded(|| panic!("document {id} lost")).unwrap_err();
        assert!(err.to_string().ends_with("document 42 lost"));
    }

    #[test]
    fn test_result_passes_through() {
        assert!(run_guarded(|| Ok(())).is_ok());
        let err = run_guarded(|| Err(anyhow!("login failed"))).unwrap_err();
        assert_eq!(err.to_string(), "login failed");
    }
}

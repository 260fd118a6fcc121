//! Moving the issue date of selected documents

use crate::erp::{ErpDocument, ErpError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// New date for the documents and whether to only log the change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedatePlan {
    pub new_date: NaiveDate,
    pub dry_run: bool,
}

impl RedatePlan {
    /// Noon of the new date, clear of DST shifts at midnight
    pub fn timestamp(&self) -> NaiveDateTime {
        self.new_date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedateReport {
    pub changed: usize,
    /// Numbers without the expected prefix
    pub ignored: usize,
    pub failed: usize,
}

/// Set the issue date of every document whose number starts with `prefix`
pub fn change_issue_dates<D: ErpDocument>(documents: &[D], plan: &RedatePlan, prefix: &str) -> RedateReport {
    let mut report = RedateReport::default();

    for document in documents {
        match change_one(document, plan, prefix) {
            Ok(true) => report.changed += 1,
            Ok(false) => report.ignored += 1,
            Err(e) => {
                tracing::warn!("Date change failed: {e}");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        "Done: {} changed, {} ignored, {} failed{}",
        report.changed,
        report.ignored,
        report.failed,
        if plan.dry_run { " (dry run)" } else { "" }
    );
    report
}

fn change_one<D: ErpDocument>(document: &D, plan: &RedatePlan, prefix: &str) -> Result<bool, ErpError> {
    let number = document.display_number()?;
    if !number.starts_with(prefix) {
        return Ok(false);
    }

    let message = format!(
        "Changing the date of {number} worth {:.2} from {} to {}",
        document.net_value()?,
        document.issue_date()?,
        plan.new_date
    );
    if plan.dry_run {
        tracing::info!("DRY RUN: {message}");
    } else {
        document.set_issue_date(plan.timestamp())?;
        tracing::info!("{message}");
        document.save()?;
    }
    Ok(true)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Nieprawidłowy format daty. Użyj RRRR-MM-DD lub DD.MM.RRRR")]
pub struct DateFormatError;

/// Parse a date typed by the user: `2024-03-31`, `31.03.2024` or `31/03/2024`
pub fn parse_user_date(text: &str) -> Result<NaiveDate, DateFormatError> {
    let text = text.trim();
    ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .ok_or(DateFormatError)
}

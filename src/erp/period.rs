//! Calendar month passed to the "arbitrary month" filter

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// One calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Month before the current local date
    pub fn previous_month() -> Self {
        Self::month_before(Local::now().date_naive())
    }

    /// Month preceding the one `date` falls in
    pub fn month_before(date: NaiveDate) -> Self {
        if date.month() == 1 {
            Self {
                year: date.year() - 1,
                month: 12,
            }
        } else {
            Self {
                year: date.year(),
                month: date.month() - 1,
            }
        }
    }

    /// Last second of the month; the ERP picks the month from any instant inside it
    pub fn last_instant(self) -> Option<NaiveDateTime> {
        let next_first = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)?
        };
        let last_day = next_first.pred_opt()?;
        Some(last_day.and_time(NaiveTime::from_hms_opt(23, 59, 59)?))
    }
}

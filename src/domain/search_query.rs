use chrono::{DateTime, Duration, TimeZone};
use serde::{Deserialize, Serialize};

pub const PORTAL_DATE_FORMAT: &str = "%d/%m/%Y";

/// Longest lookback a caller may ask for. Portals keep roughly a decade of
/// applications online.
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Validated,
    Decided,
}

/// One entry of a portal's week dropdown. The token is only meaningful to the
/// session that enumerated it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekOption {
    pub token: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    DateRange { days_back: u32 },
    WeeklyList { mode: ScanMode, weeks: usize },
}

impl SearchQuery {
    pub fn describe(&self) -> String {
        match self {
            SearchQuery::DateRange { days_back } => format!("last {} days", days_back),
            SearchQuery::WeeklyList { mode, weeks } => {
                format!("{} week(s) of {:?} applications", weeks, mode)
            }
        }
    }
}

/// Start date for a date-range search: exactly `days_back` days before `now`.
/// `None` when that date falls outside the representable calendar.
pub fn start_date<Tz: TimeZone>(now: &DateTime<Tz>, days_back: u32) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    let start = Duration::try_days(i64::from(days_back))
        .and_then(|lookback| now.clone().checked_sub_signed(lookback))?;
    Some(start.format(PORTAL_DATE_FORMAT).to_string())
}

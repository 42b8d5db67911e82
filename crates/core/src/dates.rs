use chrono::{Datelike, Months, NaiveDate};

use crate::errors::ValidationError;

/// Inclusive posting-date window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Last calendar day of the month `date` falls in.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
    first.checked_add_months(Months::new(1)).and_then(|next| next.pred_opt()).unwrap_or(date)
}

/// Reporting window accepted by the sales-stats tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SalesPeriod {
    LastMonth,
    ThisYear,
}

impl SalesPeriod {
    /// Parses the agent-supplied token. Models routinely quote the argument,
    /// so surrounding quotes are stripped before matching.
    pub fn parse(token: &str) -> Result<Self, ValidationError> {
        let normalized = token.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_lowercase();
        match normalized.as_str() {
            "last_month" => Ok(Self::LastMonth),
            "this_year" => Ok(Self::ThisYear),
            _ => Err(ValidationError::InvalidPeriod),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LastMonth => "last_month",
            Self::ThisYear => "this_year",
        }
    }

    pub fn resolve(&self, today: NaiveDate) -> DateRange {
        match self {
            Self::LastMonth => {
                let first_of_current = today.with_day(1).unwrap_or(today);
                let end = first_of_current.pred_opt().unwrap_or(first_of_current);
                let start = end.with_day(1).unwrap_or(end);
                DateRange { start, end }
            }
            Self::ThisYear => {
                let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                DateRange { start, end: today }
            }
        }
    }
}

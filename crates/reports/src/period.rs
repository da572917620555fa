use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use transactions::models::DateRange;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    #[default]
    CurrentMonth,
    LastMonth,
    LastThreeMonths,
    CurrentYear,
    AllTime,
}

impl ReportPeriod {
    pub const ALL: [ReportPeriod; 5] = [
        ReportPeriod::CurrentMonth,
        ReportPeriod::LastMonth,
        ReportPeriod::LastThreeMonths,
        ReportPeriod::CurrentYear,
        ReportPeriod::AllTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::CurrentMonth => "current_month",
            ReportPeriod::LastMonth => "last_month",
            ReportPeriod::LastThreeMonths => "last_three_months",
            ReportPeriod::CurrentYear => "current_year",
            ReportPeriod::AllTime => "all_time",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportPeriod::CurrentMonth => "This month",
            ReportPeriod::LastMonth => "Last month",
            ReportPeriod::LastThreeMonths => "Last 3 months",
            ReportPeriod::CurrentYear => "This year",
            ReportPeriod::AllTime => "All time",
        }
    }

    /// Inclusive date range covered by the period; `None` means no bound.
    pub fn range(&self, today: NaiveDate) -> Option<DateRange> {
        let month_start = first_of_month(today);
        match self {
            ReportPeriod::CurrentMonth => Some(DateRange::new(month_start, today)),
            ReportPeriod::LastMonth => Some(whole_months(month_start - Months::new(1), 1)),
            ReportPeriod::LastThreeMonths => Some(DateRange::new(month_start - Months::new(2), today)),
            ReportPeriod::CurrentYear => Some(DateRange::new(first_of_year(today), today)),
            ReportPeriod::AllTime => None,
        }
    }

    /// The calendar window right before [`ReportPeriod::range`], used for comparisons.
    pub fn previous_range(&self, today: NaiveDate) -> Option<DateRange> {
        let month_start = first_of_month(today);
        match self {
            ReportPeriod::CurrentMonth => Some(whole_months(month_start - Months::new(1), 1)),
            ReportPeriod::LastMonth => Some(whole_months(month_start - Months::new(2), 1)),
            ReportPeriod::LastThreeMonths => Some(whole_months(month_start - Months::new(5), 3)),
            ReportPeriod::CurrentYear => Some(whole_months(first_of_year(today) - Months::new(12), 12)),
            ReportPeriod::AllTime => None,
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.day0() as u64)
}

fn first_of_year(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.ordinal0() as u64)
}

/// `count` whole calendar months starting at `start` (the 1st of a month).
fn whole_months(start: NaiveDate, count: u32) -> DateRange {
    DateRange::new(start, start + Months::new(count) - Days::new(1))
}

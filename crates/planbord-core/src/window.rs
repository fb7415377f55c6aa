//! Pure date-range and bucketing functions for the calendar views.
//!
//! Weeks start on Monday. Month windows are padded at both ends to whole
//! weeks so a month grid always renders complete rows. The list view has no
//! window; it buckets the full item set by anchor date instead.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

use crate::models::CalendarItem;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    Day,
    Week,
    Month,
    Year,
    List,
}

impl std::fmt::Display for ViewType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewType::Day => write!(f, "day"),
            ViewType::Week => write!(f, "week"),
            ViewType::Month => write!(f, "month"),
            ViewType::Year => write!(f, "year"),
            ViewType::List => write!(f, "list"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid view type: {0}")]
pub struct ParseViewTypeError(String);

impl FromStr for ViewType {
    type Err = ParseViewTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" => Ok(ViewType::Day),
            "week" => Ok(ViewType::Week),
            "month" => Ok(ViewType::Month),
            "year" => Ok(ViewType::Year),
            "list" => Ok(ViewType::List),
            _ => Err(ParseViewTypeError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end, "window start must not be after end");
        Self { start, end }
    }

    /// The widest representable window. Used when a view has no date bound.
    pub fn unbounded() -> Self {
        Self {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Monday of the week containing `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn last_of_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    first
        .checked_add_months(Months::new(1))
        .map(|next| next - Duration::days(1))
        .unwrap_or(date)
}

/// The visible date range for a view anchored at `current`.
///
/// Returns `None` for the list view, which has no window.
pub fn window_for(current: NaiveDate, view: ViewType) -> Option<DateWindow> {
    match view {
        ViewType::Day => Some(DateWindow::new(current, current)),
        ViewType::Week => {
            let start = start_of_week(current);
            Some(DateWindow::new(start, start + Duration::days(6)))
        }
        ViewType::Month => {
            let grid_start = start_of_week(first_of_month(current));
            let grid_end = start_of_week(last_of_month(current)) + Duration::days(6);
            Some(DateWindow::new(grid_start, grid_end))
        }
        ViewType::Year => {
            let jan = current.with_month(1).and_then(|d| d.with_day(1))?;
            let dec = current.with_month(12).and_then(|d| d.with_day(1))?;
            let start = window_for(jan, ViewType::Month)?.start;
            let end = window_for(dec, ViewType::Month)?.end;
            Some(DateWindow::new(start, end))
        }
        ViewType::List => None,
    }
}

/// Advance `current` by one unit of the active view.
///
/// The list view has no navigation semantics; `current` is returned as-is.
pub fn step(current: NaiveDate, view: ViewType, direction: Direction) -> NaiveDate {
    let forward = matches!(direction, Direction::Next);
    match view {
        ViewType::Day => {
            current
                + if forward {
                    Duration::days(1)
                } else {
                    Duration::days(-1)
                }
        }
        ViewType::Week => {
            current
                + if forward {
                    Duration::days(7)
                } else {
                    Duration::days(-7)
                }
        }
        ViewType::Month => {
            let shifted = if forward {
                current.checked_add_months(Months::new(1))
            } else {
                current.checked_sub_months(Months::new(1))
            };
            shifted.unwrap_or(current)
        }
        ViewType::Year => {
            let shifted = if forward {
                current.checked_add_months(Months::new(12))
            } else {
                current.checked_sub_months(Months::new(12))
            };
            shifted.unwrap_or(current)
        }
        ViewType::List => current,
    }
}

/// Header label for the current view position.
pub fn range_label(current: NaiveDate, view: ViewType) -> String {
    match view {
        ViewType::Day => current.format("%A %d %B %Y").to_string(),
        ViewType::Week => {
            let start = start_of_week(current);
            let end = start + Duration::days(6);
            format!(
                "Week {} · {} – {}",
                current.iso_week().week(),
                start.format("%d %b"),
                end.format("%d %b %Y")
            )
        }
        ViewType::Month => current.format("%B %Y").to_string(),
        ViewType::Year => current.format("%Y").to_string(),
        ViewType::List => "All dates".to_string(),
    }
}

/// One chronological group of the list view.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub items: Vec<CalendarItem>,
}

/// Bucket items by anchor date into ascending groups.
///
/// Every item lands in exactly one group (its anchor date); items within a
/// group keep their input order.
pub fn list_buckets(items: &[CalendarItem]) -> Vec<DayBucket> {
    let mut groups: BTreeMap<NaiveDate, Vec<CalendarItem>> = BTreeMap::new();
    for item in items {
        groups
            .entry(item.anchor_date())
            .or_default()
            .push(item.clone());
    }
    groups
        .into_iter()
        .map(|(date, items)| DayBucket { date, items })
        .collect()
}

//! # Planbord Core Library
//!
//! The scheduling overlay at the heart of the planbord production
//! dashboard: four kinds of dated work items (leave requests, tasks, and
//! two production-order types) normalized onto one navigable calendar,
//! with weekly/biweekly recurrence series and drag-driven rescheduling.
//!
//! ## Features
//!
//! - **Entity Aggregation**: Concurrent per-kind fetches with independent
//!   partial failure, client-side lookup resolution, and a per-day index
//! - **Recurrence Series**: Bounded or one-year-horizon expansion of a
//!   creation request into a root-and-members order series
//! - **Series Moves**: Uniform day-offset propagation across a series,
//!   with an explicit single/series scope choice
//! - **Optimistic Mutations**: Local state changes applied ahead of the
//!   write, rolled back on failure, reconciled by a fresh fetch
//! - **View Windowing**: Pure day/week/month/year windows (Monday weeks,
//!   padded month grids) and chronological list bucketing
//! - **Drag State Machine**: A pure reducer over drag events, testable
//!   without any UI
//!
//! ## Core Modules
//!
//! - [`models`]: Core data structures and transfer objects
//! - [`aggregator`]: Entity aggregation into the calendar snapshot
//! - [`recurrence`]: Recurrence validation and series expansion
//! - [`series_move`]: Drop resolution and series-wide move planning
//! - [`executor`]: The optimistic mutation engine callers drive
//! - [`dnd`]: The drag-and-drop reducer
//! - [`window`]: View windowing and navigation
//! - [`sources`]: Ports onto the consumed collaborators
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use planbord_core::models::{EngineConfig, RecurrenceInterval, RecurrenceRequest};
//! use planbord_core::recurrence::occurrence_dates;
//! use planbord_core::window::{window_for, ViewType};
//!
//! fn main() -> Result<(), planbord_core::error::CoreError> {
//!     // A weekly series from a Monday anchor up to a bound.
//!     let anchor = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
//!     let request = RecurrenceRequest {
//!         interval: RecurrenceInterval::Weekly,
//!         open_ended: false,
//!         end_date: NaiveDate::from_ymd_opt(2025, 1, 27),
//!     };
//!     let dates = occurrence_dates(anchor, &request, &EngineConfig::default())?;
//!     assert_eq!(dates.len(), 4);
//!
//!     // The month grid containing the anchor, padded to whole weeks.
//!     let window = window_for(anchor, ViewType::Month).unwrap();
//!     assert!(window.contains(anchor));
//!
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod dnd;
pub mod error;
pub mod executor;
pub mod models;
pub mod recurrence;
pub mod series_move;
pub mod sources;
pub mod window;

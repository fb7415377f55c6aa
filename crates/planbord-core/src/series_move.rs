//! Resolution of drag-initiated date changes, including series-wide shifts.
//!
//! A drop on a new date either moves one record directly or, for a series
//! member, first asks the caller to choose a scope. A series-scoped move
//! applies one computed day offset uniformly to every member, preserving
//! relative spacing and order.

use chrono::NaiveDate;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{CalendarItem, DryIceOrder, EntityKind};

/// Scope of a move on a series member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveScope {
    /// Move only the dragged instance. It may then violate the series'
    /// fixed spacing; that is accepted.
    Single,
    /// Shift every member of the series by the same offset.
    Series,
}

impl std::fmt::Display for MoveScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveScope::Single => write!(f, "single"),
            MoveScope::Series => write!(f, "series"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid move scope: {0}")]
pub struct ParseMoveScopeError(String);

impl FromStr for MoveScope {
    type Err = ParseMoveScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "this" => Ok(MoveScope::Single),
            "series" | "all" => Ok(MoveScope::Series),
            _ => Err(ParseMoveScopeError(s.to_string())),
        }
    }
}

/// One record's date update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateChange {
    pub kind: EntityKind,
    pub id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// What a drop on a calendar cell resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveResolution {
    /// Target equals the current anchor: nothing to do, no write.
    NoOp,
    /// Plain record: a direct single-record date update.
    Single(DateChange),
    /// Series member: the caller must choose a scope before anything moves.
    NeedsScope { root_id: Uuid, change: DateChange },
}

/// Resolve a drop without mutating anything.
pub fn resolve_drop(item: &CalendarItem, target: NaiveDate) -> MoveResolution {
    if item.anchor_date() == target {
        return MoveResolution::NoOp;
    }
    let change = DateChange {
        kind: item.kind(),
        id: item.id(),
        from: item.anchor_date(),
        to: target,
    };
    match item.series_root() {
        Some(root_id) => MoveResolution::NeedsScope { root_id, change },
        None => MoveResolution::Single(change),
    }
}

/// A computed series-wide shift, ready to submit record by record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesMovePlan {
    pub root_id: Uuid,
    pub offset_days: i64,
    /// One change per member, ascending by current date.
    pub changes: Vec<DateChange>,
}

/// Plan a series-scoped move: `offset = target − dragged.scheduled_date`,
/// applied uniformly to every member.
///
/// `members` is the full series record set (root included) as returned by
/// the series fetch port. The dragged record must be among them.
pub fn plan_series_move(
    members: &[DryIceOrder],
    dragged_id: Uuid,
    target: NaiveDate,
) -> Result<SeriesMovePlan, CoreError> {
    let dragged = members
        .iter()
        .find(|order| order.id == dragged_id)
        .ok_or_else(|| CoreError::NotFound(format!("order {dragged_id} not in series")))?;

    let offset = target - dragged.scheduled_date;
    let root_id = dragged.parent_order_id.unwrap_or(dragged.id);

    let mut changes: Vec<DateChange> = members
        .iter()
        .map(|order| DateChange {
            kind: EntityKind::DryIceOrder,
            id: order.id,
            from: order.scheduled_date,
            to: order.scheduled_date + offset,
        })
        .collect();
    changes.sort_by_key(|change| change.from);

    Ok(SeriesMovePlan {
        root_id,
        offset_days: offset.num_days(),
        changes,
    })
}

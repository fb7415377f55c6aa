//! Drag-and-drop state machine, as a pure reducer.
//!
//! Browser callbacks are routed through explicit events so the resolution
//! logic is unit-testable without a DOM. Exactly one drag session is active
//! at a time; a drop outside a valid cell (Cancel) or starting a new drag
//! mid-session falls back to `Idle` without emitting a mutation.

use chrono::NaiveDate;

use crate::models::CalendarItem;
use crate::series_move::MoveScope;

/// A commit the embedding layer must execute against the mutation executor.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRequest {
    pub item: CalendarItem,
    pub target: NaiveDate,
    pub scope: MoveScope,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        item: CalendarItem,
        hover: Option<NaiveDate>,
    },
    /// Dropped on a series member; waiting for the single/series choice.
    AwaitingScope {
        item: CalendarItem,
        target: NaiveDate,
    },
    /// A commit effect has been emitted; waiting for the write to settle.
    Committing { request: MoveRequest },
}

impl DragState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DragState::Idle)
    }

    pub fn dragged_item(&self) -> Option<&CalendarItem> {
        match self {
            DragState::Idle => None,
            DragState::Dragging { item, .. } => Some(item),
            DragState::AwaitingScope { item, .. } => Some(item),
            DragState::Committing { request } => Some(&request.item),
        }
    }

    pub fn hover_date(&self) -> Option<NaiveDate> {
        match self {
            DragState::Dragging { hover, .. } => *hover,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    Begin(CalendarItem),
    Hover(NaiveDate),
    Drop(NaiveDate),
    ResolveScope(MoveScope),
    Cancel,
    /// The emitted commit finished (success or failure).
    Settled,
}

/// Side-effect intent produced by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEffect {
    Commit(MoveRequest),
}

/// Advance the drag session. Pure: no IO, no shared state.
pub fn reduce(state: DragState, event: DragEvent) -> (DragState, Option<DragEffect>) {
    match (state, event) {
        (DragState::Idle, DragEvent::Begin(item)) => (
            DragState::Dragging { item, hover: None },
            None,
        ),
        // Starting a drag while one is active discards the stale session.
        (_, DragEvent::Begin(_)) => (DragState::Idle, None),

        (DragState::Dragging { item, .. }, DragEvent::Hover(date)) => (
            DragState::Dragging {
                item,
                hover: Some(date),
            },
            None,
        ),

        (DragState::Dragging { item, .. }, DragEvent::Drop(target)) => {
            if item.anchor_date() == target {
                return (DragState::Idle, None);
            }
            if item.is_series_member() {
                (DragState::AwaitingScope { item, target }, None)
            } else {
                let request = MoveRequest {
                    item,
                    target,
                    scope: MoveScope::Single,
                };
                (
                    DragState::Committing {
                        request: request.clone(),
                    },
                    Some(DragEffect::Commit(request)),
                )
            }
        }

        (DragState::AwaitingScope { item, target }, DragEvent::ResolveScope(scope)) => {
            let request = MoveRequest {
                item,
                target,
                scope,
            };
            (
                DragState::Committing {
                    request: request.clone(),
                },
                Some(DragEffect::Commit(request)),
            )
        }

        (_, DragEvent::Cancel) => (DragState::Idle, None),
        (DragState::Committing { .. }, DragEvent::Settled) => (DragState::Idle, None),

        // Everything else leaves the session untouched.
        (state, _) => (state, None),
    }
}

//! The orchestrating layer: optimistic mutations over the aggregated model.
//!
//! Every user-initiated date change is applied to the in-memory snapshot
//! first, then written through the source ports. A failed write reverts the
//! exact fields changed and surfaces a notification; a successful one
//! triggers a fresh aggregation pass (last-fetch-wins reconciliation).
//! Series moves are submitted per record and are not transactional: a
//! mid-batch failure leaves the series partially shifted and is reported
//! as one aggregate error.

use chrono::{NaiveDate, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::aggregator::{aggregate, CalendarFilters, CalendarSnapshot};
use crate::dnd::{reduce, DragEffect, DragEvent, DragState, MoveRequest};
use crate::error::CoreError;
use crate::models::{CalendarItem, EngineConfig, EntityKind, LastAction, NewDryIceOrderData};
use crate::recurrence::expand_dry_ice_order;
use crate::series_move::{plan_series_move, DateChange, MoveScope};
use crate::sources::{DataSource, Notification, Notifier, NotifyAction};
use crate::window::{self, DateWindow, Direction, ViewType};

/// What a drop (or scope resolution) amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// The move was committed (optimistically and through the write port).
    Committed,
    /// The dropped item is a series member; call
    /// [`CalendarEngine::resolve_series_move`] next.
    AwaitingScope,
    /// Nothing happened: same-date drop, or no drag session was active.
    NoOp,
}

/// Fields saved before an optimistic apply, for rollback.
#[derive(Debug, Clone, Copy)]
enum AppliedMove {
    Point { previous: NaiveDate },
    Range {
        previous_start: NaiveDate,
        previous_end: NaiveDate,
    },
}

/// The calendar engine the presentation layer talks to.
///
/// Owns the aggregated snapshot, the drag session, and the single-slot
/// undo buffer. All mutations flow through the optimistic-then-confirm
/// path; the UI never blocks on a write.
pub struct CalendarEngine<S, N> {
    source: S,
    notifier: N,
    config: EngineConfig,
    current_date: NaiveDate,
    view: ViewType,
    filters: CalendarFilters,
    snapshot: CalendarSnapshot,
    drag: DragState,
    last_action: Option<LastAction>,
}

impl<S: DataSource, N: Notifier> CalendarEngine<S, N> {
    pub fn new(source: S, notifier: N, current_date: NaiveDate, config: EngineConfig) -> Self {
        Self {
            source,
            notifier,
            config,
            current_date,
            view: ViewType::Month,
            filters: CalendarFilters::default(),
            snapshot: CalendarSnapshot::default(),
            drag: DragState::Idle,
            last_action: None,
        }
    }

    // ── Read access ─────────────────────────────────────────────────────

    pub fn snapshot(&self) -> &CalendarSnapshot {
        &self.snapshot
    }

    pub fn items_for_day(&self, date: NaiveDate) -> Vec<&CalendarItem> {
        self.snapshot.items_for_day(date)
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn last_action(&self) -> Option<LastAction> {
        self.last_action
    }

    pub fn view(&self) -> ViewType {
        self.view
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    pub fn filters(&self) -> &CalendarFilters {
        &self.filters
    }

    /// The active view's date window; `None` for the list view.
    pub fn window(&self) -> Option<DateWindow> {
        window::window_for(self.current_date, self.view)
    }

    pub fn range_label(&self) -> String {
        window::range_label(self.current_date, self.view)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// The range the aggregator fetches for: the view window, or the whole
    /// date line for the list view (which windows nothing).
    fn working_range(&self) -> DateWindow {
        self.window().unwrap_or_else(DateWindow::unbounded)
    }

    // ── Navigation and filtering ────────────────────────────────────────

    pub async fn set_view(&mut self, view: ViewType) {
        self.view = view;
        self.refresh().await;
    }

    pub async fn go_next(&mut self) {
        self.current_date = window::step(self.current_date, self.view, Direction::Next);
        self.refresh().await;
    }

    pub async fn go_prev(&mut self) {
        self.current_date = window::step(self.current_date, self.view, Direction::Prev);
        self.refresh().await;
    }

    pub async fn go_today(&mut self) {
        self.current_date = Utc::now().date_naive();
        self.refresh().await;
    }

    pub async fn set_filters(&mut self, filters: CalendarFilters) {
        self.filters = filters;
        self.refresh().await;
    }

    /// Re-run the aggregation pass over the working range.
    ///
    /// Per-kind fetch failures are absorbed here: the remaining kinds stay
    /// on the calendar and one error notification names the failed ones.
    pub async fn refresh(&mut self) {
        self.snapshot = aggregate(&self.source, self.working_range(), &self.filters).await;
        if !self.snapshot.failures.is_empty() {
            let mut kinds: Vec<String> = self
                .snapshot
                .failures
                .keys()
                .map(|kind| kind.to_string())
                .collect();
            kinds.sort();
            self.notifier.notify(Notification::error(format!(
                "Some calendar data could not be loaded: {}",
                kinds.join(", ")
            )));
        }
    }

    // ── Creation ────────────────────────────────────────────────────────

    /// Expand and create a dry-ice order, recurring or not.
    ///
    /// Validation failures block the operation before any record exists.
    /// The batch is submitted in one shot; on success the number of created
    /// records is returned.
    pub async fn create_dry_ice_order(
        &mut self,
        data: NewDryIceOrderData,
    ) -> Result<usize, CoreError> {
        let orders = expand_dry_ice_order(&data, &self.config)?;
        if let Err(err) = self.source.create_dry_ice_orders(&orders).await {
            error!(%err, order_number = %data.order_number, "order creation failed");
            self.notifier
                .notify(Notification::error("Could not create the order"));
            return Err(err);
        }

        let count = orders.len();
        info!(count, order_number = %data.order_number, "created dry-ice order batch");
        self.notifier.notify(Notification::success(if count > 1 {
            format!("{count} dry-ice orders created")
        } else {
            "Dry-ice order created".to_string()
        }));
        self.refresh().await;
        Ok(count)
    }

    // ── Drag session ────────────────────────────────────────────────────

    /// Start dragging the item with the given id. Unknown ids are ignored.
    pub fn begin_drag(&mut self, item_id: Uuid) {
        let Some(item) = self.snapshot.find(item_id).cloned() else {
            warn!(%item_id, "drag started on unknown item");
            return;
        };
        let (state, _) = reduce(std::mem::take(&mut self.drag), DragEvent::Begin(item));
        self.drag = state;
    }

    pub fn hover(&mut self, date: NaiveDate) {
        let (state, _) = reduce(std::mem::take(&mut self.drag), DragEvent::Hover(date));
        self.drag = state;
    }

    /// Discard the drag session without emitting a mutation.
    pub fn cancel_drag(&mut self) {
        let (state, _) = reduce(std::mem::take(&mut self.drag), DragEvent::Cancel);
        self.drag = state;
    }

    /// Drop the dragged item on a calendar cell.
    pub async fn drop_on(&mut self, date: NaiveDate) -> Result<DropOutcome, CoreError> {
        let (state, effect) = reduce(std::mem::take(&mut self.drag), DragEvent::Drop(date));
        self.drag = state;
        match effect {
            Some(DragEffect::Commit(request)) => self.execute_request(request).await,
            None => {
                if matches!(self.drag, DragState::AwaitingScope { .. }) {
                    Ok(DropOutcome::AwaitingScope)
                } else {
                    Ok(DropOutcome::NoOp)
                }
            }
        }
    }

    /// Answer the single/series question raised by a drop on a series
    /// member.
    pub async fn resolve_series_move(
        &mut self,
        scope: MoveScope,
    ) -> Result<DropOutcome, CoreError> {
        let (state, effect) = reduce(
            std::mem::take(&mut self.drag),
            DragEvent::ResolveScope(scope),
        );
        self.drag = state;
        match effect {
            Some(DragEffect::Commit(request)) => self.execute_request(request).await,
            None => Ok(DropOutcome::NoOp),
        }
    }

    async fn execute_request(&mut self, request: MoveRequest) -> Result<DropOutcome, CoreError> {
        let result = match request.scope {
            MoveScope::Single => {
                let change = DateChange {
                    kind: request.item.kind(),
                    id: request.item.id(),
                    from: request.item.anchor_date(),
                    to: request.target,
                };
                self.commit_single(change).await
            }
            MoveScope::Series => self.commit_series(&request.item, request.target).await,
        };
        let (state, _) = reduce(std::mem::take(&mut self.drag), DragEvent::Settled);
        self.drag = state;
        result.map(|_| DropOutcome::Committed)
    }

    // ── Single-record moves ─────────────────────────────────────────────

    async fn commit_single(&mut self, change: DateChange) -> Result<(), CoreError> {
        // No-op guard: nothing is written and nothing changes.
        if change.from == change.to {
            return Ok(());
        }

        match change.kind {
            EntityKind::Task => self.commit_task_move(change.id, change.to, true).await,
            _ => self.commit_non_task_move(change).await,
        }
    }

    /// Optimistic task reschedule. Records the undo slot only when asked to
    /// (a user move records it, an undo does not).
    async fn commit_task_move(
        &mut self,
        task_id: Uuid,
        to: NaiveDate,
        record_action: bool,
    ) -> Result<(), CoreError> {
        let Some(applied) = self.apply_optimistic(task_id, to) else {
            return Err(CoreError::NotFound(format!("task {task_id}")));
        };
        let AppliedMove::Point { previous } = applied else {
            // Tasks are point-anchored.
            self.revert(task_id, applied);
            return Err(CoreError::InvalidInput(format!(
                "record {task_id} is not a task"
            )));
        };
        if previous == to {
            return Ok(());
        }

        match self.source.update_task_due_date(task_id, to).await {
            Ok(()) => {
                info!(%task_id, %to, "task rescheduled");
                if record_action {
                    self.last_action = Some(LastAction::TaskMove {
                        task_id,
                        previous_date: previous,
                        new_date: to,
                    });
                    self.notifier.notify(
                        Notification::success(format!("Task moved to {to}"))
                            .with_action(NotifyAction::Undo),
                    );
                } else {
                    self.notifier
                        .notify(Notification::success(format!("Task restored to {to}")));
                }
                self.refresh().await;
                Ok(())
            }
            Err(err) => {
                error!(%task_id, %err, "task reschedule failed; rolling back");
                self.revert(task_id, applied);
                self.notifier
                    .notify(Notification::error("Could not move the task"));
                Err(err)
            }
        }
    }

    async fn commit_non_task_move(&mut self, change: DateChange) -> Result<(), CoreError> {
        let Some(applied) = self.apply_optimistic(change.id, change.to) else {
            return Err(CoreError::NotFound(format!("record {}", change.id)));
        };

        let write = match (change.kind, applied) {
            (EntityKind::TimeOff, AppliedMove::Range { .. }) => {
                // The whole range shifted; read the new bounds back out of
                // the snapshot for the write.
                match self.snapshot.find(change.id) {
                    Some(CalendarItem::TimeOff(item)) => {
                        self.source
                            .update_time_off_dates(
                                change.id,
                                item.request.start_date,
                                item.request.end_date,
                            )
                            .await
                    }
                    _ => Err(CoreError::NotFound(format!("request {}", change.id))),
                }
            }
            (EntityKind::DryIceOrder, _) => {
                self.source
                    .update_dry_ice_order_date(change.id, change.to)
                    .await
            }
            (EntityKind::GasCylinderOrder, _) => {
                self.source
                    .update_gas_cylinder_delivery_date(change.id, change.to)
                    .await
            }
            (kind, _) => Err(CoreError::InvalidInput(format!(
                "unexpected move target kind {kind}"
            ))),
        };

        match write {
            Ok(()) => {
                info!(id = %change.id, kind = %change.kind, to = %change.to, "record rescheduled");
                // Any non-task mutation invalidates the undo slot.
                self.last_action = None;
                self.notifier
                    .notify(Notification::success(format!("Moved to {}", change.to)));
                self.refresh().await;
                Ok(())
            }
            Err(err) => {
                error!(id = %change.id, %err, "reschedule failed; rolling back");
                self.revert(change.id, applied);
                self.notifier
                    .notify(Notification::error("Could not move the item"));
                Err(err)
            }
        }
    }

    // ── Series moves ────────────────────────────────────────────────────

    /// Shift every member of the dragged item's series by the drop offset.
    ///
    /// Updates are submitted independently per record. Partial failure is
    /// surfaced as one aggregate notification and is not compensated; the
    /// closing refresh shows the true state either way.
    async fn commit_series(
        &mut self,
        item: &CalendarItem,
        target: NaiveDate,
    ) -> Result<(), CoreError> {
        if item.anchor_date() == target {
            return Ok(());
        }
        let Some(root_id) = item.series_root() else {
            // Scope=series on a plain record degrades to a single move.
            return self
                .commit_single(DateChange {
                    kind: item.kind(),
                    id: item.id(),
                    from: item.anchor_date(),
                    to: target,
                })
                .await;
        };

        let members = match self.source.fetch_dry_ice_series(root_id).await {
            Ok(members) => members,
            Err(err) => {
                error!(%root_id, %err, "series fetch failed; nothing moved");
                self.notifier
                    .notify(Notification::error("Could not load the series"));
                return Err(err);
            }
        };
        let plan = plan_series_move(&members, item.id(), target)?;

        // Optimistic pass over every member currently on the calendar.
        for change in &plan.changes {
            self.apply_optimistic(change.id, change.to);
        }

        let total = plan.changes.len();
        let mut failures: Vec<(Uuid, String)> = Vec::new();
        for change in &plan.changes {
            if let Err(err) = self
                .source
                .update_dry_ice_order_date(change.id, change.to)
                .await
            {
                failures.push((change.id, err.to_string()));
            }
        }

        self.last_action = None;
        if failures.is_empty() {
            info!(%root_id, members = total, offset_days = plan.offset_days, "series moved");
            self.notifier.notify(Notification::success(format!(
                "Series moved: {total} orders shifted by {} days",
                plan.offset_days
            )));
        } else {
            let applied = total - failures.len();
            let aggregate_err = CoreError::PartialSeriesMove {
                applied,
                total,
                failures,
            };
            warn!(%root_id, applied, total, "series move partially applied");
            // Absorbed: applied shifts stay, the refresh below reconciles.
            self.notifier.notify(Notification::error(format!(
                "Series move incomplete: {applied} of {total} orders moved ({aggregate_err})"
            )));
        }
        self.refresh().await;
        Ok(())
    }

    // ── Undo ────────────────────────────────────────────────────────────

    /// Undo the most recent single task move.
    ///
    /// Re-enters the optimistic path with the previous date as the target.
    /// The slot is cleared up front, so the undo itself is not re-undoable
    /// and a second consecutive call is a no-op.
    pub async fn undo_last_action(&mut self) -> Result<(), CoreError> {
        let Some(LastAction::TaskMove {
            task_id,
            previous_date,
            ..
        }) = self.last_action.take()
        else {
            return Ok(());
        };
        self.commit_task_move(task_id, previous_date, false).await
    }

    // ── Optimistic apply / rollback ─────────────────────────────────────

    /// Move the record's anchor in the in-memory model, returning what was
    /// there for rollback. Leave requests shift start and end together,
    /// preserving their length.
    fn apply_optimistic(&mut self, id: Uuid, to: NaiveDate) -> Option<AppliedMove> {
        let item = self.snapshot.find_mut(id)?;
        let applied = match item {
            CalendarItem::TimeOff(item) => {
                let previous_start = item.request.start_date;
                let previous_end = item.request.end_date;
                let delta = to - previous_start;
                item.request.start_date = to;
                item.request.end_date = previous_end + delta;
                AppliedMove::Range {
                    previous_start,
                    previous_end,
                }
            }
            CalendarItem::Task(item) => {
                let previous = item.task.due_date;
                item.task.due_date = to;
                AppliedMove::Point { previous }
            }
            CalendarItem::DryIceOrder(item) => {
                let previous = item.order.scheduled_date;
                item.order.scheduled_date = to;
                AppliedMove::Point { previous }
            }
            CalendarItem::GasCylinderOrder(item) => {
                let previous = item.order.delivery_date;
                item.order.delivery_date = to;
                AppliedMove::Point { previous }
            }
        };
        self.snapshot.sort_by_anchor();
        Some(applied)
    }

    /// Put back exactly the fields an optimistic apply changed.
    fn revert(&mut self, id: Uuid, applied: AppliedMove) {
        if let Some(item) = self.snapshot.find_mut(id) {
            match (item, applied) {
                (CalendarItem::TimeOff(item), AppliedMove::Range { previous_start, previous_end }) => {
                    item.request.start_date = previous_start;
                    item.request.end_date = previous_end;
                }
                (CalendarItem::Task(item), AppliedMove::Point { previous }) => {
                    item.task.due_date = previous;
                }
                (CalendarItem::DryIceOrder(item), AppliedMove::Point { previous }) => {
                    item.order.scheduled_date = previous;
                }
                (CalendarItem::GasCylinderOrder(item), AppliedMove::Point { previous }) => {
                    item.order.delivery_date = previous;
                }
                _ => {}
            }
        }
        self.snapshot.sort_by_anchor();
    }
}

//! Fetches and normalizes the four entity kinds into one queryable model.
//!
//! The four per-type fetches fan out concurrently and are joined without
//! cancelling each other: a failure in one kind is captured in the result's
//! failure map while the remaining kinds aggregate normally. Foreign
//! references (assignees, customers, task types) are resolved client-side
//! through lookup maps built once per pass.

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{
    CalendarItem, Customer, DryIceOrderItem, EntityKind, GasCylinderOrderItem, Profile,
    RequestStatus, TaskItem, TaskStatus, TaskType, TimeOffItem, TimeOffType,
};
use crate::sources::DataSource;
use crate::window::DateWindow;

/// Legend colors assigned to employees in first-seen order.
pub const EMPLOYEE_PALETTE: [&str; 8] = [
    "#3b82f6", "#22c55e", "#a855f7", "#f97316", "#ec4899", "#06b6d4", "#6366f1", "#14b8a6",
];

/// Per-kind visibility toggles and per-field selections applied during a
/// pass. One explicit structure instead of scattered flags so the active
/// filter state is inspectable as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarFilters {
    pub show_time_off: bool,
    pub show_tasks: bool,
    pub show_dry_ice_orders: bool,
    pub show_gas_cylinder_orders: bool,
    pub employee: Option<Uuid>,
    pub leave_type: Option<TimeOffType>,
    pub request_status: Option<RequestStatus>,
    pub task_status: Option<TaskStatus>,
    pub task_type: Option<Uuid>,
}

impl Default for CalendarFilters {
    fn default() -> Self {
        Self {
            show_time_off: true,
            show_tasks: true,
            show_dry_ice_orders: true,
            show_gas_cylinder_orders: true,
            employee: None,
            leave_type: None,
            request_status: None,
            task_status: None,
            task_type: None,
        }
    }
}

impl CalendarFilters {
    pub fn shows(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::TimeOff => self.show_time_off,
            EntityKind::Task => self.show_tasks,
            EntityKind::DryIceOrder => self.show_dry_ice_orders,
            EntityKind::GasCylinderOrder => self.show_gas_cylinder_orders,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeLegendEntry {
    pub user_id: Uuid,
    pub name: String,
    pub color: String,
}

/// The aggregated in-memory model of one pass: the normalized item list
/// plus the per-kind fetch failures of that pass.
#[derive(Debug, Default)]
pub struct CalendarSnapshot {
    /// Flat item list, ascending by anchor date.
    pub items: Vec<CalendarItem>,
    /// Kinds whose fetch failed this pass; their items are simply absent.
    pub failures: HashMap<EntityKind, CoreError>,
    pub legend: Vec<EmployeeLegendEntry>,
}

impl CalendarSnapshot {
    /// All items occupying the given calendar cell: point items by date
    /// equality, leave requests by inclusive interval containment.
    pub fn items_for_day(&self, date: NaiveDate) -> Vec<&CalendarItem> {
        self.items.iter().filter(|item| item.occupies(date)).collect()
    }

    pub fn count_for_kind(&self, kind: EntityKind) -> usize {
        self.items.iter().filter(|item| item.kind() == kind).count()
    }

    pub fn find(&self, id: Uuid) -> Option<&CalendarItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub(crate) fn find_mut(&mut self, id: Uuid) -> Option<&mut CalendarItem> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    pub(crate) fn sort_by_anchor(&mut self) {
        self.items.sort_by_key(|item| item.anchor_date());
    }
}

/// Run one aggregation pass over the working range.
///
/// Hidden kinds are not fetched at all. Lookup failures degrade to
/// unresolved display names; only the four entity fetches land in the
/// failure map.
pub async fn aggregate<S: DataSource>(
    source: &S,
    range: DateWindow,
    filters: &CalendarFilters,
) -> CalendarSnapshot {
    let (time_off, tasks, dry_ice, gas, profiles, customers, task_types) = tokio::join!(
        async {
            if filters.show_time_off {
                source.fetch_time_off(range).await
            } else {
                Ok(Vec::new())
            }
        },
        async {
            if filters.show_tasks {
                source.fetch_tasks(range).await
            } else {
                Ok(Vec::new())
            }
        },
        async {
            if filters.show_dry_ice_orders {
                source.fetch_dry_ice_orders(range).await
            } else {
                Ok(Vec::new())
            }
        },
        async {
            if filters.show_gas_cylinder_orders {
                source.fetch_gas_cylinder_orders(range).await
            } else {
                Ok(Vec::new())
            }
        },
        source.fetch_profiles(),
        source.fetch_customers(),
        source.fetch_task_types(),
    );

    let mut snapshot = CalendarSnapshot::default();

    let profile_map: HashMap<Uuid, Profile> = match profiles {
        Ok(rows) => rows.into_iter().map(|p| (p.id, p)).collect(),
        Err(error) => {
            warn!(%error, "profile lookup failed; names stay unresolved");
            HashMap::new()
        }
    };
    let customer_map: HashMap<Uuid, Customer> = match customers {
        Ok(rows) => rows.into_iter().map(|c| (c.id, c)).collect(),
        Err(error) => {
            warn!(%error, "customer lookup failed; names stay unresolved");
            HashMap::new()
        }
    };
    let type_map: HashMap<Uuid, TaskType> = match task_types {
        Ok(rows) => rows.into_iter().map(|t| (t.id, t)).collect(),
        Err(error) => {
            warn!(%error, "task type lookup failed; types stay unresolved");
            HashMap::new()
        }
    };

    match time_off {
        Ok(requests) => {
            // Legend colors are assigned over the unfiltered fetch so a
            // selection change never recolors the remaining employees.
            let mut colors: HashMap<Uuid, String> = HashMap::new();
            for request in &requests {
                let next = colors.len();
                colors.entry(request.user_id).or_insert_with(|| {
                    EMPLOYEE_PALETTE[next % EMPLOYEE_PALETTE.len()].to_string()
                });
            }
            snapshot.legend = {
                let mut seen = Vec::new();
                for request in &requests {
                    if seen.iter().any(|e: &EmployeeLegendEntry| e.user_id == request.user_id) {
                        continue;
                    }
                    let name = profile_map
                        .get(&request.user_id)
                        .map(Profile::display_name)
                        .unwrap_or_else(|| "Unknown".to_string());
                    seen.push(EmployeeLegendEntry {
                        user_id: request.user_id,
                        name,
                        color: colors[&request.user_id].clone(),
                    });
                }
                seen
            };

            for request in requests {
                if let Some(employee) = filters.employee {
                    if request.user_id != employee {
                        continue;
                    }
                }
                if let Some(leave_type) = filters.leave_type {
                    if request.leave_type != leave_type {
                        continue;
                    }
                }
                match filters.request_status {
                    Some(status) if request.status != status => continue,
                    // Rejected requests stay hidden unless explicitly selected.
                    None if request.status == RequestStatus::Rejected => continue,
                    _ => {}
                }
                let employee_name = profile_map
                    .get(&request.user_id)
                    .map(Profile::display_name)
                    .unwrap_or_else(|| "Unknown".to_string());
                let employee_color = colors
                    .get(&request.user_id)
                    .cloned()
                    .unwrap_or_else(|| EMPLOYEE_PALETTE[0].to_string());
                snapshot.items.push(CalendarItem::TimeOff(TimeOffItem {
                    request,
                    employee_name,
                    employee_color,
                }));
            }
        }
        Err(error) => {
            snapshot.failures.insert(EntityKind::TimeOff, error);
        }
    }

    match tasks {
        Ok(rows) => {
            for task in rows {
                if let Some(employee) = filters.employee {
                    if task.assigned_to != Some(employee) {
                        continue;
                    }
                }
                if let Some(status) = filters.task_status {
                    if task.status != status {
                        continue;
                    }
                }
                if let Some(type_id) = filters.task_type {
                    if task.type_id != Some(type_id) {
                        continue;
                    }
                }
                let assignee_name = task
                    .assigned_to
                    .and_then(|id| profile_map.get(&id))
                    .map(Profile::display_name);
                let task_type = task.type_id.and_then(|id| type_map.get(&id));
                snapshot.items.push(CalendarItem::Task(TaskItem {
                    assignee_name,
                    type_name: task_type.map(|t| t.name.clone()),
                    type_color: task_type.map(|t| t.color.clone()),
                    task,
                }));
            }
        }
        Err(error) => {
            snapshot.failures.insert(EntityKind::Task, error);
        }
    }

    match dry_ice {
        Ok(orders) => {
            for order in orders {
                let customer_display = order
                    .customer_id
                    .and_then(|id| customer_map.get(&id))
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| order.customer_name.clone());
                snapshot.items.push(CalendarItem::DryIceOrder(DryIceOrderItem {
                    order,
                    customer_display,
                }));
            }
        }
        Err(error) => {
            snapshot.failures.insert(EntityKind::DryIceOrder, error);
        }
    }

    match gas {
        Ok(orders) => {
            for order in orders {
                let customer_display = order
                    .customer_id
                    .and_then(|id| customer_map.get(&id))
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| order.customer_name.clone());
                snapshot
                    .items
                    .push(CalendarItem::GasCylinderOrder(GasCylinderOrderItem {
                        order,
                        customer_display,
                    }));
            }
        }
        Err(error) => {
            snapshot.failures.insert(EntityKind::GasCylinderOrder, error);
        }
    }

    snapshot.sort_by_anchor();
    debug!(
        items = snapshot.items.len(),
        failures = snapshot.failures.len(),
        "aggregation pass complete"
    );
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DryIceOrder, GasCylinderOrder, Task, TimeOffRequest};
    use crate::sources::{
        DryIceOrderSource, GasCylinderOrderSource, LookupSource, TaskSource, TimeOffSource,
    };
    use async_trait::async_trait;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[derive(Default)]
    struct FakeSource {
        time_off: Vec<TimeOffRequest>,
        tasks: Vec<Task>,
        dry_ice: Vec<DryIceOrder>,
        gas: Vec<GasCylinderOrder>,
        profiles: Vec<Profile>,
        customers: Vec<Customer>,
        task_types: Vec<TaskType>,
        failing: HashSet<EntityKind>,
    }

    impl FakeSource {
        fn fail(mut self, kind: EntityKind) -> Self {
            self.failing.insert(kind);
            self
        }

        fn check(&self, kind: EntityKind) -> Result<(), CoreError> {
            if self.failing.contains(&kind) {
                Err(CoreError::Fetch {
                    kind,
                    message: "connection reset".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl TimeOffSource for FakeSource {
        async fn fetch_time_off(
            &self,
            _range: DateWindow,
        ) -> Result<Vec<TimeOffRequest>, CoreError> {
            self.check(EntityKind::TimeOff)?;
            Ok(self.time_off.clone())
        }

        async fn update_time_off_dates(
            &self,
            _id: Uuid,
            _start_date: NaiveDate,
            _end_date: NaiveDate,
        ) -> Result<(), CoreError> {
            Ok(())
        }
    }

    #[async_trait]
    impl TaskSource for FakeSource {
        async fn fetch_tasks(&self, _range: DateWindow) -> Result<Vec<Task>, CoreError> {
            self.check(EntityKind::Task)?;
            Ok(self.tasks.clone())
        }

        async fn update_task_due_date(
            &self,
            _id: Uuid,
            _due_date: NaiveDate,
        ) -> Result<(), CoreError> {
            Ok(())
        }
    }

    #[async_trait]
    impl DryIceOrderSource for FakeSource {
        async fn fetch_dry_ice_orders(
            &self,
            _range: DateWindow,
        ) -> Result<Vec<DryIceOrder>, CoreError> {
            self.check(EntityKind::DryIceOrder)?;
            Ok(self.dry_ice.clone())
        }

        async fn fetch_dry_ice_series(
            &self,
            root_id: Uuid,
        ) -> Result<Vec<DryIceOrder>, CoreError> {
            Ok(self
                .dry_ice
                .iter()
                .filter(|o| o.id == root_id || o.parent_order_id == Some(root_id))
                .cloned()
                .collect())
        }

        async fn create_dry_ice_orders(&self, _orders: &[DryIceOrder]) -> Result<(), CoreError> {
            Ok(())
        }

        async fn update_dry_ice_order_date(
            &self,
            _id: Uuid,
            _scheduled_date: NaiveDate,
        ) -> Result<(), CoreError> {
            Ok(())
        }

        async fn delete_dry_ice_order(&self, _id: Uuid) -> Result<(), CoreError> {
            Ok(())
        }
    }

    #[async_trait]
    impl GasCylinderOrderSource for FakeSource {
        async fn fetch_gas_cylinder_orders(
            &self,
            _range: DateWindow,
        ) -> Result<Vec<GasCylinderOrder>, CoreError> {
            self.check(EntityKind::GasCylinderOrder)?;
            Ok(self.gas.clone())
        }

        async fn update_gas_cylinder_delivery_date(
            &self,
            _id: Uuid,
            _delivery_date: NaiveDate,
        ) -> Result<(), CoreError> {
            Ok(())
        }
    }

    #[async_trait]
    impl LookupSource for FakeSource {
        async fn fetch_profiles(&self) -> Result<Vec<Profile>, CoreError> {
            Ok(self.profiles.clone())
        }

        async fn fetch_customers(&self) -> Result<Vec<Customer>, CoreError> {
            Ok(self.customers.clone())
        }

        async fn fetch_task_types(&self) -> Result<Vec<TaskType>, CoreError> {
            Ok(self.task_types.clone())
        }
    }

    impl DataSource for FakeSource {}

    fn any_range() -> DateWindow {
        DateWindow::new(date(2025, 1, 1), date(2025, 12, 31))
    }

    fn profile(name: &str) -> Profile {
        Profile {
            id: Uuid::now_v7(),
            full_name: Some(name.to_string()),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    #[tokio::test]
    async fn test_one_failing_kind_leaves_other_counts_unaffected() {
        let source = FakeSource {
            tasks: vec![Task::default(), Task::default()],
            dry_ice: vec![DryIceOrder::default()],
            gas: vec![GasCylinderOrder::default()],
            ..Default::default()
        }
        .fail(EntityKind::TimeOff);

        let snapshot = aggregate(&source, any_range(), &CalendarFilters::default()).await;

        assert_eq!(snapshot.count_for_kind(EntityKind::Task), 2);
        assert_eq!(snapshot.count_for_kind(EntityKind::DryIceOrder), 1);
        assert_eq!(snapshot.count_for_kind(EntityKind::GasCylinderOrder), 1);
        assert_eq!(snapshot.count_for_kind(EntityKind::TimeOff), 0);
        assert!(snapshot.failures.contains_key(&EntityKind::TimeOff));
        assert_eq!(snapshot.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_hidden_kind_is_not_fetched() {
        // Hiding the failing kind also suppresses its failure entry.
        let source = FakeSource {
            tasks: vec![Task::default()],
            ..Default::default()
        }
        .fail(EntityKind::GasCylinderOrder);

        let filters = CalendarFilters {
            show_gas_cylinder_orders: false,
            ..Default::default()
        };
        let snapshot = aggregate(&source, any_range(), &filters).await;

        assert!(snapshot.failures.is_empty());
        assert_eq!(snapshot.count_for_kind(EntityKind::Task), 1);
    }

    #[tokio::test]
    async fn test_rejected_requests_hidden_unless_status_selected() {
        let rejected = TimeOffRequest {
            status: RequestStatus::Rejected,
            ..Default::default()
        };
        let approved = TimeOffRequest {
            status: RequestStatus::Approved,
            ..Default::default()
        };
        let source = FakeSource {
            time_off: vec![rejected.clone(), approved],
            ..Default::default()
        };

        let snapshot = aggregate(&source, any_range(), &CalendarFilters::default()).await;
        assert_eq!(snapshot.count_for_kind(EntityKind::TimeOff), 1);

        let filters = CalendarFilters {
            request_status: Some(RequestStatus::Rejected),
            ..Default::default()
        };
        let snapshot = aggregate(&source, any_range(), &filters).await;
        assert_eq!(snapshot.count_for_kind(EntityKind::TimeOff), 1);
        assert_eq!(snapshot.items[0].id(), rejected.id);
    }

    #[tokio::test]
    async fn test_lookups_resolve_names_and_colors() {
        let anna = profile("Anna");
        let task_type = TaskType {
            id: Uuid::now_v7(),
            name: "Productie".to_string(),
            color: "#06b6d4".to_string(),
        };
        let customer = Customer {
            id: Uuid::now_v7(),
            name: "Cryo BV".to_string(),
        };

        let source = FakeSource {
            time_off: vec![TimeOffRequest {
                user_id: anna.id,
                ..Default::default()
            }],
            tasks: vec![Task {
                assigned_to: Some(anna.id),
                type_id: Some(task_type.id),
                ..Default::default()
            }],
            dry_ice: vec![DryIceOrder {
                customer_id: Some(customer.id),
                customer_name: "stale name".to_string(),
                ..Default::default()
            }],
            profiles: vec![anna.clone()],
            customers: vec![customer],
            task_types: vec![task_type],
            ..Default::default()
        };

        let snapshot = aggregate(&source, any_range(), &CalendarFilters::default()).await;

        for item in &snapshot.items {
            match item {
                CalendarItem::TimeOff(t) => {
                    assert_eq!(t.employee_name, "Anna");
                    assert_eq!(t.employee_color, EMPLOYEE_PALETTE[0]);
                }
                CalendarItem::Task(t) => {
                    assert_eq!(t.assignee_name.as_deref(), Some("Anna"));
                    assert_eq!(t.type_name.as_deref(), Some("Productie"));
                    assert_eq!(t.type_color.as_deref(), Some("#06b6d4"));
                }
                CalendarItem::DryIceOrder(o) => {
                    assert_eq!(o.customer_display, "Cryo BV");
                }
                CalendarItem::GasCylinderOrder(_) => unreachable!(),
            }
        }
        assert_eq!(snapshot.legend.len(), 1);
    }

    #[tokio::test]
    async fn test_employee_filter_applies_to_requests_and_tasks() {
        let anna = profile("Anna");
        let bram = profile("Bram");
        let source = FakeSource {
            time_off: vec![
                TimeOffRequest {
                    user_id: anna.id,
                    ..Default::default()
                },
                TimeOffRequest {
                    user_id: bram.id,
                    ..Default::default()
                },
            ],
            tasks: vec![
                Task {
                    assigned_to: Some(anna.id),
                    ..Default::default()
                },
                Task {
                    assigned_to: Some(bram.id),
                    ..Default::default()
                },
                Task::default(),
            ],
            profiles: vec![anna.clone(), bram],
            ..Default::default()
        };

        let filters = CalendarFilters {
            employee: Some(anna.id),
            ..Default::default()
        };
        let snapshot = aggregate(&source, any_range(), &filters).await;

        assert_eq!(snapshot.count_for_kind(EntityKind::TimeOff), 1);
        assert_eq!(snapshot.count_for_kind(EntityKind::Task), 1);
    }

    #[tokio::test]
    async fn test_items_sorted_by_anchor_date() {
        let source = FakeSource {
            tasks: vec![
                Task {
                    due_date: date(2025, 3, 20),
                    ..Default::default()
                },
                Task {
                    due_date: date(2025, 3, 1),
                    ..Default::default()
                },
            ],
            dry_ice: vec![DryIceOrder {
                scheduled_date: date(2025, 3, 10),
                ..Default::default()
            }],
            ..Default::default()
        };

        let snapshot = aggregate(&source, any_range(), &CalendarFilters::default()).await;
        let anchors: Vec<NaiveDate> = snapshot.items.iter().map(|i| i.anchor_date()).collect();
        let mut sorted = anchors.clone();
        sorted.sort();
        assert_eq!(anchors, sorted);
    }

    #[tokio::test]
    async fn test_items_for_day_uses_anchor_containment() {
        let source = FakeSource {
            time_off: vec![TimeOffRequest {
                start_date: date(2025, 4, 1),
                end_date: date(2025, 4, 5),
                status: RequestStatus::Approved,
                ..Default::default()
            }],
            tasks: vec![Task {
                due_date: date(2025, 4, 3),
                ..Default::default()
            }],
            ..Default::default()
        };

        let snapshot = aggregate(&source, any_range(), &CalendarFilters::default()).await;

        assert_eq!(snapshot.items_for_day(date(2025, 4, 1)).len(), 1);
        assert_eq!(snapshot.items_for_day(date(2025, 4, 3)).len(), 2);
        assert_eq!(snapshot.items_for_day(date(2025, 4, 5)).len(), 1);
        assert!(snapshot.items_for_day(date(2025, 4, 6)).is_empty());
    }
}

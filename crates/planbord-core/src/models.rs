use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// The four entity kinds overlaid onto the calendar.
///
/// A closed sum: adding or removing a kind is a compile-time-checked change
/// everywhere the calendar matches on it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    TimeOff,
    Task,
    DryIceOrder,
    GasCylinderOrder,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::TimeOff,
        EntityKind::Task,
        EntityKind::DryIceOrder,
        EntityKind::GasCylinderOrder,
    ];
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::TimeOff => write!(f, "time_off"),
            EntityKind::Task => write!(f, "task"),
            EntityKind::DryIceOrder => write!(f, "dry_ice_order"),
            EntityKind::GasCylinderOrder => write!(f, "gas_cylinder_order"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid entity kind: {0}")]
pub struct ParseEntityKindError(String);

impl FromStr for EntityKind {
    type Err = ParseEntityKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "time_off" => Ok(EntityKind::TimeOff),
            "task" => Ok(EntityKind::Task),
            "dry_ice_order" => Ok(EntityKind::DryIceOrder),
            "gas_cylinder_order" => Ok(EntityKind::GasCylinderOrder),
            _ => Err(ParseEntityKindError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeOffType {
    Vacation,
    Sick,
    Personal,
    Other,
}

/// Which part of the day a leave request covers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DayPart {
    Morning,
    Afternoon,
    FullDay,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid day part: {0}")]
pub struct ParseDayPartError(String);

impl FromStr for DayPart {
    type Err = ParseDayPartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morning" => Ok(DayPart::Morning),
            "afternoon" => Ok(DayPart::Afternoon),
            "full_day" => Ok(DayPart::FullDay),
            _ => Err(ParseDayPartError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task status: {0}")]
pub struct ParseTaskStatusError(String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task priority: {0}")]
pub struct ParseTaskPriorityError(String);

impl FromStr for TaskPriority {
    type Err = ParseTaskPriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(ParseTaskPriorityError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DryIceProductType {
    Blocks,
    Pellets,
    Sticks,
}

// ============================================================================
// Source records
// ============================================================================

/// A leave request spanning an inclusive date range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeOffRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: TimeOffType,
    pub status: RequestStatus,
    pub day_part: Option<DayPart>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for TimeOffRequest {
    fn default() -> Self {
        let today = Utc::now().date_naive();
        Self {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            start_date: today,
            end_date: today,
            leave_type: TimeOffType::Vacation,
            status: RequestStatus::Pending,
            day_part: None,
            reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// A team task due on a single date, optionally with a time range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub assigned_to: Option<Uuid>,
    pub due_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub type_id: Option<Uuid>,
    /// Carried through aggregation for tasks that were created as part of a
    /// recurring batch elsewhere. Tasks are never offered the series-scope
    /// choice on drop; see `series_move`.
    pub series_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            title: String::new(),
            assigned_to: None,
            due_date: Utc::now().date_naive(),
            start_time: None,
            end_time: None,
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            type_id: None,
            series_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// A dry-ice production order scheduled for a single date.
///
/// Series linkage: the root of a recurring series has `is_recurring = true`
/// and `parent_order_id = None`; members point at the root. A bounded series
/// records its end date on the root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DryIceOrder {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub scheduled_date: NaiveDate,
    pub quantity_kg: f64,
    pub product_type: DryIceProductType,
    pub status: OrderStatus,
    pub is_recurring: bool,
    pub parent_order_id: Option<Uuid>,
    pub recurrence_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for DryIceOrder {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            order_number: String::new(),
            customer_id: None,
            customer_name: String::new(),
            scheduled_date: Utc::now().date_naive(),
            quantity_kg: 0.0,
            product_type: DryIceProductType::Blocks,
            status: OrderStatus::Pending,
            is_recurring: false,
            parent_order_id: None,
            recurrence_end_date: None,
            notes: None,
            created_by: Uuid::now_v7(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// A gas-cylinder delivery order. Not series-capable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GasCylinderOrder {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub delivery_date: NaiveDate,
    pub cylinder_count: u32,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for GasCylinderOrder {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            order_number: String::new(),
            customer_id: None,
            customer_name: String::new(),
            delivery_date: Utc::now().date_naive(),
            cylinder_count: 0,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

// ============================================================================
// Lookup records (resolved client-side into calendar items)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: String,
}

impl Profile {
    /// Display name: full name, else the local part of the email address.
    pub fn display_name(&self) -> String {
        match &self.full_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskType {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

// ============================================================================
// Calendar items
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeOffItem {
    pub request: TimeOffRequest,
    pub employee_name: String,
    pub employee_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskItem {
    pub task: Task,
    pub assignee_name: Option<String>,
    pub type_name: Option<String>,
    pub type_color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DryIceOrderItem {
    pub order: DryIceOrder,
    pub customer_display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GasCylinderOrderItem {
    pub order: GasCylinderOrder,
    pub customer_display: String,
}

/// One calendar entry: a source record plus its resolved lookups.
///
/// Tagged so the wire shape keeps a `"kind"` discriminator while Rust code
/// matches exhaustively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalendarItem {
    TimeOff(TimeOffItem),
    Task(TaskItem),
    DryIceOrder(DryIceOrderItem),
    GasCylinderOrder(GasCylinderOrderItem),
}

impl CalendarItem {
    pub fn kind(&self) -> EntityKind {
        match self {
            CalendarItem::TimeOff(_) => EntityKind::TimeOff,
            CalendarItem::Task(_) => EntityKind::Task,
            CalendarItem::DryIceOrder(_) => EntityKind::DryIceOrder,
            CalendarItem::GasCylinderOrder(_) => EntityKind::GasCylinderOrder,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            CalendarItem::TimeOff(item) => item.request.id,
            CalendarItem::Task(item) => item.task.id,
            CalendarItem::DryIceOrder(item) => item.order.id,
            CalendarItem::GasCylinderOrder(item) => item.order.id,
        }
    }

    /// The date used to test calendar-cell membership: range start for leave
    /// requests, the point date otherwise.
    pub fn anchor_date(&self) -> NaiveDate {
        match self {
            CalendarItem::TimeOff(item) => item.request.start_date,
            CalendarItem::Task(item) => item.task.due_date,
            CalendarItem::DryIceOrder(item) => item.order.scheduled_date,
            CalendarItem::GasCylinderOrder(item) => item.order.delivery_date,
        }
    }

    /// Anchor containment test: date equality for point items, inclusive
    /// interval containment for leave requests.
    pub fn occupies(&self, date: NaiveDate) -> bool {
        match self {
            CalendarItem::TimeOff(item) => {
                item.request.start_date <= date && date <= item.request.end_date
            }
            _ => self.anchor_date() == date,
        }
    }

    /// The series root id, if this item belongs to a recurring series.
    ///
    /// Only dry-ice orders carry series membership: a recurring root is its
    /// own root, a member points at its parent.
    pub fn series_root(&self) -> Option<Uuid> {
        match self {
            CalendarItem::DryIceOrder(item) => {
                if let Some(parent) = item.order.parent_order_id {
                    Some(parent)
                } else if item.order.is_recurring {
                    Some(item.order.id)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn is_series_member(&self) -> bool {
        self.series_root().is_some()
    }
}

// ============================================================================
// Data Transfer Objects
// ============================================================================

/// Fixed recurrence step: every week or every two weeks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceInterval {
    Weekly,
    Biweekly,
}

impl RecurrenceInterval {
    /// Step size in days.
    pub fn days(self) -> i64 {
        match self {
            RecurrenceInterval::Weekly => 7,
            RecurrenceInterval::Biweekly => 14,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurrence interval: {0}")]
pub struct ParseRecurrenceIntervalError(String);

impl FromStr for RecurrenceInterval {
    type Err = ParseRecurrenceIntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" | "1" => Ok(RecurrenceInterval::Weekly),
            "biweekly" | "2" => Ok(RecurrenceInterval::Biweekly),
            _ => Err(ParseRecurrenceIntervalError(s.to_string())),
        }
    }
}

/// Recurrence settings exactly as the creation form submits them.
///
/// Bounded mode (`open_ended = false`) requires `end_date`; validation
/// rejects the request before any record is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRequest {
    pub interval: RecurrenceInterval,
    pub open_ended: bool,
    pub end_date: Option<NaiveDate>,
}

/// Creation request for a dry-ice order, possibly expanding into a series.
#[derive(Debug, Clone)]
pub struct NewDryIceOrderData {
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub scheduled_date: NaiveDate,
    pub quantity_kg: f64,
    pub product_type: DryIceProductType,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub recurrence: Option<RecurrenceRequest>,
}

/// Capacity-1 undo buffer: the most recent undoable mutation.
///
/// Overwritten by the next mutation, cleared after a successful undo. Only
/// single task moves are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastAction {
    TaskMove {
        task_id: Uuid,
        previous_date: NaiveDate,
        new_date: NaiveDate,
    },
}

/// Engine-level tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Concrete horizon materialized for open-ended recurrence, in days
    /// past the anchor date.
    pub open_ended_horizon_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            open_ended_horizon_days: 365,
        }
    }
}

//! Ports onto the collaborators the overlay consumes: per-entity data
//! sources, the permission provider, and the notification surface.
//!
//! Each entity kind gets its own domain trait so the four fetches stay
//! independently callable (and independently failable); `DataSource`
//! composes them for the engine. Implementations live in the embedding
//! application, test fakes in this repo's test suites.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{
    Customer, DryIceOrder, GasCylinderOrder, Profile, Task, TaskType, TimeOffRequest,
};
use crate::window::DateWindow;

#[async_trait]
pub trait TimeOffSource: Send + Sync {
    async fn fetch_time_off(&self, range: DateWindow) -> Result<Vec<TimeOffRequest>, CoreError>;

    /// Reschedule a leave request to a new inclusive range.
    async fn update_time_off_dates(
        &self,
        id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<(), CoreError>;
}

#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn fetch_tasks(&self, range: DateWindow) -> Result<Vec<Task>, CoreError>;
    async fn update_task_due_date(&self, id: Uuid, due_date: NaiveDate) -> Result<(), CoreError>;
}

#[async_trait]
pub trait DryIceOrderSource: Send + Sync {
    async fn fetch_dry_ice_orders(&self, range: DateWindow) -> Result<Vec<DryIceOrder>, CoreError>;

    /// Every record of a series: the root itself plus all orders whose
    /// `parent_order_id` equals the root.
    async fn fetch_dry_ice_series(&self, root_id: Uuid) -> Result<Vec<DryIceOrder>, CoreError>;

    /// Create a batch in one shot. Series creation is atomic: either the
    /// whole batch lands or none of it does.
    async fn create_dry_ice_orders(&self, orders: &[DryIceOrder]) -> Result<(), CoreError>;

    async fn update_dry_ice_order_date(
        &self,
        id: Uuid,
        scheduled_date: NaiveDate,
    ) -> Result<(), CoreError>;

    /// Deletes exactly one record. Siblings of a series are never deleted
    /// implicitly; deletion scope is always explicit at the call site.
    async fn delete_dry_ice_order(&self, id: Uuid) -> Result<(), CoreError>;
}

#[async_trait]
pub trait GasCylinderOrderSource: Send + Sync {
    async fn fetch_gas_cylinder_orders(
        &self,
        range: DateWindow,
    ) -> Result<Vec<GasCylinderOrder>, CoreError>;

    async fn update_gas_cylinder_delivery_date(
        &self,
        id: Uuid,
        delivery_date: NaiveDate,
    ) -> Result<(), CoreError>;
}

/// Reference data resolved client-side into calendar items.
#[async_trait]
pub trait LookupSource: Send + Sync {
    async fn fetch_profiles(&self) -> Result<Vec<Profile>, CoreError>;
    async fn fetch_customers(&self) -> Result<Vec<Customer>, CoreError>;
    async fn fetch_task_types(&self) -> Result<Vec<TaskType>, CoreError>;
}

/// Main data-source trait composing all domain sources.
pub trait DataSource:
    TimeOffSource + TaskSource + DryIceOrderSource + GasCylinderOrderSource + LookupSource
{
}

/// Gates whether drag, creation, and deletion are offered at all. The core
/// computes moves regardless; gating is the caller's concern.
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn is_admin(&self, user_id: Uuid) -> Result<bool, CoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    Success,
    Error,
}

/// Follow-up the notification surface may offer alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyAction {
    Undo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotifyKind,
    pub message: String,
    pub action: Option<NotifyAction>,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotifyKind::Success,
            message: message.into(),
            action: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotifyKind::Error,
            message: message.into(),
            action: None,
        }
    }

    pub fn with_action(mut self, action: NotifyAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Fire-and-forget notification surface (toasts in the original UI).
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

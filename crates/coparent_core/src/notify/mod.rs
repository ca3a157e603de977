//! Notification model and delivery gateway.
//!
//! # Responsibility
//! - Build the in-app notifications raised by the change-request workflow.
//! - Define the `NotificationGateway` seam used after workflow writes.
//!
//! # Invariants
//! - Delivery is fire-and-forget from the workflow's point of view; a
//!   gateway failure never undoes a committed write.
//! - Notification text never carries the free-form request reason.

use crate::db::DbError;
use crate::model::change_request::{ChangeRequest, Decision, RequestType};
use crate::model::profile::ProfileId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

mod outbox;

pub use outbox::SqliteNotificationOutbox;

pub type NotificationId = Uuid;

/// Route opened when the recipient taps a schedule notification.
pub const SCHEDULE_ACTION_URL: &str = "/schedule";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NewMessage,
    ScheduleChange,
    ScheduleResponse,
    DocumentUpload,
    ChildUpdate,
    ExchangeReminder,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewMessage => "new_message",
            Self::ScheduleChange => "schedule_change",
            Self::ScheduleResponse => "schedule_response",
            Self::DocumentUpload => "document_upload",
            Self::ChildUpdate => "child_update",
            Self::ExchangeReminder => "exchange_reminder",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new_message" => Some(Self::NewMessage),
            "schedule_change" => Some(Self::ScheduleChange),
            "schedule_response" => Some(Self::ScheduleResponse),
            "document_upload" => Some(Self::DocumentUpload),
            "child_update" => Some(Self::ChildUpdate),
            "exchange_reminder" => Some(Self::ExchangeReminder),
            _ => None,
        }
    }
}

/// One in-app notification addressed to a single profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub recipient_profile_id: ProfileId,
    pub title: String,
    pub message: String,
    pub sender_name: Option<String>,
    pub action_url: Option<String>,
    pub related_id: Option<Uuid>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub read: bool,
}

impl Notification {
    pub fn new(
        kind: NotificationType,
        recipient_profile_id: ProfileId,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            recipient_profile_id,
            title: title.into(),
            message: message.into(),
            sender_name: None,
            action_url: None,
            related_id: None,
            created_at,
            read: false,
        }
    }

    /// Tells the recipient that `requester_name` proposed `request`.
    pub fn schedule_change(requester_name: &str, request: &ChangeRequest, now_ms: i64) -> Self {
        let mut message = format!(
            "{requester_name} requested a {} for {}",
            request_type_label(request.request_type),
            request.original_date.format("%b %-d, %Y")
        );
        if let Some(proposed) = request.proposed_date {
            message.push_str(&format!(" (proposed: {})", proposed.format("%b %-d, %Y")));
        }

        let mut notification = Self::new(
            NotificationType::ScheduleChange,
            request.recipient_id,
            "New schedule change request",
            message,
            now_ms,
        );
        notification.sender_name = Some(requester_name.to_string());
        notification.action_url = Some(SCHEDULE_ACTION_URL.to_string());
        notification.related_id = Some(request.id);
        notification
    }

    /// Tells the requester how `responder_name` answered `request`.
    pub fn schedule_response(
        responder_name: &str,
        request: &ChangeRequest,
        decision: Decision,
        now_ms: i64,
    ) -> Self {
        let verb = match decision {
            Decision::Accepted => "accepted",
            Decision::Declined => "declined",
        };
        let mut notification = Self::new(
            NotificationType::ScheduleResponse,
            request.requester_id,
            format!("Schedule change {verb}"),
            format!(
                "{responder_name} {verb} your request for {}",
                request.original_date.format("%b %-d, %Y")
            ),
            now_ms,
        );
        notification.sender_name = Some(responder_name.to_string());
        notification.action_url = Some(SCHEDULE_ACTION_URL.to_string());
        notification.related_id = Some(request.id);
        notification
    }
}

fn request_type_label(kind: RequestType) -> &'static str {
    match kind {
        RequestType::Swap => "swap",
        RequestType::Transfer => "custody transfer",
        RequestType::Modification => "schedule modification",
    }
}

#[derive(Debug)]
pub enum NotifyError {
    /// The backing store failed; retryable.
    Storage(DbError),
    /// The channel refused this notification.
    Rejected(String),
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "notification storage failed: {err}"),
            Self::Rejected(reason) => write!(f, "notification rejected: {reason}"),
        }
    }
}

impl Error for NotifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Rejected(_) => None,
        }
    }
}

impl From<rusqlite::Error> for NotifyError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(DbError::Sqlite(value))
    }
}

/// Delivery channel for notifications.
pub trait NotificationGateway {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Short channel name used in logs, e.g. `"outbox"`.
    fn channel_name(&self) -> &str;
}

/// Gateway that drops every notification. Used where no inbox is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardNotifications;

impl NotificationGateway for DiscardNotifications {
    fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "discard"
    }
}

//! Change request domain model.
//!
//! # Responsibility
//! - Define the ad hoc schedule deviation proposed by one parent to the other.
//! - Encode the `Pending -> Accepted | Declined` lifecycle.
//!
//! # Invariants
//! - A new request is always `Pending`.
//! - `Accepted` and `Declined` are terminal; nothing transitions out of them.
//! - Only `status` and `updated_at` ever change after creation.

use crate::model::profile::ProfileId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ChangeRequestId = Uuid;

/// Kind of deviation being proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    /// Trade `original_date` for `proposed_date`.
    Swap,
    /// Hand over custody for `original_date`.
    Transfer,
    /// Adjust exchange details for `original_date`.
    Modification,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Swap => "swap",
            Self::Transfer => "transfer",
            Self::Modification => "modification",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "swap" => Some(Self::Swap),
            "transfer" => Some(Self::Transfer),
            "modification" => Some(Self::Modification),
            _ => None,
        }
    }
}

/// Lifecycle state of a change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Recipient's answer to a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accepted,
    Declined,
}

impl Decision {
    /// Terminal status reached by this decision.
    pub fn status(self) -> RequestStatus {
        match self {
            Self::Accepted => RequestStatus::Accepted,
            Self::Declined => RequestStatus::Declined,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "accepted" => Some(Self::Accepted),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }
}

/// A one-shot, two-party proposal to deviate from the computed schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub id: ChangeRequestId,
    pub request_type: RequestType,
    pub original_date: NaiveDate,
    pub proposed_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub status: RequestStatus,
    pub requester_id: ProfileId,
    /// Requester's linked co-parent at creation time.
    pub recipient_id: ProfileId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Equals `created_at` until the request resolves.
    pub updated_at: i64,
}

impl ChangeRequest {
    /// Builds a new `Pending` request with a generated ID.
    ///
    /// A blank `reason` is stored as `None`.
    #[allow(clippy::too_many_arguments)]
    pub fn new_pending(
        requester_id: ProfileId,
        recipient_id: ProfileId,
        request_type: RequestType,
        original_date: NaiveDate,
        proposed_date: Option<NaiveDate>,
        reason: Option<String>,
        now_ms: i64,
    ) -> Self {
        let reason = reason
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Self {
            id: Uuid::new_v4(),
            request_type,
            original_date,
            proposed_date,
            reason,
            status: RequestStatus::Pending,
            requester_id,
            recipient_id,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Returns whether `profile_id` is one of the two parties.
    pub fn involves(&self, profile_id: ProfileId) -> bool {
        self.requester_id == profile_id || self.recipient_id == profile_id
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

//! Change request workflow.
//!
//! # Responsibility
//! - Create requests between linked co-parents and record the recipient's
//!   decision.
//! - Notify the other party after each committed write.
//!
//! # Invariants
//! - `Pending -> Accepted | Declined` only; terminal statuses never change.
//! - No row is written when the requester is not linked to the recipient.
//! - Only the recipient may respond; a refused response changes nothing.
//! - Notification failures are logged and reported, never rolled back.

use crate::model::change_request::{
    ChangeRequest, ChangeRequestId, Decision, RequestStatus, RequestType,
};
use crate::model::now_epoch_ms;
use crate::model::profile::ProfileId;
use crate::notify::{Notification, NotificationGateway};
use crate::repo::change_request_repo::{
    ChangeRequestQuery, ChangeRequestRepository, StatusTransition,
};
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::RepoError;
use chrono::NaiveDate;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fallback sender name when the responder profile no longer exists.
const UNKNOWN_PARENT_NAME: &str = "Your co-parent";

#[derive(Debug)]
pub enum WorkflowError {
    ProfileNotFound(ProfileId),
    /// Requester has no co-parent link, or it points at someone else.
    NotLinked { requester_id: ProfileId },
    RequestNotFound(ChangeRequestId),
    /// Responder is not the request's recipient.
    NotAuthorized {
        request_id: ChangeRequestId,
        profile_id: ProfileId,
    },
    /// Another response already resolved the request.
    AlreadyResolved { current_status: RequestStatus },
    Repo(RepoError),
}

impl WorkflowError {
    /// True only for transport failures where retrying the same call may
    /// succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Repo(err) if err.is_transport())
    }

    /// Short message suitable for showing to the acting parent.
    pub fn user_message(&self) -> String {
        match self {
            Self::ProfileNotFound(_) => "Your profile could not be found.".to_string(),
            Self::NotLinked { .. } => {
                "You must be connected with a co-parent to request schedule changes.".to_string()
            }
            Self::RequestNotFound(_) => "This change request no longer exists.".to_string(),
            Self::NotAuthorized { .. } => {
                "Only the receiving parent can respond to this request.".to_string()
            }
            Self::AlreadyResolved { current_status } => format!(
                "This request has already been {}.",
                current_status.as_str()
            ),
            Self::Repo(err) if err.is_transport() => {
                "Could not reach storage. Please try again.".to_string()
            }
            Self::Repo(_) => "Something went wrong with this request.".to_string(),
        }
    }
}

impl Display for WorkflowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProfileNotFound(id) => write!(f, "profile not found: {id}"),
            Self::NotLinked { requester_id } => {
                write!(f, "profile {requester_id} is not linked to the recipient")
            }
            Self::RequestNotFound(id) => write!(f, "change request not found: {id}"),
            Self::NotAuthorized {
                request_id,
                profile_id,
            } => write!(
                f,
                "profile {profile_id} is not the recipient of change request {request_id}"
            ),
            Self::AlreadyResolved { current_status } => write!(
                f,
                "change request already resolved as {}",
                current_status.as_str()
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WorkflowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for WorkflowError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "change request",
                id,
            } => Self::RequestNotFound(id),
            RepoError::NotFound {
                entity: "profile",
                id,
            } => Self::ProfileNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Input for `ChangeRequestWorkflow::create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateChangeRequest {
    pub requester_id: ProfileId,
    pub recipient_id: ProfileId,
    pub request_type: RequestType,
    pub original_date: NaiveDate,
    pub proposed_date: Option<NaiveDate>,
    pub reason: Option<String>,
}

/// Committed request plus whether the counterpart was notified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOutcome {
    pub request: ChangeRequest,
    pub notification_delivered: bool,
}

/// Change request workflow over injected repositories and gateway.
pub struct ChangeRequestWorkflow<R, P, N>
where
    R: ChangeRequestRepository,
    P: ProfileRepository,
    N: NotificationGateway,
{
    requests: R,
    profiles: P,
    notifier: N,
}

impl<R, P, N> ChangeRequestWorkflow<R, P, N>
where
    R: ChangeRequestRepository,
    P: ProfileRepository,
    N: NotificationGateway,
{
    pub fn new(requests: R, profiles: P, notifier: N) -> Self {
        Self {
            requests,
            profiles,
            notifier,
        }
    }

    /// Stores a new pending request and notifies the recipient.
    ///
    /// # Errors
    /// - `ProfileNotFound` when the requester does not exist.
    /// - `NotLinked` when `recipient_id` is not the requester's co-parent.
    pub fn create(&self, input: CreateChangeRequest) -> Result<WorkflowOutcome, WorkflowError> {
        let requester = self
            .profiles
            .get_profile(input.requester_id)?
            .ok_or(WorkflowError::ProfileNotFound(input.requester_id))?;

        if !requester.is_linked_to(input.recipient_id) {
            info!("event=change_request_create module=workflow status=error reason=not_linked");
            return Err(WorkflowError::NotLinked {
                requester_id: requester.id,
            });
        }

        let now_ms = now_epoch_ms();
        let request = ChangeRequest::new_pending(
            requester.id,
            input.recipient_id,
            input.request_type,
            input.original_date,
            input.proposed_date,
            input.reason,
            now_ms,
        );
        self.requests.insert_request(&request)?;
        info!(
            "event=change_request_create module=workflow status=ok request_id={} type={}",
            request.id,
            request.request_type.as_str()
        );

        let notification = Notification::schedule_change(&requester.display_name, &request, now_ms);
        let notification_delivered = self.deliver(&notification);
        Ok(WorkflowOutcome {
            request,
            notification_delivered,
        })
    }

    /// Records the recipient's decision and notifies the requester.
    ///
    /// # Errors
    /// - `RequestNotFound` when `request_id` does not exist.
    /// - `NotAuthorized` when `by_profile_id` is not the recipient.
    /// - `AlreadyResolved` when the request left `pending` before this call.
    pub fn respond(
        &self,
        request_id: ChangeRequestId,
        by_profile_id: ProfileId,
        decision: Decision,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let request = self
            .requests
            .get_request(request_id)?
            .ok_or(WorkflowError::RequestNotFound(request_id))?;

        if request.recipient_id != by_profile_id {
            info!(
                "event=change_request_respond module=workflow status=error reason=not_authorized request_id={request_id}"
            );
            return Err(WorkflowError::NotAuthorized {
                request_id,
                profile_id: by_profile_id,
            });
        }

        // Read before the conditional write: nothing may fail after it commits.
        let responder_name = self
            .profiles
            .get_profile(by_profile_id)?
            .map(|profile| profile.display_name)
            .unwrap_or_else(|| UNKNOWN_PARENT_NAME.to_string());

        let now_ms = now_epoch_ms();
        let updated = match self.requests.resolve_pending(request_id, decision, now_ms)? {
            StatusTransition::Applied(updated) => updated,
            StatusTransition::NotPending(current_status) => {
                info!(
                    "event=change_request_respond module=workflow status=conflict request_id={request_id} current={}",
                    current_status.as_str()
                );
                return Err(WorkflowError::AlreadyResolved { current_status });
            }
        };
        info!(
            "event=change_request_respond module=workflow status=ok request_id={request_id} decision={}",
            updated.status.as_str()
        );

        let notification =
            Notification::schedule_response(&responder_name, &updated, decision, now_ms);
        let notification_delivered = self.deliver(&notification);
        Ok(WorkflowOutcome {
            request: updated,
            notification_delivered,
        })
    }

    pub fn get(&self, request_id: ChangeRequestId) -> Result<Option<ChangeRequest>, WorkflowError> {
        Ok(self.requests.get_request(request_id)?)
    }

    /// Requests sent or received by `profile_id`, newest first.
    pub fn list_for_profile(
        &self,
        profile_id: ProfileId,
        status: Option<RequestStatus>,
    ) -> Result<Vec<ChangeRequest>, WorkflowError> {
        let query = ChangeRequestQuery {
            status,
            ..ChangeRequestQuery::for_profile(profile_id)
        };
        Ok(self.requests.list_requests(&query)?)
    }

    /// Pending requests waiting for `profile_id` to answer.
    pub fn pending_for_recipient(
        &self,
        profile_id: ProfileId,
    ) -> Result<Vec<ChangeRequest>, WorkflowError> {
        Ok(self
            .requests
            .list_requests(&ChangeRequestQuery::pending_for_recipient(profile_id))?)
    }

    fn deliver(&self, notification: &Notification) -> bool {
        match self.notifier.send(notification) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    "event=notify_send module=workflow status=error channel={} type={} error={err}",
                    self.notifier.channel_name(),
                    notification.kind.as_str()
                );
                false
            }
        }
    }
}

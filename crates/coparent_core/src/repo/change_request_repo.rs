//! Change request repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist change requests and expose the recipient/requester queries.
//! - Own the single conditional write that resolves a pending request.
//! - Publish committed changes to an attached `ChangeFeed`.
//!
//! # Invariants
//! - `resolve_pending` updates only rows whose status is still `pending`;
//!   exactly one of several concurrent responders observes `Applied`.
//! - The status write and its read-back share one transaction; a failed
//!   read-back leaves the row `pending`.
//! - Feed events are published after the write succeeded, never before.

use crate::feed::{ChangeEvent, ChangeFeed};
use crate::model::change_request::{
    ChangeRequest, ChangeRequestId, Decision, RequestStatus, RequestType,
};
use crate::model::profile::ProfileId;
use crate::repo::{ensure_table, format_date, parse_date, parse_uuid, RepoError, RepoResult};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const REQUEST_SELECT_SQL: &str = "SELECT
    id,
    request_type,
    original_date,
    proposed_date,
    reason,
    status,
    requester_id,
    recipient_id,
    created_at,
    updated_at
FROM change_requests";

/// Which side of a request the listed profile is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestRole {
    /// Sent or received.
    #[default]
    Either,
    Requester,
    Recipient,
}

/// Filter for request list use-cases. Results are newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRequestQuery {
    pub profile_id: ProfileId,
    pub role: RequestRole,
    pub status: Option<RequestStatus>,
}

impl ChangeRequestQuery {
    pub fn for_profile(profile_id: ProfileId) -> Self {
        Self {
            profile_id,
            role: RequestRole::Either,
            status: None,
        }
    }

    /// Pending requests awaiting `recipient_id`'s answer.
    pub fn pending_for_recipient(recipient_id: ProfileId) -> Self {
        Self {
            profile_id: recipient_id,
            role: RequestRole::Recipient,
            status: Some(RequestStatus::Pending),
        }
    }
}

/// Result of the conditional status write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusTransition {
    /// This call moved the request out of `pending`.
    Applied(ChangeRequest),
    /// The request had already been resolved to this status.
    NotPending(RequestStatus),
}

/// Repository interface for change requests.
pub trait ChangeRequestRepository {
    fn insert_request(&self, request: &ChangeRequest) -> RepoResult<ChangeRequestId>;
    fn get_request(&self, id: ChangeRequestId) -> RepoResult<Option<ChangeRequest>>;
    fn list_requests(&self, query: &ChangeRequestQuery) -> RepoResult<Vec<ChangeRequest>>;
    /// Moves a pending request to `decision`'s status.
    ///
    /// # Errors
    /// - `NotFound` when no row has `id`.
    fn resolve_pending(
        &self,
        id: ChangeRequestId,
        decision: Decision,
        now_ms: i64,
    ) -> RepoResult<StatusTransition>;
    /// Administrative deletion. Returns whether a row was removed.
    fn delete_request(&self, id: ChangeRequestId) -> RepoResult<bool>;
}

/// SQLite-backed change request repository.
pub struct SqliteChangeRequestRepository<'conn> {
    conn: &'conn Connection,
    feed: Option<ChangeFeed>,
}

impl<'conn> SqliteChangeRequestRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table(conn, "change_requests")?;
        Ok(Self { conn, feed: None })
    }

    /// Publishes every committed insert, update and delete to `feed`.
    pub fn with_feed(mut self, feed: ChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    fn publish(&self, event: ChangeEvent) {
        if let Some(feed) = self.feed.as_ref() {
            feed.publish(event);
        }
    }
}

impl ChangeRequestRepository for SqliteChangeRequestRepository<'_> {
    fn insert_request(&self, request: &ChangeRequest) -> RepoResult<ChangeRequestId> {
        if request.requester_id == request.recipient_id {
            return Err(RepoError::InvalidData(
                "requester and recipient must be different profiles".to_string(),
            ));
        }

        self.conn.execute(
            "INSERT INTO change_requests (
                id,
                request_type,
                original_date,
                proposed_date,
                reason,
                status,
                requester_id,
                recipient_id,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                request.id.to_string(),
                request.request_type.as_str(),
                format_date(request.original_date),
                request.proposed_date.map(format_date),
                request.reason.as_deref(),
                request.status.as_str(),
                request.requester_id.to_string(),
                request.recipient_id.to_string(),
                request.created_at,
                request.updated_at,
            ],
        )?;

        info!(
            "event=change_request_insert module=repo status=ok request_id={} type={}",
            request.id,
            request.request_type.as_str()
        );
        self.publish(ChangeEvent::Inserted(request.clone()));
        Ok(request.id)
    }

    fn get_request(&self, id: ChangeRequestId) -> RepoResult<Option<ChangeRequest>> {
        load_request(self.conn, id)
    }

    fn list_requests(&self, query: &ChangeRequestQuery) -> RepoResult<Vec<ChangeRequest>> {
        let mut sql = format!("{REQUEST_SELECT_SQL} WHERE ");
        let mut bind_values: Vec<Value> = Vec::new();
        let profile_text = query.profile_id.to_string();

        match query.role {
            RequestRole::Either => {
                sql.push_str("(requester_id = ? OR recipient_id = ?)");
                bind_values.push(Value::Text(profile_text.clone()));
                bind_values.push(Value::Text(profile_text));
            }
            RequestRole::Requester => {
                sql.push_str("requester_id = ?");
                bind_values.push(Value::Text(profile_text));
            }
            RequestRole::Recipient => {
                sql.push_str("recipient_id = ?");
                bind_values.push(Value::Text(profile_text));
            }
        }

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        sql.push_str(" ORDER BY created_at DESC, id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut requests = Vec::new();
        while let Some(row) = rows.next()? {
            requests.push(parse_request_row(row)?);
        }
        Ok(requests)
    }

    fn resolve_pending(
        &self,
        id: ChangeRequestId,
        decision: Decision,
        now_ms: i64,
    ) -> RepoResult<StatusTransition> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE change_requests
             SET status = ?2,
                 updated_at = ?3
             WHERE id = ?1
               AND status = 'pending';",
            params![id.to_string(), decision.status().as_str(), now_ms],
        )?;

        // Dropping `tx` on a failed read-back rolls the status write back.
        let current = load_request(&tx, id)?.ok_or(RepoError::NotFound {
            entity: "change request",
            id,
        })?;

        if changed == 0 {
            info!(
                "event=change_request_resolve module=repo status=skipped request_id={id} current={}",
                current.status.as_str()
            );
            return Ok(StatusTransition::NotPending(current.status));
        }

        tx.commit()?;
        info!(
            "event=change_request_resolve module=repo status=ok request_id={id} decision={}",
            current.status.as_str()
        );
        self.publish(ChangeEvent::Updated(current.clone()));
        Ok(StatusTransition::Applied(current))
    }

    fn delete_request(&self, id: ChangeRequestId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM change_requests WHERE id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Ok(false);
        }

        info!("event=change_request_delete module=repo status=ok request_id={id}");
        self.publish(ChangeEvent::Deleted(id));
        Ok(true)
    }
}

fn load_request(conn: &Connection, id: ChangeRequestId) -> RepoResult<Option<ChangeRequest>> {
    conn.query_row(
        &format!("{REQUEST_SELECT_SQL} WHERE id = ?1;"),
        [id.to_string()],
        |row| Ok(parse_request_row(row)),
    )
    .optional()?
    .transpose()
}

fn parse_request_row(row: &Row<'_>) -> RepoResult<ChangeRequest> {
    let id_text: String = row.get("id")?;
    let type_text: String = row.get("request_type")?;
    let status_text: String = row.get("status")?;
    let original_text: String = row.get("original_date")?;
    let proposed_text: Option<String> = row.get("proposed_date")?;
    let requester_text: String = row.get("requester_id")?;
    let recipient_text: String = row.get("recipient_id")?;

    Ok(ChangeRequest {
        id: parse_uuid(&id_text, "change_requests.id")?,
        request_type: RequestType::parse(&type_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid request type `{type_text}` in change_requests.request_type"
            ))
        })?,
        original_date: parse_date(&original_text, "change_requests.original_date")?,
        proposed_date: proposed_text
            .map(|value| parse_date(&value, "change_requests.proposed_date"))
            .transpose()?,
        reason: row.get("reason")?,
        status: RequestStatus::parse(&status_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid status `{status_text}` in change_requests.status"
            ))
        })?,
        requester_id: parse_uuid(&requester_text, "change_requests.requester_id")?,
        recipient_id: parse_uuid(&recipient_text, "change_requests.recipient_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

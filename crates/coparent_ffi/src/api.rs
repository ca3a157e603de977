//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose custody resolution and the change-request workflow to Dart via FRB.
//! - Flatten core errors into stable envelopes the UI can show directly.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - IDs and dates cross the boundary as strings (`uuid`, `YYYY-MM-DD`).
//! - DB-backed calls are plain (non-`sync`) FRB functions so Dart awaits
//!   them off the UI isolate.
//! - Every workflow built here publishes to one process-wide change feed;
//!   Dart drains it through `change_feed_poll`.

use chrono::NaiveDate;
use coparent_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, open_db,
    ping as ping_inner, resolve, ChangeEvent, ChangeFeed, ChangeRequest, ChangeRequestWorkflow,
    CreateChangeRequest, Decision, FeedError, FeedItem, RequestType, ScheduleConfigDocument,
    ScheduleService, SqliteChangeRequestRepository, SqliteNotificationOutbox,
    SqliteProfileRepository, SqliteScheduleRepository, Subscription, SubscriptionFilter,
    WorkflowError, WorkflowOutcome,
};
use log::{info, warn};
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};
use uuid::Uuid;

const DB_PATH_ENV: &str = "COPARENT_DB_PATH";
const DB_FILE_NAME: &str = "coparent.sqlite3";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static CHANGE_FEED: OnceLock<ChangeFeed> = OnceLock::new();
static FEED_SUBSCRIPTIONS: OnceLock<Mutex<HashMap<u64, Subscription>>> = OnceLock::new();
static NEXT_FEED_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Custodian for one day, or the reason resolution could not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodyDayResponse {
    pub ok: bool,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `"A"` or `"B"` when `ok`.
    pub custodian: Option<String>,
    pub message: String,
}

/// One cell of the calendar month view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodyDayItem {
    pub date: String,
    pub custodian: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodyMonthResponse {
    pub ok: bool,
    pub days: Vec<CustodyDayItem>,
    pub message: String,
}

/// Generic success/failure envelope for write calls without a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    pub message: String,
}

/// Change request projection for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequestItem {
    pub id: String,
    /// `swap|transfer|modification`.
    pub request_type: String,
    pub original_date: String,
    pub proposed_date: Option<String>,
    pub reason: Option<String>,
    /// `pending|accepted|declined`.
    pub status: String,
    pub requester_id: String,
    pub recipient_id: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Envelope for `change_request_create` and `change_request_respond`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequestResponse {
    pub ok: bool,
    pub request: Option<ChangeRequestItem>,
    /// False when the counterpart notification failed; the write still stands.
    pub notification_delivered: bool,
    /// Whether retrying the same call may succeed.
    pub retryable: bool,
    pub message: String,
}

impl ChangeRequestResponse {
    fn from_outcome(outcome: WorkflowOutcome, message: &str) -> Self {
        Self {
            ok: true,
            request: Some(to_item(&outcome.request)),
            notification_delivered: outcome.notification_delivered,
            retryable: false,
            message: message.to_string(),
        }
    }

    fn failure(message: impl Into<String>, retryable: bool) -> Self {
        Self {
            ok: false,
            request: None,
            notification_delivered: false,
            retryable,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequestListResponse {
    pub ok: bool,
    pub items: Vec<ChangeRequestItem>,
    pub message: String,
}

/// Handle returned by `change_feed_subscribe`; `0` when `ok` is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFeedSubscribeResponse {
    pub ok: bool,
    pub handle: u64,
    pub message: String,
}

/// One committed change delivered through the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFeedEventItem {
    /// `inserted|updated|deleted`.
    pub kind: String,
    pub request_id: String,
    /// Absent for `deleted`.
    pub request: Option<ChangeRequestItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFeedPollResponse {
    pub ok: bool,
    pub events: Vec<ChangeFeedEventItem>,
    /// Events were dropped; reload lists from storage before applying `events`.
    pub resync: bool,
    pub message: String,
}

/// Resolves the custodian of `date` under an optional config document.
///
/// Input semantics:
/// - `date`: `YYYY-MM-DD`.
/// - `config_json`: camelCase schedule document; `None` uses the
///   epoch-week fallback. Unknown pattern ids render with the default.
///
/// # FFI contract
/// - Sync call, pure computation.
#[flutter_rust_bridge::frb(sync)]
pub fn resolve_custody(date: String, config_json: Option<String>) -> CustodyDayResponse {
    let failure = |message: String| CustodyDayResponse {
        ok: false,
        date: date.clone(),
        custodian: None,
        message,
    };

    let day = match parse_date(&date) {
        Ok(day) => day,
        Err(message) => return failure(message),
    };
    let config = match config_json.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match serde_config(raw) {
            Ok(config) => Some(config),
            Err(message) => return failure(message),
        },
    };

    CustodyDayResponse {
        ok: true,
        date: day.format("%Y-%m-%d").to_string(),
        custodian: Some(resolve(day, config.as_ref()).as_str().to_string()),
        message: "ok".to_string(),
    }
}

/// Month grid for the family config visible to `profile_id`.
pub fn custody_month(profile_id: String, year: i32, month: u32) -> CustodyMonthResponse {
    let result = parse_uuid(&profile_id, "profile_id").and_then(|profile_id| {
        with_connection(|conn| {
            let repo = SqliteScheduleRepository::try_new(conn).map_err(|err| err.to_string())?;
            ScheduleService::new(repo)
                .month_for_profile(profile_id, year, month)
                .map_err(|err| err.to_string())
        })
    });

    match result {
        Ok(days) => CustodyMonthResponse {
            ok: true,
            days: days
                .into_iter()
                .map(|day| CustodyDayItem {
                    date: day.date.format("%Y-%m-%d").to_string(),
                    custodian: day.custodian.as_str().to_string(),
                })
                .collect(),
            message: "ok".to_string(),
        },
        Err(message) => CustodyMonthResponse {
            ok: false,
            days: Vec::new(),
            message,
        },
    }
}

/// Validates and stores the setup wizard's config for `owner_id`.
///
/// Strict: unknown pattern ids and invalid holiday lists are rejected.
pub fn schedule_save(owner_id: String, config_json: String) -> ActionResponse {
    let result = parse_uuid(&owner_id, "owner_id").and_then(|owner_id| {
        let document: ScheduleConfigDocument = serde_json::from_str(config_json.trim())
            .map_err(|err| format!("invalid schedule document: {err}"))?;
        let config = document.to_config().map_err(|err| err.to_string())?;
        with_connection(|conn| {
            let repo = SqliteScheduleRepository::try_new(conn).map_err(|err| err.to_string())?;
            ScheduleService::new(repo)
                .save_config(owner_id, &config)
                .map_err(|err| err.to_string())
        })
    });

    match result {
        Ok(()) => ActionResponse {
            ok: true,
            message: "schedule saved".to_string(),
        },
        Err(message) => ActionResponse { ok: false, message },
    }
}

/// Creates a pending change request to the requester's co-parent.
pub fn change_request_create(
    requester_id: String,
    recipient_id: String,
    request_type: String,
    original_date: String,
    proposed_date: Option<String>,
    reason: Option<String>,
) -> ChangeRequestResponse {
    let input = (|| -> Result<CreateChangeRequest, String> {
        Ok(CreateChangeRequest {
            requester_id: parse_uuid(&requester_id, "requester_id")?,
            recipient_id: parse_uuid(&recipient_id, "recipient_id")?,
            request_type: RequestType::parse(request_type.trim()).ok_or_else(|| {
                format!("unsupported request_type `{request_type}`; expected swap|transfer|modification")
            })?,
            original_date: parse_date(&original_date)?,
            proposed_date: proposed_date
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(parse_date)
                .transpose()?,
            reason,
        })
    })();
    let input = match input {
        Ok(input) => input,
        Err(message) => return ChangeRequestResponse::failure(message, false),
    };

    run_workflow(|workflow| workflow.create(input), "change request created")
}

/// Accepts or declines a pending request as `profile_id`.
///
/// Input semantics:
/// - `decision`: `accepted|declined`.
pub fn change_request_respond(
    request_id: String,
    profile_id: String,
    decision: String,
) -> ChangeRequestResponse {
    let parsed = parse_uuid(&request_id, "request_id").and_then(|request_id| {
        let profile_id = parse_uuid(&profile_id, "profile_id")?;
        let decision = Decision::parse(decision.trim()).ok_or_else(|| {
            format!("unsupported decision `{decision}`; expected accepted|declined")
        })?;
        Ok((request_id, profile_id, decision))
    });
    let (request_id, profile_id, decision) = match parsed {
        Ok(parsed) => parsed,
        Err(message) => return ChangeRequestResponse::failure(message, false),
    };

    run_workflow(
        |workflow| workflow.respond(request_id, profile_id, decision),
        "change request updated",
    )
}

/// Pending requests waiting for `profile_id` to answer, newest first.
pub fn change_requests_pending(profile_id: String) -> ChangeRequestListResponse {
    let result = parse_uuid(&profile_id, "profile_id").and_then(|profile_id| {
        with_connection(|conn| {
            let workflow = build_workflow(conn)?;
            workflow
                .pending_for_recipient(profile_id)
                .map_err(|err| err.user_message())
        })
    });

    match result {
        Ok(requests) => ChangeRequestListResponse {
            ok: true,
            items: requests.iter().map(to_item).collect(),
            message: "ok".to_string(),
        },
        Err(message) => ChangeRequestListResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

/// Opens a feed subscription for changes where `profile_id` is a party.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - The handle stays valid until `change_feed_unsubscribe` or a failed poll.
#[flutter_rust_bridge::frb(sync)]
pub fn change_feed_subscribe(profile_id: String) -> ChangeFeedSubscribeResponse {
    let result = parse_uuid(&profile_id, "profile_id").and_then(|profile_id| {
        let subscription = change_feed().subscribe(SubscriptionFilter::Profile(profile_id));
        let handle = NEXT_FEED_HANDLE.fetch_add(1, Ordering::Relaxed);
        feed_subscriptions()?.insert(handle, subscription);
        Ok(handle)
    });

    match result {
        Ok(handle) => {
            info!("event=ffi_feed_subscribe module=ffi status=ok handle={handle}");
            ChangeFeedSubscribeResponse {
                ok: true,
                handle,
                message: "ok".to_string(),
            }
        }
        Err(message) => ChangeFeedSubscribeResponse {
            ok: false,
            handle: 0,
            message,
        },
    }
}

/// Drains every change queued for `handle` since the previous poll.
///
/// # FFI contract
/// - Sync call, never waits for new events.
/// - On failure the handle is released and the caller must subscribe again.
#[flutter_rust_bridge::frb(sync)]
pub fn change_feed_poll(handle: u64) -> ChangeFeedPollResponse {
    let failure = |message: String| ChangeFeedPollResponse {
        ok: false,
        events: Vec::new(),
        resync: false,
        message,
    };

    let mut subscriptions = match feed_subscriptions() {
        Ok(subscriptions) => subscriptions,
        Err(message) => return failure(message),
    };
    let Some(subscription) = subscriptions.get_mut(&handle) else {
        return failure(format!("unknown change feed handle {handle}"));
    };

    match drain_subscription(subscription) {
        Ok((events, resync)) => ChangeFeedPollResponse {
            ok: true,
            events,
            resync,
            message: "ok".to_string(),
        },
        Err(err) => {
            subscriptions.remove(&handle);
            warn!("event=ffi_feed_poll module=ffi status=error handle={handle} error={err}");
            failure(err.to_string())
        }
    }
}

/// Releases `handle`. Unknown handles are reported, not treated as errors.
#[flutter_rust_bridge::frb(sync)]
pub fn change_feed_unsubscribe(handle: u64) -> ActionResponse {
    match feed_subscriptions() {
        Ok(mut subscriptions) => match subscriptions.remove(&handle) {
            Some(subscription) => {
                subscription.unsubscribe();
                ActionResponse {
                    ok: true,
                    message: "unsubscribed".to_string(),
                }
            }
            None => ActionResponse {
                ok: true,
                message: format!("change feed handle {handle} was not active"),
            },
        },
        Err(message) => ActionResponse { ok: false, message },
    }
}

type Workflow<'conn> = ChangeRequestWorkflow<
    SqliteChangeRequestRepository<'conn>,
    SqliteProfileRepository<'conn>,
    SqliteNotificationOutbox<'conn>,
>;

fn build_workflow(conn: &Connection) -> Result<Workflow<'_>, String> {
    let requests = SqliteChangeRequestRepository::try_new(conn)
        .map_err(|err| err.to_string())?
        .with_feed(change_feed().clone());
    let profiles = SqliteProfileRepository::try_new(conn).map_err(|err| err.to_string())?;
    Ok(ChangeRequestWorkflow::new(
        requests,
        profiles,
        SqliteNotificationOutbox::new(conn),
    ))
}

fn run_workflow(
    f: impl FnOnce(&Workflow<'_>) -> Result<WorkflowOutcome, WorkflowError>,
    success_message: &str,
) -> ChangeRequestResponse {
    let db_path = resolve_db_path();
    let conn = match open_db(&db_path) {
        Ok(conn) => conn,
        Err(err) => {
            warn!("event=ffi_db_open module=ffi status=error call=workflow");
            return ChangeRequestResponse::failure(format!("DB open failed: {err}"), true);
        }
    };
    let workflow = match build_workflow(&conn) {
        Ok(workflow) => workflow,
        Err(message) => return ChangeRequestResponse::failure(message, false),
    };

    match f(&workflow) {
        Ok(outcome) => ChangeRequestResponse::from_outcome(outcome, success_message),
        Err(err) => ChangeRequestResponse::failure(err.user_message(), err.is_retryable()),
    }
}

fn change_feed() -> &'static ChangeFeed {
    CHANGE_FEED.get_or_init(ChangeFeed::default)
}

fn feed_subscriptions() -> Result<MutexGuard<'static, HashMap<u64, Subscription>>, String> {
    FEED_SUBSCRIPTIONS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .map_err(|_| "change feed registry is unavailable".to_string())
}

fn with_connection<T>(f: impl FnOnce(&Connection) -> Result<T, String>) -> Result<T, String> {
    let db_path = resolve_db_path();
    let conn = open_db(&db_path).map_err(|err| {
        warn!("event=ffi_db_open module=ffi status=error call=query");
        format!("DB open failed: {err}")
    })?;
    f(&conn)
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn serde_config(raw: &str) -> Result<coparent_core::ScheduleConfig, String> {
    let document: ScheduleConfigDocument =
        serde_json::from_str(raw).map_err(|err| format!("invalid schedule document: {err}"))?;
    document.to_config_for_render().map_err(|err| err.to_string())
}

fn parse_uuid(value: &str, field: &str) -> Result<Uuid, String> {
    Uuid::parse_str(value.trim()).map_err(|_| format!("invalid {field}: `{value}`"))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date `{value}`; expected YYYY-MM-DD"))
}

fn to_item(request: &ChangeRequest) -> ChangeRequestItem {
    ChangeRequestItem {
        id: request.id.to_string(),
        request_type: request.request_type.as_str().to_string(),
        original_date: request.original_date.format("%Y-%m-%d").to_string(),
        proposed_date: request
            .proposed_date
            .map(|date| date.format("%Y-%m-%d").to_string()),
        reason: request.reason.clone(),
        status: request.status.as_str().to_string(),
        requester_id: request.requester_id.to_string(),
        recipient_id: request.recipient_id.to_string(),
        created_at: request.created_at,
        updated_at: request.updated_at,
    }
}

fn drain_subscription(
    subscription: &mut Subscription,
) -> Result<(Vec<ChangeFeedEventItem>, bool), FeedError> {
    let mut events = Vec::new();
    let mut resync = false;
    while let Some(item) = subscription.try_next()? {
        match item {
            FeedItem::Event(event) => events.push(to_feed_item(&event)),
            FeedItem::Resync { .. } => {
                resync = true;
                events.clear();
            }
        }
    }
    Ok((events, resync))
}

fn to_feed_item(event: &ChangeEvent) -> ChangeFeedEventItem {
    let (kind, request) = match event {
        ChangeEvent::Inserted(request) => ("inserted", Some(to_item(request))),
        ChangeEvent::Updated(request) => ("updated", Some(to_item(request))),
        ChangeEvent::Deleted(_) => ("deleted", None),
    };
    ChangeFeedEventItem {
        kind: kind.to_string(),
        request_id: event.request_id().to_string(),
        request,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        change_feed_poll, change_feed_subscribe, change_feed_unsubscribe, change_request_create,
        change_request_respond, change_requests_pending, core_version, custody_month,
        init_logging, ping, resolve_custody, resolve_db_path, schedule_save,
    };
    use coparent_core::{open_db, Profile, ProfileRepository, SqliteProfileRepository};

    fn linked_pair() -> (String, String) {
        let conn = open_db(resolve_db_path()).expect("open db");
        let repo = SqliteProfileRepository::try_new(&conn).expect("profile repo");
        let first = Profile::new("Jordan");
        let second = Profile::new("Casey");
        repo.create_profile(&first).expect("create first");
        repo.create_profile(&second).expect("create second");
        repo.link_co_parents(first.id, second.id).expect("link");
        (first.id.to_string(), second.id.to_string())
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn resolve_custody_uses_document_or_epoch_fallback() {
        let config = r#"{
            "pattern": "alternating-weeks",
            "startDate": "2024-01-01",
            "startingParent": "A"
        }"#;
        let day = resolve_custody("2024-01-08".to_string(), Some(config.to_string()));
        assert!(day.ok, "{}", day.message);
        assert_eq!(day.custodian.as_deref(), Some("B"));

        let fallback = resolve_custody("2024-01-01".to_string(), None);
        assert_eq!(fallback.custodian.as_deref(), Some("B"));

        let invalid = resolve_custody("01/08/2024".to_string(), None);
        assert!(!invalid.ok);
    }

    #[test]
    fn unknown_pattern_renders_with_default() {
        let config = r#"{"pattern":"4-3","startDate":"2024-01-01","startingParent":"A"}"#;
        let day = resolve_custody("2024-01-01".to_string(), Some(config.to_string()));
        assert!(day.ok, "{}", day.message);
        assert_eq!(day.custodian.as_deref(), Some("A"));
    }

    #[test]
    fn saved_schedule_drives_month_view_for_both_parents() {
        let (first, second) = linked_pair();
        let saved = schedule_save(
            first.clone(),
            r#"{"pattern":"2-2-3","startDate":"2024-01-01","startingParent":"B"}"#.to_string(),
        );
        assert!(saved.ok, "{}", saved.message);

        let month = custody_month(second, 2024, 1);
        assert!(month.ok, "{}", month.message);
        assert_eq!(month.days.len(), 31);
        assert_eq!(month.days[0].custodian, "B");
        assert_eq!(month.days[2].custodian, "A");
    }

    #[test]
    fn schedule_save_rejects_unknown_pattern() {
        let (owner, _) = linked_pair();
        let saved = schedule_save(
            owner,
            r#"{"pattern":"4-3","startDate":"2024-01-01","startingParent":"A"}"#.to_string(),
        );
        assert!(!saved.ok);
    }

    #[test]
    fn change_request_round_trip_through_envelopes() {
        let (requester, recipient) = linked_pair();
        let created = change_request_create(
            requester.clone(),
            recipient.clone(),
            "swap".to_string(),
            "2024-03-09".to_string(),
            Some("2024-03-16".to_string()),
            Some("recital".to_string()),
        );
        assert!(created.ok, "{}", created.message);
        assert!(created.notification_delivered);
        let request = created.request.expect("created request");
        assert_eq!(request.status, "pending");

        let pending = change_requests_pending(recipient.clone());
        assert!(pending.items.iter().any(|item| item.id == request.id));

        let denied = change_request_respond(
            request.id.clone(),
            requester,
            "accepted".to_string(),
        );
        assert!(!denied.ok);
        assert!(!denied.retryable);

        let accepted = change_request_respond(
            request.id.clone(),
            recipient.clone(),
            "accepted".to_string(),
        );
        assert!(accepted.ok, "{}", accepted.message);
        assert_eq!(
            accepted.request.map(|item| item.status).as_deref(),
            Some("accepted")
        );

        let again = change_request_respond(request.id, recipient, "declined".to_string());
        assert!(!again.ok);
        assert!(again.message.contains("accepted"));
    }

    #[test]
    fn create_without_link_reports_connect_message() {
        let conn = open_db(resolve_db_path()).expect("open db");
        let repo = SqliteProfileRepository::try_new(&conn).expect("profile repo");
        let alone = Profile::new("Riley");
        let stranger = Profile::new("Morgan");
        repo.create_profile(&alone).expect("create");
        repo.create_profile(&stranger).expect("create");

        let response = change_request_create(
            alone.id.to_string(),
            stranger.id.to_string(),
            "transfer".to_string(),
            "2024-05-01".to_string(),
            None,
            None,
        );
        assert!(!response.ok);
        assert!(response.message.contains("connected with a co-parent"));
    }

    #[test]
    fn stale_custom_cells_on_catalog_pattern_still_render() {
        let config = r#"{
            "pattern": "2-2-3",
            "customPattern": [0, 1],
            "startDate": "2024-01-01",
            "startingParent": "A"
        }"#;
        let day = resolve_custody("2024-01-03".to_string(), Some(config.to_string()));
        assert!(day.ok, "{}", day.message);
        assert_eq!(day.custodian.as_deref(), Some("B"));
    }

    #[test]
    fn change_feed_delivers_workflow_writes_to_subscribers() {
        let (requester, recipient) = linked_pair();
        let subscribed = change_feed_subscribe(recipient.clone());
        assert!(subscribed.ok, "{}", subscribed.message);
        let handle = subscribed.handle;

        let idle = change_feed_poll(handle);
        assert!(idle.ok);
        assert!(idle.events.is_empty());

        let created = change_request_create(
            requester,
            recipient.clone(),
            "swap".to_string(),
            "2024-04-06".to_string(),
            Some("2024-04-13".to_string()),
            None,
        );
        let request = created.request.expect("created request");
        let accepted = change_request_respond(
            request.id.clone(),
            recipient,
            "accepted".to_string(),
        );
        assert!(accepted.ok, "{}", accepted.message);

        let polled = change_feed_poll(handle);
        assert!(polled.ok, "{}", polled.message);
        assert!(!polled.resync);
        let kinds: Vec<_> = polled
            .events
            .iter()
            .map(|event| (event.kind.as_str(), event.request_id.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![("inserted", request.id.as_str()), ("updated", request.id.as_str())]
        );
        assert_eq!(
            polled.events[1]
                .request
                .as_ref()
                .map(|item| item.status.as_str()),
            Some("accepted")
        );

        assert!(change_feed_unsubscribe(handle).ok);
        assert!(!change_feed_poll(handle).ok);
        assert!(!change_feed_subscribe("not-a-uuid".to_string()).ok);
    }
}

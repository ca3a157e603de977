//! Core domain logic for the co-parenting custody schedule.
//! This crate is the single source of truth for custody resolution and the
//! change-request lifecycle.

pub mod db;
pub mod feed;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod schedule;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use feed::{
    ChangeEvent, ChangeFeed, FeedError, FeedItem, ReconnectPolicy, Subscription,
    SubscriptionFilter,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::change_request::{
    ChangeRequest, ChangeRequestId, Decision, RequestStatus, RequestType,
};
pub use model::custody::Label;
pub use model::profile::{Profile, ProfileId};
pub use model::schedule::{
    HolidayRule, HolidayRuleKind, PatternKey, ScheduleConfig, ScheduleConfigDocument,
    ScheduleValidationError,
};
pub use notify::{
    Notification, NotificationGateway, NotificationType, NotifyError, SqliteNotificationOutbox,
};
pub use repo::change_request_repo::{
    ChangeRequestQuery, ChangeRequestRepository, SqliteChangeRequestRepository, StatusTransition,
};
pub use repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
pub use repo::schedule_repo::{ScheduleRepository, SqliteScheduleRepository};
pub use repo::{RepoError, RepoResult};
pub use schedule::calendar::{custody_totals, month_grid, CalendarError, CustodyTotals, DayAssignment};
pub use schedule::holiday::{
    describe_holiday_override, holiday_overrides, HolidayCustody, HolidayOccurrence,
    HolidayOverride,
};
pub use schedule::resolver::resolve;
pub use service::change_request_service::{
    ChangeRequestWorkflow, CreateChangeRequest, WorkflowError, WorkflowOutcome,
};
pub use service::schedule_service::{ScheduleService, ScheduleServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

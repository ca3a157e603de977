//! Schedule config repository.
//!
//! # Responsibility
//! - Store one config per owning parent with wholesale replacement.
//! - Resolve the family config visible to either linked parent.
//!
//! # Invariants
//! - `save_config` validates before writing and overwrites every column.
//! - Custom pattern cells are stored as a JSON array of `0|1`; holiday rules
//!   as a JSON array of `{name, rule, enabled}`.
//! - An unknown stored pattern id loads as the catalog default.

use crate::model::custody::Label;
use crate::model::profile::ProfileId;
use crate::model::schedule::{HolidayRule, PatternKey, ScheduleConfig, DEFAULT_PATTERN};
use crate::repo::{ensure_table, format_date, parse_date, RepoError, RepoResult};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};

const CONFIG_SELECT_SQL: &str = "SELECT
    owner_id,
    pattern,
    custom_pattern,
    start_date,
    starting_parent,
    exchange_time,
    exchange_location,
    alternate_location,
    holidays,
    updated_at
FROM schedule_configs";

/// Repository interface for schedule configs.
pub trait ScheduleRepository {
    /// Validates and replaces the owner's config. `now_ms` becomes `updated_at`.
    fn save_config(&self, owner_id: ProfileId, config: &ScheduleConfig, now_ms: i64)
        -> RepoResult<()>;
    /// Returns the config saved by `owner_id` itself.
    fn get_config(&self, owner_id: ProfileId) -> RepoResult<Option<ScheduleConfig>>;
    /// Returns the config visible to `profile_id`: its own or its linked
    /// co-parent's, most recently updated first.
    fn load_for_profile(&self, profile_id: ProfileId) -> RepoResult<Option<ScheduleConfig>>;
}

/// SQLite-backed schedule config repository.
pub struct SqliteScheduleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteScheduleRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table(conn, "schedule_configs")?;
        Ok(Self { conn })
    }
}

impl ScheduleRepository for SqliteScheduleRepository<'_> {
    fn save_config(
        &self,
        owner_id: ProfileId,
        config: &ScheduleConfig,
        now_ms: i64,
    ) -> RepoResult<()> {
        config.validate()?;

        let custom_pattern = config
            .custom_pattern
            .as_ref()
            .map(|sequence| encode_json(&sequence.iter().map(|l| l.to_cell()).collect::<Vec<_>>()))
            .transpose()?;
        let holidays = encode_json(&config.holidays)?;

        self.conn.execute(
            "INSERT INTO schedule_configs (
                owner_id,
                pattern,
                custom_pattern,
                start_date,
                starting_parent,
                exchange_time,
                exchange_location,
                alternate_location,
                holidays,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            ON CONFLICT (owner_id) DO UPDATE SET
                pattern = excluded.pattern,
                custom_pattern = excluded.custom_pattern,
                start_date = excluded.start_date,
                starting_parent = excluded.starting_parent,
                exchange_time = excluded.exchange_time,
                exchange_location = excluded.exchange_location,
                alternate_location = excluded.alternate_location,
                holidays = excluded.holidays,
                updated_at = excluded.updated_at;",
            params![
                owner_id.to_string(),
                config.pattern.as_str(),
                custom_pattern,
                format_date(config.start_date),
                config.starting_parent.as_str(),
                config.exchange_time.as_str(),
                config.exchange_location.as_str(),
                config.alternate_location.as_str(),
                holidays,
                now_ms,
            ],
        )?;

        info!(
            "event=schedule_save module=repo status=ok pattern={} holidays={}",
            config.pattern.as_str(),
            config.holidays.len()
        );
        Ok(())
    }

    fn get_config(&self, owner_id: ProfileId) -> RepoResult<Option<ScheduleConfig>> {
        self.conn
            .query_row(
                &format!("{CONFIG_SELECT_SQL} WHERE owner_id = ?1;"),
                [owner_id.to_string()],
                |row| Ok(parse_config_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn load_for_profile(&self, profile_id: ProfileId) -> RepoResult<Option<ScheduleConfig>> {
        self.conn
            .query_row(
                &format!(
                    "{CONFIG_SELECT_SQL}
                     WHERE owner_id = ?1
                        OR owner_id = (SELECT co_parent_id FROM profiles WHERE id = ?1)
                     ORDER BY updated_at DESC, (owner_id = ?1) DESC
                     LIMIT 1;"
                ),
                [profile_id.to_string()],
                |row| Ok(parse_config_row(row)),
            )
            .optional()?
            .transpose()
    }
}

fn parse_config_row(row: &Row<'_>) -> RepoResult<ScheduleConfig> {
    let pattern_text: String = row.get("pattern")?;
    let pattern = PatternKey::parse(&pattern_text).unwrap_or_else(|| {
        warn!(
            "event=schedule_pattern_fallback module=repo reason=unknown_pattern pattern={pattern_text}"
        );
        DEFAULT_PATTERN
    });

    let custom_pattern = match row.get::<_, Option<String>>("custom_pattern")? {
        Some(text) if pattern.is_custom() => Some(decode_cells(&text)?),
        _ => None,
    };

    let start_text: String = row.get("start_date")?;
    let parent_text: String = row.get("starting_parent")?;
    let starting_parent = Label::parse(&parent_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid starting parent `{parent_text}` in schedule_configs.starting_parent"
        ))
    })?;

    let holidays_text: String = row.get("holidays")?;
    let holidays: Vec<HolidayRule> = serde_json::from_str(&holidays_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid holidays in schedule_configs.holidays: {err}"))
    })?;

    Ok(ScheduleConfig {
        pattern,
        custom_pattern,
        start_date: parse_date(&start_text, "schedule_configs.start_date")?,
        starting_parent,
        exchange_time: row.get("exchange_time")?,
        exchange_location: row.get("exchange_location")?,
        alternate_location: row.get("alternate_location")?,
        holidays,
    })
}

fn decode_cells(text: &str) -> RepoResult<Vec<Label>> {
    let cells: Vec<u8> = serde_json::from_str(text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid custom pattern in schedule_configs.custom_pattern: {err}"
        ))
    })?;
    cells
        .into_iter()
        .map(|cell| {
            Label::from_cell(cell).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid custom pattern cell `{cell}` in schedule_configs.custom_pattern"
                ))
            })
        })
        .collect()
}

fn encode_json<T: serde::Serialize + ?Sized>(value: &T) -> RepoResult<String> {
    serde_json::to_string(value)
        .map_err(|err| RepoError::InvalidData(format!("failed to encode column: {err}")))
}

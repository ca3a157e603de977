//! Profile repository and co-parent linking.
//!
//! # Invariants
//! - Links are symmetric: `a.co_parent_id == b` iff `b.co_parent_id == a`.
//! - Linking a profile that is already linked elsewhere is a conflict.

use crate::model::profile::{Profile, ProfileId};
use crate::repo::{ensure_table, parse_uuid, RepoError, RepoResult};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PROFILE_SELECT_SQL: &str = "SELECT id, display_name, co_parent_id FROM profiles";

/// Repository interface for parent profiles.
pub trait ProfileRepository {
    fn create_profile(&self, profile: &Profile) -> RepoResult<ProfileId>;
    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>>;
    /// Links two profiles as co-parents in one transaction.
    fn link_co_parents(&self, first: ProfileId, second: ProfileId) -> RepoResult<()>;
    /// Clears the link on both sides. No-op for unlinked profiles.
    fn unlink_co_parent(&self, id: ProfileId) -> RepoResult<()>;
}

/// SQLite-backed profile repository.
pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table(conn, "profiles")?;
        Ok(Self { conn })
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn create_profile(&self, profile: &Profile) -> RepoResult<ProfileId> {
        if profile.display_name.trim().is_empty() {
            return Err(RepoError::InvalidData(
                "profile display name must not be blank".to_string(),
            ));
        }

        self.conn.execute(
            "INSERT INTO profiles (id, display_name, co_parent_id) VALUES (?1, ?2, ?3);",
            params![
                profile.id.to_string(),
                profile.display_name.trim(),
                profile.co_parent_id.map(|id| id.to_string()),
            ],
        )?;
        Ok(profile.id)
    }

    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>> {
        self.conn
            .query_row(
                &format!("{PROFILE_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_profile_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn link_co_parents(&self, first: ProfileId, second: ProfileId) -> RepoResult<()> {
        if first == second {
            return Err(RepoError::Conflict(
                "a profile cannot be its own co-parent".to_string(),
            ));
        }

        let tx = self.conn.unchecked_transaction()?;
        for (id, other) in [(first, second), (second, first)] {
            let profile = load_required(&tx, id)?;
            if let Some(existing) = profile.co_parent_id {
                if existing != other {
                    return Err(RepoError::Conflict(format!(
                        "profile {id} is already linked to another co-parent"
                    )));
                }
            }
        }

        for (id, other) in [(first, second), (second, first)] {
            tx.execute(
                "UPDATE profiles
                 SET co_parent_id = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![id.to_string(), other.to_string()],
            )?;
        }
        tx.commit()?;

        info!("event=profile_link module=repo status=ok");
        Ok(())
    }

    fn unlink_co_parent(&self, id: ProfileId) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        load_required(&tx, id)?;
        tx.execute(
            "UPDATE profiles
             SET co_parent_id = NULL,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1 OR co_parent_id = ?1;",
            [id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }
}

fn load_required(conn: &Connection, id: ProfileId) -> RepoResult<Profile> {
    conn.query_row(
        &format!("{PROFILE_SELECT_SQL} WHERE id = ?1;"),
        [id.to_string()],
        |row| Ok(parse_profile_row(row)),
    )
    .optional()?
    .transpose()?
    .ok_or(RepoError::NotFound {
        entity: "profile",
        id,
    })
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<Profile> {
    let id_text: String = row.get("id")?;
    let co_parent_text: Option<String> = row.get("co_parent_id")?;
    Ok(Profile {
        id: parse_uuid(&id_text, "profiles.id")?,
        display_name: row.get("display_name")?,
        co_parent_id: co_parent_text
            .map(|value| parse_uuid(&value, "profiles.co_parent_id"))
            .transpose()?,
    })
}

//! In-app notification inbox stored in SQLite.

use super::{Notification, NotificationGateway, NotificationId, NotificationType, NotifyError};
use crate::model::profile::ProfileId;
use log::info;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// Gateway that writes each notification into the `notifications` table.
pub struct SqliteNotificationOutbox<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationOutbox<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Lists a profile's inbox, newest first.
    pub fn list_for_recipient(
        &self,
        recipient_id: ProfileId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotifyError> {
        let sql = if unread_only {
            "SELECT id, type, recipient_id, title, message, sender_name, action_url,
                    related_id, is_read, created_at
             FROM notifications
             WHERE recipient_id = ?1 AND is_read = 0
             ORDER BY created_at DESC, id ASC;"
        } else {
            "SELECT id, type, recipient_id, title, message, sender_name, action_url,
                    related_id, is_read, created_at
             FROM notifications
             WHERE recipient_id = ?1
             ORDER BY created_at DESC, id ASC;"
        };

        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([recipient_id.to_string()])?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(parse_notification_row(row)?);
        }
        Ok(notifications)
    }

    /// Marks one notification as read. Returns whether it existed.
    pub fn mark_read(&self, id: NotificationId) -> Result<bool, NotifyError> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1;",
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }
}

impl NotificationGateway for SqliteNotificationOutbox<'_> {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.conn.execute(
            "INSERT INTO notifications (
                id,
                type,
                recipient_id,
                title,
                message,
                sender_name,
                action_url,
                related_id,
                is_read,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                notification.id.to_string(),
                notification.kind.as_str(),
                notification.recipient_profile_id.to_string(),
                notification.title.as_str(),
                notification.message.as_str(),
                notification.sender_name.as_deref(),
                notification.action_url.as_deref(),
                notification.related_id.map(|id| id.to_string()),
                i64::from(notification.read),
                notification.created_at,
            ],
        )?;

        info!(
            "event=notify_send module=notify status=ok channel=outbox type={}",
            notification.kind.as_str()
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "outbox"
    }
}

fn parse_notification_row(row: &Row<'_>) -> Result<Notification, NotifyError> {
    let kind_text: String = row.get("type")?;
    let id_text: String = row.get("id")?;
    let recipient_text: String = row.get("recipient_id")?;
    let related_text: Option<String> = row.get("related_id")?;
    let is_read: i64 = row.get("is_read")?;

    Ok(Notification {
        id: parse_id(&id_text, "notifications.id")?,
        kind: NotificationType::parse(&kind_text).ok_or_else(|| {
            NotifyError::Rejected(format!("invalid type `{kind_text}` in notifications.type"))
        })?,
        recipient_profile_id: parse_id(&recipient_text, "notifications.recipient_id")?,
        title: row.get("title")?,
        message: row.get("message")?,
        sender_name: row.get("sender_name")?,
        action_url: row.get("action_url")?,
        related_id: related_text
            .map(|value| parse_id(&value, "notifications.related_id"))
            .transpose()?,
        created_at: row.get("created_at")?,
        read: is_read != 0,
    })
}

fn parse_id(value: &str, column: &'static str) -> Result<Uuid, NotifyError> {
    Uuid::parse_str(value)
        .map_err(|_| NotifyError::Rejected(format!("invalid uuid `{value}` in {column}")))
}

//! Notification sink - appends messages to a user's inbox.
//!
//! Workflows write notifications inside their own transaction so a message
//! is only delivered for a transition that actually committed.

use crate::{
    core::directory,
    entities::{Notification, notification},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Appends an unread notification for `user_id`.
pub async fn notify<C>(db: &C, user_id: i64, title: &str, message: &str) -> Result<notification::Model>
where
    C: ConnectionTrait,
{
    notification::ActiveModel {
        user_id: Set(user_id),
        title: Set(title.to_string()),
        message: Set(message.to_string()),
        created_at: Set(chrono::Utc::now()),
        read: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Lists a user's notifications, newest first.
pub async fn get_notifications(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Vec<notification::Model>> {
    let user = directory::find_user_by_email(db, email)
        .await?
        .ok_or_else(|| Error::not_found("User", email))?;

    Notification::find()
        .filter(notification::Column::UserId.eq(user.id))
        .order_by_desc(notification::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks every unread notification of a user as read, returning how many changed.
pub async fn mark_all_read(db: &DatabaseConnection, email: &str) -> Result<u64> {
    let user = directory::find_user_by_email(db, email)
        .await?
        .ok_or_else(|| Error::not_found("User", email))?;

    let result = Notification::update_many()
        .set(notification::ActiveModel {
            read: Set(true),
            ..Default::default()
        })
        .filter(notification::Column::UserId.eq(user.id))
        .filter(notification::Column::Read.eq(false))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

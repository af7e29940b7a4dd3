//! Audit trail - append-only records of workflow transitions for the admin view.

use crate::{
    entities::{ActionType, AuditLog, audit_log},
    errors::Result,
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};

/// The admin view never reads more than this many records.
pub const RECENT_LOG_LIMIT: u64 = 500;

pub async fn record<C>(
    db: &C,
    user_email: &str,
    action_type: ActionType,
    details: impl Into<String>,
) -> Result<audit_log::Model>
where
    C: ConnectionTrait,
{
    audit_log::ActiveModel {
        user_email: Set(user_email.to_string()),
        action_type: Set(action_type),
        details: Set(details.into()),
        timestamp: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Returns the most recent audit records, newest first, capped at [`RECENT_LOG_LIMIT`].
pub async fn recent_logs(db: &DatabaseConnection) -> Result<Vec<audit_log::Model>> {
    AuditLog::find()
        .order_by_desc(audit_log::Column::Id)
        .limit(RECENT_LOG_LIMIT)
        .all(db)
        .await
        .map_err(Into::into)
}

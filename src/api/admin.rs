//! `GET /admin/logs` - the most recent audit records.

use crate::{api::AppState, core::audit, entities::AuditLogModel, errors::Result};
use axum::{Json, Router, extract::State, routing::get};

pub fn router() -> Router<AppState> {
    Router::new().route("/admin/logs", get(recent_logs))
}

async fn recent_logs(State(state): State<AppState>) -> Result<Json<Vec<AuditLogModel>>> {
    audit::recent_logs(&state.db).await.map(Json)
}

//! Profile and notification routes.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/users` | `register` |
//! | `GET` | `/users/{email}` | `get_user` |
//! | `GET` | `/notifications/{email}` | `list_notifications` |
//! | `POST` | `/notifications/{email}/read` | `mark_read` |

use crate::{
    api::{
        AppState,
        extract::{JsonBody, PathParams, extract_json, extract_path},
    },
    core::{
        directory::{self, NewUser},
        notification,
    },
    entities::{notification as notification_entity, user},
    errors::Result,
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/{email}", get(get_user))
        .route("/notifications/{email}", get(list_notifications))
        .route("/notifications/{email}/read", post(mark_read))
}

async fn register(
    State(state): State<AppState>,
    body: JsonBody<NewUser>,
) -> Result<(StatusCode, Json<user::Model>)> {
    let new_user = extract_json(body)?;
    let user = directory::register_user(&state.db, new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<AppState>,
    path: PathParams<String>,
) -> Result<Json<user::Model>> {
    let email = extract_path(path)?;
    directory::get_user(&state.db, &email).await.map(Json)
}

async fn list_notifications(
    State(state): State<AppState>,
    path: PathParams<String>,
) -> Result<Json<Vec<notification_entity::Model>>> {
    let email = extract_path(path)?;
    notification::get_notifications(&state.db, &email)
        .await
        .map(Json)
}

async fn mark_read(
    State(state): State<AppState>,
    path: PathParams<String>,
) -> Result<Json<Value>> {
    let email = extract_path(path)?;
    let updated = notification::mark_all_read(&state.db, &email).await?;
    Ok(Json(json!({
        "msg": "Notifications marked as read",
        "updated": updated,
    })))
}

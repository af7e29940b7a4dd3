//! Farmer routes.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/farmer/accept-bid/{email}` | `accept_bid` |
//! | `POST` | `/farmer/reject-bid/{email}` | `reject_bid` |
//! | `GET` | `/farmer/orders/{email}` | `list_orders` |
//! | `POST` | `/farmer/crops/{email}` | `add_crop` |
//! | `GET` | `/farmer/crops/{email}` | `list_crops` |
//! | `PUT` | `/farmer/crops/{email}/{crop_id}/availability` | `set_availability` |

use crate::{
    api::{
        AppState,
        extract::{JsonBody, PathParams, extract_json, extract_path},
    },
    core::{
        bid::{self, FarmerOrderView},
        directory::{self, NewCrop},
    },
    entities::crop,
    errors::Result,
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Body of accept/reject requests
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidResponseRequest {
    pub order_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub status: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/farmer/accept-bid/{email}", post(accept_bid))
        .route("/farmer/reject-bid/{email}", post(reject_bid))
        .route("/farmer/orders/{email}", get(list_orders))
        .route("/farmer/crops/{email}", post(add_crop).get(list_crops))
        .route(
            "/farmer/crops/{email}/{crop_id}/availability",
            put(set_availability),
        )
}

async fn accept_bid(
    State(state): State<AppState>,
    path: PathParams<String>,
    body: JsonBody<BidResponseRequest>,
) -> Result<Json<Value>> {
    let email = extract_path(path)?;
    let req = extract_json(body)?;
    let order = bid::accept_bid(&state.db, &email, req.order_id).await?;
    Ok(Json(json!({
        "msg": "Bid accepted successfully",
        "receiptNumber": order.receipt_number,
    })))
}

async fn reject_bid(
    State(state): State<AppState>,
    path: PathParams<String>,
    body: JsonBody<BidResponseRequest>,
) -> Result<Json<Value>> {
    let email = extract_path(path)?;
    let req = extract_json(body)?;
    let order = bid::reject_bid(&state.db, &email, req.order_id).await?;
    Ok(Json(json!({
        "msg": "Bid rejected successfully",
        "order": order,
    })))
}

async fn list_orders(
    State(state): State<AppState>,
    path: PathParams<String>,
) -> Result<Json<Vec<FarmerOrderView>>> {
    let email = extract_path(path)?;
    bid::get_farmer_orders(&state.db, &email).await.map(Json)
}

async fn add_crop(
    State(state): State<AppState>,
    path: PathParams<String>,
    body: JsonBody<NewCrop>,
) -> Result<(StatusCode, Json<crop::Model>)> {
    let email = extract_path(path)?;
    let new_crop = extract_json(body)?;
    let crop = directory::add_crop(&state.db, &email, new_crop).await?;
    Ok((StatusCode::CREATED, Json(crop)))
}

async fn list_crops(
    State(state): State<AppState>,
    path: PathParams<String>,
) -> Result<Json<Vec<crop::Model>>> {
    let email = extract_path(path)?;
    directory::get_farmer_crops(&state.db, &email).await.map(Json)
}

async fn set_availability(
    State(state): State<AppState>,
    path: PathParams<(String, i64)>,
    body: JsonBody<AvailabilityRequest>,
) -> Result<Json<crop::Model>> {
    let (email, crop_id) = extract_path(path)?;
    let req = extract_json(body)?;
    directory::set_crop_availability(&state.db, &email, crop_id, &req.status)
        .await
        .map(Json)
}

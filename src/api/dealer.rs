//! Dealer routes.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/dealer/assign-vehicle` | `assign_vehicle` |
//! | `POST` | `/dealer/place-bid` | `place_bid` |
//! | `GET` | `/dealer/orders/{email}` | `list_orders` |
//! | `POST` | `/dealer/vehicles/{email}` | `add_vehicle` |
//! | `GET` | `/dealer/vehicles/{email}` | `list_vehicles` |
//! | `GET` | `/dealer/inventory/{email}` | `list_inventory` |

use crate::{
    api::{
        AppState,
        extract::{JsonBody, PathParams, extract_json, extract_path},
    },
    core::{
        bid::{self, VehicleAssignment},
        directory::{self, NewVehicle},
        inventory::{self, InventoryLineView},
    },
    entities::{order, vehicle},
    errors::Result,
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidRequest {
    pub order_id: i64,
    pub bid_price: f64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dealer/assign-vehicle", post(assign_vehicle))
        .route("/dealer/place-bid", post(place_bid))
        .route("/dealer/orders/{email}", get(list_orders))
        .route(
            "/dealer/vehicles/{email}",
            post(add_vehicle).get(list_vehicles),
        )
        .route("/dealer/inventory/{email}", get(list_inventory))
}

async fn assign_vehicle(
    State(state): State<AppState>,
    body: JsonBody<VehicleAssignment>,
) -> Result<(StatusCode, Json<Value>)> {
    let assignment = extract_json(body)?;
    let order = bid::assign_vehicle(&state.db, assignment).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "msg": "Vehicle assigned successfully",
            "orderId": order.id,
        })),
    ))
}

async fn place_bid(
    State(state): State<AppState>,
    body: JsonBody<PlaceBidRequest>,
) -> Result<Json<Value>> {
    let req = extract_json(body)?;
    let order = bid::place_bid(&state.db, req.order_id, req.bid_price).await?;
    Ok(Json(json!({
        "msg": "Bid placed successfully",
        "order": order,
    })))
}

async fn list_orders(
    State(state): State<AppState>,
    path: PathParams<String>,
) -> Result<Json<Vec<order::Model>>> {
    let email = extract_path(path)?;
    bid::get_dealer_orders(&state.db, &email).await.map(Json)
}

async fn add_vehicle(
    State(state): State<AppState>,
    path: PathParams<String>,
    body: JsonBody<NewVehicle>,
) -> Result<(StatusCode, Json<vehicle::Model>)> {
    let email = extract_path(path)?;
    let new_vehicle = extract_json(body)?;
    let vehicle = directory::add_vehicle(&state.db, &email, new_vehicle).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

async fn list_vehicles(
    State(state): State<AppState>,
    path: PathParams<String>,
) -> Result<Json<Vec<vehicle::Model>>> {
    let email = extract_path(path)?;
    directory::get_dealer_vehicles(&state.db, &email).await.map(Json)
}

async fn list_inventory(
    State(state): State<AppState>,
    path: PathParams<String>,
) -> Result<Json<Vec<InventoryLineView>>> {
    let email = extract_path(path)?;
    inventory::get_dealer_inventory(&state.db, &email).await.map(Json)
}

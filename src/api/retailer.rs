//! Retailer routes.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/retailer/place-order` | `place_order` |
//! | `GET` | `/retailer/orders/{email}` | `list_orders` |
//! | `PUT` | `/retailer/orders/{order_id}` | `update_order` |
//! | `POST` | `/retailer/orders/{order_id}/complete-payment` | `complete_payment` |
//! | `POST` | `/retailer/submit-review` | `submit_review` |
//! | `GET` | `/retailer/dealer-inventory` | `dealer_inventory` |
//!
//! The routes under `/retailer/orders/` share one path segment, which is a
//! retailer email for listing and an order id everywhere else.

use crate::{
    api::{
        AppState,
        extract::{JsonBody, PathParams, extract_json, extract_path},
    },
    core::{
        inventory::{self, MarketplaceListing},
        retail::{self, CartItem, OrderRevision, RetailerOrderView, ReviewSubmission},
    },
    errors::{Error, Result},
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
pub struct PlaceOrderRequest {
    pub retailer_email: String,
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/retailer/place-order", post(place_order))
        .route("/retailer/orders/{key}", get(list_orders).put(update_order))
        .route(
            "/retailer/orders/{key}/complete-payment",
            post(complete_payment),
        )
        .route("/retailer/submit-review", post(submit_review))
        .route("/retailer/dealer-inventory", get(dealer_inventory))
}

fn parse_order_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| Error::validation(format!("Invalid order id: {raw}")))
}

async fn place_order(
    State(state): State<AppState>,
    body: JsonBody<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let req = extract_json(body)?;
    let orders = retail::place_order(&state.db, &req.retailer_email, req.cart_items).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "msg": "Orders placed successfully",
            "orders": orders,
        })),
    ))
}

async fn list_orders(
    State(state): State<AppState>,
    path: PathParams<String>,
) -> Result<Json<Vec<RetailerOrderView>>> {
    let email = extract_path(path)?;
    retail::get_retailer_orders(&state.db, &email).await.map(Json)
}

async fn update_order(
    State(state): State<AppState>,
    path: PathParams<String>,
    body: JsonBody<OrderRevision>,
) -> Result<Json<Value>> {
    let key = extract_path(path)?;
    let revision = extract_json(body)?;
    let order = retail::update_order(&state.db, parse_order_id(&key)?, revision).await?;
    Ok(Json(json!({
        "msg": "Order updated successfully",
        "order": order,
    })))
}

async fn complete_payment(
    State(state): State<AppState>,
    path: PathParams<i64>,
    body: JsonBody<OrderRevision>,
) -> Result<Json<Value>> {
    let order_id = extract_path(path)?;
    let revision = extract_json(body)?;
    let order = retail::complete_payment(&state.db, order_id, revision).await?;
    Ok(Json(json!({
        "msg": "Payment completed successfully",
        "order": order,
    })))
}

async fn submit_review(
    State(state): State<AppState>,
    body: JsonBody<ReviewSubmission>,
) -> Result<Json<Value>> {
    let submission = extract_json(body)?;
    let reviewed = retail::submit_review(&state.db, submission).await?;
    Ok(Json(json!({
        "msg": "Review submitted successfully",
        "reviewedProducts": reviewed,
    })))
}

async fn dealer_inventory(State(state): State<AppState>) -> Result<Json<Vec<MarketplaceListing>>> {
    inventory::get_dealer_inventories(&state.db).await.map(Json)
}

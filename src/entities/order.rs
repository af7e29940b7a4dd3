//! Order entity - One farmer/dealer transaction and its bid sub-state.
//!
//! Counterparties are referenced by email and the crop by id without foreign
//! keys: an order outlives edits and deletions of the records it points at.
//! `receipt_number` is present exactly when `bid_status` is `Accepted`.

use super::enums::{BidStatus, OrderStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub farmer_email: String,
    pub dealer_email: String,
    /// Crop id within the farmer's crops
    pub product_id: i64,
    /// Dealer-facing vehicle identifier within the dealer's vehicles
    pub vehicle_id: String,
    pub quantity: f64,
    /// Farmer's asking price at the time the vehicle was assigned
    pub target_price: f64,
    pub bid_price: Option<f64>,
    pub total_amount: Option<f64>,
    pub assigned_date: DateTimeUtc,
    pub tentative_date: Option<Date>,
    pub status: OrderStatus,
    pub bid_status: BidStatus,
    pub bid_response_date: Option<DateTimeUtc>,
    #[sea_orm(unique)]
    pub receipt_number: Option<String>,
    pub receipt_generated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

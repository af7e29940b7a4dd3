//! Inventory item entity - One line of stock held by a dealer.
//!
//! Lines are created when a farmer accepts a dealer's bid and depleted (and
//! finally removed) by retailer payments. Product and farmer details are
//! snapshots taken at acceptance time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Inventory item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_items")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning dealer
    pub dealer_id: i64,
    /// Crop the stock was bought from
    pub product_id: i64,
    pub product_name: String,
    pub product_type: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_value: f64,
    pub farmer_name: String,
    pub farmer_email: String,
    pub image_url: Option<String>,
    /// Receipt of the accepted bid that produced this line
    pub receipt_number: Option<String>,
    pub added_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::DealerId",
        to = "super::user::Column::Id"
    )]
    Dealer,
    #[sea_orm(has_many = "super::inventory_review::Entity")]
    Reviews,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dealer.def()
    }
}

impl Related<super::inventory_review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Crop entity - A lot of produce a farmer offers to dealers.
//!
//! `harvest_quantity` is decremented in place when a bid on the lot is
//! accepted; nothing else in the workflow changes it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Crop database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "crops")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning farmer
    pub farmer_id: i64,
    /// Broad product class (e.g. "Vegetable", "Grain")
    pub product_type: String,
    /// Concrete variety, used as the product name downstream
    pub variety_species: String,
    pub harvest_quantity: f64,
    /// Unit the quantity is measured in (e.g. "kg", "quintal")
    pub unit_of_sale: String,
    /// Farmer's asking price per unit
    pub target_price: f64,
    pub availability_status: String,
    pub image_url: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FarmerId",
        to = "super::user::Column::Id"
    )]
    Farmer,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Farmer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

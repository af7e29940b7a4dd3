//! Retailer order product entity - One purchased line of a retailer order.
//!
//! `product_id` names a dealer inventory line but carries no foreign key,
//! since depleted inventory lines are deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "retailer_order_products")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: f64,
    pub unit_price: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::retailer_order::Entity",
        from = "Column::OrderId",
        to = "super::retailer_order::Column::Id",
        on_delete = "Cascade"
    )]
    Order,
}

impl Related<super::retailer_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

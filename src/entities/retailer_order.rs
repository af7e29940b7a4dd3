//! Retailer order entity - One dealer/retailer transaction with payment sub-state.
//!
//! Dealer details are a snapshot taken when the order is placed. Product
//! lines live in [`super::retailer_order_product`].

use super::enums::{PaymentStatus, RetailOrderStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Retailer order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "retailer_orders")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub retailer_email: String,
    pub dealer_email: String,
    pub dealer_business_name: Option<String>,
    pub dealer_warehouse_address: Option<String>,
    /// Sum of quantity x unit price over the product lines
    pub total_amount: f64,
    pub shipping_address: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub order_status: RetailOrderStatus,
    pub review_submitted: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::retailer_order_product::Entity")]
    Products,
}

impl Related<super::retailer_order_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Vehicle entity - A dealer's transport unit that can be reserved against a crop lot.

use super::enums::VehicleStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicles")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning dealer
    pub dealer_id: i64,
    /// Dealer-facing identifier such as a registration plate, unique per dealer
    pub vehicle_id: String,
    pub vehicle_type: String,
    pub temperature_capacity: Option<String>,
    pub current_status: VehicleStatus,
    /// Farmer email the vehicle is currently reserved for
    pub assigned_to: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::DealerId",
        to = "super::user::Column::Id"
    )]
    Dealer,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dealer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

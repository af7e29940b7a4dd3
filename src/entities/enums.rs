//! Enumerated column types shared by the entities.
//!
//! Each enum is stored as its display string so rows read naturally in the
//! database and match the values the web client already understands.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Marketplace role of a user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "farmer")]
    Farmer,
    #[sea_orm(string_value = "dealer")]
    Dealer,
    #[sea_orm(string_value = "retailer")]
    Retailer,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Farmer => "farmer",
            Self::Dealer => "dealer",
            Self::Retailer => "retailer",
            Self::Admin => "admin",
        }
    }
}

/// Lifecycle position of a farmer/dealer order
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum OrderStatus {
    #[sea_orm(string_value = "Vehicle Assigned")]
    #[serde(rename = "Vehicle Assigned")]
    VehicleAssigned,
    #[sea_orm(string_value = "Bid Placed")]
    #[serde(rename = "Bid Placed")]
    BidPlaced,
    #[sea_orm(string_value = "Bid Accepted")]
    #[serde(rename = "Bid Accepted")]
    BidAccepted,
    #[sea_orm(string_value = "Bid Rejected")]
    #[serde(rename = "Bid Rejected")]
    BidRejected,
}

/// Farmer's answer to a dealer bid
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum BidStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Accepted")]
    Accepted,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "UPPERCASE")]
pub enum VehicleStatus {
    #[sea_orm(string_value = "AVAILABLE")]
    Available,
    #[sea_orm(string_value = "ASSIGNED")]
    Assigned,
}

/// Payment sub-state of a retailer order
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Failed")]
    Failed,
}

/// Fulfilment state of a retailer order
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum RetailOrderStatus {
    #[sea_orm(string_value = "Placed")]
    Placed,
    #[sea_orm(string_value = "Processing")]
    Processing,
    #[sea_orm(string_value = "Shipped")]
    Shipped,
    #[sea_orm(string_value = "Delivered")]
    Delivered,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

/// Kind of event recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    #[sea_orm(string_value = "USER_REGISTERED")]
    UserRegistered,
    #[sea_orm(string_value = "VEHICLE_ASSIGNED")]
    VehicleAssigned,
    #[sea_orm(string_value = "BID_PLACED")]
    BidPlaced,
    #[sea_orm(string_value = "BID_ACCEPTED")]
    BidAccepted,
    #[sea_orm(string_value = "BID_REJECTED")]
    BidRejected,
    #[sea_orm(string_value = "ORDER_PLACED")]
    OrderPlaced,
    #[sea_orm(string_value = "ORDER_UPDATED")]
    OrderUpdated,
    #[sea_orm(string_value = "PAYMENT_COMPLETED")]
    PaymentCompleted,
    #[sea_orm(string_value = "REVIEW_SUBMITTED")]
    ReviewSubmitted,
}

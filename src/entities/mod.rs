//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod audit_log;
pub mod crop;
pub mod enums;
pub mod inventory_item;
pub mod inventory_review;
pub mod notification;
pub mod order;
pub mod retailer_order;
pub mod retailer_order_product;
pub mod user;
pub mod vehicle;

// Re-export specific types to avoid conflicts
pub use audit_log::{Entity as AuditLog, Model as AuditLogModel};
pub use crop::{Column as CropColumn, Entity as Crop, Model as CropModel};
pub use enums::{
    ActionType, BidStatus, OrderStatus, PaymentStatus, RetailOrderStatus, Role, VehicleStatus,
};
pub use inventory_item::{
    Column as InventoryItemColumn, Entity as InventoryItem, Model as InventoryItemModel,
};
pub use inventory_review::{Entity as InventoryReview, Model as InventoryReviewModel};
pub use notification::{Entity as Notification, Model as NotificationModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use retailer_order::{
    Column as RetailerOrderColumn, Entity as RetailerOrder, Model as RetailerOrderModel,
};
pub use retailer_order_product::{
    Entity as RetailerOrderProduct, Model as RetailerOrderProductModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use vehicle::{Column as VehicleColumn, Entity as Vehicle, Model as VehicleModel};

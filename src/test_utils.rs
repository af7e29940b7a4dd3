//! Shared test utilities for AgroChain.
//!
//! This module provides common helper functions for setting up test databases
//! and creating marketplace records with sensible defaults.

use crate::{
    core::{
        bid::VehicleAssignment,
        directory::{self, NewCrop, NewUser, NewVehicle},
        retail::{self, CartItem, RetailerOrderView},
    },
    entities::{Role, crop, inventory_item, user, vehicle},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::path::PathBuf;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a registration for `role` with sensible defaults.
///
/// # Defaults
/// * `name`: "Test Farmer", "Test Dealer", ...
/// * `phone`: "9999999999"
/// * dealers get a business name and warehouse address
/// * retailers get a shipping address
pub fn new_user(role: Role, email: &str) -> NewUser {
    let (name, business_name, warehouse_address, address) = match role {
        Role::Farmer => ("Test Farmer", None, None, None),
        Role::Dealer => (
            "Test Dealer",
            Some("Test Traders".to_string()),
            Some("12 Market Yard".to_string()),
            None,
        ),
        Role::Retailer => ("Test Retailer", None, None, Some("7 High Street".to_string())),
        Role::Admin => ("Test Admin", None, None, None),
    };
    NewUser {
        role,
        name: name.to_string(),
        email: email.to_string(),
        phone: Some("9999999999".to_string()),
        business_name,
        warehouse_address,
        address,
    }
}

/// Registers a profile built by [`new_user`].
pub async fn create_test_user(db: &DatabaseConnection, role: Role, email: &str) -> Result<user::Model> {
    directory::register_user(db, new_user(role, email)).await
}

/// Builds a crop lot priced at 45.0 per kg.
pub fn test_crop(variety: &str, harvest_quantity: f64) -> NewCrop {
    NewCrop {
        product_type: "Vegetable".to_string(),
        variety_species: variety.to_string(),
        harvest_quantity,
        unit_of_sale: "kg".to_string(),
        target_price: 45.0,
        image_url: None,
    }
}

/// Builds a refrigerated truck registration.
pub fn test_vehicle(vehicle_id: &str) -> NewVehicle {
    NewVehicle {
        vehicle_id: vehicle_id.to_string(),
        vehicle_type: "Truck".to_string(),
        temperature_capacity: Some("4C".to_string()),
    }
}

pub async fn create_test_vehicle(
    db: &DatabaseConnection,
    dealer: &user::Model,
    vehicle_id: &str,
) -> Result<vehicle::Model> {
    directory::add_vehicle(db, &dealer.email, test_vehicle(vehicle_id)).await
}

/// Inserts an inventory line for `dealer` directly, bypassing bid acceptance.
///
/// # Defaults
/// * `product_type`: "Grain"
/// * `farmer_name` / `farmer_email`: a placeholder supplier
/// * `product_id`: 0 (no crop behind it)
pub async fn create_test_inventory(
    db: &DatabaseConnection,
    dealer: &user::Model,
    product_name: &str,
    quantity: f64,
    unit_price: f64,
) -> Result<inventory_item::Model> {
    inventory_item::ActiveModel {
        dealer_id: Set(dealer.id),
        product_id: Set(0),
        product_name: Set(product_name.to_string()),
        product_type: Set("Grain".to_string()),
        quantity: Set(quantity),
        unit_price: Set(unit_price),
        total_value: Set(quantity * unit_price),
        farmer_name: Set("Supplier Farmer".to_string()),
        farmer_email: Set("supplier@example.com".to_string()),
        image_url: Set(None),
        receipt_number: Set(None),
        added_date: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// A farmer with one 100 kg crop lot and a dealer with one free vehicle.
pub struct Marketplace {
    pub db: DatabaseConnection,
    pub farmer: user::Model,
    pub dealer: user::Model,
    pub crop: crop::Model,
    pub vehicle: vehicle::Model,
}

impl Marketplace {
    /// Assignment of the marketplace vehicle against the crop lot.
    pub fn assignment(&self, quantity: f64) -> VehicleAssignment {
        VehicleAssignment {
            dealer_email: self.dealer.email.clone(),
            product_id: self.crop.id,
            farmer_email: self.farmer.email.clone(),
            vehicle_id: self.vehicle.vehicle_id.clone(),
            quantity,
            tentative_date: None,
        }
    }
}

/// Sets up the bid workflow fixture.
pub async fn setup_marketplace() -> Result<Marketplace> {
    seed_marketplace(setup_test_db().await?).await
}

/// Creates a file-backed `SQLite` database under the system temp directory.
///
/// Unlike `sqlite::memory:`, every pooled connection sees the same data, so
/// tasks can hold separate connections at once. Returns the file path for
/// cleanup.
pub async fn setup_file_test_db(name: &str) -> Result<(DatabaseConnection, PathBuf)> {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let path = std::env::temp_dir().join(format!("agrochain-{name}-{nanos}.sqlite"));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let db = crate::config::database::create_connection(&url).await?;
    crate::config::database::create_tables(&db).await?;
    Ok((db, path))
}

/// Seeds the bid workflow fixture into `db`.
pub async fn seed_marketplace(db: DatabaseConnection) -> Result<Marketplace> {
    let farmer = create_test_user(&db, Role::Farmer, "farmer@example.com").await?;
    let dealer = create_test_user(&db, Role::Dealer, "dealer@example.com").await?;
    let crop = directory::add_crop(&db, &farmer.email, test_crop("Roma Tomato", 100.0)).await?;
    let vehicle = create_test_vehicle(&db, &dealer, "TRK-01").await?;
    Ok(Marketplace {
        db,
        farmer,
        dealer,
        crop,
        vehicle,
    })
}

/// A dealer holding 50 units of rice at 40.0 and a retailer ready to buy.
pub struct Commerce {
    pub db: DatabaseConnection,
    pub dealer: user::Model,
    pub retailer: user::Model,
    pub item: inventory_item::Model,
}

impl Commerce {
    /// Places an order for `quantity` of the fixture's inventory line.
    pub async fn place_single_order(&self, quantity: f64) -> Result<RetailerOrderView> {
        let cart = vec![CartItem {
            dealer_email: self.dealer.email.clone(),
            product_id: self.item.id,
            product_name: self.item.product_name.clone(),
            quantity,
            unit_price: self.item.unit_price,
        }];
        let mut orders = retail::place_order(&self.db, &self.retailer.email, cart).await?;
        orders
            .pop()
            .ok_or_else(|| crate::errors::Error::invalid_state("No order was created"))
    }
}

/// Sets up the retail workflow fixture.
pub async fn setup_commerce() -> Result<Commerce> {
    let db = setup_test_db().await?;
    let dealer = create_test_user(&db, Role::Dealer, "dealer@example.com").await?;
    let retailer = create_test_user(&db, Role::Retailer, "retailer@example.com").await?;
    let item = create_test_inventory(&db, &dealer, "Sona Masoori Rice", 50.0, 40.0).await?;
    Ok(Commerce {
        db,
        dealer,
        retailer,
        item,
    })
}

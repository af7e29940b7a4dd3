//! User directory - profiles plus the crops and vehicles they own.
//!
//! Workflows address users by email. Lookups that expect a particular role
//! treat a profile with a different role as missing.

use crate::{
    config::settings::SeedUser,
    core::{audit, is_positive_amount},
    entities::{ActionType, Crop, Role, User, Vehicle, VehicleStatus, crop, user, vehicle},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Availability status given to new crops and restored by bid rejection.
pub const CROP_AVAILABLE: &str = "Available";

/// Registration payload for a new profile
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub role: Role,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub business_name: Option<String>,
    pub warehouse_address: Option<String>,
    pub address: Option<String>,
}

impl From<SeedUser> for NewUser {
    fn from(seed: SeedUser) -> Self {
        Self {
            role: seed.role,
            name: seed.name,
            email: seed.email,
            phone: seed.phone,
            business_name: seed.business_name,
            warehouse_address: seed.warehouse_address,
            address: seed.address,
        }
    }
}

/// Dealer fields that are safe to show to farmers and retailers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealerProfile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub business_name: Option<String>,
    pub warehouse_address: Option<String>,
}

impl From<&user::Model> for DealerProfile {
    fn from(dealer: &user::Model) -> Self {
        Self {
            name: dealer.name.clone(),
            email: dealer.email.clone(),
            phone: dealer.phone.clone(),
            business_name: dealer.business_name.clone(),
            warehouse_address: dealer.warehouse_address.clone(),
        }
    }
}

/// A crop lot offered by a farmer
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCrop {
    pub product_type: String,
    pub variety_species: String,
    pub harvest_quantity: f64,
    pub unit_of_sale: String,
    pub target_price: f64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVehicle {
    pub vehicle_id: String,
    pub vehicle_type: String,
    pub temperature_capacity: Option<String>,
}

const fn role_label(role: Role) -> &'static str {
    match role {
        Role::Farmer => "Farmer",
        Role::Dealer => "Dealer",
        Role::Retailer => "Retailer",
        Role::Admin => "Admin",
    }
}

/// Finds a profile by email regardless of role.
pub async fn find_user_by_email<C>(db: &C, email: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a profile by email and requires it to have `role`.
///
/// # Errors
/// `NotFound` naming the role when no such profile exists.
pub async fn require_user<C>(db: &C, email: &str, role: Role) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    find_user_by_email(db, email)
        .await?
        .filter(|found| found.role == role)
        .ok_or_else(|| Error::not_found(role_label(role), email))
}

pub async fn get_user(db: &DatabaseConnection, email: &str) -> Result<user::Model> {
    find_user_by_email(db, email)
        .await?
        .ok_or_else(|| Error::not_found("User", email))
}

/// Registers a new profile.
///
/// # Errors
/// `Validation` for a blank name or email, `InvalidState` when the email is
/// already registered.
#[instrument(skip(db, new_user), fields(email = %new_user.email, role = new_user.role.as_str()))]
pub async fn register_user(db: &DatabaseConnection, new_user: NewUser) -> Result<user::Model> {
    let name = new_user.name.trim();
    let email = new_user.email.trim();
    if name.is_empty() {
        return Err(Error::validation("Name cannot be empty"));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(Error::validation("A valid email is required"));
    }

    let txn = db.begin().await?;

    if find_user_by_email(&txn, email).await?.is_some() {
        return Err(Error::invalid_state(format!(
            "A user with email {email} already exists"
        )));
    }

    let created = user::ActiveModel {
        role: Set(new_user.role),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        phone: Set(new_user.phone),
        business_name: Set(new_user.business_name),
        warehouse_address: Set(new_user.warehouse_address),
        address: Set(new_user.address),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    audit::record(
        &txn,
        &created.email,
        ActionType::UserRegistered,
        format!("Registered as {}", created.role.as_str()),
    )
    .await?;

    txn.commit().await?;
    info!(user_id = created.id, "User registered");
    Ok(created)
}

/// Inserts the configured seed profiles whose email is not registered yet.
///
/// Returns the number of profiles created.
pub async fn seed_users(db: &DatabaseConnection, seeds: &[SeedUser]) -> Result<usize> {
    info!("Seeding users. Found {} profiles in configuration.", seeds.len());
    let mut created = 0;
    for seed in seeds {
        if find_user_by_email(db, &seed.email).await?.is_some() {
            debug!(email = %seed.email, "Seed user already exists, skipping");
            continue;
        }
        register_user(db, seed.clone().into()).await?;
        created += 1;
    }
    Ok(created)
}

/// Adds a crop lot to a farmer's listing with status "Available".
///
/// # Errors
/// `NotFound` for an unknown farmer, `Validation` for blank names or
/// non-positive quantity or price.
pub async fn add_crop(
    db: &DatabaseConnection,
    farmer_email: &str,
    new_crop: NewCrop,
) -> Result<crop::Model> {
    if new_crop.variety_species.trim().is_empty() || new_crop.product_type.trim().is_empty() {
        return Err(Error::validation(
            "Product type and variety/species are required",
        ));
    }
    if !is_positive_amount(new_crop.harvest_quantity) {
        return Err(Error::validation("Harvest quantity must be greater than zero"));
    }
    if !is_positive_amount(new_crop.target_price) {
        return Err(Error::validation("Target price must be greater than zero"));
    }

    let farmer = require_user(db, farmer_email, Role::Farmer).await?;
    let now = chrono::Utc::now();

    crop::ActiveModel {
        farmer_id: Set(farmer.id),
        product_type: Set(new_crop.product_type.trim().to_string()),
        variety_species: Set(new_crop.variety_species.trim().to_string()),
        harvest_quantity: Set(new_crop.harvest_quantity),
        unit_of_sale: Set(new_crop.unit_of_sale),
        target_price: Set(new_crop.target_price),
        availability_status: Set(CROP_AVAILABLE.to_string()),
        image_url: Set(new_crop.image_url),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Lists a farmer's crops, newest first.
pub async fn get_farmer_crops(db: &DatabaseConnection, farmer_email: &str) -> Result<Vec<crop::Model>> {
    let farmer = require_user(db, farmer_email, Role::Farmer).await?;
    Crop::find()
        .filter(crop::Column::FarmerId.eq(farmer.id))
        .order_by_desc(crop::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds one of a farmer's crops by id.
pub async fn find_farmer_crop<C>(db: &C, farmer_id: i64, crop_id: i64) -> Result<Option<crop::Model>>
where
    C: ConnectionTrait,
{
    Crop::find_by_id(crop_id)
        .filter(crop::Column::FarmerId.eq(farmer_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Sets the availability label of one of the farmer's crops.
pub async fn set_crop_availability(
    db: &DatabaseConnection,
    farmer_email: &str,
    crop_id: i64,
    status: &str,
) -> Result<crop::Model> {
    if status.trim().is_empty() {
        return Err(Error::validation("Availability status cannot be empty"));
    }
    let farmer = require_user(db, farmer_email, Role::Farmer).await?;
    let mut crop: crop::ActiveModel = find_farmer_crop(db, farmer.id, crop_id)
        .await?
        .ok_or_else(|| Error::not_found("Crop", crop_id))?
        .into();

    crop.availability_status = Set(status.trim().to_string());
    crop.updated_at = Set(chrono::Utc::now());
    crop.update(db).await.map_err(Into::into)
}

/// Registers a vehicle in a dealer's fleet as AVAILABLE.
///
/// # Errors
/// `NotFound` for an unknown dealer, `InvalidState` when the dealer already
/// has a vehicle with the same identifier.
pub async fn add_vehicle(
    db: &DatabaseConnection,
    dealer_email: &str,
    new_vehicle: NewVehicle,
) -> Result<vehicle::Model> {
    let vehicle_id = new_vehicle.vehicle_id.trim();
    if vehicle_id.is_empty() || new_vehicle.vehicle_type.trim().is_empty() {
        return Err(Error::validation("Vehicle id and type are required"));
    }

    let dealer = require_user(db, dealer_email, Role::Dealer).await?;
    if find_dealer_vehicle(db, dealer.id, vehicle_id).await?.is_some() {
        return Err(Error::invalid_state(format!(
            "Vehicle {vehicle_id} is already registered"
        )));
    }

    vehicle::ActiveModel {
        dealer_id: Set(dealer.id),
        vehicle_id: Set(vehicle_id.to_string()),
        vehicle_type: Set(new_vehicle.vehicle_type.trim().to_string()),
        temperature_capacity: Set(new_vehicle.temperature_capacity),
        current_status: Set(VehicleStatus::Available),
        assigned_to: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

pub async fn get_dealer_vehicles(
    db: &DatabaseConnection,
    dealer_email: &str,
) -> Result<Vec<vehicle::Model>> {
    let dealer = require_user(db, dealer_email, Role::Dealer).await?;
    Vehicle::find()
        .filter(vehicle::Column::DealerId.eq(dealer.id))
        .order_by_asc(vehicle::Column::VehicleId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds one of a dealer's vehicles by its dealer-facing identifier.
pub async fn find_dealer_vehicle<C>(
    db: &C,
    dealer_id: i64,
    vehicle_id: &str,
) -> Result<Option<vehicle::Model>>
where
    C: ConnectionTrait,
{
    Vehicle::find()
        .filter(vehicle::Column::DealerId.eq(dealer_id))
        .filter(vehicle::Column::VehicleId.eq(vehicle_id))
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_register_user_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let mut blank_name = new_user(Role::Farmer, "f@example.com");
        blank_name.name = "  ".to_string();
        let result = register_user(&db, blank_name).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = register_user(&db, new_user(Role::Farmer, "not-an-email")).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_register_user_rejects_duplicate_email() -> Result<()> {
        let db = setup_test_db().await?;
        register_user(&db, new_user(Role::Dealer, "dup@example.com")).await?;

        let result = register_user(&db, new_user(Role::Retailer, "dup@example.com")).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidState { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_require_user_checks_role() -> Result<()> {
        let db = setup_test_db().await?;
        register_user(&db, new_user(Role::Dealer, "d@example.com")).await?;

        assert!(require_user(&db, "d@example.com", Role::Dealer).await.is_ok());
        let result = require_user(&db, "d@example.com", Role::Farmer).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "Farmer",
                ..
            }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_users_skips_existing() -> Result<()> {
        let db = setup_test_db().await?;
        register_user(&db, new_user(Role::Admin, "admin@example.com")).await?;

        let seeds = vec![
            SeedUser {
                role: Role::Admin,
                name: "Admin".to_string(),
                email: "admin@example.com".to_string(),
                phone: None,
                business_name: None,
                warehouse_address: None,
                address: None,
            },
            SeedUser {
                role: Role::Dealer,
                name: "Dealer".to_string(),
                email: "seeded-dealer@example.com".to_string(),
                phone: None,
                business_name: Some("Seed Traders".to_string()),
                warehouse_address: None,
                address: None,
            },
        ];

        assert_eq!(seed_users(&db, &seeds).await?, 1);
        assert_eq!(seed_users(&db, &seeds).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_crop_and_list() -> Result<()> {
        let db = setup_test_db().await?;
        let farmer = create_test_user(&db, Role::Farmer, "farmer@example.com").await?;

        let crop = add_crop(&db, &farmer.email, test_crop("Tomato", 100.0)).await?;
        assert_eq!(crop.availability_status, CROP_AVAILABLE);
        assert_eq!(crop.harvest_quantity, 100.0);

        let crops = get_farmer_crops(&db, &farmer.email).await?;
        assert_eq!(crops, vec![crop]);

        let result = add_crop(&db, &farmer.email, test_crop("Onion", 0.0)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_set_crop_availability_scoped_to_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let farmer = create_test_user(&db, Role::Farmer, "farmer@example.com").await?;
        let other = create_test_user(&db, Role::Farmer, "other@example.com").await?;
        let crop = add_crop(&db, &farmer.email, test_crop("Wheat", 20.0)).await?;

        let updated = set_crop_availability(&db, &farmer.email, crop.id, "Reserved").await?;
        assert_eq!(updated.availability_status, "Reserved");

        let result = set_crop_availability(&db, &other.email, crop.id, "Sold").await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound { entity: "Crop", .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_vehicle_rejects_duplicate_id() -> Result<()> {
        let db = setup_test_db().await?;
        let dealer = create_test_user(&db, Role::Dealer, "dealer@example.com").await?;

        let vehicle = add_vehicle(&db, &dealer.email, test_vehicle("KA-01-1234")).await?;
        assert_eq!(vehicle.current_status, VehicleStatus::Available);
        assert!(vehicle.assigned_to.is_none());

        let result = add_vehicle(&db, &dealer.email, test_vehicle("KA-01-1234")).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidState { .. }));

        assert_eq!(get_dealer_vehicles(&db, &dealer.email).await?.len(), 1);
        Ok(())
    }
}

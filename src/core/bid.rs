//! Bid workflow - the farmer/dealer side of the marketplace.
//!
//! An order moves through
//!
//! ```text
//! assign_vehicle -> Vehicle Assigned -> place_bid -> Bid Placed -> accept_bid -> Bid Accepted
//!                                                              \-> reject_bid -> Bid Rejected
//! ```
//!
//! Acceptance moves stock: the farmer's crop quantity is decremented, a new
//! inventory line is credited to the dealer and a receipt is issued. Each
//! operation runs in a single database transaction and claims its state
//! transition with a conditional update, so a bid is answered at most once
//! even when two requests race.

use crate::{
    core::{audit, directory, is_positive_amount, notification, receipt},
    entities::{
        ActionType, BidStatus, Crop, Order, OrderStatus, Role, Vehicle, VehicleStatus, crop,
        inventory_item, order, user, vehicle,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// A dealer's request to reserve a vehicle against a farmer's crop lot
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleAssignment {
    pub dealer_email: String,
    /// Crop id
    pub product_id: i64,
    pub farmer_email: String,
    pub vehicle_id: String,
    pub quantity: f64,
    pub tentative_date: Option<NaiveDate>,
}

/// An order joined with the records it refers to, as shown to the farmer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerOrderView {
    #[serde(flatten)]
    pub order: order::Model,
    pub vehicle_details: vehicle::Model,
    pub dealer_details: directory::DealerProfile,
    pub crop_details: crop::Model,
}

async fn load_order<C>(db: &C, order_id: i64) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))
}

/// The farmer answering a bid must be the order's farmer.
fn ensure_order_farmer(order: &order::Model, farmer_email: &str) -> Result<()> {
    if order.farmer_email == farmer_email {
        Ok(())
    } else {
        Err(Error::Unauthorized {
            message: format!("Order {} does not belong to {farmer_email}", order.id),
        })
    }
}

/// A bid can only be answered while it is placed and pending.
fn ensure_bid_pending(order: &order::Model) -> Result<()> {
    if order.bid_status != BidStatus::Pending {
        return Err(Error::invalid_state(format!(
            "Bid on order {} has already been processed",
            order.id
        )));
    }
    if order.status != OrderStatus::BidPlaced {
        return Err(Error::invalid_state(format!(
            "No bid has been placed on order {}",
            order.id
        )));
    }
    Ok(())
}

/// Moves a pending bid to its answer, failing if another request got there first.
async fn claim_bid_response<C>(
    db: &C,
    order_id: i64,
    changes: order::ActiveModel,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Order::update_many()
        .set(changes)
        .filter(order::Column::Id.eq(order_id))
        .filter(order::Column::Status.eq(OrderStatus::BidPlaced))
        .filter(order::Column::BidStatus.eq(BidStatus::Pending))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::invalid_state(format!(
            "Bid on order {order_id} has already been processed"
        )));
    }
    Ok(())
}

/// Reserves a dealer's vehicle against a farmer's crop and opens an order.
///
/// No stock moves yet. Every call opens a new order, even for a crop and
/// dealer pair that already has one.
///
/// # Errors
/// - `Validation` for a non-positive quantity or one larger than the crop's
///   harvest quantity
/// - `NotFound` for an unknown dealer, farmer, crop or vehicle
/// - `InvalidState` when the vehicle is not AVAILABLE
#[instrument(skip(db, assignment), fields(dealer = %assignment.dealer_email, crop_id = assignment.product_id))]
pub async fn assign_vehicle(
    db: &DatabaseConnection,
    assignment: VehicleAssignment,
) -> Result<order::Model> {
    if !is_positive_amount(assignment.quantity) {
        return Err(Error::validation("Quantity must be greater than zero"));
    }
    if assignment.vehicle_id.trim().is_empty() {
        return Err(Error::validation("Vehicle id is required"));
    }

    let txn = db.begin().await?;

    let dealer = directory::require_user(&txn, &assignment.dealer_email, Role::Dealer).await?;
    let farmer = directory::require_user(&txn, &assignment.farmer_email, Role::Farmer).await?;
    let crop = directory::find_farmer_crop(&txn, farmer.id, assignment.product_id)
        .await?
        .ok_or_else(|| Error::not_found("Crop", assignment.product_id))?;
    let vehicle = directory::find_dealer_vehicle(&txn, dealer.id, &assignment.vehicle_id)
        .await?
        .ok_or_else(|| Error::not_found("Vehicle", &assignment.vehicle_id))?;

    if vehicle.current_status != VehicleStatus::Available {
        return Err(Error::invalid_state(format!(
            "Vehicle {} is not available",
            vehicle.vehicle_id
        )));
    }
    if assignment.quantity > crop.harvest_quantity {
        return Err(Error::validation(format!(
            "Requested quantity {} exceeds available harvest of {} {}",
            assignment.quantity, crop.harvest_quantity, crop.unit_of_sale
        )));
    }

    let reserved = Vehicle::update_many()
        .set(vehicle::ActiveModel {
            current_status: Set(VehicleStatus::Assigned),
            assigned_to: Set(Some(farmer.email.clone())),
            ..Default::default()
        })
        .filter(vehicle::Column::Id.eq(vehicle.id))
        .filter(vehicle::Column::CurrentStatus.eq(VehicleStatus::Available))
        .exec(&txn)
        .await?;
    if reserved.rows_affected == 0 {
        return Err(Error::invalid_state(format!(
            "Vehicle {} is not available",
            vehicle.vehicle_id
        )));
    }

    let created = order::ActiveModel {
        farmer_email: Set(farmer.email.clone()),
        dealer_email: Set(dealer.email.clone()),
        product_id: Set(crop.id),
        vehicle_id: Set(vehicle.vehicle_id.clone()),
        quantity: Set(assignment.quantity),
        target_price: Set(crop.target_price),
        bid_price: Set(None),
        total_amount: Set(None),
        assigned_date: Set(Utc::now()),
        tentative_date: Set(assignment.tentative_date),
        status: Set(OrderStatus::VehicleAssigned),
        bid_status: Set(BidStatus::Pending),
        bid_response_date: Set(None),
        receipt_number: Set(None),
        receipt_generated_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    audit::record(
        &txn,
        &dealer.email,
        ActionType::VehicleAssigned,
        format!(
            "Vehicle {} assigned to {} {} of {} from {} (order {})",
            vehicle.vehicle_id,
            created.quantity,
            crop.unit_of_sale,
            crop.variety_species,
            farmer.email,
            created.id
        ),
    )
    .await?;

    txn.commit().await?;
    info!(order_id = created.id, vehicle = %vehicle.vehicle_id, "Vehicle assigned");
    Ok(created)
}

/// Records the dealer's bid on an order and notifies the farmer.
///
/// `total_amount` is `bid_price * quantity`.
///
/// # Errors
/// `Validation` for a non-positive price, `NotFound` for an unknown order,
/// `InvalidState` unless the order is in Vehicle Assigned.
#[instrument(skip(db))]
pub async fn place_bid(db: &DatabaseConnection, order_id: i64, bid_price: f64) -> Result<order::Model> {
    if !is_positive_amount(bid_price) {
        return Err(Error::validation("Bid price must be greater than zero"));
    }

    let txn = db.begin().await?;

    let order = load_order(&txn, order_id).await?;
    if order.status != OrderStatus::VehicleAssigned {
        return Err(Error::invalid_state(format!(
            "Cannot bid on order {order_id} in status {:?}",
            order.status
        )));
    }

    let total_amount = bid_price * order.quantity;
    let placed = Order::update_many()
        .set(order::ActiveModel {
            bid_price: Set(Some(bid_price)),
            total_amount: Set(Some(total_amount)),
            status: Set(OrderStatus::BidPlaced),
            bid_status: Set(BidStatus::Pending),
            ..Default::default()
        })
        .filter(order::Column::Id.eq(order_id))
        .filter(order::Column::Status.eq(OrderStatus::VehicleAssigned))
        .exec(&txn)
        .await?;
    if placed.rows_affected == 0 {
        return Err(Error::invalid_state(format!(
            "A bid has already been placed on order {order_id}"
        )));
    }

    match directory::find_user_by_email(&txn, &order.farmer_email).await? {
        Some(farmer) => {
            notification::notify(
                &txn,
                farmer.id,
                "Bid Placed",
                &format!(
                    "{} bid {bid_price:.2} per unit for {} units (total {total_amount:.2}) on order {order_id}",
                    order.dealer_email, order.quantity
                ),
            )
            .await?;
        }
        None => warn!(farmer = %order.farmer_email, "Farmer missing, bid notification skipped"),
    }

    audit::record(
        &txn,
        &order.dealer_email,
        ActionType::BidPlaced,
        format!("Bid {bid_price:.2} on order {order_id}"),
    )
    .await?;

    let updated = load_order(&txn, order_id).await?;
    txn.commit().await?;
    info!(order_id, bid_price, total_amount, "Bid placed");
    Ok(updated)
}

/// Accepts the pending bid on an order on behalf of its farmer.
///
/// In one transaction: the order becomes Bid Accepted with a fresh receipt
/// number, the crop's harvest quantity drops by the ordered quantity (it is
/// not floored at zero), the dealer gains an inventory line priced at the bid,
/// and the dealer is notified.
///
/// # Errors
/// - `NotFound` for an unknown order, farmer, crop or dealer
/// - `Unauthorized` when `farmer_email` is not the order's farmer
/// - `InvalidState` unless a bid is placed and still pending
#[instrument(skip(db))]
pub async fn accept_bid(
    db: &DatabaseConnection,
    farmer_email: &str,
    order_id: i64,
) -> Result<order::Model> {
    let txn = db.begin().await?;

    let order = load_order(&txn, order_id).await?;
    ensure_order_farmer(&order, farmer_email)?;
    ensure_bid_pending(&order)?;
    let bid_price = order
        .bid_price
        .ok_or_else(|| Error::invalid_state(format!("Order {order_id} has no bid price")))?;

    let farmer = directory::require_user(&txn, farmer_email, Role::Farmer).await?;
    let crop = directory::find_farmer_crop(&txn, farmer.id, order.product_id)
        .await?
        .ok_or_else(|| Error::not_found("Crop", order.product_id))?;
    let dealer = directory::require_user(&txn, &order.dealer_email, Role::Dealer).await?;

    let now = Utc::now();
    let receipt_number = receipt::generate_unique_receipt_number(&txn, now).await?;

    claim_bid_response(
        &txn,
        order_id,
        order::ActiveModel {
            bid_status: Set(BidStatus::Accepted),
            status: Set(OrderStatus::BidAccepted),
            bid_response_date: Set(Some(now)),
            receipt_number: Set(Some(receipt_number.clone())),
            receipt_generated_at: Set(Some(now)),
            ..Default::default()
        },
    )
    .await?;

    Crop::update_many()
        .col_expr(
            crop::Column::HarvestQuantity,
            Expr::col(crop::Column::HarvestQuantity).sub(order.quantity),
        )
        .col_expr(crop::Column::UpdatedAt, Expr::value(now))
        .filter(crop::Column::Id.eq(crop.id))
        .exec(&txn)
        .await?;

    let total_value = bid_price * order.quantity;
    credit_dealer_inventory(&txn, &dealer, &farmer, &crop, &order, bid_price, &receipt_number)
        .await?;

    notification::notify(
        &txn,
        dealer.id,
        "Bid Accepted",
        &format!(
            "{} accepted your bid of {bid_price:.2} for {} {} of {}. Receipt {receipt_number}",
            farmer.name, order.quantity, crop.unit_of_sale, crop.variety_species
        ),
    )
    .await?;

    audit::record(
        &txn,
        farmer_email,
        ActionType::BidAccepted,
        format!("Accepted bid on order {order_id}, receipt {receipt_number}, value {total_value:.2}"),
    )
    .await?;

    let accepted = load_order(&txn, order_id).await?;
    txn.commit().await?;
    info!(order_id, receipt = %receipt_number, total_value, "Bid accepted");
    Ok(accepted)
}

/// Appends the accepted lot to the dealer's inventory as a priced snapshot.
async fn credit_dealer_inventory<C>(
    db: &C,
    dealer: &user::Model,
    farmer: &user::Model,
    crop: &crop::Model,
    order: &order::Model,
    bid_price: f64,
    receipt_number: &str,
) -> Result<inventory_item::Model>
where
    C: ConnectionTrait,
{
    inventory_item::ActiveModel {
        dealer_id: Set(dealer.id),
        product_id: Set(crop.id),
        product_name: Set(crop.variety_species.clone()),
        product_type: Set(crop.product_type.clone()),
        quantity: Set(order.quantity),
        unit_price: Set(bid_price),
        total_value: Set(bid_price * order.quantity),
        farmer_name: Set(farmer.name.clone()),
        farmer_email: Set(farmer.email.clone()),
        image_url: Set(crop.image_url.clone()),
        receipt_number: Set(Some(receipt_number.to_string())),
        added_date: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Rejects the pending bid on an order on behalf of its farmer.
///
/// The crop is marked Available again, the dealer's vehicle is released and
/// the dealer is notified. A crop or vehicle that no longer exists is
/// skipped with a warning.
///
/// # Errors
/// Same authorization and state checks as [`accept_bid`]; `NotFound` for
/// an unknown order or dealer.
#[instrument(skip(db))]
pub async fn reject_bid(
    db: &DatabaseConnection,
    farmer_email: &str,
    order_id: i64,
) -> Result<order::Model> {
    let txn = db.begin().await?;

    let order = load_order(&txn, order_id).await?;
    ensure_order_farmer(&order, farmer_email)?;
    ensure_bid_pending(&order)?;
    let dealer = directory::require_user(&txn, &order.dealer_email, Role::Dealer).await?;

    let now = Utc::now();
    claim_bid_response(
        &txn,
        order_id,
        order::ActiveModel {
            bid_status: Set(BidStatus::Rejected),
            status: Set(OrderStatus::BidRejected),
            bid_response_date: Set(Some(now)),
            ..Default::default()
        },
    )
    .await?;

    let crop = match directory::find_user_by_email(&txn, farmer_email).await? {
        Some(farmer) => directory::find_farmer_crop(&txn, farmer.id, order.product_id).await?,
        None => None,
    };
    match crop {
        Some(crop) => {
            Crop::update_many()
                .set(crop::ActiveModel {
                    availability_status: Set(directory::CROP_AVAILABLE.to_string()),
                    updated_at: Set(now),
                    ..Default::default()
                })
                .filter(crop::Column::Id.eq(crop.id))
                .exec(&txn)
                .await?;
        }
        None => warn!(crop_id = order.product_id, "Crop missing, availability not restored"),
    }

    match directory::find_dealer_vehicle(&txn, dealer.id, &order.vehicle_id).await? {
        Some(vehicle) => {
            Vehicle::update_many()
                .set(vehicle::ActiveModel {
                    current_status: Set(VehicleStatus::Available),
                    assigned_to: Set(None),
                    ..Default::default()
                })
                .filter(vehicle::Column::Id.eq(vehicle.id))
                .exec(&txn)
                .await?;
        }
        None => warn!(vehicle = %order.vehicle_id, "Vehicle missing, not released"),
    }

    notification::notify(
        &txn,
        dealer.id,
        "Bid Rejected",
        &format!("{farmer_email} rejected your bid on order {order_id}"),
    )
    .await?;

    audit::record(
        &txn,
        farmer_email,
        ActionType::BidRejected,
        format!("Rejected bid on order {order_id}"),
    )
    .await?;

    let rejected = load_order(&txn, order_id).await?;
    txn.commit().await?;
    info!(order_id, "Bid rejected");
    Ok(rejected)
}

/// Lists a farmer's orders joined with dealer, vehicle and crop details, newest first.
///
/// An order whose dealer, vehicle, farmer or crop can no longer be resolved
/// is left out of the result rather than failing the listing.
pub async fn get_farmer_orders(
    db: &DatabaseConnection,
    farmer_email: &str,
) -> Result<Vec<FarmerOrderView>> {
    let orders = Order::find()
        .filter(order::Column::FarmerEmail.eq(farmer_email))
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?;

    let Some(farmer) = directory::find_user_by_email(db, farmer_email).await? else {
        warn!(farmer = farmer_email, "Farmer missing, no orders can be resolved");
        return Ok(Vec::new());
    };

    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        let Some(dealer) = directory::find_user_by_email(db, &order.dealer_email).await? else {
            warn!(order_id = order.id, "Dealer missing, order omitted");
            continue;
        };
        let Some(vehicle) = directory::find_dealer_vehicle(db, dealer.id, &order.vehicle_id).await?
        else {
            warn!(order_id = order.id, "Vehicle missing, order omitted");
            continue;
        };
        let Some(crop) = directory::find_farmer_crop(db, farmer.id, order.product_id).await? else {
            warn!(order_id = order.id, "Crop missing, order omitted");
            continue;
        };

        views.push(FarmerOrderView {
            dealer_details: directory::DealerProfile::from(&dealer),
            order,
            vehicle_details: vehicle,
            crop_details: crop,
        });
    }

    Ok(views)
}

/// Lists the orders a dealer is counterparty to, newest first.
pub async fn get_dealer_orders(
    db: &DatabaseConnection,
    dealer_email: &str,
) -> Result<Vec<order::Model>> {
    directory::require_user(db, dealer_email, Role::Dealer).await?;
    Order::find()
        .filter(order::Column::DealerEmail.eq(dealer_email))
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

//! Retail commerce workflow - the dealer/retailer side of the marketplace.
//!
//! A retailer order moves through
//!
//! ```text
//! place_order -> Placed/Pending -> update_order* -> complete_payment -> Processing/Completed
//!                                                                    -> submit_review (once)
//! ```
//!
//! Completing payment draws the purchased quantities from the dealer's
//! inventory; a line drawn down to zero or below is removed. Payment,
//! inventory changes and the order update commit together.

use crate::{
    core::{audit, directory, is_positive_amount, notification},
    entities::{
        ActionType, InventoryItem, PaymentStatus, RetailOrderStatus, RetailerOrder,
        RetailerOrderProduct, Role, inventory_item, inventory_review, retailer_order,
        retailer_order_product, user,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// One line of a retailer's cart
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub dealer_email: String,
    /// Dealer inventory line id
    pub product_id: i64,
    pub product_name: String,
    pub quantity: f64,
    pub unit_price: f64,
}

/// A product line as submitted when editing or paying for an order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: f64,
    pub unit_price: f64,
}

/// Replacement contents for an order, used by edit and payment
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRevision {
    pub products: Vec<OrderLine>,
    pub total_amount: f64,
    pub payment_method: String,
}

/// A retailer's review of the products in a paid order.
///
/// Missing fields deserialize to empty values and fail validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewSubmission {
    pub order_id: i64,
    pub retailer_email: String,
    pub quality: String,
    pub comments: String,
    pub rating: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealerInfo {
    pub email: String,
    pub business_name: Option<String>,
    pub warehouse_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub status: PaymentStatus,
    pub method: Option<String>,
}

/// A retailer order with its product lines, shaped for clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetailerOrderView {
    pub id: i64,
    pub retailer_email: String,
    pub dealer_info: DealerInfo,
    pub products: Vec<retailer_order_product::Model>,
    pub total_amount: f64,
    pub shipping_address: Option<String>,
    pub payment_details: PaymentDetails,
    pub order_status: RetailOrderStatus,
    pub review_submitted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RetailerOrderView {
    #[must_use]
    pub fn new(order: retailer_order::Model, products: Vec<retailer_order_product::Model>) -> Self {
        Self {
            id: order.id,
            retailer_email: order.retailer_email,
            dealer_info: DealerInfo {
                email: order.dealer_email,
                business_name: order.dealer_business_name,
                warehouse_address: order.dealer_warehouse_address,
            },
            products,
            total_amount: order.total_amount,
            shipping_address: order.shipping_address,
            payment_details: PaymentDetails {
                status: order.payment_status,
                method: order.payment_method,
            },
            order_status: order.order_status,
            review_submitted: order.review_submitted,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

fn validate_line(quantity: f64, unit_price: f64) -> Result<()> {
    if !is_positive_amount(quantity) {
        return Err(Error::validation("Quantity must be greater than zero"));
    }
    if !(unit_price.is_finite() && unit_price >= 0.0) {
        return Err(Error::validation("Unit price must be zero or more"));
    }
    Ok(())
}

fn validate_revision(revision: &OrderRevision) -> Result<()> {
    if revision.products.is_empty() {
        return Err(Error::validation("An order needs at least one product"));
    }
    for line in &revision.products {
        validate_line(line.quantity, line.unit_price)?;
    }
    if !(revision.total_amount.is_finite() && revision.total_amount >= 0.0) {
        return Err(Error::validation("Total amount must be zero or more"));
    }
    if revision.payment_method.trim().is_empty() {
        return Err(Error::validation("Payment method is required"));
    }
    Ok(())
}

async fn load_order<C>(db: &C, order_id: i64) -> Result<retailer_order::Model>
where
    C: ConnectionTrait,
{
    RetailerOrder::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Retailer order", order_id))
}

async fn load_products<C>(db: &C, order_id: i64) -> Result<Vec<retailer_order_product::Model>>
where
    C: ConnectionTrait,
{
    RetailerOrderProduct::find()
        .filter(retailer_order_product::Column::OrderId.eq(order_id))
        .order_by_asc(retailer_order_product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn load_view<C>(db: &C, order_id: i64) -> Result<RetailerOrderView>
where
    C: ConnectionTrait,
{
    let order = load_order(db, order_id).await?;
    let products = load_products(db, order_id).await?;
    Ok(RetailerOrderView::new(order, products))
}

/// Replaces every product line of an order.
async fn replace_products<C>(db: &C, order_id: i64, lines: &[OrderLine]) -> Result<()>
where
    C: ConnectionTrait,
{
    RetailerOrderProduct::delete_many()
        .filter(retailer_order_product::Column::OrderId.eq(order_id))
        .exec(db)
        .await?;
    for line in lines {
        retailer_order_product::ActiveModel {
            order_id: Set(order_id),
            product_id: Set(line.product_id),
            product_name: Set(line.product_name.clone()),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// Splits cart items into per-dealer groups, keeping first-seen dealer order.
fn group_by_dealer(cart_items: Vec<CartItem>) -> Vec<(String, Vec<CartItem>)> {
    let mut groups: Vec<(String, Vec<CartItem>)> = Vec::new();
    for item in cart_items {
        match groups.iter_mut().find(|(dealer, _)| *dealer == item.dealer_email) {
            Some((_, items)) => items.push(item),
            None => groups.push((item.dealer_email.clone(), vec![item])),
        }
    }
    groups
}

/// Checks out a retailer's cart, creating one order per dealer in it.
///
/// Each order's total is the sum of quantity x unit price over that dealer's
/// items only. Items of a dealer that does not exist are skipped.
///
/// # Errors
/// `EmptyCart` for an empty cart, `Validation` for a non-positive quantity
/// or negative price, `NotFound` for an unknown retailer.
#[instrument(skip(db, cart_items), fields(items = cart_items.len()))]
pub async fn place_order(
    db: &DatabaseConnection,
    retailer_email: &str,
    cart_items: Vec<CartItem>,
) -> Result<Vec<RetailerOrderView>> {
    if cart_items.is_empty() {
        return Err(Error::EmptyCart);
    }
    for item in &cart_items {
        validate_line(item.quantity, item.unit_price)?;
    }

    let txn = db.begin().await?;
    let retailer = directory::require_user(&txn, retailer_email, Role::Retailer).await?;

    let mut created = Vec::new();
    for (dealer_email, items) in group_by_dealer(cart_items) {
        let dealer = match directory::find_user_by_email(&txn, &dealer_email).await? {
            Some(dealer) if dealer.role == Role::Dealer => dealer,
            _ => {
                warn!(dealer = %dealer_email, skipped = items.len(), "Dealer not found, cart items skipped");
                continue;
            }
        };

        let total_amount: f64 = items.iter().map(|item| item.quantity * item.unit_price).sum();
        let now = Utc::now();
        let order = retailer_order::ActiveModel {
            retailer_email: Set(retailer.email.clone()),
            dealer_email: Set(dealer.email.clone()),
            dealer_business_name: Set(dealer.business_name.clone()),
            dealer_warehouse_address: Set(dealer.warehouse_address.clone()),
            total_amount: Set(total_amount),
            shipping_address: Set(retailer.address.clone()),
            payment_status: Set(PaymentStatus::Pending),
            payment_method: Set(None),
            order_status: Set(RetailOrderStatus::Placed),
            review_submitted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let lines: Vec<OrderLine> = items
            .into_iter()
            .map(|item| OrderLine {
                product_id: item.product_id,
                product_name: item.product_name,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect();
        replace_products(&txn, order.id, &lines).await?;

        notification::notify(
            &txn,
            dealer.id,
            "New Retailer Order",
            &format!(
                "{} placed order {} for {} product(s), total {total_amount:.2}",
                retailer.name,
                order.id,
                lines.len()
            ),
        )
        .await?;
        audit::record(
            &txn,
            &retailer.email,
            ActionType::OrderPlaced,
            format!("Order {} with {} for {total_amount:.2}", order.id, dealer.email),
        )
        .await?;

        created.push(load_view(&txn, order.id).await?);
    }

    txn.commit().await?;
    info!(orders = created.len(), "Retailer order placed");
    Ok(created)
}

/// Lists a retailer's orders with their product lines, newest first.
pub async fn get_retailer_orders(
    db: &DatabaseConnection,
    retailer_email: &str,
) -> Result<Vec<RetailerOrderView>> {
    let orders = RetailerOrder::find()
        .filter(retailer_order::Column::RetailerEmail.eq(retailer_email))
        .order_by_desc(retailer_order::Column::Id)
        .all(db)
        .await?;
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let mut products: HashMap<i64, Vec<retailer_order_product::Model>> = HashMap::new();
    for line in RetailerOrderProduct::find()
        .filter(
            retailer_order_product::Column::OrderId
                .is_in(orders.iter().map(|order| order.id).collect::<Vec<_>>()),
        )
        .order_by_asc(retailer_order_product::Column::Id)
        .all(db)
        .await?
    {
        products.entry(line.order_id).or_default().push(line);
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let lines = products.remove(&order.id).unwrap_or_default();
            RetailerOrderView::new(order, lines)
        })
        .collect())
}

/// Edits an unpaid order: replaces its products, total and payment method
/// and leaves payment Pending.
///
/// The order is addressed by id alone; the caller's identity is not checked.
///
/// # Errors
/// `Validation` for bad lines, `NotFound` for an unknown order,
/// `AlreadyCompleted` once the order is paid.
#[instrument(skip(db, revision))]
pub async fn update_order(
    db: &DatabaseConnection,
    order_id: i64,
    revision: OrderRevision,
) -> Result<RetailerOrderView> {
    validate_revision(&revision)?;

    let txn = db.begin().await?;
    let order = load_order(&txn, order_id).await?;

    let updated = RetailerOrder::update_many()
        .set(retailer_order::ActiveModel {
            total_amount: Set(revision.total_amount),
            payment_method: Set(Some(revision.payment_method.trim().to_string())),
            payment_status: Set(PaymentStatus::Pending),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(retailer_order::Column::Id.eq(order_id))
        .filter(retailer_order::Column::PaymentStatus.ne(PaymentStatus::Completed))
        .exec(&txn)
        .await?;
    if updated.rows_affected == 0 {
        return Err(Error::AlreadyCompleted { order_id });
    }

    replace_products(&txn, order_id, &revision.products).await?;
    audit::record(
        &txn,
        &order.retailer_email,
        ActionType::OrderUpdated,
        format!("Order {order_id} edited, total {:.2}", revision.total_amount),
    )
    .await?;

    let view = load_view(&txn, order_id).await?;
    txn.commit().await?;
    info!(order_id, "Retailer order updated");
    Ok(view)
}

/// Draws `quantity` from a dealer's inventory line, removing the line when
/// nothing would remain.
async fn draw_inventory<C>(db: &C, dealer: &user::Model, line: &OrderLine) -> Result<()>
where
    C: ConnectionTrait,
{
    let Some(item) = InventoryItem::find_by_id(line.product_id)
        .filter(inventory_item::Column::DealerId.eq(dealer.id))
        .one(db)
        .await?
    else {
        warn!(product_id = line.product_id, dealer = %dealer.email, "Inventory line not found, not drawn");
        return Ok(());
    };

    InventoryItem::update_many()
        .col_expr(
            inventory_item::Column::Quantity,
            Expr::col(inventory_item::Column::Quantity).sub(line.quantity),
        )
        .col_expr(
            inventory_item::Column::TotalValue,
            Expr::col(inventory_item::Column::TotalValue).sub(line.quantity * item.unit_price),
        )
        .filter(inventory_item::Column::Id.eq(item.id))
        .exec(db)
        .await?;

    let removed = InventoryItem::delete_many()
        .filter(inventory_item::Column::Id.eq(item.id))
        .filter(inventory_item::Column::Quantity.lte(0.0))
        .exec(db)
        .await?;
    if removed.rows_affected > 0 {
        info!(product_id = item.id, "Inventory line depleted, removing");
    }
    Ok(())
}

/// Completes payment for an order and draws the purchased stock from the
/// dealer's inventory.
///
/// For each product with ordered quantity q against an inventory line of
/// quantity Q, the line is removed when q >= Q and reduced to Q - q
/// otherwise. Products without a matching line are skipped. The order then
/// takes the submitted products, total and method, payment becomes Completed
/// and the order moves to Processing.
///
/// # Errors
/// `Validation` for bad lines, `NotFound` for an unknown order or dealer,
/// `AlreadyCompleted` when payment was already completed (no stock moves).
#[instrument(skip(db, revision))]
pub async fn complete_payment(
    db: &DatabaseConnection,
    order_id: i64,
    revision: OrderRevision,
) -> Result<RetailerOrderView> {
    validate_revision(&revision)?;

    let txn = db.begin().await?;
    let order = load_order(&txn, order_id).await?;
    if order.payment_status == PaymentStatus::Completed {
        return Err(Error::AlreadyCompleted { order_id });
    }
    let dealer = directory::require_user(&txn, &order.dealer_email, Role::Dealer).await?;

    let claimed = RetailerOrder::update_many()
        .set(retailer_order::ActiveModel {
            total_amount: Set(revision.total_amount),
            payment_method: Set(Some(revision.payment_method.trim().to_string())),
            payment_status: Set(PaymentStatus::Completed),
            order_status: Set(RetailOrderStatus::Processing),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(retailer_order::Column::Id.eq(order_id))
        .filter(retailer_order::Column::PaymentStatus.ne(PaymentStatus::Completed))
        .exec(&txn)
        .await?;
    if claimed.rows_affected == 0 {
        return Err(Error::AlreadyCompleted { order_id });
    }

    for line in &revision.products {
        draw_inventory(&txn, &dealer, line).await?;
    }
    replace_products(&txn, order_id, &revision.products).await?;

    notification::notify(
        &txn,
        dealer.id,
        "Payment Received",
        &format!(
            "Payment of {:.2} via {} completed for order {order_id}",
            revision.total_amount,
            revision.payment_method.trim()
        ),
    )
    .await?;
    audit::record(
        &txn,
        &order.retailer_email,
        ActionType::PaymentCompleted,
        format!("Order {order_id} paid {:.2}", revision.total_amount),
    )
    .await?;

    let view = load_view(&txn, order_id).await?;
    txn.commit().await?;
    info!(order_id, total = revision.total_amount, "Payment completed");
    Ok(view)
}

/// Finds the dealer's inventory line for an ordered product: by id first,
/// then by product name for lines whose id no longer matches.
async fn find_review_target<C>(
    db: &C,
    dealer_id: i64,
    product: &retailer_order_product::Model,
) -> Result<Option<inventory_item::Model>>
where
    C: ConnectionTrait,
{
    let by_id = InventoryItem::find_by_id(product.product_id)
        .filter(inventory_item::Column::DealerId.eq(dealer_id))
        .one(db)
        .await?;
    if by_id.is_some() {
        return Ok(by_id);
    }

    InventoryItem::find()
        .filter(inventory_item::Column::DealerId.eq(dealer_id))
        .filter(inventory_item::Column::ProductName.eq(product.product_name.as_str()))
        .order_by_desc(inventory_item::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Records a retailer's review against the dealer inventory lines of a paid
/// order. Returns the number of lines reviewed.
///
/// # Errors
/// - `Validation` for blank fields or a rating outside 1 to 5
/// - `NotFound` for an unknown order or dealer
/// - `Unauthorized` when the order belongs to another retailer
/// - `InvalidState` before payment is completed
/// - `AlreadyReviewed` for an order already reviewed
/// - `NoMatch` when none of the order's products resolve to an inventory line
#[instrument(skip(db, submission), fields(order_id = submission.order_id))]
pub async fn submit_review(db: &DatabaseConnection, submission: ReviewSubmission) -> Result<usize> {
    if submission.retailer_email.trim().is_empty()
        || submission.quality.trim().is_empty()
        || submission.comments.trim().is_empty()
    {
        return Err(Error::validation(
            "Order id, retailer email, quality, comments and rating are required",
        ));
    }
    if submission.order_id <= 0 {
        return Err(Error::validation("A valid order id is required"));
    }
    if !(1..=5).contains(&submission.rating) {
        return Err(Error::validation("Rating must be between 1 and 5"));
    }

    let order_id = submission.order_id;
    let txn = db.begin().await?;
    let order = load_order(&txn, order_id).await?;

    if order.retailer_email != submission.retailer_email {
        return Err(Error::Unauthorized {
            message: format!("Order {order_id} does not belong to {}", submission.retailer_email),
        });
    }
    if order.payment_status != PaymentStatus::Completed {
        return Err(Error::invalid_state(format!(
            "Order {order_id} cannot be reviewed before payment is completed"
        )));
    }
    if order.review_submitted {
        return Err(Error::AlreadyReviewed { order_id });
    }
    let dealer = directory::require_user(&txn, &order.dealer_email, Role::Dealer).await?;

    let now = Utc::now();
    let mut reviewed = 0;
    for product in load_products(&txn, order_id).await? {
        let Some(target) = find_review_target(&txn, dealer.id, &product).await? else {
            warn!(product_id = product.product_id, name = %product.product_name, "No inventory line to review");
            continue;
        };
        inventory_review::ActiveModel {
            inventory_item_id: Set(target.id),
            order_id: Set(order_id),
            retailer_email: Set(order.retailer_email.clone()),
            quality: Set(submission.quality.trim().to_string()),
            comments: Set(submission.comments.trim().to_string()),
            rating: Set(submission.rating),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        reviewed += 1;
    }

    if reviewed == 0 {
        return Err(Error::NoMatch { order_id });
    }

    let marked = RetailerOrder::update_many()
        .set(retailer_order::ActiveModel {
            review_submitted: Set(true),
            updated_at: Set(now),
            ..Default::default()
        })
        .filter(retailer_order::Column::Id.eq(order_id))
        .filter(retailer_order::Column::ReviewSubmitted.eq(false))
        .exec(&txn)
        .await?;
    if marked.rows_affected == 0 {
        return Err(Error::AlreadyReviewed { order_id });
    }

    audit::record(
        &txn,
        &order.retailer_email,
        ActionType::ReviewSubmitted,
        format!("Order {order_id} reviewed, rating {}", submission.rating),
    )
    .await?;

    txn.commit().await?;
    info!(order_id, reviewed, "Review submitted");
    Ok(reviewed)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::InventoryReview;
    use crate::test_utils::*;

    fn cart_item(dealer: &user::Model, item: &inventory_item::Model, quantity: f64) -> CartItem {
        CartItem {
            dealer_email: dealer.email.clone(),
            product_id: item.id,
            product_name: item.product_name.clone(),
            quantity,
            unit_price: item.unit_price,
        }
    }

    fn revision_for(item: &inventory_item::Model, quantity: f64) -> OrderRevision {
        OrderRevision {
            products: vec![OrderLine {
                product_id: item.id,
                product_name: item.product_name.clone(),
                quantity,
                unit_price: item.unit_price,
            }],
            total_amount: quantity * item.unit_price,
            payment_method: "UPI".to_string(),
        }
    }

    fn review(order_id: i64, retailer_email: &str, rating: i32) -> ReviewSubmission {
        ReviewSubmission {
            order_id,
            retailer_email: retailer_email.to_string(),
            quality: "Good".to_string(),
            comments: "Fresh and well packed".to_string(),
            rating,
        }
    }

    async fn inventory_line(db: &DatabaseConnection, id: i64) -> Option<inventory_item::Model> {
        InventoryItem::find_by_id(id).one(db).await.unwrap()
    }

    #[tokio::test]
    async fn test_place_order_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = place_order(&db, "r@example.com", Vec::new()).await;
        assert!(matches!(result.unwrap_err(), Error::EmptyCart));

        let bad = CartItem {
            dealer_email: "d@example.com".to_string(),
            product_id: 1,
            product_name: "Rice".to_string(),
            quantity: -1.0,
            unit_price: 10.0,
        };
        let result = place_order(&db, "r@example.com", vec![bad]).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_splits_cart_per_dealer() -> Result<()> {
        let commerce = setup_commerce().await?;
        let second_dealer =
            create_test_user(&commerce.db, Role::Dealer, "second-dealer@example.com").await?;
        let onion = create_test_inventory(&commerce.db, &second_dealer, "Onion", 30.0, 12.0).await?;

        let cart = vec![
            cart_item(&commerce.dealer, &commerce.item, 2.0),
            cart_item(&second_dealer, &onion, 5.0),
            cart_item(&commerce.dealer, &commerce.item, 3.0),
        ];
        let orders = place_order(&commerce.db, &commerce.retailer.email, cart).await?;

        assert_eq!(orders.len(), 2);
        let first = &orders[0];
        assert_eq!(first.dealer_info.email, commerce.dealer.email);
        assert_eq!(first.products.len(), 2);
        assert_eq!(first.total_amount, 5.0 * commerce.item.unit_price);
        assert_eq!(first.payment_details.status, PaymentStatus::Pending);
        assert_eq!(first.order_status, RetailOrderStatus::Placed);
        assert!(!first.review_submitted);

        let second = &orders[1];
        assert_eq!(second.dealer_info.email, second_dealer.email);
        assert_eq!(second.total_amount, 60.0);

        let listed = get_retailer_orders(&commerce.db, &commerce.retailer.email).await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_skips_unknown_dealer() -> Result<()> {
        let commerce = setup_commerce().await?;
        let mut ghost = cart_item(&commerce.dealer, &commerce.item, 1.0);
        ghost.dealer_email = "ghost@example.com".to_string();

        let cart = vec![ghost, cart_item(&commerce.dealer, &commerce.item, 1.0)];
        let orders = place_order(&commerce.db, &commerce.retailer.email, cart).await?;

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].dealer_info.email, commerce.dealer.email);
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_unknown_retailer() -> Result<()> {
        let commerce = setup_commerce().await?;
        let cart = vec![cart_item(&commerce.dealer, &commerce.item, 1.0)];
        let result = place_order(&commerce.db, "nobody@example.com", cart).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "Retailer",
                ..
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_order_replaces_lines_before_payment() -> Result<()> {
        let commerce = setup_commerce().await?;
        let order = commerce.place_single_order(4.0).await?;

        let updated = update_order(&commerce.db, order.id, revision_for(&commerce.item, 7.0)).await?;
        assert_eq!(updated.products.len(), 1);
        assert_eq!(updated.products[0].quantity, 7.0);
        assert_eq!(updated.total_amount, 7.0 * commerce.item.unit_price);
        assert_eq!(updated.payment_details.method.as_deref(), Some("UPI"));
        assert_eq!(updated.payment_details.status, PaymentStatus::Pending);

        // Editing never touches stock
        let line = inventory_line(&commerce.db, commerce.item.id).await.unwrap();
        assert_eq!(line.quantity, commerce.item.quantity);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_order_after_payment_is_refused() -> Result<()> {
        let commerce = setup_commerce().await?;
        let order = commerce.place_single_order(4.0).await?;
        complete_payment(&commerce.db, order.id, revision_for(&commerce.item, 4.0)).await?;

        let result = update_order(&commerce.db, order.id, revision_for(&commerce.item, 1.0)).await;
        assert!(matches!(result.unwrap_err(), Error::AlreadyCompleted { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_payment_partial_draw() -> Result<()> {
        let commerce = setup_commerce().await?;
        let order = commerce.place_single_order(15.0).await?;

        let paid = complete_payment(&commerce.db, order.id, revision_for(&commerce.item, 15.0)).await?;
        assert_eq!(paid.payment_details.status, PaymentStatus::Completed);
        assert_eq!(paid.order_status, RetailOrderStatus::Processing);

        let line = inventory_line(&commerce.db, commerce.item.id).await.unwrap();
        assert_eq!(line.quantity, commerce.item.quantity - 15.0);
        assert_eq!(line.total_value, line.quantity * line.unit_price);
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_payment_removes_depleted_lines() -> Result<()> {
        let commerce = setup_commerce().await?;

        // Exactly the held quantity
        let exact = commerce.place_single_order(commerce.item.quantity).await?;
        complete_payment(
            &commerce.db,
            exact.id,
            revision_for(&commerce.item, commerce.item.quantity),
        )
        .await?;
        assert!(inventory_line(&commerce.db, commerce.item.id).await.is_none());

        // More than the held quantity
        let other = create_test_inventory(&commerce.db, &commerce.dealer, "Millet", 5.0, 30.0).await?;
        let cart = vec![cart_item(&commerce.dealer, &other, 8.0)];
        let orders = place_order(&commerce.db, &commerce.retailer.email, cart).await?;
        complete_payment(&commerce.db, orders[0].id, revision_for(&other, 8.0)).await?;
        assert!(inventory_line(&commerce.db, other.id).await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_payment_twice_moves_stock_once() -> Result<()> {
        let commerce = setup_commerce().await?;
        let order = commerce.place_single_order(10.0).await?;
        complete_payment(&commerce.db, order.id, revision_for(&commerce.item, 10.0)).await?;

        let result = complete_payment(&commerce.db, order.id, revision_for(&commerce.item, 10.0)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::AlreadyCompleted { order_id } if order_id == order.id
        ));

        let line = inventory_line(&commerce.db, commerce.item.id).await.unwrap();
        assert_eq!(line.quantity, commerce.item.quantity - 10.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_payment_draws_accumulate() -> Result<()> {
        let commerce = setup_commerce().await?;
        let first = commerce.place_single_order(20.0).await?;
        let second = commerce.place_single_order(20.0).await?;

        complete_payment(&commerce.db, first.id, revision_for(&commerce.item, 20.0)).await?;
        complete_payment(&commerce.db, second.id, revision_for(&commerce.item, 20.0)).await?;

        let line = inventory_line(&commerce.db, commerce.item.id).await.unwrap();
        assert_eq!(line.quantity, 10.0);
        assert_eq!(line.total_value, 400.0);

        let third = commerce.place_single_order(10.0).await?;
        complete_payment(&commerce.db, third.id, revision_for(&commerce.item, 10.0)).await?;
        assert!(inventory_line(&commerce.db, commerce.item.id).await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_payment_unknown_order() -> Result<()> {
        let commerce = setup_commerce().await?;
        let result = complete_payment(&commerce.db, 77, revision_for(&commerce.item, 1.0)).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_review_appends_to_inventory_line_once() -> Result<()> {
        let commerce = setup_commerce().await?;
        let order = commerce.place_single_order(10.0).await?;
        complete_payment(&commerce.db, order.id, revision_for(&commerce.item, 10.0)).await?;

        let reviewed =
            submit_review(&commerce.db, review(order.id, &commerce.retailer.email, 5)).await?;
        assert_eq!(reviewed, 1);

        let reviews = InventoryReview::find().all(&commerce.db).await?;
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].inventory_item_id, commerce.item.id);
        assert_eq!(reviews[0].rating, 5);

        let again = submit_review(&commerce.db, review(order.id, &commerce.retailer.email, 4)).await;
        assert!(matches!(again.unwrap_err(), Error::AlreadyReviewed { .. }));
        assert_eq!(InventoryReview::find().all(&commerce.db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_review_falls_back_to_product_name() -> Result<()> {
        let commerce = setup_commerce().await?;

        // Deplete the line so the id no longer resolves
        let order = commerce.place_single_order(commerce.item.quantity).await?;
        complete_payment(
            &commerce.db,
            order.id,
            revision_for(&commerce.item, commerce.item.quantity),
        )
        .await?;
        let restock = create_test_inventory(
            &commerce.db,
            &commerce.dealer,
            &commerce.item.product_name,
            40.0,
            commerce.item.unit_price,
        )
        .await?;

        let reviewed =
            submit_review(&commerce.db, review(order.id, &commerce.retailer.email, 3)).await?;
        assert_eq!(reviewed, 1);
        let reviews = InventoryReview::find().all(&commerce.db).await?;
        assert_eq!(reviews[0].inventory_item_id, restock.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_review_without_matching_line() -> Result<()> {
        let commerce = setup_commerce().await?;
        let order = commerce.place_single_order(commerce.item.quantity).await?;
        complete_payment(
            &commerce.db,
            order.id,
            revision_for(&commerce.item, commerce.item.quantity),
        )
        .await?;

        let result = submit_review(&commerce.db, review(order.id, &commerce.retailer.email, 4)).await;
        assert!(matches!(result.unwrap_err(), Error::NoMatch { .. }));

        let stored = RetailerOrder::find_by_id(order.id).one(&commerce.db).await?.unwrap();
        assert!(!stored.review_submitted);
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_review_guards() -> Result<()> {
        let commerce = setup_commerce().await?;
        let order = commerce.place_single_order(2.0).await?;

        for rating in [0, 6, -1] {
            let result =
                submit_review(&commerce.db, review(order.id, &commerce.retailer.email, rating)).await;
            assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        }

        let mut blank = review(order.id, &commerce.retailer.email, 4);
        blank.comments = "   ".to_string();
        let result = submit_review(&commerce.db, blank).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));


        let missing_order: ReviewSubmission = serde_json::from_value(serde_json::json!({
            "retailerEmail": commerce.retailer.email,
            "quality": "Good",
            "comments": "Fresh",
            "rating": 4,
        }))
        .unwrap();
        let result = submit_review(&commerce.db, missing_order).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = submit_review(&commerce.db, review(order.id, &commerce.retailer.email, 4)).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidState { .. }));

        complete_payment(&commerce.db, order.id, revision_for(&commerce.item, 2.0)).await?;
        let result = submit_review(&commerce.db, review(order.id, "other@example.com", 4)).await;
        assert!(matches!(result.unwrap_err(), Error::Unauthorized { .. }));
        Ok(())
    }
}

//! Dealer inventory listings for dealers and the retailer marketplace.

use crate::{
    core::directory,
    entities::{InventoryItem, InventoryReview, Role, User, inventory_item, inventory_review, user},
    errors::Result,
};
use sea_orm::{QueryOrder, prelude::*};
use serde::Serialize;
use std::collections::HashMap;

/// An inventory line with the reviews retailers left on it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLineView {
    #[serde(flatten)]
    pub item: inventory_item::Model,
    pub retailer_reviews: Vec<inventory_review::Model>,
}

/// An inventory line as listed on the marketplace, tagged with its dealer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceListing {
    #[serde(flatten)]
    pub line: InventoryLineView,
    pub dealer_name: String,
    pub dealer_email: String,
    pub dealer_phone: Option<String>,
}

/// Loads the reviews for the given lines, grouped by line id.
async fn reviews_by_item(
    db: &DatabaseConnection,
    item_ids: Vec<i64>,
) -> Result<HashMap<i64, Vec<inventory_review::Model>>> {
    let mut grouped: HashMap<i64, Vec<inventory_review::Model>> = HashMap::new();
    if item_ids.is_empty() {
        return Ok(grouped);
    }

    let reviews = InventoryReview::find()
        .filter(inventory_review::Column::InventoryItemId.is_in(item_ids))
        .order_by_asc(inventory_review::Column::Id)
        .all(db)
        .await?;
    for review in reviews {
        grouped.entry(review.inventory_item_id).or_default().push(review);
    }
    Ok(grouped)
}

fn attach_reviews(
    items: Vec<inventory_item::Model>,
    mut reviews: HashMap<i64, Vec<inventory_review::Model>>,
) -> Vec<InventoryLineView> {
    items
        .into_iter()
        .map(|item| InventoryLineView {
            retailer_reviews: reviews.remove(&item.id).unwrap_or_default(),
            item,
        })
        .collect()
}

/// Lists one dealer's inventory, most recently added first.
pub async fn get_dealer_inventory(
    db: &DatabaseConnection,
    dealer_email: &str,
) -> Result<Vec<InventoryLineView>> {
    let dealer = directory::require_user(db, dealer_email, Role::Dealer).await?;
    let items = InventoryItem::find()
        .filter(inventory_item::Column::DealerId.eq(dealer.id))
        .order_by_desc(inventory_item::Column::AddedDate)
        .order_by_desc(inventory_item::Column::Id)
        .all(db)
        .await?;

    let reviews = reviews_by_item(db, items.iter().map(|item| item.id).collect()).await?;
    Ok(attach_reviews(items, reviews))
}

/// Flattens every dealer's inventory into one marketplace listing,
/// most recently added first.
pub async fn get_dealer_inventories(db: &DatabaseConnection) -> Result<Vec<MarketplaceListing>> {
    let dealers: HashMap<i64, user::Model> = User::find()
        .filter(user::Column::Role.eq(Role::Dealer))
        .all(db)
        .await?
        .into_iter()
        .map(|dealer| (dealer.id, dealer))
        .collect();

    let items = InventoryItem::find()
        .order_by_desc(inventory_item::Column::AddedDate)
        .order_by_desc(inventory_item::Column::Id)
        .all(db)
        .await?;
    let reviews = reviews_by_item(db, items.iter().map(|item| item.id).collect()).await?;

    Ok(attach_reviews(items, reviews)
        .into_iter()
        .filter_map(|line| {
            let dealer = dealers.get(&line.item.dealer_id)?;
            Some(MarketplaceListing {
                dealer_name: dealer.name.clone(),
                dealer_email: dealer.email.clone(),
                dealer_phone: dealer.phone.clone(),
                line,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::Error;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_get_dealer_inventories_flattens_and_annotates() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_user(&db, Role::Dealer, "first@example.com").await?;
        let second = create_test_user(&db, Role::Dealer, "second@example.com").await?;

        let older = create_test_inventory(&db, &first, "Basmati Rice", 50.0, 40.0).await?;
        let newer = create_test_inventory(&db, &second, "Red Onion", 20.0, 15.0).await?;

        let listings = get_dealer_inventories(&db).await?;
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].line.item.id, newer.id);
        assert_eq!(listings[0].dealer_email, second.email);
        assert_eq!(listings[1].line.item.id, older.id);
        assert_eq!(listings[1].dealer_name, first.name);

        let json = serde_json::to_value(&listings[0]).unwrap();
        assert_eq!(json["productName"], "Red Onion");
        assert_eq!(json["dealerEmail"], "second@example.com");
        assert!(json["retailerReviews"].as_array().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_get_dealer_inventory_scoped_to_dealer() -> Result<()> {
        let db = setup_test_db().await?;
        let mine = create_test_user(&db, Role::Dealer, "mine@example.com").await?;
        let theirs = create_test_user(&db, Role::Dealer, "theirs@example.com").await?;
        create_test_inventory(&db, &mine, "Wheat", 10.0, 20.0).await?;
        create_test_inventory(&db, &theirs, "Maize", 10.0, 20.0).await?;

        let lines = get_dealer_inventory(&db, &mine.email).await?;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item.product_name, "Wheat");

        let result = get_dealer_inventory(&db, "nobody@example.com").await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }
}

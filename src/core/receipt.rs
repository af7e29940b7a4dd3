//! Receipt numbers for accepted bids.
//!
//! Format: `RCP-YYYYMMDD-NNNN`, the date of acceptance followed by a random
//! zero-padded four digit serial. Only 10 000 serials exist per day, so a new
//! number is checked against stored orders and redrawn on collision.

use crate::{
    entities::{Order, order},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use sea_orm::prelude::*;
use tracing::warn;

pub const RECEIPT_PREFIX: &str = "RCP";
pub const MAX_RECEIPT_ATTEMPTS: u32 = 16;

#[must_use]
pub fn format_receipt_number(date: NaiveDate, serial: u16) -> String {
    format!("{RECEIPT_PREFIX}-{}-{serial:04}", date.format("%Y%m%d"))
}

/// Draws a receipt number for `now` without checking for collisions.
#[must_use]
pub fn random_receipt_number(now: DateTime<Utc>) -> String {
    let serial = rand::thread_rng().gen_range(0..10_000);
    format_receipt_number(now.date_naive(), serial)
}

/// Checks the `RCP-` + 8 digits + `-` + 4 digits shape.
#[must_use]
pub fn is_valid_receipt_number(candidate: &str) -> bool {
    let mut parts = candidate.split('-');
    let (Some(prefix), Some(date), Some(serial), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    prefix == RECEIPT_PREFIX
        && date.len() == 8
        && date.bytes().all(|b| b.is_ascii_digit())
        && serial.len() == 4
        && serial.bytes().all(|b| b.is_ascii_digit())
}

/// Draws receipt numbers until one is not used by any stored order.
///
/// # Errors
/// `ReceiptExhausted` after [`MAX_RECEIPT_ATTEMPTS`] collisions.
pub async fn generate_unique_receipt_number<C>(db: &C, now: DateTime<Utc>) -> Result<String>
where
    C: ConnectionTrait,
{
    for attempt in 1..=MAX_RECEIPT_ATTEMPTS {
        let candidate = random_receipt_number(now);
        let taken = Order::find()
            .filter(order::Column::ReceiptNumber.eq(candidate.as_str()))
            .count(db)
            .await?
            > 0;
        if !taken {
            return Ok(candidate);
        }
        warn!(attempt, receipt = %candidate, "Receipt number collision, drawing again");
    }

    Err(Error::ReceiptExhausted {
        attempts: MAX_RECEIPT_ATTEMPTS,
    })
}

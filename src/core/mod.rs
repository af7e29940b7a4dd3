//! Core business logic - framework-agnostic marketplace workflows.
//!
//! Every multi-record mutation runs inside one database transaction, and
//! state guards are re-checked with conditional updates inside it, so a
//! workflow step is applied completely or not at all.

/// Append-only audit trail of workflow transitions
pub mod audit;
/// Farmer/dealer bid lifecycle: vehicle assignment, bidding, accept/reject
pub mod bid;
/// User profiles and their crops and vehicles
pub mod directory;
/// Dealer inventory listings
pub mod inventory;
/// Per-user notification inbox
pub mod notification;
/// Receipt number generation for accepted bids
pub mod receipt;
/// Dealer/retailer commerce: checkout, payment and reviews
pub mod retail;

/// True when `value` is a finite number strictly greater than zero.
pub(crate) fn is_positive_amount(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

//! Unified error type for AgroChain.
//!
//! Workflow failures are grouped the way callers need to react to them:
//! missing records, callers acting on someone else's order, actions attempted
//! in the wrong state, and bad input. Anything else is a server fault and is
//! reported to HTTP clients without detail (see [`crate::api::error`]).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Payment already completed for order {order_id}")]
    AlreadyCompleted { order_id: i64 },

    #[error("Review already submitted for order {order_id}")]
    AlreadyReviewed { order_id: i64 },

    #[error("No inventory lines matched the products of order {order_id}")]
    NoMatch { order_id: i64 },

    #[error("Could not generate a unique receipt number after {attempts} attempts")]
    ReceiptExhausted { attempts: u32 },
}

impl Error {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True for failures the caller cannot fix by changing the request.
    #[must_use]
    pub const fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::Database(_)
                | Self::Io(_)
                | Self::EnvVar(_)
                | Self::ReceiptExhausted { .. }
        )
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

//! Request extraction helpers.
//!
//! Handlers take [`JsonBody`] / [`PathParams`] and unwrap them here, so a
//! malformed body or path segment is reported as a `Validation` error with
//! the usual `{"msg": ..}` body.

use crate::errors::{Error, Result};
use axum::{
    Json,
    extract::{
        Path,
        rejection::{JsonRejection, PathRejection},
    },
};

/// Extracts a JSON body, mapping deserialization failures to `Validation`.
pub fn extract_json<T>(result: JsonBody<T>) -> Result<T> {
    result
        .map(|Json(value)| value)
        .map_err(|err| Error::validation(err.body_text()))
}

/// Extracts path parameters, mapping parse failures to `Validation`.
pub fn extract_path<T>(result: PathParams<T>) -> Result<T> {
    result
        .map(|Path(value)| value)
        .map_err(|err| Error::validation(err.body_text()))
}

/// A JSON body whose rejection is handled by [`extract_json`]
pub type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;

/// Path parameters whose rejection is handled by [`extract_path`]
pub type PathParams<T> = std::result::Result<Path<T>, PathRejection>;

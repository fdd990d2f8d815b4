use std::fmt::{Display, Formatter};

use lmdb::Error as LmdbError;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

/// Outcome of every fallible operation in the crate.
///
/// Library functions return `Result<T, AppResponse>`; the FFI layer serializes
/// the value itself so the host can branch on the variant name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppResponse {
    DatabaseError(String),
    SerializationError(String),
    NotFound(String),
    ValidationError(String),
    BadRequest(String),
    /// The data provider failed; carries the provider's message.
    FetchError(String),
    /// The dashboard snapshot is missing required fields.
    InvalidData(Vec<String>),
    Ok(String),
}

impl Display for AppResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppResponse::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppResponse::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppResponse::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppResponse::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppResponse::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppResponse::FetchError(msg) => write!(f, "Error loading dashboard: {}", msg),
            AppResponse::InvalidData(missing) => {
                write!(f, "Dashboard data is incomplete: missing {}", missing.join(", "))
            }
            AppResponse::Ok(msg) => write!(f, "Ok: {}", msg),
        }
    }
}

impl std::error::Error for AppResponse {}

impl From<LmdbError> for AppResponse {
    fn from(err: LmdbError) -> Self {
        match err {
            LmdbError::NotFound => AppResponse::NotFound("Key not found in filter storage".to_string()),
            LmdbError::Corrupted => AppResponse::DatabaseError("Filter storage is corrupted".to_string()),
            LmdbError::MapFull => AppResponse::DatabaseError("Filter storage is full".to_string()),
            _ => AppResponse::DatabaseError(format!("LMDB error: {err}")),
        }
    }
}

impl From<SerdeError> for AppResponse {
    fn from(err: SerdeError) -> Self {
        AppResponse::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for AppResponse {
    fn from(err: std::io::Error) -> Self {
        AppResponse::DatabaseError(format!("IO error: {}", err))
    }
}

impl AppResponse {
    pub fn success(msg: impl Into<String>) -> Self {
        AppResponse::Ok(msg.into())
    }

    /// True for the two failures the user is shown: fetch errors and invalid data.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, AppResponse::FetchError(_) | AppResponse::InvalidData(_))
    }
}

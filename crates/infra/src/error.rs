//! Engine-facing error taxonomy.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use shopledger_core::DomainError;

use crate::store::{StoreError, StoreResult};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// What an engine operation can fail with; the HTTP layer maps each variant
/// to one status code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    /// Pool exhausted, connection lost, or the call exceeded its deadline.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("store failure: {0}")]
    Store(String),
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::InvalidInput(msg),
            DomainError::NotFound(msg) => Self::NotFound(msg),
            DomainError::InsufficientStock {
                available,
                requested,
            } => Self::InsufficientStock {
                available,
                requested,
            },
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(d) => d.into(),
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
            StoreError::Query(msg) => Self::Store(msg),
        }
    }
}

/// Run one store call under a deadline.
///
/// Dropping the future on expiry also drops any open transaction, which rolls
/// it back.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: &'static str, fut: F) -> ServiceResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(ServiceError::from),
        Err(_) => {
            let limit_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
            warn!(operation, timeout_ms = limit_ms, "store call timed out");
            Err(ServiceError::StoreUnavailable(format!(
                "{operation} timed out after {limit_ms}ms"
            )))
        }
    }
}

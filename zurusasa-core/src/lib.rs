pub mod events;
pub mod identity;
pub mod booking;
pub mod payment;
pub mod repository;
pub mod memory;

pub use identity::{SessionContext, ViewMode};
pub use booking::{Booking, BookingInsert, BookingStatus, NewBooking};
pub use payment::{
    GatewayAuthorization, GatewayError, GatewayOutcome, GatewayReceipt, GatewayRequest,
    NewPaymentMethod, PaymentGateway, PaymentMethod,
};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
    #[error("Identity verification failed: {0}")]
    IdentityError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Errors surfaced by the remote table repositories
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{0}")]
    Database(String),
    #[error("Malformed row in {table}: {reason}")]
    Decode {
        table: &'static str,
        reason: String,
    },
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

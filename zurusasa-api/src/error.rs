use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use zurusasa_catalog::CatalogError;
use zurusasa_core::{GatewayError, RepositoryError};
use zurusasa_mail::MailError;
use zurusasa_order::{CheckoutError, OrderError};

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    /// A remote collaborator (database, gateway, email API) failed; the
    /// message is shown to the user.
    UpstreamError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::UpstreamError(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => AppError::NotFoundError(format!("Not found: {}", what)),
            RepositoryError::Database(msg) => AppError::UpstreamError(msg),
            decode @ RepositoryError::Decode { .. } => AppError::InternalServerError(decode.to_string()),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotConfigured(what) => {
                AppError::InternalServerError(format!("payment gateway not configured: {}", what))
            }
            other => AppError::UpstreamError(format!("Payment failed: {}", other)),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Unauthenticated => AppError::AuthenticationError(err.to_string()),
            CheckoutError::InProgress => AppError::ConflictError(err.to_string()),
            CheckoutError::Validation(_) => AppError::ValidationError(err.to_string()),
            CheckoutError::UnknownPaymentMethod => AppError::NotFoundError(err.to_string()),
            CheckoutError::KeyConflict => AppError::ConflictError(err.to_string()),
            CheckoutError::Gateway(e) => e.into(),
            CheckoutError::BookingWrite(_) => AppError::UpstreamError(err.to_string()),
            CheckoutError::Repository(e) => e.into(),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            OrderError::InvalidTransition { .. } => AppError::ConflictError(err.to_string()),
            OrderError::Forbidden(_) => AppError::AuthorizationError(err.to_string()),
            OrderError::Repository(e) => e.into(),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

/// The email functions answer every failure with 400.
impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_checkout_error_statuses() {
        assert_eq!(status_of(CheckoutError::Unauthenticated.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(CheckoutError::InProgress.into()), StatusCode::CONFLICT);
        assert_eq!(
            status_of(CheckoutError::BookingWrite("connection reset".into()).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(CheckoutError::Gateway(GatewayError::NotConfigured("key".into())).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_of(CheckoutError::KeyConflict.into()), StatusCode::CONFLICT);
    }

    #[test]
    fn test_mail_errors_are_bad_requests() {
        let err: AppError = MailError::MissingConfig("RESEND_API_KEY").into();
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }
}

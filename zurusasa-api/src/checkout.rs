use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zurusasa_core::{GatewayAuthorization, GatewayReceipt, PaymentGateway, PaymentMethod, SessionContext};
use zurusasa_order::{
    ChargeProvider, CheckoutController, CheckoutOutcome, CheckoutRequest, ClientReportedGateway,
    GatewayChargeProvider, MethodSelection, SimulatedChargeProvider,
};
use zurusasa_shared::pii::Masked;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    #[serde(flatten)]
    pub request: CheckoutRequest,
    /// `"new"` or the id of a saved card
    #[serde(default)]
    pub payment_method_id: MethodSelection,
    #[serde(default)]
    pub save_card: bool,
    /// What the payment widget reported for the new-card path
    pub gateway: Option<WidgetResult>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WidgetResult {
    Success {
        reference: String,
        authorization: Option<WidgetAuthorization>,
    },
    Closed,
}

#[derive(Debug, Deserialize)]
pub struct WidgetAuthorization {
    pub authorization_code: Option<String>,
    pub last4: Option<String>,
    pub brand: Option<String>,
}

/// Saved card as listed in the checkout dialog. The authorization code never
/// leaves the server.
#[derive(Debug, Serialize)]
pub struct PaymentMethodResponse {
    pub id: Uuid,
    pub provider: String,
    pub card_brand: String,
    pub last4: String,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentMethod> for PaymentMethodResponse {
    fn from(method: PaymentMethod) -> Self {
        Self {
            id: method.id,
            provider: method.provider,
            card_brand: method.card_brand,
            last4: method.last4,
            created_at: method.created_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/checkout", post(checkout))
}

pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/payment-methods", get(list_payment_methods))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/checkout
/// Charges the selected instrument and records the booking
pub async fn checkout(
    State(state): State<AppState>,
    session: Option<Extension<SessionContext>>,
    Json(mut body): Json<CheckoutBody>,
) -> Result<Json<CheckoutOutcome>, AppError> {
    let session = session.map(|Extension(s)| s);

    let new_card = new_card_provider(&state, &mut body)?;
    let saved_card: Arc<dyn ChargeProvider> =
        Arc::new(SimulatedChargeProvider::new(state.payments.simulated_charge_delay));

    // One dialog per request; repeat submissions are caught by the attempt key.
    let mut controller = CheckoutController::new(state.checkout_services(), new_card, saved_card);
    controller.select_method(body.payment_method_id);
    controller.set_save_card(body.save_card);

    let outcome = controller.submit(session.as_ref(), &body.request).await?;
    Ok(Json(outcome))
}

/// GET /v1/payment-methods
pub async fn list_payment_methods(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Vec<PaymentMethodResponse>>, AppError> {
    let methods = state.payment_methods.list_payment_methods(session.user_id).await?;
    Ok(Json(methods.into_iter().map(PaymentMethodResponse::from).collect()))
}

/// Picks how the new-card charge is confirmed: a widget close is taken at its
/// word; a success is verified with the gateway when a server key is
/// configured, otherwise the widget's receipt is replayed as-is.
fn new_card_provider(state: &AppState, body: &mut CheckoutBody) -> Result<Arc<dyn ChargeProvider>, AppError> {
    if body.payment_method_id != MethodSelection::New {
        // Unused on the saved-card path.
        return Ok(Arc::new(GatewayChargeProvider::new(Arc::new(ClientReportedGateway::closed()))));
    }

    let gateway: Arc<dyn PaymentGateway> = match (body.gateway.take(), &state.gateway) {
        (Some(WidgetResult::Closed), _) => Arc::new(ClientReportedGateway::closed()),
        (Some(WidgetResult::Success { reference, authorization }), None) => {
            body.request.reference = Some(reference.clone());
            Arc::new(ClientReportedGateway::success(GatewayReceipt {
                reference,
                authorization: authorization.and_then(into_authorization),
            }))
        }
        (Some(WidgetResult::Success { reference, .. }), Some(verifier)) => {
            body.request.reference = Some(reference);
            verifier.clone()
        }
        (None, Some(verifier)) if body.request.reference.is_some() => verifier.clone(),
        (None, _) => {
            return Err(AppError::ValidationError(
                "A payment result from the card widget is required".to_string(),
            ))
        }
    };

    Ok(Arc::new(GatewayChargeProvider::new(gateway)))
}

fn into_authorization(auth: WidgetAuthorization) -> Option<GatewayAuthorization> {
    let code = auth.authorization_code.filter(|c| !c.trim().is_empty())?;
    Some(GatewayAuthorization {
        authorization_code: Masked::new(code),
        last4: auth.last4,
        brand: auth.brand,
    })
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zurusasa_shared::pii::Masked;

/// The only provider cards are saved against
pub const PROVIDER_PAYSTACK: &str = "paystack";

pub const DEFAULT_CURRENCY: &str = "KES";

/// Converts a whole-unit amount (KES) to the minor units the gateway expects.
/// `None` when the result does not fit in an `i64`.
pub fn to_minor_units(amount: i64) -> Option<i64> {
    amount.checked_mul(100)
}

/// What the hosted payment widget is initialised with
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayRequest {
    pub reference: String,
    pub email: String,
    pub amount_minor: i64,
    pub currency: String,
    pub public_key: String,
}

/// Reusable card authorization returned on a successful new-card charge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayAuthorization {
    pub authorization_code: Masked<String>,
    pub last4: Option<String>,
    pub brand: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayReceipt {
    /// Gateway transaction reference
    pub reference: String,
    pub authorization: Option<GatewayAuthorization>,
}

/// Exactly one of the widget's two callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    Success(GatewayReceipt),
    /// The user closed the widget before paying.
    Closed,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Payment gateway unreachable: {0}")]
    Transport(String),
    #[error("Payment gateway error ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Unexpected payment gateway response: {0}")]
    InvalidResponse(String),
    #[error("Payment gateway is not configured: {0}")]
    NotConfigured(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Runs one payment collection and reports how it ended.
    async fn collect(&self, request: &GatewayRequest) -> Result<GatewayOutcome, GatewayError>;
}

/// A saved instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub gateway_reference: String,
    /// Kept for future charge-by-token; nothing re-charges with it yet.
    pub authorization_code: Masked<String>,
    pub card_brand: String,
    pub last4: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentMethod {
    pub user_id: Uuid,
    pub provider: String,
    pub gateway_reference: String,
    pub authorization_code: Masked<String>,
    pub card_brand: String,
    pub last4: String,
}

impl NewPaymentMethod {
    /// Builds the row from a gateway receipt, trusting whatever card details
    /// the gateway reported and filling placeholders for anything missing.
    pub fn from_receipt(user_id: Uuid, receipt: &GatewayReceipt) -> Self {
        let auth = receipt.authorization.as_ref();
        Self {
            user_id,
            provider: PROVIDER_PAYSTACK.to_string(),
            gateway_reference: receipt.reference.clone(),
            authorization_code: auth
                .map(|a| a.authorization_code.clone())
                .unwrap_or_else(|| Masked::new("unknown".to_string())),
            card_brand: auth
                .and_then(|a| a.brand.clone())
                .unwrap_or_else(|| "Card".to_string()),
            last4: auth
                .and_then(|a| a.last4.clone())
                .unwrap_or_else(|| "****".to_string()),
        }
    }

    pub fn into_method(self, id: Uuid, created_at: DateTime<Utc>) -> PaymentMethod {
        PaymentMethod {
            id,
            user_id: self.user_id,
            provider: self.provider,
            gateway_reference: self.gateway_reference,
            authorization_code: self.authorization_code,
            card_brand: self.card_brand,
            last4: self.last4,
            created_at,
        }
    }
}

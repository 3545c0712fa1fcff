use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use zurusasa_core::payment::{
    GatewayAuthorization, GatewayError, GatewayOutcome, GatewayReceipt, GatewayRequest,
    PaymentGateway,
};
use zurusasa_shared::pii::Masked;

pub const PAYSTACK_API_URL: &str = "https://api.paystack.co";

/// Delay before the saved-card mock reports success
pub const SIMULATED_CHARGE_DELAY: Duration = Duration::from_millis(1500);

/// Prefix carried by every reference the saved-card mock produces
pub const SIMULATED_REFERENCE_PREFIX: &str = "SIM_";

/// Something that can take money for a checkout attempt
#[async_trait]
pub trait ChargeProvider: Send + Sync {
    async fn charge(&self, request: &GatewayRequest) -> Result<GatewayOutcome, GatewayError>;

    /// True when no money actually moves.
    fn is_simulated(&self) -> bool {
        false
    }
}

/// New-card path: hands the attempt to the payment gateway
pub struct GatewayChargeProvider {
    gateway: Arc<dyn PaymentGateway>,
}

impl GatewayChargeProvider {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl ChargeProvider for GatewayChargeProvider {
    async fn charge(&self, request: &GatewayRequest) -> Result<GatewayOutcome, GatewayError> {
        self.gateway.collect(request).await
    }
}

/// Saved-card path.
///
/// There is no charge-by-authorization endpoint behind saved cards yet, so this
/// provider is a mock: it waits a fixed delay and reports a success carrying a
/// locally generated `SIM_` reference. No money moves. Once started it cannot
/// be cancelled.
pub struct SimulatedChargeProvider {
    delay: Duration,
}

impl SimulatedChargeProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedChargeProvider {
    fn default() -> Self {
        Self::new(SIMULATED_CHARGE_DELAY)
    }
}

#[async_trait]
impl ChargeProvider for SimulatedChargeProvider {
    async fn charge(&self, request: &GatewayRequest) -> Result<GatewayOutcome, GatewayError> {
        tracing::warn!(
            "Simulating saved-card charge of {} {} (minor units); no payment is taken",
            request.amount_minor,
            request.currency
        );
        tokio::time::sleep(self.delay).await;

        Ok(GatewayOutcome::Success(GatewayReceipt {
            reference: generate_reference(SIMULATED_REFERENCE_PREFIX),
            authorization: None,
        }))
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Builds a transaction reference: `{prefix}{unix millis}_{8 random chars}`
pub fn generate_reference(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("{}{}_{}", prefix, Utc::now().timestamp_millis(), suffix.to_uppercase())
}

/// Gateway whose outcome was already produced by the browser widget.
///
/// The widget calls back with either a receipt or a close; this adapter replays
/// that result to the controller.
pub struct ClientReportedGateway {
    receipt: Option<GatewayReceipt>,
}

impl ClientReportedGateway {
    pub fn success(receipt: GatewayReceipt) -> Self {
        Self { receipt: Some(receipt) }
    }

    pub fn closed() -> Self {
        Self { receipt: None }
    }
}

#[async_trait]
impl PaymentGateway for ClientReportedGateway {
    async fn collect(&self, request: &GatewayRequest) -> Result<GatewayOutcome, GatewayError> {
        match &self.receipt {
            Some(receipt) => {
                if receipt.reference != request.reference {
                    return Err(GatewayError::InvalidResponse(format!(
                        "receipt reference {} does not match transaction {}",
                        receipt.reference, request.reference
                    )));
                }
                Ok(GatewayOutcome::Success(receipt.clone()))
            }
            None => Ok(GatewayOutcome::Closed),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaystackVerifyResponse {
    pub status: bool,
    pub message: String,
    pub data: Option<PaystackTransaction>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaystackTransaction {
    pub status: String,
    pub reference: String,
    pub amount: i64,
    pub currency: String,
    pub authorization: Option<PaystackAuthorization>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaystackAuthorization {
    pub authorization_code: Option<String>,
    pub last4: Option<String>,
    pub brand: Option<String>,
    #[serde(default)]
    pub reusable: bool,
}

/// Server-side check of a widget transaction against the Paystack API
pub struct PaystackGateway {
    secret_key: String,
    base_url: String,
    client: Client,
}

impl PaystackGateway {
    pub fn new(secret_key: String, base_url: Option<String>) -> Result<Self, GatewayError> {
        if secret_key.trim().is_empty() {
            return Err(GatewayError::NotConfigured("PAYSTACK_SECRET_KEY".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            secret_key,
            base_url: base_url.unwrap_or_else(|| PAYSTACK_API_URL.to_string()),
            client,
        })
    }

    fn verify_url(&self, reference: &str) -> String {
        format!("{}/transaction/verify/{}", self.base_url.trim_end_matches('/'), reference)
    }

    /// Maps a verify response onto the widget's two callbacks.
    pub(crate) fn interpret(
        request: &GatewayRequest,
        response: PaystackVerifyResponse,
    ) -> Result<GatewayOutcome, GatewayError> {
        if !response.status {
            return Err(GatewayError::InvalidResponse(response.message));
        }
        let tx = response
            .data
            .ok_or_else(|| GatewayError::InvalidResponse("missing transaction data".to_string()))?;

        match tx.status.as_str() {
            "success" => {
                if tx.amount < request.amount_minor || !tx.currency.eq_ignore_ascii_case(&request.currency) {
                    return Err(GatewayError::InvalidResponse(format!(
                        "paid {} {} but checkout expected {} {}",
                        tx.amount, tx.currency, request.amount_minor, request.currency
                    )));
                }

                let authorization = tx.authorization.and_then(|a| {
                    let reusable = a.reusable;
                    let code = a.authorization_code.filter(|c| !c.is_empty() && reusable)?;
                    Some(GatewayAuthorization {
                        authorization_code: Masked::new(code),
                        last4: a.last4,
                        brand: a.brand,
                    })
                });

                Ok(GatewayOutcome::Success(GatewayReceipt {
                    reference: tx.reference,
                    authorization,
                }))
            }
            other => {
                tracing::info!("Transaction {} ended as '{}'", tx.reference, other);
                Ok(GatewayOutcome::Closed)
            }
        }
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn collect(&self, request: &GatewayRequest) -> Result<GatewayOutcome, GatewayError> {
        let response = self
            .client
            .get(self.verify_url(&request.reference))
            .header("Authorization", format!("Bearer {}", self.secret_key))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Rejected { status: status.as_u16(), body });
        }

        let body: PaystackVerifyResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Self::interpret(request, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> GatewayRequest {
        GatewayRequest {
            reference: "abc123".to_string(),
            email: "guest@example.com".to_string(),
            amount_minor: 500_000,
            currency: "KES".to_string(),
            public_key: "pk_test_x".to_string(),
        }
    }

    fn verify_body(status: &str, amount: i64) -> PaystackVerifyResponse {
        serde_json::from_value(json!({
            "status": true,
            "message": "Verification successful",
            "data": {
                "status": status,
                "reference": "abc123",
                "amount": amount,
                "currency": "KES",
                "authorization": {
                    "authorization_code": "AUTH_X",
                    "last4": "4242",
                    "brand": "Visa",
                    "reusable": true
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_interpret_success() {
        let outcome = PaystackGateway::interpret(&request(), verify_body("success", 500_000)).unwrap();
        match outcome {
            GatewayOutcome::Success(receipt) => {
                assert_eq!(receipt.reference, "abc123");
                let auth = receipt.authorization.unwrap();
                assert_eq!(auth.authorization_code.expose(), "AUTH_X");
                assert_eq!(auth.last4.as_deref(), Some("4242"));
            }
            GatewayOutcome::Closed => panic!("expected success"),
        }
    }

    #[test]
    fn test_interpret_abandoned_is_closed() {
        let outcome = PaystackGateway::interpret(&request(), verify_body("abandoned", 500_000)).unwrap();
        assert_eq!(outcome, GatewayOutcome::Closed);
    }

    #[test]
    fn test_interpret_underpaid() {
        let result = PaystackGateway::interpret(&request(), verify_body("success", 100));
        assert!(matches!(result, Err(GatewayError::InvalidResponse(_))));
    }

    #[test]
    fn test_verify_url() {
        let gateway = PaystackGateway::new("sk_test".to_string(), Some("http://localhost:9999/".to_string())).unwrap();
        assert_eq!(gateway.verify_url("abc123"), "http://localhost:9999/transaction/verify/abc123");
        assert!(PaystackGateway::new("  ".to_string(), None).is_err());
    }

    #[test]
    fn test_generated_reference() {
        let reference = generate_reference(SIMULATED_REFERENCE_PREFIX);
        assert!(reference.starts_with("SIM_"));
        assert_ne!(reference, generate_reference(SIMULATED_REFERENCE_PREFIX));
    }

    #[tokio::test]
    async fn test_client_reported_reference_mismatch() {
        let gateway = ClientReportedGateway::success(GatewayReceipt {
            reference: "other".to_string(),
            authorization: None,
        });
        assert!(gateway.collect(&request()).await.is_err());
        assert_eq!(
            ClientReportedGateway::closed().collect(&request()).await.unwrap(),
            GatewayOutcome::Closed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_charge_waits_and_prefixes() {
        let provider = SimulatedChargeProvider::default();
        let started = tokio::time::Instant::now();

        let outcome = provider.charge(&request()).await.unwrap();

        assert!(started.elapsed() >= SIMULATED_CHARGE_DELAY);
        assert!(provider.is_simulated());
        match outcome {
            GatewayOutcome::Success(receipt) => {
                assert!(receipt.reference.starts_with(SIMULATED_REFERENCE_PREFIX));
                assert!(receipt.authorization.is_none());
            }
            GatewayOutcome::Closed => panic!("simulated charge never closes"),
        }
    }
}

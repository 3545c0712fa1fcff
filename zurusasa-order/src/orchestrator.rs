use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;
use zurusasa_core::events::{publish_best_effort, EventSink};
use zurusasa_core::payment::{to_minor_units, GatewayError, GatewayOutcome, GatewayReceipt, GatewayRequest};
use zurusasa_core::repository::{BookingRepository, PaymentMethodRepository};
use zurusasa_core::{Booking, BookingStatus, NewBooking, NewPaymentMethod, RepositoryError, SessionContext};
use zurusasa_shared::models::events::{topics, BookingPaidEvent, PaymentMethodSavedEvent};
use zurusasa_shared::pii::mask_email;

use crate::charge::{generate_reference, ChargeProvider};

/// Prefix of references generated for new-card transactions
pub const CHECKOUT_REFERENCE_PREFIX: &str = "ZS_";

const ATTEMPT_KEY_NAMESPACE: Uuid = Uuid::from_u128(0x5a0b7c1e_2f4d_4e8a_9b63_d1c0aa57e2f4);

/// Idempotency key for an attempt the client did not tag, so one gateway
/// transaction maps to one booking however often its callback fires.
pub fn attempt_key_for(reference: &str) -> Uuid {
    Uuid::new_v5(&ATTEMPT_KEY_NAMESPACE, reference.as_bytes())
}

/// Which instrument the guest picked in the dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodSelection {
    /// Pay with a new card through the gateway widget.
    #[default]
    New,
    Saved(Uuid),
}

impl Serialize for MethodSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MethodSelection::New => serializer.serialize_str("new"),
            MethodSelection::Saved(id) => serializer.serialize_str(&id.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for MethodSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "new" {
            return Ok(MethodSelection::New);
        }
        Uuid::parse_str(&raw)
            .map(MethodSelection::Saved)
            .map_err(|_| serde::de::Error::custom(format!("expected \"new\" or a payment method id, got {}", raw)))
    }
}

/// What the caller passes into the checkout dialog
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub experience_id: Option<Uuid>,
    pub reel_id: Option<Uuid>,
    pub trip_title: String,
    /// Price in KES as shown on the listing
    pub amount: i64,
    pub guests: i32,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    /// Widget transaction reference for the new-card path
    pub reference: Option<String>,
    /// Stable per attempt; derived from the transaction reference when absent.
    pub idempotency_key: Option<Uuid>,
}

impl CheckoutRequest {
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if self.trip_title.trim().is_empty() {
            return Err(CheckoutError::Validation("trip title is required".to_string()));
        }
        if self.amount <= 0 {
            return Err(CheckoutError::Validation("amount must be positive".to_string()));
        }
        if to_minor_units(self.amount).is_none() {
            return Err(CheckoutError::Validation("amount is too large".to_string()));
        }
        if self.guests < 1 {
            return Err(CheckoutError::Validation("at least one guest is required".to_string()));
        }
        if let (Some(check_in), Some(check_out)) = (self.check_in, self.check_out) {
            if check_out <= check_in {
                return Err(CheckoutError::Validation("check-out must be after check-in".to_string()));
            }
        }
        Ok(())
    }

    /// Booking row for a successful charge. Missing dates default to now / now + 24h.
    pub fn to_new_booking(
        &self,
        user_id: Uuid,
        payment_reference: &str,
        idempotency_key: Uuid,
        now: DateTime<Utc>,
    ) -> NewBooking {
        let check_in = self.check_in.unwrap_or(now);
        let check_out = self.check_out.unwrap_or(check_in + Duration::hours(24));
        NewBooking {
            user_id,
            experience_id: self.experience_id,
            reel_id: self.reel_id,
            trip_title: self.trip_title.trim().to_string(),
            amount: self.amount,
            guests: self.guests,
            check_in,
            check_out,
            status: BookingStatus::Paid,
            payment_reference: payment_reference.to_string(),
            idempotency_key,
        }
    }
}

/// How a checkout attempt ended, as reported to the caller
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    Completed {
        booking: Booking,
        card_saved: bool,
        /// Set when the booking stands but a best-effort step failed.
        warning: Option<String>,
        /// The attempt had already been committed; nothing new was written.
        replayed: bool,
    },
    /// The payment window was closed before paying.
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Please sign in to complete your booking")]
    Unauthenticated,

    #[error("A payment is already in progress")]
    InProgress,

    #[error("Invalid checkout request: {0}")]
    Validation(String),

    #[error("Saved payment method not found")]
    UnknownPaymentMethod,

    #[error("This checkout was already completed with different details")]
    KeyConflict,

    #[error("Payment failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Booking failed: {0}")]
    BookingWrite(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Shared collaborators of every checkout dialog
#[derive(Clone)]
pub struct CheckoutServices {
    pub bookings: Arc<dyn BookingRepository>,
    pub payment_methods: Arc<dyn PaymentMethodRepository>,
    pub events: Arc<dyn EventSink>,
    pub public_key: String,
    pub currency: String,
}

/// Clears the loading flag however the attempt ends. The flag lives on one
/// dialog only; across requests the idempotency key is what stops a second
/// booking for the same payment.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, CheckoutError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CheckoutError::InProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One checkout dialog: the guest's method choice, the save-card toggle and
/// the loading flag, plus the ordered booking-then-card write sequence.
pub struct CheckoutController {
    services: CheckoutServices,
    new_card: Arc<dyn ChargeProvider>,
    saved_card: Arc<dyn ChargeProvider>,
    selected_method: MethodSelection,
    save_card: bool,
    loading: AtomicBool,
}

impl CheckoutController {
    pub fn new(
        services: CheckoutServices,
        new_card: Arc<dyn ChargeProvider>,
        saved_card: Arc<dyn ChargeProvider>,
    ) -> Self {
        Self {
            services,
            new_card,
            saved_card,
            selected_method: MethodSelection::New,
            save_card: false,
            loading: AtomicBool::new(false),
        }
    }

    pub fn select_method(&mut self, method: MethodSelection) {
        self.selected_method = method;
    }

    /// Only meaningful while a new card is selected.
    pub fn set_save_card(&mut self, save_card: bool) {
        self.save_card = save_card;
    }

    pub fn selected_method(&self) -> MethodSelection {
        self.selected_method
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Saved cards available to the signed-in guest
    pub async fn saved_methods(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<zurusasa_core::PaymentMethod>, CheckoutError> {
        Ok(self.services.payment_methods.list_payment_methods(session.user_id).await?)
    }

    /// The "Pay" button.
    pub async fn submit(
        &self,
        session: Option<&SessionContext>,
        request: &CheckoutRequest,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let session = session.ok_or(CheckoutError::Unauthenticated)?;
        request.validate()?;
        let _loading = LoadingGuard::acquire(&self.loading)?;

        let (provider, gateway_request) = match self.selected_method {
            MethodSelection::New => {
                let email = session
                    .email
                    .clone()
                    .filter(|e| !e.trim().is_empty())
                    .ok_or_else(|| CheckoutError::Validation("an email address is required for card payments".to_string()))?;
                let reference = request
                    .reference
                    .clone()
                    .unwrap_or_else(|| generate_reference(CHECKOUT_REFERENCE_PREFIX));
                (&self.new_card, self.gateway_request(reference, email, request.amount)?)
            }
            MethodSelection::Saved(method_id) => {
                self.ensure_owned(session, method_id).await?;
                let email = session.email.clone().unwrap_or_default();
                let reference = generate_reference(CHECKOUT_REFERENCE_PREFIX);
                (&self.saved_card, self.gateway_request(reference, email, request.amount)?)
            }
        };

        tracing::info!(
            "Checkout {} for {}: {} KES, {} guest(s), method {:?}",
            gateway_request.reference,
            mask_email(&gateway_request.email),
            request.amount,
            request.guests,
            self.selected_method
        );

        let receipt = match provider.charge(&gateway_request).await {
            Ok(GatewayOutcome::Success(receipt)) => receipt,
            Ok(GatewayOutcome::Closed) => {
                tracing::info!("Checkout {} closed before payment", gateway_request.reference);
                return Ok(CheckoutOutcome::Cancelled);
            }
            Err(e) => {
                tracing::error!("Checkout {} charge failed: {}", gateway_request.reference, e);
                return Err(e.into());
            }
        };

        let attempt_key = request
            .idempotency_key
            .unwrap_or_else(|| attempt_key_for(&receipt.reference));

        // Phase 1: the booking must be committed or the attempt fails.
        let new_booking = request.to_new_booking(session.user_id, &receipt.reference, attempt_key, Utc::now());
        let insert = self
            .services
            .bookings
            .create_booking(&new_booking)
            .await
            .map_err(|e| {
                tracing::error!("Checkout {} booking write failed: {}", attempt_key, e);
                CheckoutError::BookingWrite(e.to_string())
            })?;

        if insert.is_replay() {
            let booking = insert.into_booking();
            // Saved-card references are minted per call, so only new-card replays can match on it.
            let same_charge = booking.user_id == session.user_id
                && booking.amount == request.amount
                && (self.selected_method != MethodSelection::New || booking.payment_reference == receipt.reference);
            if !same_charge {
                tracing::warn!(
                    "Checkout {} collides with booking {} made for a different charge",
                    attempt_key,
                    booking.id
                );
                return Err(CheckoutError::KeyConflict);
            }
            tracing::info!("Checkout {} already committed as booking {}", attempt_key, booking.id);
            return Ok(CheckoutOutcome::Completed {
                booking,
                card_saved: false,
                warning: None,
                replayed: true,
            });
        }
        let booking = insert.into_booking();
        tracing::info!("Booking {} paid with reference {}", booking.id, booking.payment_reference);

        // Phase 2: best-effort card save, never rolls back the booking.
        let (card_saved, warning) = self.save_card_if_requested(session, &receipt).await;

        let event = BookingPaidEvent {
            booking_id: booking.id,
            user_id: booking.user_id,
            experience_id: booking.experience_id,
            amount: booking.amount,
            guests: booking.guests,
            payment_reference: booking.payment_reference.clone(),
            simulated: provider.is_simulated(),
            timestamp: Utc::now().timestamp(),
        };
        publish_best_effort(
            self.services.events.as_ref(),
            topics::BOOKING_PAID,
            &booking.id.to_string(),
            &event,
        )
        .await;

        Ok(CheckoutOutcome::Completed {
            booking,
            card_saved,
            warning,
            replayed: false,
        })
    }

    fn gateway_request(&self, reference: String, email: String, amount: i64) -> Result<GatewayRequest, CheckoutError> {
        let amount_minor = to_minor_units(amount)
            .ok_or_else(|| CheckoutError::Validation("amount is too large".to_string()))?;
        Ok(GatewayRequest {
            reference,
            email,
            amount_minor,
            currency: self.services.currency.clone(),
            public_key: self.services.public_key.clone(),
        })
    }

    async fn ensure_owned(&self, session: &SessionContext, method_id: Uuid) -> Result<(), CheckoutError> {
        match self.services.payment_methods.get_payment_method(method_id).await? {
            Some(method) if method.user_id == session.user_id => Ok(()),
            _ => Err(CheckoutError::UnknownPaymentMethod),
        }
    }

    async fn save_card_if_requested(
        &self,
        session: &SessionContext,
        receipt: &GatewayReceipt,
    ) -> (bool, Option<String>) {
        if self.selected_method != MethodSelection::New || !self.save_card {
            return (false, None);
        }

        let method = NewPaymentMethod::from_receipt(session.user_id, receipt);
        match self.services.payment_methods.create_payment_method(&method).await {
            Ok(saved) => {
                tracing::info!("Saved {} card ending {} for user {}", saved.card_brand, saved.last4, saved.user_id);
                let event = PaymentMethodSavedEvent {
                    payment_method_id: saved.id,
                    user_id: saved.user_id,
                    card_brand: saved.card_brand.clone(),
                    timestamp: Utc::now().timestamp(),
                };
                publish_best_effort(
                    self.services.events.as_ref(),
                    topics::PAYMENT_METHOD_SAVED,
                    &saved.id.to_string(),
                    &event,
                )
                .await;
                (true, None)
            }
            Err(e) => {
                tracing::warn!("Booking kept but card save failed for user {}: {}", session.user_id, e);
                (false, Some(format!("Your booking is confirmed, but we couldn't save your card: {}", e)))
            }
        }
    }
}

use uuid::Uuid;

/// Published on `booking.paid` once the booking row is committed.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingPaidEvent {
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub experience_id: Option<Uuid>,
    pub amount: i64,
    pub guests: i32,
    pub payment_reference: String,
    pub simulated: bool,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingStatusChangedEvent {
    pub booking_id: Uuid,
    pub actor_id: Uuid,
    pub from: String,
    pub to: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PaymentMethodSavedEvent {
    pub payment_method_id: Uuid,
    pub user_id: Uuid,
    pub card_brand: String,
    pub timestamp: i64,
}

pub mod topics {
    pub const BOOKING_PAID: &str = "booking.paid";
    pub const BOOKING_STATUS_CHANGED: &str = "booking.status_changed";
    pub const PAYMENT_METHOD_SAVED: &str = "payment_method.saved";
}

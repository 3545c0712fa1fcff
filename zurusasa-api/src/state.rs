use std::sync::Arc;
use std::time::Duration;
use zurusasa_core::events::{EventSink, NoopEventSink};
use zurusasa_core::memory::{MemoryBookings, MemoryCatalog, MemoryPaymentMethods};
use zurusasa_core::repository::{
    BookingRepository, ExperienceRepository, PaymentMethodRepository, ProfileRepository,
    ReelRepository,
};
use zurusasa_core::PaymentGateway;
use zurusasa_mail::{Mailer, MemoryMailer};
use zurusasa_order::{BookingManager, CheckoutServices};
use zurusasa_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub audience: String,
}

#[derive(Clone)]
pub struct PaymentSettings {
    pub public_key: String,
    pub currency: String,
    pub simulated_charge_delay: Duration,
}

#[derive(Clone)]
pub struct MailSettings {
    pub from: String,
    pub app_url: String,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<dyn BookingRepository>,
    pub payment_methods: Arc<dyn PaymentMethodRepository>,
    pub experiences: Arc<dyn ExperienceRepository>,
    pub reels: Arc<dyn ReelRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub events: Arc<dyn EventSink>,
    pub mailer: Arc<dyn Mailer>,
    /// Server-side transaction verification; `None` trusts the widget callback.
    pub gateway: Option<Arc<dyn PaymentGateway>>,
    pub redis: Option<Arc<RedisClient>>,
    pub rate_limit_per_minute: i64,
    pub auth: AuthConfig,
    pub payments: PaymentSettings,
    pub mail: MailSettings,
}

impl AppState {
    /// State backed entirely by in-memory stores, with no Redis, event bus or
    /// gateway verification.
    pub fn in_memory(auth: AuthConfig) -> Self {
        let catalog = Arc::new(MemoryCatalog::new());
        Self {
            bookings: Arc::new(MemoryBookings::new()),
            payment_methods: Arc::new(MemoryPaymentMethods::new()),
            experiences: catalog.clone(),
            reels: catalog.clone(),
            profiles: catalog,
            events: Arc::new(NoopEventSink),
            mailer: Arc::new(MemoryMailer::new()),
            gateway: None,
            redis: None,
            rate_limit_per_minute: 100,
            auth,
            payments: PaymentSettings {
                public_key: String::new(),
                currency: zurusasa_core::payment::DEFAULT_CURRENCY.to_string(),
                simulated_charge_delay: zurusasa_order::charge::SIMULATED_CHARGE_DELAY,
            },
            mail: MailSettings {
                from: "ZuruSasa <hello@zurusasa.com>".to_string(),
                app_url: "http://localhost:5173".to_string(),
            },
        }
    }

    pub fn checkout_services(&self) -> CheckoutServices {
        CheckoutServices {
            bookings: self.bookings.clone(),
            payment_methods: self.payment_methods.clone(),
            events: self.events.clone(),
            public_key: self.payments.public_key.clone(),
            currency: self.payments.currency.clone(),
        }
    }

    pub fn booking_manager(&self) -> BookingManager {
        BookingManager::new(self.bookings.clone(), self.experiences.clone(), self.events.clone())
    }
}

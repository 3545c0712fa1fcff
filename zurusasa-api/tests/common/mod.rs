#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;
use zurusasa_api::middleware::auth::{AppMetadata, SessionClaims};
use zurusasa_api::state::AuthConfig;
use zurusasa_api::{app, AppState};
use zurusasa_catalog::{Category, Experience};
use zurusasa_core::memory::{MemoryBookings, MemoryCatalog, MemoryEventSink, MemoryPaymentMethods};
use zurusasa_core::repository::ExperienceRepository;
use zurusasa_mail::MemoryMailer;

pub const JWT_SECRET: &str = "integration-test-secret";

pub struct Harness {
    pub state: AppState,
    pub bookings: Arc<MemoryBookings>,
    pub payment_methods: Arc<MemoryPaymentMethods>,
    pub catalog: Arc<MemoryCatalog>,
    pub events: Arc<MemoryEventSink>,
    pub mailer: Arc<MemoryMailer>,
}

impl Harness {
    pub fn new() -> Self {
        let bookings = Arc::new(MemoryBookings::new());
        let payment_methods = Arc::new(MemoryPaymentMethods::new());
        let catalog = Arc::new(MemoryCatalog::new());
        let events = Arc::new(MemoryEventSink::new());
        let mailer = Arc::new(MemoryMailer::new());

        let mut state = AppState::in_memory(AuthConfig {
            secret: JWT_SECRET.to_string(),
            audience: "authenticated".to_string(),
        });
        state.bookings = bookings.clone();
        state.payment_methods = payment_methods.clone();
        state.experiences = catalog.clone();
        state.reels = catalog.clone();
        state.profiles = catalog.clone();
        state.events = events.clone();
        state.mailer = mailer.clone();
        state.payments.public_key = "pk_test_zurusasa".to_string();
        state.payments.simulated_charge_delay = Duration::ZERO;
        state.mail.app_url = "https://zurusasa.com".to_string();

        Self { state, bookings, payment_methods, catalog, events, mailer }
    }

    pub async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app(self.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn seed_experience(&self, host_id: Uuid, category: Category) -> Experience {
        let experience = Experience {
            id: Uuid::new_v4(),
            user_id: host_id,
            category,
            title: "Diani beach villa".to_string(),
            location: "Diani".to_string(),
            current_price: 12000,
            base_price: Some(15000),
            price_unit: "night".to_string(),
            metadata: json!({"bedrooms": 3}),
            image_url: None,
            created_at: Utc::now(),
        };
        self.catalog.create_experience(&experience).await.unwrap();
        experience
    }
}

pub struct User {
    pub id: Uuid,
    pub token: String,
}

pub fn guest() -> User {
    user(Some("guest@example.com"), None)
}

pub fn host() -> User {
    user(Some("host@example.com"), Some("host"))
}

pub fn user(email: Option<&str>, role: Option<&str>) -> User {
    let id = Uuid::new_v4();
    let claims = SessionClaims {
        sub: id.to_string(),
        email: email.map(str::to_string),
        aud: "authenticated".to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
        app_metadata: AppMetadata { role: role.map(str::to_string) },
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap();
    User { id, token }
}

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zurusasa_api::{
    app,
    state::{AppState, AuthConfig, MailSettings, PaymentSettings},
};
use zurusasa_core::events::{EventSink, NoopEventSink};
use zurusasa_core::PaymentGateway;
use zurusasa_mail::{ResendClient, ResendSettings};
use zurusasa_order::PaystackGateway;
use zurusasa_store::{
    DbClient, EventProducer, RedisClient, StoreBookingRepository, StoreCatalogRepository,
    StorePaymentMethodRepository,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zurusasa_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = zurusasa_store::Config::load().context("Failed to load config")?;
    tracing::info!("Starting ZuruSasa API on port {}", config.server.port);

    let mut state = AppState::in_memory(AuthConfig {
        secret: config.auth.jwt_secret.clone(),
        audience: config.auth.jwt_audience.clone(),
    });

    // Postgres
    match &config.database.url {
        Some(url) => {
            let db = DbClient::new(url).await.context("Failed to connect to Postgres")?;
            if config.database.run_migrations {
                db.migrate().await.context("Failed to run migrations")?;
            }
            let catalog = Arc::new(StoreCatalogRepository::new(db.pool.clone()));
            state.bookings = Arc::new(StoreBookingRepository::new(db.pool.clone()));
            state.payment_methods = Arc::new(StorePaymentMethodRepository::new(db.pool.clone()));
            state.experiences = catalog.clone();
            state.reels = catalog.clone();
            state.profiles = catalog;
        }
        None => tracing::warn!("No database configured, using in-memory storage"),
    }

    // Redis Connection
    if let Some(redis) = &config.redis {
        let client = RedisClient::new(&redis.url).await.context("Failed to connect to Redis")?;
        state.redis = Some(Arc::new(client));
    }

    // Kafka Connection
    state.events = match &config.kafka {
        Some(kafka) => {
            let producer = EventProducer::new(&kafka.brokers).context("Failed to create Kafka producer")?;
            Arc::new(producer) as Arc<dyn EventSink>
        }
        None => Arc::new(NoopEventSink),
    };

    // Payments
    if let Some(secret_key) = &config.payments.secret_key {
        let gateway = PaystackGateway::new(secret_key.clone(), config.payments.base_url.clone())
            .context("Failed to create payment gateway client")?;
        state.gateway = Some(Arc::new(gateway) as Arc<dyn PaymentGateway>);
    } else {
        tracing::warn!("PAYSTACK_SECRET_KEY not set; widget results are not verified server-side");
    }
    state.payments = PaymentSettings {
        public_key: config.payments.public_key.clone(),
        currency: config.payments.currency.clone(),
        simulated_charge_delay: Duration::from_millis(config.payments.simulated_charge_delay_ms),
    };

    // Email
    let mailer = ResendClient::new(ResendSettings {
        api_key: config.mail.resend_api_key.clone(),
        audience_id: config.mail.audience_id.clone(),
        base_url: config.mail.base_url.clone(),
    })
    .context("Failed to create email client")?;
    state.mailer = Arc::new(mailer);
    state.mail = MailSettings {
        from: config.mail.from.clone(),
        app_url: config.mail.app_url.clone(),
    };
    state.rate_limit_per_minute = config.server.rate_limit_per_minute;

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>()
    ).await?;

    Ok(())
}

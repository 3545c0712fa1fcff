use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub kafka: Option<KafkaConfig>,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: i64,
}

fn default_rate_limit() -> i64 {
    100
}

/// No URL means the in-memory repositories are used.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    #[serde(default)]
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_audience")]
    pub jwt_audience: String,
    /// Hosted platform URL, used as the expected token issuer when set
    pub platform_url: Option<String>,
}

fn default_audience() -> String {
    "authenticated".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    /// Publishable key handed to the browser widget
    #[serde(default)]
    pub public_key: String,
    /// Server key for transaction verification. Without it the widget's own
    /// callback is trusted.
    pub secret_key: Option<String>,
    pub base_url: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_simulated_delay")]
    pub simulated_charge_delay_ms: u64,
}

fn default_currency() -> String {
    "KES".to_string()
}

fn default_simulated_delay() -> u64 {
    1500
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub resend_api_key: Option<String>,
    pub audience_id: Option<String>,
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default = "default_app_url")]
    pub app_url: String,
    pub base_url: Option<String>,
}

fn default_from() -> String {
    "ZuruSasa <hello@zurusasa.com>".to_string()
}

fn default_app_url() -> String {
    "https://zurusasa.com".to_string()
}

/// Hosted-platform variables that map straight onto config keys
const PLATFORM_ENV: &[(&str, &str)] = &[
    ("RESEND_API_KEY", "mail.resend_api_key"),
    ("RESEND_AUDIENCE_ID", "mail.audience_id"),
    ("EMAIL_FROM", "mail.from"),
    ("APP_URL", "mail.app_url"),
    ("SUPABASE_URL", "auth.platform_url"),
    ("PAYSTACK_SECRET_KEY", "payments.secret_key"),
    ("VITE_PAYSTACK_PUBLIC_KEY", "payments.public_key"),
];

type Builder = config::ConfigBuilder<config::builder::DefaultState>;

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `ZURUSASA__SERVER__PORT=8080`
            .add_source(config::Environment::with_prefix("ZURUSASA").separator("__"));

        Self::with_platform_env(builder, |name| env::var(name).ok())?
            .build()?
            .try_deserialize()
    }

    fn with_platform_env<F>(mut builder: Builder, lookup: F) -> Result<Builder, config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (var, key) in PLATFORM_ENV {
            let value = lookup(var).filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(*key, value)?;
        }
        Ok(builder)
    }
}

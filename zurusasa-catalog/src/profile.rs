use serde::{Deserialize, Serialize};
use uuid::Uuid;
use std::str::FromStr;

use crate::CatalogError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Guest,
    Host,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Guest => "guest",
            UserRole::Host => "host",
        }
    }
}

impl FromStr for UserRole {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(UserRole::Guest),
            "host" => Ok(UserRole::Host),
            other => Err(CatalogError::UnknownValue {
                field: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Extended user record layered over the auth identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub role: UserRole,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub verification_status: Option<String>,
    #[serde(default)]
    pub notification_settings: serde_json::Value,
    #[serde(default)]
    pub security_settings: serde_json::Value,
    #[serde(default)]
    pub languages: Vec<String>,
    pub emergency_contact: Option<String>,
    pub business_name: Option<String>,
    pub id_number: Option<String>,
}

impl Profile {
    pub fn newsletter_opt_in(&self) -> bool {
        newsletter_opt_in(&self.notification_settings)
    }

    pub fn is_verified(&self) -> bool {
        self.verification_status.as_deref() == Some("verified")
    }
}

/// Reads `newsletter` out of a notification settings blob; absent means opted out.
pub fn newsletter_opt_in(settings: &serde_json::Value) -> bool {
    settings
        .get("newsletter")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zurusasa_catalog::UserRole;

/// Which side of the app the user is currently looking at. Hosts can browse
/// as guests without changing their role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Guest,
    Host,
}

/// Per-request session derived from the platform's access token. Passed
/// explicitly to every handler and controller instead of living in a global.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: UserRole,
    pub view_mode: ViewMode,
}

impl SessionContext {
    pub fn new(user_id: Uuid, email: Option<String>, role: UserRole) -> Self {
        let view_mode = match role {
            UserRole::Host => ViewMode::Host,
            UserRole::Guest => ViewMode::Guest,
        };
        Self { user_id, email, role, view_mode }
    }

    pub fn with_view_mode(mut self, view_mode: ViewMode) -> Self {
        // Guests never get the host dashboard.
        self.view_mode = if self.role == UserRole::Host { view_mode } else { ViewMode::Guest };
        self
    }

    pub fn is_host(&self) -> bool {
        self.role == UserRole::Host
    }
}

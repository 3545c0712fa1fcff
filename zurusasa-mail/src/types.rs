use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single transactional email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
}

impl EmailMessage {
    pub fn validate(&self) -> MailResult<()> {
        if self.to.is_empty() || self.to.iter().any(|to| !looks_like_email(to)) {
            return Err(MailError::InvalidRequest("a valid recipient email is required".to_string()));
        }
        if self.subject.trim().is_empty() {
            return Err(MailError::InvalidRequest("subject is required".to_string()));
        }
        if self.html.is_none() && self.text.is_none() {
            return Err(MailError::InvalidRequest("html or text body is required".to_string()));
        }
        Ok(())
    }
}

/// Marketing audience member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub unsubscribed: bool,
}

impl Contact {
    /// Splits a profile's full name into first / last.
    pub fn from_full_name(email: &str, full_name: Option<&str>) -> Self {
        let mut parts = full_name.unwrap_or_default().split_whitespace();
        let first_name = parts.next().map(str::to_string);
        let rest: Vec<&str> = parts.collect();
        let last_name = if rest.is_empty() { None } else { Some(rest.join(" ")) };
        Self {
            email: email.to_string(),
            first_name,
            last_name,
            unsubscribed: false,
        }
    }
}

/// Email sent to every contact in the audience
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    pub name: Option<String>,
    pub from: String,
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum MailError {
    #[error("{0} is not configured")]
    MissingConfig(&'static str),

    #[error("Invalid email request: {0}")]
    InvalidRequest(String),

    #[error("Email API request failed: {0}")]
    Send(String),

    #[error("Email API error ({status}): {body}")]
    Api { status: u16, body: String },
}

pub type MailResult<T> = Result<T, MailError>;

/// Email provider operations used by the serverless functions
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one email and returns the provider's message id.
    async fn send_email(&self, message: &EmailMessage) -> MailResult<String>;

    /// Adds (or re-subscribes) a contact in the configured audience.
    async fn add_contact(&self, contact: &Contact) -> MailResult<()>;

    async fn remove_contact(&self, email: &str) -> MailResult<()>;

    /// Creates a broadcast for the configured audience and returns its id.
    async fn create_broadcast(&self, broadcast: &Broadcast) -> MailResult<String>;

    async fn send_broadcast(&self, broadcast_id: &str) -> MailResult<()>;
}

pub(crate) fn looks_like_email(value: &str) -> bool {
    match value.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

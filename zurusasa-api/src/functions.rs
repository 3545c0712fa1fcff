use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use zurusasa_catalog::newsletter_opt_in;
use zurusasa_mail::templates::{render, render_broadcast};
use zurusasa_mail::{Broadcast, Contact, EmailKind, EmailMessage};
use zurusasa_shared::pii::mask_email;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub email: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBroadcastRequest {
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
    pub from: Option<String>,
    #[serde(default)]
    pub use_template: bool,
    #[serde(default)]
    pub template_data: Value,
    pub email_type: Option<String>,
}

/// Database webhook payload for a `profiles` change
#[derive(Debug, Deserialize)]
pub struct ProfileWebhook {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub record: Option<ProfileRecord>,
    pub old_record: Option<ProfileRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRecord {
    pub email: Option<String>,
    pub full_name: Option<String>,
    #[serde(default)]
    pub notification_settings: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactAction {
    Added,
    Removed,
    Unchanged,
}

impl ContactAction {
    /// Only a change in the newsletter flag touches the audience.
    pub fn for_change(was_opted_in: bool, is_opted_in: bool) -> Self {
        match (was_opted_in, is_opted_in) {
            (false, true) => ContactAction::Added,
            (true, false) => ContactAction::Removed,
            _ => ContactAction::Unchanged,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/functions/v1/send-email", post(send_email))
        .route("/functions/v1/send-broadcast", post(send_broadcast))
        .route("/functions/v1/sync-resend-contacts", post(sync_contacts))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /functions/v1/send-email
pub async fn send_email(
    State(state): State<AppState>,
    payload: Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(req) = payload?;
    let kind: EmailKind = req.kind.parse()?;
    let rendered = render(kind, &req.data, &state.mail.app_url)?;

    let message = EmailMessage {
        from: state.mail.from.clone(),
        to: vec![req.email.trim().to_string()],
        subject: rendered.subject,
        html: Some(rendered.html),
        text: None,
    };
    let id = state.mailer.send_email(&message).await?;
    tracing::info!("{:?} email sent to {} ({})", kind, mask_email(&req.email), id);

    Ok(Json(json!({
        "success": true,
        "message": "Email sent successfully",
        "id": id,
    })))
}

/// POST /functions/v1/send-broadcast
/// Sends one email to every contact in the newsletter audience
pub async fn send_broadcast(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SendBroadcastRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    if !headers.contains_key(header::AUTHORIZATION) {
        return Err(AppError::AuthenticationError("Missing authorization header".to_string()));
    }
    let Json(req) = payload?;

    if req.subject.trim().is_empty() {
        return Err(AppError::ValidationError("subject is required".to_string()));
    }
    let html = if req.use_template {
        Some(render_broadcast(&req.subject, &req.template_data, &state.mail.app_url))
    } else {
        req.html
    };
    if html.is_none() && req.text.is_none() {
        return Err(AppError::ValidationError(
            "Either html, text or useTemplate is required".to_string(),
        ));
    }

    let email_type = req.email_type.unwrap_or_else(|| "newsletter".to_string());
    let broadcast = Broadcast {
        name: Some(format!("{}: {}", email_type, req.subject)),
        from: req.from.unwrap_or_else(|| state.mail.from.clone()),
        subject: req.subject,
        html,
        text: req.text,
    };

    let broadcast_id = state.mailer.create_broadcast(&broadcast).await?;
    state.mailer.send_broadcast(&broadcast_id).await?;
    tracing::info!("Broadcast {} ({}) sent", broadcast_id, email_type);

    Ok(Json(json!({
        "success": true,
        "broadcastId": broadcast_id,
    })))
}

/// POST /functions/v1/sync-resend-contacts
/// Keeps the newsletter audience in step with profile preferences
pub async fn sync_contacts(
    State(state): State<AppState>,
    payload: Result<Json<ProfileWebhook>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(payload) = payload?;
    let was_opted_in = payload
        .old_record
        .as_ref()
        .map(|r| newsletter_opt_in(&r.notification_settings))
        .unwrap_or(false);
    let is_opted_in = payload
        .record
        .as_ref()
        .map(|r| newsletter_opt_in(&r.notification_settings))
        .unwrap_or(false);

    let action = ContactAction::for_change(was_opted_in, is_opted_in);
    match action {
        ContactAction::Added => {
            let record = payload.record.as_ref();
            let email = record_email(record)?;
            let contact = Contact::from_full_name(email, record.and_then(|r| r.full_name.as_deref()));
            state.mailer.add_contact(&contact).await?;
        }
        ContactAction::Removed => {
            // A delete has no new record; the old one still carries the address.
            let email = record_email(payload.record.as_ref()).or_else(|_| record_email(payload.old_record.as_ref()))?;
            state.mailer.remove_contact(email).await?;
        }
        ContactAction::Unchanged => {}
    }

    tracing::info!(
        "Newsletter sync ({}): {:?}",
        payload.event_type.as_deref().unwrap_or("UPDATE"),
        action
    );

    Ok(Json(json!({
        "success": true,
        "action": action,
    })))
}

fn record_email(record: Option<&ProfileRecord>) -> Result<&str, AppError> {
    record
        .and_then(|r| r.email.as_deref())
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::ValidationError("Profile record has no email".to_string()))
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::types::{MailError, MailResult};

/// Transactional email types accepted by `send-email`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    Welcome,
    Verification,
    ResetPassword,
    LoginAlert,
    Security,
    Support,
}

impl FromStr for EmailKind {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "welcome" => Ok(EmailKind::Welcome),
            "verification" => Ok(EmailKind::Verification),
            "reset_password" => Ok(EmailKind::ResetPassword),
            "login_alert" => Ok(EmailKind::LoginAlert),
            "security" => Ok(EmailKind::Security),
            "support" => Ok(EmailKind::Support),
            other => Err(MailError::InvalidRequest(format!("unknown email type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// Renders one transactional email from the caller's `data` object.
pub fn render(kind: EmailKind, data: &Value, app_url: &str) -> MailResult<RenderedEmail> {
    let name = field(data, &["name", "full_name", "fullName"]).unwrap_or_else(|| "there".to_string());
    let greeting = format!("<p>Hi {},</p>", escape_html(&name));

    let (subject, body) = match kind {
        EmailKind::Welcome => (
            "Welcome to ZuruSasa 🌴".to_string(),
            format!(
                "{}<p>Karibu! Your account is ready. Scroll through reels of villas, dhow cruises, \
                 seafood spots and coastal adventures, then book in a couple of taps.</p>{}",
                greeting,
                button(app_url, "Start exploring")
            ),
        ),
        EmailKind::Verification => {
            let code = field(data, &["code", "otp"]);
            let link = field(data, &["link", "verificationUrl", "verification_url"]);
            let action = match (code, link) {
                (Some(code), _) => format!(
                    "<p>Your verification code is:</p><p style=\"font-size:28px;letter-spacing:6px;font-weight:bold\">{}</p>",
                    escape_html(&code)
                ),
                (None, Some(link)) => button(&link, "Verify email"),
                (None, None) => {
                    return Err(MailError::InvalidRequest(
                        "verification email needs a code or link".to_string(),
                    ))
                }
            };
            (
                "Verify your email address".to_string(),
                format!("{}<p>Confirm this address to finish setting up your account.</p>{}", greeting, action),
            )
        }
        EmailKind::ResetPassword => {
            let link = field(data, &["link", "resetLink", "reset_link"]).ok_or_else(|| {
                MailError::InvalidRequest("reset_password email needs a link".to_string())
            })?;
            (
                "Reset your ZuruSasa password".to_string(),
                format!(
                    "{}<p>We received a request to reset your password. The link expires in one hour.</p>{}\
                     <p>If you didn't ask for this, you can ignore this email.</p>",
                    greeting,
                    button(&link, "Reset password")
                ),
            )
        }
        EmailKind::LoginAlert => {
            let device = field(data, &["device", "userAgent"]).unwrap_or_else(|| "Unknown device".to_string());
            let location = field(data, &["location"]).unwrap_or_else(|| "Unknown location".to_string());
            let time = field(data, &["time", "timestamp"]).unwrap_or_else(|| "just now".to_string());
            (
                "New sign-in to your ZuruSasa account".to_string(),
                format!(
                    "{}<p>Your account was just signed in to:</p><ul><li>Device: {}</li><li>Location: {}</li>\
                     <li>Time: {}</li></ul><p>Not you? Change your password right away.</p>{}",
                    greeting,
                    escape_html(&device),
                    escape_html(&location),
                    escape_html(&time),
                    button(&format!("{}/settings/security", app_url), "Review security")
                ),
            )
        }
        EmailKind::Security => {
            let message = field(data, &["message", "action"])
                .unwrap_or_else(|| "A security setting on your account was changed.".to_string());
            let subject = field(data, &["subject"]).unwrap_or_else(|| "Security update on your account".to_string());
            (
                subject,
                format!(
                    "{}<p>{}</p><p>If this wasn't you, contact support immediately.</p>{}",
                    greeting,
                    escape_html(&message),
                    button(&format!("{}/settings/security", app_url), "Review security")
                ),
            )
        }
        EmailKind::Support => {
            let topic = field(data, &["subject", "topic"]).unwrap_or_else(|| "your request".to_string());
            let message = field(data, &["message"]).unwrap_or_default();
            let ticket = field(data, &["ticketId", "ticket_id"]);
            let subject = match &ticket {
                Some(id) => format!("We received your support request [#{}]", id),
                None => "We received your support request".to_string(),
            };
            (
                subject,
                format!(
                    "{}<p>Thanks for reaching out about <strong>{}</strong>. Our team replies within 24 hours.</p>\
                     <blockquote style=\"border-left:3px solid #0ea5e9;padding-left:12px;color:#475569\">{}</blockquote>",
                    greeting,
                    escape_html(&topic),
                    escape_html(&message)
                ),
            )
        }
    };

    Ok(RenderedEmail {
        html: layout(&subject, &body, app_url),
        subject,
    })
}

/// Wraps free-form broadcast content (`useTemplate`) in the branded layout.
pub fn render_broadcast(subject: &str, template_data: &Value, app_url: &str) -> String {
    let heading = field(template_data, &["heading", "title"]).unwrap_or_else(|| subject.to_string());
    let content = field(template_data, &["content", "body", "message"]).unwrap_or_default();
    let cta = match (
        field(template_data, &["ctaUrl", "cta_url"]),
        field(template_data, &["ctaText", "cta_text"]),
    ) {
        (Some(url), Some(text)) => button(&url, &text),
        (Some(url), None) => button(&url, "Explore now"),
        _ => String::new(),
    };

    let body = format!(
        "<h2 style=\"margin-top:0\">{}</h2><p>{}</p>{}\
         <p style=\"font-size:12px;color:#94a3b8\">You're receiving this because you opted in to ZuruSasa news. \
         <a href=\"{{{{{{RESEND_UNSUBSCRIBE_URL}}}}}}\">Unsubscribe</a></p>",
        escape_html(&heading),
        escape_html(&content),
        cta
    );
    layout(subject, &body, app_url)
}

fn layout(title: &str, body: &str, app_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>{title}</title></head>
<body style="margin:0;background:#f1f5f9;font-family:Helvetica,Arial,sans-serif;color:#0f172a">
<table width="100%" cellpadding="0" cellspacing="0"><tr><td align="center" style="padding:24px">
<table width="560" cellpadding="0" cellspacing="0" style="background:#ffffff;border-radius:16px;overflow:hidden">
<tr><td style="background:linear-gradient(135deg,#0ea5e9,#f97316);padding:24px;color:#ffffff;font-size:24px;font-weight:bold">ZuruSasa</td></tr>
<tr><td style="padding:24px;font-size:15px;line-height:1.6">{body}</td></tr>
<tr><td style="padding:16px 24px;font-size:12px;color:#64748b;border-top:1px solid #e2e8f0">
Experiences along the Kenyan coast &middot; <a href="{app_url}" style="color:#0ea5e9">{app_url}</a>
</td></tr>
</table>
</td></tr></table>
</body>
</html>"#,
        title = escape_html(title),
        body = body,
        app_url = escape_html(app_url),
    )
}

fn button(href: &str, label: &str) -> String {
    format!(
        "<p><a href=\"{}\" style=\"display:inline-block;background:#0ea5e9;color:#ffffff;padding:12px 20px;\
         border-radius:8px;text-decoration:none;font-weight:bold\">{}</a></p>",
        escape_html(href),
        escape_html(label)
    )
}

/// First non-empty string (or number) among `keys`.
fn field(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match data.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

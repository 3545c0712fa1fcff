use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use zurusasa_shared::pii::mask_email;

use crate::types::{Broadcast, Contact, EmailMessage, MailError, MailResult, Mailer};

pub const RESEND_API_URL: &str = "https://api.resend.com";

#[derive(Debug, Clone, Default)]
pub struct ResendSettings {
    pub api_key: Option<String>,
    pub audience_id: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CreateContactRequest<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<&'a str>,
    unsubscribed: bool,
}

#[derive(Debug, Serialize)]
struct CreateBroadcastRequest<'a> {
    audience_id: &'a str,
    from: &'a str,
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

/// Email provider client over the Resend REST API
pub struct ResendClient {
    settings: ResendSettings,
    client: Client,
}

impl ResendClient {
    pub fn new(settings: ResendSettings) -> MailResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MailError::Send(e.to_string()))?;
        Ok(Self::with_client(settings, client))
    }

    pub fn with_client(settings: ResendSettings, client: Client) -> Self {
        Self { settings, client }
    }

    fn api_key(&self) -> MailResult<&str> {
        self.settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(MailError::MissingConfig("RESEND_API_KEY"))
    }

    fn audience_id(&self) -> MailResult<&str> {
        self.settings
            .audience_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or(MailError::MissingConfig("RESEND_AUDIENCE_ID"))
    }

    fn url(&self, path: &str) -> String {
        let base = self.settings.base_url.as_deref().unwrap_or(RESEND_API_URL);
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> MailResult<RequestBuilder> {
        let key = self.api_key()?;
        Ok(self
            .client
            .request(method, self.url(path))
            .header("Authorization", format!("Bearer {}", key)))
    }

    async fn execute(request: RequestBuilder) -> MailResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| MailError::Send(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MailError::Api { status: status.as_u16(), body });
        }
        Ok(response)
    }

    async fn execute_for_id(request: RequestBuilder) -> MailResult<String> {
        let response = Self::execute(request).await?;
        let body: IdResponse = response
            .json()
            .await
            .map_err(|e| MailError::Send(format!("unexpected response: {}", e)))?;
        Ok(body.id)
    }
}

#[async_trait]
impl Mailer for ResendClient {
    async fn send_email(&self, message: &EmailMessage) -> MailResult<String> {
        message.validate()?;
        let body = SendEmailRequest {
            from: &message.from,
            to: &message.to,
            subject: &message.subject,
            html: message.html.as_deref(),
            text: message.text.as_deref(),
        };
        let request = self.request(Method::POST, "/emails")?.json(&body);
        let id = Self::execute_for_id(request).await?;

        let recipients: Vec<String> = message.to.iter().map(|to| mask_email(to)).collect();
        tracing::info!("Sent email '{}' to {:?} ({})", message.subject, recipients, id);
        Ok(id)
    }

    async fn add_contact(&self, contact: &Contact) -> MailResult<()> {
        let audience = self.audience_id()?;
        let body = CreateContactRequest {
            email: &contact.email,
            first_name: contact.first_name.as_deref(),
            last_name: contact.last_name.as_deref(),
            unsubscribed: contact.unsubscribed,
        };
        let request = self
            .request(Method::POST, &format!("/audiences/{}/contacts", audience))?
            .json(&body);
        Self::execute(request).await?;

        tracing::info!("Added {} to audience {}", mask_email(&contact.email), audience);
        Ok(())
    }

    async fn remove_contact(&self, email: &str) -> MailResult<()> {
        let audience = self.audience_id()?;
        let request = self.request(
            Method::DELETE,
            &format!("/audiences/{}/contacts/{}", audience, email),
        )?;
        Self::execute(request).await?;

        tracing::info!("Removed {} from audience {}", mask_email(email), audience);
        Ok(())
    }

    async fn create_broadcast(&self, broadcast: &Broadcast) -> MailResult<String> {
        let audience = self.audience_id()?;
        if broadcast.html.is_none() && broadcast.text.is_none() {
            return Err(MailError::InvalidRequest("html or text body is required".to_string()));
        }
        let body = CreateBroadcastRequest {
            audience_id: audience,
            from: &broadcast.from,
            subject: &broadcast.subject,
            html: broadcast.html.as_deref(),
            text: broadcast.text.as_deref(),
            name: broadcast.name.as_deref(),
        };
        let request = self.request(Method::POST, "/broadcasts")?.json(&body);
        Self::execute_for_id(request).await
    }

    async fn send_broadcast(&self, broadcast_id: &str) -> MailResult<()> {
        let request = self.request(Method::POST, &format!("/broadcasts/{}/send", broadcast_id))?;
        Self::execute(request).await?;
        tracing::info!("Broadcast {} queued for delivery", broadcast_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: Option<&str>, audience_id: Option<&str>) -> ResendClient {
        ResendClient::new(ResendSettings {
            api_key: api_key.map(str::to_string),
            audience_id: audience_id.map(str::to_string),
            base_url: Some("http://localhost:3999/".to_string()),
        })
        .unwrap()
    }

    #[test]
    fn test_request_carries_bearer_key() {
        let resend = client(Some("re_test"), None);
        let request = resend.request(Method::POST, "/emails").unwrap().build().unwrap();

        assert_eq!(request.url().as_str(), "http://localhost:3999/emails");
        assert_eq!(request.headers()["Authorization"], "Bearer re_test");
    }

    #[test]
    fn test_missing_api_key() {
        let resend = client(None, Some("aud_1"));
        let err = resend.request(Method::POST, "/emails").unwrap_err();
        assert_eq!(err, MailError::MissingConfig("RESEND_API_KEY"));

        let blank = client(Some("  "), Some("aud_1"));
        assert!(blank.api_key().is_err());
    }

    #[tokio::test]
    async fn test_contact_calls_need_audience() {
        let resend = client(Some("re_test"), None);
        let contact = Contact::from_full_name("guest@example.com", Some("Amina"));

        let err = resend.add_contact(&contact).await.unwrap_err();
        assert_eq!(err, MailError::MissingConfig("RESEND_AUDIENCE_ID"));
        assert!(resend.remove_contact("guest@example.com").await.is_err());
    }

    #[test]
    fn test_email_payload_shape() {
        let to = vec!["guest@example.com".to_string()];
        let body = SendEmailRequest {
            from: "ZuruSasa <hello@zurusasa.com>",
            to: &to,
            subject: "Welcome",
            html: Some("<p>Hi</p>"),
            text: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["to"][0], "guest@example.com");
        assert!(json.get("text").is_none());
    }

    #[tokio::test]
    async fn test_broadcast_without_body_is_rejected() {
        let resend = client(Some("re_test"), Some("aud_1"));
        let broadcast = Broadcast {
            name: None,
            from: "ZuruSasa <hello@zurusasa.com>".to_string(),
            subject: "News".to_string(),
            html: None,
            text: None,
        };
        let err = resend.create_broadcast(&broadcast).await.unwrap_err();
        assert!(matches!(err, MailError::InvalidRequest(_)));
    }
}

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::types::{Broadcast, Contact, EmailMessage, MailError, MailResult, Mailer};

/// Records every provider call instead of sending anything
#[derive(Default)]
pub struct MemoryMailer {
    sent: RwLock<Vec<EmailMessage>>,
    contacts: RwLock<Vec<Contact>>,
    removed: RwLock<Vec<String>>,
    broadcasts: RwLock<Vec<(String, Broadcast)>>,
    dispatched: RwLock<Vec<String>>,
    failure: RwLock<Option<MailError>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every following call returns `error` until cleared.
    pub async fn fail_with(&self, error: MailError) {
        *self.failure.write().await = Some(error);
    }

    pub async fn clear_failure(&self) {
        *self.failure.write().await = None;
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.read().await.clone()
    }

    pub async fn contacts(&self) -> Vec<Contact> {
        self.contacts.read().await.clone()
    }

    pub async fn removed(&self) -> Vec<String> {
        self.removed.read().await.clone()
    }

    pub async fn broadcasts(&self) -> Vec<(String, Broadcast)> {
        self.broadcasts.read().await.clone()
    }

    /// Ids passed to `send_broadcast`
    pub async fn dispatched(&self) -> Vec<String> {
        self.dispatched.read().await.clone()
    }

    async fn check(&self) -> MailResult<()> {
        match self.failure.read().await.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send_email(&self, message: &EmailMessage) -> MailResult<String> {
        self.check().await?;
        message.validate()?;
        let mut sent = self.sent.write().await;
        sent.push(message.clone());
        Ok(format!("mem_email_{}", sent.len()))
    }

    async fn add_contact(&self, contact: &Contact) -> MailResult<()> {
        self.check().await?;
        let mut contacts = self.contacts.write().await;
        contacts.retain(|c| c.email != contact.email);
        contacts.push(contact.clone());
        Ok(())
    }

    async fn remove_contact(&self, email: &str) -> MailResult<()> {
        self.check().await?;
        self.contacts.write().await.retain(|c| c.email != email);
        self.removed.write().await.push(email.to_string());
        Ok(())
    }

    async fn create_broadcast(&self, broadcast: &Broadcast) -> MailResult<String> {
        self.check().await?;
        let mut broadcasts = self.broadcasts.write().await;
        let id = format!("mem_broadcast_{}", broadcasts.len() + 1);
        broadcasts.push((id.clone(), broadcast.clone()));
        Ok(id)
    }

    async fn send_broadcast(&self, broadcast_id: &str) -> MailResult<()> {
        self.check().await?;
        self.dispatched.write().await.push(broadcast_id.to_string());
        Ok(())
    }
}

//! In-memory implementations of the repository and event traits.
//!
//! Used by unit and integration tests, and by the API when no database URL is
//! configured. Each store can be told to fail its next writes so callers can
//! exercise error paths.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use zurusasa_catalog::{Category, Experience, Profile, Reel};

use crate::booking::{Booking, BookingInsert, BookingStatus, NewBooking};
use crate::events::EventSink;
use crate::payment::{NewPaymentMethod, PaymentMethod};
use crate::repository::{
    BookingRepository, ExperienceRepository, PaymentMethodRepository, ProfileRepository,
    ReelRepository,
};
use crate::{CoreError, RepositoryError, RepositoryResult};

#[derive(Default)]
pub struct MemoryBookings {
    rows: RwLock<Vec<Booking>>,
    failure: RwLock<Option<String>>,
    insert_attempts: RwLock<usize>,
}

impl MemoryBookings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following write fail with `reason` until cleared.
    pub async fn fail_with(&self, reason: &str) {
        *self.failure.write().await = Some(reason.to_string());
    }

    pub async fn clear_failure(&self) {
        *self.failure.write().await = None;
    }

    pub async fn all(&self) -> Vec<Booking> {
        self.rows.read().await.clone()
    }

    pub async fn insert_attempts(&self) -> usize {
        *self.insert_attempts.read().await
    }
}

#[async_trait]
impl BookingRepository for MemoryBookings {
    async fn create_booking(&self, booking: &NewBooking) -> RepositoryResult<BookingInsert> {
        *self.insert_attempts.write().await += 1;
        if let Some(reason) = self.failure.read().await.clone() {
            return Err(RepositoryError::Database(reason));
        }

        let mut rows = self.rows.write().await;
        let existing = rows
            .iter()
            .find(|b| b.idempotency_key == booking.idempotency_key)
            .or_else(|| rows.iter().find(|b| b.payment_reference == booking.payment_reference));
        if let Some(existing) = existing {
            return Ok(BookingInsert::Existing(existing.clone()));
        }

        let row = booking.clone().into_booking(Uuid::new_v4(), Utc::now());
        rows.push(row.clone());
        Ok(BookingInsert::Created(row))
    }

    async fn get_booking(&self, id: Uuid) -> RepositoryResult<Option<Booking>> {
        Ok(self.rows.read().await.iter().find(|b| b.id == id).cloned())
    }

    async fn list_bookings(&self, user_id: Uuid) -> RepositoryResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> RepositoryResult<bool> {
        if let Some(reason) = self.failure.read().await.clone() {
            return Err(RepositoryError::Database(reason));
        }
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("booking {}", id)))?;
        if row.status != from {
            return Ok(false);
        }
        row.status = to;
        Ok(true)
    }
}

#[derive(Default)]
pub struct MemoryPaymentMethods {
    rows: RwLock<Vec<PaymentMethod>>,
    failure: RwLock<Option<String>>,
    insert_attempts: RwLock<usize>,
}

impl MemoryPaymentMethods {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_with(&self, reason: &str) {
        *self.failure.write().await = Some(reason.to_string());
    }

    pub async fn all(&self) -> Vec<PaymentMethod> {
        self.rows.read().await.clone()
    }

    pub async fn insert_attempts(&self) -> usize {
        *self.insert_attempts.read().await
    }

    /// Seeds a saved card directly, bypassing failure injection.
    pub async fn seed(&self, method: NewPaymentMethod) -> PaymentMethod {
        let row = method.into_method(Uuid::new_v4(), Utc::now());
        self.rows.write().await.push(row.clone());
        row
    }
}

#[async_trait]
impl PaymentMethodRepository for MemoryPaymentMethods {
    async fn list_payment_methods(&self, user_id: Uuid) -> RepositoryResult<Vec<PaymentMethod>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_payment_method(&self, id: Uuid) -> RepositoryResult<Option<PaymentMethod>> {
        Ok(self.rows.read().await.iter().find(|m| m.id == id).cloned())
    }

    async fn create_payment_method(&self, method: &NewPaymentMethod) -> RepositoryResult<PaymentMethod> {
        *self.insert_attempts.write().await += 1;
        if let Some(reason) = self.failure.read().await.clone() {
            return Err(RepositoryError::Database(reason));
        }
        let row = method.clone().into_method(Uuid::new_v4(), Utc::now());
        self.rows.write().await.push(row.clone());
        Ok(row)
    }
}

/// Experiences, reels and profiles
#[derive(Default)]
pub struct MemoryCatalog {
    experiences: RwLock<Vec<Experience>>,
    reels: RwLock<Vec<Reel>>,
    profiles: RwLock<HashMap<Uuid, Profile>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_profile(&self, profile: Profile) {
        self.profiles.write().await.insert(profile.id, profile);
    }
}

#[async_trait]
impl ExperienceRepository for MemoryCatalog {
    async fn list_experiences(&self, category: Option<Category>) -> RepositoryResult<Vec<Experience>> {
        let mut rows: Vec<Experience> = self
            .experiences
            .read()
            .await
            .iter()
            .filter(|e| category.map(|c| e.category == c).unwrap_or(true))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get_experience(&self, id: Uuid) -> RepositoryResult<Option<Experience>> {
        Ok(self.experiences.read().await.iter().find(|e| e.id == id).cloned())
    }

    async fn create_experience(&self, experience: &Experience) -> RepositoryResult<()> {
        self.experiences.write().await.push(experience.clone());
        Ok(())
    }
}

#[async_trait]
impl ReelRepository for MemoryCatalog {
    async fn list_active_reels(
        &self,
        category: Option<Category>,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Reel>> {
        let mut rows: Vec<Reel> = self
            .reels
            .read()
            .await
            .iter()
            .filter(|r| r.is_visible(now))
            .filter(|r| category.map(|c| r.category == c).unwrap_or(true))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_reels_for_experience(&self, experience_id: Uuid) -> RepositoryResult<Vec<Reel>> {
        Ok(self
            .reels
            .read()
            .await
            .iter()
            .filter(|r| r.experience_id == experience_id)
            .cloned()
            .collect())
    }

    async fn create_reel(&self, reel: &Reel) -> RepositoryResult<()> {
        self.reels.write().await.push(reel.clone());
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for MemoryCatalog {
    async fn get_profile(&self, id: Uuid) -> RepositoryResult<Option<Profile>> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }
}

/// Records published events for assertions
#[derive(Default)]
pub struct MemoryEventSink {
    events: RwLock<Vec<(String, String, String)>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn topics(&self) -> Vec<String> {
        self.events.read().await.iter().map(|(t, _, _)| t.clone()).collect()
    }

    pub async fn payloads(&self, topic: &str) -> Vec<serde_json::Value> {
        self.events
            .read()
            .await
            .iter()
            .filter(|(t, _, _)| t == topic)
            .filter_map(|(_, _, p)| serde_json::from_str(p).ok())
            .collect()
    }
}

#[async_trait]
impl EventSink for MemoryEventSink {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), CoreError> {
        self.events
            .write()
            .await
            .push((topic.to_string(), key.to_string(), payload.to_string()));
        Ok(())
    }
}

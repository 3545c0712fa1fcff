use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use zurusasa_catalog::{Category, Experience, Profile, Reel};

use crate::booking::{Booking, BookingInsert, BookingStatus, NewBooking};
use crate::payment::{NewPaymentMethod, PaymentMethod};
use crate::RepositoryResult;

/// Writes and reads rows of the `bookings` table
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts the booking unless one with the same idempotency key or payment
    /// reference exists, in which case the stored row is returned instead.
    async fn create_booking(&self, booking: &NewBooking) -> RepositoryResult<BookingInsert>;

    async fn get_booking(&self, id: Uuid) -> RepositoryResult<Option<Booking>>;

    async fn list_bookings(&self, user_id: Uuid) -> RepositoryResult<Vec<Booking>>;

    /// Moves a booking to `to` only while it is still in `from`. Returns
    /// `false` when the stored status no longer matches.
    async fn update_booking_status(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> RepositoryResult<bool>;
}

/// Saved cards (`payment_methods`)
#[async_trait]
pub trait PaymentMethodRepository: Send + Sync {
    async fn list_payment_methods(&self, user_id: Uuid) -> RepositoryResult<Vec<PaymentMethod>>;

    async fn get_payment_method(&self, id: Uuid) -> RepositoryResult<Option<PaymentMethod>>;

    async fn create_payment_method(&self, method: &NewPaymentMethod) -> RepositoryResult<PaymentMethod>;
}

#[async_trait]
pub trait ExperienceRepository: Send + Sync {
    async fn list_experiences(&self, category: Option<Category>) -> RepositoryResult<Vec<Experience>>;

    async fn get_experience(&self, id: Uuid) -> RepositoryResult<Option<Experience>>;

    async fn create_experience(&self, experience: &Experience) -> RepositoryResult<()>;
}

#[async_trait]
pub trait ReelRepository: Send + Sync {
    /// Active, unexpired reels for the feed, newest first.
    async fn list_active_reels(
        &self,
        category: Option<Category>,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Reel>>;

    async fn list_reels_for_experience(&self, experience_id: Uuid) -> RepositoryResult<Vec<Reel>>;

    async fn create_reel(&self, reel: &Reel) -> RepositoryResult<()>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> RepositoryResult<Option<Profile>>;
}

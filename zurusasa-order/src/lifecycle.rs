use std::sync::Arc;
use chrono::Utc;
use uuid::Uuid;
use zurusasa_core::events::{publish_best_effort, EventSink};
use zurusasa_core::repository::{BookingRepository, ExperienceRepository};
use zurusasa_core::{Booking, BookingStatus, RepositoryError, SessionContext};
use zurusasa_shared::models::events::{topics, BookingStatusChangedEvent};

/// Allowed booking status transitions
pub struct BookingLifecycle;

impl BookingLifecycle {
    /// Transitions are one-directional; cancellation is allowed from any upcoming status.
    pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
        use BookingStatus::*;
        match (from, to) {
            (_, Cancelled) => from.is_upcoming(),
            (Pending, Paid) => true,
            (Paid, Approved) | (Paid, Declined) => true,
            (Approved, Completed) => true,
            _ => false,
        }
    }

    pub fn check(from: BookingStatus, to: BookingStatus) -> Result<(), OrderError> {
        if Self::can_transition(from, to) {
            Ok(())
        } else {
            Err(OrderError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }
}

/// Post-checkout status changes: guest cancellation and host review
pub struct BookingManager {
    bookings: Arc<dyn BookingRepository>,
    experiences: Arc<dyn ExperienceRepository>,
    events: Arc<dyn EventSink>,
}

impl BookingManager {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        experiences: Arc<dyn ExperienceRepository>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self { bookings, experiences, events }
    }

    pub async fn list_for_guest(&self, session: &SessionContext) -> Result<Vec<Booking>, OrderError> {
        Ok(self.bookings.list_bookings(session.user_id).await?)
    }

    /// Guest cancels one of their own upcoming bookings
    pub async fn cancel(&self, session: &SessionContext, booking_id: Uuid) -> Result<Booking, OrderError> {
        let booking = self.load(booking_id).await?;
        if booking.user_id != session.user_id {
            return Err(OrderError::Forbidden("booking belongs to another guest".to_string()));
        }
        self.transition(session, booking, BookingStatus::Cancelled).await
    }

    /// Host approves a paid booking on one of their listings
    pub async fn approve(&self, session: &SessionContext, booking_id: Uuid) -> Result<Booking, OrderError> {
        let booking = self.load_for_host(session, booking_id).await?;
        self.transition(session, booking, BookingStatus::Approved).await
    }

    pub async fn decline(&self, session: &SessionContext, booking_id: Uuid) -> Result<Booking, OrderError> {
        let booking = self.load_for_host(session, booking_id).await?;
        self.transition(session, booking, BookingStatus::Declined).await
    }

    pub async fn complete(&self, session: &SessionContext, booking_id: Uuid) -> Result<Booking, OrderError> {
        let booking = self.load_for_host(session, booking_id).await?;
        self.transition(session, booking, BookingStatus::Completed).await
    }

    async fn load(&self, booking_id: Uuid) -> Result<Booking, OrderError> {
        self.bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(booking_id.to_string()))
    }

    async fn load_for_host(&self, session: &SessionContext, booking_id: Uuid) -> Result<Booking, OrderError> {
        if !session.is_host() {
            return Err(OrderError::Forbidden("host account required".to_string()));
        }

        let booking = self.load(booking_id).await?;
        let experience_id = booking
            .experience_id
            .ok_or_else(|| OrderError::Forbidden("booking is not tied to a listing".to_string()))?;
        let experience = self
            .experiences
            .get_experience(experience_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(experience_id.to_string()))?;

        if experience.user_id != session.user_id {
            return Err(OrderError::Forbidden("listing belongs to another host".to_string()));
        }
        Ok(booking)
    }

    async fn transition(
        &self,
        session: &SessionContext,
        mut booking: Booking,
        to: BookingStatus,
    ) -> Result<Booking, OrderError> {
        let from = booking.status;
        BookingLifecycle::check(from, to)?;

        if !self.bookings.update_booking_status(booking.id, from, to).await? {
            // Someone else moved the booking after it was read.
            let current = self.load(booking.id).await?;
            tracing::warn!(
                "Booking {} changed to {} before {} -> {} could be applied",
                booking.id,
                current.status,
                from,
                to
            );
            return Err(OrderError::InvalidTransition {
                from: current.status.to_string(),
                to: to.to_string(),
            });
        }
        booking.status = to;
        tracing::info!("Booking {} moved {} -> {}", booking.id, from, to);

        let event = BookingStatusChangedEvent {
            booking_id: booking.id,
            actor_id: session.user_id,
            from: from.to_string(),
            to: to.to_string(),
            timestamp: Utc::now().timestamp(),
        };
        publish_best_effort(
            self.events.as_ref(),
            topics::BOOKING_STATUS_CHANGED,
            &booking.id.to_string(),
            &event,
        )
        .await;

        Ok(booking)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Booking not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: String,
        to: String,
    },

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use zurusasa_catalog::{Category, Experience, UserRole};
    use zurusasa_core::memory::{MemoryBookings, MemoryCatalog, MemoryEventSink};
    use zurusasa_core::NewBooking;

    #[test]
    fn test_transition_table() {
        use BookingStatus::*;
        assert!(BookingLifecycle::can_transition(Pending, Paid));
        assert!(BookingLifecycle::can_transition(Paid, Approved));
        assert!(BookingLifecycle::can_transition(Paid, Declined));
        assert!(BookingLifecycle::can_transition(Approved, Completed));
        assert!(BookingLifecycle::can_transition(Paid, Cancelled));
        assert!(BookingLifecycle::can_transition(Approved, Cancelled));

        assert!(!BookingLifecycle::can_transition(Paid, Pending));
        assert!(!BookingLifecycle::can_transition(Declined, Approved));
        assert!(!BookingLifecycle::can_transition(Completed, Cancelled));
        assert!(!BookingLifecycle::can_transition(Cancelled, Cancelled));
        assert!(!BookingLifecycle::can_transition(Pending, Completed));
    }

    struct Fixture {
        manager: BookingManager,
        bookings: Arc<MemoryBookings>,
        events: Arc<MemoryEventSink>,
        guest: SessionContext,
        host: SessionContext,
        booking: Booking,
    }

    async fn fixture() -> Fixture {
        let bookings = Arc::new(MemoryBookings::new());
        let catalog = Arc::new(MemoryCatalog::new());
        let events = Arc::new(MemoryEventSink::new());

        let guest = SessionContext::new(Uuid::new_v4(), Some("guest@example.com".into()), UserRole::Guest);
        let host = SessionContext::new(Uuid::new_v4(), Some("host@example.com".into()), UserRole::Host);

        let experience = Experience {
            id: Uuid::new_v4(),
            user_id: host.user_id,
            category: Category::Villa,
            title: "Beach villa".to_string(),
            location: "Diani".to_string(),
            current_price: 12000,
            base_price: None,
            price_unit: "night".to_string(),
            metadata: json!({}),
            image_url: None,
            created_at: Utc::now(),
        };
        catalog.create_experience(&experience).await.unwrap();

        let now = Utc::now();
        let booking = bookings
            .create_booking(&NewBooking {
                user_id: guest.user_id,
                experience_id: Some(experience.id),
                reel_id: None,
                trip_title: experience.title.clone(),
                amount: 12000,
                guests: 2,
                check_in: now,
                check_out: now + Duration::hours(24),
                status: BookingStatus::Paid,
                payment_reference: "abc123".to_string(),
                idempotency_key: Uuid::new_v4(),
            })
            .await
            .unwrap()
            .into_booking();

        Fixture {
            manager: BookingManager::new(bookings.clone(), catalog, events.clone()),
            bookings,
            events,
            guest,
            host,
            booking,
        }
    }

    #[tokio::test]
    async fn test_guest_cancels_upcoming_booking() {
        let f = fixture().await;

        let cancelled = f.manager.cancel(&f.guest, f.booking.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let stored = f.bookings.get_booking(f.booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
        assert_eq!(f.events.topics().await, vec![topics::BOOKING_STATUS_CHANGED.to_string()]);

        // Already cancelled: no longer upcoming.
        let again = f.manager.cancel(&f.guest, f.booking.id).await;
        assert!(matches!(again, Err(OrderError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_other_guest_cannot_cancel() {
        let f = fixture().await;
        let stranger = SessionContext::new(Uuid::new_v4(), None, UserRole::Guest);

        let result = f.manager.cancel(&stranger, f.booking.id).await;
        assert!(matches!(result, Err(OrderError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_host_review_flow() {
        let f = fixture().await;

        let approved = f.manager.approve(&f.host, f.booking.id).await.unwrap();
        assert_eq!(approved.status, BookingStatus::Approved);

        let declined = f.manager.decline(&f.host, f.booking.id).await;
        assert!(matches!(declined, Err(OrderError::InvalidTransition { .. })));

        let completed = f.manager.complete(&f.host, f.booking.id).await.unwrap();
        assert_eq!(completed.status, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn test_guest_cannot_approve() {
        let f = fixture().await;
        let result = f.manager.approve(&f.guest, f.booking.id).await;
        assert!(matches!(result, Err(OrderError::Forbidden(_))));

        let other_host = SessionContext::new(Uuid::new_v4(), None, UserRole::Host);
        let result = f.manager.approve(&other_host, f.booking.id).await;
        assert!(matches!(result, Err(OrderError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_stale_approval_loses_to_cancel() {
        let f = fixture().await;
        // Host loaded the booking while it was still paid.
        let stale = f.booking.clone();

        f.manager.cancel(&f.guest, f.booking.id).await.unwrap();

        let result = f.manager.transition(&f.host, stale, BookingStatus::Approved).await;
        match result {
            Err(OrderError::InvalidTransition { from, to }) => {
                assert_eq!(from, "cancelled");
                assert_eq!(to, "approved");
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }

        let stored = f.bookings.get_booking(f.booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
        assert_eq!(f.events.topics().await.len(), 1);
    }
}

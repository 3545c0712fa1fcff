use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use zurusasa_core::repository::BookingRepository;
use zurusasa_core::{Booking, BookingInsert, BookingStatus, NewBooking, RepositoryError, RepositoryResult};

use crate::database::db_error;

const BOOKING_COLUMNS: &str = "id, user_id, experience_id, reel_id, trip_title, amount, guests, \
     check_in, check_out, status, payment_reference, idempotency_key, created_at";

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The row an earlier attempt left behind, matched on either unique column.
    async fn find_existing(&self, key: Uuid, payment_reference: &str) -> RepositoryResult<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE idempotency_key = $1 OR payment_reference = $2 \
             ORDER BY (idempotency_key = $1) DESC LIMIT 1",
            BOOKING_COLUMNS
        ))
        .bind(key)
        .bind(payment_reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Booking::try_from).transpose()
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    experience_id: Option<Uuid>,
    reel_id: Option<Uuid>,
    trip_title: String,
    amount: i64,
    guests: i32,
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
    status: String,
    payment_reference: String,
    idempotency_key: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = RepositoryError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            experience_id: row.experience_id,
            reel_id: row.reel_id,
            trip_title: row.trip_title,
            amount: row.amount,
            guests: row.guests,
            check_in: row.check_in,
            check_out: row.check_out,
            status: row.status.parse()?,
            payment_reference: row.payment_reference,
            idempotency_key: row.idempotency_key,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn create_booking(&self, booking: &NewBooking) -> RepositoryResult<BookingInsert> {
        let inserted: Option<BookingRow> = sqlx::query_as(&format!(
            r#"
            INSERT INTO bookings (user_id, experience_id, reel_id, trip_title, amount, guests,
                                  check_in, check_out, status, payment_reference, idempotency_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT DO NOTHING
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(booking.user_id)
        .bind(booking.experience_id)
        .bind(booking.reel_id)
        .bind(&booking.trip_title)
        .bind(booking.amount)
        .bind(booking.guests)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.status.as_str())
        .bind(&booking.payment_reference)
        .bind(booking.idempotency_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        if let Some(row) = inserted {
            return Ok(BookingInsert::Created(row.try_into()?));
        }

        // Conflict: a previous attempt with this key or reference already landed.
        let existing = self
            .find_existing(booking.idempotency_key, &booking.payment_reference)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("booking with key {}", booking.idempotency_key)))?;
        tracing::info!(
            "Booking write replayed for key {} (booking {})",
            booking.idempotency_key,
            existing.id
        );
        Ok(BookingInsert::Existing(existing))
    }

    async fn get_booking(&self, id: Uuid) -> RepositoryResult<Option<Booking>> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(Booking::try_from).transpose()
    }

    async fn list_bookings(&self, user_id: Uuid) -> RepositoryResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> RepositoryResult<bool> {
        let result = sqlx::query("UPDATE bookings SET status = $1 WHERE id = $2 AND status = $3")
            .bind(to.as_str())
            .bind(id)
            .bind(from.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() == 1)
    }
}

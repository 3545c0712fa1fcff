use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::RepositoryError;

/// Booking status in the reservation lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Paid,
    Approved,
    Declined,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Paid => "paid",
            BookingStatus::Approved => "approved",
            BookingStatus::Declined => "declined",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Statuses the guest sees under "upcoming" and may still cancel.
    pub fn is_upcoming(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Paid | BookingStatus::Approved)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "paid" => Ok(BookingStatus::Paid),
            "approved" => Ok(BookingStatus::Approved),
            "declined" => Ok(BookingStatus::Declined),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(RepositoryError::Decode {
                table: "bookings",
                reason: format!("unknown status '{}'", other),
            }),
        }
    }
}

/// A guest's reservation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub experience_id: Option<Uuid>,
    pub reel_id: Option<Uuid>,
    pub trip_title: String,
    pub amount: i64,
    pub guests: i32,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub status: BookingStatus,
    pub payment_reference: String,
    pub idempotency_key: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_upcoming(&self) -> bool {
        self.status.is_upcoming()
    }
}

/// Row handed to the booking writer
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub experience_id: Option<Uuid>,
    pub reel_id: Option<Uuid>,
    pub trip_title: String,
    pub amount: i64,
    pub guests: i32,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub status: BookingStatus,
    pub payment_reference: String,
    pub idempotency_key: Uuid,
}

impl NewBooking {
    pub fn into_booking(self, id: Uuid, created_at: DateTime<Utc>) -> Booking {
        Booking {
            id,
            user_id: self.user_id,
            experience_id: self.experience_id,
            reel_id: self.reel_id,
            trip_title: self.trip_title,
            amount: self.amount,
            guests: self.guests,
            check_in: self.check_in,
            check_out: self.check_out,
            status: self.status,
            payment_reference: self.payment_reference,
            idempotency_key: self.idempotency_key,
            created_at,
        }
    }
}

/// Result of an idempotent booking write
#[derive(Debug, Clone)]
pub enum BookingInsert {
    Created(Booking),
    /// A booking with the same idempotency key was already committed.
    Existing(Booking),
}

impl BookingInsert {
    pub fn booking(&self) -> &Booking {
        match self {
            BookingInsert::Created(b) | BookingInsert::Existing(b) => b,
        }
    }

    pub fn into_booking(self) -> Booking {
        match self {
            BookingInsert::Created(b) | BookingInsert::Existing(b) => b,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, BookingInsert::Existing(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("paid".parse::<BookingStatus>().unwrap(), BookingStatus::Paid);
        assert!(matches!(
            "refunded".parse::<BookingStatus>(),
            Err(RepositoryError::Decode { table: "bookings", .. })
        ));
    }

    #[test]
    fn test_upcoming_statuses() {
        assert!(BookingStatus::Pending.is_upcoming());
        assert!(BookingStatus::Paid.is_upcoming());
        assert!(BookingStatus::Approved.is_upcoming());
        assert!(!BookingStatus::Declined.is_upcoming());
        assert!(!BookingStatus::Cancelled.is_upcoming());
        assert!(!BookingStatus::Completed.is_upcoming());
    }
}

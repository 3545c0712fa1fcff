use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Duration, Utc};
use std::str::FromStr;

use crate::{CatalogError, Category};

/// Longest clip the recorder accepts
pub const MAX_REEL_SECONDS: i32 = 20;

/// Reels stay in the feed this long unless the host re-publishes them
pub const REEL_LIFETIME_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReelStatus {
    Active,
    Draft,
}

impl ReelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReelStatus::Active => "active",
            ReelStatus::Draft => "draft",
        }
    }
}

impl FromStr for ReelStatus {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ReelStatus::Active),
            "draft" => Ok(ReelStatus::Draft),
            other => Err(CatalogError::UnknownValue {
                field: "reel status",
                value: other.to_string(),
            }),
        }
    }
}

/// Short video attached to an experience
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub experience_id: Uuid,
    pub category: Category,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: i32,
    pub is_live: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: ReelStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Reel {
    /// Geotagged reels are shown as verified. Coordinates are only captured
    /// during live recording, but the live flag on its own does not count.
    pub fn is_verified(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }

    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.status == ReelStatus::Active && !self.is_expired(now)
    }
}

/// Upload payload once a host finishes recording
#[derive(Debug, Clone, Deserialize)]
pub struct NewReel {
    pub experience_id: Uuid,
    pub category: Category,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: i32,
    #[serde(default)]
    pub is_live: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub draft: bool,
}

impl NewReel {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.video_url.trim().is_empty() {
            return Err(CatalogError::InvalidListing("video url is required".to_string()));
        }
        if self.duration_seconds <= 0 || self.duration_seconds > MAX_REEL_SECONDS {
            return Err(CatalogError::InvalidListing(format!(
                "reel duration must be between 1 and {} seconds",
                MAX_REEL_SECONDS
            )));
        }
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                    return Err(CatalogError::InvalidListing("coordinates out of range".to_string()));
                }
            }
            (None, None) => {}
            _ => {
                return Err(CatalogError::InvalidListing(
                    "latitude and longitude must be supplied together".to_string(),
                ))
            }
        }
        Ok(())
    }

    pub fn into_reel(self, user_id: Uuid, now: DateTime<Utc>) -> Reel {
        Reel {
            id: Uuid::new_v4(),
            user_id,
            experience_id: self.experience_id,
            category: self.category,
            video_url: self.video_url,
            thumbnail_url: self.thumbnail_url,
            duration_seconds: self.duration_seconds,
            is_live: self.is_live,
            latitude: self.latitude,
            longitude: self.longitude,
            status: if self.draft { ReelStatus::Draft } else { ReelStatus::Active },
            expires_at: Some(now + Duration::days(REEL_LIFETIME_DAYS)),
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload() -> NewReel {
        NewReel {
            experience_id: Uuid::new_v4(),
            category: Category::Food,
            video_url: "https://cdn.example.com/reels/a.mp4".to_string(),
            thumbnail_url: None,
            duration_seconds: 15,
            is_live: true,
            latitude: None,
            longitude: None,
            draft: false,
        }
    }

    #[test]
    fn test_live_without_coordinates_is_not_verified() {
        let reel = upload().into_reel(Uuid::new_v4(), Utc::now());
        assert!(reel.is_live);
        assert!(!reel.is_verified());
    }

    #[test]
    fn test_coordinates_verify_reel() {
        let mut input = upload();
        input.is_live = false;
        input.latitude = Some(-3.2192);
        input.longitude = Some(40.1169);
        let reel = input.into_reel(Uuid::new_v4(), Utc::now());
        assert!(reel.is_verified());
    }

    #[test]
    fn test_duration_cap() {
        let mut input = upload();
        input.duration_seconds = MAX_REEL_SECONDS;
        assert!(input.validate().is_ok());
        input.duration_seconds = MAX_REEL_SECONDS + 1;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_half_coordinates_rejected() {
        let mut input = upload();
        input.latitude = Some(-3.2);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_visibility() {
        let now = Utc::now();
        let mut reel = upload().into_reel(Uuid::new_v4(), now);
        assert!(reel.is_visible(now));
        assert!(!reel.is_visible(now + Duration::days(REEL_LIFETIME_DAYS + 1)));
        reel.status = ReelStatus::Draft;
        assert!(!reel.is_visible(now));
    }
}

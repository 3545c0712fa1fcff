use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::CatalogError;

/// Listing categories shown in the feed and host dashboard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Hotel,
    Villa,
    Apartment,
    Boats,
    Food,
    Drinks,
    Rentals,
    Adventure,
    ParksCamps,
    Tours,
    Events,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Hotel,
        Category::Villa,
        Category::Apartment,
        Category::Boats,
        Category::Food,
        Category::Drinks,
        Category::Rentals,
        Category::Adventure,
        Category::ParksCamps,
        Category::Tours,
        Category::Events,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hotel => "hotel",
            Category::Villa => "villa",
            Category::Apartment => "apartment",
            Category::Boats => "boats",
            Category::Food => "food",
            Category::Drinks => "drinks",
            Category::Rentals => "rentals",
            Category::Adventure => "adventure",
            Category::ParksCamps => "parks_camps",
            Category::Tours => "tours",
            Category::Events => "events",
        }
    }

    /// Accommodation listings are priced per night and may carry one reel per room.
    pub fn is_accommodation(&self) -> bool {
        matches!(self, Category::Hotel | Category::Villa | Category::Apartment)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CatalogError::UnknownCategory(s.to_string()))
    }
}

/// A bookable listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: Category,
    pub title: String,
    pub location: String,
    pub current_price: i64,
    pub base_price: Option<i64>,
    pub price_unit: String,
    /// Free-form listing details (rating, time, duration, ...)
    pub metadata: serde_json::Value,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Experience {
    /// Discount relative to the pre-discount price, rounded down.
    pub fn discount_percent(&self) -> Option<u8> {
        match self.base_price {
            Some(base) if base > self.current_price && base > 0 => {
                let pct = (base - self.current_price) * 100 / base;
                Some(pct as u8)
            }
            _ => None,
        }
    }
}

/// Host input for publishing a listing
#[derive(Debug, Clone, Deserialize)]
pub struct NewExperience {
    pub category: Category,
    pub title: String,
    pub location: String,
    pub current_price: i64,
    pub base_price: Option<i64>,
    pub price_unit: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub image_url: Option<String>,
}

impl NewExperience {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::InvalidListing("title is required".to_string()));
        }
        if self.location.trim().is_empty() {
            return Err(CatalogError::InvalidListing("location is required".to_string()));
        }
        if self.current_price <= 0 {
            return Err(CatalogError::InvalidListing("price must be positive".to_string()));
        }
        if let Some(base) = self.base_price {
            if base < self.current_price {
                return Err(CatalogError::InvalidListing(
                    "base price cannot be below the current price".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Price unit shown next to the price; accommodation defaults to "night".
    pub fn resolved_price_unit(&self) -> String {
        match &self.price_unit {
            Some(unit) if !unit.trim().is_empty() => unit.trim().to_string(),
            _ if self.category.is_accommodation() => "night".to_string(),
            _ => "person".to_string(),
        }
    }

    pub fn into_experience(self, user_id: Uuid) -> Experience {
        let price_unit = self.resolved_price_unit();
        Experience {
            id: Uuid::new_v4(),
            user_id,
            category: self.category,
            title: self.title.trim().to_string(),
            location: self.location.trim().to_string(),
            current_price: self.current_price,
            base_price: self.base_price,
            price_unit,
            metadata: if self.metadata.is_null() { serde_json::json!({}) } else { self.metadata },
            image_url: self.image_url,
            created_at: Utc::now(),
        }
    }
}

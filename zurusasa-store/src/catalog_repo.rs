use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;
use zurusasa_catalog::{Category, Experience, Profile, Reel, UserRole};
use zurusasa_core::repository::{ExperienceRepository, ProfileRepository, ReelRepository};
use zurusasa_core::{RepositoryError, RepositoryResult};

use crate::database::db_error;

/// Experiences, reels and profiles
pub struct StoreCatalogRepository {
    pool: PgPool,
}

impl StoreCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode<T, E: std::fmt::Display>(table: &'static str, parsed: Result<T, E>) -> RepositoryResult<T> {
    parsed.map_err(|e| RepositoryError::Decode {
        table,
        reason: e.to_string(),
    })
}

#[derive(sqlx::FromRow)]
struct ExperienceRow {
    id: Uuid,
    user_id: Uuid,
    category: String,
    title: String,
    location: String,
    current_price: i64,
    base_price: Option<i64>,
    price_unit: Option<String>,
    metadata: Option<Value>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ExperienceRow> for Experience {
    type Error = RepositoryError;

    fn try_from(row: ExperienceRow) -> Result<Self, Self::Error> {
        let category: Category = decode("experiences", row.category.parse())?;
        let price_unit = row.price_unit.unwrap_or_else(|| {
            if category.is_accommodation() { "night" } else { "person" }.to_string()
        });

        Ok(Experience {
            id: row.id,
            user_id: row.user_id,
            category,
            title: row.title,
            location: row.location,
            current_price: row.current_price,
            base_price: row.base_price,
            price_unit,
            metadata: row.metadata.unwrap_or(Value::Null),
            image_url: row.image_url,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReelRow {
    id: Uuid,
    user_id: Uuid,
    experience_id: Uuid,
    category: String,
    video_url: String,
    thumbnail_url: Option<String>,
    duration_seconds: i32,
    is_live: bool,
    latitude: Option<f64>,
    longitude: Option<f64>,
    status: String,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReelRow> for Reel {
    type Error = RepositoryError;

    fn try_from(row: ReelRow) -> Result<Self, Self::Error> {
        Ok(Reel {
            id: row.id,
            user_id: row.user_id,
            experience_id: row.experience_id,
            category: decode("reels", row.category.parse())?,
            video_url: row.video_url,
            thumbnail_url: row.thumbnail_url,
            duration_seconds: row.duration_seconds,
            is_live: row.is_live,
            latitude: row.latitude,
            longitude: row.longitude,
            status: decode("reels", row.status.parse())?,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    role: Option<String>,
    full_name: Option<String>,
    email: Option<String>,
    verification_status: Option<String>,
    notification_settings: Option<Value>,
    security_settings: Option<Value>,
    languages: Option<Vec<String>>,
    emergency_contact: Option<String>,
    business_name: Option<String>,
    id_number: Option<String>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let role = match row.role.as_deref() {
            None => UserRole::default(),
            Some(role) => decode("profiles", role.parse())?,
        };

        Ok(Profile {
            id: row.id,
            role,
            full_name: row.full_name,
            email: row.email,
            verification_status: row.verification_status,
            notification_settings: row.notification_settings.unwrap_or(Value::Null),
            security_settings: row.security_settings.unwrap_or(Value::Null),
            languages: row.languages.unwrap_or_default(),
            emergency_contact: row.emergency_contact,
            business_name: row.business_name,
            id_number: row.id_number,
        })
    }
}

const EXPERIENCE_COLUMNS: &str = "id, user_id, category, title, location, current_price, base_price, \
     price_unit, metadata, image_url, created_at";

const REEL_COLUMNS: &str = "id, user_id, experience_id, category, video_url, thumbnail_url, \
     duration_seconds, is_live, latitude, longitude, status, expires_at, created_at";

#[async_trait]
impl ExperienceRepository for StoreCatalogRepository {
    async fn list_experiences(&self, category: Option<Category>) -> RepositoryResult<Vec<Experience>> {
        let rows: Vec<ExperienceRow> = sqlx::query_as(&format!(
            "SELECT {} FROM experiences WHERE ($1::text IS NULL OR category = $1) ORDER BY created_at DESC",
            EXPERIENCE_COLUMNS
        ))
        .bind(category.map(|c| c.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(Experience::try_from).collect()
    }

    async fn get_experience(&self, id: Uuid) -> RepositoryResult<Option<Experience>> {
        let row: Option<ExperienceRow> =
            sqlx::query_as(&format!("SELECT {} FROM experiences WHERE id = $1", EXPERIENCE_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(Experience::try_from).transpose()
    }

    async fn create_experience(&self, experience: &Experience) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO experiences (id, user_id, category, title, location, current_price, base_price,
                                     price_unit, metadata, image_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(experience.id)
        .bind(experience.user_id)
        .bind(experience.category.as_str())
        .bind(&experience.title)
        .bind(&experience.location)
        .bind(experience.current_price)
        .bind(experience.base_price)
        .bind(&experience.price_unit)
        .bind(&experience.metadata)
        .bind(&experience.image_url)
        .bind(experience.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }
}

#[async_trait]
impl ReelRepository for StoreCatalogRepository {
    async fn list_active_reels(
        &self,
        category: Option<Category>,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Reel>> {
        let rows: Vec<ReelRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM reels
            WHERE status = 'active'
              AND (expires_at IS NULL OR expires_at > $1)
              AND ($2::text IS NULL OR category = $2)
            ORDER BY created_at DESC
            "#,
            REEL_COLUMNS
        ))
        .bind(now)
        .bind(category.map(|c| c.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(Reel::try_from).collect()
    }

    async fn list_reels_for_experience(&self, experience_id: Uuid) -> RepositoryResult<Vec<Reel>> {
        let rows: Vec<ReelRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reels WHERE experience_id = $1 ORDER BY created_at DESC",
            REEL_COLUMNS
        ))
        .bind(experience_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(Reel::try_from).collect()
    }

    async fn create_reel(&self, reel: &Reel) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reels (id, user_id, experience_id, category, video_url, thumbnail_url,
                               duration_seconds, is_live, latitude, longitude, status, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(reel.id)
        .bind(reel.user_id)
        .bind(reel.experience_id)
        .bind(reel.category.as_str())
        .bind(&reel.video_url)
        .bind(&reel.thumbnail_url)
        .bind(reel.duration_seconds)
        .bind(reel.is_live)
        .bind(reel.latitude)
        .bind(reel.longitude)
        .bind(reel.status.as_str())
        .bind(reel.expires_at)
        .bind(reel.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for StoreCatalogRepository {
    async fn get_profile(&self, id: Uuid) -> RepositoryResult<Option<Profile>> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT id, role, full_name, email, verification_status, notification_settings,
                   security_settings, languages, emergency_contact, business_name, id_number
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Profile::try_from).transpose()
    }
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zurusasa_catalog::{Category, Experience, NewExperience, NewReel, Reel};
use zurusasa_core::SessionContext;

use crate::error::AppError;
use crate::middleware::require_host;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

impl CategoryQuery {
    fn category(&self) -> Result<Option<Category>, AppError> {
        match self.category.as_deref() {
            None | Some("") | Some("all") => Ok(None),
            Some(raw) => Ok(Some(raw.parse()?)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExperienceView {
    #[serde(flatten)]
    pub experience: Experience,
    pub discount_percent: Option<u8>,
}

impl From<Experience> for ExperienceView {
    fn from(experience: Experience) -> Self {
        Self {
            discount_percent: experience.discount_percent(),
            experience,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReelView {
    #[serde(flatten)]
    pub reel: Reel,
    pub verified: bool,
}

impl From<Reel> for ReelView {
    fn from(reel: Reel) -> Self {
        Self {
            verified: reel.is_verified(),
            reel,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExperienceDetail {
    #[serde(flatten)]
    pub experience: ExperienceView,
    pub reels: Vec<ReelView>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/experiences", get(list_experiences))
        .route("/v1/experiences/{id}", get(get_experience))
        .route("/v1/reels", get(list_reels))
}

pub fn host_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/host/experiences", post(create_experience))
        .route("/v1/host/reels", post(create_reel))
}

/// GET /v1/experiences?category=
pub async fn list_experiences(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<ExperienceView>>, AppError> {
    let experiences = state.experiences.list_experiences(query.category()?).await?;
    Ok(Json(experiences.into_iter().map(ExperienceView::from).collect()))
}

/// GET /v1/experiences/{id}
/// Listing with its visible reels
pub async fn get_experience(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExperienceDetail>, AppError> {
    let experience = state
        .experiences
        .get_experience(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Experience {} not found", id)))?;

    let now = Utc::now();
    let reels = state
        .reels
        .list_reels_for_experience(id)
        .await?
        .into_iter()
        .filter(|r| r.is_visible(now))
        .map(ReelView::from)
        .collect();

    Ok(Json(ExperienceDetail {
        experience: experience.into(),
        reels,
    }))
}

/// GET /v1/reels?category=
/// Active, unexpired reels for the feed
pub async fn list_reels(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<ReelView>>, AppError> {
    let reels = state.reels.list_active_reels(query.category()?, Utc::now()).await?;
    Ok(Json(reels.into_iter().map(ReelView::from).collect()))
}

/// POST /v1/host/experiences
pub async fn create_experience(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(payload): Json<NewExperience>,
) -> Result<(StatusCode, Json<ExperienceView>), AppError> {
    require_host(&session)?;
    payload.validate()?;

    let experience = payload.into_experience(session.user_id);
    state.experiences.create_experience(&experience).await?;
    tracing::info!("Host {} published experience {}", session.user_id, experience.id);

    Ok((StatusCode::CREATED, Json(experience.into())))
}

/// POST /v1/host/reels
pub async fn create_reel(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(payload): Json<NewReel>,
) -> Result<(StatusCode, Json<ReelView>), AppError> {
    require_host(&session)?;
    payload.validate()?;

    let experience = state
        .experiences
        .get_experience(payload.experience_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Experience {} not found", payload.experience_id)))?;
    if experience.user_id != session.user_id {
        return Err(AppError::AuthorizationError("Listing belongs to another host".to_string()));
    }

    let reel = payload.into_reel(session.user_id, Utc::now());
    state.reels.create_reel(&reel).await?;
    tracing::info!("Host {} uploaded reel {} ({}s)", session.user_id, reel.id, reel.duration_seconds);

    Ok((StatusCode::CREATED, Json(reel.into())))
}

// SPDX-License-Identifier: MIT

//! Challenge listing, creation, joining, and per-participant progress.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Challenge, ChallengeStatus, Enrollment};
use crate::services::leaderboard::{attendance_grid, current_streak, daily_leaders, DayCell};
use crate::time_utils::{now_rfc3339, today_utc};
use crate::AppState;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/challenges", get(list_challenges))
        .route("/api/challenges/{id}/join", post(join_challenge))
        .route("/api/challenges/{id}/progress", get(get_progress))
}

pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/challenges", post(create_challenge))
}

/// Challenge as listed in the API, with derived status and counts.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChallengeSummary {
    pub id: Uuid,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ChallengeStatus,
    pub participant_count: u32,
    pub user_enrolled: bool,
}

impl ChallengeSummary {
    pub fn build(
        challenge: &Challenge,
        participant_count: u32,
        user_enrolled: bool,
        today: NaiveDate,
    ) -> Self {
        Self {
            id: challenge.id,
            title: challenge.title.clone(),
            start_date: challenge.start_date,
            end_date: challenge.end_date(),
            status: challenge.status(today),
            participant_count,
            user_enrolled,
        }
    }
}

/// GET /api/challenges
async fn list_challenges(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<ChallengeSummary>>> {
    let today = today_utc();
    let challenges = state.db.list_challenges().await?;

    let enrolled: HashSet<Uuid> = state
        .db
        .list_enrollments_for_user(auth_user.user_id)
        .await?
        .into_iter()
        .map(|e| e.challenge_id)
        .collect();

    let mut summaries = Vec::with_capacity(challenges.len());
    for challenge in &challenges {
        let participant_count = state
            .db
            .list_enrollments_for_challenge(challenge.id)
            .await?
            .len() as u32;

        summaries.push(ChallengeSummary::build(
            challenge,
            participant_count,
            enrolled.contains(&challenge.id),
            today,
        ));
    }

    Ok(Json(summaries))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateChallengeRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    pub start_date: NaiveDate,
}

/// POST /api/challenges (admin)
async fn create_challenge(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateChallengeRequest>,
) -> Result<(StatusCode, Json<ChallengeSummary>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let challenge = Challenge {
        id: Uuid::new_v4(),
        title: payload.title.trim().to_string(),
        start_date: payload.start_date,
        created_by: auth_user.user_id,
        created_at: now_rfc3339(),
    };

    state.db.upsert_challenge(&challenge).await?;

    tracing::info!(
        challenge_id = %challenge.id,
        start_date = %challenge.start_date,
        "Created challenge"
    );

    let summary = ChallengeSummary::build(&challenge, 0, false, today_utc());
    Ok((StatusCode::CREATED, Json(summary)))
}

/// POST /api/challenges/{id}/join
///
/// Only upcoming challenges can be joined; a started challenge would
/// leave the late joiner with unrecoverable missed days.
async fn join_challenge(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(challenge_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Enrollment>)> {
    let challenge = state
        .db
        .get_challenge(challenge_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))?;

    // A started challenge is not joinable; it is reported the same way
    // as a missing one.
    if challenge.status(today_utc()) != ChallengeStatus::Upcoming {
        return Err(AppError::NotFound(
            "Challenge not found or not open for enrollment".to_string(),
        ));
    }

    if state
        .db
        .get_enrollment(auth_user.user_id, challenge_id)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(
            "You are already enrolled in this challenge".to_string(),
        ));
    }

    let enrollment = Enrollment {
        user_id: auth_user.user_id,
        challenge_id,
        enrolled_at: now_rfc3339(),
    };

    state.db.upsert_enrollment(&enrollment).await?;

    tracing::info!(user_id = %auth_user.user_id, %challenge_id, "User joined challenge");

    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgressResponse {
    pub challenge_id: Uuid,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ChallengeStatus,
    pub current_streak: u32,
    /// Exactly 30 cells, day 1 through day 30
    pub days: Vec<DayCell>,
}

/// GET /api/challenges/{id}/progress
///
/// The caller's own 30-day attendance grid plus their current streak.
async fn get_progress(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(challenge_id): Path<Uuid>,
) -> Result<Json<ProgressResponse>> {
    let challenge = state
        .db
        .get_challenge(challenge_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))?;

    state
        .db
        .get_enrollment(auth_user.user_id, challenge_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("You are not enrolled in this challenge".to_string()))?;

    let today = today_utc();

    let own_entries: Vec<_> = state
        .db
        .list_submissions_for_participant(auth_user.user_id, challenge_id)
        .await?
        .iter()
        .map(|s| s.daily_entry())
        .collect();

    // Daily leader flags come from the whole field, not just the caller.
    let all_entries: Vec<_> = state
        .db
        .list_submissions_for_challenge(challenge_id)
        .await?
        .iter()
        .map(|s| (s.user_id, s.daily_entry()))
        .collect();

    let leader_dates: HashSet<NaiveDate> = daily_leaders(&all_entries)
        .into_iter()
        .filter(|(_, winner)| *winner == auth_user.user_id)
        .map(|(date, _)| date)
        .collect();

    let days = attendance_grid(challenge.start_date, &own_entries, &leader_dates, today);
    let streak = current_streak(&own_entries, today);

    let end_date = challenge.end_date();
    let status = challenge.status(today);

    Ok(Json(ProgressResponse {
        challenge_id: challenge.id,
        title: challenge.title,
        start_date: challenge.start_date,
        end_date,
        status,
        current_streak: streak,
        days,
    }))
}

// SPDX-License-Identifier: MIT

//! Leaderboard endpoints: the caller's enrolled challenges and the ranked
//! standings for one challenge. Standings are recomputed per request from
//! the stored submissions.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Challenge, ChallengeStatus};
use crate::routes::challenges::ChallengeSummary;
use crate::services::leaderboard::{rank_participants, Participant, ParticipantStanding, SortKey};
use crate::time_utils::today_utc;
use crate::AppState;
use axum::extract::{Extension, Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/leaderboard", get(list_enrolled_challenges))
        .route("/api/leaderboard/{id}", get(get_leaderboard))
}

/// GET /api/leaderboard
///
/// The caller's enrolled challenges, active first, then completed, then
/// upcoming; newest start date first within each group.
async fn list_enrolled_challenges(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<ChallengeSummary>>> {
    let today = today_utc();
    let enrollments = state.db.list_enrollments_for_user(auth_user.user_id).await?;

    let mut challenges: Vec<Challenge> = Vec::with_capacity(enrollments.len());
    for enrollment in &enrollments {
        if let Some(challenge) = state.db.get_challenge(enrollment.challenge_id).await? {
            challenges.push(challenge);
        }
    }

    challenges.sort_by(|a, b| {
        let group = |c: &Challenge| match c.status(today) {
            ChallengeStatus::Active => 0,
            ChallengeStatus::Completed => 1,
            ChallengeStatus::Upcoming => 2,
        };
        group(a)
            .cmp(&group(b))
            .then_with(|| b.start_date.cmp(&a.start_date))
    });

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
            true,
            today,
        ));
    }

    Ok(Json(summaries))
}

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    pub sort_by: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardResponse {
    pub challenge_id: Uuid,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ChallengeStatus,
    pub total_participants: u32,
    pub sort_by: String,
    pub leaderboard: Vec<ParticipantStanding>,
}

/// GET /api/leaderboard/{id}?sort_by=
///
/// Full ranked standings for one challenge. Only enrolled users may view
/// it. Unknown `sort_by` values fall back to total steps.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(challenge_id): Path<Uuid>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>> {
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

    let sort_key = query
        .sort_by
        .as_deref()
        .map(SortKey::parse)
        .unwrap_or_default();

    let enrollments = state.db.list_enrollments_for_challenge(challenge_id).await?;

    let mut participants: Vec<Participant> = Vec::with_capacity(enrollments.len());
    for enrollment in &enrollments {
        let Some(user) = state.db.get_user(enrollment.user_id).await? else {
            tracing::warn!(
                user_id = %enrollment.user_id,
                %challenge_id,
                "Enrollment references missing user; skipping"
            );
            continue;
        };

        let submissions = state
            .db
            .list_submissions_for_participant(user.id, challenge_id)
            .await?
            .iter()
            .map(|s| s.daily_entry())
            .collect();

        participants.push(Participant {
            user_id: user.id,
            last_initial: user.last_initial(),
            first_name: user.first_name,
            submissions,
        });
    }

    let total_participants = participants.len() as u32;
    let today = today_utc();
    let leaderboard = rank_participants(participants, sort_key, today);

    let end_date = challenge.end_date();
    let status = challenge.status(today);

    Ok(Json(LeaderboardResponse {
        challenge_id: challenge.id,
        title: challenge.title,
        start_date: challenge.start_date,
        end_date,
        status,
        total_participants,
        sort_by: sort_key.as_str().to_string(),
        leaderboard,
    }))
}

// SPDX-License-Identifier: MIT

//! Admin endpoints: participant overview, CSV export, dashboard counts,
//! and storage cleanup for completed challenges.

use crate::error::{AppError, Result};
use crate::models::{ChallengeStatus, Submission, User};
use crate::services::storage::format_bytes;
use crate::time_utils::today_utc;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/admin/challenges/{id}/participants",
            get(list_participants),
        )
        .route("/api/admin/challenges/{id}/export", get(export_csv))
        .route("/api/admin/dashboard", get(dashboard))
        .route("/api/admin/storage-stats", get(storage_stats))
        .route("/api/admin/challenges/{id}/images", delete(delete_images))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ParticipantOverview {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub enrolled_at: String,
    pub submission_count: u32,
    pub total_steps: u64,
}

/// GET /api/admin/challenges/{id}/participants
async fn list_participants(
    State(state): State<Arc<AppState>>,
    Path(challenge_id): Path<Uuid>,
) -> Result<Json<Vec<ParticipantOverview>>> {
    state
        .db
        .get_challenge(challenge_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))?;

    let enrollments = state.db.list_enrollments_for_challenge(challenge_id).await?;

    let mut overviews = Vec::with_capacity(enrollments.len());
    for enrollment in &enrollments {
        let Some(user) = state.db.get_user(enrollment.user_id).await? else {
            continue;
        };

        let submissions = state
            .db
            .list_submissions_for_participant(user.id, challenge_id)
            .await?;

        overviews.push(ParticipantOverview {
            user_id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            enrolled_at: enrollment.enrolled_at.clone(),
            submission_count: submissions.len() as u32,
            total_steps: submissions.iter().map(|s| u64::from(s.step_count)).sum(),
        });
    }

    overviews.sort_by(|a, b| b.total_steps.cmp(&a.total_steps));

    Ok(Json(overviews))
}

/// GET /api/admin/challenges/{id}/export
///
/// CSV of every submission, joined with the submitter's profile.
/// Participants with no submissions still get one row so the export
/// covers the whole field.
async fn export_csv(
    State(state): State<Arc<AppState>>,
    Path(challenge_id): Path<Uuid>,
) -> Result<Response> {
    let challenge = state
        .db
        .get_challenge(challenge_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))?;

    let enrollments = state.db.list_enrollments_for_challenge(challenge_id).await?;
    let submissions = state.db.list_submissions_for_challenge(challenge_id).await?;

    let mut by_user: HashMap<Uuid, Vec<&Submission>> = HashMap::new();
    for submission in &submissions {
        by_user.entry(submission.user_id).or_default().push(submission);
    }

    let mut users: Vec<User> = Vec::with_capacity(enrollments.len());
    for enrollment in &enrollments {
        if let Some(user) = state.db.get_user(enrollment.user_id).await? {
            users.push(user);
        }
    }
    users.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));

    let mut csv = String::from("First Name,Last Name,Email,Date,Step Count,Submitted At\n");
    for user in &users {
        match by_user.get(&user.id) {
            Some(rows) => {
                let mut rows = rows.clone();
                rows.sort_by_key(|s| s.date);
                for row in rows {
                    csv.push_str(&format!(
                        "{},{},{},{},{},{}\n",
                        csv_field(&user.first_name),
                        csv_field(&user.last_name),
                        csv_field(&user.email),
                        row.date,
                        row.step_count,
                        csv_field(&row.submitted_at),
                    ));
                }
            }
            None => {
                csv.push_str(&format!(
                    "{},{},{},,,\n",
                    csv_field(&user.first_name),
                    csv_field(&user.last_name),
                    csv_field(&user.email),
                ));
            }
        }
    }

    let filename = format!(
        "challenge-{}-export.csv",
        challenge.start_date.format("%Y-%m-%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardResponse {
    pub total_users: u32,
    pub total_challenges: u32,
    pub active_challenges: u32,
    pub submissions_today: u32,
}

/// GET /api/admin/dashboard
async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Json<DashboardResponse>> {
    let today = today_utc();

    let total_users = state.db.count_regular_users().await? as u32;
    let challenges = state.db.list_challenges().await?;
    let active_challenges = challenges
        .iter()
        .filter(|c| c.status(today) == ChallengeStatus::Active)
        .count() as u32;
    let submissions_today = state.db.count_submissions_on_date(today).await? as u32;

    Ok(Json(DashboardResponse {
        total_users,
        total_challenges: challenges.len() as u32,
        active_challenges,
        submissions_today,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChallengeStorageStats {
    pub challenge_id: Uuid,
    pub title: String,
    pub status: ChallengeStatus,
    pub image_count: u32,
    pub total_bytes: u64,
    pub total_size: String,
    /// Completed challenges can have their images cleaned up
    pub cleanable: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StorageStatsResponse {
    pub challenges: Vec<ChallengeStorageStats>,
    pub total_bytes: u64,
    pub total_size: String,
    pub cleanable_bytes: u64,
    pub cleanable_size: String,
}

/// GET /api/admin/storage-stats
async fn storage_stats(State(state): State<Arc<AppState>>) -> Result<Json<StorageStatsResponse>> {
    let today = today_utc();
    let challenges = state.db.list_challenges().await?;

    let mut per_challenge = Vec::with_capacity(challenges.len());
    let mut total_bytes = 0u64;
    let mut cleanable_bytes = 0u64;

    for challenge in challenges {
        let submissions = state.db.list_submissions_for_challenge(challenge.id).await?;

        let mut image_count = 0u32;
        let mut bytes = 0u64;
        for submission in &submissions {
            if let Some(filename) = &submission.image_filename {
                image_count += 1;
                if let Some(size) = state.storage.file_size(filename).await {
                    bytes += size;
                }
            }
        }

        let status = challenge.status(today);
        let cleanable = status == ChallengeStatus::Completed && image_count > 0;

        total_bytes += bytes;
        if cleanable {
            cleanable_bytes += bytes;
        }

        per_challenge.push(ChallengeStorageStats {
            challenge_id: challenge.id,
            title: challenge.title,
            status,
            image_count,
            total_bytes: bytes,
            total_size: format_bytes(bytes),
            cleanable,
        });
    }

    Ok(Json(StorageStatsResponse {
        challenges: per_challenge,
        total_bytes,
        total_size: format_bytes(total_bytes),
        cleanable_bytes,
        cleanable_size: format_bytes(cleanable_bytes),
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteImagesResponse {
    pub deleted_count: u32,
    pub space_freed: u64,
    pub message: String,
}

/// DELETE /api/admin/challenges/{id}/images
///
/// Deletes the uploaded photos of a completed challenge and clears the
/// image references on its submissions. Active and upcoming challenges
/// are refused: their photos may still be needed for verification.
async fn delete_images(
    State(state): State<Arc<AppState>>,
    Path(challenge_id): Path<Uuid>,
) -> Result<Json<DeleteImagesResponse>> {
    let challenge = state
        .db
        .get_challenge(challenge_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))?;

    if challenge.status(today_utc()) != ChallengeStatus::Completed {
        return Err(AppError::BadRequest(
            "Images can only be deleted for completed challenges".to_string(),
        ));
    }

    let submissions = state.db.list_submissions_for_challenge(challenge_id).await?;

    let mut deleted_count = 0u32;
    let mut space_freed = 0u64;
    for submission in &submissions {
        if let Some(filename) = &submission.image_filename {
            let freed = state.storage.delete_file(filename).await;
            deleted_count += 1;
            space_freed += freed;
        }
    }

    state.db.clear_challenge_images(challenge_id).await?;

    tracing::info!(
        %challenge_id,
        deleted_count,
        space_freed,
        "Deleted challenge images"
    );

    Ok(Json(DeleteImagesResponse {
        deleted_count,
        space_freed,
        message: format!(
            "Deleted {} images, freed {}",
            deleted_count,
            format_bytes(space_freed)
        ),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("has,comma"), "\"has,comma\"");
        assert_eq!(csv_field("has \"quote\""), "\"has \"\"quote\"\"\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
    }
}

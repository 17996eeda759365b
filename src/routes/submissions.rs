// SPDX-License-Identifier: MIT

//! Daily step submissions and OCR step extraction.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Submission, MAX_STEP_COUNT};
use crate::services::storage::extension_for_content_type;
use crate::time_utils::{now_rfc3339, today_utc};
use crate::AppState;
use axum::extract::{Extension, Multipart, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Upload cap for step photos.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/submissions",
            post(create_submission).get(list_submissions),
        )
        .route("/api/submissions/extract-steps", post(extract_steps))
        .layer(axum::extract::DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
}

/// Multipart form fields for a submission, collected before validation.
#[derive(Default)]
struct SubmissionForm {
    challenge_id: Option<Uuid>,
    date: Option<NaiveDate>,
    step_count: Option<u32>,
    image: Option<(String, Vec<u8>)>,
}

async fn read_submission_form(mut multipart: Multipart) -> Result<SubmissionForm> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "challenge_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.challenge_id = Some(
                    text.parse()
                        .map_err(|_| AppError::BadRequest("Invalid challenge id".to_string()))?,
                );
            }
            "date" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.date = Some(text.parse().map_err(|_| {
                    AppError::BadRequest("Invalid date; expected YYYY-MM-DD".to_string())
                })?);
            }
            "step_count" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.step_count = Some(text.parse().map_err(|_| {
                    AppError::BadRequest("Step count must be a non-negative number".to_string())
                })?);
            }
            "step_image" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
                form.image = Some((content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /api/submissions (multipart)
async fn create_submission(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Submission>)> {
    let form = read_submission_form(multipart).await?;

    let challenge_id = form
        .challenge_id
        .ok_or_else(|| AppError::BadRequest("challenge_id is required".to_string()))?;
    let date = form
        .date
        .ok_or_else(|| AppError::BadRequest("date is required".to_string()))?;
    let step_count = form
        .step_count
        .ok_or_else(|| AppError::BadRequest("step_count is required".to_string()))?;

    if step_count > MAX_STEP_COUNT {
        return Err(AppError::BadRequest(format!(
            "Step count must be at most {}",
            MAX_STEP_COUNT
        )));
    }

    let challenge = state
        .db
        .get_challenge(challenge_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))?;

    if date < challenge.start_date || date > challenge.end_date() {
        return Err(AppError::BadRequest(
            "Date is outside the challenge period".to_string(),
        ));
    }
    if date > today_utc() {
        return Err(AppError::BadRequest(
            "Cannot submit steps for a future date".to_string(),
        ));
    }

    state
        .db
        .get_enrollment(auth_user.user_id, challenge_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("You are not enrolled in this challenge".to_string()))?;

    if state
        .db
        .get_submission(auth_user.user_id, challenge_id, date)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(
            "You already submitted steps for this date".to_string(),
        ));
    }

    let image_filename = match form.image {
        Some((content_type, bytes)) => {
            if bytes.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::BadRequest(
                    "Image exceeds the 10 MB upload limit".to_string(),
                ));
            }
            let extension = extension_for_content_type(&content_type).ok_or_else(|| {
                AppError::BadRequest("Only JPEG and PNG images are accepted".to_string())
            })?;
            Some(
                state
                    .storage
                    .save_image(auth_user.user_id, extension, &bytes)
                    .await?,
            )
        }
        None => None,
    };

    let submission = Submission {
        user_id: auth_user.user_id,
        challenge_id,
        date,
        step_count,
        image_filename,
        submitted_at: now_rfc3339(),
    };

    state.db.upsert_submission(&submission).await?;

    tracing::info!(
        user_id = %auth_user.user_id,
        %challenge_id,
        %date,
        step_count,
        "Recorded step submission"
    );

    Ok((StatusCode::CREATED, Json(submission)))
}

#[derive(Deserialize)]
pub struct ListSubmissionsQuery {
    pub challenge_id: Uuid,
}

/// GET /api/submissions?challenge_id=
///
/// The caller's own submissions for a challenge, date ascending.
async fn list_submissions(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ListSubmissionsQuery>,
) -> Result<Json<Vec<Submission>>> {
    let submissions = state
        .db
        .list_submissions_for_participant(auth_user.user_id, query.challenge_id)
        .await?;

    Ok(Json(submissions))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ExtractStepsResponse {
    pub success: bool,
    pub step_count: Option<u32>,
    pub confidence: f32,
    pub message: String,
    /// Raw OCR text, returned when no count was found so the user can
    /// see what was detected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
}

/// POST /api/submissions/extract-steps (multipart)
///
/// Runs OCR on an uploaded screenshot and suggests a step count. 503
/// when the Vision integration is disabled.
async fn extract_steps(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<Json<ExtractStepsResponse>> {
    if !state.vision.is_available() {
        return Err(AppError::ServiceUnavailable(
            "OCR service is not available; enter the step count manually".to_string(),
        ));
    }

    let form = read_submission_form(multipart).await?;
    let (content_type, bytes) = form
        .image
        .ok_or_else(|| AppError::BadRequest("step_image is required".to_string()))?;

    if extension_for_content_type(&content_type).is_none() {
        return Err(AppError::BadRequest(
            "Only JPEG and PNG images are accepted".to_string(),
        ));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest(
            "Image exceeds the 10 MB upload limit".to_string(),
        ));
    }

    let ocr = state.vision.extract_steps(&bytes).await?;

    tracing::debug!(
        user_id = %auth_user.user_id,
        step_count = ?ocr.step_count,
        "OCR extraction finished"
    );

    let (message, full_text) = match ocr.step_count {
        Some(steps) => (format!("Detected {} steps", steps), None),
        None => (
            "Could not find a step count in the image; enter it manually".to_string(),
            Some(ocr.full_text),
        ),
    };

    Ok(Json(ExtractStepsResponse {
        success: ocr.step_count.is_some(),
        step_count: ocr.step_count,
        confidence: ocr.confidence,
        message,
        full_text,
    }))
}

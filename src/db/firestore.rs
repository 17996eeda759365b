// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile + password hash storage)
//! - Challenges
//! - Enrollments (join collection, keyed `{user_id}_{challenge_id}`)
//! - Submissions (keyed `{user_id}_{challenge_id}_{date}` so the
//!   one-submission-per-day invariant holds at the storage layer)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Challenge, Enrollment, Submission, User};
use chrono::NaiveDate;
use futures_util::{stream, StreamExt};
use uuid::Uuid;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by id.
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Look up a user by email (unique at registration time).
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let mut matches: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("email").eq(email.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(matches.pop())
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user.id.to_string())
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count non-admin users (admin dashboard).
    pub async fn count_regular_users(&self) -> Result<usize, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.field("is_admin").eq(false))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.len())
    }

    // ─── Challenge Operations ────────────────────────────────────

    /// Get a challenge by id.
    pub async fn get_challenge(&self, challenge_id: Uuid) -> Result<Option<Challenge>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHALLENGES)
            .obj()
            .one(&challenge_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a challenge.
    pub async fn upsert_challenge(&self, challenge: &Challenge) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CHALLENGES)
            .document_id(challenge.id.to_string())
            .object(challenge)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List all challenges, newest start date first.
    pub async fn list_challenges(&self) -> Result<Vec<Challenge>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHALLENGES)
            .order_by([(
                "start_date",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Enrollment Operations ───────────────────────────────────

    /// Get a user's enrollment in a challenge, if any.
    pub async fn get_enrollment(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> Result<Option<Enrollment>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ENROLLMENTS)
            .obj()
            .one(&Enrollment::doc_id(user_id, challenge_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create an enrollment (idempotent thanks to the composite doc id).
    pub async fn upsert_enrollment(&self, enrollment: &Enrollment) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ENROLLMENTS)
            .document_id(Enrollment::doc_id(
                enrollment.user_id,
                enrollment.challenge_id,
            ))
            .object(enrollment)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All enrollments for a challenge.
    pub async fn list_enrollments_for_challenge(
        &self,
        challenge_id: Uuid,
    ) -> Result<Vec<Enrollment>, AppError> {
        let challenge_id = challenge_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ENROLLMENTS)
            .filter(move |q| q.field("challenge_id").eq(challenge_id.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All enrollments for a user.
    pub async fn list_enrollments_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Enrollment>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ENROLLMENTS)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Submission Operations ───────────────────────────────────

    /// Get one user's submission for a specific challenge day.
    pub async fn get_submission(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Submission>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SUBMISSIONS)
            .obj()
            .one(&Submission::doc_id(user_id, challenge_id, date))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a submission under its composite document id.
    pub async fn upsert_submission(&self, submission: &Submission) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SUBMISSIONS)
            .document_id(Submission::doc_id(
                submission.user_id,
                submission.challenge_id,
                submission.date,
            ))
            .object(submission)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// One participant's submissions for a challenge, date ascending.
    pub async fn list_submissions_for_participant(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> Result<Vec<Submission>, AppError> {
        let user_id = user_id.to_string();
        let challenge_id = challenge_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SUBMISSIONS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("challenge_id").eq(challenge_id.clone()),
                ])
            })
            .order_by([("date", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every submission for a challenge (leaderboard, export, cleanup).
    pub async fn list_submissions_for_challenge(
        &self,
        challenge_id: Uuid,
    ) -> Result<Vec<Submission>, AppError> {
        let challenge_id = challenge_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SUBMISSIONS)
            .filter(move |q| q.field("challenge_id").eq(challenge_id.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count submissions made for a given calendar date (admin dashboard).
    pub async fn count_submissions_on_date(&self, date: NaiveDate) -> Result<usize, AppError> {
        let date = date.to_string();
        let submissions: Vec<Submission> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::SUBMISSIONS)
            .filter(move |q| q.field("date").eq(date.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(submissions.len())
    }

    /// Clear `image_filename` on every submission of a challenge
    /// (soft delete after the files are removed from disk).
    ///
    /// Fetch-modify-write per document to preserve the other fields;
    /// writes run concurrently with a bounded fan-out.
    ///
    /// Returns the number of submissions that had an image reference.
    pub async fn clear_challenge_images(&self, challenge_id: Uuid) -> Result<usize, AppError> {
        let with_images: Vec<Submission> = self
            .list_submissions_for_challenge(challenge_id)
            .await?
            .into_iter()
            .filter(|s| s.image_filename.is_some())
            .collect();

        let cleared = with_images.len();
        let client = self.get_client()?;

        stream::iter(with_images)
            .map(|mut submission| async move {
                submission.image_filename = None;

                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::SUBMISSIONS)
                    .document_id(Submission::doc_id(
                        submission.user_id,
                        submission.challenge_id,
                        submission.date,
                    ))
                    .object(&submission)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        tracing::info!(%challenge_id, cleared, "Cleared submission image references");

        Ok(cleared)
    }
}

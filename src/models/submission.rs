// SPDX-License-Identifier: MIT

//! Daily step submission model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::leaderboard::DailyEntry;

/// Highest accepted step count for a single day.
pub const MAX_STEP_COUNT: u32 = 100_000;

/// One user's step submission for one challenge day.
///
/// The Firestore document id is `{user_id}_{challenge_id}_{date}`, which
/// enforces at most one submission per user per challenge per day.
/// Immutable after creation, except `image_filename` may be cleared by
/// the admin storage cleanup (soft delete).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    /// Calendar day the steps were taken (no time component)
    pub date: NaiveDate,
    /// Steps reported for the day (0..=100000)
    pub step_count: u32,
    /// Uploaded proof photo, if any
    pub image_filename: Option<String>,
    /// When the submission was created (ISO 8601)
    pub submitted_at: String,
}

impl Submission {
    /// Composite document id enforcing the per-day uniqueness invariant.
    pub fn doc_id(user_id: Uuid, challenge_id: Uuid, date: NaiveDate) -> String {
        format!("{}_{}_{}", user_id, challenge_id, date)
    }

    /// Project to the aggregator's input row.
    pub fn daily_entry(&self) -> DailyEntry {
        DailyEntry {
            date: self.date,
            step_count: self.step_count,
        }
    }
}

/// Enrollment linking a user to a challenge.
///
/// Document id `{user_id}_{challenge_id}`; created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    /// When the user joined (ISO 8601)
    pub enrolled_at: String,
}

impl Enrollment {
    pub fn doc_id(user_id: Uuid, challenge_id: Uuid) -> String {
        format!("{}_{}", user_id, challenge_id)
    }
}

// SPDX-License-Identifier: MIT

//! Challenge model. Status is derived from the current date, never stored.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::services::leaderboard::CHALLENGE_DAYS;

/// A 30-day challenge stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    /// Challenge id (also used as document ID)
    pub id: Uuid,
    /// Display title
    pub title: String,
    /// First day of the challenge
    pub start_date: NaiveDate,
    /// Admin who created the challenge
    pub created_by: Uuid,
    /// When the challenge was created (ISO 8601)
    pub created_at: String,
}

/// Lifecycle phase relative to the current date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ChallengeStatus {
    Upcoming,
    Active,
    Completed,
}

impl Challenge {
    /// Last day of the challenge (inclusive): `start_date + 29`.
    pub fn end_date(&self) -> NaiveDate {
        self.start_date + Days::new(u64::from(CHALLENGE_DAYS - 1))
    }

    /// Derive the status for a given current date.
    pub fn status(&self, today: NaiveDate) -> ChallengeStatus {
        if today < self.start_date {
            ChallengeStatus::Upcoming
        } else if today <= self.end_date() {
            ChallengeStatus::Active
        } else {
            ChallengeStatus::Completed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge(start: NaiveDate) -> Challenge {
        Challenge {
            id: Uuid::new_v4(),
            title: "August Steps".to_string(),
            start_date: start,
            created_by: Uuid::new_v4(),
            created_at: String::new(),
        }
    }

    #[test]
    fn test_end_date_is_start_plus_29() {
        let start = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let c = challenge(start);
        assert_eq!(c.end_date(), NaiveDate::from_ymd_opt(2026, 8, 30).unwrap());
    }

    #[test]
    fn test_status_boundaries() {
        let start = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let c = challenge(start);

        let day_before = NaiveDate::from_ymd_opt(2026, 7, 31).unwrap();
        let last_day = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let day_after = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();

        assert_eq!(c.status(day_before), ChallengeStatus::Upcoming);
        assert_eq!(c.status(start), ChallengeStatus::Active);
        assert_eq!(c.status(last_day), ChallengeStatus::Active);
        assert_eq!(c.status(day_after), ChallengeStatus::Completed);
    }
}

// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod challenge;
pub mod submission;
pub mod user;

pub use challenge::{Challenge, ChallengeStatus};
pub use submission::{Enrollment, Submission, MAX_STEP_COUNT};
pub use user::User;

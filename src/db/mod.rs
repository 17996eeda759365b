//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CHALLENGES: &str = "challenges";
    /// Enrollments (keyed by `{user_id}_{challenge_id}`)
    pub const ENROLLMENTS: &str = "enrollments";
    /// Submissions (keyed by `{user_id}_{challenge_id}_{date}`)
    pub const SUBMISSIONS: &str = "submissions";
}

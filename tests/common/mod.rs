// SPDX-License-Identifier: MIT

use std::sync::Arc;
use step_challenge::config::Config;
use step_challenge::db::FirestoreDb;
use step_challenge::routes::create_router;
use step_challenge::services::{StorageService, VisionService};
use step_challenge::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let db = test_db_offline();
    let storage = StorageService::new(std::env::temp_dir().join("step-challenge-tests"));
    let vision = VisionService::new_disabled();

    let state = Arc::new(AppState {
        config,
        db,
        storage,
        vision,
    });

    (create_router(state.clone()), state)
}

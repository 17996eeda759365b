// SPDX-License-Identifier: MIT

//! Step Challenge API Server
//!
//! Backend for 30-day step-count challenges: registration, daily step
//! submissions with optional OCR verification, and live leaderboards.

use std::sync::Arc;
use step_challenge::{
    config::Config,
    db::FirestoreDb,
    services::{StorageService, VisionService},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Step Challenge API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Prepare local upload storage
    let storage = StorageService::new(&config.upload_dir);
    storage
        .ensure_upload_dir()
        .await
        .expect("Failed to create upload directory");
    tracing::info!(dir = %config.upload_dir, "Upload storage ready");

    // Vision OCR is optional; without a key users enter counts manually
    let vision = if config.vision_enabled {
        tracing::info!("Vision OCR integration enabled");
        VisionService::new(config.vision_api_key.clone())
    } else {
        tracing::info!("Vision OCR integration disabled");
        VisionService::new_disabled()
    };

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        storage,
        vision,
    });

    // Build router
    let app = step_challenge::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("step_challenge=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}

// SPDX-License-Identifier: MIT

//! Step Challenge: 30-day step-count challenges with a leaderboard.
//!
//! This crate provides the backend API for enrolling in challenges,
//! submitting daily step counts (optionally verified by OCR from an
//! uploaded photo), and computing ranked leaderboards, streaks, and
//! per-participant attendance grids.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{StorageService, VisionService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub storage: StorageService,
    pub vision: VisionService,
}

// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod leaderboard;
pub mod storage;
pub mod vision;

pub use storage::StorageService;
pub use vision::VisionService;

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity-Metrics: sample extraction and training metrics for fitness
//! webhook payloads
//!
//! This crate provides the backend API that reads activity webhooks from
//! PostgreSQL, turns their telemetry into cleaned sample rows, and derives
//! pace, intensity, training stress and energy metrics from them.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{ActivityService, PhysiologicalModel};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub activities: ActivityService,
    /// `None` when `PHYSIO_MODEL=none`
    pub physio_model: Option<Arc<dyn PhysiologicalModel>>,
}

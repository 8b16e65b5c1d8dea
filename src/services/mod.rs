// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activity;
pub mod aggregator;
pub mod cache;
pub mod dashboard;
pub mod extractor;
pub mod metrics;
pub mod normalizer;
pub mod physiology;

pub use activity::ActivityService;
pub use aggregator::extract_all_samples;
pub use cache::QueryCache;
pub use extractor::extract_samples;
pub use metrics::MetricsError;
pub use normalizer::normalize_record;
pub use physiology::{load_model, MinettiModel, PhysiologicalModel};

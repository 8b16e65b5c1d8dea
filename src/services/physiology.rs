// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Physiological models for grade-adjusted pace and energy cost.

use crate::config::PhysioModelKind;
use std::sync::Arc;

/// Grade range over which the Minetti polynomial was fitted.
const MINETTI_GRADE_LIMIT: f64 = 0.45;

/// Grade-dependent running physiology.
pub trait PhysiologicalModel: Send + Sync {
    /// Multiplier converting speed on a grade into equivalent flat speed.
    fn ngp_speed_factor(&self, grade: f64) -> f64;

    /// Energy cost of running in J/kg/m at the given grade.
    fn cost_of_running(&self, grade: f64) -> f64;
}

/// Minetti et al. (2002) energy cost of running.
///
/// `C(i) = 155.4i^5 - 30.4i^4 - 43.3i^3 + 46.3i^2 + 19.5i + 3.6` J/kg/m,
/// with `i` clamped to ±0.45. The NGP factor is the cost ratio against
/// flat ground.
#[derive(Debug, Default, Clone, Copy)]
pub struct MinettiModel;

impl PhysiologicalModel for MinettiModel {
    fn ngp_speed_factor(&self, grade: f64) -> f64 {
        self.cost_of_running(grade) / self.cost_of_running(0.0)
    }

    fn cost_of_running(&self, grade: f64) -> f64 {
        let i = if grade.is_nan() {
            0.0
        } else {
            grade.clamp(-MINETTI_GRADE_LIMIT, MINETTI_GRADE_LIMIT)
        };
        155.4 * i.powi(5) - 30.4 * i.powi(4) - 43.3 * i.powi(3) + 46.3 * i.powi(2) + 19.5 * i
            + 3.6
    }
}

/// Build the configured model, or `None` when disabled.
pub fn load_model(kind: PhysioModelKind) -> Option<Arc<dyn PhysiologicalModel>> {
    match kind {
        PhysioModelKind::Minetti => Some(Arc::new(MinettiModel)),
        PhysioModelKind::Disabled => {
            tracing::warn!("Physiological model disabled; NGP and energy metrics unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_cost() {
        assert!((MinettiModel.cost_of_running(0.0) - 3.6).abs() < 1e-12);
        assert!((MinettiModel.ngp_speed_factor(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_uphill_costs_more() {
        let model = MinettiModel;
        assert!(model.cost_of_running(0.1) > model.cost_of_running(0.0));
        assert!(model.ngp_speed_factor(0.1) > 1.0);
    }

    #[test]
    fn test_grade_is_clamped() {
        let model = MinettiModel;
        assert_eq!(model.cost_of_running(2.0), model.cost_of_running(0.45));
        assert_eq!(model.cost_of_running(f64::NAN), 3.6);
    }

    #[test]
    fn test_load_model() {
        assert!(load_model(PhysioModelKind::Minetti).is_some());
        assert!(load_model(PhysioModelKind::Disabled).is_none());
    }
}

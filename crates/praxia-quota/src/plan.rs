//! Transcription plan catalog

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reference data for one transcription plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionPlan {
    /// Plan slug
    pub slug: String,
    /// Included minutes per calendar month
    pub monthly_minutes_limit: u64,
    /// Whether per-tenant custom limits apply
    pub allows_custom_limits: bool,
    /// Whether consumption may continue past the limit
    pub allows_overage: bool,
    /// Default cost per transcribed minute, USD
    pub cost_per_minute: f64,
    /// Whether this is a trial plan
    pub is_trial: bool,
    /// Trial length in days; meaningful only when `is_trial`
    pub trial_days: u32,
}

/// Catalog of plans and per-model rates
pub struct PlanCatalog {
    plans: HashMap<String, TranscriptionPlan>,
    model_rates: HashMap<String, f64>,
}

impl PlanCatalog {
    /// Catalog seeded with the standard plan lineup
    pub fn new() -> Self {
        let mut plans = HashMap::new();

        plans.insert(
            "trial".into(),
            TranscriptionPlan {
                slug: "trial".into(),
                monthly_minutes_limit: 120,
                allows_custom_limits: false,
                allows_overage: false,
                cost_per_minute: 0.0,
                is_trial: true,
                trial_days: 14,
            },
        );
        plans.insert(
            "starter".into(),
            TranscriptionPlan {
                slug: "starter".into(),
                monthly_minutes_limit: 600,
                allows_custom_limits: false,
                allows_overage: false,
                cost_per_minute: 0.006,
                is_trial: false,
                trial_days: 0,
            },
        );
        plans.insert(
            "professional".into(),
            TranscriptionPlan {
                slug: "professional".into(),
                monthly_minutes_limit: 2400,
                allows_custom_limits: false,
                allows_overage: true,
                cost_per_minute: 0.006,
                is_trial: false,
                trial_days: 0,
            },
        );
        plans.insert(
            "enterprise".into(),
            TranscriptionPlan {
                slug: "enterprise".into(),
                monthly_minutes_limit: 12_000,
                allows_custom_limits: true,
                allows_overage: true,
                cost_per_minute: 0.005,
                is_trial: false,
                trial_days: 0,
            },
        );

        let mut model_rates = HashMap::new();
        model_rates.insert("standard".into(), 0.006);
        model_rates.insert("enhanced".into(), 0.009);
        model_rates.insert("medical".into(), 0.012);

        Self { plans, model_rates }
    }

    /// Plan by slug
    pub fn get(&self, slug: &str) -> Option<&TranscriptionPlan> {
        self.plans.get(slug)
    }

    /// Per-minute rate for a transcription model, if priced separately
    pub fn rate_for_model(&self, model: &str) -> Option<f64> {
        self.model_rates.get(model).copied()
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_seeds_standard_lineup() {
        let catalog = PlanCatalog::new();
        assert!(catalog.get("trial").unwrap().is_trial);
        assert!(catalog.get("enterprise").unwrap().allows_custom_limits);
        assert!(!catalog.get("professional").unwrap().allows_custom_limits);
        assert!(catalog.get("ghost").is_none());
    }

    #[test]
    fn test_model_rates() {
        let catalog = PlanCatalog::new();
        assert_eq!(catalog.rate_for_model("medical"), Some(0.012));
        assert_eq!(catalog.rate_for_model("unknown"), None);
    }
}

//! Vendor compliance risk
//!
//! Two scorers:
//! - [`predict_risk`]: the registration-time score computed from a vendor's
//!   filing record; used when vendors are created and by `/api/predict-risk`
//! - [`ComplianceModel`]: a weighted heuristic over graph-derived features,
//!   used to assess every vendor in the graph

pub mod features;
pub mod model;

use serde::{Deserialize, Serialize};

use crate::models::VendorStatus;

pub use features::{extract_features, ComplianceFeatures, VendorFeatures, FEATURE_NAMES};
pub use model::{
    generate_synthetic_profiles, ComplianceLevel, ComplianceModel, FeatureImportance,
    VendorAssessment,
};

/// Filing record used for the registration-time risk score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorProfile {
    #[serde(default)]
    pub missed_filings: i64,
    #[serde(default)]
    pub avg_days_late: f64,
    #[serde(default = "default_transactions")]
    pub total_transactions: i64,
}

fn default_transactions() -> i64 {
    100
}

const MIN_SCORE: f64 = 0.05;
const MAX_SCORE: f64 = 0.95;

/// Weighted risk score in `[0.05, 0.95]`
pub fn predict_risk(profile: &VendorProfile) -> f64 {
    let missed = profile.missed_filings.max(0) as f64;
    let late = profile.avg_days_late.max(0.0);

    let filing_factor = (missed / 6.0).min(1.0);
    let delay_factor = (late / 20.0).min(1.0);
    let volume_factor = match profile.total_transactions {
        t if t < 50 => 0.8,
        t if t < 100 => 0.4,
        _ => 0.1,
    };
    let einvoice_factor = if profile.missed_filings > 2 { 0.7 } else { 0.2 };
    // Network position is unknown at registration; use the midpoint
    let network_factor = 0.3;

    let score = filing_factor * 0.28
        + delay_factor * 0.22
        + volume_factor * 0.12
        + einvoice_factor * 0.12
        + network_factor * 0.08;

    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// Map a risk score to a vendor status
pub fn classify_risk(score: f64) -> VendorStatus {
    if score >= 0.6 {
        VendorStatus::HighRisk
    } else if score >= 0.3 {
        VendorStatus::Review
    } else {
        VendorStatus::Compliant
    }
}

/// Round to `places` decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(missed: i64, late: f64, transactions: i64) -> VendorProfile {
        VendorProfile {
            missed_filings: missed,
            avg_days_late: late,
            total_transactions: transactions,
        }
    }

    #[test]
    fn test_clean_vendor_scores_low() {
        // 0.1*0.12 + 0.2*0.12 + 0.3*0.08
        let score = predict_risk(&profile(0, 0.0, 245));
        assert!((score - 0.06).abs() < 1e-9);
        assert_eq!(classify_risk(score), VendorStatus::Compliant);
    }

    #[test]
    fn test_delinquent_vendor_scores_high() {
        // 4/6*0.28 + 12/20*0.22 + 0.4*0.12 + 0.7*0.12 + 0.024
        let score = predict_risk(&profile(4, 12.0, 67));
        assert!((score - 0.4747).abs() < 1e-3);
        assert_eq!(classify_risk(score), VendorStatus::Review);

        let worst = predict_risk(&profile(10, 40.0, 5));
        assert!((worst - (0.28 + 0.22 + 0.096 + 0.084 + 0.024)).abs() < 1e-9);
        assert_eq!(classify_risk(worst), VendorStatus::HighRisk);
    }

    #[test]
    fn test_score_is_clamped() {
        for missed in 0..20 {
            for late in [0.0, 5.0, 50.0] {
                for tx in [0, 60, 500] {
                    let s = predict_risk(&profile(missed, late, tx));
                    assert!((MIN_SCORE..=MAX_SCORE).contains(&s));
                }
            }
        }
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify_risk(0.29), VendorStatus::Compliant);
        assert_eq!(classify_risk(0.3), VendorStatus::Review);
        assert_eq!(classify_risk(0.59), VendorStatus::Review);
        assert_eq!(classify_risk(0.6), VendorStatus::HighRisk);
    }

    #[test]
    fn test_profile_defaults_transactions() {
        let p: VendorProfile = serde_json::from_str(r#"{"missedFilings": 2}"#).unwrap();
        assert_eq!(p.total_transactions, 100);
        assert_eq!(p.avg_days_late, 0.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.48266, 2), 0.48);
        assert_eq!(round_to(0.48266, 4), 0.4827);
    }
}

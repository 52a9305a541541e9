//! Static compliance model over [`ComplianceFeatures`]
//!
//! Each feature is mapped onto a comparable scale and weighted; the weighted
//! sum is turned into a probability with a logistic curve centred on the
//! decision threshold. Fitting only places that threshold (the 70th
//! percentile of a reference population, so roughly 30% of vendors fall on
//! the non-compliant side) and measures how much each feature moves the
//! score across the population.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Beta, Distribution, Exp, Poisson};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::features::{ComplianceFeatures, VendorFeatures, FEATURE_NAMES};
use crate::{Error, Result};

/// Weights applied to the scaled features, in [`FEATURE_NAMES`] order
const WEIGHTS: [f64; 8] = [0.25, 0.20, 0.15, 0.10, 0.05, 0.0, 0.15, 0.10];

/// Share of the reference population scored compliant
const COMPLIANT_QUANTILE: f64 = 0.7;

const DEFAULT_THRESHOLD: f64 = 1.4;
const STEEPNESS: f64 = 3.0;

/// Size and seed of the reference population used by [`ComplianceModel::reference`]
pub const REFERENCE_SAMPLES: usize = 500;
pub const REFERENCE_SEED: u64 = 42;

/// Model output class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplianceLevel {
    Low,
    Medium,
    High,
}

impl ComplianceLevel {
    pub fn from_probability(p: f64) -> Self {
        if p < 0.3 {
            ComplianceLevel::Low
        } else if p < 0.6 {
            ComplianceLevel::Medium
        } else {
            ComplianceLevel::High
        }
    }
}

/// Relative influence of one feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: &'static str,
    pub importance: f64,
}

/// Model verdict for one vendor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorAssessment {
    pub gstin: String,
    pub name: String,
    pub probability: f64,
    pub level: ComplianceLevel,
    pub features: ComplianceFeatures,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplianceModel {
    threshold: f64,
    importance: [f64; 8],
}

impl Default for ComplianceModel {
    /// Unfitted model: default threshold, importance equal to the weights
    fn default() -> Self {
        let total: f64 = WEIGHTS.iter().sum();
        Self {
            threshold: DEFAULT_THRESHOLD,
            importance: WEIGHTS.map(|w| w / total),
        }
    }
}

/// Put every feature on a scale where larger means riskier
fn scale(f: &ComplianceFeatures) -> [f64; 8] {
    [
        f.mismatch_count,
        f.total_tax_at_risk / 100_000.0,
        f.filing_delay_days,
        f.graph_centrality,
        1.0 - (f.transaction_volume / 200.0).min(1.0),
        f.community_cluster,
        1.0 - f.einvoice_compliance_rate,
        f.state_risk_factor,
    ]
}

fn contributions(f: &ComplianceFeatures) -> [f64; 8] {
    let scaled = scale(f);
    std::array::from_fn(|i| scaled[i] * WEIGHTS[i])
}

fn raw_score(f: &ComplianceFeatures) -> f64 {
    contributions(f).iter().sum()
}

impl ComplianceModel {
    /// Place the threshold and measure importance on a population
    pub fn fit(population: &[ComplianceFeatures]) -> Self {
        if population.is_empty() {
            return Self::default();
        }

        let mut scores: Vec<f64> = population.iter().map(raw_score).collect();
        scores.sort_by(f64::total_cmp);
        let idx = ((scores.len() - 1) as f64 * COMPLIANT_QUANTILE).round() as usize;
        let threshold = scores[idx];

        // Mean absolute deviation of each feature's contribution
        let n = population.len() as f64;
        let all: Vec<[f64; 8]> = population.iter().map(contributions).collect();
        let mut importance: [f64; 8] = std::array::from_fn(|i| {
            let mean = all.iter().map(|c| c[i]).sum::<f64>() / n;
            all.iter().map(|c| (c[i] - mean).abs()).sum::<f64>() / n
        });
        let total: f64 = importance.iter().sum();
        if total > 0.0 {
            for v in importance.iter_mut() {
                *v /= total;
            }
        }

        debug!("Fitted compliance model: threshold {:.3}", threshold);
        Self {
            threshold,
            importance,
        }
    }

    /// Model fitted on the seeded synthetic reference population
    pub fn reference() -> Result<Self> {
        let population = generate_synthetic_profiles(REFERENCE_SAMPLES, REFERENCE_SEED)?;
        Ok(Self::fit(&population))
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Probability of non-compliance and its class
    pub fn predict(&self, features: &ComplianceFeatures) -> (f64, ComplianceLevel) {
        let z = STEEPNESS * (raw_score(features) - self.threshold);
        let p = 1.0 / (1.0 + (-z).exp());
        (p, ComplianceLevel::from_probability(p))
    }

    /// Assess graph vendors, riskiest first
    pub fn assess(&self, vendors: &[VendorFeatures]) -> Vec<VendorAssessment> {
        let mut out: Vec<VendorAssessment> = vendors
            .iter()
            .map(|v| {
                let (probability, level) = self.predict(&v.features);
                VendorAssessment {
                    gstin: v.gstin.clone(),
                    name: v.name.clone(),
                    probability,
                    level,
                    features: v.features,
                }
            })
            .collect();
        out.sort_by(|a, b| {
            b.probability
                .total_cmp(&a.probability)
                .then_with(|| a.gstin.cmp(&b.gstin))
        });
        out
    }

    /// Importance per feature, largest first
    pub fn feature_importance(&self) -> Vec<FeatureImportance> {
        let mut out: Vec<FeatureImportance> = FEATURE_NAMES
            .iter()
            .zip(self.importance)
            .map(|(feature, importance)| FeatureImportance {
                feature: *feature,
                importance,
            })
            .collect();
        out.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        out
    }
}

fn distribution_error(e: impl std::fmt::Display) -> Error {
    Error::Internal(format!("Invalid distribution parameters: {}", e))
}

/// Deterministic demonstration population
pub fn generate_synthetic_profiles(n: usize, seed: u64) -> Result<Vec<ComplianceFeatures>> {
    let mut rng = StdRng::seed_from_u64(seed);

    let mismatches = Poisson::new(2.0).map_err(distribution_error)?;
    let tax = Exp::new(1.0 / 50_000.0).map_err(distribution_error)?;
    let delay = Poisson::new(3.0).map_err(distribution_error)?;
    let centrality = Beta::new(2.0, 5.0).map_err(distribution_error)?;
    let volume = Poisson::new(100.0).map_err(distribution_error)?;
    let einvoice = Beta::new(8.0, 2.0).map_err(distribution_error)?;
    let state = Beta::new(3.0, 3.0).map_err(distribution_error)?;

    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let mismatch_count: f64 = mismatches.sample(&mut rng);
        let total_tax_at_risk: f64 = tax.sample(&mut rng);
        let filing_delay_days: f64 = delay.sample(&mut rng);
        let graph_centrality: f64 = centrality.sample(&mut rng);
        let transaction_volume: f64 = volume.sample(&mut rng);
        let community_cluster = rng.gen_range(0..10) as f64;
        let einvoice_compliance_rate: f64 = einvoice.sample(&mut rng);
        let state_risk_factor: f64 = state.sample(&mut rng);

        out.push(ComplianceFeatures {
            mismatch_count,
            total_tax_at_risk,
            filing_delay_days,
            graph_centrality,
            transaction_volume,
            community_cluster,
            einvoice_compliance_rate,
            state_risk_factor,
        });
    }
    Ok(out)
}

//! Credit scoring engine.
//!
//! Turns a validated [`FinancialProfile`] into a [`ScoreResult`] using the
//! trained ensemble when one is loaded, or a deterministic rule-based
//! formula otherwise. Inference failures degrade to the rule for that
//! request only; `score` is total on valid input.

use rand::Rng;
use std::sync::Arc;

use crate::model::{CreditModel, InferenceError};
use crate::models::{
    FactorBreakdown, LenderRecommendation, RefreshOutcome, RiskBand, ScoreResult,
};
use crate::validation::{FinancialProfile, ProfileInput, ValidationError};

/// Confidence reported whenever the rule-based fallback produced the score.
pub const FALLBACK_CONFIDENCE: f64 = 0.82;

const SCORE_MIN: f64 = 300.0;
const SCORE_MAX: f64 = 900.0;

/// Advisory messages paired with the threshold check that triggers each,
/// evaluated in this exact order.
const ADVISORY_BILLS: &str = "Set up auto-pay for utility bills. Consistent on-time payments can \
     boost your score by up to 144 points over 24 months.";
const ADVISORY_SAVINGS: &str = "Save even \u{20b9}200 per month consistently. A regular savings \
     pattern could add up to 90 points to your score.";
const ADVISORY_RECHARGE: &str = "Maintain a monthly mobile recharge plan. Regularity signals \
     financial stability to lenders.";
const ADVISORY_UPI: &str = "Use UPI for everyday purchases. Each transaction builds your digital \
     financial footprint.";
const ADVISORY_AVG: &str = "Gradually increase transaction size as income grows. Higher average \
     values demonstrate financial capacity.";
const POSITIVE_MESSAGE: &str = "Excellent profile! Consider applying for your first micro-loan \
     to further build credit history.";

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// The scoring engine. Holds the optional model handle, resolved once at
/// initialization and never reassigned.
#[derive(Clone)]
pub struct ScoringEngine {
    model: Option<Arc<CreditModel>>,
}

impl ScoringEngine {
    pub fn new(model: Option<Arc<CreditModel>>) -> Self {
        Self { model }
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Scores a validated profile. Never fails: inference errors fall back
    /// to the rule-based formula for this request only.
    pub fn score(&self, profile: &FinancialProfile) -> ScoreResult {
        let (credit_score, confidence) = match &self.model {
            Some(model) => match Self::model_score(model, profile) {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "model inference failed, using rule-based fallback");
                    (Self::rule_based_score(profile), FALLBACK_CONFIDENCE)
                }
            },
            None => (Self::rule_based_score(profile), FALLBACK_CONFIDENCE),
        };

        let factors = Self::factor_contributions(profile);
        let recommendations = Self::recommendations(profile);

        ScoreResult {
            credit_score,
            confidence,
            factors,
            recommendations,
            risk_band: RiskBand::from_score(credit_score),
            lender_recommendation: LenderRecommendation::from_score(credit_score),
        }
    }

    /// Primary path: ensemble prediction is the mean of the per-tree
    /// predictions; confidence derives from their population standard
    /// deviation, `clamp(1 - stddev/200, 0.60, 0.99)`.
    fn model_score(
        model: &CreditModel,
        profile: &FinancialProfile,
    ) -> Result<(u16, f64), InferenceError> {
        let features = profile.feature_vector();
        let predictions = model.estimator_predictions(&features)?;

        let n = predictions.len() as f64;
        let mean = predictions.iter().sum::<f64>() / n;
        let variance = predictions.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        let credit_score = mean.clamp(SCORE_MIN, SCORE_MAX).round() as u16;
        let confidence = round2((1.0 - std_dev / 200.0).clamp(0.60, 0.99));
        Ok((credit_score, confidence))
    }

    /// Fallback rule-based scoring when the ensemble is unavailable.
    pub fn rule_based_score(profile: &FinancialProfile) -> u16 {
        let score = 300.0
            + f64::from(profile.bill_payments_on_time) * 12.0
            + profile.mobile_recharge_regularity * 150.0
            + profile.savings_pattern * 180.0
            + (f64::from(profile.upi_transactions) * 0.5).min(50.0)
            + (profile.avg_transaction * 0.02).min(30.0);
        score.clamp(SCORE_MIN, SCORE_MAX) as u16
    }

    /// Normalized contribution of each factor, as percentages rounded to one
    /// decimal. Independent of which path produced the score.
    pub fn factor_contributions(profile: &FinancialProfile) -> FactorBreakdown {
        let upi = f64::from(profile.upi_transactions) * 2.0;
        let avg = (profile.avg_transaction * 0.05).min(50.0);
        let bills = f64::from(profile.bill_payments_on_time) * 12.0;
        let recharge = profile.mobile_recharge_regularity * 150.0;
        let savings = profile.savings_pattern * 180.0;

        let mut total = upi + avg + bills + recharge + savings;
        if total == 0.0 {
            total = 1.0;
        }

        FactorBreakdown {
            upi_volume: round1(upi / total * 100.0),
            avg_transaction_value: round1(avg / total * 100.0),
            bill_payment_history: round1(bills / total * 100.0),
            recharge_regularity: round1(recharge / total * 100.0),
            savings_behavior: round1(savings / total * 100.0),
        }
    }

    /// Actionable recommendations for weak factors, in fixed evaluation
    /// order, truncated to the first 3. A single positive message when
    /// nothing triggers.
    pub fn recommendations(profile: &FinancialProfile) -> Vec<String> {
        let mut recs = Vec::new();

        if profile.bill_payments_on_time < 18 {
            recs.push(ADVISORY_BILLS.to_string());
        }
        if profile.savings_pattern < 0.5 {
            recs.push(ADVISORY_SAVINGS.to_string());
        }
        if profile.mobile_recharge_regularity < 0.8 {
            recs.push(ADVISORY_RECHARGE.to_string());
        }
        if profile.upi_transactions < 30 {
            recs.push(ADVISORY_UPI.to_string());
        }
        if profile.avg_transaction < 200.0 {
            recs.push(ADVISORY_AVG.to_string());
        }

        if recs.is_empty() {
            recs.push(POSITIVE_MESSAGE.to_string());
        }

        recs.truncate(3);
        recs
    }

    /// Score-refresh simulation: synthesizes a next-period profile from the
    /// stored one, re-validates it, and re-scores it.
    ///
    /// The reported `delta` is drawn independently of the actual score
    /// difference and serves only the display message.
    pub fn simulate_refresh(&self, base: &ProfileInput) -> Result<RefreshOutcome, ValidationError> {
        let mut rng = rand::thread_rng();
        let upi_bump: i64 = rng.gen_range(1..5);
        let delta: u8 = rng.gen_range(3..18);

        let next = ProfileInput {
            upi_transactions: base.upi_transactions + upi_bump,
            avg_transaction: base.avg_transaction,
            bill_payments_on_time: (base.bill_payments_on_time + 1).min(24),
            mobile_recharge_regularity: (base.mobile_recharge_regularity + 0.02).min(1.0),
            savings_pattern: (base.savings_pattern + 0.03).min(1.0),
        };

        let profile = next.validate()?;
        let result = self.score(&profile);

        Ok(RefreshOutcome {
            new_score: result.credit_score,
            delta,
            confidence: result.confidence,
            message: format!(
                "New UPI transaction detected! Score improved by +{} points.",
                delta
            ),
            factors: result.factors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(
        upi: i64,
        avg: f64,
        bills: i64,
        recharge: f64,
        savings: f64,
    ) -> FinancialProfile {
        ProfileInput {
            upi_transactions: upi,
            avg_transaction: avg,
            bill_payments_on_time: bills,
            mobile_recharge_regularity: recharge,
            savings_pattern: savings,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn zero_profile_attributes_nothing_but_stays_finite() {
        let factors = ScoringEngine::factor_contributions(&profile(0, 0.0, 0, 0.0, 0.0));
        assert_eq!(factors.total(), 0.0);
    }

    #[test]
    fn fallback_confidence_is_fixed() {
        let engine = ScoringEngine::new(None);
        let result = engine.score(&profile(45, 320.0, 18, 0.85, 0.40));
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
    }
}

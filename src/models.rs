use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============ Scoring Output Models ============

/// Coarse categorical label derived from the credit score for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl RiskBand {
    /// Pure function of the credit score. Boundary values resolve to the
    /// higher band (750 is Excellent, 650 is Good, 550 is Fair).
    pub fn from_score(score: u16) -> Self {
        if score >= 750 {
            RiskBand::Excellent
        } else if score >= 650 {
            RiskBand::Good
        } else if score >= 550 {
            RiskBand::Fair
        } else {
            RiskBand::Poor
        }
    }
}

/// Categorical decision hint for downstream lending systems. Not a binding
/// decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LenderRecommendation {
    Approve,
    Review,
    Deny,
}

impl LenderRecommendation {
    /// Pure function of the credit score. Boundary values resolve upward
    /// (700 is APPROVE, 580 is REVIEW).
    pub fn from_score(score: u16) -> Self {
        if score >= 700 {
            LenderRecommendation::Approve
        } else if score >= 580 {
            LenderRecommendation::Review
        } else {
            LenderRecommendation::Deny
        }
    }
}

/// Normalized percentage contribution of each input factor to the score.
///
/// This is an explanatory heuristic for user-facing transparency, not a
/// mathematical decomposition of the score itself. Percentages are rounded
/// to one decimal and sum to 100 (within rounding tolerance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorBreakdown {
    #[serde(rename = "UPI Transaction Volume")]
    pub upi_volume: f64,
    #[serde(rename = "Average Transaction Value")]
    pub avg_transaction_value: f64,
    #[serde(rename = "Bill Payment History")]
    pub bill_payment_history: f64,
    #[serde(rename = "Mobile Recharge Regularity")]
    pub recharge_regularity: f64,
    #[serde(rename = "Savings Behavior")]
    pub savings_behavior: f64,
}

impl FactorBreakdown {
    /// Sum of the five percentages.
    pub fn total(&self) -> f64 {
        self.upi_volume
            + self.avg_transaction_value
            + self.bill_payment_history
            + self.recharge_regularity
            + self.savings_behavior
    }
}

/// Full scoring response. Created fresh per scoring call, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Credit score in [300, 900].
    pub credit_score: u16,
    /// Prediction confidence in [0.60, 0.99], two decimals.
    pub confidence: f64,
    /// Normalized factor contributions.
    pub factors: FactorBreakdown,
    /// At most 3 advisory messages, never empty.
    pub recommendations: Vec<String>,
    pub risk_band: RiskBand,
    pub lender_recommendation: LenderRecommendation,
}

/// Result of the score-refresh simulation.
///
/// `delta` is an independently drawn narrative display value; it is not
/// derived from the actual score difference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshOutcome {
    pub new_score: u16,
    pub delta: u8,
    pub confidence: f64,
    pub message: String,
    pub factors: FactorBreakdown,
}

// ============ User Store Models ============

/// A user row from the `users` table (or the mock dataset).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub city: String,
    pub occupation: String,
}

/// A financial profile row from the `financial_profiles` table (or the mock
/// dataset). Field names mirror the store schema; the scoring input derives
/// from a subset of these.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StoredProfile {
    pub user_id: i64,
    pub upi_transactions: i32,
    pub avg_transaction_amount: f64,
    pub bill_payments_on_time: i32,
    pub total_bill_payments: i32,
    pub mobile_recharge_regularity: f64,
    pub savings_pattern: f64,
    pub monthly_income_estimate: f64,
    pub current_score: Option<i32>,
}

impl StoredProfile {
    /// Projects the stored row onto the scoring input contract.
    pub fn to_input(&self) -> crate::validation::ProfileInput {
        crate::validation::ProfileInput {
            upi_transactions: i64::from(self.upi_transactions),
            avg_transaction: self.avg_transaction_amount,
            bill_payments_on_time: i64::from(self.bill_payments_on_time),
            mobile_recharge_regularity: self.mobile_recharge_regularity,
            savings_pattern: self.savings_pattern,
        }
    }
}

/// User record served by `GET /users/:id`: identity plus the stored
/// financial profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(flatten)]
    pub user: UserRow,
    pub financial_profile: StoredProfile,
}

// ============ Service Info ============

/// Health/info payload for `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub model_loaded: bool,
    pub store_connected: bool,
    pub endpoints: Vec<&'static str>,
}

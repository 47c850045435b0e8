//! Feature validation for scoring input.
//!
//! Every entry point (HTTP body, WebSocket message, refresh simulation)
//! goes through [`ProfileInput::validate`] before any scoring logic runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bounds for each input field. Fixed constants of the scoring contract.
pub const UPI_TRANSACTIONS_MAX: i64 = 500;
pub const BILL_PAYMENTS_MAX: i64 = 24;

/// Raw scoring input as received on the wire. All five fields are required;
/// bounds are enforced by [`ProfileInput::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInput {
    /// UPI transactions per month.
    pub upi_transactions: i64,
    /// Average transaction amount in INR.
    pub avg_transaction: f64,
    /// On-time bill payments in the last 24 months.
    pub bill_payments_on_time: i64,
    /// Mobile recharge regularity score, 0-1.
    pub mobile_recharge_regularity: f64,
    /// Savings behavior score, 0-1.
    pub savings_pattern: f64,
}

/// A validated, immutable financial profile. Constructed only by
/// [`ProfileInput::validate`]; request-scoped.
#[derive(Debug, Clone, Serialize)]
pub struct FinancialProfile {
    pub upi_transactions: u32,
    pub avg_transaction: f64,
    pub bill_payments_on_time: u32,
    pub mobile_recharge_regularity: f64,
    pub savings_pattern: f64,
}

impl FinancialProfile {
    /// Feature vector in the fixed order the model was trained on.
    pub fn feature_vector(&self) -> [f64; 5] {
        [
            f64::from(self.upi_transactions),
            self.avg_transaction,
            f64::from(self.bill_payments_on_time),
            self.mobile_recharge_regularity,
            self.savings_pattern,
        ]
    }
}

/// Validation failure carrying every out-of-range field, not just the first.
#[derive(Debug, Clone)]
pub struct ValidationError {
    issues: Vec<String>,
}

impl ValidationError {
    pub fn issues(&self) -> &[String] {
        &self.issues
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.issues.join("; "))
    }
}

impl std::error::Error for ValidationError {}

impl ProfileInput {
    /// Checks every field against its bounds and returns a
    /// [`FinancialProfile`] or a [`ValidationError`] enumerating all
    /// violations. Non-finite floats are treated as out of range. No side
    /// effects.
    pub fn validate(&self) -> Result<FinancialProfile, ValidationError> {
        let mut issues = Vec::new();

        if !(0..=UPI_TRANSACTIONS_MAX).contains(&self.upi_transactions) {
            issues.push(format!(
                "upi_transactions must be between 0 and {}, got {}",
                UPI_TRANSACTIONS_MAX, self.upi_transactions
            ));
        }
        if !self.avg_transaction.is_finite() || self.avg_transaction < 0.0 {
            issues.push(format!(
                "avg_transaction must be a finite number >= 0, got {}",
                self.avg_transaction
            ));
        }
        if !(0..=BILL_PAYMENTS_MAX).contains(&self.bill_payments_on_time) {
            issues.push(format!(
                "bill_payments_on_time must be between 0 and {}, got {}",
                BILL_PAYMENTS_MAX, self.bill_payments_on_time
            ));
        }
        if !self.mobile_recharge_regularity.is_finite()
            || !(0.0..=1.0).contains(&self.mobile_recharge_regularity)
        {
            issues.push(format!(
                "mobile_recharge_regularity must be between 0.0 and 1.0, got {}",
                self.mobile_recharge_regularity
            ));
        }
        if !self.savings_pattern.is_finite() || !(0.0..=1.0).contains(&self.savings_pattern) {
            issues.push(format!(
                "savings_pattern must be between 0.0 and 1.0, got {}",
                self.savings_pattern
            ));
        }

        if !issues.is_empty() {
            return Err(ValidationError { issues });
        }

        Ok(FinancialProfile {
            upi_transactions: self.upi_transactions as u32,
            avg_transaction: self.avg_transaction,
            bill_payments_on_time: self.bill_payments_on_time as u32,
            mobile_recharge_regularity: self.mobile_recharge_regularity,
            savings_pattern: self.savings_pattern,
        })
    }
}

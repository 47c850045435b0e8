//! Trained ensemble model artifact.
//!
//! The offline training pipeline exports a random-forest regressor as JSON:
//! one flat node-array record per tree (`children_left`, `children_right`,
//! `feature`, `threshold`, `value`), leaf nodes marked with child index -1.
//! The artifact is loaded once at startup and treated as read-only for the
//! process lifetime; its absence is a supported state that puts the service
//! in permanent rule-based mode.

use anyhow::Context;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Number of input features the model expects, in fixed order:
/// upi_transactions, avg_transaction, bill_payments_on_time,
/// mobile_recharge_regularity, savings_pattern.
pub const FEATURE_COUNT: usize = 5;

/// A model call failed at request time. Recovered internally by falling back
/// to rule-based scoring; never surfaced to the caller.
#[derive(Debug, Clone)]
pub struct InferenceError(String);

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inference failed: {}", self.0)
    }
}

impl std::error::Error for InferenceError {}

/// A single regression tree in sklearn's flat-array export layout.
#[derive(Debug, Clone, Deserialize)]
struct RegressionTree {
    children_left: Vec<i32>,
    children_right: Vec<i32>,
    feature: Vec<i32>,
    threshold: Vec<f64>,
    value: Vec<f64>,
}

impl RegressionTree {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn is_consistent(&self) -> bool {
        let n = self.node_count();
        n > 0
            && self.children_right.len() == n
            && self.feature.len() == n
            && self.threshold.len() == n
            && self.value.len() == n
    }

    /// Walk the tree from the root. The step budget equals the node count,
    /// so a corrupted artifact with a cycle terminates with an error instead
    /// of spinning.
    fn predict(&self, features: &[f64; FEATURE_COUNT]) -> Result<f64, InferenceError> {
        let mut node = 0usize;
        for _ in 0..self.node_count() {
            let left = self.children_left[node];
            if left < 0 {
                return Ok(self.value[node]);
            }
            let feature_idx = self.feature[node] as usize;
            if feature_idx >= FEATURE_COUNT {
                return Err(InferenceError(format!(
                    "split references feature index {} (model has {} features)",
                    feature_idx, FEATURE_COUNT
                )));
            }
            let next = if features[feature_idx] <= self.threshold[node] {
                left
            } else {
                self.children_right[node]
            };
            if next < 0 || next as usize >= self.node_count() {
                return Err(InferenceError(format!(
                    "child index {} out of bounds for {} nodes",
                    next,
                    self.node_count()
                )));
            }
            node = next as usize;
        }
        Err(InferenceError(
            "tree walk exceeded node count, artifact is likely cyclic".to_string(),
        ))
    }
}

/// The loaded credit scoring ensemble. Read-only after startup.
#[derive(Debug, Clone, Deserialize)]
pub struct CreditModel {
    feature_names: Vec<String>,
    trees: Vec<RegressionTree>,
}

impl CreditModel {
    /// Loads and sanity-checks the serialized artifact.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read model artifact at {}", path.display()))?;
        let model: CreditModel = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse model artifact at {}", path.display()))?;
        model.check()?;
        Ok(model)
    }

    fn check(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.feature_names.len() == FEATURE_COUNT,
            "model expects {} features, artifact declares {}",
            FEATURE_COUNT,
            self.feature_names.len()
        );
        anyhow::ensure!(!self.trees.is_empty(), "artifact contains no trees");
        for (i, tree) in self.trees.iter().enumerate() {
            anyhow::ensure!(tree.is_consistent(), "tree {} has inconsistent node arrays", i);
        }
        Ok(())
    }

    /// Individual prediction of every sub-estimator, used for both the
    /// ensemble prediction (their mean) and the variance-based confidence.
    pub fn estimator_predictions(
        &self,
        features: &[f64; FEATURE_COUNT],
    ) -> Result<Vec<f64>, InferenceError> {
        self.trees.iter().map(|tree| tree.predict(features)).collect()
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stump(feature: i32, threshold: f64, left_value: f64, right_value: f64) -> serde_json::Value {
        json!({
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [feature, -2, -2],
            "threshold": [threshold, 0.0, 0.0],
            "value": [0.0, left_value, right_value],
        })
    }

    fn model_from(trees: Vec<serde_json::Value>) -> CreditModel {
        serde_json::from_value(json!({
            "feature_names": [
                "upi_transactions",
                "avg_transaction",
                "bill_payments_on_time",
                "mobile_recharge_regularity",
                "savings_pattern",
            ],
            "trees": trees,
        }))
        .unwrap()
    }

    #[test]
    fn stump_splits_on_threshold() {
        let model = model_from(vec![stump(2, 12.0, 500.0, 800.0)]);
        let low = model.estimator_predictions(&[0.0, 0.0, 10.0, 0.0, 0.0]).unwrap();
        let high = model.estimator_predictions(&[0.0, 0.0, 20.0, 0.0, 0.0]).unwrap();
        assert_eq!(low, vec![500.0]);
        assert_eq!(high, vec![800.0]);
    }

    #[test]
    fn bad_feature_index_is_an_inference_error() {
        let model = model_from(vec![stump(9, 0.5, 400.0, 600.0)]);
        let err = model
            .estimator_predictions(&[0.0, 0.0, 0.0, 0.0, 1.0])
            .unwrap_err();
        assert!(err.to_string().contains("feature index"));
    }

    #[test]
    fn cyclic_tree_terminates_with_error() {
        let cyclic = json!({
            "children_left": [1, 0],
            "children_right": [1, 0],
            "feature": [0, 0],
            "threshold": [0.0, 0.0],
            "value": [0.0, 0.0],
        });
        let model = model_from(vec![cyclic]);
        assert!(model.estimator_predictions(&[1.0, 1.0, 1.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn check_rejects_wrong_feature_count() {
        let bad: Result<CreditModel, _> = serde_json::from_value(json!({
            "feature_names": ["a", "b"],
            "trees": [stump(0, 1.0, 2.0, 3.0)],
        }));
        let model = bad.unwrap();
        assert!(model.check().is_err());
    }
}

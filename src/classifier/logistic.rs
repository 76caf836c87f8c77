use super::{Classifier, Prediction};
use crate::error::ModelError;
use crate::features::{feature_names, FeatureVector, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Standard-scaled logistic regression over the canonical feature order.
///
/// Stored as YAML (or JSON when the file ends in `.json`):
///
/// ```yaml
/// version: v1.0.0
/// feature_names: [url_length, domain_dots, ...]
/// scaler: { mean: [...], scale: [...] }
/// weights: [...]
/// intercept: -1.2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub version: String,
    pub feature_names: Vec<String>,
    pub scaler: StandardScaler,
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let model: LogisticModel = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        model.validate()?;
        Ok(model)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ModelError> {
        let model: LogisticModel = serde_yaml::from_str(content)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        let expected = feature_names();
        if self.feature_names != expected {
            return Err(ModelError::Shape(
                "feature_names must list the 25 canonical features in order".to_string(),
            ));
        }

        for (label, column) in [
            ("weights", &self.weights),
            ("scaler.mean", &self.scaler.mean),
            ("scaler.scale", &self.scaler.scale),
        ] {
            if column.len() != FEATURE_COUNT {
                return Err(ModelError::Shape(format!(
                    "{label} has {} values, expected {FEATURE_COUNT}",
                    column.len()
                )));
            }
            if column.iter().any(|v| !v.is_finite()) {
                return Err(ModelError::Shape(format!("{label} contains non-finite values")));
            }
        }

        if !self.intercept.is_finite() {
            return Err(ModelError::Shape("intercept is not finite".to_string()));
        }

        Ok(())
    }

    /// P(malicious) for the given features
    pub fn probability(&self, features: &FeatureVector) -> f64 {
        let z: f64 = features
            .values()
            .iter()
            .zip(&self.scaler.mean)
            .zip(&self.scaler.scale)
            .zip(&self.weights)
            .map(|(((&x, &mean), &scale), &w)| {
                // Constant columns were fit with scale 0
                let scale = if scale == 0.0 { 1.0 } else { scale };
                w * (x - mean) / scale
            })
            .sum::<f64>()
            + self.intercept;

        1.0 / (1.0 + (-z).exp())
    }

    /// |w| normalised to sum to one
    pub fn importances(&self) -> Vec<f64> {
        let total: f64 = self.weights.iter().map(|w| w.abs()).sum();
        if total == 0.0 {
            return vec![0.0; FEATURE_COUNT];
        }
        self.weights.iter().map(|w| w.abs() / total).collect()
    }
}

impl Classifier for LogisticModel {
    fn version(&self) -> &str {
        &self.version
    }

    fn predict(&self, features: &FeatureVector) -> anyhow::Result<Prediction> {
        let p = self.probability(features);
        if !p.is_finite() {
            anyhow::bail!("model produced a non-finite probability");
        }

        Ok(Prediction {
            class_index: usize::from(p >= 0.5),
            probabilities: vec![1.0 - p, p],
            importances: Some(self.importances()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Feature;

    fn model() -> LogisticModel {
        let mut weights = vec![0.0; FEATURE_COUNT];
        weights[Feature::HasIpAddress.index()] = 3.0;
        weights[Feature::SuspiciousKeywords.index()] = 1.0;

        LogisticModel {
            version: "v-test".to_string(),
            feature_names: feature_names().into_iter().map(String::from).collect(),
            scaler: StandardScaler {
                mean: vec![0.0; FEATURE_COUNT],
                scale: vec![1.0; FEATURE_COUNT],
            },
            weights,
            intercept: -2.0,
        }
    }

    #[test]
    fn test_predict() {
        let model = model();

        let clean = model.predict(&FeatureVector::zeroed()).unwrap();
        assert_eq!(clean.class_index, 0);
        assert!(clean.confidence().unwrap() > 0.8);

        let ip = FeatureVector::zeroed().with(Feature::HasIpAddress, 1.0);
        let flagged = model.predict(&ip).unwrap();
        assert_eq!(flagged.class_index, 1);
        assert!((flagged.probabilities[0] + flagged.probabilities[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_importances() {
        let importances = model().importances();
        assert_eq!(importances.len(), FEATURE_COUNT);
        assert!((importances[Feature::HasIpAddress.index()] - 0.75).abs() < 1e-12);
        assert!((importances[Feature::SuspiciousKeywords.index()] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_yaml_round_trip_and_validation() {
        let yaml = serde_yaml::to_string(&model()).unwrap();
        assert_eq!(LogisticModel::from_yaml_str(&yaml).unwrap(), model());

        let mut short = model();
        short.weights.pop();
        let yaml = serde_yaml::to_string(&short).unwrap();
        assert!(matches!(
            LogisticModel::from_yaml_str(&yaml),
            Err(ModelError::Shape(_))
        ));

        let mut reordered = model();
        reordered.feature_names.swap(0, 1);
        let yaml = serde_yaml::to_string(&reordered).unwrap();
        assert!(LogisticModel::from_yaml_str(&yaml).is_err());

        assert!(matches!(
            LogisticModel::from_yaml_str("version: [unclosed"),
            Err(ModelError::Parse(_))
        ));
    }
}

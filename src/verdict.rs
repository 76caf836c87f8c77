use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered by severity; `Malicious` is absorbing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Benign,
    Suspicious,
    Malicious,
}

impl Verdict {
    /// Map a backend class index (0 = benign, 1 = malicious)
    pub fn from_class_index(index: usize) -> Option<Verdict> {
        match index {
            0 => Some(Verdict::Benign),
            1 => Some(Verdict::Malicious),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Benign => "benign",
            Verdict::Suspicious => "suspicious",
            Verdict::Malicious => "malicious",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub name: String,
    pub value: f64,
    pub contribution: f64,
}

impl FeatureContribution {
    pub fn new(name: impl Into<String>, value: f64, contribution: f64) -> Self {
        Self {
            name: name.into(),
            value,
            contribution: contribution.max(0.0),
        }
    }
}

/// A scorer's opinion before it is wrapped into a [`PredictionResult`]
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub verdict: Verdict,
    pub confidence: f64,
    pub explanations: Vec<FeatureContribution>,
}

/// Best-effort signals gathered around the classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub domain: String,
    pub is_whitelisted: bool,
    /// `None` when the age lookup is unavailable or failed
    pub domain_age_days: Option<u32>,
    /// `None` when no DNS capability is configured
    pub dns_valid: Option<bool>,
    pub is_https: bool,
    pub impersonated_brand: Option<String>,
    pub server_location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub verdict: Verdict,
    pub confidence: f64,
    pub model_version: String,
    /// Most recently applied heuristic first, then the scorer's own ranking
    pub explanations: Vec<FeatureContribution>,
    pub raw_features: FeatureVector,
    pub diagnostics: Diagnostics,
}

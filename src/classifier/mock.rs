//! Rule-based stand-in used when no scoring backend is available.

use crate::features::{Feature, FeatureVector};
use crate::verdict::{Assessment, FeatureContribution, Verdict};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};

pub const MAX_JITTER: f64 = 0.1;
const MOCK_TOP_FEATURES: usize = 5;

/// Source of the benign-confidence jitter, in `[0, MAX_JITTER)`
pub trait JitterSource: Send + Sync {
    fn jitter(&self) -> f64;
}

impl<F> JitterSource for F
where
    F: Fn() -> f64 + Send + Sync,
{
    fn jitter(&self) -> f64 {
        self()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn jitter(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..MAX_JITTER)
    }
}

/// Reproducible jitter for tests and replayable runs
#[derive(Debug)]
pub struct SeededJitter {
    rng: Mutex<StdRng>,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl JitterSource for SeededJitter {
    fn jitter(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0.0..MAX_JITTER),
            Err(poisoned) => poisoned.into_inner().gen_range(0.0..MAX_JITTER),
        }
    }
}

#[derive(Clone)]
pub struct MockScorer {
    jitter: Arc<dyn JitterSource>,
}

impl std::fmt::Debug for MockScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockScorer").finish_non_exhaustive()
    }
}

impl Default for MockScorer {
    fn default() -> Self {
        Self::new(Arc::new(ThreadRngJitter))
    }
}

impl MockScorer {
    pub fn new(jitter: Arc<dyn JitterSource>) -> Self {
        Self { jitter }
    }

    /// Additive risk points from a handful of lexical red flags
    pub fn risk(features: &FeatureVector) -> u32 {
        let mut risk = 0;

        if features[Feature::SuspiciousKeywords] > 0.0 {
            risk += 2;
        }
        if features[Feature::IsShortened] > 0.0 {
            risk += 1;
        }
        if features[Feature::HasIpAddress] > 0.0 {
            risk += 3;
        }
        if features[Feature::UrlLength] > 75.0 {
            risk += 1;
        }
        if features[Feature::DomainDots] > 3.0 {
            risk += 1;
        }

        risk
    }

    pub fn score(&self, features: &FeatureVector) -> Assessment {
        let risk = Self::risk(features);

        let (verdict, confidence) = match risk {
            0 => (Verdict::Benign, 0.85 + self.bounded_jitter()),
            1 => (Verdict::Suspicious, 0.65),
            _ => (Verdict::Malicious, (0.6 + 0.1 * risk as f64).min(0.99)),
        };

        Assessment {
            verdict,
            confidence,
            explanations: Self::explanations(features),
        }
    }

    fn bounded_jitter(&self) -> f64 {
        let jitter = self.jitter.jitter();
        if jitter.is_finite() && (0.0..MAX_JITTER).contains(&jitter) {
            jitter
        } else {
            0.0
        }
    }

    /// Every non-zero feature at half its value, largest first
    fn explanations(features: &FeatureVector) -> Vec<FeatureContribution> {
        let mut explanations: Vec<FeatureContribution> = features
            .iter()
            .filter(|(_, value)| *value > 0.0)
            .map(|(feature, value)| FeatureContribution::new(feature.name(), value, 0.5 * value))
            .collect();
        explanations.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));
        explanations.truncate(MOCK_TOP_FEATURES);
        explanations
    }
}

//! Scoring backends.
//!
//! [`Classifier`] is the seam a trained model plugs into. The engine reaches
//! it through a [`ScorerHandle`], which loads the backend at most once, on
//! first use, and hands out a shared read-only reference afterwards. When no
//! backend can be loaded the engine uses [`mock::MockScorer`] instead.

pub mod logistic;
pub mod mock;

use crate::error::ModelError;
use crate::features::{Feature, FeatureVector, FEATURE_COUNT};
use crate::verdict::FeatureContribution;
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::Arc;

pub use logistic::LogisticModel;
pub use mock::{JitterSource, MockScorer, SeededJitter, ThreadRngJitter};

/// Explanations taken from a backend's importance ranking
pub const TOP_FEATURES: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// 0 = benign, 1 = malicious
    pub class_index: usize,
    pub probabilities: Vec<f64>,
    /// Per-feature weight in canonical order, used to rank explanations
    pub importances: Option<Vec<f64>>,
}

impl Prediction {
    /// Probability of the predicted class
    pub fn confidence(&self) -> Option<f64> {
        self.probabilities
            .get(self.class_index)
            .copied()
            .filter(|p| p.is_finite())
    }

    /// Top features by importance, descending; empty without importances
    pub fn top_features(&self, features: &FeatureVector, n: usize) -> Vec<FeatureContribution> {
        let Some(importances) = self.importances.as_ref() else {
            return Vec::new();
        };
        if importances.len() != FEATURE_COUNT {
            log::warn!(
                "Ignoring {} importances, expected {FEATURE_COUNT}",
                importances.len()
            );
            return Vec::new();
        }

        let mut ranked: Vec<FeatureContribution> = Feature::ALL
            .iter()
            .zip(importances)
            .map(|(&feature, &importance)| {
                let importance = if importance.is_finite() { importance } else { 0.0 };
                FeatureContribution::new(feature.name(), features.get(feature), importance)
            })
            .collect();
        ranked.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));
        ranked.truncate(n);
        ranked
    }
}

/// A trained scoring backend. Implementations perform their own scaling.
pub trait Classifier: Send + Sync {
    fn version(&self) -> &str;

    fn predict(&self, features: &FeatureVector) -> anyhow::Result<Prediction>;
}

type Loader = Box<dyn Fn() -> Result<Arc<dyn Classifier>, ModelError> + Send + Sync>;

/// Process-owned, lazily built backend handle.
///
/// The first caller of [`ScorerHandle::get`] runs the loader; concurrent
/// callers block until it finishes and then all observe the same result.
/// A failed load is remembered as "no backend".
pub struct ScorerHandle {
    loader: Option<Loader>,
    cell: OnceCell<Option<Arc<dyn Classifier>>>,
}

impl std::fmt::Debug for ScorerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScorerHandle")
            .field("initialized", &self.cell.get().is_some())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl ScorerHandle {
    /// No backend: every request goes to the mock scorer
    pub fn unavailable() -> Self {
        Self {
            loader: None,
            cell: OnceCell::with_value(None),
        }
    }

    /// An already constructed backend
    pub fn ready(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            loader: None,
            cell: OnceCell::with_value(Some(classifier)),
        }
    }

    pub fn lazy<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Classifier>, ModelError> + Send + Sync + 'static,
    {
        Self {
            loader: Some(Box::new(loader)),
            cell: OnceCell::new(),
        }
    }

    /// Load a [`LogisticModel`] from `path` on first use
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::lazy(move || {
            let model = LogisticModel::load(&path)?;
            Ok(Arc::new(model) as Arc<dyn Classifier>)
        })
    }

    pub fn get(&self) -> Option<Arc<dyn Classifier>> {
        self.cell
            .get_or_init(|| {
                let loader = self.loader.as_ref()?;
                match loader() {
                    Ok(classifier) => {
                        log::info!("Loaded scoring backend {}", classifier.version());
                        Some(classifier)
                    }
                    Err(e) => {
                        log::warn!("Failed to load scoring backend, using mock scorer: {e}");
                        None
                    }
                }
            })
            .clone()
    }

    /// Whether a backend is loaded. Does not trigger loading.
    pub fn is_loaded(&self) -> bool {
        matches!(self.cell.get(), Some(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed;

    impl Classifier for Fixed {
        fn version(&self) -> &str {
            "fixed"
        }

        fn predict(&self, _features: &FeatureVector) -> anyhow::Result<Prediction> {
            Ok(Prediction {
                class_index: 0,
                probabilities: vec![0.9, 0.1],
                importances: None,
            })
        }
    }

    #[test]
    fn test_concurrent_first_access_loads_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let handle = ScorerHandle::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(Arc::new(Fixed) as Arc<dyn Classifier>)
        });

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| assert!(handle.get().is_some()));
            }
        });

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(handle.is_loaded());
    }

    #[test]
    fn test_failed_load_is_remembered() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let handle = ScorerHandle::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ModelError::Shape("broken".to_string()))
        });

        assert!(handle.get().is_none());
        assert!(handle.get().is_none());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(!handle.is_loaded());
    }

    #[test]
    fn test_missing_model_file() {
        let handle = ScorerHandle::from_path("/nonexistent/model.yaml");
        assert!(handle.get().is_none());
    }

    #[test]
    fn test_unavailable_and_ready() {
        assert!(ScorerHandle::unavailable().get().is_none());
        let handle = ScorerHandle::ready(Arc::new(Fixed));
        assert_eq!(handle.get().map(|c| c.version().to_string()), Some("fixed".to_string()));
    }

    #[test]
    fn test_top_features_ranking() {
        let features = FeatureVector::zeroed()
            .with(Feature::UrlLength, 40.0)
            .with(Feature::HasIpAddress, 1.0);
        let mut importances = vec![0.01; FEATURE_COUNT];
        importances[Feature::HasIpAddress.index()] = 0.4;
        importances[Feature::UrlLength.index()] = 0.2;
        importances[Feature::VtPositives.index()] = 0.3;

        let prediction = Prediction {
            class_index: 1,
            probabilities: vec![0.2, 0.8],
            importances: Some(importances),
        };
        let top = prediction.top_features(&features, TOP_FEATURES);

        assert_eq!(top.len(), TOP_FEATURES);
        assert_eq!(top[0].name, "has_ip_address");
        assert_eq!(top[0].value, 1.0);
        assert_eq!(top[1].name, "vt_positives");
        assert_eq!(top[2].name, "url_length");
        assert_eq!(top[2].value, 40.0);
        assert_eq!(prediction.confidence(), Some(0.8));
    }

    #[test]
    fn test_top_features_without_importances() {
        let prediction = Prediction {
            class_index: 0,
            probabilities: vec![1.0, 0.0],
            importances: None,
        };
        assert!(prediction
            .top_features(&FeatureVector::zeroed(), TOP_FEATURES)
            .is_empty());
    }
}

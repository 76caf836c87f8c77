pub mod classifier;
pub mod config;
pub mod detection;
pub mod domain_utils;
pub mod engine;
pub mod enrichment;
pub mod error;
pub mod features;
pub mod verdict;

pub use config::Config;
pub use engine::VerdictEngine;
pub use error::{ClassifyError, ModelError};
pub use features::{Enrichment, FeatureExtractor, FeatureVector};
pub use verdict::{Diagnostics, FeatureContribution, PredictionResult, Verdict};

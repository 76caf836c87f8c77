//! URL classification pipeline.
//!
//! `classify` runs: normalise, whitelist short-circuit, feature extraction,
//! diagnostics gathering, scoring (backend or mock), then the escalation
//! pass on backend verdicts.

pub mod escalation;

use crate::classifier::{
    Classifier, JitterSource, MockScorer, ScorerHandle, SeededJitter, TOP_FEATURES,
};
use crate::config::Config;
use crate::detection::brand_impersonation::{BrandImpersonationDetector, BrandTable};
use crate::detection::content::ContentAnalyzer;
use crate::detection::whitelist::WhitelistMatcher;
use crate::domain_utils::DomainUtils;
use crate::enrichment::Enrichers;
use crate::error::ClassifyError;
use crate::features::{feature_names, Enrichment, FeatureExtractor, FeatureVector};
use crate::verdict::{Assessment, Diagnostics, PredictionResult, Verdict};
use std::sync::Arc;
use url::Url;

pub use escalation::Escalation;

pub const DEFAULT_MODEL_VERSION: &str = "v1.0.0";
const MOCK_SUFFIX: &str = "-mock";

#[derive(Debug, Clone)]
pub struct VerdictEngine {
    extractor: FeatureExtractor,
    whitelist: Arc<WhitelistMatcher>,
    brand_detector: Option<BrandImpersonationDetector>,
    content: ContentAnalyzer,
    scorer: Arc<ScorerHandle>,
    mock: MockScorer,
    enrichers: Enrichers,
    model_version: String,
}

impl VerdictEngine {
    /// Built-in trusted domains and brands, brand detection on
    pub fn new(scorer: Arc<ScorerHandle>, enrichers: Enrichers) -> Self {
        let whitelist = Arc::new(WhitelistMatcher::new());
        let brands = Arc::new(BrandTable::default());

        Self {
            extractor: FeatureExtractor::new(),
            brand_detector: Some(BrandImpersonationDetector::new(
                brands.clone(),
                whitelist.clone(),
            )),
            content: ContentAnalyzer::new(brands),
            whitelist,
            scorer,
            mock: MockScorer::default(),
            enrichers,
            model_version: DEFAULT_MODEL_VERSION.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let scorer = match &config.model_path {
            Some(path) => ScorerHandle::from_path(path.clone()),
            None => {
                log::info!("No model configured, using mock scorer");
                ScorerHandle::unavailable()
            }
        };

        let whitelist = WhitelistMatcher::with_extra(&config.trusted_domains);
        let mut brands = BrandTable::default();
        for brand in &config.brands {
            brands.add(brand.clone());
        }

        let mut engine = Self::new(Arc::new(scorer), Enrichers::from_config(config))
            .with_model_version(config.model_version.clone())
            .with_tables(whitelist, brands);

        if let Some(seed) = config.jitter_seed {
            engine = engine.with_jitter(Arc::new(SeededJitter::new(seed)));
        }
        if !config.capabilities.brand_detection {
            engine = engine.without_brand_detection();
        }

        engine
    }

    pub fn with_jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.mock = MockScorer::new(jitter);
        self
    }

    pub fn with_model_version(mut self, version: impl Into<String>) -> Self {
        self.model_version = version.into();
        self
    }

    pub fn with_tables(mut self, whitelist: WhitelistMatcher, brands: BrandTable) -> Self {
        let whitelist = Arc::new(whitelist);
        let brands = Arc::new(brands);

        if self.brand_detector.is_some() {
            self.brand_detector = Some(BrandImpersonationDetector::new(
                brands.clone(),
                whitelist.clone(),
            ));
        }
        self.content = ContentAnalyzer::new(brands);
        self.whitelist = whitelist;
        self
    }

    pub fn without_brand_detection(mut self) -> Self {
        self.brand_detector = None;
        self
    }

    /// Canonical feature order, for reporting and persistence
    pub fn feature_names() -> Vec<&'static str> {
        feature_names()
    }

    /// Trim and lower-case `raw`; it must parse as an absolute URL with a host
    pub fn normalize_url(raw: &str) -> Result<(String, Url), ClassifyError> {
        let normalized = raw.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(ClassifyError::InvalidUrl("empty URL".to_string()));
        }
        if normalized.chars().any(char::is_control) {
            return Err(ClassifyError::InvalidUrl(format!(
                "control characters in {normalized:?}"
            )));
        }

        let url = Url::parse(&normalized)
            .map_err(|e| ClassifyError::InvalidUrl(format!("{normalized}: {e}")))?;
        if url.host_str().map_or(true, str::is_empty) {
            return Err(ClassifyError::InvalidUrl(format!("{normalized}: no host")));
        }

        Ok((normalized, url))
    }

    pub async fn classify(
        &self,
        raw_url: &str,
        enrichment: Option<&Enrichment>,
    ) -> Result<PredictionResult, ClassifyError> {
        let (normalized, url) = Self::normalize_url(raw_url)?;
        let domain = url.host_str().unwrap_or_default().to_string();
        let is_https = url.scheme() == "https";
        let features = self.extractor.extract(&normalized, enrichment);

        if self.whitelist.is_trusted(&domain) {
            log::info!("Whitelisted domain: {domain}");
            let diagnostics = self.diagnostics(&domain, true, is_https, None).await;
            return Ok(PredictionResult {
                verdict: Verdict::Benign,
                confidence: 1.0,
                model_version: self.model_version.clone(),
                explanations: Vec::new(),
                raw_features: features,
                diagnostics,
            });
        }

        // Lookalikes are judged on the host as typed, not its punycode form
        let brand = self
            .brand_detector
            .as_ref()
            .and_then(|detector| detector.check(&DomainUtils::unicode_host(&domain)));
        let diagnostics = self.diagnostics(&domain, false, is_https, brand).await;

        let Some(backend) = self.scorer.get() else {
            return Ok(self.mock_result(features, diagnostics));
        };

        let base = match Self::predict(backend.as_ref(), &features) {
            Ok(assessment) => assessment,
            Err(e) => {
                log::warn!("Prediction failed for {normalized}, using mock scorer: {e}");
                return Ok(self.mock_result(features, diagnostics));
            }
        };

        let mut escalation = Escalation::new(base.verdict, base.confidence);
        escalation
            .apply_domain_age(diagnostics.domain_age_days)
            .apply_brand(diagnostics.impersonated_brand.as_deref())
            .apply_dns(diagnostics.dns_valid);

        if escalation.wants_content_check() && self.enrichers.can_fetch_content() {
            let score = match self.enrichers.fetch_content(&normalized).await {
                Some(html) => self.content.score(&html, &normalized),
                None => 0,
            };
            escalation.apply_content_score(score);
        }

        let assessment = escalation.finish(base.explanations);
        log::debug!("Scored {normalized} with backend {}", backend.version());
        Ok(PredictionResult {
            verdict: assessment.verdict,
            confidence: assessment.confidence,
            model_version: self.model_version.clone(),
            explanations: assessment.explanations,
            raw_features: features,
            diagnostics,
        })
    }

    fn predict(backend: &dyn Classifier, features: &FeatureVector) -> anyhow::Result<Assessment> {
        let prediction = backend.predict(features)?;

        let verdict = Verdict::from_class_index(prediction.class_index)
            .ok_or_else(|| anyhow::anyhow!("unknown class index {}", prediction.class_index))?;
        let confidence = prediction
            .confidence()
            .ok_or_else(|| anyhow::anyhow!("no probability for class {}", prediction.class_index))?;

        Ok(Assessment {
            verdict,
            confidence: confidence.clamp(0.0, 1.0),
            explanations: prediction.top_features(features, TOP_FEATURES),
        })
    }

    fn mock_result(&self, features: FeatureVector, diagnostics: Diagnostics) -> PredictionResult {
        let assessment = self.mock.score(&features);
        PredictionResult {
            verdict: assessment.verdict,
            confidence: assessment.confidence,
            model_version: format!("{}{MOCK_SUFFIX}", self.model_version),
            explanations: assessment.explanations,
            raw_features: features,
            diagnostics,
        }
    }

    /// Age, DNS and location run concurrently, each under its own timeout
    async fn diagnostics(
        &self,
        domain: &str,
        is_whitelisted: bool,
        is_https: bool,
        impersonated_brand: Option<String>,
    ) -> Diagnostics {
        let (domain_age_days, dns_valid, server_location) = tokio::join!(
            self.enrichers.domain_age(domain),
            self.enrichers.dns_valid(domain),
            self.enrichers.geolocate(domain),
        );

        Diagnostics {
            domain: domain.to_string(),
            is_whitelisted,
            domain_age_days,
            dns_valid,
            is_https,
            impersonated_brand,
            server_location,
        }
    }
}

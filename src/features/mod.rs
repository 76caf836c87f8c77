//! Fixed 25-value feature vector for URL classification.
//!
//! Lexical features (10) are computed from the URL text alone. Host (8),
//! content (3) and threat-intel (4) features come from an optional
//! [`Enrichment`] record and fall back to per-field defaults.

pub mod enrichment;
pub mod lexical;

pub use enrichment::Enrichment;

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::ops::Index;
use url::Url;

pub const FEATURE_COUNT: usize = 25;

/// Default reputation when the AS section is missing
pub const DEFAULT_AS_REPUTATION: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    // Lexical
    UrlLength,
    DomainDots,
    HyphenCount,
    PathDepth,
    QueryParamCount,
    DigitRatio,
    HasIpAddress,
    CharEntropy,
    SuspiciousKeywords,
    IsShortened,
    // Host
    DomainAgeDays,
    RegistrationLengthYears,
    HasHttps,
    ValidSsl,
    CertAgeDays,
    SubdomainCount,
    HighRiskCountry,
    AsReputationScore,
    // Content
    FormCount,
    HasPasswordField,
    TyposquattingScore,
    // Threat intel
    GsbThreatType,
    VtPositives,
    InPhishingList,
    IpBlocklisted,
}

impl Feature {
    /// Canonical order; also the column order a scoring backend expects
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::UrlLength,
        Feature::DomainDots,
        Feature::HyphenCount,
        Feature::PathDepth,
        Feature::QueryParamCount,
        Feature::DigitRatio,
        Feature::HasIpAddress,
        Feature::CharEntropy,
        Feature::SuspiciousKeywords,
        Feature::IsShortened,
        Feature::DomainAgeDays,
        Feature::RegistrationLengthYears,
        Feature::HasHttps,
        Feature::ValidSsl,
        Feature::CertAgeDays,
        Feature::SubdomainCount,
        Feature::HighRiskCountry,
        Feature::AsReputationScore,
        Feature::FormCount,
        Feature::HasPasswordField,
        Feature::TyposquattingScore,
        Feature::GsbThreatType,
        Feature::VtPositives,
        Feature::InPhishingList,
        Feature::IpBlocklisted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::UrlLength => "url_length",
            Feature::DomainDots => "domain_dots",
            Feature::HyphenCount => "hyphen_count",
            Feature::PathDepth => "path_depth",
            Feature::QueryParamCount => "query_param_count",
            Feature::DigitRatio => "digit_ratio",
            Feature::HasIpAddress => "has_ip_address",
            Feature::CharEntropy => "char_entropy",
            Feature::SuspiciousKeywords => "suspicious_keywords",
            Feature::IsShortened => "is_shortened",
            Feature::DomainAgeDays => "domain_age_days",
            Feature::RegistrationLengthYears => "registration_length_years",
            Feature::HasHttps => "has_https",
            Feature::ValidSsl => "valid_ssl",
            Feature::CertAgeDays => "cert_age_days",
            Feature::SubdomainCount => "subdomain_count",
            Feature::HighRiskCountry => "high_risk_country",
            Feature::AsReputationScore => "as_reputation_score",
            Feature::FormCount => "form_count",
            Feature::HasPasswordField => "has_password_field",
            Feature::TyposquattingScore => "typosquatting_score",
            Feature::GsbThreatType => "gsb_threat_type",
            Feature::VtPositives => "vt_positives",
            Feature::InPhishingList => "in_phishing_list",
            Feature::IpBlocklisted => "ip_blocklisted",
        }
    }

    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL.iter().copied().find(|f| f.name() == name)
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Canonical ordered feature names, for reporting and persistence
pub fn feature_names() -> Vec<&'static str> {
    Feature::ALL.iter().map(|f| f.name()).collect()
}

/// Always holds exactly the 25 canonical features, all finite
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl FeatureVector {
    pub fn zeroed() -> Self {
        Self {
            values: [0.0; FEATURE_COUNT],
        }
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    /// Non-finite values are stored as 0.0
    pub fn set(&mut self, feature: Feature, value: f64) {
        self.values[feature.index()] = if value.is_finite() { value } else { 0.0 };
    }

    pub fn with(mut self, feature: Feature, value: f64) -> Self {
        self.set(feature, value);
        self
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL.iter().map(move |&f| (f, self.get(f)))
    }
}

impl Index<Feature> for FeatureVector {
    type Output = f64;

    fn index(&self, feature: Feature) -> &f64 {
        &self.values[feature.index()]
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (feature, value) in self.iter() {
            map.serialize_entry(feature.name(), &value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract all features. Never fails: unparseable input yields the all-zero vector.
    pub fn extract(&self, url: &str, enrichment: Option<&Enrichment>) -> FeatureVector {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::debug!("Failed to extract features from {url:?}: {e}");
                return FeatureVector::zeroed();
            }
        };

        let mut features = FeatureVector::zeroed();
        Self::extract_lexical(url, &parsed, &mut features);
        Self::extract_enriched(enrichment.unwrap_or(&Enrichment::default()), &mut features);
        features
    }

    fn extract_lexical(url: &str, parsed: &Url, features: &mut FeatureVector) {
        let host = parsed.host_str().unwrap_or("");

        features.set(Feature::UrlLength, url.chars().count() as f64);
        features.set(Feature::DomainDots, host.matches('.').count() as f64);
        features.set(Feature::HyphenCount, url.matches('-').count() as f64);
        features.set(Feature::PathDepth, lexical::path_depth(parsed) as f64);
        features.set(
            Feature::QueryParamCount,
            lexical::query_param_count(parsed) as f64,
        );
        features.set(Feature::DigitRatio, lexical::digit_ratio(url));
        features.set(Feature::HasIpAddress, flag(lexical::has_ip_address(parsed)));
        features.set(Feature::CharEntropy, lexical::shannon_entropy(host));
        features.set(
            Feature::SuspiciousKeywords,
            lexical::count_suspicious_keywords(url) as f64,
        );
        features.set(Feature::IsShortened, flag(lexical::is_shortened(host)));
    }

    fn extract_enriched(enrichment: &Enrichment, features: &mut FeatureVector) {
        let whois = enrichment.whois.clone().unwrap_or_default();
        features.set(Feature::DomainAgeDays, whois.domain_age_days.unwrap_or(0.0));
        features.set(
            Feature::RegistrationLengthYears,
            whois.registration_length_years.unwrap_or(0.0),
        );

        let ssl = enrichment.ssl.clone().unwrap_or_default();
        features.set(Feature::HasHttps, ssl.has_https.unwrap_or(0.0));
        features.set(Feature::ValidSsl, ssl.valid_ssl.unwrap_or(0.0));
        features.set(Feature::CertAgeDays, ssl.cert_age_days.unwrap_or(0.0));

        let dns = enrichment.dns.clone().unwrap_or_default();
        features.set(Feature::SubdomainCount, dns.subdomain_count.unwrap_or(0.0));

        let geo = enrichment.geo.clone().unwrap_or_default();
        features.set(Feature::HighRiskCountry, geo.high_risk_country.unwrap_or(0.0));
        features.set(
            Feature::AsReputationScore,
            geo.as_reputation_score.unwrap_or(DEFAULT_AS_REPUTATION),
        );

        let content = enrichment.content.clone().unwrap_or_default();
        features.set(Feature::FormCount, content.form_count.unwrap_or(0.0));
        features.set(
            Feature::HasPasswordField,
            content.has_password_field.unwrap_or(0.0),
        );
        features.set(
            Feature::TyposquattingScore,
            content.typosquatting_score.unwrap_or(0.0),
        );

        let threat = enrichment.threat_intel();
        features.set(Feature::GsbThreatType, threat.gsb_threat_type.unwrap_or(0.0));
        features.set(Feature::VtPositives, threat.vt_positives.unwrap_or(0.0));
        features.set(Feature::InPhishingList, threat.in_phishing_list.unwrap_or(0.0));
        features.set(Feature::IpBlocklisted, threat.ip_blocklisted.unwrap_or(0.0));
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::enrichment::{GeoSection, SslSection, WhoisSection};

    #[test]
    fn test_canonical_names() {
        let names = feature_names();
        assert_eq!(names.len(), FEATURE_COUNT);
        assert_eq!(names[0], "url_length");
        assert_eq!(names[9], "is_shortened");
        assert_eq!(names[17], "as_reputation_score");
        assert_eq!(names[24], "ip_blocklisted");

        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
            assert_eq!(Feature::from_name(feature.name()), Some(*feature));
        }
    }

    #[test]
    fn test_garbage_yields_zero_vector() {
        let extractor = FeatureExtractor::new();
        for input in ["", "not a url", "::::", "http://", "\u{0}\u{1}", "paypal.com"] {
            let features = extractor.extract(input, None);
            assert_eq!(features, FeatureVector::zeroed(), "input {input:?}");
            assert_eq!(features.iter().count(), FEATURE_COUNT);
        }
    }

    #[test]
    fn test_values_are_finite() {
        let extractor = FeatureExtractor::new();
        for input in [
            "https://www.google.com",
            "http://192.168.0.1/login?user=a&pass=b",
            "http://xn--80ak6aa92e.com/-/-/-",
            "mailto:someone@example.com",
        ] {
            let features = extractor.extract(input, None);
            assert!(features.values().iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_lexical_features() {
        let url = "http://secure-login.paypal.example-site.com/a/b/c?id=7&next=home";
        let features = FeatureExtractor::new().extract(url, None);

        assert_eq!(features[Feature::UrlLength], url.len() as f64);
        assert_eq!(features[Feature::DomainDots], 3.0);
        assert_eq!(features[Feature::HyphenCount], 2.0);
        assert_eq!(features[Feature::PathDepth], 3.0);
        assert_eq!(features[Feature::QueryParamCount], 2.0);
        assert_eq!(features[Feature::HasIpAddress], 0.0);
        // secure, login, paypal
        assert_eq!(features[Feature::SuspiciousKeywords], 3.0);
        assert_eq!(features[Feature::IsShortened], 0.0);
        assert!(features[Feature::CharEntropy] > 0.0);
    }

    #[test]
    fn test_shortener_and_ip() {
        let extractor = FeatureExtractor::new();
        assert_eq!(
            extractor.extract("https://bit.ly/3xYz", None)[Feature::IsShortened],
            1.0
        );
        assert_eq!(
            extractor.extract("http://10.1.2.3/", None)[Feature::HasIpAddress],
            1.0
        );
    }

    #[test]
    fn test_enrichment_defaults() {
        let extractor = FeatureExtractor::new();
        let bare = extractor.extract("https://example.com", None);
        assert_eq!(bare[Feature::DomainAgeDays], 0.0);
        assert_eq!(bare[Feature::AsReputationScore], DEFAULT_AS_REPUTATION);

        let enrichment = Enrichment {
            whois: Some(WhoisSection {
                domain_age_days: Some(400.0),
                registration_length_years: None,
            }),
            ssl: Some(SslSection {
                has_https: Some(1.0),
                valid_ssl: Some(f64::NAN),
                cert_age_days: None,
            }),
            geo: Some(GeoSection {
                high_risk_country: Some(1.0),
                as_reputation_score: None,
            }),
            ..Default::default()
        };
        let enriched = extractor.extract("https://example.com", Some(&enrichment));

        assert_eq!(enriched[Feature::DomainAgeDays], 400.0);
        assert_eq!(enriched[Feature::RegistrationLengthYears], 0.0);
        assert_eq!(enriched[Feature::HasHttps], 1.0);
        assert_eq!(enriched[Feature::ValidSsl], 0.0);
        assert_eq!(enriched[Feature::HighRiskCountry], 1.0);
        assert_eq!(enriched[Feature::AsReputationScore], DEFAULT_AS_REPUTATION);
        assert_eq!(enriched[Feature::VtPositives], 0.0);
    }

    #[test]
    fn test_per_source_threat_record() {
        let enrichment = Enrichment::from_json(
            r#"{
                "google_safe_browsing": {"threat_type_code": 3},
                "virustotal": {"positives": 12},
                "blocklists": {"in_phishing_list": 1, "ip_blocklisted": true}
            }"#,
        )
        .unwrap();
        let features = FeatureExtractor::new().extract("https://example.com", Some(&enrichment));

        assert_eq!(features[Feature::GsbThreatType], 3.0);
        assert_eq!(features[Feature::VtPositives], 12.0);
        assert_eq!(features[Feature::InPhishingList], 1.0);
        assert_eq!(features[Feature::IpBlocklisted], 1.0);
    }

    #[test]
    fn test_serializes_in_canonical_order() {
        let json = serde_json::to_string(&FeatureVector::zeroed()).unwrap();
        assert!(json.starts_with("{\"url_length\":0.0,\"domain_dots\":0.0"));
        assert!(json.ends_with("\"ip_blocklisted\":0.0}"));
    }
}

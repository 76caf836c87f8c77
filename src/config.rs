use crate::detection::brand_impersonation::BrandEntry;
use crate::engine::DEFAULT_MODEL_VERSION;
use crate::enrichment::LookupTimeouts;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logistic backend file; without one every request uses the mock scorer
    pub model_path: Option<PathBuf>,
    pub model_version: String,
    pub timeouts: TimeoutConfig,
    pub capabilities: Capabilities,
    /// Merged into the built-in trusted set
    pub trusted_domains: Vec<String>,
    /// Appended after the built-in brands
    pub brands: Vec<BrandEntry>,
    pub geo_endpoint: String,
    pub user_agent: String,
    pub jitter_seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub whois_seconds: f64,
    pub dns_seconds: f64,
    pub content_seconds: f64,
    pub geo_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub domain_age: bool,
    pub dns: bool,
    pub brand_detection: bool,
    pub content_analysis: bool,
    pub geolocation: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model_path: None,
            model_version: DEFAULT_MODEL_VERSION.to_string(),
            timeouts: TimeoutConfig::default(),
            capabilities: Capabilities::default(),
            trusted_domains: Vec::new(),
            brands: Vec::new(),
            geo_endpoint: "http://ip-api.com/json".to_string(),
            user_agent: format!("url-verdict/{}", env!("CARGO_PKG_VERSION")),
            jitter_seed: None,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        TimeoutConfig {
            whois_seconds: 3.0,
            dns_seconds: 2.0,
            content_seconds: 3.0,
            geo_seconds: 1.5,
        }
    }
}

impl TimeoutConfig {
    pub fn lookup_timeouts(&self) -> LookupTimeouts {
        let defaults = LookupTimeouts::default();
        LookupTimeouts {
            domain_age: seconds(self.whois_seconds, defaults.domain_age),
            dns: seconds(self.dns_seconds, defaults.dns),
            content: seconds(self.content_seconds, defaults.content),
            geo: seconds(self.geo_seconds, defaults.geo),
        }
    }
}

/// Negative, zero or non-finite values keep the default
fn seconds(value: f64, fallback: Duration) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        log::warn!("Ignoring invalid timeout {value}s, using {fallback:?}");
        fallback
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities {
            domain_age: true,
            dns: true,
            brand_detection: true,
            content_analysis: true,
            geolocation: true,
        }
    }
}

impl Capabilities {
    /// Everything that needs the network switched off
    pub fn offline(&self) -> Self {
        Capabilities {
            domain_age: false,
            dns: false,
            content_analysis: false,
            geolocation: false,
            brand_detection: self.brand_detection,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model_version, "v1.0.0");
        assert!(config.model_path.is_none());
        assert!(config.capabilities.dns);
        assert_eq!(config.geo_endpoint, "http://ip-api.com/json");

        let timeouts = config.timeouts.lookup_timeouts();
        assert_eq!(timeouts, LookupTimeouts::default());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
model_version: v2.1.0
capabilities:
  geolocation: false
timeouts:
  dns_seconds: 0.5
trusted_domains:
  - intranet.example
brands:
  - name: acme
    domains: [acme.com]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.model_version, "v2.1.0");
        assert!(!config.capabilities.geolocation);
        assert!(config.capabilities.domain_age);
        assert_eq!(config.timeouts.dns_seconds, 0.5);
        assert_eq!(config.timeouts.whois_seconds, 3.0);
        assert_eq!(config.trusted_domains, vec!["intranet.example"]);
        assert_eq!(config.brands[0].name, "acme");
        assert_eq!(
            config.timeouts.lookup_timeouts().dns,
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_invalid_timeout_falls_back() {
        let timeouts = TimeoutConfig {
            geo_seconds: -1.0,
            content_seconds: f64::NAN,
            ..TimeoutConfig::default()
        }
        .lookup_timeouts();

        assert_eq!(timeouts.geo, Duration::from_millis(1500));
        assert_eq!(timeouts.content, Duration::from_secs(3));
    }

    #[test]
    fn test_offline_keeps_brand_detection() {
        let offline = Capabilities::default().offline();
        assert!(!offline.domain_age && !offline.dns);
        assert!(!offline.content_analysis && !offline.geolocation);
        assert!(offline.brand_detection);
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("url-verdict-config-{}.yaml", std::process::id()));
        let path = path.to_string_lossy().to_string();

        let config = Config {
            jitter_seed: Some(9),
            ..Config::default()
        };
        config.to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}

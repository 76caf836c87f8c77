//! External lookups the engine consumes: domain age, DNS, page content, geolocation.
//!
//! Each lookup is optional (a missing capability is `None`) and every call
//! is wrapped in its own timeout. A failing or slow lookup only degrades its
//! own signal to its documented default:
//!
//! | lookup      | missing capability | failure / timeout |
//! |-------------|--------------------|-------------------|
//! | domain age  | `None`             | `None`            |
//! | DNS         | `None`             | `Some(true)`      |
//! | content     | not fetched        | score 0           |
//! | geolocation | `"Unknown"`        | `"Unknown"`       |

pub mod dns;
pub mod fetch;
pub mod geo;
pub mod whois;

use crate::config::Config;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub use dns::HickoryDnsValidator;
pub use fetch::HttpContentFetcher;
pub use geo::IpApiGeolocator;
pub use whois::WhoisAgeChecker;

pub const UNKNOWN_LOCATION: &str = "Unknown";

#[async_trait]
pub trait DomainAgeSource: Send + Sync {
    /// Age in whole days, `Ok(None)` when the registry does not say
    async fn age_days(&self, domain: &str) -> anyhow::Result<Option<u32>>;
}

#[async_trait]
pub trait DnsValidator: Send + Sync {
    /// `Ok(false)` only when the resolver positively reports no A and no MX records.
    /// Any resolver malfunction must be an `Err`.
    async fn has_records(&self, domain: &str) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Body of a successful (200) response
    async fn fetch(&self, url: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self, domain: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookupTimeouts {
    pub domain_age: Duration,
    pub dns: Duration,
    pub content: Duration,
    pub geo: Duration,
}

impl Default for LookupTimeouts {
    fn default() -> Self {
        Self {
            domain_age: Duration::from_secs(3),
            dns: Duration::from_secs(2),
            content: Duration::from_secs(3),
            geo: Duration::from_millis(1500),
        }
    }
}

/// The lookups available to this process, resolved once at startup
#[derive(Clone, Default)]
pub struct Enrichers {
    pub domain_age: Option<Arc<dyn DomainAgeSource>>,
    pub dns: Option<Arc<dyn DnsValidator>>,
    pub content: Option<Arc<dyn ContentFetcher>>,
    pub geo: Option<Arc<dyn Geolocator>>,
    pub timeouts: LookupTimeouts,
}

impl std::fmt::Debug for Enrichers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enrichers")
            .field("domain_age", &self.domain_age.is_some())
            .field("dns", &self.dns.is_some())
            .field("content", &self.content.is_some())
            .field("geo", &self.geo.is_some())
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl Enrichers {
    /// No lookups at all
    pub fn none() -> Self {
        Self::default()
    }

    /// Network-backed lookups for every capability the config enables
    pub fn from_config(config: &Config) -> Self {
        let timeouts = config.timeouts.lookup_timeouts();
        let caps = &config.capabilities;

        let domain_age = caps.domain_age.then(|| {
            Arc::new(WhoisAgeChecker::new(timeouts.domain_age)) as Arc<dyn DomainAgeSource>
        });
        let dns = caps
            .dns
            .then(|| Arc::new(HickoryDnsValidator::new(timeouts.dns)) as Arc<dyn DnsValidator>);

        let content = if caps.content_analysis {
            match HttpContentFetcher::new(timeouts.content, &config.user_agent) {
                Ok(fetcher) => Some(Arc::new(fetcher) as Arc<dyn ContentFetcher>),
                Err(e) => {
                    log::warn!("Content analysis disabled, HTTP client unavailable: {e}");
                    None
                }
            }
        } else {
            None
        };

        let geo = if caps.geolocation {
            match IpApiGeolocator::new(&config.geo_endpoint, timeouts.geo, &config.user_agent) {
                Ok(geo) => Some(Arc::new(geo) as Arc<dyn Geolocator>),
                Err(e) => {
                    log::warn!("Geolocation disabled, HTTP client unavailable: {e}");
                    None
                }
            }
        } else {
            None
        };

        Self {
            domain_age,
            dns,
            content,
            geo,
            timeouts,
        }
    }

    pub fn can_fetch_content(&self) -> bool {
        self.content.is_some()
    }

    pub async fn domain_age(&self, domain: &str) -> Option<u32> {
        let source = self.domain_age.as_ref()?;
        bounded("domain age", domain, self.timeouts.domain_age, source.age_days(domain))
            .await
            .flatten()
    }

    /// Lookup errors count as valid, so network trouble never flags a domain
    pub async fn dns_valid(&self, domain: &str) -> Option<bool> {
        let validator = self.dns.as_ref()?;
        let valid = bounded("DNS", domain, self.timeouts.dns, validator.has_records(domain))
            .await
            .unwrap_or(true);
        Some(valid)
    }

    pub async fn fetch_content(&self, url: &str) -> Option<String> {
        let fetcher = self.content.as_ref()?;
        bounded("content fetch", url, self.timeouts.content, fetcher.fetch(url)).await
    }

    pub async fn geolocate(&self, domain: &str) -> String {
        let Some(geo) = self.geo.as_ref() else {
            return UNKNOWN_LOCATION.to_string();
        };
        bounded("geolocation", domain, self.timeouts.geo, geo.locate(domain))
            .await
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
    }
}

/// Run one lookup under its own timeout; failures are logged and become `None`
async fn bounded<T, F>(what: &str, target: &str, limit: Duration, lookup: F) -> Option<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(limit, lookup).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            log::debug!("{what} lookup failed for {target}: {e}");
            None
        }
        Err(_) => {
            log::debug!("{what} lookup timed out for {target} after {limit:?}");
            None
        }
    }
}

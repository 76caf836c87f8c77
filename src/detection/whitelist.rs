use crate::domain_utils::DomainUtils;
use std::collections::HashSet;

/// Trusted domains that are never flagged
pub const DEFAULT_TRUSTED_DOMAINS: &[&str] = &[
    // Search engines
    "google.com",
    "www.google.com",
    "google.co.uk",
    "google.ca",
    "google.com.au",
    "google.de",
    "google.fr",
    "google.it",
    "google.es",
    "google.co.in",
    "google.co.jp",
    "google.com.br",
    "bing.com",
    "www.bing.com",
    "duckduckgo.com",
    "www.duckduckgo.com",
    "yahoo.com",
    "www.yahoo.com",
    "yahoo.co.jp",
    // Platforms
    "github.com",
    "www.github.com",
    "github.io",
    "microsoft.com",
    "www.microsoft.com",
    "live.com",
    "office.com",
    "azure.com",
    "apple.com",
    "www.apple.com",
    "icloud.com",
    "facebook.com",
    "www.facebook.com",
    "fb.com",
    "messenger.com",
    "twitter.com",
    "x.com",
    "t.co",
    "linkedin.com",
    "www.linkedin.com",
    "instagram.com",
    "www.instagram.com",
    "youtube.com",
    "www.youtube.com",
    "youtu.be",
    "whatsapp.com",
    "www.whatsapp.com",
    "netflix.com",
    "www.netflix.com",
    "dropbox.com",
    "www.dropbox.com",
    "adobe.com",
    "www.adobe.com",
    // E-commerce
    "amazon.com",
    "www.amazon.com",
    "amazon.co.uk",
    "amazon.de",
    "amazon.fr",
    "amazon.it",
    "amazon.es",
    "amazon.ca",
    "amazon.in",
    "amazon.co.jp",
    "amazon.com.br",
    "amazon.com.mx",
    "amazon.com.au",
    "aws.amazon.com",
    "media-amazon.com",
    "ssl-images-amazon.com",
    "ebay.com",
    "www.ebay.com",
    "ebay.co.uk",
    "ebay.de",
    "walmart.com",
    "www.walmart.com",
    "target.com",
    "www.target.com",
    "bestbuy.com",
    "www.bestbuy.com",
    "aliexpress.com",
    "www.aliexpress.com",
    "etsy.com",
    "www.etsy.com",
    // Payment and banking
    "paypal.com",
    "www.paypal.com",
    "stripe.com",
    "www.stripe.com",
    "chase.com",
    "www.chase.com",
    "wellsfargo.com",
    "www.wellsfargo.com",
    "bankofamerica.com",
    "www.bankofamerica.com",
    "americanexpress.com",
    "www.americanexpress.com",
    // Information and news
    "wikipedia.org",
    "www.wikipedia.org",
    "nytimes.com",
    "www.nytimes.com",
    "cnn.com",
    "www.cnn.com",
    "bbc.co.uk",
    "www.bbc.co.uk",
    "bbc.com",
    "reddit.com",
    "www.reddit.com",
    "stackoverflow.com",
    "www.stackoverflow.com",
    "medium.com",
    "www.medium.com",
    // Local
    "localhost",
    "127.0.0.1",
];

#[derive(Debug, Clone)]
pub struct WhitelistMatcher {
    trusted: HashSet<String>,
}

impl Default for WhitelistMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl WhitelistMatcher {
    pub fn new() -> Self {
        Self::with_extra(std::iter::empty::<String>())
    }

    /// Built-in set plus caller-supplied trusted domains
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut trusted: HashSet<String> = DEFAULT_TRUSTED_DOMAINS
            .iter()
            .map(|d| d.to_string())
            .collect();
        trusted.extend(
            extra
                .into_iter()
                .map(|d| d.as_ref().trim().to_lowercase())
                .filter(|d| !d.is_empty()),
        );

        Self { trusted }
    }

    /// Exact match, or a true subdomain of a trusted entry. Case-insensitive.
    pub fn is_trusted(&self, domain: &str) -> bool {
        let domain_lower = domain.trim_end_matches('.').to_lowercase();
        if domain_lower.is_empty() {
            return false;
        }

        if self.trusted.contains(&domain_lower) {
            return true;
        }

        self.trusted
            .iter()
            .any(|entry| DomainUtils::is_same_or_subdomain(&domain_lower, entry))
    }

    pub fn len(&self) -> usize {
        self.trusted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trusted.is_empty()
    }
}

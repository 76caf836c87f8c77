use crate::detection::whitelist::WhitelistMatcher;
use crate::domain_utils::DomainUtils;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strsim::levenshtein;

/// Typosquats differ from the real label by at most this many edits
const MAX_TYPO_DISTANCE: usize = 2;
/// Shorter labels are too close to everything to be meaningful
const MIN_TYPO_LABEL_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandEntry {
    pub name: String,
    pub domains: Vec<String>,
}

impl BrandEntry {
    pub fn new(name: &str, domains: &[&str]) -> Self {
        Self {
            name: name.to_lowercase(),
            domains: domains.iter().map(|d| d.to_lowercase()).collect(),
        }
    }

    /// Exact match only; subdomains are covered by the whitelist or not at all
    pub fn is_legitimate(&self, domain: &str) -> bool {
        let domain = domain.trim_end_matches('.').to_lowercase();
        self.domains.iter().any(|d| *d == domain)
    }
}

/// Brand name -> legitimate domains. Iteration order is the tie-break order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandTable {
    brands: Vec<BrandEntry>,
}

impl Default for BrandTable {
    fn default() -> Self {
        Self {
            brands: vec![
                BrandEntry::new(
                    "google",
                    &[
                        "google.com",
                        "gmail.com",
                        "google.co.uk",
                        "google.de",
                        "google.fr",
                        "google.it",
                        "google.es",
                        "google.ca",
                        "google.com.au",
                        "google.co.in",
                        "google.co.jp",
                        "google.com.br",
                    ],
                ),
                BrandEntry::new(
                    "microsoft",
                    &[
                        "microsoft.com",
                        "office.com",
                        "live.com",
                        "azure.com",
                        "outlook.com",
                        "hotmail.com",
                        "windows.com",
                    ],
                ),
                BrandEntry::new("apple", &["apple.com", "icloud.com", "itunes.com"]),
                BrandEntry::new(
                    "amazon",
                    &[
                        "amazon.com",
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
                    ],
                ),
                BrandEntry::new("paypal", &["paypal.com", "paypal.me"]),
                BrandEntry::new("netflix", &["netflix.com"]),
                BrandEntry::new("facebook", &["facebook.com", "fb.com", "messenger.com"]),
                BrandEntry::new("instagram", &["instagram.com"]),
                BrandEntry::new("linkedin", &["linkedin.com"]),
                BrandEntry::new("twitter", &["twitter.com", "x.com", "t.co"]),
                BrandEntry::new("dropbox", &["dropbox.com"]),
                BrandEntry::new("adobe", &["adobe.com"]),
                BrandEntry::new("chase", &["chase.com"]),
                BrandEntry::new("wellsfargo", &["wellsfargo.com"]),
                BrandEntry::new("bankofamerica", &["bankofamerica.com"]),
                BrandEntry::new("ebay", &["ebay.com", "ebay.co.uk", "ebay.de"]),
            ],
        }
    }
}

impl BrandTable {
    pub fn empty() -> Self {
        Self { brands: Vec::new() }
    }

    /// Appends a brand, or extends the domain list of one already present
    pub fn add(&mut self, entry: BrandEntry) {
        let name = entry.name.to_lowercase();
        match self.brands.iter_mut().find(|b| b.name == name) {
            Some(existing) => {
                for domain in entry.domains {
                    let domain = domain.to_lowercase();
                    if !existing.domains.contains(&domain) {
                        existing.domains.push(domain);
                    }
                }
            }
            None => self.brands.push(BrandEntry {
                name,
                domains: entry.domains.iter().map(|d| d.to_lowercase()).collect(),
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BrandEntry> {
        self.brands.iter()
    }

    pub fn get(&self, name: &str) -> Option<&BrandEntry> {
        let name = name.to_lowercase();
        self.brands.iter().find(|b| b.name == name)
    }

    /// Get brand from domain if it's a known legitimate domain
    pub fn brand_for_domain(&self, domain: &str) -> Option<&str> {
        self.brands
            .iter()
            .find(|b| b.is_legitimate(domain))
            .map(|b| b.name.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct BrandImpersonationDetector {
    brands: Arc<BrandTable>,
    whitelist: Arc<WhitelistMatcher>,
}

impl BrandImpersonationDetector {
    pub fn new(brands: Arc<BrandTable>, whitelist: Arc<WhitelistMatcher>) -> Self {
        Self { brands, whitelist }
    }

    /// Name of the brand this domain impersonates, if any. First matching brand wins.
    pub fn check(&self, domain: &str) -> Option<String> {
        let domain = DomainUtils::canonicalize_domain(domain.trim().trim_end_matches('.'));
        if domain.is_empty() {
            return None;
        }

        if self.brands.brand_for_domain(&domain).is_some() || self.whitelist.is_trusted(&domain) {
            return None;
        }

        let label = DomainUtils::first_label(&domain);
        let label_len = label.chars().count();

        for brand in self.brands.iter() {
            // paypal-secure-update.com
            if domain.contains(brand.name.as_str()) {
                log::debug!("Domain {domain} contains brand token {}", brand.name);
                return Some(brand.name.clone());
            }

            // g0ogle.com
            if label_len >= MIN_TYPO_LABEL_LEN {
                for legitimate in &brand.domains {
                    let legitimate_label = DomainUtils::first_label(legitimate);
                    let distance = levenshtein(label, legitimate_label);
                    if distance > 0 && distance <= MAX_TYPO_DISTANCE {
                        log::debug!(
                            "Domain {domain} is {distance} edits from {legitimate} ({})",
                            brand.name
                        );
                        return Some(brand.name.clone());
                    }
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> BrandImpersonationDetector {
        BrandImpersonationDetector::new(
            Arc::new(BrandTable::default()),
            Arc::new(WhitelistMatcher::new()),
        )
    }

    #[test]
    fn test_keyword_containment() {
        let detector = detector();

        assert_eq!(
            detector.check("paypal-secure-update.com"),
            Some("paypal".to_string())
        );
        assert_eq!(
            detector.check("www.netflix-billing.net"),
            Some("netflix".to_string())
        );
    }

    #[test]
    fn test_typosquatting() {
        let detector = detector();

        assert_eq!(detector.check("g0ogle.com"), Some("google".to_string()));
        assert_eq!(detector.check("www.paypa1.com"), Some("paypal".to_string()));
        assert_eq!(detector.check("goooooogle.com"), None);
    }

    #[test]
    fn test_short_labels_are_ignored() {
        let detector = detector();

        // "ebey" is one edit from "ebay" but too short to judge
        assert_eq!(detector.check("ebey.com"), None);
    }

    #[test]
    fn test_legitimate_and_trusted_domains() {
        let detector = detector();

        assert_eq!(detector.check("google.com"), None);
        assert_eq!(detector.check("www.google.com"), None);
        assert_eq!(detector.check("mail.google.com"), None);
        assert_eq!(detector.check("paypal.me"), None);
        assert_eq!(detector.check("github.com"), None);
        assert_eq!(detector.check("example.org"), None);
        assert_eq!(detector.check(""), None);
    }

    #[test]
    fn test_untrusted_subdomain_of_brand_domain_is_flagged() {
        let detector = detector();

        assert_eq!(detector.check("paypal.me"), None);
        assert_eq!(detector.check("x.paypal.me"), Some("paypal".to_string()));
        // trusted through the whitelist instead
        assert_eq!(detector.check("accounts.google.com"), None);
    }

    #[test]
    fn test_first_brand_in_table_order_wins() {
        let detector = detector();

        // Both tokens present; google precedes paypal in the table
        assert_eq!(
            detector.check("paypal-google-login.com"),
            Some("google".to_string())
        );
    }

    #[test]
    fn test_table_add() {
        let mut table = BrandTable::default();
        table.add(BrandEntry::new("Contoso", &["contoso.com"]));
        table.add(BrandEntry::new("paypal", &["paypal.de"]));

        assert_eq!(table.brand_for_domain("contoso.com"), Some("contoso"));
        assert_eq!(table.brand_for_domain("shop.contoso.com"), None);
        assert_eq!(table.brand_for_domain("paypal.de"), Some("paypal"));
        assert_eq!(table.iter().last().map(|b| b.name.as_str()), Some("contoso"));

        let detector =
            BrandImpersonationDetector::new(Arc::new(table), Arc::new(WhitelistMatcher::new()));
        assert_eq!(
            detector.check("contoso-payroll.com"),
            Some("contoso".to_string())
        );
    }
}

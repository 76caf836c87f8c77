use url::Url;

/// Two-label public suffixes that need three labels to name a registrable domain
const TWO_PART_TLDS: &[&str] = &[
    "co.uk", "com.au", "co.jp", "co.kr", "com.br", "co.za", "com.mx", "co.in", "com.sg", "co.nz",
    "com.ar", "co.il", "org.uk", "net.au", "gov.uk", "ac.uk", "edu.au",
];

/// Minimal domain hierarchy utilities
pub struct DomainUtils;

impl DomainUtils {
    /// Extract the lower-cased host of a URL, if it has one
    pub fn host_of(url: &str) -> Option<String> {
        Url::parse(url)
            .ok()?
            .host_str()
            .filter(|h| !h.is_empty())
            .map(|h| h.to_lowercase())
    }

    /// Host as the user typed it: `xn--` labels decoded back to Unicode.
    /// Labels that fail to decode are kept as they are.
    pub fn unicode_host(host: &str) -> String {
        let (unicode, result) = idna::domain_to_unicode(host);
        if let Err(e) = result {
            log::debug!("Could not decode host {host}: {e:?}");
        }
        unicode.to_lowercase()
    }

    /// `mail.example.com` and `example.com` match `example.com`; `notexample.com` does not
    pub fn is_same_or_subdomain(domain: &str, pattern: &str) -> bool {
        let pattern_lower = pattern.to_lowercase();
        if domain == pattern_lower {
            return true;
        }

        domain
            .strip_suffix(pattern_lower.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
    }

    /// Canonicalize domain (remove www prefix)
    pub fn canonicalize_domain(domain: &str) -> String {
        let domain_lower = domain.to_lowercase();
        if let Some(stripped) = domain_lower.strip_prefix("www.") {
            stripped.to_string()
        } else {
            domain_lower
        }
    }

    /// First DNS label of a domain, e.g. `g0ogle` for `g0ogle.com`
    pub fn first_label(domain: &str) -> &str {
        domain.split('.').next().unwrap_or(domain)
    }

    /// Extract root domain for WHOIS queries (removes subdomains)
    /// e.g., "email.nationalgeographic.com" -> "nationalgeographic.com"
    pub fn registrable_root(domain: &str) -> String {
        let parts: Vec<&str> = domain.split('.').collect();
        if parts.len() < 2 {
            return domain.to_string();
        }

        let n = parts.len();
        let suffix = format!("{}.{}", parts[n - 2], parts[n - 1]);
        if n >= 3 && TWO_PART_TLDS.contains(&suffix.as_str()) {
            return format!("{}.{}", parts[n - 3], suffix);
        }

        suffix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_of() {
        assert_eq!(
            DomainUtils::host_of("https://Accounts.Google.com/login"),
            Some("accounts.google.com".to_string())
        );
        assert_eq!(
            DomainUtils::host_of("http://127.0.0.1:8080/"),
            Some("127.0.0.1".to_string())
        );
        assert_eq!(DomainUtils::host_of("not a url"), None);
        assert_eq!(DomainUtils::host_of("paypal.com"), None);
    }

    #[test]
    fn test_unicode_host() {
        assert_eq!(
            DomainUtils::unicode_host("xn--ggle-55da.com"),
            "g\u{43e}\u{43e}gle.com"
        );
        assert_eq!(DomainUtils::unicode_host("Example.COM"), "example.com");

        let parsed = DomainUtils::host_of("http://g\u{43e}\u{43e}gle.com/").unwrap();
        assert_eq!(parsed, "xn--ggle-55da.com");
        assert_eq!(DomainUtils::unicode_host(&parsed), "g\u{43e}\u{43e}gle.com");
    }

    #[test]
    fn test_is_same_or_subdomain() {
        assert!(DomainUtils::is_same_or_subdomain("example.com", "example.com"));
        assert!(DomainUtils::is_same_or_subdomain("mail.example.com", "Example.com"));
        assert!(!DomainUtils::is_same_or_subdomain("notexample.com", "example.com"));
    }

    #[test]
    fn test_canonicalize_domain() {
        assert_eq!(
            DomainUtils::canonicalize_domain("www.example.com"),
            "example.com"
        );
        assert_eq!(
            DomainUtils::canonicalize_domain("example.com"),
            "example.com"
        );
    }

    #[test]
    fn test_registrable_root() {
        assert_eq!(DomainUtils::registrable_root("example.com"), "example.com");
        assert_eq!(
            DomainUtils::registrable_root("email.nationalgeographic.com"),
            "nationalgeographic.com"
        );
        assert_eq!(
            DomainUtils::registrable_root("mail.example.co.uk"),
            "example.co.uk"
        );
        assert_eq!(DomainUtils::registrable_root("single"), "single");
    }
}

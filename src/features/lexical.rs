//! String-only URL features. None of these touch the network.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use url::{Host, Url};

/// Words phishing URLs lean on; matches are counted independently
pub const SUSPICIOUS_KEYWORDS: [&str; 17] = [
    "login",
    "signin",
    "account",
    "verify",
    "update",
    "confirm",
    "secure",
    "banking",
    "paypal",
    "ebay",
    "amazon",
    "apple",
    "microsoft",
    "google",
    "password",
    "credential",
    "suspend",
];

pub const URL_SHORTENERS: [&str; 9] = [
    "bit.ly",
    "goo.gl",
    "tinyurl.com",
    "t.co",
    "ow.ly",
    "buff.ly",
    "is.gd",
    "cli.gs",
    "tiny.cc",
];

static EMBEDDED_IPV4: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}").unwrap());

/// Ratio of ASCII digits to total characters, 0 for an empty string
pub fn digit_ratio(url: &str) -> f64 {
    let total = url.chars().count();
    if total == 0 {
        return 0.0;
    }
    let digits = url.chars().filter(|c| c.is_ascii_digit()).count();
    digits as f64 / total as f64
}

/// Non-empty `/`-separated path segments
pub fn path_depth(parsed: &Url) -> usize {
    parsed.path().split('/').filter(|p| !p.is_empty()).count()
}

/// Distinct query keys carrying a non-empty value
pub fn query_param_count(parsed: &Url) -> usize {
    parsed
        .query_pairs()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, _)| k.into_owned())
        .collect::<HashSet<_>>()
        .len()
}

/// IP literal as the host, or a dotted quad embedded in the host name
pub fn has_ip_address(parsed: &Url) -> bool {
    match parsed.host() {
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
        Some(Host::Domain(domain)) => EMBEDDED_IPV4.is_match(domain),
        None => false,
    }
}

/// Shannon entropy in bits per character
pub fn shannon_entropy(s: &str) -> f64 {
    let total = s.chars().count();
    if total == 0 {
        return 0.0;
    }

    let mut counts: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }

    let entropy: f64 = counts
        .values()
        .map(|&count| {
            let p = count as f64 / total as f64;
            -p * p.log2()
        })
        .sum();

    // -0.0 for single-character strings
    entropy.max(0.0)
}

pub fn count_suspicious_keywords(url: &str) -> usize {
    let url_lower = url.to_lowercase();
    SUSPICIOUS_KEYWORDS
        .iter()
        .filter(|keyword| url_lower.contains(*keyword))
        .count()
}

pub fn is_shortened(host: &str) -> bool {
    let host_lower = host.to_lowercase();
    URL_SHORTENERS.iter().any(|s| host_lower.contains(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_entropy() {
        assert_eq!(shannon_entropy(""), 0.0);
        assert_eq!(shannon_entropy("aaaa"), 0.0);
        assert!(approx(shannon_entropy("ab"), 1.0));
        assert!(approx(shannon_entropy("abcd"), 2.0));
        assert!(approx(shannon_entropy("aabbccdd"), 2.0));
        assert!(approx(shannon_entropy("abcdefgh"), 3.0));
    }

    #[test]
    fn test_digit_ratio() {
        assert_eq!(digit_ratio(""), 0.0);
        assert!(approx(digit_ratio("a1b2"), 0.5));
        assert_eq!(digit_ratio("abc"), 0.0);
    }

    #[test]
    fn test_keywords_are_not_exclusive() {
        // "paypal", "secure", "update", "login"
        assert_eq!(
            count_suspicious_keywords("http://PayPal-secure-update.com/login"),
            4
        );
        assert_eq!(count_suspicious_keywords("http://example.com/signin"), 1);
        assert_eq!(count_suspicious_keywords("http://example.com"), 0);
    }

    #[test]
    fn test_ip_detection() {
        let v4 = Url::parse("http://192.168.1.10/login").unwrap();
        let v6 = Url::parse("http://[2001:db8::1]/").unwrap();
        let embedded = Url::parse("http://10.0.0.1.evil.com/").unwrap();
        let named = Url::parse("http://example.com/").unwrap();
        let hexish = Url::parse("http://deadbeefcafe.com/").unwrap();

        assert!(has_ip_address(&v4));
        assert!(has_ip_address(&v6));
        assert!(has_ip_address(&embedded));
        assert!(!has_ip_address(&named));
        assert!(!has_ip_address(&hexish));
    }

    #[test]
    fn test_path_and_query() {
        let parsed = Url::parse("http://example.com//a/b/?x=1&y=2&x=3&z=").unwrap();
        assert_eq!(path_depth(&parsed), 2);
        assert_eq!(query_param_count(&parsed), 2);
    }

    #[test]
    fn test_shortener() {
        assert!(is_shortened("bit.ly"));
        assert!(is_shortened("www.TinyURL.com"));
        assert!(!is_shortened("example.com"));
    }
}

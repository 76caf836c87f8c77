use super::DomainAgeSource;
use crate::domain_utils::DomainUtils;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const FALLBACK_SERVERS: &[&str] = &["whois.iana.org", "whois.internic.net"];

/// Common patterns for creation date in WHOIS text
static CREATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)creation\s*date[:\s]+([^\r\n]+)",
        r"(?i)created[:\s]+([^\r\n]+)",
        r"(?i)registered[:\s]+([^\r\n]+)",
        r"(?i)domain\s*created[:\s]+([^\r\n]+)",
        r"(?i)registration\s*date[:\s]+([^\r\n]+)",
        r"(?i)created\s*on[:\s]+([^\r\n]+)",
        r"(?i)registered\s*on[:\s]+([^\r\n]+)",
        r"(?i)domain_date_created[:\s]+([^\r\n]+)",
        r"(?i)create_date[:\s]+([^\r\n]+)",
        r"(?i)created_date[:\s]+([^\r\n]+)",
        r"(?i)registration_time[:\s]+([^\r\n]+)",
        r"(?i)fecha\s*de\s*creaci[oó]n[:\s]+([^\r\n]+)",
        r"(?i)date\s*de\s*cr[eé]ation[:\s]+([^\r\n]+)",
        r"(?i)erstellt\s*am[:\s]+([^\r\n]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%d.%m.%Y", "%Y.%m.%d", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Domain age from the registry's WHOIS record
#[derive(Debug, Clone)]
pub struct WhoisAgeChecker {
    timeout: Duration,
}

impl WhoisAgeChecker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Determine the appropriate WHOIS server for a domain
    pub fn whois_server(domain: &str) -> &'static str {
        let tld = domain.rsplit('.').next().unwrap_or(domain);

        match tld {
            "com" | "net" => "whois.verisign-grs.com",
            "org" => "whois.pir.org",
            "info" => "whois.afilias.net",
            "biz" => "whois.neulevel.biz",
            "us" => "whois.nic.us",
            "uk" => "whois.nic.uk",
            "de" => "whois.denic.de",
            "fr" => "whois.afnic.fr",
            "it" => "whois.nic.it",
            "nl" => "whois.domain-registry.nl",
            "au" => "whois.auda.org.au",
            "ca" => "whois.cira.ca",
            "jp" => "whois.jprs.jp",
            "cn" => "whois.cnnic.cn",
            "ru" => "whois.tcinet.ru",
            "br" => "whois.registro.br",
            "mx" => "whois.mx",
            "tk" => "whois.dot.tk",
            "ml" => "whois.dot.ml",
            "ga" => "whois.dot.ga",
            "cf" => "whois.dot.cf",
            _ => "whois.iana.org",
        }
    }

    /// Query a WHOIS server directly using TCP port 43
    async fn query(&self, server: &str, domain: &str) -> Result<String> {
        log::debug!("Connecting to WHOIS server: {server}:43");

        let mut stream = timeout(self.timeout, TcpStream::connect((server, 43))).await??;
        stream.write_all(format!("{domain}\r\n").as_bytes()).await?;

        let mut response = Vec::new();
        timeout(self.timeout, stream.read_to_end(&mut response)).await??;

        if response.is_empty() {
            return Err(anyhow!("Empty WHOIS response from {server}"));
        }

        Ok(String::from_utf8_lossy(&response).into_owned())
    }

    /// Age in days from a raw WHOIS response
    pub fn age_from_whois(text: &str, today: NaiveDate) -> Option<u32> {
        let created = Self::creation_date(text)?;
        let days = (today - created).num_days().max(0);
        u32::try_from(days).ok()
    }

    fn creation_date(text: &str) -> Option<NaiveDate> {
        for pattern in CREATION_PATTERNS.iter() {
            for captures in pattern.captures_iter(text) {
                let Some(date_match) = captures.get(1) else {
                    continue;
                };
                let date_str = date_match.as_str().trim();
                if let Some(date) = parse_date(date_str) {
                    return Some(date);
                }
                log::debug!("Could not parse date format: '{date_str}'");
            }
        }
        None
    }
}

/// Parse the date formats registries commonly use
fn parse_date(date_str: &str) -> Option<NaiveDate> {
    let candidates = [date_str, date_str.split_whitespace().next().unwrap_or("")];

    for candidate in candidates {
        if candidate.is_empty() {
            continue;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(candidate) {
            return Some(dt.with_timezone(&Utc).date_naive());
        }
        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(candidate, format) {
                return Some(dt.date());
            }
        }
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
                return Some(date);
            }
        }
    }

    None
}

#[async_trait]
impl DomainAgeSource for WhoisAgeChecker {
    async fn age_days(&self, domain: &str) -> Result<Option<u32>> {
        let root = DomainUtils::registrable_root(&domain.to_lowercase());
        if root.is_empty() || !root.contains('.') || root.contains(char::is_whitespace) {
            return Err(anyhow!("Invalid domain format: {root} (from: {domain})"));
        }

        let today = Utc::now().date_naive();
        let primary = Self::whois_server(&root);

        let servers = std::iter::once(primary).chain(
            FALLBACK_SERVERS
                .iter()
                .copied()
                .filter(|server| *server != primary),
        );

        for server in servers {
            match self.query(server, &root).await {
                Ok(text) => {
                    log::debug!("Got WHOIS response from {server} ({} chars)", text.len());
                    if let Some(age) = Self::age_from_whois(&text, today) {
                        log::debug!("Domain {root} is {age} days old");
                        return Ok(Some(age));
                    }
                }
                Err(e) => log::debug!("WHOIS server {server} failed for {root}: {e}"),
            }
        }

        log::debug!("Could not determine age for domain: {domain} (root: {root})");
        Ok(None)
    }
}

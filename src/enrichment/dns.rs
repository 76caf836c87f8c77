use super::DnsValidator;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::TokioAsyncResolver;
use std::net::IpAddr;
use std::time::Duration;

/// A then MX lookup through the system resolver
#[derive(Debug, Clone)]
pub struct HickoryDnsValidator {
    timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Found(usize),
    Absent,
}

impl HickoryDnsValidator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// A definitive "no such records" answer is absence, anything else is an error
    fn classify(what: &str, domain: &str, result: Result<usize, ResolveError>) -> Result<Answer> {
        match result {
            Ok(0) => Ok(Answer::Absent),
            Ok(count) => Ok(Answer::Found(count)),
            Err(e) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => {
                    log::debug!("No {what} records for {domain}");
                    Ok(Answer::Absent)
                }
                _ => Err(anyhow!("{what} lookup failed for {domain}: {e}")),
            },
        }
    }
}

#[async_trait]
impl DnsValidator for HickoryDnsValidator {
    async fn has_records(&self, domain: &str) -> Result<bool> {
        let bare = domain.trim_start_matches('[').trim_end_matches(']');
        if bare.parse::<IpAddr>().is_ok() {
            return Ok(true);
        }

        let resolver = TokioAsyncResolver::tokio_from_system_conf()
            .map_err(|e| anyhow!("Failed to create DNS resolver for {domain}: {e}"))?;

        log::debug!("Checking A records for {domain}");
        let a = tokio::time::timeout(self.timeout, resolver.ipv4_lookup(domain))
            .await
            .map_err(|_| anyhow!("A lookup timed out for {domain}"))?
            .map(|lookup| lookup.iter().count());
        if let Answer::Found(count) = Self::classify("A", domain, a)? {
            log::debug!("DNS validation successful for {domain} ({count} A records found)");
            return Ok(true);
        }

        log::debug!("Checking MX records for {domain}");
        let mx = tokio::time::timeout(self.timeout, resolver.mx_lookup(domain))
            .await
            .map_err(|_| anyhow!("MX lookup timed out for {domain}"))?
            .map(|lookup| lookup.iter().count());
        match Self::classify("MX", domain, mx)? {
            Answer::Found(count) => {
                log::debug!("DNS validation successful for {domain} ({count} MX records found)");
                Ok(true)
            }
            Answer::Absent => {
                log::debug!("{domain} has neither A nor MX records");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_answers() {
        assert_eq!(
            HickoryDnsValidator::classify("A", "example.com", Ok(2)).unwrap(),
            Answer::Found(2)
        );
        assert_eq!(
            HickoryDnsValidator::classify("A", "example.com", Ok(0)).unwrap(),
            Answer::Absent
        );
    }

    #[test]
    fn test_resolver_malfunction_is_an_error() {
        let err = ResolveError::from("connection refused");
        assert!(HickoryDnsValidator::classify("MX", "example.com", Err(err)).is_err());
    }

    #[tokio::test]
    async fn test_ip_literals_are_valid() {
        let validator = HickoryDnsValidator::new(Duration::from_millis(10));
        assert!(validator.has_records("192.168.1.1").await.unwrap());
        assert!(validator.has_records("[::1]").await.unwrap());
    }
}

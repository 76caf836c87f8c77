//! Externally sourced context about a URL's domain.
//!
//! Every section and every field is optional; the extractor fills in the
//! documented default for anything missing. Flags may be given either as
//! JSON booleans or as numbers.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Enrichment {
    pub whois: Option<WhoisSection>,
    pub ssl: Option<SslSection>,
    pub dns: Option<DnsSection>,
    pub geo: Option<GeoSection>,
    pub content: Option<ContentSection>,
    pub threat_feeds: Option<ThreatFeedsSection>,
    /// Per-source threat sections, used where `threat_feeds` is silent
    pub google_safe_browsing: Option<SafeBrowsingSection>,
    pub virustotal: Option<VirusTotalSection>,
    pub blocklists: Option<BlocklistSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhoisSection {
    #[serde(deserialize_with = "signal")]
    pub domain_age_days: Option<f64>,
    #[serde(deserialize_with = "signal")]
    pub registration_length_years: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SslSection {
    #[serde(deserialize_with = "signal")]
    pub has_https: Option<f64>,
    #[serde(deserialize_with = "signal")]
    pub valid_ssl: Option<f64>,
    #[serde(deserialize_with = "signal")]
    pub cert_age_days: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsSection {
    #[serde(deserialize_with = "signal")]
    pub subdomain_count: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoSection {
    #[serde(deserialize_with = "signal")]
    pub high_risk_country: Option<f64>,
    #[serde(deserialize_with = "signal")]
    pub as_reputation_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSection {
    #[serde(deserialize_with = "signal")]
    pub form_count: Option<f64>,
    #[serde(deserialize_with = "signal")]
    pub has_password_field: Option<f64>,
    #[serde(deserialize_with = "signal")]
    pub typosquatting_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatFeedsSection {
    /// Google Safe Browsing threat type code, 0 when clean
    #[serde(deserialize_with = "signal")]
    pub gsb_threat_type: Option<f64>,
    /// VirusTotal engines flagging the URL
    #[serde(deserialize_with = "signal")]
    pub vt_positives: Option<f64>,
    #[serde(deserialize_with = "signal")]
    pub in_phishing_list: Option<f64>,
    #[serde(deserialize_with = "signal")]
    pub ip_blocklisted: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeBrowsingSection {
    #[serde(deserialize_with = "signal")]
    pub threat_type_code: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirusTotalSection {
    #[serde(deserialize_with = "signal")]
    pub positives: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlocklistSection {
    #[serde(deserialize_with = "signal")]
    pub in_phishing_list: Option<f64>,
    #[serde(deserialize_with = "signal")]
    pub ip_blocklisted: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSignal {
    Flag(bool),
    Number(f64),
}

fn signal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawSignal>::deserialize(deserializer)?;
    Ok(raw.map(|r| match r {
        RawSignal::Flag(true) => 1.0,
        RawSignal::Flag(false) => 0.0,
        RawSignal::Number(n) => n,
    }))
}

impl Enrichment {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Threat-intel signals from `threat_feeds`, filled in field by field
    /// from the per-source sections
    pub fn threat_intel(&self) -> ThreatFeedsSection {
        let feeds = self.threat_feeds.clone().unwrap_or_default();
        let gsb = self.google_safe_browsing.clone().unwrap_or_default();
        let vt = self.virustotal.clone().unwrap_or_default();
        let lists = self.blocklists.clone().unwrap_or_default();

        ThreatFeedsSection {
            gsb_threat_type: feeds.gsb_threat_type.or(gsb.threat_type_code),
            vt_positives: feeds.vt_positives.or(vt.positives),
            in_phishing_list: feeds.in_phishing_list.or(lists.in_phishing_list),
            ip_blocklisted: feeds.ip_blocklisted.or(lists.ip_blocklisted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_record() {
        let enrichment = Enrichment::from_json(
            r#"{
                "whois": {"domain_age_days": 12},
                "ssl": {"has_https": true, "valid_ssl": false},
                "threat_feeds": {"vt_positives": 3}
            }"#,
        )
        .unwrap();

        let whois = enrichment.whois.unwrap();
        assert_eq!(whois.domain_age_days, Some(12.0));
        assert_eq!(whois.registration_length_years, None);

        let ssl = enrichment.ssl.unwrap();
        assert_eq!(ssl.has_https, Some(1.0));
        assert_eq!(ssl.valid_ssl, Some(0.0));

        assert!(enrichment.geo.is_none());
        assert_eq!(enrichment.threat_feeds.unwrap().vt_positives, Some(3.0));
    }

    #[test]
    fn test_per_source_threat_sections() {
        let enrichment = Enrichment::from_json(
            r#"{
                "google_safe_browsing": {"threat_type_code": 2},
                "virustotal": {"positives": 7},
                "blocklists": {"in_phishing_list": true, "ip_blocklisted": false},
                "threat_feeds": {"vt_positives": 1}
            }"#,
        )
        .unwrap();

        let threat = enrichment.threat_intel();
        assert_eq!(threat.gsb_threat_type, Some(2.0));
        // threat_feeds wins where both are present
        assert_eq!(threat.vt_positives, Some(1.0));
        assert_eq!(threat.in_phishing_list, Some(1.0));
        assert_eq!(threat.ip_blocklisted, Some(0.0));
        assert_eq!(Enrichment::default().threat_intel(), ThreatFeedsSection::default());
    }

    #[test]
    fn test_empty_record() {
        assert_eq!(Enrichment::from_json("{}").unwrap(), Enrichment::default());
    }
}

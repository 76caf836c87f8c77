use super::Geolocator;
use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// ip-api.com style JSON geolocation
pub struct IpApiGeolocator {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeoResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    country_code: String,
    #[serde(default)]
    message: Option<String>,
}

impl IpApiGeolocator {
    pub fn new(endpoint: &str, timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// `"<country> <countryCode>"` from a response body
    pub fn parse_location(body: &str) -> Result<String> {
        let response: GeoResponse = serde_json::from_str(body)?;

        if response.status != "success" {
            bail!(
                "geolocation status {:?}: {}",
                response.status,
                response.message.unwrap_or_default()
            );
        }

        let location = format!("{} {}", response.country, response.country_code);
        let location = location.trim();
        if location.is_empty() {
            bail!("geolocation response has no country");
        }
        Ok(location.to_string())
    }
}

#[async_trait]
impl Geolocator for IpApiGeolocator {
    async fn locate(&self, domain: &str) -> Result<String> {
        let url = format!("{}/{domain}", self.endpoint);
        log::debug!("Geolocating {domain} via {url}");

        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Self::parse_location(&body)
    }
}

use super::ContentFetcher;
use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Fetches the landing page so the content analyzer can inspect it.
///
/// Phishing kits routinely sit behind self-signed or mismatched
/// certificates, so certificate errors do not stop the fetch.
pub struct HttpContentFetcher {
    client: Client,
}

impl HttpContentFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        log::debug!("Fetching page content: {url}");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            bail!("{url} answered {status}");
        }

        Ok(response.text().await?)
    }
}

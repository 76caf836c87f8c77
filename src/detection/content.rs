//! Page-content signals for the content-analysis escalation rule.

use crate::detection::brand_impersonation::BrandTable;
use crate::domain_utils::DomainUtils;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::sync::Arc;

static FORM_INPUT: Lazy<Selector> = Lazy::new(|| Selector::parse("form input").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

/// Login form served over plain HTTP
const PLAINTEXT_PASSWORD_SCORE: u8 = 2;
const PASSWORD_SCORE: u8 = 1;
const TITLE_BRAND_SCORE: u8 = 1;

#[derive(Debug, Clone)]
pub struct ContentAnalyzer {
    brands: Arc<BrandTable>,
}

impl ContentAnalyzer {
    pub fn new(brands: Arc<BrandTable>) -> Self {
        Self { brands }
    }

    /// Suspicion score in `0..=3` for a fetched page
    pub fn score(&self, html: &str, url: &str) -> u8 {
        let document = Html::parse_document(html);
        let mut score = 0;

        if Self::has_password_field(&document) {
            if Self::is_plaintext(url) {
                score += PLAINTEXT_PASSWORD_SCORE;
            } else {
                score += PASSWORD_SCORE;
            }
        }

        let host = DomainUtils::host_of(url).unwrap_or_default();
        if let Some(brand) = Self::title(&document).and_then(|t| self.foreign_brand_in_title(&t, &host))
        {
            log::debug!("Page title mentions {brand} but host is {host}");
            score += TITLE_BRAND_SCORE;
        }

        score
    }

    fn has_password_field(document: &Html) -> bool {
        document.select(&FORM_INPUT).any(|input| {
            input
                .value()
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("password"))
        })
    }

    fn is_plaintext(url: &str) -> bool {
        !url.trim_start().to_lowercase().starts_with("https")
    }

    fn title(document: &Html) -> Option<String> {
        let title = document
            .select(&TITLE)
            .next()?
            .text()
            .collect::<String>()
            .trim()
            .to_lowercase();
        (!title.is_empty()).then_some(title)
    }

    /// A brand named in the title whose legitimate domains are all absent from the host
    fn foreign_brand_in_title(&self, title: &str, host: &str) -> Option<String> {
        self.brands
            .iter()
            .find(|brand| {
                title.contains(brand.name.as_str())
                    && !brand.domains.iter().any(|d| host.contains(d.as_str()))
            })
            .map(|brand| brand.name.clone())
    }
}

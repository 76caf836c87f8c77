//! The fixed-order heuristic pass applied on top of a backend verdict.
//!
//! Rules run in this order: domain age, brand impersonation, DNS, page
//! content. Each rule that fires records a synthetic explanation; the
//! finished explanation list puts the most recently fired rule first,
//! followed by the scorer's own ranking.

use crate::verdict::{Assessment, FeatureContribution, Verdict};

/// Domains younger than this many days are treated as newly registered
pub const NEW_DOMAIN_DAYS: u32 = 30;
const MAX_CONFIDENCE: f64 = 0.99;

#[derive(Debug, Clone, PartialEq)]
pub struct Escalation {
    verdict: Verdict,
    confidence: f64,
    /// In application order; reversed once by `finish`
    applied: Vec<FeatureContribution>,
}

impl Escalation {
    pub fn new(verdict: Verdict, confidence: f64) -> Self {
        Self {
            verdict,
            confidence,
            applied: Vec::new(),
        }
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn apply_domain_age(&mut self, age_days: Option<u32>) -> &mut Self {
        let Some(age) = age_days.filter(|age| *age < NEW_DOMAIN_DAYS) else {
            return self;
        };

        let contribution = match self.verdict {
            Verdict::Benign => {
                self.verdict = Verdict::Suspicious;
                self.confidence = 0.65;
                0.5
            }
            Verdict::Suspicious => {
                self.verdict = Verdict::Malicious;
                self.confidence = (self.confidence + 0.2).min(MAX_CONFIDENCE);
                0.8
            }
            Verdict::Malicious => return self,
        };

        log::info!("Domain is {age} days old, escalating to {}", self.verdict);
        self.record("newly_registered_domain", f64::from(age), contribution)
    }

    pub fn apply_brand(&mut self, brand: Option<&str>) -> &mut Self {
        let Some(brand) = brand else {
            return self;
        };

        log::info!("Domain impersonates {brand}, forcing malicious");
        self.verdict = Verdict::Malicious;
        self.confidence = 0.95;
        self.record(format!("impersonates_{brand}"), 1.0, 0.9)
    }

    /// Only an explicit `false` counts; an unknown result never escalates
    pub fn apply_dns(&mut self, dns_valid: Option<bool>) -> &mut Self {
        if dns_valid != Some(false) {
            return self;
        }

        log::info!("Domain has no DNS records, forcing malicious");
        self.verdict = Verdict::Malicious;
        self.confidence = 0.9;
        self.record("invalid_dns", 1.0, 0.8)
    }

    /// The content rule only runs while the verdict can still change
    pub fn wants_content_check(&self) -> bool {
        self.verdict != Verdict::Malicious
    }

    pub fn apply_content_score(&mut self, score: u8) -> &mut Self {
        let contribution = match score {
            0 => return self,
            1 => {
                self.verdict = self.verdict.max(Verdict::Suspicious);
                self.confidence = self.confidence.max(0.7);
                0.5
            }
            _ => {
                self.verdict = Verdict::Malicious;
                self.confidence = self.confidence.max(0.9);
                0.7
            }
        };

        log::info!("Page content scored {score}, escalating to {}", self.verdict);
        self.record("suspicious_content", f64::from(score), contribution)
    }

    fn record(&mut self, name: impl Into<String>, value: f64, contribution: f64) -> &mut Self {
        self.applied
            .push(FeatureContribution::new(name, value, contribution));
        self
    }

    /// Most recently applied rule first, then `base`
    pub fn finish(self, base: Vec<FeatureContribution>) -> Assessment {
        let mut explanations = self.applied;
        explanations.reverse();
        explanations.extend(base);

        Assessment {
            verdict: self.verdict,
            confidence: self.confidence,
            explanations,
        }
    }
}

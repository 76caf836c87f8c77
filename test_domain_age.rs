use std::time::Duration;
use url_verdict::enrichment::{DomainAgeSource, WhoisAgeChecker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let domains: Vec<String> = std::env::args().skip(1).collect();
    let domains = if domains.is_empty() {
        vec![
            "google.com".to_string(),
            "mail.example.org".to_string(),
            "bbc.co.uk".to_string(),
        ]
    } else {
        domains
    };

    println!("Testing live WHOIS domain age lookups...");
    let checker = WhoisAgeChecker::new(Duration::from_secs(5));

    for domain in &domains {
        println!("\n=== {domain} (server {}) ===", WhoisAgeChecker::whois_server(domain));
        match checker.age_days(domain).await {
            Ok(Some(age)) => println!("Age: {age} days"),
            Ok(None) => println!("Age: unknown (no creation date in WHOIS response)"),
            Err(e) => println!("Lookup failed: {e}"),
        }
    }

    Ok(())
}

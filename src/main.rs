use clap::{Arg, ArgAction, Command};
use log::LevelFilter;
use std::path::PathBuf;
use std::process;
use url_verdict::{ClassifyError, Config, Enrichment, PredictionResult, Verdict, VerdictEngine};

#[tokio::main]
async fn main() {
    let matches = Command::new("url-verdict")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Classify URLs as benign, suspicious or malicious")
        .arg(
            Arg::new("url")
                .value_name("URL")
                .help("URLs to classify")
                .num_args(0..)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/url-verdict.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .value_name("FILE")
                .help("Scoring model file (overrides the configuration)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("enrichment")
                .long("enrichment")
                .value_name("FILE")
                .help("JSON enrichment record applied to every URL")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("offline")
                .long("offline")
                .help("Disable WHOIS, DNS, page fetch and geolocation lookups")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print full results as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-features")
                .long("list-features")
                .help("List the feature names in model order")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    if matches.get_flag("list-features") {
        for (index, name) in VerdictEngine::feature_names().iter().enumerate() {
            println!("{index:>2}  {name}");
        }
        return;
    }

    let urls: Vec<&String> = matches
        .get_many::<String>("url")
        .map(|values| values.collect())
        .unwrap_or_default();
    if urls.is_empty() {
        eprintln!("No URLs given. Try --help.");
        process::exit(2);
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("/etc/url-verdict.yaml");

    let mut config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    if let Some(model) = matches.get_one::<String>("model") {
        config.model_path = Some(PathBuf::from(model));
    }

    let enrichment = match matches.get_one::<String>("enrichment") {
        Some(path) => match load_enrichment(path) {
            Ok(enrichment) => Some(enrichment),
            Err(e) => {
                eprintln!("Error loading enrichment record '{path}': {e}");
                process::exit(1);
            }
        },
        None => None,
    };

    if matches.get_flag("offline") {
        log::info!("Offline mode, network lookups disabled");
        config.capabilities = config.capabilities.offline();
    }
    log::debug!("Capabilities: {:?}", config.capabilities);
    let engine = VerdictEngine::from_config(&config);

    let json = matches.get_flag("json");
    let mut invalid = false;

    for url in urls {
        match engine.classify(url, enrichment.as_ref()).await {
            Ok(result) if json => match serde_json::to_string_pretty(&result) {
                Ok(rendered) => println!("{rendered}"),
                Err(e) => log::error!("Failed to render result for {url}: {e}"),
            },
            Ok(result) => print_summary(url, &result),
            Err(ClassifyError::InvalidUrl(reason)) => {
                eprintln!("❌ Invalid URL {url:?}: {reason}");
                invalid = true;
            }
        }
    }

    if invalid {
        process::exit(2);
    }
}

fn print_summary(url: &str, result: &PredictionResult) {
    let icon = match result.verdict {
        Verdict::Benign => "✅",
        Verdict::Suspicious => "⚠️",
        Verdict::Malicious => "🚫",
    };

    println!(
        "{icon} {url}: {} ({:.2}, model {})",
        result.verdict, result.confidence, result.model_version
    );

    let diagnostics = &result.diagnostics;
    if diagnostics.is_whitelisted {
        println!("   trusted domain {}", diagnostics.domain);
    }
    if let Some(age) = diagnostics.domain_age_days {
        println!("   domain age: {age} days");
    }
    if let Some(brand) = &diagnostics.impersonated_brand {
        println!("   impersonates: {brand}");
    }
    println!("   location: {}", diagnostics.server_location);

    for explanation in &result.explanations {
        println!(
            "   - {}: value {:.3}, contribution {:.3}",
            explanation.name, explanation.value, explanation.contribution
        );
    }
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

fn load_enrichment(path: &str) -> anyhow::Result<Enrichment> {
    let content = std::fs::read_to_string(path)?;
    Enrichment::from_json(&content)
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

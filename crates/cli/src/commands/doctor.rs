//! `medassist doctor` — Diagnose configuration and corpus.

use medassist_config::{AppConfig, RetrievalBackend};
use medassist_core::provider::Provider;
use medassist_retrieval::{FileSource, PassageSource};

/// Reachability of the provider and availability of the configured models.
///
/// Returns the report lines and the number of issues found.
async fn check_provider(provider: &dyn Provider, models: &[&str]) -> (Vec<String>, usize) {
    let name = provider.name();
    match provider.health_check().await {
        Ok(true) => {}
        Ok(false) => return (vec![format!("  ❌ Provider '{name}' rejected the request")], 1),
        Err(e) => return (vec![format!("  ❌ Provider '{name}' unreachable: {e}")], 1),
    }

    let mut lines = vec![format!("  ✅ Provider '{name}' reachable")];
    let mut issues = 0;

    let available = match provider.list_models().await {
        Ok(available) if !available.is_empty() => available,
        // Some compatible servers do not list models.
        _ => return (lines, issues),
    };

    for model in models {
        if available.iter().any(|m| m == model) {
            lines.push(format!("  ✅ Model available: {model}"));
        } else {
            lines.push(format!("  ⚠️  Model '{model}' not offered by '{name}'"));
            issues += 1;
        }
    }
    (lines, issues)
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 MedAssist Doctor — Diagnostics");
    println!("=================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — using defaults (run `medassist onboard`)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 blocking issue found.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ❌ No API key — set MEDASSIST_API_KEY or api_key in config.toml");
        issues += 1;
    }

    let mut models = vec![config.default_model.as_str(), config.classifier_model()];
    if config.retrieval.backend == RetrievalBackend::Embedding {
        models.push(config.retrieval.embedding_model.as_str());
    }
    models.dedup();

    let router = medassist_providers::router::build_from_config(&config);
    match router.default() {
        Some(provider) => {
            let (lines, found) = check_provider(provider.as_ref(), &models).await;
            for line in lines {
                println!("{line}");
            }
            issues += found;
        }
        None => {
            println!("  ❌ Default provider '{}' not configured", config.default_provider);
            issues += 1;
        }
    }

    let retrieval = &config.retrieval;
    let source = FileSource::new(&retrieval.data_file, &retrieval.chunk_delimiter);
    if !source.path().exists() {
        println!(
            "  ⚠️  Corpus {} not found — answers will ask for uploads",
            source.path().display()
        );
        issues += 1;
    } else {
        match source.load().await {
            Ok(passages) if passages.is_empty() => {
                println!("  ⚠️  Corpus {} is empty", source.path().display());
                issues += 1;
            }
            Ok(passages) => {
                println!(
                    "  ✅ Corpus {} ({} passages)",
                    source.path().display(),
                    passages.len()
                );
            }
            Err(e) => {
                println!("  ❌ Corpus unreadable: {e}");
                issues += 1;
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

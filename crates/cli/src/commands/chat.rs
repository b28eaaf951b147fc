//! `medassist chat` — Interactive or single-message chat mode.

use std::path::PathBuf;
use std::sync::Arc;
use medassist_agent::{Branch, DialogueContextManager, LlmQueryClassifier, SessionStore};
use medassist_config::{AppConfig, RetrievalBackend};
use medassist_core::dialogue::Retriever;
use medassist_core::event::EventBus;
use medassist_core::provider::Provider;
use medassist_providers::ProviderCompletor;
use medassist_retrieval::{EmbeddingRetriever, FileSource, KeywordRetriever};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Command-line overrides applied on top of the loaded config.
#[derive(Debug, Default)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub embedding_model: Option<String>,
    pub top_k: Option<usize>,
    pub data: Option<PathBuf>,
    pub keyword: bool,
}

impl ChatOptions {
    fn apply(self, config: &mut AppConfig) {
        if let Some(model) = self.model {
            config.default_model = model;
        }
        if let Some(model) = self.embedding_model {
            config.retrieval.embedding_model = model;
        }
        if let Some(k) = self.top_k {
            config.retrieval.top_k = k;
        }
        if let Some(path) = self.data {
            config.retrieval.data_file = path;
        }
        if self.keyword {
            config.retrieval.backend = RetrievalBackend::Keyword;
        }
    }
}

fn build_retriever(config: &AppConfig, provider: Arc<dyn Provider>) -> Arc<dyn Retriever> {
    let retrieval = &config.retrieval;
    let source = Arc::new(FileSource::new(&retrieval.data_file, &retrieval.chunk_delimiter));
    match retrieval.backend {
        RetrievalBackend::Embedding => Arc::new(EmbeddingRetriever::new(
            provider,
            &retrieval.embedding_model,
            source,
            retrieval.top_k,
        )),
        RetrievalBackend::Keyword => Arc::new(KeywordRetriever::new(source, retrieval.top_k)),
    }
}

fn build_manager(
    config: &AppConfig,
    provider: Arc<dyn Provider>,
    event_bus: Arc<EventBus>,
) -> DialogueContextManager {
    let classifier = LlmQueryClassifier::new(
        provider.clone(),
        config.classifier_model(),
        config.classifier.temperature,
    );
    let completor = ProviderCompletor::new(
        provider.clone(),
        &config.default_model,
        config.default_temperature,
    )
    .with_max_tokens(config.default_max_tokens);

    DialogueContextManager::new(
        Arc::new(classifier),
        build_retriever(config, provider),
        Arc::new(completor),
        event_bus,
    )
}

fn branch_label(branch: Branch) -> &'static str {
    match branch {
        Branch::Retrieval => "🔎 fetched new context",
        Branch::FollowUp => "💬 follow-up",
    }
}

pub async fn run(message: Option<String>, options: ChatOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    options.apply(&mut config);
    config.validate()?;

    // Fail early with setup instructions when no key is set
    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    MEDASSIST_API_KEY = 'sk-...'   (generic)");
        eprintln!("    OPENAI_API_KEY    = 'sk-...'   (for OpenAI direct)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let router = medassist_providers::router::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;

    let event_bus = Arc::new(EventBus::default());
    let mut events = event_bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            debug!(?event, "Dialogue event");
        }
    });

    let manager = Arc::new(build_manager(&config, provider, event_bus));
    let sessions = SessionStore::new(manager);
    let conversation = sessions.open().await;

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let outcome = sessions.handle(&conversation, &msg).await;
        eprint!("\r              \r");
        println!("{}", outcome?.response);
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        MedAssist Chat — Interactive Mode       ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.default_model);
    println!("  Corpus:    {}", config.retrieval.data_file.display());
    println!("  Retrieval: {:?} (top {})", config.retrieval.backend, config.retrieval.top_k);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type '/reset' to start over, 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    use std::io::Write;
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let query = line.trim();
        match query {
            "" => {}
            "exit" | "quit" => break,
            "/reset" => {
                sessions.reset(&conversation).await;
                println!("  Conversation cleared.");
                println!();
            }
            _ => {
                eprint!("  ...");
                match sessions.handle(&conversation, query).await {
                    Ok(outcome) => {
                        eprint!("\r     \r");
                        println!();
                        println!("  [{}]", branch_label(outcome.branch));
                        // Print with a visible assistant prefix
                        for line in outcome.response.lines() {
                            println!("  Assistant > {line}");
                        }
                        println!();
                    }
                    Err(e) => {
                        eprint!("\r     \r");
                        eprintln!("  [Error] {e}");
                        println!();
                    }
                }
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Take care! 🩺");
    println!();

    Ok(())
}

//! gen-cards - Turn study documents into flashcard decks using an LLM

mod cache;
mod config;
mod cost;
mod extract;
mod processor;
mod prompt;
mod reader;
mod store;
mod text;
mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use futures_util::{StreamExt, pin_mut};
use indicatif::{ProgressBar, ProgressStyle};
use llm_client::{Config as LlmConfig, ModelPreset, get_provider};

use config::GenCardsConfig;
use processor::{ContentProcessor, ProcessingResult, ProcessorOptions};
use store::CardStore;

#[derive(Parser, Debug)]
#[command(name = "gen-cards")]
#[command(about = "Turn study documents into flashcard decks using an LLM", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the study document (.txt or .md)
    document: Option<PathBuf>,

    /// Model preset to use (overrides default from config)
    #[arg(short, long)]
    model: Option<String>,

    /// Skip card validation
    #[arg(long)]
    no_validate: bool,

    /// Chunk budget in characters (overrides config)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Inspect or clear the stored card deck
    Cards {
        #[command(subcommand)]
        action: CardsAction,
    },
    /// Preview token count and request cost for a document
    Estimate {
        /// Path to the study document
        document: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the default model preset
    SetDefault {
        /// Name of the preset to use as default
        preset: String,
    },
    /// List available presets
    List,
    /// Add a new preset
    AddPreset {
        /// Preset name
        name: String,
        /// Provider (deepseek, openrouter, anthropic)
        #[arg(short, long)]
        provider: String,
        /// Model identifier
        #[arg(short = 'M', long)]
        model: String,
    },
}

#[derive(Subcommand, Debug)]
enum CardsAction {
    /// List stored cards
    List {
        /// Only cards extracted from this source file
        #[arg(long)]
        source: Option<String>,
    },
    /// Delete every stored card
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut log_builder = env_logger::Builder::from_default_env();
    if args.debug {
        log_builder.filter_level(log::LevelFilter::Debug);
    }
    log_builder.init();

    match &args.command {
        Some(Commands::Config { action }) => return handle_config_command(action),
        Some(Commands::Cards { action }) => return handle_cards_command(action),
        Some(Commands::Estimate { document }) => return handle_estimate_command(document),
        None => {}
    }

    let Some(document) = &args.document else {
        bail!("No document given. Pass a .txt/.md file, or see --help for subcommands.");
    };

    process_document(document, &args).await
}

/// Run one document through the pipeline and store the resulting cards.
async fn process_document(document: &PathBuf, args: &Args) -> Result<()> {
    let (content, file_name) = reader::read_document(document)?;

    let app_config = GenCardsConfig::load().context("Failed to load gen-cards configuration")?;
    let llm_config = LlmConfig::load().context("Failed to load LLM configuration")?;

    let preset_name = args
        .model
        .as_deref()
        .unwrap_or(&llm_config.default_preset)
        .to_string();
    let preset = llm_config
        .get_preset(&preset_name)
        .with_context(|| format!("Unknown preset: {}", preset_name))?;
    let provider_config = llm_config.get_provider_config(&preset.provider);
    let provider = get_provider(preset, provider_config).with_context(|| {
        format!(
            "Failed to initialize provider '{}' for preset '{}'",
            preset.provider, preset_name
        )
    })?;

    let tokens = cost::estimate_tokens(&content);
    println!(
        "{}: ~{} tokens (about ${:.4} on {})",
        file_name,
        tokens,
        cost::estimate_cost(tokens, &preset.model),
        preset.model
    );

    let options = ProcessorOptions {
        max_chunk_size: args.chunk_size.unwrap_or(app_config.chunk_size),
        temperature: app_config.temperature,
        max_tokens: app_config.max_tokens,
        requests_per_minute: app_config.requests_per_minute,
    };
    let enable_validation = app_config.validation && !args.no_validate;
    let processor = ContentProcessor::new(Arc::from(provider), options);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );

    let events = processor.process_content(content, file_name.clone(), enable_validation);
    pin_mut!(events);

    let mut outcome = None;
    while let Some(event) = events.next().await {
        match event {
            ProcessingResult::Processing(message) => spinner.set_message(message),
            ProcessingResult::PartialSuccess(message) => spinner.println(format!("  {}", message)),
            terminal => {
                outcome = Some(terminal);
                break;
            }
        }
    }

    match outcome {
        Some(ProcessingResult::Success {
            cards,
            from_cache,
            quality_score,
        }) => {
            spinner.finish_and_clear();
            let stored = CardStore::open_default()?.insert_all(cards)?;
            let cache_note = if from_cache { " (from cache)" } else { "" };
            println!(
                "Generated {} cards from {}{}, quality {:.2}",
                stored.len(),
                file_name,
                cache_note,
                quality_score
            );
            Ok(())
        }
        Some(ProcessingResult::Error(message)) => {
            spinner.finish_and_clear();
            bail!("{}", message);
        }
        _ => {
            spinner.finish_and_clear();
            bail!("Processing ended without a result");
        }
    }
}

/// Handle config subcommands
fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let app_config = GenCardsConfig::load()?;
            let llm_config = LlmConfig::load()?;
            println!("App config ({}):", GenCardsConfig::config_path()?.display());
            println!("  chunk_size: {}", app_config.chunk_size);
            println!("  validation: {}", app_config.validation);
            println!("  temperature: {}", app_config.temperature);
            println!("  max_tokens: {}", app_config.max_tokens);
            println!("  requests_per_minute: {}", app_config.requests_per_minute);
            println!("LLM config ({}):", LlmConfig::config_path()?.display());
            println!("  default preset: {}", llm_config.default_preset);
            Ok(())
        }
        ConfigAction::SetDefault { preset } => {
            let mut llm_config = LlmConfig::load()?;
            // Verify preset exists
            llm_config.get_preset(preset)?;
            llm_config.default_preset = preset.clone();
            llm_config.save()?;
            println!("Default preset set to '{}'", preset);
            Ok(())
        }
        ConfigAction::List => {
            let llm_config = LlmConfig::load()?;
            let mut names: Vec<&String> = llm_config.presets.keys().collect();
            names.sort();
            for name in names {
                let preset = &llm_config.presets[name];
                let marker = if *name == llm_config.default_preset {
                    "*"
                } else {
                    " "
                };
                println!("{} {} ({} / {})", marker, name, preset.provider, preset.model);
            }
            Ok(())
        }
        ConfigAction::AddPreset {
            name,
            provider,
            model,
        } => {
            let mut llm_config = LlmConfig::load()?;
            llm_config.presets.insert(
                name.clone(),
                ModelPreset {
                    provider: provider.clone(),
                    model: model.clone(),
                },
            );
            llm_config.save()?;
            println!("Added preset '{}' ({} / {})", name, provider, model);
            Ok(())
        }
    }
}

/// Handle cards subcommands
fn handle_cards_command(action: &CardsAction) -> Result<()> {
    let store = CardStore::open_default()?;
    match action {
        CardsAction::List { source } => {
            let cards = match source {
                Some(source_file) => store.cards_for_source(source_file)?,
                None => store.all_cards()?,
            };
            if cards.is_empty() {
                println!("No cards stored.");
                return Ok(());
            }
            for card in &cards {
                println!(
                    "#{} [{}] {} - {}",
                    card.id, card.source_file, card.keyword, card.explanation
                );
            }
            println!("{} cards", cards.len());
            Ok(())
        }
        CardsAction::Clear => {
            let count = store.all_cards()?.len();
            store.clear()?;
            println!("Removed {} cards", count);
            Ok(())
        }
    }
}

/// Handle the estimate subcommand
fn handle_estimate_command(document: &PathBuf) -> Result<()> {
    let (content, file_name) = reader::read_document(document)?;
    let llm_config = LlmConfig::load()?;
    let preset = llm_config.get_preset(&llm_config.default_preset)?;

    let tokens = cost::estimate_tokens(&content);
    println!("{}", file_name);
    println!("  characters: {}", content.chars().count());
    println!("  estimated tokens: {}", tokens);
    println!(
        "  estimated cost on {}: ${:.4}",
        preset.model,
        cost::estimate_cost(tokens, &preset.model)
    );
    Ok(())
}

//! Command-line front end for the suggestion engine.
//!
//! Loads a base dictionary (from `--assets` or the built-in English list),
//! opens the learned dictionary file, and runs one request:
//!
//! ```text
//! tiersuggest suggest hel --max 5
//! tiersuggest check helllo
//! tiersuggest accept rustacean
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tiersuggest::{
    AssetReader, Config, InMemoryAssetReader, JsonAssetReader, JsonFileLearnedStore, LearnedStore,
    MemoryLearnedStore, SpellingVerdict, SuggestionEngine,
};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "tiersuggest")]
#[command(about = "Tiered word suggestions and spell checking")]
#[command(version)]
struct Args {
    /// Locale of the dictionary to use (defaults to the configured locale)
    #[arg(short, long, global = true)]
    locale: Option<String>,

    /// Directory containing <locale>.json base dictionaries
    #[arg(short, long, global = true)]
    assets: Option<PathBuf>,

    /// Learned dictionary file
    #[arg(long, global = true)]
    learned: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank completions for a partially typed word
    Suggest {
        text: String,
        #[arg(short, long)]
        max: Option<usize>,
        /// Words typed before the current one
        #[arg(long, num_args = 1..)]
        context: Vec<String>,
    },
    /// Spell-check a completed word
    Check {
        word: String,
        #[arg(short, long)]
        max: Option<usize>,
    },
    /// Record that a suggestion was accepted
    Accept { word: String },
}

fn open_learned_store(path: PathBuf) -> Arc<dyn LearnedStore> {
    match JsonFileLearnedStore::open(&path) {
        Ok(store) => {
            tracing::debug!(path = %store.path().display(), "learned dictionary opened");
            Arc::new(store)
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "learned dictionary unavailable, not persisting");
            Arc::new(MemoryLearnedStore::new())
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load()?;
    if let Some(assets) = args.assets {
        config.asset_dir = Some(assets);
    }
    if let Some(learned) = args.learned {
        config.learned_store_path = Some(learned);
    }
    let locale = args.locale.unwrap_or_else(|| config.default_locale.clone());

    let assets: Arc<dyn AssetReader> = match &config.asset_dir {
        Some(dir) => Arc::new(JsonAssetReader::new(dir)),
        None => Arc::new(InMemoryAssetReader::fallback()),
    };
    let learned = open_learned_store(config.learned_store_path());

    let mut engine = SuggestionEngine::new(&config, assets, learned, Arc::new(tiersuggest::NoopRefreshSink));
    engine.preload(&locale)?;
    engine.set_locale(&locale);

    match args.command {
        Command::Suggest { text, max, context } => {
            let context: Vec<&str> = context.iter().map(String::as_str).collect();
            let max = max.unwrap_or(config.max_candidates);
            for candidate in engine.suggest(&text, &context, max, false, false) {
                println!(
                    "{:<20} {:.3} {:?}{}",
                    candidate.text,
                    candidate.confidence,
                    candidate.tier,
                    if candidate.auto_commit_eligible { " (auto)" } else { "" }
                );
            }
        }
        Command::Check { word, max } => {
            let max = max.unwrap_or(config.max_suggestions);
            match engine.check(&word, &[], &[], max, false, false) {
                SpellingVerdict::Valid => println!("'{}' is valid", word),
                SpellingVerdict::Typo(suggestions) => {
                    println!("'{}' looks misspelled: {}", word, suggestions.join(", "))
                }
            }
        }
        Command::Accept { word } => {
            engine.on_accepted(&word, &locale);
            println!("Accepted '{}'", word);
        }
    }

    engine.shutdown();
    Ok(())
}

//! # Ability Evaluator
//!
//! Loads a JSON rule document and checks one action against a class or an
//! instance of it.
//!
//! ## Usage
//!
//! ```text
//! ability-eval rules.json update Article --attributes '{"owner_id": 1}'
//! ability-eval rules.json read all --permissions
//! ```
//!
//! ## Configuration
//!
//! Environment variables:
//! - `ABILITY_DEFAULT_ALIASES` - Seed the default aliases (default: true)
//! - `ABILITY_CACHE_EXPANSIONS` - Memoize alias expansion (default: true)
//! - `ABILITY_DEFAULT_MESSAGE` - Fallback unauthorized message
//! - `RUST_LOG` - Log level (default: info)

use anyhow::{bail, Context};
use clap::Parser;
use cretoai_ability::{Ability, AbilityConfig, RuleDocument, Subject};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "ability-eval", version, about = "Evaluate a rule document against one check")]
struct Cli {
    /// JSON rule document
    rules: PathBuf,

    /// Action to check
    action: String,

    /// Class name, or `all`
    class: String,

    /// Instance attributes as a JSON object; checks an instance instead of the class
    #[arg(long)]
    attributes: Option<String>,

    /// Also print granted and denied subjects per action
    #[arg(long)]
    permissions: bool,

    #[arg(long, env = "ABILITY_DEFAULT_ALIASES", default_value_t = true, action = clap::ArgAction::Set)]
    default_aliases: bool,

    #[arg(long, env = "ABILITY_CACHE_EXPANSIONS", default_value_t = true, action = clap::ArgAction::Set)]
    cache_expansions: bool,

    #[arg(long, env = "ABILITY_DEFAULT_MESSAGE")]
    default_message: Option<String>,
}

impl Cli {
    fn config(&self) -> AbilityConfig {
        let mut config = AbilityConfig {
            default_aliases: self.default_aliases,
            cache_expansions: self.cache_expansions,
            ..AbilityConfig::default()
        };
        if let Some(message) = &self.default_message {
            config.default_message = message.clone();
        }
        config
    }

    fn attributes(&self) -> anyhow::Result<Option<Map<String, Value>>> {
        let Some(raw) = &self.attributes else {
            return Ok(None);
        };
        match serde_json::from_str::<Value>(raw).context("parsing --attributes")? {
            Value::Object(fields) => Ok(Some(fields)),
            other => bail!("--attributes must be a JSON object, got {}", other),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!("Starting ability-eval v{}", cretoai_ability::VERSION);

    let document = RuleDocument::from_path(&cli.rules)
        .with_context(|| format!("loading {}", cli.rules.display()))?;

    let mut ability = Ability::with_config(cli.config());
    let registry = document.apply(&mut ability)?;

    let subject = if cli.class == cretoai_ability::ALL {
        Subject::All
    } else {
        let class = registry.class_or_root(&cli.class);
        match cli.attributes()? {
            Some(fields) => Subject::from(class.instance().with_attributes(fields)),
            None => Subject::from(class),
        }
    };

    let decision = ability.check(cli.action.as_str(), &subject)?;
    println!("{}", serde_json::to_string_pretty(&decision)?);

    if cli.permissions {
        println!("{}", serde_json::to_string_pretty(&ability.permissions())?);
    }

    Ok(())
}

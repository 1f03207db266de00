//! Phrase Bank Preview CLI
//!
//! Renders one phrase bank entry the way the engine would speak it, for
//! authoring and checking phrase banks.
//!
//! Usage:
//!   cargo run --features cli --bin voice-reply-render -- \
//!     --intent Add \
//!     --locale en-US \
//!     --slot a=5 \
//!     --slot b=3 \
//!     --slot result=8:number \
//!     --reprompt
//!
//! The phrase source comes from `VOICE_REPLY_CONFIG` and the other
//! `VOICE_REPLY_*` variables (see `EngineConfig::from_env`); `--phrases-dir`
//! overrides it.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;

use voice_reply::config::PhraseSourceConfig;
use voice_reply::telemetry::init_tracing;
use voice_reply::{EngineConfig, OutputDescriptor, OutputFormat, OutputSlot};

/// Render a phrase bank entry as SSML
#[derive(Parser, Debug)]
#[command(name = "voice-reply-render")]
#[command(about = "Render a phrase bank entry as SSML")]
struct Args {
    /// Response intent to render (e.g., "SayWelcome")
    #[arg(long, short = 'i')]
    intent: String,

    /// Locale of the phrase bank (default: configured default locale)
    #[arg(long, short = 'l')]
    locale: Option<String>,

    /// Slot values as name=value or name=value:format (can be specified multiple times)
    #[arg(long, short = 's', value_parser = parse_slot)]
    slot: Vec<OutputSlot>,

    /// Also render a reprompt
    #[arg(long, short = 'r')]
    reprompt: bool,

    /// Directory holding <locale>/utterances.yml files
    #[arg(long, short = 'd', env = "VOICE_REPLY_PHRASES_DIR")]
    phrases_dir: Option<PathBuf>,

    /// Seed for phrase selection
    #[arg(long)]
    seed: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Parse name=value[:format] from the command line
fn parse_slot(s: &str) -> Result<OutputSlot, String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("Invalid name=value pair: {}", s))?;
    let name = &s[..pos];
    let rest = &s[pos + 1..];

    // Only treat the suffix as a format if it names one, so "12:30" stays a value
    if let Some((value, format)) = rest.rsplit_once(':') {
        if let Ok(format) = format.parse::<OutputFormat>() {
            return Ok(OutputSlot::new(name, value).format_as(format));
        }
    }
    Ok(OutputSlot::new(name, rest))
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing(Level::WARN);

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = EngineConfig::from_env()?;
    if let Some(root) = args.phrases_dir {
        if let PhraseSourceConfig::File {
            root: configured, ..
        } = &mut config.phrases
        {
            *configured = root;
        } else {
            config.phrases = PhraseSourceConfig::File {
                root,
                leading_path: "/".to_string(),
                resource_location: "/utterances.yml".to_string(),
            };
        }
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let assembler = config.build_assembler()?;
    let locale = args
        .locale
        .unwrap_or_else(|| assembler.default_locale().to_string());

    let output = args
        .slot
        .into_iter()
        .fold(OutputDescriptor::ask(&args.intent), |b, slot| {
            b.put_output_slot(slot)
        })
        .with_reprompt(args.reprompt)
        .with_locale(locale.clone())
        .build()?;

    let response = assembler
        .assemble(&output, Some(&locale))
        .await
        .with_context(|| format!("Failed to render '{}' ({})", args.intent, locale))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.speech);
        if let Some(reprompt) = response.reprompt {
            println!("{}", reprompt);
        }
    }
    Ok(())
}

//! Engine configuration
//!
//! Read from a YAML file, then overridden from the environment:
//!
//! ```yaml
//! default_locale: en-US
//! max_reference_depth: 16
//! seed: 42
//! phrases:
//!   kind: file
//!   root: ./phrases
//!   leading_path: /calculator
//!   resource_location: /utterances.yml
//! ```
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `VOICE_REPLY_CONFIG` | path of the YAML file |
//! | `VOICE_REPLY_LOCALE` | `default_locale` |
//! | `VOICE_REPLY_PHRASES_DIR` | file source root |
//! | `VOICE_REPLY_PHRASES_URL` | HTTP source base URL, wins over the directory |
//! | `VOICE_REPLY_MAX_DEPTH` | `max_reference_depth` |
//! | `VOICE_REPLY_SEED` | `seed` |

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assembler::{ResponseAssembler, DEFAULT_LOCALE};
use crate::error::ConfigurationError;
use crate::phrases::{
    validate_locale, FilePhraseSource, HttpPhraseSource, PhraseSource, ResourceLocation,
};
use crate::templates::{PhrasePicker, RandomPicker, DEFAULT_MAX_REFERENCE_DEPTH};

pub const CONFIG_VAR: &str = "VOICE_REPLY_CONFIG";
pub const LOCALE_VAR: &str = "VOICE_REPLY_LOCALE";
pub const PHRASES_DIR_VAR: &str = "VOICE_REPLY_PHRASES_DIR";
pub const PHRASES_URL_VAR: &str = "VOICE_REPLY_PHRASES_URL";
pub const MAX_DEPTH_VAR: &str = "VOICE_REPLY_MAX_DEPTH";
pub const SEED_VAR: &str = "VOICE_REPLY_SEED";

fn default_leading_path() -> String {
    ResourceLocation::DEFAULT_LEADING_PATH.to_string()
}

fn default_resource_location() -> String {
    ResourceLocation::DEFAULT_RESOURCE_LOCATION.to_string()
}

/// Where phrase banks come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhraseSourceConfig {
    File {
        root: PathBuf,
        #[serde(default = "default_leading_path")]
        leading_path: String,
        #[serde(default = "default_resource_location")]
        resource_location: String,
    },
    Http {
        base_url: String,
        #[serde(default = "default_leading_path")]
        leading_path: String,
        #[serde(default = "default_resource_location")]
        resource_location: String,
    },
}

impl PhraseSourceConfig {
    pub fn location(&self) -> Result<ResourceLocation, ConfigurationError> {
        match self {
            PhraseSourceConfig::File {
                leading_path,
                resource_location,
                ..
            }
            | PhraseSourceConfig::Http {
                leading_path,
                resource_location,
                ..
            } => ResourceLocation::new(leading_path, resource_location),
        }
    }

    fn paths(&self) -> (String, String) {
        match self {
            PhraseSourceConfig::File {
                leading_path,
                resource_location,
                ..
            }
            | PhraseSourceConfig::Http {
                leading_path,
                resource_location,
                ..
            } => (leading_path.clone(), resource_location.clone()),
        }
    }
}

impl Default for PhraseSourceConfig {
    fn default() -> Self {
        PhraseSourceConfig::File {
            root: PathBuf::from("phrases"),
            leading_path: default_leading_path(),
            resource_location: default_resource_location(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_locale: String,
    pub phrases: PhraseSourceConfig,
    pub max_reference_depth: usize,
    /// Fixed seed for phrase selection; entropy when unset
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_locale: DEFAULT_LOCALE.to_string(),
            phrases: PhraseSourceConfig::default(),
            max_reference_depth: DEFAULT_MAX_REFERENCE_DEPTH,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_yaml::from_str(yaml).context("Failed to parse engine configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading engine configuration from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: EngineConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// `.env`, then `VOICE_REPLY_CONFIG`, then the individual overrides
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an explicit variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_VAR) {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };

        if let Some(locale) = lookup(LOCALE_VAR) {
            config.default_locale = locale;
        }

        let (leading_path, resource_location) = config.phrases.paths();
        if let Some(root) = lookup(PHRASES_DIR_VAR) {
            config.phrases = PhraseSourceConfig::File {
                root: PathBuf::from(root),
                leading_path: leading_path.clone(),
                resource_location: resource_location.clone(),
            };
        }
        if let Some(base_url) = lookup(PHRASES_URL_VAR) {
            config.phrases = PhraseSourceConfig::Http {
                base_url,
                leading_path,
                resource_location,
            };
        }

        if let Some(depth) = lookup(MAX_DEPTH_VAR) {
            config.max_reference_depth = depth
                .trim()
                .parse()
                .with_context(|| format!("{} is not a number: {}", MAX_DEPTH_VAR, depth))?;
        }
        if let Some(seed) = lookup(SEED_VAR) {
            config.seed = Some(
                seed.trim()
                    .parse()
                    .with_context(|| format!("{} is not a number: {}", SEED_VAR, seed))?,
            );
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_locale(&self.default_locale)?;
        if self.max_reference_depth == 0 {
            return Err(ConfigurationError::Invalid(
                "max_reference_depth must be at least 1".to_string(),
            ));
        }
        if let PhraseSourceConfig::Http { base_url, .. } = &self.phrases {
            if base_url.trim().is_empty() {
                return Err(ConfigurationError::Invalid(
                    "phrases.base_url must not be blank".to_string(),
                ));
            }
        }
        self.phrases.location()?;
        Ok(())
    }

    pub fn build_source(&self) -> Result<Arc<dyn PhraseSource>, ConfigurationError> {
        let location = self.phrases.location()?;
        let source: Arc<dyn PhraseSource> = match &self.phrases {
            PhraseSourceConfig::File { root, .. } => {
                Arc::new(FilePhraseSource::with_location(root.clone(), location))
            }
            PhraseSourceConfig::Http { base_url, .. } => Arc::new(HttpPhraseSource::with_client(
                reqwest::Client::new(),
                base_url.clone(),
                location,
            )),
        };
        Ok(source)
    }

    pub fn build_picker(&self) -> Arc<dyn PhrasePicker> {
        match self.seed {
            Some(seed) => Arc::new(RandomPicker::seeded(seed)),
            None => Arc::new(RandomPicker::from_entropy()),
        }
    }

    pub fn build_assembler(&self) -> Result<ResponseAssembler, ConfigurationError> {
        self.validate()?;
        Ok(ResponseAssembler::new(self.build_source()?)
            .with_picker(self.build_picker())
            .with_default_locale(self.default_locale.clone())
            .with_max_depth(self.max_reference_depth))
    }
}

//! Phrase sources
//!
//! A phrase source reads the raw phrase bank document for a locale. The
//! resource path is `leading path + locale + resource location`, e.g.
//! `/skills/calc/en-US/utterances.yml`, where only the locale varies per
//! request.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::error::{ConfigurationError, PhraseBankError};

fn locale_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").unwrap())
}

/// Accept only language tags (`en-US`, `de-DE`, `es-419`); the locale ends up
/// as a path segment of the phrase bank resource
pub fn validate_locale(locale: &str) -> Result<(), ConfigurationError> {
    if locale.trim().is_empty() {
        return Err(ConfigurationError::BlankLocale);
    }
    if !locale_pattern().is_match(locale) {
        return Err(ConfigurationError::InvalidLocale(locale.to_string()));
    }
    Ok(())
}

fn checked_locale(locale: &str) -> Result<&str, PhraseBankError> {
    validate_locale(locale).map_err(|e| {
        warn!("{}", e);
        PhraseBankError::InvalidLocale(locale.to_string())
    })?;
    Ok(locale)
}

/// Reads phrase bank documents
#[async_trait]
pub trait PhraseSource: Send + Sync {
    /// Stable identity of this source; phrase banks are cached per identity
    fn describe(&self) -> String;

    /// Path of the document for a locale
    fn resource_path(&self, locale: &str) -> String;

    /// Raw document bytes; `PhraseBankError::NotFound` if absent
    async fn read(&self, locale: &str) -> Result<Vec<u8>, PhraseBankError>;
}

/// Leading path and trailing resource name around the locale segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    leading_path: String,
    resource_location: String,
}

impl ResourceLocation {
    pub const DEFAULT_LEADING_PATH: &'static str = "/";
    pub const DEFAULT_RESOURCE_LOCATION: &'static str = "/utterances.yml";
    pub const EXTENSION: &'static str = ".yml";

    /// Leading path gets surrounding slashes; the resource location must end in `.yml`
    pub fn new(leading_path: &str, resource_location: &str) -> Result<Self, ConfigurationError> {
        let leading = leading_path.trim();
        if leading.is_empty() {
            return Err(ConfigurationError::Invalid(
                "leading path must not be blank, use \"/\" for none".to_string(),
            ));
        }

        let location = resource_location.trim();
        if location.replace('/', "").is_empty() || !location.ends_with(Self::EXTENSION) {
            return Err(ConfigurationError::InvalidResourceLocation(
                resource_location.to_string(),
            ));
        }

        let mut normalized = String::with_capacity(leading.len() + 2);
        if !leading.starts_with('/') {
            normalized.push('/');
        }
        normalized.push_str(leading);
        if !leading.ends_with('/') {
            normalized.push('/');
        }

        let location = if location.starts_with('/') {
            location.to_string()
        } else {
            format!("/{}", location)
        };

        Ok(Self {
            leading_path: normalized,
            resource_location: location,
        })
    }

    pub fn leading_path(&self) -> &str {
        &self.leading_path
    }

    pub fn resource_location(&self) -> &str {
        &self.resource_location
    }

    pub fn path_for(&self, locale: &str) -> String {
        format!("{}{}{}", self.leading_path, locale, self.resource_location)
    }
}

impl Default for ResourceLocation {
    fn default() -> Self {
        Self {
            leading_path: Self::DEFAULT_LEADING_PATH.to_string(),
            resource_location: Self::DEFAULT_RESOURCE_LOCATION.to_string(),
        }
    }
}

/// Phrase banks bundled as files below a root directory
#[derive(Debug, Clone)]
pub struct FilePhraseSource {
    root: PathBuf,
    location: ResourceLocation,
}

impl FilePhraseSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_location(root, ResourceLocation::default())
    }

    pub fn with_location(root: impl Into<PathBuf>, location: ResourceLocation) -> Self {
        Self {
            root: root.into(),
            location,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_path(&self, locale: &str) -> PathBuf {
        self.root
            .join(self.location.path_for(locale).trim_start_matches('/'))
    }
}

#[async_trait]
impl PhraseSource for FilePhraseSource {
    fn describe(&self) -> String {
        format!(
            "file:{}{}",
            self.root.display(),
            self.location.path_for("{locale}")
        )
    }

    fn resource_path(&self, locale: &str) -> String {
        self.file_path(locale).display().to_string()
    }

    async fn read(&self, locale: &str) -> Result<Vec<u8>, PhraseBankError> {
        let path = self.file_path(checked_locale(locale)?);
        debug!("Reading phrase bank from {}", path.display());

        tokio::fs::read(&path).await.map_err(|e| {
            let path = path.display().to_string();
            if e.kind() == std::io::ErrorKind::NotFound {
                PhraseBankError::NotFound { path }
            } else {
                PhraseBankError::Io { path, source: e }
            }
        })
    }
}

/// Phrase banks served from an object store or any plain HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpPhraseSource {
    client: Client,
    base_url: String,
    location: ResourceLocation,
}

impl HttpPhraseSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, ResourceLocation::default())
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        location: ResourceLocation,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            location,
        }
    }

    pub fn url_for(&self, locale: &str) -> String {
        format!("{}{}", self.base_url, self.location.path_for(locale))
    }
}

#[async_trait]
impl PhraseSource for HttpPhraseSource {
    fn describe(&self) -> String {
        self.url_for("{locale}")
    }

    fn resource_path(&self, locale: &str) -> String {
        self.url_for(locale)
    }

    async fn read(&self, locale: &str) -> Result<Vec<u8>, PhraseBankError> {
        let url = self.url_for(checked_locale(locale)?);
        debug!("Fetching phrase bank from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| PhraseBankError::Http {
                url: url.clone(),
                source,
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PhraseBankError::NotFound { path: url });
        }

        let response = response
            .error_for_status()
            .map_err(|source| PhraseBankError::Http {
                url: url.clone(),
                source,
            })?;

        let bytes = response
            .bytes()
            .await
            .map_err(|source| PhraseBankError::Http { url, source })?;
        Ok(bytes.to_vec())
    }
}

/// In-memory phrase banks, one YAML document per locale
#[derive(Debug, Clone, Default)]
pub struct StaticPhraseSource {
    name: String,
    documents: HashMap<String, String>,
}

impl StaticPhraseSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: HashMap::new(),
        }
    }

    pub fn with_document(mut self, locale: impl Into<String>, yaml: impl Into<String>) -> Self {
        self.documents.insert(locale.into(), yaml.into());
        self
    }

    pub fn locales(&self) -> Vec<&str> {
        self.documents.keys().map(|s| s.as_str()).collect()
    }
}

#[async_trait]
impl PhraseSource for StaticPhraseSource {
    fn describe(&self) -> String {
        format!("static:{}", self.name)
    }

    fn resource_path(&self, locale: &str) -> String {
        format!("static:{}/{}", self.name, locale)
    }

    async fn read(&self, locale: &str) -> Result<Vec<u8>, PhraseBankError> {
        self.documents
            .get(locale)
            .map(|doc| doc.as_bytes().to_vec())
            .ok_or_else(|| PhraseBankError::NotFound {
                path: self.resource_path(locale),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_normalizes_slashes() {
        let loc = ResourceLocation::new("my/leading/path", "my/trailing/utterances.yml").unwrap();
        assert_eq!(loc.leading_path(), "/my/leading/path/");
        assert_eq!(loc.resource_location(), "/my/trailing/utterances.yml");
        assert_eq!(
            loc.path_for("en-US"),
            "/my/leading/path/en-US/my/trailing/utterances.yml"
        );
    }

    #[test]
    fn test_default_location() {
        let loc = ResourceLocation::default();
        assert_eq!(loc.path_for("de-DE"), "/de-DE/utterances.yml");
        assert_eq!(
            ResourceLocation::new("/", "/utterances.yml").unwrap(),
            loc
        );
    }

    #[test]
    fn test_location_rejects_bad_resource_names() {
        assert!(ResourceLocation::new("/", "utterances.yaml").is_err());
        assert!(ResourceLocation::new("/", "/").is_err());
        assert!(ResourceLocation::new("/", "").is_err());
        assert!(ResourceLocation::new("", "/utterances.yml").is_err());
    }

    #[tokio::test]
    async fn test_file_source_reads_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let locale_dir = dir.path().join("en-US");
        std::fs::create_dir_all(&locale_dir).unwrap();
        std::fs::write(locale_dir.join("utterances.yml"), "SayHello: [\"Hi\"]\n").unwrap();

        let source = FilePhraseSource::new(dir.path());
        let bytes = source.read("en-US").await.unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "SayHello: [\"Hi\"]\n");

        let err = source.read("fr-FR").await.unwrap_err();
        assert!(matches!(err, PhraseBankError::NotFound { .. }));
    }

    #[test]
    fn test_locale_must_be_language_tag() {
        for locale in ["en-US", "de-DE", "es-419", "fr", "zh-Hant-TW"] {
            assert!(validate_locale(locale).is_ok(), "{}", locale);
        }
        assert_eq!(validate_locale("  "), Err(ConfigurationError::BlankLocale));
        for locale in ["../secret", "en-US/../../x", "en_US", "en-US?x=1", "e", "/etc"] {
            assert_eq!(
                validate_locale(locale),
                Err(ConfigurationError::InvalidLocale(locale.to_string()))
            );
        }
    }

    #[tokio::test]
    async fn test_file_source_stays_below_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir_all(&root).unwrap();
        let outside = dir.path().join("secret");
        std::fs::create_dir_all(&outside).unwrap();
        std::fs::write(outside.join("utterances.yml"), "SayHi: [\"outside\"]\n").unwrap();

        let source = FilePhraseSource::new(&root);
        let err = source.read("../secret").await.unwrap_err();
        assert!(matches!(err, PhraseBankError::InvalidLocale(ref l) if l == "../secret"));
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticPhraseSource::new("greetings").with_document("en-US", "A: [\"x\"]");
        assert_eq!(source.read("en-US").await.unwrap(), b"A: [\"x\"]".to_vec());
        assert!(matches!(
            source.read("en-GB").await,
            Err(PhraseBankError::NotFound { .. })
        ));
        assert_eq!(source.describe(), "static:greetings");
    }

    #[test]
    fn test_http_url_building() {
        let source = HttpPhraseSource::with_client(
            Client::new(),
            "https://bucket.example.com/",
            ResourceLocation::new("skills/calc", "utterances.yml").unwrap(),
        );
        assert_eq!(
            source.url_for("en-US"),
            "https://bucket.example.com/skills/calc/en-US/utterances.yml"
        );
    }
}

//! Configuration loading, validation, and management for persona.
//!
//! Loads configuration from `~/.persona/config.toml` (or the file named by
//! `PERSONA_CONFIG`) with environment variable overrides. Validates all
//! settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.persona/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Google Generative Language API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model selection
    #[serde(default)]
    pub model: ModelConfig,

    /// Whose portfolio the assistant speaks for
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Similarity retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Vector store selection
    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    /// MongoDB Atlas connection
    #[serde(default)]
    pub mongo: MongoConfig,

    /// Session transcript storage
    #[serde(default)]
    pub session: SessionConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("persona", &self.persona)
            .field("retrieval", &self.retrieval)
            .field("vector_store", &self.vector_store)
            .field("mongo", &self.mongo)
            .field("session", &self.session)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model used for classification and answer generation
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used for query embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Override the Generative Language API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Sampling temperature; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

fn default_chat_model() -> String {
    "gemini-1.5-flash".into()
}
fn default_embedding_model() -> String {
    "models/embedding-001".into()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            api_url: None,
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Name of the person the assistant answers questions about
    #[serde(default = "default_owner_name")]
    pub owner_name: String,
}

fn default_owner_name() -> String {
    "Naisarg".into()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            owner_name: default_owner_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Documents fetched per context-specific question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Candidate pool considered by the approximate vector search
    #[serde(default = "default_num_candidates")]
    pub num_candidates: u32,
}

fn default_top_k() -> usize {
    3
}
fn default_num_candidates() -> u32 {
    49
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            num_candidates: default_num_candidates(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// "mongodb" or "memory"
    #[serde(default = "default_vector_backend")]
    pub backend: String,

    /// JSON-lines seed file for the in-memory store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_path: Option<String>,
}

fn default_vector_backend() -> String {
    "mongodb".into()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_vector_backend(),
            seed_path: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    /// Full connection string; takes precedence over the individual parts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default = "default_cluster_host")]
    pub cluster_host: String,

    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_field: Option<String>,
}

fn default_cluster_host() -> String {
    "cluster0.5hufumz.mongodb.net".into()
}
fn default_app_name() -> String {
    "Cluster0".into()
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: None,
            username: None,
            password: None,
            cluster_host: default_cluster_host(),
            app_name: default_app_name(),
            db_name: None,
            collection: None,
            index_name: None,
            embedding_field: None,
        }
    }
}

impl std::fmt::Debug for MongoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoConfig")
            .field("uri", &redact(&self.uri))
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("cluster_host", &self.cluster_host)
            .field("app_name", &self.app_name)
            .field("db_name", &self.db_name)
            .field("collection", &self.collection)
            .field("index_name", &self.index_name)
            .field("embedding_field", &self.embedding_field)
            .finish()
    }
}

impl MongoConfig {
    /// Vector index name, `vector_index` when unset.
    pub fn index_name(&self) -> &str {
        self.index_name.as_deref().unwrap_or("vector_index")
    }

    /// Embedding field path, `embedding` when unset.
    pub fn embedding_field(&self) -> &str {
        self.embedding_field.as_deref().unwrap_or("embedding")
    }

    /// Build the `mongodb+srv://` connection string.
    ///
    /// Credentials are percent-encoded. An explicit `uri` wins.
    pub fn connection_uri(&self) -> Result<String, ConfigError> {
        if let Some(uri) = &self.uri {
            return Ok(uri.clone());
        }
        let username = require(&self.username, "mongo.username (MONGO_USERNAME)")?;
        let password = require(&self.password, "mongo.password (MONGO_PASSWORD)")?;
        let db_name = require(&self.db_name, "mongo.db_name (MONGO_DB_NAME)")?;
        Ok(format!(
            "mongodb+srv://{}:{}@{}/{}?retryWrites=true&w=majority&appName={}",
            urlencoding::encode(username),
            urlencoding::encode(password),
            self.cluster_host,
            db_name,
            self.app_name,
        ))
    }
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::Missing(name.to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// "memory", "file" or "sqlite"
    #[serde(default = "default_session_backend")]
    pub backend: String,

    /// Directory (file backend) or database path (sqlite backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Words of prior conversation handed to the model
    #[serde(default = "default_max_context_words")]
    pub max_context_words: usize,

    /// Cookie carrying the session token
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Mark the cookie `Secure`
    #[serde(default)]
    pub secure_cookie: bool,
}

fn default_session_backend() -> String {
    "memory".into()
}
fn default_max_context_words() -> usize {
    1000
}
fn default_cookie_name() -> String {
    "session".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: default_session_backend(),
            path: None,
            max_context_words: default_max_context_words(),
            cookie_name: default_cookie_name(),
            secure_cookie: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// "development" or "production"
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Frontend origin allowed in development
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub development_url: Option<String>,

    /// Frontend origin allowed in production
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_url: Option<String>,

    /// Emit HTTP trace spans
    #[serde(default = "default_true")]
    pub trace_requests: bool,
}

fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_environment() -> String {
    "development".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            environment: default_environment(),
            development_url: None,
            production_url: None,
            trace_requests: true,
        }
    }
}

impl GatewayConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// The public URL for the current environment.
    pub fn base_url(&self) -> Option<&str> {
        if self.is_production() {
            self.production_url.as_deref()
        } else {
            self.development_url.as_deref()
        }
    }

    /// Origins allowed by CORS: both configured frontend URLs.
    pub fn allowed_origins(&self) -> Vec<String> {
        [&self.development_url, &self.production_url]
            .into_iter()
            .flatten()
            .filter(|url| !url.is_empty())
            .map(|url| url.trim_end_matches('/').to_string())
            .collect()
    }
}

impl AppConfig {
    /// Load configuration from the default path, then apply environment overrides.
    ///
    /// Recognised variables: `GOOGLE_API_KEY`, `PERSONA_MODEL`, `MONGO_URI`,
    /// `MONGO_USERNAME`, `MONGO_PASSWORD`, `MONGO_CLUSTER_HOST`, `MONGO_DB_NAME`,
    /// `MONGO_CL_NAME`, `MONGO_INDEX_NAME`, `MONGO_EMBEDDING_FIELD_NAME`,
    /// `DEVELOPMENT_URL`, `PRODUCTION_URL`, `APP_ENV`, `PORT`.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("PERSONA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("config.toml"));
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup. Set variables win over the file.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(key) = var("GOOGLE_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(model) = var("PERSONA_MODEL") {
            self.model.chat_model = model;
        }

        let mongo = &mut self.mongo;
        for (key, slot) in [
            ("MONGO_URI", &mut mongo.uri),
            ("MONGO_USERNAME", &mut mongo.username),
            ("MONGO_PASSWORD", &mut mongo.password),
            ("MONGO_DB_NAME", &mut mongo.db_name),
            ("MONGO_CL_NAME", &mut mongo.collection),
            ("MONGO_INDEX_NAME", &mut mongo.index_name),
            ("MONGO_EMBEDDING_FIELD_NAME", &mut mongo.embedding_field),
        ] {
            if let Some(value) = var(key) {
                *slot = Some(value);
            }
        }
        if let Some(host) = var("MONGO_CLUSTER_HOST") {
            mongo.cluster_host = host;
        }

        if let Some(url) = var("DEVELOPMENT_URL") {
            self.gateway.development_url = Some(url);
        }
        if let Some(url) = var("PRODUCTION_URL") {
            self.gateway.production_url = Some(url);
        }
        if let Some(env) = var("APP_ENV") {
            self.gateway.environment = env;
        }
        if let Some(port) = var("PORT") {
            self.gateway.port = port
                .parse()
                .map_err(|_| ConfigError::ValidationError(format!("PORT is not a port: {port}")))?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".persona")
    }

    /// Default location for file/sqlite session storage.
    pub fn sessions_dir() -> PathBuf {
        Self::config_dir().join("sessions")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(t) = self.model.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(
                    "model.temperature must be between 0.0 and 2.0".into(),
                ));
            }
        }

        if self.session.max_context_words == 0 {
            return Err(ConfigError::ValidationError(
                "session.max_context_words must be > 0".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be > 0".into(),
            ));
        }

        if (self.retrieval.num_candidates as usize) < self.retrieval.top_k {
            return Err(ConfigError::ValidationError(
                "retrieval.num_candidates must be >= retrieval.top_k".into(),
            ));
        }

        if !matches!(self.session.backend.as_str(), "memory" | "file" | "sqlite") {
            return Err(ConfigError::ValidationError(format!(
                "unknown session.backend '{}' (expected memory, file or sqlite)",
                self.session.backend
            )));
        }

        if !matches!(self.vector_store.backend.as_str(), "mongodb" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "unknown vector_store.backend '{}' (expected mongodb or memory)",
                self.vector_store.backend
            )));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: ModelConfig::default(),
            persona: PersonaConfig::default(),
            retrieval: RetrievalConfig::default(),
            vector_store: VectorStoreConfig::default(),
            mongo: MongoConfig::default(),
            session: SessionConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required setting: {0}")]
    Missing(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model.chat_model, "gemini-1.5-flash");
        assert_eq!(config.session.max_context_words, 1000);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.num_candidates, 49);
        assert_eq!(config.gateway.port, 5000);
    }

    #[test]
    fn mongo_index_and_field_fall_back() {
        let mut config = AppConfig::default();
        assert_eq!(config.mongo.index_name(), "vector_index");
        assert_eq!(config.mongo.embedding_field(), "embedding");

        config
            .apply_env(env(&[("MONGO_INDEX_NAME", "profile_idx"), ("MONGO_EMBEDDING_FIELD_NAME", "vec")]))
            .unwrap();
        assert_eq!(config.mongo.index_name(), "profile_idx");
        assert_eq!(config.mongo.embedding_field(), "vec");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model.chat_model, config.model.chat_model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("GOOGLE_API_KEY", "g-key"),
                ("MONGO_CL_NAME", "profiles"),
                ("MONGO_INDEX_NAME", "vector_index"),
                ("MONGO_EMBEDDING_FIELD_NAME", "embedding"),
                ("PORT", "8080"),
                ("APP_ENV", "production"),
                ("PRODUCTION_URL", "https://example.dev"),
            ]))
            .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.mongo.collection.as_deref(), Some("profiles"));
        assert_eq!(config.mongo.index_name.as_deref(), Some("vector_index"));
        assert_eq!(config.mongo.embedding_field.as_deref(), Some("embedding"));
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.gateway.base_url(), Some("https://example.dev"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("GOOGLE_API_KEY", "")])).unwrap();
        assert!(!config.has_api_key());
    }

    #[test]
    fn bad_port_rejected() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(env(&[("PORT", "eighty")])).is_err());
    }

    #[test]
    fn mongo_uri_encodes_credentials() {
        let mongo = MongoConfig {
            username: Some("user@x".into()),
            password: Some("p:ss/word".into()),
            db_name: Some("portfolio".into()),
            ..MongoConfig::default()
        };
        let uri = mongo.connection_uri().unwrap();
        assert!(uri.starts_with("mongodb+srv://user%40x:p%3Ass%2Fword@"));
        assert!(uri.contains("/portfolio?retryWrites=true&w=majority&appName=Cluster0"));
    }

    #[test]
    fn mongo_uri_requires_credentials() {
        let err = MongoConfig::default().connection_uri().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn explicit_mongo_uri_wins() {
        let mongo = MongoConfig {
            uri: Some("mongodb://localhost:27017".into()),
            ..MongoConfig::default()
        };
        assert_eq!(mongo.connection_uri().unwrap(), "mongodb://localhost:27017");
    }

    #[test]
    fn allowed_origins_skip_missing() {
        let gateway = GatewayConfig {
            development_url: Some("http://localhost:3000/".into()),
            ..GatewayConfig::default()
        };
        assert_eq!(gateway.allowed_origins(), vec!["http://localhost:3000"]);
    }

    #[test]
    fn invalid_settings_rejected() {
        let mut config = AppConfig::default();
        config.session.max_context_words = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.retrieval.num_candidates = 2;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.session.backend = "redis".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.api_key = Some("super-secret".into());
        config.mongo.password = Some("hunter2".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
    }

    #[test]
    fn config_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[persona]
owner_name = "Ada"

[session]
backend = "file"
max_context_words = 250
"#,
        )
        .unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.persona.owner_name, "Ada");
        assert_eq!(config.session.backend, "file");
        assert_eq!(config.session.max_context_words, 250);
        assert_eq!(config.model.chat_model, "gemini-1.5-flash");
    }
}

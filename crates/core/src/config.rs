//! Configuration management for KorQA.
//!
//! Settings resolve from `.korqa/config.yaml` up through `KORQA_*` variables
//! to CLI flags, each layer overriding the one before it.
//!
//! Per-knowledge-base settings (chunking, thresholds, stop-words) live in the
//! knowledge crate, next to the index they describe.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".korqa";

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: &[&str] = &["ollama"];

/// Process-wide settings shared by every `korqa` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .korqa/)
    pub workspace: PathBuf,

    /// Explicit config.yaml path; defaults to `.korqa/config.yaml`
    pub config_file: Option<PathBuf>,

    /// Answer-generation backend
    pub provider: String,

    /// Answer-generation model
    pub model: String,

    pub api_key: Option<String>,

    /// `EnvFilter` directive, e.g. `korqa_knowledge=debug`
    pub log_level: Option<String>,

    /// Log format ("text" or "json")
    pub log_format: String,

    /// `-v`: debug logging when no level was given
    pub verbose: bool,

    pub no_color: bool,

    /// `llm:` section of config.yaml, when present
    pub llm: Option<LlmConfig>,
}

/// LLM section of config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// One entry under `llm.providers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the provider API
    pub endpoint: String,

    /// Generation model
    pub model: String,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Environment variable holding an API key, if the provider needs one
    #[serde(rename = "apiKeyEnv", default)]
    pub api_key_env: Option<String>,
}

/// On-disk shape of config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    format: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(),
            model: "qwen2:1.5b-instruct".to_string(),
            api_key: None,
            log_level: None,
            log_format: "text".to_string(),
            verbose: false,
            no_color: false,
            llm: None,
        }
    }
}

impl AppConfig {
    /// Resolve settings for the current workspace.
    ///
    /// Reads `KORQA_WORKSPACE` and `KORQA_CONFIG` first to locate config.yaml,
    /// then lets `KORQA_PROVIDER`, `KORQA_MODEL`, `KORQA_API_KEY`, `RUST_LOG`
    /// and `NO_COLOR` override what the file set. Fails if the workspace
    /// directory is missing.
    ///
    /// ```no_run
    /// use korqa_core::config::AppConfig;
    ///
    /// let config = AppConfig::load()?;
    /// let index_dir = config.state_dir().join("korquad");
    /// # Ok::<(), korqa_core::AppError>(())
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("KORQA_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("KORQA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.state_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // KORQA_* beats config.yaml
        if let Ok(provider) = std::env::var("KORQA_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("KORQA_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("KORQA_API_KEY").ok();
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into a copy of this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();
            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model.clone();
            }
            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Layer the global `korqa` flags on top; `None` leaves a setting alone.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// `.korqa/` under the workspace; knowledge bases live one level below.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Create `.korqa/` if needed.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let state_dir = self.state_dir();
        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Get the configuration for a provider, if the config file declared one.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Endpoint override for the active provider.
    pub fn provider_endpoint(&self) -> Option<&str> {
        self.get_provider_config(&self.provider)
            .map(|pc| pc.endpoint.as_str())
    }

    /// Resolve the API key: explicit `KORQA_API_KEY` first, then the
    /// provider's `apiKeyEnv`.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        self.get_provider_config(provider)
            .and_then(|pc| pc.api_key_env.as_ref())
            .and_then(|env_var| std::env::var(env_var).ok())
    }

    /// Reject an unknown generation backend or a missing API key before any
    /// index work starts.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if let Some(env_var) = self
            .get_provider_config(&self.provider)
            .and_then(|pc| pc.api_key_env.as_ref())
        {
            if self.api_key.is_none() && std::env::var(env_var).is_err() {
                return Err(AppError::Config(format!(
                    "API key not found in environment variable: {}",
                    env_var
                )));
            }
        }

        Ok(())
    }
}

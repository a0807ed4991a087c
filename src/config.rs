use anyhow::{Context, Result};
use kisan_sathi_core::models::FarmProfile;
use kisan_sathi_core::speech::{LanguagePreference, Voice};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub farm: FarmConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub card: CardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Environment variable holding the bearer token callers must present.
    /// Unset means the proxy is open.
    #[serde(default)]
    pub auth_token_env: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            auth_token_env: None,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8787".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_url")]
    pub url: String,
    #[serde(default = "default_gateway_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            model: default_gateway_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_gateway_url() -> String {
    "https://ai.gateway.lovable.dev/v1/chat/completions".to_string()
}
fn default_gateway_model() -> String {
    "google/gemini-2.5-flash".to_string()
}
fn default_api_key_env() -> String {
    "KISAN_AI_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Base URL of the proxy, without the `/tip` or `/plan` suffix.
    #[serde(default = "default_client_base_url")]
    pub base_url: String,
    /// Environment variable holding the bearer token sent to the proxy.
    #[serde(default)]
    pub bearer_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_client_base_url(),
            bearer_env: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_client_base_url() -> String {
    format!("http://{}", default_bind())
}

impl ClientConfig {
    pub fn bearer(&self) -> Option<String> {
        self.bearer_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_max_tips")]
    pub max_tips: usize,
    #[serde(default = "default_recent_tip_context")]
    pub recent_tip_context: usize,
    /// Calendar days of plans to keep, today included. `0` keeps all.
    #[serde(default = "default_plan_retention_days")]
    pub plan_retention_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_tips: default_max_tips(),
            recent_tip_context: default_recent_tip_context(),
            plan_retention_days: default_plan_retention_days(),
        }
    }
}

fn default_max_tips() -> usize {
    kisan_sathi_core::tips::MAX_TIPS
}
fn default_recent_tip_context() -> usize {
    kisan_sathi_core::orchestrator::RECENT_TIP_CONTEXT
}
fn default_plan_retention_days() -> u32 {
    kisan_sathi_core::plan::DEFAULT_RETENTION_DAYS
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FarmConfig {
    pub crop: Option<String>,
    pub stage: Option<String>,
    pub location: Option<String>,
}

impl FarmConfig {
    /// Merge CLI overrides over the configured profile.
    ///
    /// Fails when crop or stage is missing from both.
    pub fn resolve(
        &self,
        crop: Option<String>,
        stage: Option<String>,
        location: Option<String>,
    ) -> Result<FarmProfile> {
        let crop = crop
            .or_else(|| self.crop.clone())
            .context("no crop given (pass --crop or set [farm].crop)")?;
        let stage = stage
            .or_else(|| self.stage.clone())
            .context("no growth stage given (pass --stage or set [farm].stage)")?;
        Ok(FarmProfile {
            crop,
            stage,
            location: location.or_else(|| self.location.clone()),
        })
    }

    /// Like [`resolve`](Self::resolve) but every field may stay empty.
    pub fn resolve_partial(
        &self,
        crop: Option<String>,
        stage: Option<String>,
        location: Option<String>,
    ) -> FarmProfile {
        FarmProfile {
            crop: crop.or_else(|| self.crop.clone()).unwrap_or_default(),
            stage: stage.or_else(|| self.stage.clone()).unwrap_or_default(),
            location: location.or_else(|| self.location.clone()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpeechConfig {
    /// Text-to-speech program. Unset disables speech.
    #[serde(default)]
    pub program: Option<String>,
    /// Arguments placed before the text. `{voice}` is replaced by the
    /// chosen voice name; arguments mentioning `{voice}` are dropped when
    /// no voice matched.
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_fallback_languages")]
    pub fallback_languages: Vec<String>,
    #[serde(default)]
    pub voices: Vec<Voice>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            program: None,
            args: Vec::new(),
            language: default_language(),
            fallback_languages: default_fallback_languages(),
            voices: Vec::new(),
        }
    }
}

fn default_language() -> String {
    "ne-NP".to_string()
}
fn default_fallback_languages() -> Vec<String> {
    vec!["hi".to_string()]
}

impl SpeechConfig {
    pub fn preference(&self) -> LanguagePreference {
        LanguagePreference {
            language: self.language.clone(),
            fallbacks: self.fallback_languages.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CardConfig {
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            refresh_secs: default_refresh_secs(),
        }
    }
}

fn default_refresh_secs() -> u64 {
    300
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.cache.max_tips == 0 {
        anyhow::bail!("cache.max_tips must be >= 1");
    }
    if config.cache.recent_tip_context == 0 {
        anyhow::bail!("cache.recent_tip_context must be >= 1");
    }
    if config.card.refresh_secs == 0 {
        anyhow::bail!("card.refresh_secs must be >= 1");
    }
    if config.gateway.timeout_secs == 0 || config.client.timeout_secs == 0 {
        anyhow::bail!("timeout_secs must be >= 1");
    }
    if config.gateway.api_key_env.trim().is_empty() {
        anyhow::bail!("gateway.api_key_env must name an environment variable");
    }
    if config.speech.program.as_deref().is_some_and(|p| p.trim().is_empty()) {
        anyhow::bail!("speech.program must not be empty when set");
    }
    Ok(())
}

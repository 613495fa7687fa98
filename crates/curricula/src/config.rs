use std::fmt;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "anthropic/claude-3-opus:beta";
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Model provider settings shared by every subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct ProviderArgs {
    /// Serve sample data instead of calling the model
    #[clap(long = "mock", env = "USE_MOCK_DATA", global = true, default_value = "false")]
    pub use_mock_data: bool,

    /// OpenRouter model name
    #[clap(long, env = "OPEN_ROUTER_MODEL_NAME", global = true, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// OpenRouter API key
    #[clap(long, env = "OPEN_ROUTER_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// OpenRouter API base URL
    #[clap(long, env = "OPEN_ROUTER_BASE_URL", global = true, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Site URL sent as the HTTP-Referer header
    #[clap(long, env = "SITE_URL", global = true, default_value = DEFAULT_SITE_URL)]
    pub site_url: String,

    /// Default budget for a single model call, in seconds
    #[clap(long = "timeout", env = "CURRICULA_TIMEOUT", global = true, default_value = "60")]
    pub timeout_secs: u64,
}

/// Everything the orchestrator needs to reach the model provider.
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub use_mock_data: bool,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub site_url: String,
    pub timeout: Duration,
}

impl GeneratorConfig {
    /// Budget for one call: the per-request override when given, the configured
    /// default otherwise.
    pub fn budget(&self, override_ms: Option<u64>) -> Duration {
        override_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(self.timeout)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            use_mock_data: false,
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl From<&ProviderArgs> for GeneratorConfig {
    fn from(args: &ProviderArgs) -> Self {
        Self {
            use_mock_data: args.use_mock_data,
            model: args.model.clone(),
            api_key: args
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            base_url: args.base_url.trim_end_matches('/').to_string(),
            site_url: args.site_url.clone(),
            timeout: Duration::from_secs(args.timeout_secs),
        }
    }
}

// The API key never reaches logs.
impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("use_mock_data", &self.use_mock_data)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("site_url", &self.site_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

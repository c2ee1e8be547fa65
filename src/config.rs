use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATA_PATH: &str = "data/computer_prices_all.csv";
pub const DEFAULT_MODEL_PATH: &str = "price_model.json";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_COMPLETION_URL: &str =
    "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";
pub const DEFAULT_COMPLETION_MODEL: &str = "yandexgpt-4-lite";

/// Runtime configuration, read once at startup.
///
/// The two chat secrets are optional: without them only the chat page is
/// disabled.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    pub geocoder_url: String,
    pub geocoder_timeout: Duration,
    pub completion_url: String,
    pub completion_model: String,
    pub model_namespace: Option<String>,
    pub api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            geocoder_url: DEFAULT_GEOCODER_URL.to_owned(),
            geocoder_timeout: Duration::from_secs(10),
            completion_url: DEFAULT_COMPLETION_URL.to_owned(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_owned(),
            model_namespace: None,
            api_key: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// Loads `.env` file if present.
    pub fn from_env() -> Self {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        let timeout_secs = match env::var("RIGSCOPE_GEOCODER_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid RIGSCOPE_GEOCODER_TIMEOUT_SECS={raw:?}");
                defaults.geocoder_timeout.as_secs()
            }),
            Err(_) => defaults.geocoder_timeout.as_secs(),
        };

        Self {
            data_path: get_var("RIGSCOPE_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            model_path: get_var("RIGSCOPE_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            geocoder_url: get_var("RIGSCOPE_GEOCODER_URL").unwrap_or(defaults.geocoder_url),
            geocoder_timeout: Duration::from_secs(timeout_secs),
            completion_url: get_var("RIGSCOPE_COMPLETION_URL").unwrap_or(defaults.completion_url),
            completion_model: get_var("RIGSCOPE_COMPLETION_MODEL")
                .unwrap_or(defaults.completion_model),
            model_namespace: get_var("RIGSCOPE_MODEL_NAMESPACE"),
            api_key: get_var("RIGSCOPE_API_KEY"),
        }
    }
}

/// Unset and blank variables are treated the same.
fn get_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

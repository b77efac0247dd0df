//! Environment configuration.
//!
//! Everything is read once into an explicit [`Config`] value at process start
//! and passed by reference from there; nothing else in the crate touches the
//! environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub provider_id: String,
    pub api_key: String,
    pub api_base_url: Option<String>,
    pub chat_model: String,
    pub completion_model: String,
    pub temperature: f64,
    pub chat_max_tokens: Option<u32>,
    pub completion_max_tokens: u32,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    pub history_length: usize,
    pub aliases: String,
    pub unlock_phrase: Option<String>,
    pub unlock_enabled: bool,
    pub system_prompt: String,
    pub use_system_prompt: bool,
    pub debug: bool,
    pub timeout: Option<Duration>,
    pub image_size: u32,
    pub data_dir: PathBuf,
    pub image_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider_id: "mock".to_string(),
            api_key: String::new(),
            api_base_url: None,
            chat_model: "gpt-3.5-turbo".to_string(),
            completion_model: "text-davinci-003".to_string(),
            temperature: 0.0,
            chat_max_tokens: None,
            completion_max_tokens: 50,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            history_length: 4,
            aliases: String::new(),
            unlock_phrase: None,
            unlock_enabled: false,
            system_prompt: String::new(),
            use_system_prompt: false,
            debug: false,
            timeout: None,
            image_size: 512,
            data_dir: PathBuf::from("."),
            image_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            provider_id: env_string("PROMPTDECK_PROVIDER", &defaults.provider_id),
            api_key: env_string("PROMPTDECK_API_KEY", ""),
            api_base_url: env_string_opt("PROMPTDECK_API_BASE_URL"),
            chat_model: env_string("PROMPTDECK_CHAT_MODEL", &defaults.chat_model),
            completion_model: env_string(
                "PROMPTDECK_COMPLETION_MODEL",
                &defaults.completion_model,
            ),
            temperature: env_f64("PROMPTDECK_TEMPERATURE", defaults.temperature),
            chat_max_tokens: env_u32_opt("PROMPTDECK_CHAT_MAX_TOKENS"),
            completion_max_tokens: env_u32(
                "PROMPTDECK_COMPLETION_MAX_TOKENS",
                defaults.completion_max_tokens,
            ),
            top_p: env_f64("PROMPTDECK_TOP_P", defaults.top_p),
            frequency_penalty: env_f64(
                "PROMPTDECK_FREQUENCY_PENALTY",
                defaults.frequency_penalty,
            ),
            presence_penalty: env_f64("PROMPTDECK_PRESENCE_PENALTY", defaults.presence_penalty),
            history_length: env_usize("PROMPTDECK_HISTORY_LENGTH", defaults.history_length),
            aliases: env_string("PROMPTDECK_ALIASES", ""),
            unlock_phrase: env_string_opt("PROMPTDECK_UNLOCK_PROMPT"),
            unlock_enabled: env_flag("PROMPTDECK_UNLOCKED"),
            system_prompt: env_string("PROMPTDECK_SYSTEM_PROMPT", ""),
            use_system_prompt: env_flag("PROMPTDECK_USE_SYSTEM_PROMPT"),
            debug: env_flag("PROMPTDECK_DEBUG"),
            timeout: env_u64_opt("PROMPTDECK_TIMEOUT_SEC").map(Duration::from_secs),
            image_size: env_u32("PROMPTDECK_IMAGE_SIZE", defaults.image_size),
            data_dir: env_path("PROMPTDECK_DATA_DIR").unwrap_or_else(default_data_dir),
            image_dir: env_path("PROMPTDECK_IMAGE_DIR").unwrap_or_else(default_image_dir),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".promptdeck"))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_image_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn env_string(key: &str, default: &str) -> String {
    env_string_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_f64(key: &str, default: f64) -> f64 {
    parse_or_default(key, default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    parse_or_default(key, default)
}

fn env_usize(key: &str, default: usize) -> usize {
    parse_or_default(key, default)
}

fn env_u32_opt(key: &str) -> Option<u32> {
    parse_opt(key)
}

fn env_u64_opt(key: &str) -> Option<u64> {
    parse_opt(key)
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_string_opt(key).map(PathBuf::from)
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match env_string_opt(key) {
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(key, value = %value, "unparseable value; falling back to default");
                default
            }
        },
        None => default,
    }
}

fn parse_opt<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = env_string_opt(key)?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(key, value = %value, "unparseable value; treating as unset");
            None
        }
    }
}

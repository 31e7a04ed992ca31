use std::{
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

use serde::{
    Deserialize,
    Serialize,
};
use tracing::info;

use crate::{
    core::WanipopError,
    persistence::{
        get_data_file_path,
        load_json_from,
        save_json_to,
    },
    review::RetryPolicy,
};

const CONFIG_FILE: &str = "config.json";
pub const API_KEY_ENV: &str = "WANIKANI_API_KEY";
pub const DEFAULT_API_BASE_URL: &str = "https://api.wanikani.com/v2";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct WanipopConfig {
    pub num_of_reviews_per_batch: usize,
    pub wanikani_api_key: Option<String>,
    pub api_base_url: String,
    pub max_submission_attempts: u32,
    pub retry_backoff_ms: u64,
    pub max_retry_backoff_ms: u64,

    #[serde(skip)]
    path: Option<PathBuf>,
    /// Key from the environment. Never written to disk.
    #[serde(skip)]
    env_api_key: Option<String>,
}

impl Default for WanipopConfig {
    fn default() -> Self {
        Self {
            num_of_reviews_per_batch: 5,
            wanikani_api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            max_submission_attempts: 3,
            retry_backoff_ms: 500,
            max_retry_backoff_ms: 8000,
            path: None,
            env_api_key: None,
        }
    }
}

impl WanipopConfig {
    pub fn config_path() -> PathBuf {
        get_data_file_path(CONFIG_FILE)
    }

    /// Loads the stored config or writes the defaults, then applies the API key
    /// from the environment if one is set.
    pub fn load_or_create() -> Result<Self, WanipopError> {
        let mut config = Self::load_or_create_at(&Self::config_path())?;
        config.apply_env_api_key(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    fn apply_env_api_key(&mut self, key: Option<String>) {
        self.env_api_key = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
    }

    pub fn load_or_create_at(path: &Path) -> Result<Self, WanipopError> {
        let mut config = match load_json_from::<Self>(path)? {
            Some(config) => config,
            None => {
                info!("No config found, creating {}", path.display());
                let config = Self::default();
                save_json_to(&config, path)?;
                config
            }
        };
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn save(&self) -> Result<(), WanipopError> {
        let path = self.path.clone().unwrap_or_else(Self::config_path);
        save_json_to(self, &path)
    }

    pub fn api_key(&self) -> Result<&str, WanipopError> {
        self.env_api_key
            .as_deref()
            .or(self.wanikani_api_key.as_deref())
            .filter(|k| !k.is_empty())
            .ok_or(WanipopError::MissingApiKey)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_submission_attempts.max(1),
            initial_backoff: Duration::from_millis(self.retry_backoff_ms),
            max_backoff: Duration::from_millis(self.max_retry_backoff_ms.max(self.retry_backoff_ms)),
        }
    }

    pub fn set_api_key(&mut self, key: String) -> Result<(), WanipopError> {
        self.wanikani_api_key = Some(key);
        self.save()
    }

    pub fn set_num_of_reviews_per_batch(&mut self, value: usize) -> Result<(), WanipopError> {
        self.num_of_reviews_per_batch = value;
        self.save()
    }
}

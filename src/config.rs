use std::path::Path;

use serde::{Deserialize, Serialize};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_CATALOGUE_CSV: &str = "catalogue.csv";
const DEFAULT_ORDERS_CSV: &str = "orders.csv";
const DEFAULT_PAYMENT_BASE_URL: &str = "https://pay.example.com";
const DEFAULT_UPI_ID: &str = "shop@upi";
/// Pending product choices expire after 30 minutes; 0 disables expiry.
const DEFAULT_PENDING_TTL_SECS: u64 = 1800;
const DEFAULT_TOP_N: usize = 3;

const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";
const DEFAULT_EMBEDDING_CACHE_DIR: &str = ".plumbot";
/// Default model download timeout in seconds
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// Embedding model settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name for embeddings (e.g., "all-MiniLM-L6-v2")
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Directory to cache downloaded model files
    #[serde(default = "default_embedding_cache_dir")]
    pub cache_dir: String,

    /// Timeout for model download in seconds
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            cache_dir: DEFAULT_EMBEDDING_CACHE_DIR.to_string(),
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_embedding_cache_dir() -> String {
    DEFAULT_EMBEDDING_CACHE_DIR.to_string()
}

fn default_download_timeout_secs() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_SECS
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Catalogue tab of the product sheet, as a CSV file
    #[serde(default = "default_catalogue_csv")]
    pub catalogue_csv: String,

    /// Orders tab, as a CSV file
    #[serde(default = "default_orders_csv")]
    pub orders_csv: String,

    /// Base URL embedded in payment-link replies
    #[serde(default = "default_payment_base_url")]
    pub payment_base_url: String,

    /// Payment identifier quoted in UPI instructions
    #[serde(default = "default_upi_id")]
    pub upi_id: String,

    /// Lifetime of a pending product choice, in seconds (0 = no expiry)
    #[serde(default = "default_pending_ttl_secs")]
    pub pending_ttl_secs: u64,

    /// How many ranked matches a query considers
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_catalogue_csv() -> String {
    DEFAULT_CATALOGUE_CSV.to_string()
}

fn default_orders_csv() -> String {
    DEFAULT_ORDERS_CSV.to_string()
}

fn default_payment_base_url() -> String {
    DEFAULT_PAYMENT_BASE_URL.to_string()
}

fn default_upi_id() -> String {
    DEFAULT_UPI_ID.to_string()
}

fn default_pending_ttl_secs() -> u64 {
    DEFAULT_PENDING_TTL_SECS
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str("{}").expect("default config from empty mapping")
    }
}

impl Config {
    fn validate(&self) {
        if self.top_n == 0 {
            panic!("top_n must be greater than 0");
        }
        if self.payment_base_url.trim().is_empty() {
            panic!("payment_base_url must not be empty");
        }
        if self.upi_id.trim().is_empty() {
            panic!("upi_id must not be empty");
        }
        if self.embedding.model.trim().is_empty() {
            panic!("embedding.model must not be empty");
        }
        if self.embedding.download_timeout_secs == 0 {
            panic!("embedding.download_timeout_secs must be greater than 0");
        }
    }

    /// Load the config file, creating it with defaults if it does not
    /// exist yet.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            let config = Self::default();
            config.save(path);
            config.validate();
            return config;
        }

        let config_str = std::fs::read_to_string(path).expect("config file is not readable");
        let config: Self = serde_yml::from_str(&config_str).expect("config is malformed");

        config.validate();

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config).expect("config serializes") {
            config.save(path);
        }

        config
    }

    pub fn save(&self, path: &Path) {
        let config_str = serde_yml::to_string(self).expect("config serializes");
        std::fs::write(path, config_str).expect("config file is not writable");
    }
}

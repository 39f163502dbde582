//! HTTP client configuration with builder-style setters

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://open.feishu.cn/open-apis";
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Per-request timeouts
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub token: Duration,
    pub search: Duration,
    pub write: Duration,
    pub download: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            token: Duration::from_secs(10),
            search: Duration::from_secs(15),
            write: Duration::from_secs(15),
            download: Duration::from_secs(300),
        }
    }
}

/// Settings for [`super::BitableClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub page_size: u32,
    pub timeouts: TimeoutConfig,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeouts: TimeoutConfig::default(),
            user_agent: format!("bitable-cli/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Join an API path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

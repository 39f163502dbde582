//! Runtime configuration from environment variables
//!
//! Variables may come from the process environment or a `.env` file loaded
//! at startup. Nothing is required until a command needs the remote table;
//! [`Config::require_remote`] then reports every missing variable at once.

use anyhow::{Context, Result, bail};

use crate::api::{ClientConfig, Credentials};
use crate::api::config::DEFAULT_BASE_URL;
use crate::timestamp::{DEFAULT_OFFSET_HOURS, TimestampNormalizer};

pub const DEFAULT_ATTACHMENT_FIELD: &str = "上传附件";

/// Values read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
    /// Bitable app token (`DWBG_TOKEN`)
    pub app_token: Option<String>,
    /// Table holding the triggering row (`DWBG_TABLE_ID`)
    pub source_table_id: Option<String>,
    /// The triggering row (`ROW_ID`)
    pub row_id: Option<String>,
    pub qsa_table_id: Option<String>,
    pub target_table_id: Option<String>,
    pub attachment_field: String,
    pub base_url: String,
    pub timezone_offset_hours: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_id: None,
            app_secret: None,
            app_token: None,
            source_table_id: None,
            row_id: None,
            qsa_table_id: None,
            target_table_id: None,
            attachment_field: DEFAULT_ATTACHMENT_FIELD.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timezone_offset_hours: DEFAULT_OFFSET_HOURS,
        }
    }
}

/// Everything needed to reach the triggering row
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub credentials: Credentials,
    pub app_token: String,
    pub source_table_id: String,
    pub row_id: String,
    pub attachment_field: String,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a variable lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let first = |keys: &[&str]| keys.iter().find_map(|k| get(*k));

        let timezone_offset_hours = match get("TIMEZONE_OFFSET_HOURS") {
            Some(raw) => raw
                .parse::<i32>()
                .with_context(|| format!("TIMEZONE_OFFSET_HOURS must be a whole number, got '{}'", raw))?,
            None => DEFAULT_OFFSET_HOURS,
        };

        let defaults = Self::default();
        Ok(Self {
            app_id: first(&["FEISHU_APP_ID", "APP_ID"]),
            app_secret: first(&["FEISHU_APP_SECRET", "APP_SECRET"]),
            app_token: get("DWBG_TOKEN"),
            source_table_id: get("DWBG_TABLE_ID"),
            row_id: get("ROW_ID"),
            qsa_table_id: get("QSA_TABLE_ID"),
            target_table_id: get("TARGET_TABLE_ID"),
            attachment_field: get("ATTACHMENT_FIELD").unwrap_or(defaults.attachment_field),
            base_url: get("FEISHU_BASE_URL").unwrap_or(defaults.base_url),
            timezone_offset_hours,
        })
    }

    /// Validate the variables needed to talk to the remote table
    pub fn require_remote(&self) -> Result<RemoteConfig> {
        let required = [
            ("FEISHU_APP_ID", &self.app_id),
            ("FEISHU_APP_SECRET", &self.app_secret),
            ("DWBG_TOKEN", &self.app_token),
            ("DWBG_TABLE_ID", &self.source_table_id),
            ("ROW_ID", &self.row_id),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            bail!("Missing environment variables: {}", missing.join(", "));
        }

        Ok(RemoteConfig {
            credentials: Credentials {
                app_id: self.app_id.clone().unwrap_or_default(),
                app_secret: self.app_secret.clone().unwrap_or_default(),
            },
            app_token: self.app_token.clone().unwrap_or_default(),
            source_table_id: self.source_table_id.clone().unwrap_or_default(),
            row_id: self.row_id.clone().unwrap_or_default(),
            attachment_field: self.attachment_field.clone(),
        })
    }

    /// Table the weight pipeline writes to
    pub fn require_target_table(&self) -> Result<&str> {
        match self.target_table_id.as_deref() {
            Some(table) => Ok(table),
            None => bail!("Missing environment variable: TARGET_TABLE_ID"),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::builder().base_url(self.base_url.clone()).build()
    }

    pub fn normalizer(&self) -> Result<TimestampNormalizer> {
        TimestampNormalizer::new(self.timezone_offset_hours)
            .map_err(|e| anyhow::anyhow!("TIMEZONE_OFFSET_HOURS: {}", e))
    }
}

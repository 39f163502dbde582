//! Wire models for the bitable open API

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Standard `{code, msg, data}` response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Payload of a successful response; a non-zero code is an error
    pub fn into_data(self, action: &str) -> Result<T> {
        if self.code != 0 {
            bail!("{} failed: code {}, msg: {}", action, self.code, self.msg);
        }
        match self.data {
            Some(data) => Ok(data),
            None => bail!("{} returned no data", action),
        }
    }
}

/// Token issuance response; unlike other calls the token sits at top level
#[derive(Debug, Clone, Deserialize)]
pub struct TenantTokenResponse {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub tenant_access_token: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    pub expire: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TenantTokenRequest<'a> {
    pub app_id: &'a str,
    pub app_secret: &'a str,
}

/// A bearer token with its expiry
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub access_token: String,
    pub expires_at: Instant,
}

impl TokenInfo {
    /// Token valid for `expire_secs`, treated as expiring a minute early
    pub fn new(access_token: String, expire_secs: u64) -> Self {
        let lifetime = Duration::from_secs(expire_secs.saturating_sub(60));
        Self {
            access_token,
            expires_at: Instant::now() + lifetime,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// First characters of the token, for logs
    pub fn preview(&self) -> String {
        self.access_token.chars().take(8).collect::<String>() + "..."
    }
}

/// Body of a record search call
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchRequest {
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

/// One page of search results
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub items: Vec<RemoteRecord>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub page_token: Option<String>,
}

/// A row as returned by the service
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RemoteRecord {
    pub record_id: String,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl RemoteRecord {
    /// Attachments stored in a field; any other field shape yields none
    pub fn attachments(&self, field: &str) -> Vec<Attachment> {
        self.fields
            .get(field)
            .and_then(|value| serde_json::from_value::<Vec<Attachment>>(value.clone()).ok())
            .unwrap_or_default()
    }
}

/// Attachment metadata inside an attachment field
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Attachment {
    #[serde(default)]
    pub file_token: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tmp_url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
}

/// Response of a create or update call
#[derive(Debug, Clone, Deserialize)]
pub struct RecordResponse {
    pub record: RemoteRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmpDownloadUrl {
    pub file_token: String,
    pub tmp_download_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmpDownloadUrls {
    #[serde(default)]
    pub tmp_download_urls: Vec<TmpDownloadUrl>,
}

impl TmpDownloadUrls {
    pub fn into_map(self) -> HashMap<String, String> {
        self.tmp_download_urls
            .into_iter()
            .map(|u| (u.file_token, u.tmp_download_url))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_error_code() {
        let envelope: Envelope<SearchPage> =
            serde_json::from_str(r#"{"code": 1254043, "msg": "RecordIdNotFound"}"#).unwrap();
        let err = envelope.into_data("search").unwrap_err();
        assert!(err.to_string().contains("RecordIdNotFound"));
    }

    #[test]
    fn test_search_page_with_attachments() {
        let envelope: Envelope<SearchPage> = serde_json::from_str(
            r#"{
                "code": 0,
                "msg": "success",
                "data": {
                    "has_more": false,
                    "items": [{
                        "record_id": "rec1",
                        "fields": {
                            "上传附件": [{
                                "file_token": "box1",
                                "name": "QSA报告.xlsx",
                                "url": "https://example.com/download/box1",
                                "type": "application/vnd.ms-excel"
                            }],
                            "备注": "text"
                        }
                    }]
                }
            }"#,
        )
        .unwrap();
        let page = envelope.into_data("search").unwrap();
        assert!(!page.has_more);
        let record = &page.items[0];
        let attachments = record.attachments("上传附件");
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].name, "QSA报告.xlsx");
        assert_eq!(attachments[0].file_token.as_deref(), Some("box1"));
        assert!(record.attachments("备注").is_empty());
        assert!(record.attachments("missing").is_empty());
    }

    #[test]
    fn test_token_preview_and_expiry() {
        let token = TokenInfo::new("t-1234567890abcdef".to_string(), 7200);
        assert_eq!(token.preview(), "t-123456...");
        assert!(!token.is_expired());
        assert!(TokenInfo::new("t".to_string(), 30).is_expired());
    }

    #[test]
    fn test_search_request_omits_empty_page_token() {
        let body = serde_json::to_value(SearchRequest {
            page_size: 100,
            page_token: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"page_size": 100}));
    }
}

//! Bitable REST client
//!
//! Thin wrapper over the open API: record search with pagination, record
//! create/update, temporary attachment URLs and binary downloads. Every call
//! is awaited on its own; there is no retry.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use urlencoding::encode;

use super::auth::{Credentials, TokenProvider};
use super::config::ClientConfig;
use super::models::{
    Envelope, RecordResponse, RemoteRecord, SearchPage, SearchRequest, TmpDownloadUrls,
};
use super::sink::RecordSink;
use super::value::{Fields, fields_to_json};

/// Client bound to one bitable app
#[derive(Debug)]
pub struct BitableClient {
    http: reqwest::Client,
    config: ClientConfig,
    app_token: String,
    tokens: TokenProvider,
}

impl BitableClient {
    pub fn new(config: ClientConfig, credentials: Credentials, app_token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;
        let tokens = TokenProvider::new(http.clone(), config.clone(), credentials);
        Ok(Self {
            http,
            config,
            app_token: app_token.into(),
            tokens,
        })
    }

    /// Fetch a token now, so credential problems surface before any work
    pub async fn authenticate(&self) -> Result<()> {
        self.tokens.token().await.map(|_| ())
    }

    fn records_path(&self, table_id: &str) -> String {
        format!(
            "bitable/v1/apps/{}/tables/{}/records",
            encode(&self.app_token),
            encode(table_id)
        )
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder, action: &str) -> Result<T> {
        let token = self.tokens.token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", action))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read {} response", action))?;
        if !status.is_success() {
            bail!("{} failed with HTTP {}: {}", action, status, text);
        }

        let envelope: Envelope<T> = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {} response: {}", action, text))?;
        envelope.into_data(action)
    }

    /// One page of records
    pub async fn search_page(&self, table_id: &str, page_token: Option<String>) -> Result<SearchPage> {
        let url = self.config.url(&format!("{}/search", self.records_path(table_id)));
        let body = SearchRequest {
            page_size: self.config.page_size,
            page_token,
        };
        let request = self
            .http
            .post(&url)
            .timeout(self.config.timeouts.search)
            .json(&body);
        self.send(request, "record search").await
    }

    /// Walk pages until `visit` returns `Some` or the table is exhausted
    pub async fn find_in_pages<T, F>(&self, table_id: &str, mut visit: F) -> Result<Option<T>>
    where
        F: FnMut(&RemoteRecord) -> Option<T>,
    {
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.search_page(table_id, page_token.take()).await?;
            pages += 1;
            log::debug!("Search page {}: {} records", pages, page.items.len());

            if let Some(found) = page.items.iter().find_map(&mut visit) {
                return Ok(Some(found));
            }
            if !page.has_more {
                return Ok(None);
            }
            match page.page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => {
                    log::warn!("Search reported more pages but gave no page token");
                    return Ok(None);
                }
            }
        }
    }

    /// Find a record by id by paging through the table
    pub async fn find_record(&self, table_id: &str, record_id: &str) -> Result<Option<RemoteRecord>> {
        self.find_in_pages(table_id, |record| {
            (record.record_id == record_id).then(|| record.clone())
        })
        .await
    }

    pub async fn create_record(&self, table_id: &str, fields: &Fields) -> Result<String> {
        let url = self.config.url(&self.records_path(table_id));
        let client_token = uuid::Uuid::new_v4().to_string();
        let request = self
            .http
            .post(&url)
            .timeout(self.config.timeouts.write)
            .query(&[("client_token", client_token.as_str())])
            .json(&serde_json::json!({ "fields": fields_to_json(fields) }));
        let response: RecordResponse = self.send(request, "record create").await?;
        log::debug!("Created record {} in {}", response.record.record_id, table_id);
        Ok(response.record.record_id)
    }

    pub async fn update_record(&self, table_id: &str, record_id: &str, fields: &Fields) -> Result<String> {
        let url = self.config.url(&format!(
            "{}/{}",
            self.records_path(table_id),
            encode(record_id)
        ));
        let request = self
            .http
            .put(&url)
            .timeout(self.config.timeouts.write)
            .json(&serde_json::json!({ "fields": fields_to_json(fields) }));
        let response: RecordResponse = self.send(request, "record update").await?;
        log::debug!("Updated record {} in {}", record_id, table_id);
        Ok(response.record.record_id)
    }

    /// Temporary download URLs for attachment file tokens
    pub async fn tmp_download_urls(&self, file_tokens: &[String]) -> Result<HashMap<String, String>> {
        if file_tokens.is_empty() {
            return Ok(HashMap::new());
        }
        let url = self.config.url("drive/v1/medias/batch_get_tmp_download_url");
        let query: Vec<(&str, &str)> = file_tokens
            .iter()
            .map(|t| ("file_tokens", t.as_str()))
            .collect();
        let request = self
            .http
            .get(&url)
            .timeout(self.config.timeouts.search)
            .query(&query);
        let urls: TmpDownloadUrls = self.send(request, "temporary URL lookup").await?;
        Ok(urls.into_map())
    }

    /// Download an attachment body
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let token = self.tokens.token().await?;
        let response = self
            .http
            .get(url)
            .timeout(self.config.timeouts.download)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send download request")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Download failed with HTTP {}", status);
        }
        let bytes = response
            .bytes()
            .await
            .context("Failed to read download body")?;
        log::debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl RecordSink for BitableClient {
    async fn create(&self, table_id: &str, fields: &Fields) -> Result<String> {
        self.create_record(table_id, fields).await
    }

    async fn update(&self, table_id: &str, record_id: &str, fields: &Fields) -> Result<String> {
        self.update_record(table_id, record_id, fields).await
    }
}

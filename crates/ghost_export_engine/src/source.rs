//! Read-only access to the Ghost Content API.

use chrono::{DateTime, Utc};
use ghost_export_core::{ContentItem, ContentKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::DownloadSettings;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
    #[error("request for {resource} failed: {message}")]
    Network {
        resource: &'static str,
        message: String,
    },
    #[error("request for {resource} returned http status {status}")]
    HttpStatus { resource: &'static str, status: u16 },
    #[error("malformed {resource} response: {message}")]
    Decode {
        resource: &'static str,
        message: String,
    },
}

/// An author or tag attached to a content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedEntity {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A page or post exactly as served. Fields the exporter does not use are
/// kept in `extra` so the debug dump shows the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawContent {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub feature_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_author: Option<LinkedEntity>,
    #[serde(default)]
    pub authors: Vec<LinkedEntity>,
    #[serde(default)]
    pub tags: Vec<LinkedEntity>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawContent {
    /// Strips the backend base URL from the item, author and tag URLs.
    pub fn with_root_relative_urls(mut self, base_url: &str) -> Self {
        strip_base_url(&mut self.url, base_url);
        let entities = self
            .primary_author
            .iter_mut()
            .chain(self.authors.iter_mut())
            .chain(self.tags.iter_mut());
        for entity in entities {
            strip_base_url(&mut entity.url, base_url);
        }
        self
    }

    pub fn into_content_item(self, kind: ContentKind) -> ContentItem {
        ContentItem {
            id: self.id,
            slug: self.slug,
            title: self.title.unwrap_or_default(),
            html: self.html.unwrap_or_default(),
            feature_image: self.feature_image,
            published_at: self.published_at,
            kind,
        }
    }
}

fn strip_base_url(url: &mut Option<String>, base_url: &str) {
    let Some(current) = url.as_deref() else {
        return;
    };
    if base_url.is_empty() {
        return;
    }
    let Some(rest) = current.strip_prefix(base_url) else {
        return;
    };
    if rest.is_empty() {
        *url = Some("/".to_string());
    } else if rest.starts_with('/') {
        *url = Some(rest.to_string());
    }
}

/// Site-wide settings, fetched once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SiteSettings {
    /// Replaces `url` with the public site URL when one is configured.
    pub fn with_site_url(mut self, site_url: Option<&str>) -> Self {
        if let Some(site_url) = site_url {
            self.url = Some(site_url.to_string());
        }
        self
    }

    /// Logo, icon and cover image URLs that are set.
    pub fn asset_urls(&self) -> impl Iterator<Item = &str> {
        [&self.logo, &self.icon, &self.cover_image]
            .into_iter()
            .filter_map(|url| url.as_deref())
            .filter(|url| !url.is_empty())
    }
}

#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    async fn settings(&self) -> Result<SiteSettings, SourceError>;
    async fn pages(&self) -> Result<Vec<RawContent>, SourceError>;
    async fn posts(&self) -> Result<Vec<RawContent>, SourceError>;
}

#[derive(Deserialize)]
struct SettingsEnvelope {
    settings: SiteSettings,
}

#[derive(Deserialize)]
struct PagesEnvelope {
    pages: Vec<RawContent>,
}

#[derive(Deserialize)]
struct PostsEnvelope {
    posts: Vec<RawContent>,
}

/// Client for `{base}/ghost/api/v2/content/`.
#[derive(Debug, Clone)]
pub struct GhostContentClient {
    client: reqwest::Client,
    api_root: Url,
    key: String,
}

impl GhostContentClient {
    pub fn new(
        base_url: &str,
        key: impl Into<String>,
        settings: &DownloadSettings,
    ) -> Result<Self, SourceError> {
        let api_root = Url::parse(&format!(
            "{}/ghost/api/v2/content/",
            base_url.trim_end_matches('/')
        ))
        .map_err(|err| SourceError::InvalidUrl(format!("{base_url}: {err}")))?;
        let client = settings
            .build_client()
            .map_err(|err| SourceError::InvalidUrl(err.to_string()))?;
        Ok(Self {
            client,
            api_root,
            key: key.into(),
        })
    }

    fn endpoint(
        &self,
        resource: &'static str,
        params: &[(&str, &str)],
    ) -> Result<Url, SourceError> {
        let mut url = self
            .api_root
            .join(&format!("{resource}/"))
            .map_err(|err| SourceError::InvalidUrl(err.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", &self.key);
            for (name, value) in params {
                query.append_pair(name, value);
            }
        }
        Ok(url)
    }

    async fn browse<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        params: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let url = self.endpoint(resource, params)?;
        let network = |err: reqwest::Error| SourceError::Network {
            resource,
            message: err.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                resource,
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(network)?;
        serde_json::from_slice(&body).map_err(|err| SourceError::Decode {
            resource,
            message: err.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ContentSource for GhostContentClient {
    async fn settings(&self) -> Result<SiteSettings, SourceError> {
        let envelope: SettingsEnvelope = self.browse("settings", &[]).await?;
        Ok(envelope.settings)
    }

    async fn pages(&self) -> Result<Vec<RawContent>, SourceError> {
        let envelope: PagesEnvelope = self
            .browse("pages", &[("limit", "all"), ("include", "authors")])
            .await?;
        Ok(envelope.pages)
    }

    async fn posts(&self) -> Result<Vec<RawContent>, SourceError> {
        let envelope: PostsEnvelope = self
            .browse("posts", &[("limit", "all"), ("include", "tags,authors")])
            .await?;
        Ok(envelope.posts)
    }
}

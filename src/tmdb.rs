use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use crate::cache::ResponseCache;
use crate::config::with_trailing_slash;
use crate::error::{status_text, CatalogError, CatalogResult};
use crate::models::{ContentItem, MediaType, Movie, Page, TvShow};

pub const DEFAULT_TMDB_BASE: &str = "https://api.themoviedb.org/3/";
const LANGUAGE: &str = "en-US";
const DETAIL_EXPANSION: &str = "videos,external_ids";

/// Whether multi-search keeps results that have no poster image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchPolicy {
    #[default]
    RequirePoster,
    AllowPosterless,
}

impl SearchPolicy {
    fn keeps(&self, item: &ContentItem) -> bool {
        match self {
            SearchPolicy::RequirePoster => item.poster_path().is_some_and(|p| !p.is_empty()),
            SearchPolicy::AllowPosterless => true,
        }
    }
}

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn popular_movies(&self, page: u32) -> CatalogResult<Page<ContentItem>>;
    async fn popular_tv_shows(&self, page: u32) -> CatalogResult<Page<ContentItem>>;
    async fn top_rated_movies(&self, page: u32) -> CatalogResult<Page<ContentItem>>;
    async fn trending_all_week(&self, page: u32) -> CatalogResult<Page<ContentItem>>;
    async fn search_content(&self, query: &str, page: u32) -> CatalogResult<Page<ContentItem>>;
    async fn movie_details(&self, id: u64) -> CatalogResult<Movie>;
    async fn tv_show_details(&self, id: u64) -> CatalogResult<TvShow>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    search_policy: SearchPolicy,
    cache: ResponseCache,
}

impl TmdbClient {
    /// A missing or blank `api_key` is accepted here; every call then fails
    /// with [`CatalogError::Configuration`] before touching the network.
    pub fn new(base_url: Url, api_key: Option<String>) -> anyhow::Result<Self> {
        let user_agent = format!("flickpick/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            base_url: with_trailing_slash(base_url),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            search_policy: SearchPolicy::default(),
            cache: ResponseCache::disabled(),
        })
    }

    pub fn with_search_policy(mut self, policy: SearchPolicy) -> Self {
        self.search_policy = policy;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = ResponseCache::new(ttl);
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_tagged<T, F>(
        &self,
        path: &str,
        page: u32,
        tag: F,
    ) -> CatalogResult<Page<ContentItem>>
    where
        T: DeserializeOwned,
        F: Fn(T) -> ContentItem,
    {
        let data: Page<T> = self.get_json(path, &[("page", page.to_string())]).await?;
        Ok(data.map_results(tag))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> CatalogResult<T> {
        let api_key = self.api_key.as_deref().ok_or(CatalogError::Configuration)?;

        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| CatalogError::Transport(format!("invalid catalog path '{}': {}", path, e)))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("language", LANGUAGE);
            for (k, v) in params {
                query.append_pair(k, v);
            }
        }

        let key = url.to_string();
        if let Some(body) = self.cache.get(&key).await {
            debug!(url = %url, "Catalog cache hit");
            return parse_body(&body);
        }

        debug!(url = %url, "Catalog request");
        let res = self
            .client
            .get(url.clone())
            .bearer_auth(api_key)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!("Network error fetching {}: {}", url, e);
                CatalogError::Transport(e.to_string())
            })?;

        let status = res.status();
        if !status.is_success() {
            let body = res
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            error!("Error fetching {}: {} -> {}", url, status, body);
            return Err(CatalogError::Upstream {
                status: status.as_u16(),
                status_text: status_text(status),
            });
        }

        let text = res.text().await.map_err(|e| {
            error!("Failed reading body from {}: {}", url, e);
            CatalogError::Transport(format!("reading body failed: {}", e))
        })?;
        let parsed = parse_body(&text)?;
        self.cache.insert(key, Arc::from(text)).await;
        Ok(parsed)
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn popular_movies(&self, page: u32) -> CatalogResult<Page<ContentItem>> {
        self.fetch_tagged::<Movie, _>("movie/popular", page, ContentItem::Movie)
            .await
    }

    async fn popular_tv_shows(&self, page: u32) -> CatalogResult<Page<ContentItem>> {
        self.fetch_tagged::<TvShow, _>("tv/popular", page, ContentItem::Tv)
            .await
    }

    async fn top_rated_movies(&self, page: u32) -> CatalogResult<Page<ContentItem>> {
        self.fetch_tagged::<Movie, _>("movie/top_rated", page, ContentItem::Movie)
            .await
    }

    async fn trending_all_week(&self, page: u32) -> CatalogResult<Page<ContentItem>> {
        let data: Page<Value> = self
            .get_json("trending/all/week", &[("page", page.to_string())])
            .await?;
        Ok(data.filter_map_results(content_item_from_value))
    }

    async fn search_content(&self, query: &str, page: u32) -> CatalogResult<Page<ContentItem>> {
        let data: Page<Value> = self
            .get_json(
                "search/multi",
                &[
                    ("query", query.to_string()),
                    ("page", page.to_string()),
                    ("include_adult", "false".to_string()),
                ],
            )
            .await?;
        let policy = self.search_policy;
        Ok(data.filter_map_results(|v| {
            content_item_from_value(v).filter(|item| policy.keeps(item))
        }))
    }

    async fn movie_details(&self, id: u64) -> CatalogResult<Movie> {
        self.get_json(
            &format!("movie/{id}"),
            &[("append_to_response", DETAIL_EXPANSION.to_string())],
        )
        .await
    }

    async fn tv_show_details(&self, id: u64) -> CatalogResult<TvShow> {
        self.get_json(
            &format!("tv/{id}"),
            &[("append_to_response", DETAIL_EXPANSION.to_string())],
        )
        .await
    }
}

fn parse_body<T: DeserializeOwned>(text: &str) -> CatalogResult<T> {
    serde_json::from_str(text).map_err(|e| CatalogError::Transport(format!("JSON parse failed: {}", e)))
}

/// Reads the catalog's own `media_type` field; people and untagged entries
/// are dropped.
fn content_item_from_value(value: Value) -> Option<ContentItem> {
    let kind: MediaType = value.get("media_type")?.as_str()?.parse().ok()?;
    match serde_json::from_value::<ContentItem>(value) {
        Ok(item) => Some(item),
        Err(e) => {
            warn!("Skipping malformed {} entry: {}", kind, e);
            None
        }
    }
}

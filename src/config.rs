use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::recommend::{DEFAULT_GEMINI_BASE, DEFAULT_GEMINI_MODEL};
use crate::tmdb::{SearchPolicy, DEFAULT_TMDB_BASE};

const DEFAULT_ADDR: &str = "0.0.0.0:9002";
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: Url,
    pub cache_ttl: Duration,
    pub search_policy: SearchPolicy,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: Url,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let tmdb_api_key = get("TMDB_API_KEY");
        let tmdb_base_url = parse_base_url(
            "TMDB_BASE_URL",
            get("TMDB_BASE_URL").as_deref().unwrap_or(DEFAULT_TMDB_BASE),
        )?;
        let cache_ttl = match get("TMDB_CACHE_TTL_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .with_context(|| format!("TMDB_CACHE_TTL_SECS must be a number of seconds, got '{}'", raw))?,
            ),
            None => Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        };
        let search_policy = match get("SEARCH_INCLUDE_POSTERLESS") {
            Some(raw) => {
                if parse_bool("SEARCH_INCLUDE_POSTERLESS", &raw)? {
                    SearchPolicy::AllowPosterless
                } else {
                    SearchPolicy::RequirePoster
                }
            }
            None => SearchPolicy::default(),
        };
        let gemini_api_key = get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY"));
        let gemini_model = get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let gemini_base_url = parse_base_url(
            "GEMINI_BASE_URL",
            get("GEMINI_BASE_URL").as_deref().unwrap_or(DEFAULT_GEMINI_BASE),
        )?;
        let bind_addr = get("FLICKPICK_ADDR")
            .as_deref()
            .unwrap_or(DEFAULT_ADDR)
            .parse::<SocketAddr>()
            .context("FLICKPICK_ADDR must be a socket address such as 0.0.0.0:9002")?;

        Ok(Self {
            tmdb_api_key,
            tmdb_base_url,
            cache_ttl,
            search_policy,
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            bind_addr,
        })
    }

    /// Missing credentials are not fatal; the affected calls fail on first use.
    pub fn log_summary(&self) {
        if self.tmdb_api_key.is_none() {
            warn!("TMDB_API_KEY is not set; catalog requests will fail until it is configured and the server restarted");
        } else {
            info!("TMDB credential found");
        }
        if self.gemini_api_key.is_none() {
            warn!("GEMINI_API_KEY is not set; recommendations are unavailable");
        }
        info!(
            "Catalog base {} (cache ttl {}s, search policy {:?})",
            self.tmdb_base_url,
            self.cache_ttl.as_secs(),
            self.search_policy
        );
    }
}

/// Base URLs are joined with relative paths, so they must end in `/`.
pub(crate) fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn parse_base_url(key: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("{} is not a valid URL: '{}'", key, raw))?;
    Ok(with_trailing_slash(url))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{} must be true or false, got '{}'", key, raw),
    }
}

use crate::inline::MAX_ASSET_BYTES;
use crate::ResolveError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_CACHE_CAPACITY: usize = 10;
pub const DEFAULT_COOLDOWN_MS: u64 = 2000;
pub const DEFAULT_FALLBACK_FAVICON: &str = "/favicon-light.svg";

/// Base URLs of every external service the resolver talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub primary: String,
    pub secondary: String,
    pub oembed: String,
    pub relay: String,
    pub favicon_lookup: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            primary: "https://api.microlink.io/".into(),
            secondary: "https://jsonlink.io/api/extract".into(),
            oembed: "https://www.youtube.com/oembed".into(),
            relay: "https://api.allorigins.win/raw".into(),
            favicon_lookup: "https://www.google.com/s2/favicons".into(),
        }
    }
}

impl Endpoints {
    pub fn primary_url(&self, target: &str) -> Result<String, ResolveError> {
        with_params(&self.primary, &[("url", target)])
    }

    pub fn secondary_url(&self, target: &str) -> Result<String, ResolveError> {
        with_params(&self.secondary, &[("url", target)])
    }

    pub fn relay_url(&self, target: &str) -> Result<String, ResolveError> {
        with_params(&self.relay, &[("url", target)])
    }

    pub fn oembed_url(&self, video_id: &str) -> Result<String, ResolveError> {
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        with_params(&self.oembed, &[("url", watch_url.as_str()), ("format", "json")])
    }

    pub fn favicon_lookup_url(&self, domain: &str) -> Result<String, ResolveError> {
        with_params(&self.favicon_lookup, &[("domain", domain), ("sz", "64")])
    }
}

fn with_params(base: &str, params: &[(&str, &str)]) -> Result<String, ResolveError> {
    Ok(Url::parse_with_params(base, params)?.into())
}

/// Settings for a [`ResolverSession`](crate::ResolverSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub cache_capacity: usize,
    pub cooldown_ms: u64,
    pub endpoints: Endpoints,
    pub fallback_favicon: String,
    /// Image and icon bodies larger than this are not inlined.
    pub max_asset_bytes: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            endpoints: Endpoints::default(),
            fallback_favicon: DEFAULT_FALLBACK_FAVICON.into(),
            max_asset_bytes: MAX_ASSET_BYTES,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, ResolveError> {
        serde_json::from_str(json).map_err(|e| ResolveError::DecodeError(e.to_string()))
    }

    /// Defaults overlaid with `LINKCARD_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Applies `LINKCARD_CACHE_CAPACITY`, `LINKCARD_COOLDOWN_MS` and
    /// `LINKCARD_FALLBACK_FAVICON`; unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(capacity) = lookup("LINKCARD_CACHE_CAPACITY").and_then(|v| v.parse().ok()) {
            self.cache_capacity = capacity;
        }
        if let Some(cooldown) = lookup("LINKCARD_COOLDOWN_MS").and_then(|v| v.parse().ok()) {
            self.cooldown_ms = cooldown;
        }
        if let Some(favicon) = lookup("LINKCARD_FALLBACK_FAVICON").filter(|v| !v.is_empty()) {
            self.fallback_favicon = favicon;
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown_ms = cooldown.as_millis() as u64;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_fallback_favicon(mut self, favicon: impl Into<String>) -> Self {
        self.fallback_favicon = favicon.into();
        self
    }

    pub fn with_max_asset_bytes(mut self, max_asset_bytes: usize) -> Self {
        self.max_asset_bytes = max_asset_bytes;
        self
    }
}

use crate::config::{Endpoints, ResolverConfig};
use crate::fetcher::{Fetcher, Transport};
use crate::normalize::{normalize, NormalizedLink};
use crate::oembed::{fetch_side_data, music_video_id, SideData};
use crate::sources::{JsonLinkSource, MetadataSource, MicrolinkSource, RawMetadata, ScrapeSource};
use crate::utils::{has_http_scheme, hostname_of};
use crate::{
    AssetInliner, FifoCache, LinkData, LinkResolver, RateLimiter, ResolveError, Template,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Description used when only oEmbed side data could be obtained.
pub const MUSIC_FALLBACK_DESCRIPTION: &str = "YouTube Music";

/// ResolverSession owns everything that outlives a single resolution: the
/// result cache, the dispatch cooldown and the ordered source chain.
///
/// Construct one per process and share it by reference (or `Arc`).
pub struct ResolverSession {
    transport: Arc<dyn Transport>,
    sources: Vec<Box<dyn MetadataSource>>,
    endpoints: Endpoints,
    inliner: AssetInliner,
    cache: FifoCache,
    rate_limiter: RateLimiter,
}

impl Default for ResolverSession {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl ResolverSession {
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_transport(config, Arc::new(Fetcher::new()))
    }

    pub fn with_transport(config: ResolverConfig, transport: Arc<dyn Transport>) -> Self {
        debug!(
            cache_capacity = config.cache_capacity,
            cooldown_ms = config.cooldown_ms,
            "Initializing ResolverSession"
        );

        let endpoints = config.endpoints.clone();
        let sources: Vec<Box<dyn MetadataSource>> = vec![
            Box::new(MicrolinkSource::new(endpoints.clone())),
            Box::new(JsonLinkSource::new(endpoints.clone())),
            Box::new(ScrapeSource::new(endpoints.clone())),
        ];

        Self {
            transport,
            sources,
            inliner: AssetInliner::new(endpoints.clone(), config.fallback_favicon.clone())
                .with_max_asset_bytes(config.max_asset_bytes),
            endpoints,
            cache: FifoCache::new(config.cache_capacity),
            rate_limiter: RateLimiter::new(config.cooldown()),
        }
    }

    /// Replaces the fallback chain. Sources are tried in the given order.
    pub fn with_sources(mut self, sources: Vec<Box<dyn MetadataSource>>) -> Self {
        self.sources = sources;
        self
    }

    pub fn cache(&self) -> &FifoCache {
        &self.cache
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn resolve(&self, url: &str) -> Result<LinkData, ResolveError> {
        let url = url.trim();
        let domain = validate(url)?;

        if let Some(cached) = self.cache.get(url) {
            debug!(url = %url, "Cache hit");
            return Ok(cached);
        }

        self.rate_limiter.try_acquire()?;

        let link = self.dispatch(url, &domain).await?;
        self.cache.insert(url.to_string(), link.clone());
        Ok(link)
    }

    async fn dispatch(&self, url: &str, domain: &str) -> Result<LinkData, ResolveError> {
        let transport = self.transport.as_ref();

        let side = match music_video_id(url) {
            Some(video_id) => match fetch_side_data(transport, &self.endpoints, &video_id).await {
                Ok(side) => Some(side),
                Err(e) => {
                    warn!(url = %url, error = %e, "oEmbed side data unavailable");
                    None
                }
            },
            None => None,
        };

        for source in &self.sources {
            match source.fetch(transport, url).await {
                Ok(raw) => {
                    let normalized = normalize(url, raw, side.as_ref());
                    info!(
                        url = %url,
                        source = source.name(),
                        template = %normalized.template,
                        "Resolved link metadata"
                    );
                    return Ok(self.finish(url, domain, normalized).await);
                }
                Err(e) => ResolveError::source_failed(source.name(), &e).log(),
            }
        }

        match side {
            Some(side) => {
                info!(url = %url, "All sources failed, building card from side data");
                Ok(self.synthesize_from_side_data(url, domain, side).await)
            }
            None => {
                let err = ResolveError::AllSourcesFailed;
                err.log();
                Err(err)
            }
        }
    }

    /// Inlines the image and favicon, concurrently.
    async fn finish(&self, url: &str, domain: &str, link: NormalizedLink) -> LinkData {
        let transport = self.transport.as_ref();
        let (image, favicon) = futures::join!(
            self.inliner
                .inline_image(transport, link.image_url.as_deref()),
            self.inliner
                .inline_favicon(transport, link.favicon_url.as_deref(), domain),
        );

        LinkData {
            url: url.to_string(),
            title: link.title,
            description: link.description,
            author: link.author,
            image,
            favicon,
            domain: domain.to_string(),
            template: link.template,
        }
    }

    async fn synthesize_from_side_data(&self, url: &str, domain: &str, side: SideData) -> LinkData {
        let raw = RawMetadata {
            description: Some(MUSIC_FALLBACK_DESCRIPTION.to_string()),
            ..RawMetadata::default()
        };
        let link = normalize(url, raw, Some(&side));
        let image = self
            .inliner
            .inline_image(self.transport.as_ref(), link.image_url.as_deref())
            .await;

        LinkData {
            url: url.to_string(),
            title: link.title,
            description: link.description,
            author: link.author,
            image,
            favicon: self.inliner.fallback_favicon().to_string(),
            domain: domain.to_string(),
            template: Template::Music,
        }
    }
}

#[async_trait]
impl LinkResolver for ResolverSession {
    async fn resolve(&self, url: &str) -> Result<LinkData, ResolveError> {
        ResolverSession::resolve(self, url).await
    }
}

/// Scheme check and host extraction; no I/O.
fn validate(url: &str) -> Result<String, ResolveError> {
    if !has_http_scheme(url) {
        let err = ResolveError::InvalidUrl(format!("{url}: use http:// or https://"));
        err.log();
        return Err(err);
    }
    hostname_of(url).ok_or_else(|| {
        let err = ResolveError::InvalidUrl(format!("{url}: no host"));
        err.log();
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert_eq!(validate("https://news.example.com/a").unwrap(), "news.example.com");
        assert_eq!(validate("HTTP://Example.com").unwrap(), "example.com");
        assert!(matches!(validate("ftp://example.com"), Err(ResolveError::InvalidUrl(_))));
        assert!(matches!(validate("example.com"), Err(ResolveError::InvalidUrl(_))));
        assert!(matches!(validate("https://"), Err(ResolveError::InvalidUrl(_))));
    }

    #[test]
    fn test_default_chain_order() {
        let session = ResolverSession::default();
        assert_eq!(session.source_names(), vec!["primary", "secondary", "scrape"]);
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

mod cache;
mod card;
mod config;
mod error;
mod extractor;
mod fetcher;
mod inline;
mod logging;
mod normalize;
mod oembed;
mod rate_limit;
mod resolver;
mod sources;
mod utils;

pub use cache::FifoCache;
pub use card::{
    export_card, export_file_name, parse_scale, CardLayout, CardView, ExportRequest, Platform,
    Snapshotter,
};
pub use config::{Endpoints, ResolverConfig};
pub use error::ResolveError;
pub use extractor::MetadataExtractor;
pub use fetcher::{Fetcher, FetcherConfig, HttpResponse, Transport};
pub use inline::{AssetInliner, MAX_ASSET_BYTES};
#[cfg(feature = "logging")]
pub use logging::{setup_logging, LogConfig};
pub use logging::{log_error_card, log_link_card};
pub use normalize::{
    classify_template, normalize, split_music_title, strip_topic_suffix, NormalizedLink,
    DEFAULT_DESCRIPTION, DEFAULT_TITLE,
};
pub use oembed::{music_video_id, SideData};
pub use rate_limit::RateLimiter;
pub use resolver::{ResolverSession, MUSIC_FALLBACK_DESCRIPTION};
pub use sources::{JsonLinkSource, MetadataSource, MicrolinkSource, RawMetadata, ScrapeSource};

/// Substrings that mark a URL as belonging to a music platform.
pub const MUSIC_PLATFORM_MARKERS: &[&str] = &["music.youtube", "spotify", "bandcamp", "soundcloud"];

/// Marker for music-streaming video pages that expose oEmbed side data.
pub const MUSIC_VIDEO_MARKER: &str = "music.youtube.com";

/// Card layout a resolved link is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    #[default]
    Default,
    Music,
    News,
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Template::Default => "default",
            Template::Music => "music",
            Template::News => "news",
        };
        f.write_str(name)
    }
}

/// A resolved, normalized link. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkData {
    pub url: String,
    pub title: String,
    pub description: String,
    pub author: Option<String>,
    /// `data:` URL of the preview image, or empty.
    pub image: String,
    /// `data:` URL of the site icon, or the fallback icon reference.
    pub favicon: String,
    pub domain: String,
    pub template: Template,
}

#[async_trait]
pub trait LinkResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<LinkData, ResolveError>;
}

pub fn is_music_url(url: &str) -> bool {
    MUSIC_PLATFORM_MARKERS
        .iter()
        .any(|marker| url.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_music_url() {
        assert!(is_music_url("https://open.spotify.com/track/abc"));
        assert!(is_music_url("https://music.youtube.com/watch?v=xyz"));
        assert!(is_music_url("https://artist.bandcamp.com/album/x"));
        assert!(is_music_url("https://soundcloud.com/a/b"));
        assert!(!is_music_url("https://www.youtube.com/watch?v=xyz"));
        assert!(!is_music_url("https://example.com/spot"));
    }

    #[test]
    fn test_template_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Template::Music).unwrap(), "\"music\"");
        assert_eq!(Template::News.to_string(), "news");
    }
}

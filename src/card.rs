//! View model for the three card layouts, and the export seam.
//!
//! Rendering and rasterization live outside this crate; [`Snapshotter`] is
//! where an image-snapshot backend plugs in.

use crate::{LinkData, ResolveError, Template};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

pub const UNKNOWN_ARTIST: &str = "Unknown artist";
pub const DEFAULT_EXPORT_SCALE: u32 = 2;
pub const MAX_EXPORT_SCALE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Spotify,
    YoutubeMusic,
    Youtube,
}

impl Platform {
    pub fn detect(url: &str) -> Option<Self> {
        if url.contains("spotify") {
            Some(Platform::Spotify)
        } else if url.contains("music.youtube") {
            Some(Platform::YoutubeMusic)
        } else if url.contains("youtube") || url.contains("youtu.be") {
            Some(Platform::Youtube)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", rename_all = "lowercase")]
pub enum CardLayout {
    Default {
        title: String,
        description: String,
    },
    Music {
        title: String,
        artist: String,
        platform: Option<Platform>,
    },
    News {
        headline: String,
        byline: String,
        description: String,
        source_icon: Option<String>,
    },
}

/// What the presentation layer needs to draw one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub domain: String,
    pub image: Option<String>,
    pub layout: CardLayout,
}

impl CardView {
    pub fn from_link(link: &LinkData) -> Self {
        let layout = match link.template {
            Template::Music => CardLayout::Music {
                title: link.title.clone(),
                artist: link
                    .author
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
                platform: Platform::detect(&link.url),
            },
            Template::News => CardLayout::News {
                headline: link.title.clone(),
                byline: link
                    .author
                    .as_deref()
                    .map(|a| format!("By {a}"))
                    .unwrap_or_default(),
                description: link.description.clone(),
                source_icon: Some(link.favicon.clone()).filter(|f| !f.is_empty()),
            },
            Template::Default => CardLayout::Default {
                title: link.title.clone(),
                description: link.description.clone(),
            },
        };

        Self {
            domain: link.domain.clone(),
            image: Some(link.image.clone()).filter(|i| !i.is_empty()),
            layout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRequest {
    pub scale: u32,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            scale: DEFAULT_EXPORT_SCALE,
        }
    }
}

/// Pixel-ratio from user input; anything outside 1..=4 means the default.
pub fn parse_scale(input: &str) -> u32 {
    input
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|s| (1..=MAX_EXPORT_SCALE).contains(s))
        .unwrap_or(DEFAULT_EXPORT_SCALE)
}

pub fn export_file_name(link: &LinkData, timestamp_millis: u128) -> String {
    format!("spread-{}-{}.png", link.domain, timestamp_millis)
}

/// External rasterizer: renders a card view to PNG bytes.
#[async_trait]
pub trait Snapshotter: Send + Sync {
    async fn snapshot(&self, view: &CardView, scale: u32) -> Result<Vec<u8>, ResolveError>;
}

/// Rasterizes `link` and writes the PNG into `dir`.
///
/// Every failure surfaces as [`ResolveError::ExportFailed`].
pub async fn export_card(
    snapshotter: &dyn Snapshotter,
    link: &LinkData,
    request: ExportRequest,
    dir: &Path,
) -> Result<PathBuf, ResolveError> {
    let view = CardView::from_link(link);
    let png = snapshotter
        .snapshot(&view, request.scale)
        .await
        .map_err(|e| match e {
            ResolveError::ExportFailed(_) => e,
            other => ResolveError::ExportFailed(other.to_string()),
        })?;

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let path = dir.join(export_file_name(link, millis));
    debug!(path = %path.display(), bytes = png.len(), "Writing exported card");

    tokio::fs::write(&path, &png)
        .await
        .map_err(|e| ResolveError::ExportFailed(format!("{}: {e}", path.display())))?;

    info!(path = %path.display(), scale = request.scale, "Card exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(template: Template, url: &str, author: Option<&str>) -> LinkData {
        LinkData {
            url: url.to_string(),
            title: "Title".into(),
            description: "Description".into(),
            author: author.map(String::from),
            image: String::new(),
            favicon: "data:image/png;base64,AAAA".into(),
            domain: "example.com".into(),
            template,
        }
    }

    #[test]
    fn test_music_layout() {
        let view = CardView::from_link(&link(
            Template::Music,
            "https://music.youtube.com/watch?v=1",
            None,
        ));
        assert_eq!(
            view.layout,
            CardLayout::Music {
                title: "Title".into(),
                artist: UNKNOWN_ARTIST.into(),
                platform: Some(Platform::YoutubeMusic),
            }
        );
        assert_eq!(view.image, None);
    }

    #[test]
    fn test_news_layout() {
        let view = CardView::from_link(&link(
            Template::News,
            "https://news.example.com/a",
            Some("Jane"),
        ));
        match view.layout {
            CardLayout::News {
                byline,
                source_icon,
                ..
            } => {
                assert_eq!(byline, "By Jane");
                assert_eq!(source_icon.as_deref(), Some("data:image/png;base64,AAAA"));
            }
            other => panic!("expected news layout, got {other:?}"),
        }
    }

    #[test]
    fn test_platform_detection() {
        assert_eq!(
            Platform::detect("https://open.spotify.com/x"),
            Some(Platform::Spotify)
        );
        assert_eq!(Platform::detect("https://youtu.be/x"), Some(Platform::Youtube));
        assert_eq!(Platform::detect("https://bandcamp.com/x"), None);
    }

    #[test]
    fn test_parse_scale() {
        assert_eq!(parse_scale("3"), 3);
        assert_eq!(parse_scale(" 1 "), 1);
        assert_eq!(parse_scale("0"), DEFAULT_EXPORT_SCALE);
        assert_eq!(parse_scale("9"), DEFAULT_EXPORT_SCALE);
        assert_eq!(parse_scale("big"), DEFAULT_EXPORT_SCALE);
    }

    #[test]
    fn test_export_file_name() {
        let link = link(Template::Default, "https://example.com", None);
        assert_eq!(
            export_file_name(&link, 1700000000000),
            "spread-example.com-1700000000000.png"
        );
    }
}

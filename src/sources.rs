use crate::config::Endpoints;
use crate::fetcher::Transport;
use crate::utils::non_empty;
use crate::{MetadataExtractor, ResolveError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Fields a single metadata source produced, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub image_url: Option<String>,
    pub favicon_url: Option<String>,
}

impl RawMetadata {
    /// No title and no description: nothing worth building a card from.
    pub fn is_empty_page(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }

    fn cleaned(self) -> Self {
        Self {
            title: non_empty(self.title),
            description: non_empty(self.description),
            author: non_empty(self.author),
            image_url: non_empty(self.image_url),
            favicon_url: non_empty(self.favicon_url),
        }
    }
}

/// One step of the resolver's fallback chain.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, transport: &dyn Transport, url: &str)
        -> Result<RawMetadata, ResolveError>;
}

fn require_content(source: &str, raw: RawMetadata) -> Result<RawMetadata, ResolveError> {
    let raw = raw.cleaned();
    if raw.is_empty_page() {
        return Err(ResolveError::DecodeError(format!(
            "{source} returned no title or description"
        )));
    }
    Ok(raw)
}

#[derive(Debug, Deserialize)]
struct MicrolinkEnvelope {
    status: Option<String>,
    data: Option<MicrolinkData>,
}

#[derive(Debug, Default, Deserialize)]
struct MicrolinkData {
    title: Option<String>,
    description: Option<String>,
    author: Option<String>,
    author_name: Option<String>,
    image: Option<MicrolinkAsset>,
    screenshot: Option<MicrolinkAsset>,
    logo: Option<MicrolinkAsset>,
}

#[derive(Debug, Default, Deserialize)]
struct MicrolinkAsset {
    url: Option<String>,
}

impl From<MicrolinkData> for RawMetadata {
    fn from(d: MicrolinkData) -> Self {
        RawMetadata {
            title: d.title,
            description: d.description,
            author: non_empty(d.author_name).or(d.author),
            image_url: non_empty(d.image.and_then(|a| a.url))
                .or_else(|| d.screenshot.and_then(|a| a.url)),
            favicon_url: d.logo.and_then(|a| a.url),
        }
    }
}

/// Primary provider: full page metadata in a `{status, data}` envelope.
pub struct MicrolinkSource {
    endpoints: Endpoints,
}

impl MicrolinkSource {
    pub fn new(endpoints: Endpoints) -> Self {
        Self { endpoints }
    }
}

#[async_trait]
impl MetadataSource for MicrolinkSource {
    fn name(&self) -> &'static str {
        "primary"
    }

    #[instrument(level = "debug", skip(self, transport), err)]
    async fn fetch(
        &self,
        transport: &dyn Transport,
        url: &str,
    ) -> Result<RawMetadata, ResolveError> {
        let api_url = self.endpoints.primary_url(url)?;
        let envelope: MicrolinkEnvelope =
            transport.get(&api_url).await?.error_for_status()?.json()?;

        if let Some(status) = envelope.status.as_deref() {
            if status != "success" {
                return Err(ResolveError::DecodeError(format!(
                    "primary provider reported status {status}"
                )));
            }
        }

        let data = envelope
            .data
            .ok_or_else(|| ResolveError::DecodeError("primary provider sent no data".into()))?;
        debug!(url = %url, "Primary provider answered");
        require_content(self.name(), data.into())
    }
}

#[derive(Debug, Default, Deserialize)]
struct JsonLinkResponse {
    title: Option<String>,
    description: Option<String>,
    author: Option<String>,
    images: Option<Vec<String>>,
    image: Option<String>,
    favicon: Option<String>,
}

impl From<JsonLinkResponse> for RawMetadata {
    fn from(d: JsonLinkResponse) -> Self {
        RawMetadata {
            title: d.title,
            description: d.description,
            author: d.author,
            image_url: non_empty(d.images.unwrap_or_default().into_iter().next()).or(d.image),
            favicon_url: d.favicon,
        }
    }
}

/// Secondary provider: flat schema with an `images` array.
pub struct JsonLinkSource {
    endpoints: Endpoints,
}

impl JsonLinkSource {
    pub fn new(endpoints: Endpoints) -> Self {
        Self { endpoints }
    }
}

#[async_trait]
impl MetadataSource for JsonLinkSource {
    fn name(&self) -> &'static str {
        "secondary"
    }

    #[instrument(level = "debug", skip(self, transport), err)]
    async fn fetch(
        &self,
        transport: &dyn Transport,
        url: &str,
    ) -> Result<RawMetadata, ResolveError> {
        let api_url = self.endpoints.secondary_url(url)?;
        let response: JsonLinkResponse =
            transport.get(&api_url).await?.error_for_status()?.json()?;
        debug!(url = %url, "Secondary provider answered");
        require_content(self.name(), response.into())
    }
}

/// Last network source: raw markup through the CORS relay, parsed locally.
pub struct ScrapeSource {
    endpoints: Endpoints,
    extractor: MetadataExtractor,
}

impl ScrapeSource {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            extractor: MetadataExtractor::new(),
        }
    }
}

#[async_trait]
impl MetadataSource for ScrapeSource {
    fn name(&self) -> &'static str {
        "scrape"
    }

    #[instrument(level = "debug", skip(self, transport), err)]
    async fn fetch(
        &self,
        transport: &dyn Transport,
        url: &str,
    ) -> Result<RawMetadata, ResolveError> {
        let relay_url = self.endpoints.relay_url(url)?;
        let html = transport.get(&relay_url).await?.error_for_status()?.text();
        debug!(url = %url, content_length = html.len(), "Relay returned page markup");
        require_content(self.name(), self.extractor.extract(&html, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_microlink_prefers_author_name_and_image() {
        let data: MicrolinkData = serde_json::from_str(
            r#"{
                "title": "Headline",
                "description": "Body",
                "author": "Desk",
                "author_name": "Reporter",
                "image": {"url": "https://img.example/a.png"},
                "screenshot": {"url": "https://img.example/shot.png"},
                "logo": {"url": "https://img.example/logo.png"}
            }"#,
        )
        .unwrap();
        let raw = RawMetadata::from(data);
        assert_eq!(raw.author.as_deref(), Some("Reporter"));
        assert_eq!(raw.image_url.as_deref(), Some("https://img.example/a.png"));
        assert_eq!(raw.favicon_url.as_deref(), Some("https://img.example/logo.png"));
    }

    #[test]
    fn test_microlink_screenshot_fallback() {
        let data: MicrolinkData = serde_json::from_str(
            r#"{"title": "T", "author": "Desk", "image": null,
                "screenshot": {"url": "https://img.example/shot.png"}}"#,
        )
        .unwrap();
        let raw = RawMetadata::from(data);
        assert_eq!(raw.author.as_deref(), Some("Desk"));
        assert_eq!(raw.image_url.as_deref(), Some("https://img.example/shot.png"));
    }

    #[test]
    fn test_jsonlink_first_image_wins() {
        let response: JsonLinkResponse = serde_json::from_str(
            r#"{"title": "T", "images": ["https://a/1.png", "https://a/2.png"],
                "image": "https://a/single.png", "favicon": "https://a/fav.ico"}"#,
        )
        .unwrap();
        let raw = RawMetadata::from(response);
        assert_eq!(raw.image_url.as_deref(), Some("https://a/1.png"));

        let response: JsonLinkResponse =
            serde_json::from_str(r#"{"title": "T", "image": "https://a/single.png"}"#).unwrap();
        assert_eq!(
            RawMetadata::from(response).image_url.as_deref(),
            Some("https://a/single.png")
        );
    }

    #[test]
    fn test_jsonlink_accepts_null_images() {
        let response: JsonLinkResponse = serde_json::from_str(
            r#"{"title": "T", "images": null, "image": "https://a/single.png"}"#,
        )
        .unwrap();
        assert_eq!(
            RawMetadata::from(response).image_url.as_deref(),
            Some("https://a/single.png")
        );
    }

    #[test]
    fn test_require_content_rejects_blank_result() {
        let raw = RawMetadata {
            title: Some("  ".into()),
            image_url: Some("https://a/1.png".into()),
            ..RawMetadata::default()
        };
        assert!(matches!(
            require_content("secondary", raw),
            Err(ResolveError::DecodeError(_))
        ));
    }
}

use crate::config::Endpoints;
use crate::fetcher::{HttpResponse, Transport};
use crate::ResolveError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, instrument};

const OCTET_STREAM: &str = "application/octet-stream";

/// Largest asset body that gets embedded into a card.
pub const MAX_ASSET_BYTES: usize = 10 * 1024 * 1024;

/// Turns remote image references into self-contained `data:` URLs.
#[derive(Clone)]
pub struct AssetInliner {
    endpoints: Endpoints,
    fallback_favicon: String,
    max_asset_bytes: usize,
}

impl AssetInliner {
    pub fn new(endpoints: Endpoints, fallback_favicon: impl Into<String>) -> Self {
        Self {
            endpoints,
            fallback_favicon: fallback_favicon.into(),
            max_asset_bytes: MAX_ASSET_BYTES,
        }
    }

    pub fn with_max_asset_bytes(mut self, max_asset_bytes: usize) -> Self {
        self.max_asset_bytes = max_asset_bytes;
        self
    }

    pub fn fallback_favicon(&self) -> &str {
        &self.fallback_favicon
    }

    /// Fetches `url` through the relay, then directly, and encodes the first usable body.
    #[instrument(level = "debug", skip(self, transport), err)]
    pub async fn inline(&self, transport: &dyn Transport, url: &str) -> Result<String, ResolveError> {
        if url.starts_with("data:") {
            return Ok(url.to_string());
        }

        let relayed = match self.endpoints.relay_url(url) {
            Ok(relay_url) => fetch_asset(transport, &relay_url, self.max_asset_bytes).await,
            Err(e) => Err(e),
        };

        let response = match relayed {
            Ok(response) => response,
            Err(relay_err) => {
                debug!(url = %url, error = %relay_err, "Relay asset fetch failed, trying direct");
                fetch_asset(transport, url, self.max_asset_bytes)
                    .await
                    .map_err(|e| ResolveError::AssetFetchFailed(format!("{url}: {e}")))?
            }
        };

        Ok(to_data_url(&response))
    }

    /// Inlined image, or empty when there is none or it cannot be fetched.
    pub async fn inline_image(&self, transport: &dyn Transport, image_url: Option<&str>) -> String {
        let Some(url) = image_url else {
            return String::new();
        };
        match self.inline(transport, url).await {
            Ok(data_url) => data_url,
            Err(e) => {
                e.log();
                String::new()
            }
        }
    }

    /// Inlined site icon, else the favicon lookup service's icon, else the built-in fallback.
    pub async fn inline_favicon(
        &self,
        transport: &dyn Transport,
        favicon_url: Option<&str>,
        domain: &str,
    ) -> String {
        if let Some(url) = favicon_url {
            match self.inline(transport, url).await {
                Ok(data_url) => return data_url,
                Err(e) => e.log(),
            }
        }

        let looked_up = match self.endpoints.favicon_lookup_url(domain) {
            Ok(lookup_url) => self.inline(transport, &lookup_url).await,
            Err(e) => Err(e),
        };

        looked_up.unwrap_or_else(|e| {
            e.log();
            self.fallback_favicon.clone()
        })
    }
}

async fn fetch_asset(
    transport: &dyn Transport,
    url: &str,
    max_bytes: usize,
) -> Result<HttpResponse, ResolveError> {
    let response = transport.get(url).await?.error_for_status()?;
    if response.body.is_empty() {
        return Err(ResolveError::AssetFetchFailed(format!("{url}: empty body")));
    }
    if response.body.len() > max_bytes {
        return Err(ResolveError::AssetFetchFailed(format!(
            "{url}: {} bytes exceeds the {max_bytes} byte limit",
            response.body.len()
        )));
    }
    if response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("text/html"))
    {
        return Err(ResolveError::AssetFetchFailed(format!(
            "{url}: got a page instead of an image"
        )));
    }
    Ok(response)
}

fn to_data_url(response: &HttpResponse) -> String {
    let declared = response
        .content_type
        .as_deref()
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != OCTET_STREAM);

    let mime = declared
        .or_else(|| sniff_mime(&response.body).map(String::from))
        .unwrap_or_else(|| OCTET_STREAM.to_string());

    format!("data:{mime};base64,{}", STANDARD.encode(&response.body))
}

/// Image type from magic bytes.
fn sniff_mime(body: &[u8]) -> Option<&'static str> {
    if body.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("image/png")
    } else if body.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if body.starts_with(b"GIF8") {
        Some("image/gif")
    } else if body.len() >= 12 && &body[..4] == b"RIFF" && &body[8..12] == b"WEBP" {
        Some("image/webp")
    } else if body.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
        Some("image/x-icon")
    } else {
        let head = String::from_utf8_lossy(&body[..body.len().min(256)]);
        let head = head.trim_start();
        if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
            Some("image/svg+xml")
        } else {
            None
        }
    }
}

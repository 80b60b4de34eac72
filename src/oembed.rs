use crate::config::Endpoints;
use crate::fetcher::Transport;
use crate::normalize::strip_topic_suffix;
use crate::utils::non_empty;
use crate::{ResolveError, MUSIC_VIDEO_MARKER};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
    thumbnail_url: Option<String>,
}

/// Lightweight metadata for music-streaming video links.
///
/// When present it overrides whatever the providers report for title,
/// author and image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideData {
    pub title: Option<String>,
    pub author: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Video id of a music-streaming video URL, if it is one.
pub fn music_video_id(url: &str) -> Option<String> {
    if !url.contains(MUSIC_VIDEO_MARKER) {
        return None;
    }
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
}

#[instrument(level = "debug", skip(transport, endpoints), err)]
pub(crate) async fn fetch_side_data(
    transport: &dyn Transport,
    endpoints: &Endpoints,
    video_id: &str,
) -> Result<SideData, ResolveError> {
    let oembed_url = endpoints.oembed_url(video_id)?;
    let response: OEmbedResponse = transport
        .get(&oembed_url)
        .await?
        .error_for_status()?
        .json()?;

    debug!(video_id = %video_id, "Fetched oEmbed side data");
    Ok(SideData {
        title: non_empty(response.title),
        author: non_empty(response.author_name).map(|a| strip_topic_suffix(&a)),
        thumbnail_url: non_empty(response.thumbnail_url),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_music_video_id() {
        assert_eq!(
            music_video_id("https://music.youtube.com/watch?v=dQw4w9WgXcQ&list=RD").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(music_video_id("https://music.youtube.com/browse/abc"), None);
        assert_eq!(music_video_id("https://music.youtube.com/watch?v="), None);
        assert_eq!(music_video_id("https://www.youtube.com/watch?v=abc"), None);
    }
}

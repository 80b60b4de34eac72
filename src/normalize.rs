//! Source-independent cleanup and template classification.

use crate::oembed::SideData;
use crate::sources::RawMetadata;
use crate::utils::non_empty;
use crate::{is_music_url, Template};

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_DESCRIPTION: &str = "No description available";

const TOPIC_SUFFIX: &str = " - Topic";
const SPACED_SEPARATORS: &[&str] = &[" - ", " – ", " — ", " | "];
const SEPARATOR_CHARS: &[char] = &['-', '–', '—', '|'];

/// Card fields with asset references still pointing at the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLink {
    pub title: String,
    pub description: String,
    pub author: Option<String>,
    pub image_url: Option<String>,
    pub favicon_url: Option<String>,
    pub template: Template,
}

/// Removes the auto-generated channel suffix from an author name.
pub fn strip_topic_suffix(author: &str) -> String {
    let author = author.trim();
    author
        .strip_suffix(TOPIC_SUFFIX)
        .unwrap_or(author)
        .trim_end()
        .to_string()
}

pub fn classify_template(url: &str, has_side_data: bool, author: Option<&str>) -> Template {
    if has_side_data || is_music_url(url) {
        Template::Music
    } else if author.is_some_and(|a| !a.trim().is_empty()) {
        Template::News
    } else {
        Template::Default
    }
}

/// Splits `"Artist - Song"` into `("Artist", "Song")` on the first separator.
///
/// Space-padded separators win over bare ones, so hyphenated names survive
/// when a spaced separator is present.
pub fn split_music_title(title: &str) -> Option<(String, String)> {
    let (index, len) = SPACED_SEPARATORS
        .iter()
        .filter_map(|sep| title.find(sep).map(|i| (i, sep.len())))
        .min_by_key(|(i, _)| *i)
        .or_else(|| {
            title
                .char_indices()
                .find(|(_, c)| SEPARATOR_CHARS.contains(c))
                .map(|(i, c)| (i, c.len_utf8()))
        })?;

    let left = title[..index].trim();
    let right = title[index + len..].trim();
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some((left.to_string(), right.to_string()))
}

/// Applies side-data overrides, defaults and classification to one source's output.
pub fn normalize(url: &str, raw: RawMetadata, side: Option<&SideData>) -> NormalizedLink {
    let mut title = non_empty(raw.title);
    let mut author = non_empty(raw.author);
    let mut image_url = non_empty(raw.image_url);

    if let Some(side) = side {
        if let Some(side_title) = &side.title {
            title = Some(side_title.clone());
        }
        if let Some(side_author) = &side.author {
            author = Some(side_author.clone());
        }
        if let Some(thumbnail) = &side.thumbnail_url {
            image_url = Some(thumbnail.clone());
        }
    }

    let mut author = author
        .map(|a| strip_topic_suffix(&a))
        .filter(|a| !a.is_empty());
    let mut title = title.unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let template = classify_template(url, side.is_some(), author.as_deref());
    if template == Template::Music {
        if let Some((artist, song)) = split_music_title(&title) {
            author = Some(artist);
            title = song;
        }
    }

    NormalizedLink {
        title,
        description: non_empty(raw.description).unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        author,
        image_url,
        favicon_url: non_empty(raw.favicon_url),
        template,
    }
}

use crate::sources::RawMetadata;
use crate::utils;
use scraper::{Html, Selector};
use tracing::debug;

/// Metadata extractor, responsible for pulling card fields out of raw page markup
#[derive(Clone)]
pub struct MetadataExtractor;

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Reads Open Graph, Twitter Card and generic meta tags.
    ///
    /// Image and icon references are resolved against `url`.
    pub fn extract(&self, html: &str, url: &str) -> RawMetadata {
        let document = Html::parse_document(html);

        let title = self.extract_title(&document);
        let description = self.extract_description(&document);
        let author = self.extract_author(&document);
        let image_url = self
            .extract_image(&document)
            .and_then(|href| utils::absolutize(url, &href));
        let favicon_url = self
            .extract_favicon(&document)
            .and_then(|href| utils::absolutize(url, &href));

        debug!(
            url = %url,
            has_title = title.is_some(),
            has_description = description.is_some(),
            has_author = author.is_some(),
            has_image = image_url.is_some(),
            "Extracted page metadata"
        );

        RawMetadata {
            title,
            description,
            author,
            image_url,
            favicon_url,
        }
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        first_meta_content(
            document,
            &["meta[property='og:title']", "meta[name='twitter:title']"],
        )
        .or_else(|| {
            let title_selector = Selector::parse("title").ok()?;
            document
                .select(&title_selector)
                .next()
                .map(|el| el.text().collect::<String>())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
    }

    fn extract_description(&self, document: &Html) -> Option<String> {
        first_meta_content(
            document,
            &[
                "meta[property='og:description']",
                "meta[name='twitter:description']",
                "meta[name='description']",
            ],
        )
    }

    fn extract_author(&self, document: &Html) -> Option<String> {
        first_meta_content(
            document,
            &[
                "meta[name='author']",
                "meta[property='article:author']",
                "meta[name='twitter:creator']",
            ],
        )
    }

    fn extract_image(&self, document: &Html) -> Option<String> {
        first_meta_content(
            document,
            &[
                "meta[property='og:image']",
                "meta[property='og:image:url']",
                "meta[name='twitter:image']",
                "meta[itemprop='image']",
            ],
        )
    }

    fn extract_favicon(&self, document: &Html) -> Option<String> {
        let favicon_selector = Selector::parse(
            "link[rel='icon'], link[rel='shortcut icon'], link[rel='apple-touch-icon']",
        )
        .ok()?;

        document
            .select(&favicon_selector)
            .filter_map(|el| el.value().attr("href"))
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
    }
}

/// Content of the first matching tag, trying selectors in priority order.
fn first_meta_content(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        let selector = Selector::parse(selector).ok()?;
        document
            .select(&selector)
            .filter_map(|el| el.value().attr("content"))
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head>
            <title>  Fallback Title </title>
            <meta name="twitter:title" content="Twitter Title">
            <meta property="og:title" content="OG Title">
            <meta name="description" content="Plain description">
            <meta name="twitter:description" content="Twitter description">
            <meta name="author" content="Jane Reporter">
            <meta name="twitter:image" content="https://cdn.example.com/tw.png">
            <meta property="og:image" content="/images/og.png">
            <link rel="icon" href="/favicon.ico">
        </head><body></body></html>
    "#;

    #[test]
    fn test_og_tags_take_priority() {
        let raw = MetadataExtractor::new().extract(PAGE, "https://example.com/post/1");
        assert_eq!(raw.title.as_deref(), Some("OG Title"));
        assert_eq!(raw.description.as_deref(), Some("Twitter description"));
        assert_eq!(raw.author.as_deref(), Some("Jane Reporter"));
        assert_eq!(
            raw.image_url.as_deref(),
            Some("https://example.com/images/og.png")
        );
        assert_eq!(
            raw.favicon_url.as_deref(),
            Some("https://example.com/favicon.ico")
        );
    }

    #[test]
    fn test_generic_fallbacks() {
        let html = r#"<html><head>
            <title>Only Title</title>
            <meta name="description" content="Only description">
            <meta name="twitter:creator" content="@handle">
            <meta itemprop="image" content="https://img.example.com/a.jpg">
        </head></html>"#;
        let raw = MetadataExtractor::new().extract(html, "https://example.com/");
        assert_eq!(raw.title.as_deref(), Some("Only Title"));
        assert_eq!(raw.description.as_deref(), Some("Only description"));
        assert_eq!(raw.author.as_deref(), Some("@handle"));
        assert_eq!(
            raw.image_url.as_deref(),
            Some("https://img.example.com/a.jpg")
        );
        assert_eq!(raw.favicon_url, None);
    }

    #[test]
    fn test_empty_content_is_skipped() {
        let html = r#"<html><head>
            <meta property="og:title" content="   ">
            <title>Real Title</title>
        </head></html>"#;
        let raw = MetadataExtractor::new().extract(html, "https://example.com/");
        assert_eq!(raw.title.as_deref(), Some("Real Title"));
        assert!(!raw.is_empty_page());
    }

    #[test]
    fn test_blank_page_has_no_metadata() {
        let raw = MetadataExtractor::new().extract("<html></html>", "https://example.com/");
        assert!(raw.is_empty_page());
    }
}

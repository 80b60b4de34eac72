#![allow(dead_code)]

use async_trait::async_trait;
use link_card::{Endpoints, HttpResponse, ResolveError, ResolverConfig, ResolverSession, Transport};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub enum MockReply {
    Json(&'static str),
    Html(String),
    Bytes(&'static str, Vec<u8>),
    Status(u16),
}

/// In-memory transport: first route whose prefix matches the requested URL answers.
/// Unmatched URLs fail like a refused connection.
#[derive(Default)]
pub struct MockTransport {
    routes: Vec<(String, MockReply)>,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, prefix: impl Into<String>, reply: MockReply) -> Self {
        self.routes.push((prefix.into(), reply));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, ResolveError> {
        self.calls.lock().unwrap().push(url.to_string());

        let reply = self
            .routes
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply)
            .ok_or_else(|| ResolveError::FetchError(format!("connection refused: {url}")))?;

        let (status, content_type, body) = match reply {
            MockReply::Json(json) => (200, Some("application/json"), json.as_bytes().to_vec()),
            MockReply::Html(html) => (200, Some("text/html"), html.as_bytes().to_vec()),
            MockReply::Bytes(content_type, bytes) => (200, Some(*content_type), bytes.clone()),
            MockReply::Status(status) => (*status, None, Vec::new()),
        };

        Ok(HttpResponse {
            url: url.to_string(),
            status,
            content_type: content_type.map(String::from),
            body,
        })
    }
}

pub const PRIMARY: &str = "http://primary.test/";
pub const SECONDARY: &str = "http://secondary.test/extract";
pub const OEMBED: &str = "http://oembed.test/oembed";
pub const RELAY: &str = "http://relay.test/raw";
pub const FAVICONS: &str = "http://favicons.test/s2";

pub const FALLBACK_FAVICON: &str = "/favicon-light.svg";

pub fn endpoints() -> Endpoints {
    Endpoints {
        primary: PRIMARY.into(),
        secondary: SECONDARY.into(),
        oembed: OEMBED.into(),
        relay: RELAY.into(),
        favicon_lookup: FAVICONS.into(),
    }
}

pub fn config() -> ResolverConfig {
    ResolverConfig::default()
        .with_endpoints(endpoints())
        .with_fallback_favicon(FALLBACK_FAVICON)
}

pub fn session(transport: Arc<MockTransport>) -> ResolverSession {
    ResolverSession::with_transport(config(), transport)
}

pub fn session_without_cooldown(transport: Arc<MockTransport>) -> ResolverSession {
    ResolverSession::with_transport(config().with_cooldown(Duration::ZERO), transport)
}

pub fn primary_for(target: &str) -> String {
    endpoints().primary_url(target).unwrap()
}

pub fn secondary_for(target: &str) -> String {
    endpoints().secondary_url(target).unwrap()
}

pub fn relay_for(target: &str) -> String {
    endpoints().relay_url(target).unwrap()
}

pub fn tiny_png() -> Vec<u8> {
    vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x01]
}

//! URL request interception.
//!
//! Every request an engine view is about to issue passes through an
//! interceptor first. A blocked request never reaches the network.

use std::sync::Arc;

use dw_blocklist::Blocklist;

use url::Url;

/// One request about to leave an engine view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRequestInfo {
    pub url: String,
    /// `host` or `host:port`, with scheme-default ports elided. Empty when
    /// the URL does not parse or has no host.
    pub authority: String,
}

impl UrlRequestInfo {
    pub fn for_url(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            authority: request_authority(url),
        }
    }
}

/// Verdict on a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDecision {
    Allow,
    Block,
}

impl RequestDecision {
    pub fn is_blocked(self) -> bool {
        matches!(self, Self::Block)
    }
}

/// Decides whether a request may proceed.
///
/// Called on the engine's request path, so implementations must decide
/// immediately from data they already hold. No blocking work here.
pub trait UrlRequestInterceptor {
    fn decide(&self, request: &UrlRequestInfo) -> RequestDecision;
}

/// Interceptor that lets every request through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllInterceptor;

impl UrlRequestInterceptor for AllowAllInterceptor {
    fn decide(&self, _request: &UrlRequestInfo) -> RequestDecision {
        RequestDecision::Allow
    }
}

/// Interceptor that blocks requests whose authority is blocklisted.
#[derive(Debug, Clone)]
pub struct BlocklistInterceptor {
    blocklist: Arc<Blocklist>,
}

impl BlocklistInterceptor {
    pub fn new(blocklist: Arc<Blocklist>) -> Self {
        Self { blocklist }
    }
}

impl UrlRequestInterceptor for BlocklistInterceptor {
    fn decide(&self, request: &UrlRequestInfo) -> RequestDecision {
        if self.blocklist.is_blocked(&request.authority) {
            RequestDecision::Block
        } else {
            RequestDecision::Allow
        }
    }
}

/// Extracts `host` or `host:port` from a URL string.
///
/// The url crate already drops ports that match the scheme default, so
/// `https://example.com:443/` and `https://example.com/` agree here.
pub fn request_authority(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };
    let Some(host) = parsed.host_str() else {
        return String::new();
    };
    match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    }
}

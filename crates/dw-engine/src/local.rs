//! Engine view backed by local documents.
//!
//! [`LocalDocumentEngine`] serves `about:` and `file:` URLs without a network
//! stack. Loads complete synchronously, but their outcomes still arrive as
//! queued [`EngineEvent`]s so callers drive this engine exactly like an
//! asynchronous one.

use std::collections::VecDeque;
use std::fs;

use crate::intercept::AllowAllInterceptor;
use crate::intercept::UrlRequestInfo;
use crate::intercept::UrlRequestInterceptor;
use crate::view::EngineEvent;
use crate::view::EngineView;
use crate::view::SnapshotId;

use dw_html::Document;

use encoding_rs::Encoding;

use url::Url;

struct LoadedPage {
    html: String,
    title: Option<String>,
}

/// Synchronous engine view for pages that live on this machine.
///
/// Every load, including reloads and history traversal, goes through the
/// interceptor before the document is touched. A blocked load leaves the
/// current page and history untouched.
pub struct LocalDocumentEngine {
    interceptor: Box<dyn UrlRequestInterceptor>,
    history: Vec<String>,
    history_index: Option<usize>,
    current_url: Option<String>,
    title: Option<String>,
    html: String,
    next_snapshot: u64,
    events: VecDeque<EngineEvent>,
}

impl LocalDocumentEngine {
    pub fn new(interceptor: Box<dyn UrlRequestInterceptor>) -> Self {
        Self {
            interceptor,
            history: Vec::new(),
            history_index: None,
            current_url: None,
            title: None,
            html: String::new(),
            next_snapshot: 1,
            events: VecDeque::new(),
        }
    }

    fn start_load(&mut self, url: &str, add_to_history: bool) {
        let request = UrlRequestInfo::for_url(url);
        if self.interceptor.decide(&request).is_blocked() {
            self.events.push_back(EngineEvent::RequestBlocked {
                url: url.to_owned(),
            });
            self.events.push_back(EngineEvent::LoadFinished {
                result: Err(format!("blocked request to '{url}'")),
            });
            return;
        }

        match load_document(url) {
            Ok(page) => {
                if add_to_history {
                    self.push_history(url.to_owned());
                }
                self.current_url = Some(url.to_owned());
                self.title = page.title.clone();
                self.html = page.html;
                self.events.push_back(EngineEvent::UrlChanged {
                    url: url.to_owned(),
                });
                if let Some(title) = page.title {
                    self.events.push_back(EngineEvent::TitleChanged { title });
                }
                self.events.push_back(EngineEvent::LoadFinished { result: Ok(()) });
            }
            Err(reason) => {
                self.events.push_back(EngineEvent::LoadFinished {
                    result: Err(reason),
                });
            }
        }
    }

    fn push_history(&mut self, url: String) {
        if let Some(index) = self.history_index {
            let keep_to = index.saturating_add(1);
            self.history.truncate(keep_to);
        }

        if self.history.last().is_some_and(|existing| existing == &url) {
            self.history_index = Some(self.history.len().saturating_sub(1));
            return;
        }

        self.history.push(url);
        self.history_index = Some(self.history.len().saturating_sub(1));
    }
}

impl Default for LocalDocumentEngine {
    fn default() -> Self {
        Self::new(Box::new(AllowAllInterceptor))
    }
}

impl EngineView for LocalDocumentEngine {
    fn load(&mut self, url: &str) {
        self.start_load(url, true);
    }

    fn stop(&mut self) {}

    fn reload(&mut self) {
        if let Some(current) = self.current_url.clone() {
            self.start_load(&current, false);
        }
    }

    fn go_back(&mut self) {
        let Some(index) = self.history_index else {
            return;
        };

        if index == 0 {
            return;
        }

        let next_index = index - 1;
        self.history_index = Some(next_index);
        if let Some(url) = self.history.get(next_index).cloned() {
            self.start_load(&url, false);
        }
    }

    fn go_forward(&mut self) {
        let Some(index) = self.history_index else {
            return;
        };

        let next_index = index + 1;
        if next_index >= self.history.len() {
            return;
        }

        self.history_index = Some(next_index);
        if let Some(url) = self.history.get(next_index).cloned() {
            self.start_load(&url, false);
        }
    }

    fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn is_loading(&self) -> bool {
        false
    }

    fn can_go_back(&self) -> bool {
        matches!(self.history_index, Some(index) if index > 0)
    }

    fn can_go_forward(&self) -> bool {
        matches!(self.history_index, Some(index) if index + 1 < self.history.len())
    }

    fn request_html(&mut self) -> SnapshotId {
        let id = SnapshotId::new(self.next_snapshot);
        self.next_snapshot = self.next_snapshot.saturating_add(1);
        self.events.push_back(EngineEvent::HtmlSnapshot {
            id,
            html: self.html.clone(),
        });
        id
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        self.events.pop_front()
    }
}

fn load_document(url: &str) -> Result<LoadedPage, String> {
    let parsed = Url::parse(url).map_err(|error| error.to_string())?;
    match parsed.scheme() {
        "about" => Ok(LoadedPage {
            html: String::new(),
            title: None,
        }),
        "file" => {
            let Ok(path) = parsed.to_file_path() else {
                return Err(format!("'{url}' does not name a local file"));
            };
            let bytes = fs::read(&path)
                .map_err(|error| format!("could not read {}: {error}", path.display()))?;
            let html = decode_document_bytes(&bytes);
            let title = Document::parse(&html).title;
            Ok(LoadedPage { html, title })
        }
        other => Err(format!(
            "unsupported scheme '{other}' for the local document engine"
        )),
    }
}

fn decode_document_bytes(body: &[u8]) -> String {
    if let Some(label) = parse_charset_from_html_prefix(body) {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            let (decoded, _, _) = encoding.decode(body);
            return decoded.into_owned();
        }
    }

    String::from_utf8_lossy(body).to_string()
}

fn parse_charset_from_html_prefix(body: &[u8]) -> Option<String> {
    let prefix_len = body.len().min(8192);
    let prefix = String::from_utf8_lossy(&body[..prefix_len]);
    let lower = prefix.to_ascii_lowercase();
    let mut search_start = 0_usize;

    while let Some(relative) = lower[search_start..].find("charset=") {
        let charset_start = search_start + relative + "charset=".len();
        let remainder = &prefix[charset_start..];
        if let Some(label) = parse_charset_label(remainder) {
            return Some(label);
        }
        search_start = charset_start;
    }

    None
}

fn parse_charset_label(input: &str) -> Option<String> {
    let trimmed = input.trim_start();
    if trimmed.is_empty() {
        return None;
    }

    let mut chars = trimmed.chars();
    let first = chars.next()?;

    if first == '"' || first == '\'' {
        let rest = &trimmed[first.len_utf8()..];
        let end = rest.find(first)?;
        let label = rest[..end].trim();
        return if label.is_empty() {
            None
        } else {
            Some(label.to_owned())
        };
    }

    let end = trimmed
        .find(|ch: char| ch.is_whitespace() || matches!(ch, '"' | '\'' | ';' | '>' | '/'))
        .unwrap_or(trimmed.len());
    let label = trimmed[..end].trim();
    if label.is_empty() {
        None
    } else {
        Some(label.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intercept::BlocklistInterceptor;
    use crate::intercept::RequestDecision;
    use dw_blocklist::Blocklist;
    use std::cell::Cell;
    use std::path::Path;
    use std::path::PathBuf;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn drain(engine: &mut LocalDocumentEngine) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Some(event) = engine.poll_event() {
            events.push(event);
        }
        events
    }

    fn temp_path(name: &str) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|value| value.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir().join(format!("driftwood-engine-{name}-{stamp}"))
    }

    fn file_url(path: &Path) -> String {
        Url::from_file_path(path)
            .map(|parsed| parsed.to_string())
            .unwrap_or_default()
    }

    struct TogglingInterceptor {
        deny: Rc<Cell<bool>>,
    }

    impl UrlRequestInterceptor for TogglingInterceptor {
        fn decide(&self, _request: &UrlRequestInfo) -> RequestDecision {
            if self.deny.get() {
                RequestDecision::Block
            } else {
                RequestDecision::Allow
            }
        }
    }

    #[test]
    fn about_blank_loads_an_empty_untitled_page() {
        let mut engine = LocalDocumentEngine::default();
        engine.load("about:blank");

        assert_eq!(
            drain(&mut engine),
            vec![
                EngineEvent::UrlChanged {
                    url: "about:blank".to_owned(),
                },
                EngineEvent::LoadFinished { result: Ok(()) },
            ]
        );
        assert_eq!(engine.current_url(), Some("about:blank"));
        assert_eq!(engine.title(), None);
        assert!(!engine.is_loading());
    }

    #[test]
    fn file_loads_report_url_title_and_success() {
        let path = temp_path("titled.html");
        let wrote = fs::write(
            &path,
            "<html><head><title>Local Page</title></head><body>hello</body></html>",
        );
        assert!(wrote.is_ok());
        let url = file_url(&path);
        assert!(!url.is_empty());

        let mut engine = LocalDocumentEngine::default();
        engine.load(&url);

        assert_eq!(
            drain(&mut engine),
            vec![
                EngineEvent::UrlChanged { url: url.clone() },
                EngineEvent::TitleChanged {
                    title: "Local Page".to_owned(),
                },
                EngineEvent::LoadFinished { result: Ok(()) },
            ]
        );
        assert_eq!(engine.current_url(), Some(url.as_str()));
        assert_eq!(engine.title(), Some("Local Page"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_fails_and_leaves_state_untouched() {
        let path = temp_path("missing.html");
        let url = file_url(&path);

        let mut engine = LocalDocumentEngine::default();
        engine.load(&url);

        let events = drain(&mut engine);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            EngineEvent::LoadFinished { result: Err(_) }
        ));
        assert_eq!(engine.current_url(), None);
        assert!(!engine.can_go_back());
    }

    #[test]
    fn network_schemes_are_refused() {
        let mut engine = LocalDocumentEngine::default();
        engine.load("https://example.com/");

        let events = drain(&mut engine);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            EngineEvent::LoadFinished { result: Err(_) }
        ));
        assert_eq!(engine.current_url(), None);
    }

    #[test]
    fn blocked_loads_leave_page_and_history_untouched() {
        let blocklist = Arc::new(Blocklist::from_hosts_text("127.0.0.1 ads.example.com"));
        let mut engine =
            LocalDocumentEngine::new(Box::new(BlocklistInterceptor::new(blocklist)));
        engine.load("https://ads.example.com/page");

        let events = drain(&mut engine);
        assert_eq!(
            events[0],
            EngineEvent::RequestBlocked {
                url: "https://ads.example.com/page".to_owned(),
            }
        );
        assert!(matches!(
            &events[1],
            EngineEvent::LoadFinished { result: Err(_) }
        ));
        assert_eq!(engine.current_url(), None);
        assert!(!engine.can_go_back());
        assert!(!engine.can_go_forward());
    }

    #[test]
    fn loading_after_going_back_drops_forward_entries() {
        let mut engine = LocalDocumentEngine::default();
        engine.load("about:one");
        engine.load("about:two");
        engine.go_back();
        assert_eq!(engine.current_url(), Some("about:one"));
        assert!(engine.can_go_forward());

        engine.load("about:three");
        assert_eq!(engine.current_url(), Some("about:three"));
        assert!(engine.can_go_back());
        assert!(!engine.can_go_forward());

        engine.go_back();
        assert_eq!(engine.current_url(), Some("about:one"));
    }

    #[test]
    fn reloading_the_same_url_does_not_grow_history() {
        let mut engine = LocalDocumentEngine::default();
        engine.load("about:one");
        engine.load("about:one");
        engine.reload();

        assert!(!engine.can_go_back());
        assert!(!engine.can_go_forward());
        assert_eq!(engine.current_url(), Some("about:one"));
    }

    #[test]
    fn reload_with_no_page_is_a_no_op() {
        let mut engine = LocalDocumentEngine::default();
        engine.reload();
        assert_eq!(drain(&mut engine), Vec::new());
    }

    #[test]
    fn snapshot_tickets_increase_and_tag_their_answers() {
        let mut engine = LocalDocumentEngine::default();
        engine.load("about:blank");
        drain(&mut engine);

        let first = engine.request_html();
        let second = engine.request_html();
        assert!(second.raw() > first.raw());

        assert_eq!(
            drain(&mut engine),
            vec![
                EngineEvent::HtmlSnapshot {
                    id: first,
                    html: String::new(),
                },
                EngineEvent::HtmlSnapshot {
                    id: second,
                    html: String::new(),
                },
            ]
        );
    }

    #[test]
    fn snapshots_carry_the_loaded_document() {
        let path = temp_path("snapshot.html");
        let body = "<html><body><a class=\"next\" href=\"/p2\">More</a></body></html>";
        let wrote = fs::write(&path, body);
        assert!(wrote.is_ok());
        let url = file_url(&path);

        let mut engine = LocalDocumentEngine::default();
        engine.load(&url);
        drain(&mut engine);

        let ticket = engine.request_html();
        assert_eq!(
            drain(&mut engine),
            vec![EngineEvent::HtmlSnapshot {
                id: ticket,
                html: body.to_owned(),
            }]
        );

        let _ = fs::remove_file(path);
    }

    #[test]
    fn history_traversal_consults_the_interceptor() {
        let deny = Rc::new(Cell::new(false));
        let mut engine = LocalDocumentEngine::new(Box::new(TogglingInterceptor {
            deny: Rc::clone(&deny),
        }));
        engine.load("about:one");
        engine.load("about:two");
        drain(&mut engine);

        deny.set(true);
        engine.go_back();

        let events = drain(&mut engine);
        assert_eq!(
            events[0],
            EngineEvent::RequestBlocked {
                url: "about:one".to_owned(),
            }
        );
        assert!(matches!(
            &events[1],
            EngineEvent::LoadFinished { result: Err(_) }
        ));
        // The index moved before the refused load, so forward is now open
        // while the displayed page is still the old one.
        assert!(engine.can_go_forward());
        assert_eq!(engine.current_url(), Some("about:two"));
    }

    #[test]
    fn meta_charset_drives_decoding() {
        let mut body = Vec::new();
        body.extend_from_slice(b"<html><head><meta charset=\"windows-1252\"><title>Caf");
        body.push(0xE9);
        body.extend_from_slice(b"</title></head><body></body></html>");

        let decoded = decode_document_bytes(&body);
        assert!(decoded.contains("Caf\u{e9}"));
    }

    #[test]
    fn undeclared_charset_falls_back_to_lossy_utf8() {
        let body = [b'a', 0xFF, b'b'];
        let decoded = decode_document_bytes(&body);
        assert_eq!(decoded, "a\u{fffd}b");
    }

    #[test]
    fn quoted_and_bare_charset_labels_parse() {
        assert_eq!(
            parse_charset_from_html_prefix(b"<meta charset=\"utf-8\">"),
            Some("utf-8".to_owned())
        );
        assert_eq!(
            parse_charset_from_html_prefix(b"<meta charset=windows-1252>"),
            Some("windows-1252".to_owned())
        );
        assert_eq!(
            parse_charset_from_html_prefix(
                b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset='koi8-r'\">"
            ),
            Some("koi8-r".to_owned())
        );
        assert_eq!(parse_charset_from_html_prefix(b"<meta charset=''>"), None);
        assert_eq!(parse_charset_from_html_prefix(b"no declaration here"), None);
    }
}

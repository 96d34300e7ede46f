//! Heuristic discovery of "next page" / "previous page" links.
//!
//! Pages rarely declare pagination in a machine-readable way, so the locator
//! scans anchors the way a reader would: first for navigation hints in
//! `class`, `rel` and `id` attributes, then for well-known link texts. The
//! whole lookup is a pure function of the page source and the page URL.

use dw_html::Document;
use dw_html::Element;
use url::Url;

/// Attributes inspected during the attribute pass, in priority order.
const RELATION_ATTRIBUTES: [&str; 3] = ["class", "rel", "id"];

const NEXT_TEXT_MATCHES: [&str; 4] = ["next page", "next", ">", ">>"];
const PREVIOUS_TEXT_MATCHES: [&str; 4] = ["previous page", "prev", "<", "<<"];

/// Direction of a pagination jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRelation {
    Next,
    Previous,
}

impl PageRelation {
    /// Marker searched for as a substring of `class`, `rel` and `id` values.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Previous => "prev",
        }
    }

    /// Built-in link-text fallbacks, checked in order per anchor. All are
    /// lowercase; link text is ASCII-lowercased before matching.
    pub fn default_text_matches(self) -> &'static [&'static str] {
        match self {
            Self::Next => &NEXT_TEXT_MATCHES,
            Self::Previous => &PREVIOUS_TEXT_MATCHES,
        }
    }
}

/// [`find_pagination_link`] with the relation's built-in text fallbacks.
pub fn find_pagination_link_with_defaults(
    html: &str,
    relation: PageRelation,
    current_url: &str,
) -> Option<String> {
    find_pagination_link(html, relation, current_url, relation.default_text_matches())
}

/// Locates the most plausible pagination link in `html` and resolves it
/// against `current_url`.
///
/// Anchors without an `href` are ignored. The attribute pass runs over every
/// anchor in document order before the text pass starts; within each pass
/// the first anchor that qualifies and resolves wins. A qualifying anchor
/// whose href is empty, unparsable against the page URL, or outside
/// http/https is dropped and the scan continues. Absolute http(s) hrefs are
/// returned exactly as written.
pub fn find_pagination_link(
    html: &str,
    relation: PageRelation,
    current_url: &str,
    text_matches: &[&str],
) -> Option<String> {
    let document = Document::parse(html);
    let anchors: Vec<&Element> = document
        .elements_by_tag("a")
        .into_iter()
        .filter(|anchor| anchor.attr("href").is_some())
        .collect();

    let marker = relation.marker();
    for anchor in &anchors {
        let qualified = RELATION_ATTRIBUTES
            .iter()
            .any(|name| attribute_contains(anchor, name, marker));
        if !qualified {
            continue;
        }

        if let Some(resolved) = resolve_anchor(anchor, current_url) {
            return Some(resolved);
        }
    }

    for anchor in &anchors {
        let text = anchor.text().to_ascii_lowercase();
        let qualified = text_matches.iter().any(|literal| text.contains(literal));
        if !qualified {
            continue;
        }

        if let Some(resolved) = resolve_anchor(anchor, current_url) {
            return Some(resolved);
        }
    }

    None
}

fn attribute_contains(anchor: &Element, name: &str, marker: &str) -> bool {
    anchor
        .attr(name)
        .is_some_and(|value| value.contains(marker))
}

fn resolve_anchor(anchor: &Element, current_url: &str) -> Option<String> {
    resolve_href(current_url, anchor.attr("href").unwrap_or_default())
}

/// Resolves an anchor href against the page URL. Absolute http(s) hrefs pass
/// through unchanged; everything else joins against the base and must land
/// on http or https.
fn resolve_href(base_url: &str, href: &str) -> Option<String> {
    if href.trim().is_empty() {
        return None;
    }

    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_owned());
    }

    let base = Url::parse(base_url).ok()?;
    let joined = base.join(href).ok()?;
    match joined.scheme() {
        "http" | "https" => Some(joined.to_string()),
        _ => None,
    }
}

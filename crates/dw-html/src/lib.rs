//! Permissive HTML parsing into a lightweight element tree.
//!
//! This is not a spec-complete HTML parser. A byte cursor tokenizes tags,
//! attributes and text, and a stack builds a best-effort tree from whatever
//! the tokenizer found. Parsing never fails: malformed input degrades into
//! text nodes or truncated subtrees instead of errors.

/// Parsed document: the element tree plus the first non-empty `<title>`.
#[derive(Debug, Clone)]
pub struct Document {
    pub root: Element,
    pub title: Option<String>,
}

/// Element node. Tag and attribute names are ASCII-lowercased; attribute
/// values and text children are entity-decoded.
#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug)]
enum Token {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    End {
        name: String,
    },
    Text(String),
}

impl Document {
    pub fn parse(source: &str) -> Self {
        let tokens = tokenize(source);
        let root = build_tree(tokens);
        let title = find_title(&root.children);
        Self { root, title }
    }

    /// Collects every element with this tag name, depth-first in document
    /// order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        collect_elements_by_tag(&self.root.children, tag, &mut out);
        out
    }

    /// Plain-text preview of the document: head, title, script and style
    /// content skipped, whitespace collapsed, truncated to `max_chars`.
    pub fn text_preview(&self, max_chars: usize) -> String {
        if max_chars == 0 {
            return String::new();
        }

        let mut out = String::new();
        collect_preview_text(&self.root.children, &mut out);
        let collapsed = collapse_whitespace(&out);
        if collapsed.chars().count() <= max_chars {
            return collapsed;
        }

        collapsed.chars().take(max_chars).collect()
    }
}

impl Element {
    /// First attribute with this name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated descendant text in document order, whitespace kept as
    /// written. Script, style and noscript subtrees are skipped.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_elements_by_tag<'a>(nodes: &'a [Node], tag: &str, out: &mut Vec<&'a Element>) {
    for node in nodes {
        let Node::Element(element) = node else {
            continue;
        };

        if element.tag.eq_ignore_ascii_case(tag) {
            out.push(element);
        }
        collect_elements_by_tag(&element.children, tag, out);
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                if matches!(element.tag.as_str(), "script" | "style" | "noscript") {
                    continue;
                }
                collect_text(&element.children, out);
            }
        }
    }
}

fn collect_preview_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => {
                if !text.trim().is_empty() {
                    out.push(' ');
                    out.push_str(text);
                }
            }
            Node::Element(element) => {
                if matches!(element.tag.as_str(), "script" | "style" | "head" | "title") {
                    continue;
                }
                collect_preview_text(&element.children, out);
            }
        }
    }
}

fn find_title(nodes: &[Node]) -> Option<String> {
    for node in nodes {
        let Node::Element(element) = node else {
            continue;
        };

        if element.tag == "title" {
            let mut raw = String::new();
            collect_text(&element.children, &mut raw);
            let collapsed = collapse_whitespace(&raw);
            if !collapsed.is_empty() {
                return Some(collapsed);
            }
        }

        if let Some(found) = find_title(&element.children) {
            return Some(found);
        }
    }
    None
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn tokenize(source: &str) -> Vec<Token> {
    let bytes = source.as_bytes();
    let mut out = Vec::new();
    let mut idx = 0_usize;

    while idx < bytes.len() {
        if bytes[idx] != b'<' {
            let end = find_byte(bytes, idx, b'<').unwrap_or(bytes.len());
            push_text(&mut out, &bytes[idx..end]);
            idx = end;
            continue;
        }

        if starts_with(bytes, idx, b"<!--") {
            idx = skip_comment(bytes, idx);
            continue;
        }

        if starts_with(bytes, idx, b"<!") || starts_with(bytes, idx, b"<?") {
            idx = skip_to_gt(bytes, idx.saturating_add(2));
            continue;
        }

        if starts_with(bytes, idx, b"</") {
            if let Some((token, next_idx)) = parse_end_tag(bytes, idx) {
                out.push(token);
                idx = next_idx;
                continue;
            }
        } else if let Some((token, next_idx)) = parse_start_tag(bytes, idx) {
            let raw_text_tag = match &token {
                Token::Start {
                    name, self_closing, ..
                } if !*self_closing && is_raw_text_tag(name) => Some(name.clone()),
                _ => None,
            };

            out.push(token);
            idx = next_idx;

            if let Some(tag_name) = raw_text_tag {
                idx = consume_raw_text(bytes, idx, &tag_name, &mut out);
            }
            continue;
        }

        // A `<` that does not open a parsable tag is literal text.
        let end = find_byte(bytes, idx.saturating_add(1), b'<').unwrap_or(bytes.len());
        push_text(&mut out, &bytes[idx..end]);
        idx = end;
    }

    out
}

fn push_text(out: &mut Vec<Token>, bytes: &[u8]) {
    let text = String::from_utf8_lossy(bytes);
    if !text.is_empty() {
        out.push(Token::Text(text.into_owned()));
    }
}

fn build_tree(tokens: Vec<Token>) -> Element {
    let mut stack = vec![Element {
        tag: "document".to_owned(),
        attrs: Vec::new(),
        children: Vec::new(),
    }];

    for token in tokens {
        match token {
            Token::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.children.push(Node::Text(decode_entities(&text)));
                }
            }
            Token::Start {
                name,
                attrs,
                self_closing,
            } => {
                let element = Element {
                    tag: name.clone(),
                    attrs,
                    children: Vec::new(),
                };

                if self_closing || is_void(&name) {
                    if let Some(current) = stack.last_mut() {
                        current.children.push(Node::Element(element));
                    }
                } else {
                    stack.push(element);
                }
            }
            Token::End { name } => {
                // An end tag with no matching open element is dropped rather
                // than unwinding unrelated ancestors.
                if !stack.iter().skip(1).any(|open| open.tag == name) {
                    continue;
                }

                while stack.len() > 1 {
                    let Some(closed) = stack.pop() else {
                        break;
                    };
                    let matched = closed.tag == name;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Element(closed));
                    }
                    if matched {
                        break;
                    }
                }
            }
        }
    }

    while stack.len() > 1 {
        let Some(closed) = stack.pop() else {
            break;
        };
        if let Some(parent) = stack.last_mut() {
            parent.children.push(Node::Element(closed));
        }
    }

    stack.pop().unwrap_or(Element {
        tag: "document".to_owned(),
        attrs: Vec::new(),
        children: Vec::new(),
    })
}

fn parse_start_tag(bytes: &[u8], start: usize) -> Option<(Token, usize)> {
    // The name must follow `<` immediately, so `a < b` stays text.
    let mut idx = start.saturating_add(1);
    let name_start = idx;
    while idx < bytes.len() && is_name_char(bytes[idx]) {
        idx = idx.saturating_add(1);
    }
    if idx == name_start {
        return None;
    }

    let name = String::from_utf8_lossy(&bytes[name_start..idx]).to_ascii_lowercase();
    let mut attrs = Vec::new();
    let mut self_closing = false;

    loop {
        idx = skip_spaces(bytes, idx);
        if idx >= bytes.len() {
            return None;
        }

        if bytes[idx] == b'>' {
            idx = idx.saturating_add(1);
            break;
        }

        if bytes[idx] == b'/' {
            self_closing = true;
            idx = skip_spaces(bytes, idx.saturating_add(1));
            if bytes.get(idx).copied() == Some(b'>') {
                idx = idx.saturating_add(1);
                break;
            }
            continue;
        }

        let attr_start = idx;
        while idx < bytes.len() && is_name_char(bytes[idx]) {
            idx = idx.saturating_add(1);
        }
        if idx == attr_start {
            // Junk inside the tag body. Skip to the closing bracket.
            idx = skip_to_gt(bytes, idx);
            break;
        }

        let attr_name = String::from_utf8_lossy(&bytes[attr_start..idx]).to_ascii_lowercase();
        idx = skip_spaces(bytes, idx);

        let mut value = String::new();
        if bytes.get(idx).copied() == Some(b'=') {
            idx = skip_spaces(bytes, idx.saturating_add(1));
            if matches!(bytes.get(idx).copied(), Some(b'"') | Some(b'\'')) {
                let quote = bytes[idx];
                idx = idx.saturating_add(1);
                let value_start = idx;
                while idx < bytes.len() && bytes[idx] != quote {
                    idx = idx.saturating_add(1);
                }
                value = String::from_utf8_lossy(&bytes[value_start..idx]).into_owned();
                if idx < bytes.len() {
                    idx = idx.saturating_add(1);
                }
            } else {
                let value_start = idx;
                while idx < bytes.len() && !bytes[idx].is_ascii_whitespace() && bytes[idx] != b'>' {
                    idx = idx.saturating_add(1);
                }
                value = String::from_utf8_lossy(&bytes[value_start..idx]).into_owned();
            }
        }

        attrs.push((attr_name, decode_entities(&value)));
    }

    Some((
        Token::Start {
            name,
            attrs,
            self_closing,
        },
        idx,
    ))
}

fn parse_end_tag(bytes: &[u8], start: usize) -> Option<(Token, usize)> {
    let mut idx = start.saturating_add(2);
    let name_start = idx;
    while idx < bytes.len() && is_name_char(bytes[idx]) {
        idx = idx.saturating_add(1);
    }
    if idx == name_start {
        return None;
    }

    let name = String::from_utf8_lossy(&bytes[name_start..idx]).to_ascii_lowercase();
    let close = find_byte(bytes, idx, b'>')?;
    Some((Token::End { name }, close.saturating_add(1)))
}

fn consume_raw_text(bytes: &[u8], start: usize, tag_name: &str, out: &mut Vec<Token>) -> usize {
    let (raw_text, closing_end) = read_raw_text(bytes, start, tag_name);
    if !raw_text.is_empty() {
        out.push(Token::Text(raw_text));
    }

    match closing_end {
        Some(end_idx) => {
            out.push(Token::End {
                name: tag_name.to_owned(),
            });
            end_idx
        }
        None => bytes.len(),
    }
}

fn read_raw_text(bytes: &[u8], start: usize, tag_name: &str) -> (String, Option<usize>) {
    let tag_bytes = tag_name.as_bytes();
    let mut idx = start;

    while idx < bytes.len() {
        if bytes[idx] == b'<'
            && bytes.get(idx.saturating_add(1)).copied() == Some(b'/')
            && starts_with_ignore_ascii_case(bytes, idx.saturating_add(2), tag_bytes)
        {
            let after_name = idx.saturating_add(2).saturating_add(tag_bytes.len());
            let close = skip_spaces(bytes, after_name);
            if bytes.get(close).copied() == Some(b'>') {
                let text = String::from_utf8_lossy(&bytes[start..idx]).into_owned();
                return (text, Some(close.saturating_add(1)));
            }
        }

        idx = idx.saturating_add(1);
    }

    (String::from_utf8_lossy(&bytes[start..]).into_owned(), None)
}

fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0_usize;

    while let Some(rel_amp) = input[cursor..].find('&') {
        let amp = cursor + rel_amp;
        out.push_str(&input[cursor..amp]);

        let rest = &input[(amp + 1)..];
        let Some(rel_semi) = rest.find(';') else {
            out.push('&');
            cursor = amp + 1;
            continue;
        };

        let semi = amp + 1 + rel_semi;
        let entity = &input[(amp + 1)..semi];
        if let Some(decoded) = decode_entity(entity) {
            out.push_str(&decoded);
            cursor = semi + 1;
        } else {
            out.push('&');
            cursor = amp + 1;
        }
    }

    out.push_str(&input[cursor..]);
    out
}

fn decode_entity(entity: &str) -> Option<String> {
    match entity {
        "nbsp" => Some(" ".to_owned()),
        "amp" => Some("&".to_owned()),
        "lt" => Some("<".to_owned()),
        "gt" => Some(">".to_owned()),
        "quot" => Some("\"".to_owned()),
        "apos" => Some("'".to_owned()),
        _ => {
            if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                let value = u32::from_str_radix(hex, 16).ok()?;
                char::from_u32(value).map(|ch| ch.to_string())
            } else if let Some(dec) = entity.strip_prefix('#') {
                let value = dec.parse::<u32>().ok()?;
                char::from_u32(value).map(|ch| ch.to_string())
            } else {
                None
            }
        }
    }
}

fn skip_comment(bytes: &[u8], start: usize) -> usize {
    find_subslice(bytes, start.saturating_add(4), b"-->")
        .map(|end| end.saturating_add(3))
        .unwrap_or(bytes.len())
}

fn skip_to_gt(bytes: &[u8], from: usize) -> usize {
    find_byte(bytes, from, b'>')
        .map(|end| end.saturating_add(1))
        .unwrap_or(bytes.len())
}

fn skip_spaces(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx = idx.saturating_add(1);
    }
    idx
}

fn is_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':')
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn starts_with(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx.saturating_add(pattern.len());
    end <= bytes.len() && bytes[idx..end] == *pattern
}

fn starts_with_ignore_ascii_case(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx.saturating_add(pattern.len());
    if end > bytes.len() {
        return false;
    }

    bytes[idx..end]
        .iter()
        .zip(pattern.iter())
        .all(|(left, right)| left.eq_ignore_ascii_case(right))
}

fn find_byte(bytes: &[u8], from: usize, byte: u8) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }

    bytes[from..]
        .iter()
        .position(|candidate| *candidate == byte)
        .map(|offset| from + offset)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }

    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::Document;

    #[test]
    fn parses_nested_elements_and_text() {
        let doc = Document::parse("<html><body><p>Hello</p></body></html>");
        let paragraphs = doc.elements_by_tag("p");
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].text(), "Hello");
    }

    #[test]
    fn lowercases_tag_and_attribute_names() {
        let doc = Document::parse("<DIV CLASS='sidebar'>x</DIV>");
        let divs = doc.elements_by_tag("div");
        assert_eq!(divs.len(), 1);
        assert_eq!(divs[0].attr("class"), Some("sidebar"));
    }

    #[test]
    fn decodes_entities_in_text_and_attribute_values() {
        let doc = Document::parse("<a href=\"/p?a=1&amp;b=2\">Tom &amp; Jerry &gt;&gt;</a>");
        let anchors = doc.elements_by_tag("a");
        assert_eq!(anchors[0].attr("href"), Some("/p?a=1&b=2"));
        assert_eq!(anchors[0].text(), "Tom & Jerry >>");
    }

    #[test]
    fn decodes_numeric_entities() {
        let doc = Document::parse("<p>&#65;&#x42;</p>");
        assert_eq!(doc.elements_by_tag("p")[0].text(), "AB");
    }

    #[test]
    fn keeps_bare_ampersands() {
        let doc = Document::parse("<p>fish & chips</p>");
        assert_eq!(doc.elements_by_tag("p")[0].text(), "fish & chips");
    }

    #[test]
    fn void_elements_do_not_nest() {
        let doc = Document::parse("<p>one<br>two</p>");
        let paragraphs = doc.elements_by_tag("p");
        assert_eq!(paragraphs[0].children.len(), 3);
        assert_eq!(paragraphs[0].text(), "onetwo");
    }

    #[test]
    fn script_and_style_content_never_produces_elements() {
        let doc = Document::parse(
            "<style>a { color: red }</style><script>if (a < b) { link(\"<a>\"); }</script><p>after</p>",
        );
        assert!(doc.elements_by_tag("a").is_empty());
        assert_eq!(doc.elements_by_tag("p")[0].text(), "after");
    }

    #[test]
    fn unterminated_raw_text_runs_to_end_of_input() {
        let doc = Document::parse("<p>before</p><script>var x = 1;");
        assert_eq!(doc.elements_by_tag("p")[0].text(), "before");
        assert_eq!(doc.elements_by_tag("script").len(), 1);
    }

    #[test]
    fn finds_first_nonempty_title() {
        let doc = Document::parse("<title> </title><title> Driftwood   Docs </title>");
        assert_eq!(doc.title.as_deref(), Some("Driftwood Docs"));
    }

    #[test]
    fn untitled_document_has_no_title() {
        let doc = Document::parse("<p>body only</p>");
        assert_eq!(doc.title, None);
    }

    #[test]
    fn collects_elements_in_document_order() {
        let doc = Document::parse(
            "<a id='first'></a><div><a id='second'></a></div><a id='third'></a>",
        );
        let ids = doc
            .elements_by_tag("a")
            .iter()
            .map(|anchor| anchor.attr("id").unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn stray_end_tags_are_dropped() {
        let doc = Document::parse("<body><a href='/n'>next</a></span><a href='/m'>more</a></body>");
        assert_eq!(doc.elements_by_tag("a").len(), 2);
        assert_eq!(doc.elements_by_tag("body")[0].children.len(), 2);
    }

    #[test]
    fn lone_angle_brackets_are_text() {
        let doc = Document::parse("<p>a < b</p>");
        assert_eq!(doc.elements_by_tag("p")[0].text(), "a < b");

        let trailing = Document::parse("tail<");
        assert_eq!(trailing.root.text(), "tail<");
    }

    #[test]
    fn unquoted_and_single_quoted_attribute_values() {
        let doc = Document::parse("<a href=/page/2 rel='next'>more</a>");
        let anchors = doc.elements_by_tag("a");
        assert_eq!(anchors[0].attr("href"), Some("/page/2"));
        assert_eq!(anchors[0].attr("rel"), Some("next"));
    }

    #[test]
    fn attributes_without_values_are_empty() {
        let doc = Document::parse("<input disabled>");
        assert_eq!(doc.elements_by_tag("input")[0].attr("disabled"), Some(""));
    }

    #[test]
    fn comments_and_doctype_are_skipped() {
        let doc = Document::parse("<!DOCTYPE html><!-- navigation --><p>x</p>");
        assert_eq!(doc.root.children.len(), 1);
        assert_eq!(doc.elements_by_tag("p")[0].text(), "x");
    }

    #[test]
    fn unclosed_elements_are_attached_at_end_of_input() {
        let doc = Document::parse("<div><a href='/x'>dangling");
        let anchors = doc.elements_by_tag("a");
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].text(), "dangling");
    }

    #[test]
    fn text_preview_skips_head_and_collapses_whitespace() {
        let doc = Document::parse(
            "<head><title>T</title><style>p{}</style></head><body>  Hello   brave \n world </body>",
        );
        assert_eq!(doc.text_preview(100), "Hello brave world");
        assert_eq!(doc.text_preview(11), "Hello brave");
        assert_eq!(doc.text_preview(0), "");
    }
}

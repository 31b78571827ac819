// ABOUTME: Output conversions shared by the extractors.
// ABOUTME: Allow-list HTML sanitizing, block-aware plain-text rendering, and title lookup.

//! Output format conversion module.
//!
//! Turns parsed documents into the shapes callers receive: sanitized HTML
//! fragments and plain text with one line per block.

use std::collections::HashSet;

use ego_tree::NodeRef;
use once_cell::sync::Lazy;
use scraper::{Html, Node, Selector};

/// Elements whose entire subtree is dropped from extracted output.
pub const DISCARDED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "object", "embed", "svg", "canvas",
    "nav", "header", "footer", "aside", "form", "button", "select", "textarea",
];

/// Elements kept by [`sanitize_html`].
const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "hr", "strong", "b", "em", "i", "u", "s", "sub", "sup", "h1", "h2", "h3", "h4",
    "h5", "h6", "ul", "ol", "li", "dl", "dt", "dd", "blockquote", "pre", "code", "figure",
    "figcaption", "img", "a", "table", "thead", "tbody", "tr", "th", "td", "div", "span",
];

/// Elements that start a new line when rendered as text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Subtrees that never contribute text.
const TEXTLESS_TAGS: &[&str] = &["head", "script", "style", "noscript", "template"];

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static OG_TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[property='og:title']").unwrap());
static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());

/// Sanitize an HTML fragment down to article markup.
///
/// Links keep `href`, images keep `src`, `alt`, `width`, `height`, tables keep
/// span attributes. Everything in [`DISCARDED_TAGS`] is removed together with
/// its content; other disallowed tags are unwrapped.
pub fn sanitize_html(html: &str) -> String {
    let mut builder = ammonia::Builder::new();
    builder
        .tags(ALLOWED_TAGS.iter().copied().collect())
        .clean_content_tags(DISCARDED_TAGS.iter().copied().collect())
        .generic_attributes(HashSet::new())
        .add_tag_attributes("a", &["href", "title"])
        .add_tag_attributes("img", &["src", "alt", "title", "width", "height"])
        .add_tag_attributes("td", &["colspan", "rowspan"])
        .add_tag_attributes("th", &["colspan", "rowspan"])
        .url_schemes(["http", "https", "mailto"].iter().copied().collect());

    builder.clean(html).to_string().trim().to_string()
}

/// Render a document as plain text, one line per block element.
///
/// `<br>` also breaks lines, table cells are separated by a space, and line
/// breaks inside `<pre>` survive. Horizontal whitespace is collapsed and blank
/// lines are dropped.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::with_capacity(html.len() / 2);
    collect_text(document.tree.root(), false, &mut raw);

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(node: NodeRef<'_, Node>, in_pre: bool, out: &mut String) {
    match node.value() {
        Node::Text(text) if in_pre => out.push_str(&text.replace("\r\n", "\n")),
        Node::Text(text) => {
            // newlines inside text nodes are layout, not structure
            for ch in text.chars() {
                out.push(if ch == '\n' || ch == '\r' { ' ' } else { ch });
            }
        }
        Node::Element(element) => {
            let name = element.name();
            if TEXTLESS_TAGS.contains(&name) {
                return;
            }
            if name == "br" {
                out.push('\n');
                return;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                out.push('\n');
            }
            let in_pre = in_pre || name == "pre";
            for child in node.children() {
                collect_text(child, in_pre, out);
            }
            if block {
                out.push('\n');
            } else if name == "td" || name == "th" {
                out.push(' ');
            }
        }
        Node::Document | Node::Fragment => {
            for child in node.children() {
                collect_text(child, in_pre, out);
            }
        }
        _ => {}
    }
}

/// Title from `<title>`, then `og:title`, then the first `<h1>`.
pub fn extract_title(doc: &Html) -> Option<String> {
    let from_text = |selector: &Selector| {
        doc.select(selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    };

    from_text(&TITLE_SELECTOR)
        .or_else(|| {
            doc.select(&OG_TITLE_SELECTOR)
                .next()
                .and_then(|el| el.value().attr("content"))
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
        })
        .or_else(|| from_text(&H1_SELECTOR))
}

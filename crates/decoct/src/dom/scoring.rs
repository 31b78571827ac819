// ABOUTME: Readability-style scoring used to pick the element holding a page's main content.
// ABOUTME: Scores paragraphs, credits their ancestors, and discounts link-heavy candidates.

use std::collections::HashMap;

use ego_tree::NodeId;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, pre, td, blockquote").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());
static ANY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("*").unwrap());

static POSITIVE_SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)article|body|content|entry|hentry|main|page|post|story|text|blog").unwrap()
});
static NEGATIVE_SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)advert|banner|combx|comment|contact|foot|footer|masthead|menu|meta|modal|nav|promo|related|share|shopping|sidebar|social|sponsor|widget").unwrap()
});
static NON_TOP_CANDIDATE_TAGS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(br|b|i|em|strong|span|a|label|hr|img|input|link|meta|p|li)$").unwrap()
});

/// Paragraphs shorter than this contribute nothing.
const MIN_PARAGRAPH_LEN: usize = 25;

/// Score storage keyed by tree node.
pub type NodeScores = HashMap<NodeId, f64>;

/// Starting score for an element based on its tag.
fn tag_score(element: &ElementRef) -> f64 {
    match element.value().name() {
        "article" | "main" => 10.0,
        "div" => 5.0,
        "section" | "pre" | "td" | "blockquote" => 3.0,
        "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    }
}

/// Weight from class and id hints.
pub fn class_weight(element: &ElementRef) -> f64 {
    let mut weight = 0.0;
    for attr in ["class", "id"] {
        if let Some(value) = element.value().attr(attr) {
            if POSITIVE_SCORE_RE.is_match(value) {
                weight += 25.0;
            }
            if NEGATIVE_SCORE_RE.is_match(value) {
                weight -= 25.0;
            }
        }
    }
    weight
}

/// Ratio of link text to total text.
pub fn link_density(element: &ElementRef) -> f64 {
    let total_len = element.text().map(str::len).sum::<usize>();
    if total_len == 0 {
        return 0.0;
    }

    let link_len: usize = element
        .select(&LINK_SELECTOR)
        .map(|a| a.text().map(str::len).sum::<usize>())
        .sum();

    link_len as f64 / total_len as f64
}

/// One point, plus one per comma, plus one per 100 chars up to three.
fn paragraph_score(text: &str) -> f64 {
    let commas = text.matches(',').count() as f64;
    let length_bonus = (text.len() / 100).min(3) as f64;
    1.0 + commas + length_bonus
}

fn credit(element: ElementRef, amount: f64, scores: &mut NodeScores) {
    let entry = scores
        .entry(element.id())
        .or_insert_with(|| tag_score(&element) + class_weight(&element));
    *entry += amount;
}

/// Score the ancestors of every substantial paragraph in the document.
pub fn score_content(doc: &Html) -> NodeScores {
    let mut scores = NodeScores::new();

    for paragraph in doc.select(&PARAGRAPH_SELECTOR) {
        let text = paragraph.text().collect::<String>();
        let text = text.trim();
        if text.len() < MIN_PARAGRAPH_LEN {
            continue;
        }

        let score = paragraph_score(text);
        let Some(parent) = paragraph.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        credit(parent, score, &mut scores);

        if let Some(grandparent) = parent.parent().and_then(ElementRef::wrap) {
            credit(grandparent, score / 2.0, &mut scores);
        }
    }

    scores
}

/// Pick the best scored element, discounting by link density.
///
/// Walks in document order so ties go to the earlier element. Falls back to
/// `<body>` when nothing scored.
pub fn find_top_candidate<'a>(doc: &'a Html, scores: &NodeScores) -> Option<ElementRef<'a>> {
    let mut best: Option<(ElementRef<'a>, f64)> = None;

    for element in doc.select(&ANY_SELECTOR) {
        let Some(score) = scores.get(&element.id()) else {
            continue;
        };
        let tag = element.value().name();
        if tag == "html" || NON_TOP_CANDIDATE_TAGS_RE.is_match(tag) {
            continue;
        }

        let adjusted = score * (1.0 - link_density(&element));
        if best.map_or(true, |(_, top)| adjusted > top) {
            best = Some((element, adjusted));
        }
    }

    best.map(|(element, _)| element)
        .or_else(|| doc.select(&BODY_SELECTOR).next())
}

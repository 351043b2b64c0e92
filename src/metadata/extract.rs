//! HTML metadata extraction.
//!
//! Every field is derived from an ordered chain of candidate functions. The
//! first candidate returning `Some` wins; later candidates are never run.

use scraper::{Html, Selector};
use url::Url;

use crate::models::PageMetadata;

pub const UNTITLED: &str = "Untitled";
pub const DEFAULT_FAVICON: &str = "/favicon.ico";

/// Title length on the full metadata path.
pub const TITLE_MAX_CHARS: usize = 200;
/// Title length on the lighter title-only path.
pub const SHORT_TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Body-text candidates shorter than this are treated as noise.
const MIN_BODY_TEXT_CHARS: usize = 20;
const BODY_TEXT_MAX_CHARS: usize = 300;

/// Characters treated as a "page title | site name" boundary.
const TITLE_SEPARATORS: &[char] = &['·', '|', '-'];

/// Fallback blocks tried, in order, when neither meta tags nor the first
/// paragraph yield a description.
const STRUCTURAL_SELECTORS: &[&str] = &[
    ".description",
    ".summary",
    ".intro",
    ".lead",
    "h1 + p",
    "h2 + p",
    ".content p:first-of-type",
    "main p:first-of-type",
    "article p:first-of-type",
];

type Candidate = fn(&Html) -> Option<String>;

const TITLE_CHAIN: &[Candidate] = &[og_title, twitter_title, title_tag];

const DESCRIPTION_CHAIN: &[Candidate] = &[
    og_description,
    meta_description,
    twitter_description,
    itemprop_description,
    first_paragraph,
    structural_block,
];

const FAVICON_CHAIN: &[Candidate] = &[icon_link, shortcut_icon_link, apple_touch_icon_link];

// ── Public API ─────────────────────────────────────────────────────────────

/// Derive title, description and favicon from `html`.
///
/// Never fails: a document with nothing usable yields `"Untitled"`, an empty
/// description and `/favicon.ico` resolved against `source_url`.
pub fn extract(html: &str, source_url: &str) -> PageMetadata {
    let document = Html::parse_document(html);

    let title = first_match(&document, TITLE_CHAIN)
        .map(|raw| sanitize_title(&raw, TITLE_MAX_CHARS))
        .unwrap_or_else(|| UNTITLED.to_string());

    let description = first_match(&document, DESCRIPTION_CHAIN)
        .map(|raw| clean_description(&raw))
        .unwrap_or_default();

    let favicon = first_match(&document, FAVICON_CHAIN)
        .unwrap_or_else(|| DEFAULT_FAVICON.to_string());

    PageMetadata {
        title: Some(title),
        description,
        favicon: Some(resolve_favicon(&favicon, source_url)),
    }
}

/// Read only the `<title>` element, sanitized to the short title length.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    title_tag(&document)
        .map(|raw| sanitize_title(&raw, SHORT_TITLE_MAX_CHARS))
        .filter(|title| !title.is_empty())
}

/// Keep the text before the first separator, cap it at `max_chars`, trim.
pub fn sanitize_title(raw: &str, max_chars: usize) -> String {
    let head = match raw.find(TITLE_SEPARATORS) {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    truncate_chars(head, max_chars).trim().to_string()
}

/// Collapse all whitespace runs to single spaces and cap at 500 characters.
pub fn clean_description(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, DESCRIPTION_MAX_CHARS).to_string()
}

/// Resolve a favicon reference against the origin of `source_url`.
///
/// Absolute URLs pass through untouched. Relative ones are joined onto
/// `scheme://host[:port]`; the page path and any `<base>` tag are ignored.
/// If the source URL itself is unusable the reference is returned as-is.
pub fn resolve_favicon(href: &str, source_url: &str) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }

    let origin = match Url::parse(source_url) {
        Ok(source) => source.origin(),
        Err(_) => return href.to_string(),
    };
    if !origin.is_tuple() {
        return href.to_string();
    }

    Url::parse(&origin.ascii_serialization())
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

// ── Chain evaluation ───────────────────────────────────────────────────────

fn first_match(doc: &Html, chain: &[Candidate]) -> Option<String> {
    chain.iter().find_map(|candidate| candidate(doc))
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ── Candidates ─────────────────────────────────────────────────────────────

fn og_title(doc: &Html) -> Option<String> {
    meta_content(doc, r#"meta[property="og:title"]"#)
}

fn twitter_title(doc: &Html) -> Option<String> {
    meta_content(doc, r#"meta[name="twitter:title"]"#)
}

fn title_tag(doc: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    doc.select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn og_description(doc: &Html) -> Option<String> {
    meta_content(doc, r#"meta[property="og:description"]"#)
}

fn meta_description(doc: &Html) -> Option<String> {
    meta_content(doc, r#"meta[name="description"]"#)
}

fn twitter_description(doc: &Html) -> Option<String> {
    meta_content(doc, r#"meta[name="twitter:description"]"#)
}

fn itemprop_description(doc: &Html) -> Option<String> {
    meta_content(doc, r#"meta[itemprop="description"]"#)
}

fn first_paragraph(doc: &Html) -> Option<String> {
    body_text(doc, "p")
}

fn structural_block(doc: &Html) -> Option<String> {
    STRUCTURAL_SELECTORS
        .iter()
        .find_map(|selector| body_text(doc, selector))
}

fn icon_link(doc: &Html) -> Option<String> {
    link_href(doc, r#"link[rel="icon"]"#)
}

fn shortcut_icon_link(doc: &Html) -> Option<String> {
    link_href(doc, r#"link[rel="shortcut icon"]"#)
}

fn apple_touch_icon_link(doc: &Html) -> Option<String> {
    link_href(doc, r#"link[rel="apple-touch-icon"]"#)
}

// ── Selector helpers ───────────────────────────────────────────────────────

fn meta_content(doc: &Html, selector: &str) -> Option<String> {
    first_attr(doc, selector, "content")
}

fn link_href(doc: &Html, selector: &str) -> Option<String> {
    first_attr(doc, selector, "href")
}

fn first_attr(doc: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Text of the first element matching `selector`, accepted only when it is
/// long enough to read as prose.
fn body_text(doc: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let text = doc.select(&selector).next()?.text().collect::<String>();
    let text = text.trim();
    if text.chars().count() > MIN_BODY_TEXT_CHARS {
        Some(truncate_chars(text, BODY_TEXT_MAX_CHARS).to_string())
    } else {
        None
    }
}

// ── Unit tests ─────────────────────────────────────────────────────────────

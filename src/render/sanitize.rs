//! Sanitize-then-escape boundary for backend-sourced text.
//!
//! Slide titles, bullet points, suggestions, job metadata and every other
//! string coming back from the backend is untrusted. It enters view models
//! only as [`SafeText`], which can only be built through [`clean`]. HTML
//! output additionally escapes it at insertion time via [`SafeText::to_html`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Elements removed together with their content.
static DANGEROUS_BLOCKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["script", "style", "iframe", "object", "embed", "noscript"]
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>"))
                .expect("block regex must compile")
        })
        .collect()
});

/// An opening `<script` (or similar) with no closing tag swallows the rest.
static UNCLOSED_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:script|style|iframe)\b.*$").expect("unclosed regex must compile")
});

/// Any remaining tag, including ones carrying `on*=` handlers.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)</?[A-Za-z!][^>]*>").expect("tag regex must compile"));

/// Script-bearing URL schemes.
static SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:java|vb)\s*script\s*:|data\s*:\s*text/html").expect("scheme regex must compile")
});

/// Text that passed through [`clean`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeText(String);

impl SafeText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// HTML-escaped form for insertion into markup.
    pub fn to_html(&self) -> String {
        escape_html(&self.0)
    }
}

impl fmt::Display for SafeText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip markup and script content from untrusted text.
pub fn clean(raw: &str) -> SafeText {
    let mut text = raw.to_string();
    for re in DANGEROUS_BLOCKS.iter() {
        text = re.replace_all(&text, "").into_owned();
    }
    text = UNCLOSED_BLOCK_RE.replace_all(&text, "").into_owned();
    text = TAG_RE.replace_all(&text, "").into_owned();
    text = SCHEME_RE.replace_all(&text, "").into_owned();
    SafeText(text.trim().to_string())
}

/// Sanitize a list of untrusted strings, dropping entries that end up empty.
pub fn clean_all<'a>(items: impl IntoIterator<Item = &'a String>) -> Vec<SafeText> {
    items
        .into_iter()
        .map(|s| clean(s))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

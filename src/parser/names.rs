use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use crate::config::ExtractOptions;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static SEED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\[[0-9]+\]\s*$").unwrap());

/// Collapse every whitespace run to one space and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    WHITESPACE_RE.replace_all(s, " ").trim().to_string()
}

/// Canonical form of a player name. May return an empty string; callers drop those.
pub fn normalize_name(name: &str, opts: &ExtractOptions) -> String {
    let name = normalize_whitespace(name);
    if opts.strip_seed {
        SEED_RE.replace(&name, "").trim().to_string()
    } else {
        name
    }
}

/// Decode character references (named, decimal and hex) in raw markup text
/// the way the schedule-page parser does, so both paths agree on names.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    Html::parse_fragment(s).root_element().text().collect()
}

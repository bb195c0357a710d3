use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::discipline::Discipline;
use super::names::{decode_entities, normalize_whitespace};

/// Opens every match container in a match-list export.
const MATCH_MARKER: &str = r#"<div class="match match--list">"#;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<div class="match__header">.*?<span class="nav-link__value">\s*([^<]+?)\s*</span>"#).unwrap()
});
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(HE|HD|DE|DD|GD)\s+(.*)$").unwrap());
static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<div class="match__row "[\s\S]*?</div>\s*</div>"#).unwrap());
static ROW_ANY_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<div class="match__row[^"]*"[\s\S]*?</div>\s*</div>"#).unwrap());
static PLAYER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?s)<a href="/sport/player\.aspx[^"]*"[^>]*class="nav-link"[^>]*>\s*"#,
        r#"<span class="nav-link__value">\s*([^<]+?)\s*</span>\s*</a>"#,
    ))
    .unwrap()
});

/// One match container, before names are normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchBlock {
    pub discipline: Discipline,
    pub level_key: String,
    /// One entry per side; each side lists its whitespace-normalized names.
    pub rows: Vec<Vec<String>>,
}

/// Why a candidate fragment was not a usable match block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discard {
    NoHeader,
    UnknownTitle(String),
    NoRows,
}

impl fmt::Display for Discard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discard::NoHeader => f.write_str("no match header"),
            Discard::UnknownTitle(t) => write!(f, "title {:?} has no discipline code", t),
            Discard::NoRows => f.write_str("no player rows"),
        }
    }
}

/// Split a match-list document into match blocks. Malformed fragments are
/// skipped; the scan itself never fails.
pub fn scan_document(html: &str) -> Vec<MatchBlock> {
    let mut blocks = Vec::new();
    let mut discarded = 0usize;

    for (i, fragment) in html.split(MATCH_MARKER).enumerate().skip(1) {
        match parse_block(fragment) {
            Ok(block) => blocks.push(block),
            Err(reason) => {
                discarded += 1;
                debug!("Skipping match fragment #{}: {}", i, reason);
            }
        }
    }

    debug!("Scanned {} match blocks ({} discarded)", blocks.len(), discarded);
    blocks
}

fn parse_block(fragment: &str) -> Result<MatchBlock, Discard> {
    let raw_title = HEADER_RE
        .captures(fragment)
        .map(|c| c[1].to_string())
        .ok_or(Discard::NoHeader)?;
    let (discipline, level_key) = parse_title(&raw_title)?;

    let rows = extract_rows(fragment);
    if rows.is_empty() {
        return Err(Discard::NoRows);
    }

    Ok(MatchBlock {
        discipline,
        level_key,
        rows,
    })
}

/// "HD 3-4 - Poule B" → (HD, "3-4").
pub fn parse_title(raw: &str) -> Result<(Discipline, String), Discard> {
    let title = normalize_whitespace(&decode_entities(raw));
    let caps = TITLE_RE
        .captures(&title)
        .ok_or_else(|| Discard::UnknownTitle(title.clone()))?;
    let discipline =
        Discipline::from_code(&caps[1]).ok_or_else(|| Discard::UnknownTitle(title.clone()))?;

    let rest = &caps[2];
    let level = rest.split(" - ").next().unwrap_or(rest);
    Ok((discipline, normalize_whitespace(level)))
}

fn extract_rows(fragment: &str) -> Vec<Vec<String>> {
    let mut row_html: Vec<&str> = ROW_RE.find_iter(fragment).map(|m| m.as_str()).collect();
    if row_html.is_empty() {
        row_html = ROW_ANY_CLASS_RE.find_iter(fragment).map(|m| m.as_str()).collect();
    }

    row_html
        .into_iter()
        .map(|row| {
            PLAYER_RE
                .captures_iter(row)
                .map(|c| normalize_whitespace(&decode_entities(&c[1])))
                .filter(|n| !n.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|names| !names.is_empty())
        .collect()
}

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use super::discipline::Discipline;
use super::names::normalize_name;
use crate::config::ExtractOptions;
use crate::error::ScrapeError;

const DEFAULT_DISCIPLINE: Discipline = Discipline::MensDoubles;
const DEFAULT_LEVEL: &str = "Recreatief";

static MATCHES_TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table.matches").unwrap());
static ANY_TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static SCORE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.score").unwrap());
static PLANNED_TIME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td.plannedtime").unwrap());
static DRAW_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"a[href*="draw.aspx"]"#).unwrap());
static COURT_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"a[href*="court.aspx"]"#).unwrap());
static PLAYER_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"a[href*="player.aspx"]"#).unwrap());

static LEVEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]+(?:-[0-9]+)?)").unwrap());
// Tried in order: "Hoofdlocatie - B6", "Zaal B3 oost", "Sporthal 4".
static COURT_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"-\s*[Bb]?([0-9]+)\s*$").unwrap(),
        Regex::new(r"[Bb]([0-9]+)").unwrap(),
        Regex::new(r"([0-9]+)\s*$").unwrap(),
    ]
});

/// One side of a scheduled match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSide {
    pub names: Vec<String>,
    pub discipline: Discipline,
    pub level_label: String,
}

/// A not-yet-played match as shown on a live schedule page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveMatchRecord {
    pub id: String,
    pub match_number: String,
    pub time: String,
    #[serde(serialize_with = "court_or_empty")]
    pub court: Option<u32>,
    pub team_a: TeamSide,
    pub team_b: TeamSide,
}

// Unknown courts go out as "" rather than null.
fn court_or_empty<S: Serializer>(court: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
    match court {
        Some(n) => serializer.serialize_u32(*n),
        None => serializer.serialize_str(""),
    }
}

/// Extract every scheduled (unscored) match from a schedule page.
pub fn extract_matches(html: &str, opts: &ExtractOptions) -> Result<Vec<LiveMatchRecord>, ScrapeError> {
    let document = Html::parse_document(html);
    let table = document
        .select(&MATCHES_TABLE)
        .next()
        .or_else(|| document.select(&ANY_TABLE).next())
        .ok_or(ScrapeError::NoMatchTable)?;

    let mut matches = Vec::new();
    for (i, row) in table.select(&ROW).enumerate().skip(1) {
        match parse_row(row, opts) {
            Ok(Some(record)) => matches.push(record),
            Ok(None) => {}
            Err(e) => warn!("Error parsing row {}: {:#}", i, e),
        }
    }

    if matches.is_empty() {
        return Err(ScrapeError::NoMatchesFound);
    }
    debug!("Extracted {} scheduled matches", matches.len());
    Ok(matches)
}

fn parse_row(row: ElementRef<'_>, opts: &ExtractOptions) -> Result<Option<LiveMatchRecord>> {
    let cells: Vec<ElementRef<'_>> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "td")
        .collect();
    if cells.len() < 3 {
        return Ok(None);
    }

    if row.select(&SCORE).any(|s| !stripped_text(s).is_empty()) {
        return Ok(None);
    }

    let time = row
        .select(&PLANNED_TIME)
        .next()
        .map(stripped_text)
        .unwrap_or_default();

    let draw_text = row
        .select(&DRAW_LINK)
        .next()
        .map(stripped_text)
        .unwrap_or_default();
    let (discipline, level_label) = parse_draw_label(&draw_text);

    let court = match row.select(&COURT_LINK).next() {
        Some(link) => parse_court(&stripped_text(link))?,
        None => None,
    };

    let mut team_cells = cells
        .iter()
        .filter(|td| td.select(&PLAYER_LINK).next().is_some());
    let team_a_names = team_cells.next().map(|td| team_names(*td, opts)).unwrap_or_default();
    let team_b_names = team_cells.next().map(|td| team_names(*td, opts)).unwrap_or_default();

    let id = format!("{}-{}-{}", time, discipline, team_a_names.join("-"));
    let side = |names: Vec<String>, placeholder: &str| TeamSide {
        names: if names.is_empty() {
            vec![placeholder.to_string()]
        } else {
            names
        },
        discipline,
        level_label: level_label.clone(),
    };

    Ok(Some(LiveMatchRecord {
        id,
        match_number: time.clone(),
        time,
        court,
        team_a: side(team_a_names, "Team A"),
        team_b: side(team_b_names, "Team B"),
    }))
}

/// "HE 1-2" → (HE, "1-2"); falls back to HD / "Recreatief".
pub fn parse_draw_label(text: &str) -> (Discipline, String) {
    let discipline = Discipline::detect_in(text).unwrap_or(DEFAULT_DISCIPLINE);
    let level = LEVEL_RE
        .captures(text)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
    (discipline, level)
}

/// Court number from a location label, None when it carries no number.
pub fn parse_court(text: &str) -> Result<Option<u32>> {
    let Some(digits) = COURT_RES
        .iter()
        .find_map(|re| re.captures(text).map(|c| c[1].to_string()))
    else {
        return Ok(None);
    };
    let court = digits
        .parse::<u32>()
        .with_context(|| format!("court number {:?} in {:?}", digits, text))?;
    Ok(Some(court))
}

fn team_names(cell: ElementRef<'_>, opts: &ExtractOptions) -> Vec<String> {
    cell.select(&PLAYER_LINK)
        .map(|a| normalize_name(&stripped_text(a), opts))
        .filter(|n| !n.is_empty())
        .collect()
}

/// Text nodes trimmed and concatenated.
fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(rows: &str) -> String {
        format!(
            r#"<html><body><table class="matches">
            <tr><th>Tijd</th><th>Reeks</th><th>Team A</th><th></th><th>Team B</th><th>Score</th><th>Baan</th></tr>
            {}</table></body></html>"#,
            rows
        )
    }

    fn row(time: &str, draw: &str, a: &[&str], b: &[&str], score: &str, court: &str) -> String {
        let links = |names: &[&str]| -> String {
            names
                .iter()
                .enumerate()
                .map(|(i, n)| format!(r#"<a href="/sport/player.aspx?id=T&amp;player={}">{}</a><br>"#, i, n))
                .collect()
        };
        format!(
            r#"<tr><td class="plannedtime">{}</td><td><a href="/sport/draw.aspx?id=T&amp;draw=1">{}</a></td>
            <td>{}</td><td>-</td><td>{}</td><td><span class="score">{}</span></td>
            <td><a href="/sport/court.aspx?id=T&amp;court=1">{}</a></td></tr>"#,
            time,
            draw,
            links(a),
            links(b),
            score,
            court
        )
    }

    #[test]
    fn extracts_scheduled_match() {
        let html = page(&row("za 14:30", "HE 1-2", &["Alice [1]"], &["Bob"], "", "Hoofdlocatie - B6"));
        let matches = extract_matches(&html, &ExtractOptions::live()).unwrap();
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.id, "za 14:30-HE-Alice");
        assert_eq!(m.time, "za 14:30");
        assert_eq!(m.match_number, "za 14:30");
        assert_eq!(m.court, Some(6));
        assert_eq!(m.team_a.names, ["Alice"]);
        assert_eq!(m.team_b.names, ["Bob"]);
        assert_eq!(m.team_b.discipline, Discipline::MensSingles);
        assert_eq!(m.team_b.level_label, "1-2");
    }

    #[test]
    fn scored_matches_skipped() {
        let html = page(&format!(
            "{}{}",
            row("10:00", "HD 3-4", &["A", "B"], &["C", "D"], "21-15 21-19", "Zaal - 2"),
            row("10:30", "HD 3-4", &["E", "F"], &["G", "H"], "  ", "Zaal - 3"),
        ));
        let matches = extract_matches(&html, &ExtractOptions::live()).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].team_a.names, ["E", "F"]);
        assert_eq!(matches[0].court, Some(3));
    }

    #[test]
    fn placeholders_for_missing_teams() {
        let html = page(r#"<tr><td class="plannedtime">11:00</td><td><a href="draw.aspx?d=2">Recreatief</a></td><td>tbd</td></tr>"#);
        let m = &extract_matches(&html, &ExtractOptions::live()).unwrap()[0];
        assert_eq!(m.id, "11:00-HD-");
        assert_eq!(m.team_a.names, ["Team A"]);
        assert_eq!(m.team_b.names, ["Team B"]);
        assert_eq!(m.team_a.level_label, "Recreatief");
        assert_eq!(m.court, None);
    }

    #[test]
    fn only_profile_links_are_names() {
        let html = page(
            r#"<tr><td>12:00</td><td><a href="draw.aspx">DD 5</a></td>
            <td><a href="/sport/player.aspx?p=1">Ann</a> <a href="/sport/club.aspx?c=3">BC Gent</a></td>
            <td><a href="/sport/player.aspx?p=2">Bea</a></td>
            <td><a href="/sport/player.aspx?p=3">Ignored</a></td></tr>"#,
        );
        let m = &extract_matches(&html, &ExtractOptions::live()).unwrap()[0];
        assert_eq!(m.time, "");
        assert_eq!(m.team_a.names, ["Ann"]);
        assert_eq!(m.team_b.names, ["Bea"]);
    }

    #[test]
    fn entity_names_match_batch_decoding() {
        let html = page(&row("13:00", "DE 1-2", &["Zo&#235; Maes"], &["&Eacute;lise&nbsp;Claes"], "", "Zaal - 1"));
        let m = &extract_matches(&html, &ExtractOptions::live()).unwrap()[0];
        let batch = |raw: &str| {
            normalize_name(&crate::parser::names::decode_entities(raw), &ExtractOptions::live())
        };
        assert_eq!(m.team_a.names, [batch("Zo&#235; Maes")]);
        assert_eq!(m.team_b.names, [batch("&Eacute;lise&nbsp;Claes")]);
        assert_eq!(m.team_b.names, ["Élise Claes"]);
    }

    #[test]
    fn bad_row_skipped_others_kept() {
        let html = page(&format!(
            "{}{}",
            row("09:00", "HE 1", &["X"], &["Y"], "", "Baan - 99999999999"),
            row("09:30", "HE 1", &["Z"], &["W"], "", "Baan - 4"),
        ));
        let matches = extract_matches(&html, &ExtractOptions::live()).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].court, Some(4));
    }

    #[test]
    fn missing_table_is_an_error() {
        let err = extract_matches("<html><body><p>Geen wedstrijden</p></body></html>", &ExtractOptions::live()).unwrap_err();
        assert!(matches!(err, ScrapeError::NoMatchTable));
    }

    #[test]
    fn empty_table_is_an_error() {
        let err = extract_matches(&page(""), &ExtractOptions::live()).unwrap_err();
        assert!(matches!(err, ScrapeError::NoMatchesFound));
    }

    #[test]
    fn draw_label_parsing() {
        assert_eq!(parse_draw_label("GD 11-12"), (Discipline::MixedDoubles, "11-12".to_string()));
        assert_eq!(parse_draw_label("DE 7"), (Discipline::WomensSingles, "7".to_string()));
        assert_eq!(parse_draw_label("Open"), (Discipline::MensDoubles, "Recreatief".to_string()));
    }

    #[test]
    fn court_pattern_priority() {
        assert_eq!(parse_court("Hoofdlocatie - B6").unwrap(), Some(6));
        assert_eq!(parse_court("Complexe sportif de Walhain - 1").unwrap(), Some(1));
        assert_eq!(parse_court("Zaal B3 oost").unwrap(), Some(3));
        assert_eq!(parse_court("Sporthal 12").unwrap(), Some(12));
        assert_eq!(parse_court("Sporthal Noord").unwrap(), None);
        assert!(parse_court("Baan - 99999999999").is_err());
    }

    #[test]
    fn non_ascii_digits_are_not_numbers() {
        assert_eq!(parse_court("Zaal - \u{663}").unwrap(), None);
        assert_eq!(parse_court("Sporthal \u{967}\u{968}").unwrap(), None);
        assert_eq!(parse_draw_label("HE \u{661}-\u{662}"), (Discipline::MensSingles, "Recreatief".to_string()));

        let html = page(&row("15:00", "HE 3", &["Kim"], &["Lou"], "", "Zaal - \u{663}"));
        let m = &extract_matches(&html, &ExtractOptions::live()).unwrap()[0];
        assert_eq!(m.court, None);
    }

    #[test]
    fn serializes_wire_shape() {
        let html = page(&row("14:30", "GD 5-6", &["Ann", "Bob"], &["Cis", "Dirk"], "", "Sporthal Noord"));
        let m = &extract_matches(&html, &ExtractOptions::live()).unwrap()[0];
        let json = serde_json::to_value(m).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "14:30-GD-Ann-Bob",
                "matchNumber": "14:30",
                "time": "14:30",
                "court": "",
                "teamA": {"names": ["Ann", "Bob"], "discipline": "GD", "levelLabel": "5-6"},
                "teamB": {"names": ["Cis", "Dirk"], "discipline": "GD", "levelLabel": "5-6"},
            })
        );
    }

    #[test]
    fn fixture_page() {
        let html = std::fs::read_to_string("tests/fixtures/live_schedule.html").unwrap();
        let matches = extract_matches(&html, &ExtractOptions::live()).unwrap();
        assert_eq!(matches.len(), 3, "got: {:?}", matches);
        assert_eq!(matches[0].court, Some(6));
        assert!(matches.iter().all(|m| !m.team_a.names[0].contains('[')));
    }
}

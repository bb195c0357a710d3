use std::collections::{BTreeMap, BTreeSet};

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use tracing::debug;

use super::blocks::MatchBlock;
use super::discipline::Discipline;
use super::names::normalize_name;
use crate::config::ExtractOptions;

/// Two players, stored sorted so (A, B) and (B, A) are the same team.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Team(String, String);

impl Team {
    /// None when the two names are equal; a team needs two distinct players.
    pub fn new(a: String, b: String) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Team(a, b)),
            std::cmp::Ordering::Greater => Some(Team(b, a)),
            std::cmp::Ordering::Equal => None,
        }
    }

    fn sort_key(&self) -> String {
        format!("{} / {}", self.0, self.1)
    }
}

impl Serialize for Team {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.0)?;
        seq.serialize_element(&self.1)?;
        seq.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LevelEntries {
    Singles(Vec<String>),
    Doubles(Vec<Team>),
}

impl LevelEntries {
    pub fn entry_count(&self) -> usize {
        match self {
            LevelEntries::Singles(v) => v.len(),
            LevelEntries::Doubles(v) => v.len(),
        }
    }
}

/// Canonical aggregate, already in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    disciplines: Vec<(Discipline, Vec<(String, LevelEntries)>)>,
}

impl Playlist {
    pub fn disciplines(&self) -> impl Iterator<Item = Discipline> + '_ {
        self.disciplines.iter().map(|(d, _)| *d)
    }

    pub fn level_keys(&self, discipline: Discipline) -> Vec<&str> {
        self.levels(discipline)
            .map(|levels| levels.iter().map(|(k, _)| k.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, discipline: Discipline, level: &str) -> Option<&LevelEntries> {
        self.levels(discipline)?
            .iter()
            .find(|(k, _)| k == level)
            .map(|(_, e)| e)
    }

    fn levels(&self, discipline: Discipline) -> Option<&Vec<(String, LevelEntries)>> {
        self.disciplines
            .iter()
            .find(|(d, _)| *d == discipline)
            .map(|(_, levels)| levels)
    }
}

struct Levels<'a>(&'a [(String, LevelEntries)]);

impl Serialize for Levels<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, entries) in self.0 {
            map.serialize_entry(key, entries)?;
        }
        map.end()
    }
}

impl Serialize for Playlist {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.disciplines.len()))?;
        for (discipline, levels) in &self.disciplines {
            map.serialize_entry(discipline, &Levels(levels))?;
        }
        map.end()
    }
}

/// Folds match blocks from any number of documents into per-level sets.
#[derive(Debug, Default)]
pub struct PlaylistBuilder {
    opts: ExtractOptions,
    singles: BTreeMap<Discipline, BTreeMap<String, BTreeSet<String>>>,
    doubles: BTreeMap<Discipline, BTreeMap<String, BTreeSet<Team>>>,
    blocks_seen: usize,
}

impl PlaylistBuilder {
    pub fn new(opts: ExtractOptions) -> Self {
        Self {
            opts,
            ..Self::default()
        }
    }

    /// Number of match blocks folded in so far.
    pub fn blocks_seen(&self) -> usize {
        self.blocks_seen
    }

    pub fn add_blocks<'a>(&mut self, blocks: impl IntoIterator<Item = &'a MatchBlock>) {
        for block in blocks {
            self.add_block(block);
        }
    }

    pub fn add_block(&mut self, block: &MatchBlock) {
        self.blocks_seen += 1;
        if block.discipline.is_doubles() {
            self.add_doubles(block);
        } else {
            self.add_singles(block);
        }
    }

    fn add_singles(&mut self, block: &MatchBlock) {
        let opts = self.opts;
        let names: Vec<String> = block
            .rows
            .iter()
            .flatten()
            .map(|n| normalize_name(n, &opts))
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            return;
        }

        self.singles
            .entry(block.discipline)
            .or_default()
            .entry(block.level_key.clone())
            .or_default()
            .extend(names);
    }

    fn add_doubles(&mut self, block: &MatchBlock) {
        for row in &block.rows {
            let [a, b] = row.as_slice() else {
                debug!(
                    "Skipping {} {} row with {} names: {:?}",
                    block.discipline,
                    block.level_key,
                    row.len(),
                    row
                );
                continue;
            };

            let a = normalize_name(a, &self.opts);
            let b = normalize_name(b, &self.opts);
            if a.is_empty() || b.is_empty() {
                continue;
            }
            let Some(team) = Team::new(a, b) else {
                debug!("Skipping {} {} row naming one player twice", block.discipline, block.level_key);
                continue;
            };

            self.doubles
                .entry(block.discipline)
                .or_default()
                .entry(block.level_key.clone())
                .or_default()
                .insert(team);
        }
    }

    /// Produce the deterministic output ordering.
    pub fn finish(self) -> Playlist {
        let mut by_discipline: BTreeMap<Discipline, Vec<(String, LevelEntries)>> = BTreeMap::new();

        for (discipline, levels) in self.singles {
            let out = by_discipline.entry(discipline).or_default();
            for (level, names) in levels {
                // BTreeSet iteration is already sorted.
                out.push((level, LevelEntries::Singles(names.into_iter().collect())));
            }
        }

        for (discipline, levels) in self.doubles {
            let out = by_discipline.entry(discipline).or_default();
            for (level, teams) in levels {
                let mut teams: Vec<Team> = teams.into_iter().collect();
                teams.sort_by_cached_key(Team::sort_key);
                out.push((level, LevelEntries::Doubles(teams)));
            }
        }

        let disciplines = by_discipline
            .into_iter()
            .map(|(discipline, mut levels)| {
                levels.sort_by(|(a, _), (b, _)| compare_level_keys(a, b));
                (discipline, levels)
            })
            .collect();

        Playlist { disciplines }
    }
}

/// Shorter keys first, then plain string order: "7" < "3-4" < "11-12".
pub fn compare_level_keys(a: &str, b: &str) -> std::cmp::Ordering {
    a.chars()
        .count()
        .cmp(&b.chars().count())
        .then_with(|| a.cmp(b))
}

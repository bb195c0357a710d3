use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// Category of play, serialized as its two-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Discipline {
    #[serde(rename = "HE")]
    MensSingles,
    #[serde(rename = "HD")]
    MensDoubles,
    #[serde(rename = "DE")]
    WomensSingles,
    #[serde(rename = "DD")]
    WomensDoubles,
    #[serde(rename = "GD")]
    MixedDoubles,
}

impl Discipline {
    /// Detection priority used when a code is searched for inside free text.
    pub const ALL: [Discipline; 5] = [
        Discipline::MensSingles,
        Discipline::MensDoubles,
        Discipline::WomensSingles,
        Discipline::WomensDoubles,
        Discipline::MixedDoubles,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Discipline::MensSingles => "HE",
            Discipline::MensDoubles => "HD",
            Discipline::WomensSingles => "DE",
            Discipline::WomensDoubles => "DD",
            Discipline::MixedDoubles => "GD",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.code() == code)
    }

    pub fn is_doubles(self) -> bool {
        matches!(
            self,
            Discipline::MensDoubles | Discipline::WomensDoubles | Discipline::MixedDoubles
        )
    }

    /// First code contained anywhere in `text`, in `ALL` order.
    pub fn detect_in(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| text.contains(d.code()))
    }
}

// Ordered by code so maps keyed on Discipline iterate alphabetically.
impl Ord for Discipline {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code().cmp(other.code())
    }
}

impl PartialOrd for Discipline {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

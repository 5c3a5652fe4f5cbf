use serde::Serialize;
use std::fmt;

/// Quality of the lagna-lord to nakshatra-lord arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcQuality {
    Excellent,
    Ok,
    Avoid,
}

impl ArcQuality {
    /// Classify an inclusive sign arc (1..=12).
    pub fn from_arc(arc: u8) -> Self {
        match arc {
            1 | 4 | 7 | 10 => ArcQuality::Excellent,
            2 | 3 | 11 | 12 => ArcQuality::Ok,
            _ => ArcQuality::Avoid,
        }
    }

    pub fn passes(self) -> bool {
        !matches!(self, ArcQuality::Avoid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    KetuInLagna,
    Avoid,
    Acceptable,
    Good,
    VeryGood,
    Excellent,
}

impl Grade {
    pub fn score(self) -> u8 {
        match self {
            Grade::Excellent => 5,
            Grade::VeryGood => 4,
            Grade::Good => 3,
            Grade::Acceptable => 2,
            Grade::Avoid => 1,
            Grade::KetuInLagna => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::Excellent => "Excellent Muhurtha",
            Grade::VeryGood => "Very Good Muhurtha",
            Grade::Good => "Good Muhurtha",
            Grade::Acceptable => "Acceptable",
            Grade::Avoid => "Avoid",
            Grade::KetuInLagna => "Avoid (Ketu in Lagna)",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Grade a moment that was not vetoed.
pub fn grade(rules_pass: u8, quality: ArcQuality) -> Grade {
    match (rules_pass, quality) {
        (5, ArcQuality::Excellent) => Grade::Excellent,
        (5, ArcQuality::Ok) => Grade::VeryGood,
        (4, ArcQuality::Excellent | ArcQuality::Ok) => Grade::Good,
        (3, ArcQuality::Excellent | ArcQuality::Ok) => Grade::Acceptable,
        (n, _) if n >= 4 => Grade::Good,
        (3, _) => Grade::Acceptable,
        _ => Grade::Avoid,
    }
}

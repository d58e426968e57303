//! Fixed career-stage vocabulary and nearest-match lookup
//!
//! Free text is never rejected: any non-empty token maps onto the closest
//! stage label by Jaro-Winkler similarity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One career stage from the fixed vocabulary
///
/// Declaration order is the canonical order used for tie-breaking and for
/// listing stages in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Student,
    Undergrad,
    Postgrad,
    Postdoc,
    Lecturer,
    Professor,
    Reader,
    Academic,
    Megaservice,
    Service,
    Microservice,
    Consultant,
    Sales,
    Software,
    Technology,
    Noc,
    Ioc,
    Independent,
    Exploration,
    #[serde(rename = "e&p")]
    Ep,
    Government,
    Agency,
    Survey,
    Localgov,
    Mining,
    Unemployed,
    Retired,
    Startup,
    #[serde(rename = "self-employed")]
    SelfEmployed,
    Other,
}

/// Label did not exactly name a stage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown stage: {0}")]
pub struct UnknownStage(pub String);

impl Stage {
    /// Every stage, in canonical order
    pub const ALL: [Stage; 30] = [
        Stage::Student,
        Stage::Undergrad,
        Stage::Postgrad,
        Stage::Postdoc,
        Stage::Lecturer,
        Stage::Professor,
        Stage::Reader,
        Stage::Academic,
        Stage::Megaservice,
        Stage::Service,
        Stage::Microservice,
        Stage::Consultant,
        Stage::Sales,
        Stage::Software,
        Stage::Technology,
        Stage::Noc,
        Stage::Ioc,
        Stage::Independent,
        Stage::Exploration,
        Stage::Ep,
        Stage::Government,
        Stage::Agency,
        Stage::Survey,
        Stage::Localgov,
        Stage::Mining,
        Stage::Unemployed,
        Stage::Retired,
        Stage::Startup,
        Stage::SelfEmployed,
        Stage::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Student => "student",
            Stage::Undergrad => "undergrad",
            Stage::Postgrad => "postgrad",
            Stage::Postdoc => "postdoc",
            Stage::Lecturer => "lecturer",
            Stage::Professor => "professor",
            Stage::Reader => "reader",
            Stage::Academic => "academic",
            Stage::Megaservice => "megaservice",
            Stage::Service => "service",
            Stage::Microservice => "microservice",
            Stage::Consultant => "consultant",
            Stage::Sales => "sales",
            Stage::Software => "software",
            Stage::Technology => "technology",
            Stage::Noc => "noc",
            Stage::Ioc => "ioc",
            Stage::Independent => "independent",
            Stage::Exploration => "exploration",
            Stage::Ep => "e&p",
            Stage::Government => "government",
            Stage::Agency => "agency",
            Stage::Survey => "survey",
            Stage::Localgov => "localgov",
            Stage::Mining => "mining",
            Stage::Unemployed => "unemployed",
            Stage::Retired => "retired",
            Stage::Startup => "startup",
            Stage::SelfEmployed => "self-employed",
            Stage::Other => "other",
        }
    }

    /// Nearest stage to free text
    ///
    /// Returns `None` only for empty or whitespace-only text. Exact labels
    /// short-circuit; otherwise the highest Jaro-Winkler score wins, ties
    /// going to the earlier stage in [`Stage::ALL`].
    pub fn closest(text: &str) -> Option<Stage> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        if let Ok(stage) = needle.parse::<Stage>() {
            return Some(stage);
        }

        let mut best = Stage::ALL[0];
        let mut best_score = f64::MIN;
        for stage in Stage::ALL {
            let score = strsim::jaro_winkler(&needle, stage.as_str());
            if score > best_score {
                best = stage;
                best_score = score;
            }
        }

        tracing::trace!(text = %needle, stage = %best, score = best_score, "Matched stage");
        Some(best)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = UnknownStage;

    /// Exact, case-insensitive label lookup
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownStage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for stage in Stage::ALL {
            assert_eq!(stage.as_str().parse::<Stage>(), Ok(stage));
        }
    }

    #[test]
    fn test_all_is_in_declaration_order() {
        for pair in Stage::ALL.windows(2) {
            assert!(pair[0] < pair[1], "{} should sort before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("PostDoc".parse::<Stage>(), Ok(Stage::Postdoc));
        assert_eq!(" Self-Employed ".parse::<Stage>(), Ok(Stage::SelfEmployed));
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        assert_eq!(
            "astronaut".parse::<Stage>(),
            Err(UnknownStage("astronaut".to_string()))
        );
    }

    #[test]
    fn test_closest_exact_label() {
        assert_eq!(Stage::closest("professor"), Some(Stage::Professor));
        assert_eq!(Stage::closest("  NOC "), Some(Stage::Noc));
    }

    #[test]
    fn test_closest_fuzzy_matches() {
        assert_eq!(Stage::closest("undergraduate"), Some(Stage::Undergrad));
        assert_eq!(Stage::closest("post-doc"), Some(Stage::Postdoc));
        assert_eq!(Stage::closest("self employed"), Some(Stage::SelfEmployed));
        assert_eq!(Stage::closest("gov"), Some(Stage::Government));
        assert_eq!(Stage::closest("consulting"), Some(Stage::Consultant));
    }

    #[test]
    fn test_closest_industry_and_rank_labels() {
        assert_eq!(Stage::closest("reader"), Some(Stage::Reader));
        assert_eq!(Stage::closest("sales"), Some(Stage::Sales));
        assert_eq!(Stage::closest("exploration"), Some(Stage::Exploration));
        assert_eq!(Stage::closest("e&p"), Some(Stage::Ep));
        assert_eq!(Stage::closest("E&P"), Some(Stage::Ep));
        assert_eq!(Stage::closest("microservice"), Some(Stage::Microservice));
        assert_eq!(Stage::closest("megaservice"), Some(Stage::Megaservice));
        assert_eq!(Stage::closest("salesman"), Some(Stage::Sales));
    }

    #[test]
    fn test_closest_always_matches_nonempty_text() {
        assert!(Stage::closest("zzzz").is_some());
        assert!(Stage::closest("42").is_some());
    }

    #[test]
    fn test_closest_empty_text() {
        assert_eq!(Stage::closest(""), None);
        assert_eq!(Stage::closest("   "), None);
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&Stage::SelfEmployed).unwrap();
        assert_eq!(json, "\"self-employed\"");
        let stage: Stage = serde_json::from_str("\"localgov\"").unwrap();
        assert_eq!(stage, Stage::Localgov);
        assert_eq!(serde_json::to_string(&Stage::Ep).unwrap(), "\"e&p\"");
    }
}

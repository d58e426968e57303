//! Free-text career history parser
//!
//! A record is a comma-separated list of `<stage text> [<years>]` tokens, e.g.
//! `"undergrad 4, PhD 3.5, postdoc 2yrs, government"`. Each token is mapped
//! onto the fixed vocabulary with [`Stage::closest`].

use serde::Serialize;

use crate::vocab::Stage;

/// Unit words accepted after a trailing number ("4 years")
const YEAR_UNITS: [&str; 5] = ["y", "yr", "yrs", "year", "years"];

/// One parsed token of a submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareerStep {
    pub stage: Stage,
    /// Years spent in the stage, when the token carried a usable number
    pub years: Option<f64>,
    /// Trimmed source token
    pub raw: String,
}

/// Ordered stages extracted from one submission
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CareerPath {
    steps: Vec<CareerStep>,
}

impl CareerPath {
    pub fn new(steps: Vec<CareerStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[CareerStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.steps.iter().map(|s| s.stage).collect()
    }

    /// Consecutive stage pairs, including self-transitions
    pub fn transitions(&self) -> impl Iterator<Item = (Stage, Stage)> + '_ {
        self.steps.windows(2).map(|w| (w[0].stage, w[1].stage))
    }

    pub fn last_stage(&self) -> Option<Stage> {
        self.steps.last().map(|s| s.stage)
    }

    /// Sum of known durations; `None` when no step had one
    pub fn total_years(&self) -> Option<f64> {
        self.steps
            .iter()
            .filter_map(|s| s.years)
            .fold(None, |acc, y| Some(acc.unwrap_or(0.0) + y))
    }
}

/// Parse a record into stages with durations
pub fn get_info(record: &str) -> CareerPath {
    let steps = record
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(parse_token)
        .collect();

    CareerPath::new(steps)
}

/// Parse a record into its stage sequence only
pub fn get_path(record: &str) -> Vec<Stage> {
    get_info(record).stages()
}

fn parse_token(token: &str) -> Option<CareerStep> {
    let words: Vec<&str> = token.split_whitespace().collect();
    let (label_words, years) = split_duration(&words);

    let label = label_words.join(" ");
    let stage = Stage::closest(&label)?;

    Some(CareerStep {
        stage,
        years,
        raw: token.to_string(),
    })
}

/// Split trailing duration words off a token
///
/// Returns the label words and the parsed duration. Duration words are only
/// recognised when at least one label word remains.
fn split_duration<'a>(words: &'a [&'a str]) -> (&'a [&'a str], Option<f64>) {
    let n = words.len();

    // "<label> 4 years"
    if n > 2 && YEAR_UNITS.contains(&words[n - 1].to_lowercase().as_str()) {
        if let Some(value) = leading_number(words[n - 2]) {
            return (&words[..n - 2], usable_years(value));
        }
    }

    // "<label> 4" / "<label> 4yrs"
    if n > 1 {
        if let Some(value) = leading_number(words[n - 1]) {
            return (&words[..n - 1], usable_years(value));
        }
    }

    (words, None)
}

/// Numeric prefix of a word ("3yrs" -> 3.0, "-2" -> -2.0)
fn leading_number(word: &str) -> Option<f64> {
    let end = word
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(word.len());

    let prefix = &word[..end];
    if !prefix.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    prefix.parse::<f64>().ok()
}

fn usable_years(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_path_basic() {
        let path = get_path("undergrad 4, postgrad 3, postdoc 2, government 10");
        assert_eq!(
            path,
            vec![Stage::Undergrad, Stage::Postgrad, Stage::Postdoc, Stage::Government]
        );
    }

    #[test]
    fn test_get_info_durations() {
        let info = get_info("undergrad 4, postdoc 2.5, consultant 3yrs, retired");
        let years: Vec<Option<f64>> = info.steps().iter().map(|s| s.years).collect();
        assert_eq!(years, vec![Some(4.0), Some(2.5), Some(3.0), None]);
        assert_eq!(info.total_years(), Some(9.5));
    }

    #[test]
    fn test_unit_word_after_number() {
        let info = get_info("software 6 years, startup 1 yr");
        assert_eq!(info.stages(), vec![Stage::Software, Stage::Startup]);
        assert_eq!(info.steps()[0].years, Some(6.0));
        assert_eq!(info.steps()[1].years, Some(1.0));
    }

    #[test]
    fn test_multi_word_label() {
        let info = get_info("self employed 3");
        assert_eq!(info.stages(), vec![Stage::SelfEmployed]);
        assert_eq!(info.steps()[0].years, Some(3.0));
        assert_eq!(info.steps()[0].raw, "self employed 3");
    }

    #[test]
    fn test_empty_and_blank_tokens_skipped() {
        assert!(get_info("").is_empty());
        assert!(get_info("   ").is_empty());
        assert_eq!(get_path(" , undergrad 3 ,, ,postdoc"), vec![Stage::Undergrad, Stage::Postdoc]);
    }

    #[test]
    fn test_single_number_token_is_a_label() {
        let info = get_info("4");
        assert_eq!(info.len(), 1);
        assert_eq!(info.steps()[0].years, None);
    }

    #[test]
    fn test_negative_duration_dropped() {
        let info = get_info("mining -3");
        assert_eq!(info.stages(), vec![Stage::Mining]);
        assert_eq!(info.steps()[0].years, None);
        assert_eq!(info.total_years(), None);
    }

    #[test]
    fn test_transitions() {
        let info = get_info("undergrad 3, postdoc 2, postdoc 2, professor");
        let transitions: Vec<(Stage, Stage)> = info.transitions().collect();
        assert_eq!(
            transitions,
            vec![
                (Stage::Undergrad, Stage::Postdoc),
                (Stage::Postdoc, Stage::Postdoc),
                (Stage::Postdoc, Stage::Professor),
            ]
        );
        assert_eq!(info.last_stage(), Some(Stage::Professor));
    }

    #[test]
    fn test_single_stage_has_no_transitions() {
        let info = get_info("student 2");
        assert_eq!(info.transitions().count(), 0);
        assert_eq!(info.last_stage(), Some(Stage::Student));
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("3yrs"), Some(3.0));
        assert_eq!(leading_number("2.5"), Some(2.5));
        assert_eq!(leading_number("-2"), Some(-2.0));
        assert_eq!(leading_number("years"), None);
        assert_eq!(leading_number("-"), None);
        assert_eq!(leading_number("1.2.3"), None);
    }
}

use std::str::FromStr;
use thiserror::Error;

crate::define_id_enum! {
    /// Language a submission is declared to be written in
    LanguageId {
        Python => "python" : "Python" | "py" | "python3",
        JavaScript => "javascript" : "JavaScript" | "js" | "node" | "nodejs",
        Ruby => "ruby" : "Ruby" | "rb",
        Go => "go" : "Go" | "golang",
    }
}

/// Minimum Jaro-Winkler similarity for a "did you mean" hint
const SUGGESTION_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Unknown language '{name}'{}. Supported: python, javascript, ruby, go",
    .suggestion.map(|s| format!(" (did you mean '{}'?)", s)).unwrap_or_default()
)]
pub struct UnknownLanguage {
    pub name: String,
    pub suggestion: Option<&'static str>,
}

impl FromStr for LanguageId {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownLanguage {
            name: s.to_string(),
            suggestion: closest_name(s),
        })
    }
}

fn closest_name(input: &str) -> Option<&'static str> {
    let input = input.trim().to_ascii_lowercase();
    LanguageId::accepted_names()
        .iter()
        .map(|candidate| (*candidate, strsim::jaro_winkler(&input, candidate)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate)
}

// Core data structures for the qamask pipeline

use serde::{Deserialize, Serialize};

/// Pattern of a WikiData identifier token: `Q…` for entities, `P…` for
/// properties, each followed by decimal digits.
pub const IDENTIFIER_PATTERN: &str = "[QP][0-9]+";

/// One raw LC-QuAD 2.0 entry, as found in the upstream `train.json` /
/// `test.json` arrays. Only the fields the pipeline reads are modelled;
/// unknown keys are ignored on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawQuestion {
    pub uid: u64,

    /// Human-phrased question; may be absent or a placeholder upstream
    #[serde(default)]
    pub question: Option<String>,

    /// Crowd-sourced paraphrase of the question
    #[serde(default)]
    pub paraphrased_question: Option<String>,

    /// Machine-generated question template realisation
    #[serde(default, rename = "NNQT_question")]
    pub nnqt_question: Option<String>,

    /// SPARQL formulation over WikiData; source of the identifiers
    #[serde(default)]
    pub sparql_wikidata: String,
}

impl RawQuestion {
    /// The best available question text: the curated question, then the
    /// paraphrase, then the template realisation.
    #[must_use]
    pub fn best_question(&self) -> Option<&str> {
        self.question
            .as_deref()
            .filter(|q| !q.is_empty())
            .or_else(|| {
                self.paraphrased_question
                    .as_deref()
                    .filter(|q| !q.is_empty())
            })
            .or_else(|| self.nnqt_question.as_deref().filter(|q| !q.is_empty()))
    }
}

/// A question-answer pair addressed by its LC-QuAD UID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswerPair {
    pub uid: u64,
    pub question: String,
    pub answer: String,
}

/// A masked question-answer pair, persisted as `{"q": …, "a": …}` keyed by
/// UID-as-string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskedPair {
    #[serde(rename = "q")]
    pub question: String,

    #[serde(rename = "a")]
    pub answer: String,
}

/// An LC-QuAD 2.0 dataset split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Test,
}

impl Split {
    /// String form used in file names.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
        }
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a WikiData identifier names an entity (`Q…`) or a property
/// (`P…`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Entity,
    Property,
}

impl IdentifierKind {
    /// Classify an identifier by its leading letter.
    #[must_use]
    pub fn of(identifier: &str) -> Option<Self> {
        match identifier.as_bytes().first() {
            Some(b'Q') => Some(Self::Entity),
            Some(b'P') => Some(Self::Property),
            _ => None,
        }
    }

    /// The letter masks of this kind begin with.
    #[must_use]
    pub fn mask_letter(&self) -> char {
        match self {
            Self::Entity => 'Q',
            Self::Property => 'P',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_question_preference_order() {
        let mut raw = RawQuestion {
            uid: 1,
            question: Some("curated".into()),
            paraphrased_question: Some("paraphrased".into()),
            nnqt_question: Some("template".into()),
            sparql_wikidata: String::new(),
        };
        assert_eq!(raw.best_question(), Some("curated"));

        raw.question = None;
        assert_eq!(raw.best_question(), Some("paraphrased"));

        raw.paraphrased_question = Some(String::new());
        assert_eq!(raw.best_question(), Some("template"));
    }

    #[test]
    fn test_identifier_kind() {
        assert_eq!(IdentifierKind::of("Q25188"), Some(IdentifierKind::Entity));
        assert_eq!(IdentifierKind::of("P57"), Some(IdentifierKind::Property));
        assert_eq!(IdentifierKind::of("X1"), None);
        assert_eq!(IdentifierKind::of(""), None);
    }

    #[test]
    fn test_masked_pair_serialises_to_short_keys() {
        let pair = MaskedPair {
            question: "who directed Q0 ?".into(),
            answer: "select var_1 where brack_open Q0 P0 var_1 brack_close".into(),
        };
        let json = serde_json::to_string(&pair).unwrap();
        assert!(json.contains("\"q\":"));
        assert!(json.contains("\"a\":"));
    }

    #[test]
    fn test_raw_question_tolerates_missing_fields() {
        let raw: RawQuestion =
            serde_json::from_str(r#"{"uid": 7, "sparql_wikidata": "SELECT ?x"}"#).unwrap();
        assert_eq!(raw.uid, 7);
        assert_eq!(raw.best_question(), None);
    }
}

//! Masking of question-answer pairs
//!
//! For every WikiData identifier attached to a question, the consumer
//! aligns one of the identifier's labels into the question text via the
//! longest common substring, checks the chosen spans for overlap, and
//! replaces each span with a mask token (`Q0`, `Q1`, …, `P0`, …). The same
//! masks then replace the identifiers inside the raw SPARQL answer. A
//! question whose identifiers cannot all be aligned is skipped with a
//! classified failure.
//!
//! Matching is by explicit code-point position; labels may contain any
//! Unicode, including regex metacharacters, without escaping.

use crate::models::{IdentifierKind, MaskedPair, IDENTIFIER_PATTERN};
use crate::suffix_tree::lcs::{lcs_of_sequences, LcsError};
use crate::unicode::UnicodeString;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

/// WikiData identifier tokens inside a SPARQL answer.
static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern compiles"));

/// Classified reasons a question is excluded from the masked dataset.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaskError {
    /// An identifier has no candidate labels, or none of them shares a
    /// substring with the question
    #[error("identifier {0} has no label matching the question")]
    NoLabelsForSome(String),

    /// Every label of the identifier scored below the caller's threshold
    #[error("best label for {id} matched a fraction of {best:.3}, below the threshold")]
    ThresholdNotMet { id: String, best: f64 },

    /// Two chosen label spans overlap inside the question
    #[error("label matches for {} and {} overlap in the question", .first.id, .second.id)]
    Collision {
        first: Box<LabelMatch>,
        second: Box<LabelMatch>,
    },

    /// The question and a label together exhaust every separator pair
    #[error("no usable separator pair for the question and its labels")]
    NoUsableSeparator,

    /// A violated invariant; indicates a bug and is fatal to this question
    #[error("masking invariant violated: {0}")]
    Logic(String),
}

impl MaskError {
    /// Short stable tag for per-reason statistics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoLabelsForSome(_) => "no-labels",
            Self::ThresholdNotMet { .. } => "threshold-not-met",
            Self::Collision { .. } => "collision",
            Self::NoUsableSeparator => "no-separator",
            Self::Logic(_) => "logic",
        }
    }
}

/// The chosen realisation of one identifier within a question: the label
/// that produced the match, the inclusive code-point span of the match, and
/// how much of the label it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMatch {
    /// WikiData identifier, e.g. `Q25188`
    pub id: String,
    /// The candidate label the common substring came from
    pub label: String,
    /// Inclusive code-point start of the match in the question
    pub start: usize,
    /// Inclusive code-point end of the match in the question
    pub end: usize,
    /// Number of label code points matched
    pub matched: usize,
    /// `matched` over the label's code-point length
    pub fraction: f64,
}

/// Progress of one question through the masking pipeline. `Masked` and a
/// returned [`MaskError`] are the terminal outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskStage {
    Pending,
    LabelsChosen,
    CollisionCleared,
    Masked,
}

/// Mask one question-answer pair.
///
/// `labels` maps each identifier attached to the question to its candidate
/// labels; `threshold` is the minimum accepted matched fraction in
/// `[0.0, 1.0]`.
///
/// # Errors
///
/// Any [`MaskError`]; the caller records it and continues with the next
/// question.
pub fn mask_question_answer(
    question: &str,
    answer: &str,
    labels: &BTreeMap<String, Vec<String>>,
    threshold: f64,
) -> Result<MaskedPair, MaskError> {
    let mut stage = MaskStage::Pending;
    tracing::trace!(?stage, identifiers = labels.len(), "masking question");
    let question_seq =
        UnicodeString::new(question).map_err(|e| MaskError::Logic(e.to_string()))?;

    let mut matches = choose_label_matches(&question_seq, labels, threshold)?;
    stage = MaskStage::LabelsChosen;
    tracing::trace!(?stage, matches = matches.len(), "labels chosen");

    sort_matches(&mut matches);
    ensure_collision_free(&matches)?;
    stage = MaskStage::CollisionCleared;
    tracing::trace!(?stage, "no overlapping spans");

    let masks = assign_masks(&matches)?;
    let masked_question = apply_question_masks(&question_seq, &matches, &masks)?;
    let masked_answer = apply_answer_masks(answer, labels, &masks)?;
    stage = MaskStage::Masked;
    tracing::trace!(?stage, "question masked");

    Ok(MaskedPair {
        question: masked_question,
        answer: masked_answer,
    })
}

/// Pick, per identifier, the candidate label whose LCS against the question
/// covers the largest fraction of the label. Ties keep the earlier
/// candidate. The recorded span is the first occurrence of the common
/// substring within the question.
fn choose_label_matches(
    question: &UnicodeString,
    labels: &BTreeMap<String, Vec<String>>,
    threshold: f64,
) -> Result<Vec<LabelMatch>, MaskError> {
    let mut matches = Vec::with_capacity(labels.len());
    for (id, candidates) in labels {
        let mut best: Option<LabelMatch> = None;
        for label in candidates {
            let label_seq = match UnicodeString::new(label) {
                Ok(seq) if !seq.is_empty() => seq,
                _ => continue,
            };
            let lcs = match lcs_of_sequences(question, &label_seq) {
                Ok(Some(lcs)) => lcs,
                Ok(None) | Err(LcsError::Empty) => continue,
                Err(LcsError::NoUsableSeparator) => return Err(MaskError::NoUsableSeparator),
                Err(LcsError::Unicode(e)) => return Err(MaskError::Logic(e.to_string())),
            };
            let matched = lcs.len();
            let fraction = matched as f64 / label_seq.len() as f64;
            if best.as_ref().map_or(true, |b| fraction > b.fraction) {
                let start = question.find(&lcs).ok_or_else(|| {
                    MaskError::Logic(format!(
                        "common substring {:?} not found in the question",
                        lcs.to_string()
                    ))
                })?;
                best = Some(LabelMatch {
                    id: id.clone(),
                    label: label.clone(),
                    start,
                    end: start + matched - 1,
                    matched,
                    fraction,
                });
            }
        }
        match best {
            None => return Err(MaskError::NoLabelsForSome(id.clone())),
            Some(m) if m.fraction < threshold => {
                return Err(MaskError::ThresholdNotMet {
                    id: id.clone(),
                    best: m.fraction,
                })
            }
            Some(m) => matches.push(m),
        }
    }
    Ok(matches)
}

/// Order spans by start, then end, ascending.
fn sort_matches(matches: &mut [LabelMatch]) {
    matches.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
}

/// Scan adjacent spans of a sorted slice for overlap.
fn ensure_collision_free(matches: &[LabelMatch]) -> Result<(), MaskError> {
    for pair in matches.windows(2) {
        if pair[0].end >= pair[1].start {
            return Err(MaskError::Collision {
                first: Box::new(pair[0].clone()),
                second: Box::new(pair[1].clone()),
            });
        }
    }
    Ok(())
}

/// Allocate mask tokens walking the sorted spans left to right. Entities
/// and properties draw from separate counters, both starting at 0.
fn assign_masks(matches: &[LabelMatch]) -> Result<BTreeMap<String, String>, MaskError> {
    let mut masks = BTreeMap::new();
    let mut next_entity = 0u32;
    let mut next_property = 0u32;
    for m in matches {
        if masks.contains_key(&m.id) {
            continue;
        }
        let kind = IdentifierKind::of(&m.id).ok_or_else(|| {
            MaskError::Logic(format!("identifier {} is neither an entity nor a property", m.id))
        })?;
        let counter = match kind {
            IdentifierKind::Entity => &mut next_entity,
            IdentifierKind::Property => &mut next_property,
        };
        masks.insert(m.id.clone(), format!("{}{}", kind.mask_letter(), counter));
        *counter += 1;
    }
    Ok(masks)
}

/// Rebuild the question with every chosen span replaced by its mask.
/// Walking the sorted, non-overlapping spans in ascending order keeps the
/// remaining indices valid.
fn apply_question_masks(
    question: &UnicodeString,
    matches: &[LabelMatch],
    masks: &BTreeMap<String, String>,
) -> Result<String, MaskError> {
    let mut out = String::new();
    let mut pos = 0usize;
    for m in matches {
        let mask = masks
            .get(&m.id)
            .ok_or_else(|| MaskError::Logic(format!("no mask assigned to {}", m.id)))?;
        while pos < m.start {
            out.push(question.at(pos));
            pos += 1;
        }
        out.push_str(mask);
        pos = m.end + 1;
    }
    while pos < question.len() {
        out.push(question.at(pos));
        pos += 1;
    }
    Ok(out)
}

/// Replace, in the raw answer, every identifier token that was masked in
/// the question by its mask. Identifier tokens outside this question's set
/// pass through untouched; one inside the set but missing from the mask map
/// is a bug.
fn apply_answer_masks(
    answer: &str,
    labels: &BTreeMap<String, Vec<String>>,
    masks: &BTreeMap<String, String>,
) -> Result<String, MaskError> {
    let mut out = String::with_capacity(answer.len());
    let mut last = 0usize;
    for found in IDENTIFIER_REGEX.find_iter(answer) {
        out.push_str(&answer[last..found.start()]);
        let token = found.as_str();
        if let Some(mask) = masks.get(token) {
            out.push_str(mask);
        } else if labels.contains_key(token) {
            return Err(MaskError::Logic(format!(
                "identifier {token} appears in the answer but has no assigned mask"
            )));
        } else {
            out.push_str(token);
        }
        last = found.end();
    }
    out.push_str(&answer[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(id, ls)| {
                (
                    (*id).to_string(),
                    ls.iter().map(|l| (*l).to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_choose_picks_highest_fraction() {
        let question = UnicodeString::new("Who directed Inception?").unwrap();
        let labels = labels(&[("Q25188", &["Inception", "the movie Inception"])]);
        let matches = choose_label_matches(&question, &labels, 0.0).unwrap();
        assert_eq!(matches.len(), 1);
        // "Inception" matches fully; the longer label only partially.
        assert_eq!(matches[0].label, "Inception");
        assert_eq!(matches[0].matched, 9);
        assert!((matches[0].fraction - 1.0).abs() < f64::EPSILON);
        assert_eq!(matches[0].start, 13);
        assert_eq!(matches[0].end, 21);
    }

    #[test]
    fn test_choose_fails_without_common_substring() {
        let question = UnicodeString::new("zzz").unwrap();
        let labels = labels(&[("Q1", &["universe"])]);
        assert_eq!(
            choose_label_matches(&question, &labels, 0.0).unwrap_err(),
            MaskError::NoLabelsForSome("Q1".to_string())
        );
    }

    #[test]
    fn test_choose_fails_with_empty_candidate_list() {
        let question = UnicodeString::new("anything").unwrap();
        let labels = labels(&[("Q1", &[])]);
        assert_eq!(
            choose_label_matches(&question, &labels, 0.0).unwrap_err(),
            MaskError::NoLabelsForSome("Q1".to_string())
        );
    }

    #[test]
    fn test_threshold_gates_weak_matches() {
        let question = UnicodeString::new("an apple a day").unwrap();
        // Only "a" of the label occurs in the question.
        let labels = labels(&[("Q1", &["alphabet soup kitchen"])]);
        let err = choose_label_matches(&question, &labels, 0.6).unwrap_err();
        match err {
            MaskError::ThresholdNotMet { id, best } => {
                assert_eq!(id, "Q1");
                assert!(best < 0.6);
            }
            other => panic!("expected ThresholdNotMet, got {other:?}"),
        }
    }

    #[test]
    fn test_collision_detected_on_sorted_spans() {
        let a = LabelMatch {
            id: "Q1".into(),
            label: "alpha beta".into(),
            start: 4,
            end: 13,
            matched: 10,
            fraction: 1.0,
        };
        let b = LabelMatch {
            id: "Q2".into(),
            label: "beta".into(),
            start: 10,
            end: 13,
            matched: 4,
            fraction: 1.0,
        };
        let mut both = vec![a, b];
        sort_matches(&mut both);
        assert!(matches!(
            ensure_collision_free(&both),
            Err(MaskError::Collision { .. })
        ));
    }

    #[test]
    fn test_touching_spans_do_not_collide() {
        let a = LabelMatch {
            id: "Q1".into(),
            label: "ab".into(),
            start: 0,
            end: 1,
            matched: 2,
            fraction: 1.0,
        };
        let b = LabelMatch {
            id: "Q2".into(),
            label: "cd".into(),
            start: 2,
            end: 3,
            matched: 2,
            fraction: 1.0,
        };
        assert!(ensure_collision_free(&[a, b]).is_ok());
    }

    #[test]
    fn test_masks_counted_separately_from_zero() {
        let mk = |id: &str, start: usize| LabelMatch {
            id: id.into(),
            label: "x".into(),
            start,
            end: start,
            matched: 1,
            fraction: 1.0,
        };
        let matches = vec![mk("Q5", 0), mk("P57", 2), mk("Q42", 4), mk("P31", 6)];
        let masks = assign_masks(&matches).unwrap();
        assert_eq!(masks["Q5"], "Q0");
        assert_eq!(masks["P57"], "P0");
        assert_eq!(masks["Q42"], "Q1");
        assert_eq!(masks["P31"], "P1");
    }

    #[test]
    fn test_answer_tokens_outside_the_question_are_kept() {
        let labels = labels(&[("Q1", &["x"])]);
        let mut masks = BTreeMap::new();
        masks.insert("Q1".to_string(), "Q0".to_string());
        let out = apply_answer_masks("wd:Q1 wdt:P999 ?x", &labels, &masks).unwrap();
        assert_eq!(out, "wd:Q0 wdt:P999 ?x");
    }

    #[test]
    fn test_answer_missing_mask_is_a_logic_error() {
        let labels = labels(&[("Q1", &["x"])]);
        let masks = BTreeMap::new();
        let err = apply_answer_masks("wd:Q1", &labels, &masks).unwrap_err();
        assert!(matches!(err, MaskError::Logic(_)));
    }

    #[test]
    fn test_mask_question_answer_unicode_spans() {
        let labels = labels(&[("Q1", &["αβγ"])]);
        let masked = mask_question_answer("x αβγ y", "wd:Q1", &labels, 0.0).unwrap();
        assert_eq!(masked.question, "x Q0 y");
        assert_eq!(masked.answer, "wd:Q0");
    }
}

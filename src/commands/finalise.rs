//! Finalise a masked dataset split
//!
//! Two closing operations: rewrite questions and SPARQL answers into the
//! lowercase, whitespace-separated token form the downstream model trains
//! on, and partition the pairs into train/validate/test line files.

use crate::config::Config;
use crate::dataset::DatasetStore;
use crate::models::{QuestionAnswerPair, Split};
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::sync::LazyLock;
use tracing::info;

/// Lowercased mask tokens inside a finalised question or answer.
static MASK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[pq][0-9]+").expect("mask pattern compiles"));

/// Namespace prefix directly ahead of a mask token, e.g. `wdt:p31`.
static NAMESPACE_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("([a-z]+:)([pq][0-9]+)").expect("prefix pattern compiles"));

/// A SPARQL variable token, e.g. `?ans_1`.
static VARIABLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?[^ ]+").expect("variable pattern compiles"));

/// Runs of two or more spaces.
static MULTI_SPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[ ]{2,}").expect("space pattern compiles"));

/// Subdirectory of the dataset root holding the finalised line files.
const FINALISED_DIR: &str = "finalised";

/// Lowercase a masked question, make mask tokens and the trailing question
/// mark standalone, and collapse duplicate spaces.
#[must_use]
pub fn post_processed_question(question: &str) -> String {
    let question = question.to_lowercase();
    let question = MASK_REGEX.replace_all(&question, |caps: &regex::Captures<'_>| {
        format!(" {} ", &caps[0])
    });
    let question = if let Some(stripped) = question.strip_suffix('?') {
        format!("{stripped} ?")
    } else {
        question.into_owned()
    };
    MULTI_SPACE_REGEX.replace_all(&question, " ").trim().to_string()
}

/// Rename each `?variable` of the answer to `var_N`, numbering distinct
/// variables by first appearance from 1.
fn answer_with_variables_replaced(answer: &str) -> String {
    let mut numbering: BTreeMap<String, usize> = BTreeMap::new();
    let mut next = 1usize;
    VARIABLE_REGEX
        .replace_all(answer, |caps: &regex::Captures<'_>| {
            let index = *numbering.entry(caps[0].to_string()).or_insert_with(|| {
                let index = next;
                next += 1;
                index
            });
            format!("var_{index}")
        })
        .into_owned()
}

/// Lowercase a masked SPARQL answer and rewrite it with word-like
/// operator names, bare mask tokens, and `var_N` variables.
#[must_use]
pub fn post_processed_answer(answer: &str) -> String {
    let answer = answer.to_lowercase();
    let answer = answer
        .replace('{', " brack_open ")
        .replace('}', " brack_close ")
        .replace('(', " attr_open ")
        .replace(')', " attr_close ")
        .replace('.', " sep_dot ")
        .replace(',', " , ");
    let answer = NAMESPACE_PREFIX_REGEX.replace_all(&answer, "${2}");
    let answer = answer_with_variables_replaced(&answer);
    MULTI_SPACE_REGEX.replace_all(&answer, " ").trim().to_string()
}

/// Partition pairs for the given split. The validation fraction divides
/// only the train split; the test split passes through whole.
fn partitioned_pairs(
    pairs: Vec<QuestionAnswerPair>,
    split: Split,
    fraction_to_validate: f64,
) -> Vec<(&'static str, Vec<QuestionAnswerPair>)> {
    match split {
        Split::Test => vec![("test", pairs)],
        Split::Train => {
            let n_to_validate = (pairs.len() as f64 * fraction_to_validate).floor() as usize;
            let mut pairs = pairs;
            let train = pairs.split_off(n_to_validate);
            vec![("train", train), ("validate", pairs)]
        }
    }
}

/// Post-process and partition the masked pairs of `split`, writing one
/// question file and one SPARQL file per partition.
///
/// # Errors
///
/// Fails when the masked file is missing, `fraction_to_validate` is out of
/// range, or the line files cannot be written.
pub fn run(config: &Config, split: Split, language: &str, fraction_to_validate: f64) -> Result<()> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&fraction_to_validate),
        "fraction_to_validate must lie within [0.0, 1.0], got {fraction_to_validate}"
    );

    let store = DatasetStore::new(&config.dataset.root)?;
    let masked = store.load_masked_pairs(&super::mask::default_output_name(split, language))?;

    let pairs: Vec<QuestionAnswerPair> = masked
        .into_iter()
        .map(|(uid, pair)| QuestionAnswerPair {
            uid,
            question: post_processed_question(&pair.question),
            answer: post_processed_answer(&pair.answer),
        })
        .collect();

    let out_dir = store.root().join(FINALISED_DIR);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create directory {}", out_dir.display()))?;

    for (partition, pairs) in partitioned_pairs(pairs, split, fraction_to_validate) {
        let questions: String = pairs.iter().map(|p| format!("{}\n", p.question)).collect();
        let answers: String = pairs.iter().map(|p| format!("{}\n", p.answer)).collect();

        let question_path = out_dir.join(format!("{partition}-{language}.txt"));
        fs::write(&question_path, questions)
            .with_context(|| format!("failed to write {}", question_path.display()))?;

        let answer_path = out_dir.join(format!("{partition}-sparql.txt"));
        fs::write(&answer_path, answers)
            .with_context(|| format!("failed to write {}", answer_path.display()))?;

        info!(
            partition,
            pairs = pairs.len(),
            questions = %question_path.display(),
            answers = %answer_path.display(),
            "partition written"
        );
    }
    Ok(())
}

//! Mask question-answer pairs
//!
//! Runs the masking consumer over every question of a split: labels are
//! aligned into the question via the LCS engine and the chosen spans, plus
//! the identifiers in the SPARQL answer, are replaced by mask tokens.
//! Questions that cannot be masked are recorded per failure reason and
//! left out of the output.

use crate::config::Config;
use crate::dataset::DatasetStore;
use crate::masking::mask_question_answer;
use crate::models::{MaskedPair, Split};
use anyhow::Result;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Default name of the question file the mask task reads.
#[must_use]
pub fn default_questions_name(split: Split, language: &str) -> String {
    format!("{split}-{language}-replaced-no-errors")
}

/// Default name of the masked output file.
#[must_use]
pub fn default_output_name(split: Split, language: &str) -> String {
    format!("{split}-{language}-masked")
}

/// Mask every question of `split` in `language` with the given matching
/// `threshold`, reading questions from `load_name` and writing the masked
/// pairs to `save_name`.
///
/// # Errors
///
/// Fails when an input file is missing or the output cannot be written;
/// per-question masking failures are counted, logged, and skipped.
pub fn run(
    config: &Config,
    split: Split,
    language: &str,
    threshold: f64,
    load_name: &str,
    save_name: &str,
) -> Result<()> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&threshold),
        "threshold must lie within [0.0, 1.0], got {threshold}"
    );

    let store = DatasetStore::new(&config.dataset.root)?;
    let raw_entries = store.load_raw_split(split)?;
    let identifier_map = store.load_identifier_map(split)?;
    let label_store = store.load_labels(split, language)?;

    // Translated questions come from a file; without one, mask the split's
    // own English questions.
    let questions = if store.exists(load_name) {
        store.load_question_map(load_name)?
    } else {
        info!(
            load = %load_name,
            "question file not found, masking the raw split's questions"
        );
        raw_entries
            .iter()
            .filter_map(|entry| {
                entry
                    .best_question()
                    .map(|q| (entry.uid.to_string(), q.to_string()))
            })
            .collect()
    };

    let answers: BTreeMap<String, &str> = raw_entries
        .iter()
        .map(|entry| (entry.uid.to_string(), entry.sparql_wikidata.as_str()))
        .collect();

    let mut masked: BTreeMap<u64, MaskedPair> = BTreeMap::new();
    let mut failures: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut processed = 0usize;

    for (uid_str, question) in &questions {
        let Ok(uid) = uid_str.parse::<u64>() else {
            warn!(uid = %uid_str, "skipping entry with a non-numeric UID");
            continue;
        };
        let Some(answer) = answers.get(uid_str) else {
            debug!(uid, "no raw answer for question, skipping");
            continue;
        };

        // A question without collected identifiers masks to itself.
        let identifiers = identifier_map
            .get(uid_str)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let labels: BTreeMap<String, Vec<String>> = identifiers
            .iter()
            .map(|id| (id.clone(), label_store.get(id).cloned().unwrap_or_default()))
            .collect();

        match mask_question_answer(question, answer, &labels, threshold) {
            Ok(pair) => {
                masked.insert(uid, pair);
            }
            Err(e) => {
                *failures.entry(e.kind()).or_insert(0) += 1;
                debug!(uid, error = %e, "question excluded from masked dataset");
            }
        }

        processed += 1;
        if processed % 20 == 0 {
            info!(
                solved = masked.len(),
                processed,
                total = questions.len(),
                percent_correct =
                    format!("{:.2}", (masked.len() as f64 / processed as f64) * 100.0),
                "masking in progress"
            );
        }
    }

    let path = store.save_masked_pairs(save_name, &masked)?;
    info!(
        solved = masked.len(),
        failed = processed - masked.len(),
        ?failures,
        path = %path.display(),
        "masking finished"
    );
    Ok(())
}

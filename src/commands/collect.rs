//! Collect WikiData identifiers per question
//!
//! Scans every question's SPARQL answer of a split for identifier tokens
//! and persists the `uid → identifiers` map the later tasks work from.

use crate::config::Config;
use crate::dataset::{question_identifier_map, DatasetStore};
use crate::models::Split;
use anyhow::Result;
use std::collections::BTreeSet;
use tracing::info;

/// Build and save the question-to-identifiers map of `split`.
///
/// # Errors
///
/// Fails when the raw split file is missing or the map cannot be saved.
pub fn run(config: &Config, split: Split) -> Result<()> {
    let store = DatasetStore::new(&config.dataset.root)?;
    let entries = store.load_raw_split(split)?;
    let map = question_identifier_map(&entries);

    let distinct: BTreeSet<&String> = map.values().flatten().collect();
    info!(
        split = %split,
        questions = map.len(),
        distinct_identifiers = distinct.len(),
        "collected identifiers from SPARQL answers"
    );

    let path = store.save_identifier_map(split, &map)?;
    info!(path = %path.display(), "identifier map saved");
    Ok(())
}

//! Retrieve labels for collected identifiers
//!
//! Works incrementally: identifiers already present in the label store are
//! skipped, the rest are queried in parts, and the store is extended after
//! every part so an interrupted run loses at most one part of work.

use crate::config::Config;
use crate::dataset::DatasetStore;
use crate::models::Split;
use crate::utils::retry::RetryConfig;
use crate::wikidata::{partitioned, LabelFetcher};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use tracing::info;

/// Fetch labels in `language` for every identifier of `split` that the
/// label store does not cover yet.
///
/// # Errors
///
/// Fails when the identifier map is missing, the endpoint cannot be
/// reached after retries, or the store cannot be written.
pub async fn run(config: &Config, split: Split, language: &str, part_size: usize) -> Result<()> {
    let store = DatasetStore::new(&config.dataset.root)?;
    let identifier_map = store
        .load_identifier_map(split)
        .context("identifier map not found; run the collect task first")?;

    let all: BTreeSet<String> = identifier_map.values().flatten().cloned().collect();
    let labelled: BTreeSet<String> = store.load_labels(split, language)?.into_keys().collect();
    info!(already_labelled = labelled.len(), "label store loaded");

    let pending: BTreeSet<String> = all.difference(&labelled).cloned().collect();
    if pending.is_empty() {
        info!("every identifier is already labelled");
        return Ok(());
    }

    let parts = partitioned(&pending, part_size);
    info!(
        pending = pending.len(),
        parts = parts.len(),
        part_size,
        "starting label retrieval"
    );

    let fetcher = LabelFetcher::with_config(
        &config.wikidata.endpoint,
        &config.wikidata.user_agent,
        config.wikidata.query_interval(),
        RetryConfig::new(config.wikidata.max_retries),
        config.wikidata.request_timeout(),
    )?;

    for (index, part) in parts.iter().enumerate() {
        let labels = fetcher.fetch_labels(part, language).await?;
        store.append_labels(split, language, &labels)?;
        info!(
            part = index + 1,
            total = parts.len(),
            percent = format!("{:.2}", ((index + 1) as f64 / parts.len() as f64) * 100.0),
            "retrieved labels for part"
        );
    }
    Ok(())
}

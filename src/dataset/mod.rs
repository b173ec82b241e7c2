//! On-disk dataset store
//!
//! Every artifact of the pipeline is a JSON file under one dataset
//! directory: the raw LC-QuAD splits, the `uid → identifiers` maps and the
//! label store under `supplements/`, translated question maps, and the
//! masked output. Writes go through a temp file and an atomic rename, and
//! the label store supports append-merge so interrupted labelling runs can
//! resume where they stopped.

use crate::models::{MaskedPair, RawQuestion, Split, IDENTIFIER_PATTERN};
use crate::wikidata::LabelMap;
use anyhow::{Context, Result};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern compiles"));

/// Subdirectory holding derived artifacts (identifier maps, labels).
const SUPPLEMENTS_DIR: &str = "supplements";

/// A `uid → question text` map, keyed by UID-as-string as persisted.
pub type QuestionMap = BTreeMap<String, String>;

/// A `uid → identifiers` map.
pub type IdentifierMap = BTreeMap<String, Vec<String>>;

/// JSON file store rooted at the dataset directory.
pub struct DatasetStore {
    root: PathBuf,
}

impl DatasetStore {
    /// Open (and create if needed) the store at `root`.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be created.
    pub fn new(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("failed to create dataset directory {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Absolute path of a store entry; `name` excludes the `.json`
    /// extension and may contain subdirectories.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    /// Whether the entry exists on disk.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.path(name).exists()
    }

    /// Load and deserialize an entry.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing or does not parse.
    pub fn load_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.path(name);
        let file = File::open(&path)
            .with_context(|| format!("failed to open dataset file {}", path.display()))?;
        let value = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse dataset file {}", path.display()))?;
        Ok(value)
    }

    /// Serialize `value` into the entry, atomically.
    ///
    /// # Errors
    ///
    /// Fails on serialization or file-system errors.
    pub fn save_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        // Write to a temp file first, then rename (atomic).
        let temp_path = path.with_extension("json.tmp");
        let file = File::create(&temp_path)
            .with_context(|| format!("failed to create dataset file {}", temp_path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), value)
            .with_context(|| format!("failed to serialize dataset file {name}"))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("failed to rename dataset file {}", path.display()))?;

        tracing::debug!(path = %path.display(), "dataset file saved");
        Ok(path)
    }

    /// Merge `additions` into a JSON-object entry, creating it when
    /// absent. Keys present in both take the new value.
    ///
    /// # Errors
    ///
    /// Fails when the existing entry does not parse or the save fails.
    pub fn append_json_map<V: Serialize>(
        &self,
        name: &str,
        additions: &BTreeMap<String, V>,
    ) -> Result<()> {
        let mut merged: BTreeMap<String, serde_json::Value> = if self.exists(name) {
            self.load_json(name)?
        } else {
            BTreeMap::new()
        };
        for (key, value) in additions {
            merged.insert(key.clone(), serde_json::to_value(value)?);
        }
        self.save_json(name, &merged)?;
        Ok(())
    }

    /// The raw LC-QuAD entries of a split (`{split}-en.json`).
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::load_json`].
    pub fn load_raw_split(&self, split: Split) -> Result<Vec<RawQuestion>> {
        self.load_json(&format!("{split}-en"))
    }

    /// A `uid → question` map by file name.
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::load_json`].
    pub fn load_question_map(&self, name: &str) -> Result<QuestionMap> {
        self.load_json(name)
    }

    /// Persist a `uid → question` map under `name`.
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::save_json`].
    pub fn save_question_map(&self, name: &str, questions: &QuestionMap) -> Result<PathBuf> {
        self.save_json(name, questions)
    }

    /// Store entry name of the `uid → identifiers` map.
    #[must_use]
    pub fn identifier_map_name(split: Split) -> String {
        format!("{SUPPLEMENTS_DIR}/{split}-entities-properties-map")
    }

    /// Store entry name of the label store.
    #[must_use]
    pub fn labels_name(split: Split, language: &str) -> String {
        format!("{SUPPLEMENTS_DIR}/{split}-{language}-entity-property-labels")
    }

    /// The `uid → identifiers` map of a split.
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::load_json`].
    pub fn load_identifier_map(&self, split: Split) -> Result<IdentifierMap> {
        self.load_json(&Self::identifier_map_name(split))
    }

    /// Persist the `uid → identifiers` map of a split.
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::save_json`].
    pub fn save_identifier_map(
        &self,
        split: Split,
        map: &BTreeMap<String, BTreeSet<String>>,
    ) -> Result<PathBuf> {
        self.save_json(&Self::identifier_map_name(split), map)
    }

    /// The label store of a split/language, or an empty map when no labels
    /// have been collected yet.
    ///
    /// # Errors
    ///
    /// Fails only when an existing file does not parse.
    pub fn load_labels(&self, split: Split, language: &str) -> Result<LabelMap> {
        let name = Self::labels_name(split, language);
        if self.exists(&name) {
            self.load_json(&name)
        } else {
            Ok(LabelMap::new())
        }
    }

    /// Merge freshly fetched labels into the label store.
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::append_json_map`].
    pub fn append_labels(&self, split: Split, language: &str, labels: &LabelMap) -> Result<()> {
        self.append_json_map(&Self::labels_name(split, language), labels)
    }

    /// Persist masked pairs as an object keyed by UID-as-string.
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::save_json`].
    pub fn save_masked_pairs(
        &self,
        name: &str,
        pairs: &BTreeMap<u64, MaskedPair>,
    ) -> Result<PathBuf> {
        self.save_json(name, pairs)
    }

    /// Load masked pairs saved by [`DatasetStore::save_masked_pairs`].
    ///
    /// # Errors
    ///
    /// See [`DatasetStore::load_json`].
    pub fn load_masked_pairs(&self, name: &str) -> Result<BTreeMap<u64, MaskedPair>> {
        self.load_json(name)
    }

    /// The dataset root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// The identifiers mentioned in one question's SPARQL answer.
#[must_use]
pub fn identifiers_of_question(entry: &RawQuestion) -> BTreeSet<String> {
    IDENTIFIER_REGEX
        .find_iter(&entry.sparql_wikidata)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Map every question of a split to the identifiers its answer mentions.
#[must_use]
pub fn question_identifier_map(entries: &[RawQuestion]) -> BTreeMap<String, BTreeSet<String>> {
    entries
        .iter()
        .map(|entry| (entry.uid.to_string(), identifiers_of_question(entry)))
        .collect()
}

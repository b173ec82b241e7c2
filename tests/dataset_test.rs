//! End-to-end test of the offline pipeline tasks over a temp dataset
//! directory: collect → (labels written directly) → mask → finalise.

use qamask::commands;
use qamask::config::{Config, DatasetConfig, MaskingConfig, WikiDataConfig};
use qamask::dataset::DatasetStore;
use qamask::models::Split;
use qamask::wikidata::LabelMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn test_config(root: &Path) -> Config {
    Config {
        dataset: DatasetConfig {
            root: root.to_path_buf(),
        },
        wikidata: WikiDataConfig {
            endpoint: "http://localhost:1/sparql".into(),
            user_agent: "qamask-tests/0.1".into(),
            query_interval_secs: 0,
            max_retries: 0,
            request_timeout_secs: 1,
            part_size: 10,
        },
        masking: MaskingConfig {
            threshold: 0.0,
            language: "en".into(),
        },
    }
}

fn seed_raw_split(store: &DatasetStore) {
    let raw = serde_json::json!([
        {
            "uid": 1,
            "question": "Who directed Inception?",
            "paraphrased_question": null,
            "NNQT_question": "Who {directed} [Inception]?",
            "sparql_wikidata": "SELECT ?x WHERE { wd:Q25188 wdt:P57 ?x }"
        },
        {
            "uid": 2,
            "question": "Name the capital of France",
            "sparql_wikidata": "SELECT ?cap WHERE { wd:Q142 wdt:P36 ?cap }"
        }
    ]);
    store.save_json("train-en", &raw).unwrap();
}

#[test]
fn test_pipeline_collect_mask_finalise() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = test_config(dir.path());
    let store = DatasetStore::new(dir.path()).unwrap();

    seed_raw_split(&store);

    // Collect identifiers from the SPARQL answers.
    commands::collect::run(&config, Split::Train).unwrap();
    let identifier_map = store.load_identifier_map(Split::Train).unwrap();
    assert_eq!(identifier_map["1"], vec!["P57", "Q25188"]);
    assert_eq!(identifier_map["2"], vec!["P36", "Q142"]);

    // Labels as the label task would have stored them. Q142 stays
    // unlabelled, so question 2 must be excluded from the masked output.
    let mut labels = LabelMap::new();
    labels.insert("Q25188".into(), vec!["Inception".into()]);
    labels.insert("P57".into(), vec!["directed".into()]);
    labels.insert("Q142".into(), Vec::new());
    labels.insert("P36".into(), vec!["capital".into()]);
    store.append_labels(Split::Train, "en", &labels).unwrap();

    // Question file as produced upstream.
    let mut questions = BTreeMap::new();
    questions.insert("1".to_string(), "Who directed Inception?".to_string());
    questions.insert("2".to_string(), "Name the capital of France".to_string());
    store
        .save_question_map("train-en-replaced-no-errors", &questions)
        .unwrap();

    // Mask.
    commands::mask::run(
        &config,
        Split::Train,
        "en",
        0.0,
        "train-en-replaced-no-errors",
        "train-en-masked",
    )
    .unwrap();

    let masked = store.load_masked_pairs("train-en-masked").unwrap();
    assert_eq!(masked.len(), 1);
    assert_eq!(masked[&1].question, "Who P0 Q0?");
    assert_eq!(masked[&1].answer, "SELECT ?x WHERE { wd:Q0 wdt:P0 ?x }");

    // Finalise with everything in the train partition.
    commands::finalise::run(&config, Split::Train, "en", 0.0).unwrap();

    let questions_txt =
        fs::read_to_string(dir.path().join("finalised").join("train-en.txt")).unwrap();
    assert_eq!(questions_txt, "who p0 q0 ?\n");

    let answers_txt =
        fs::read_to_string(dir.path().join("finalised").join("train-sparql.txt")).unwrap();
    assert_eq!(
        answers_txt,
        "select var_1 where brack_open q0 p0 var_1 brack_close\n"
    );

    let validate_txt =
        fs::read_to_string(dir.path().join("finalised").join("validate-en.txt")).unwrap();
    assert!(validate_txt.is_empty());
}

#[test]
fn test_sanitise_task() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = test_config(dir.path());
    let store = DatasetStore::new(dir.path()).unwrap();

    let mut questions = BTreeMap::new();
    questions.insert("7".to_string(), "wie_regisseerde {Inception}&quot;?".to_string());
    store.save_question_map("train-nl", &questions).unwrap();

    commands::sanitise::run(&config, "train-nl", "train-nl-fixed").unwrap();

    let cleaned = store.load_question_map("train-nl-fixed").unwrap();
    assert_eq!(cleaned["7"], "wie regisseerde Inception\"?");
}

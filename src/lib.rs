//! qamask - masked KBQA dataset preparation
//!
//! Builds a masked question-answering dataset from LC-QuAD 2.0: WikiData
//! identifiers are collected from each question's SPARQL answer, their
//! labels retrieved from the public query service, aligned into the
//! question text with a suffix-tree longest-common-substring engine, and
//! replaced by mask tokens in both question and answer.
//!
//! # Architecture
//!
//! - [`unicode`] - code-point sequences underlying the tree
//! - [`suffix_tree`] - online Ukkonen construction and LCS extraction
//! - [`masking`] - label selection, collision checks, mask substitution
//! - [`sanitize`] - symbol replacement and HTML-entity decoding
//! - [`wikidata`] - SPARQL label retrieval
//! - [`dataset`] - JSON artifact store
//! - [`commands`] - the pipeline tasks behind the CLI
//! - [`config`] - environment-driven settings
//! - [`error`] - unified error type
//!
//! The core modules (`unicode`, `suffix_tree`, `masking`) are synchronous
//! and perform no I/O; one question is processed at a time.
//!
//! # Example
//!
//! ```
//! use qamask::suffix_tree::lcs::longest_common_substring;
//!
//! let lcs = longest_common_substring("banana", "ananas").unwrap();
//! assert_eq!(lcs.as_deref(), Some("anana"));
//! ```

pub mod commands;
pub mod config;
pub mod dataset;
pub mod error;
pub mod masking;
pub mod models;
pub mod sanitize;
pub mod suffix_tree;
pub mod unicode;
pub mod utils;
pub mod wikidata;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::dataset::DatasetStore;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::masking::{mask_question_answer, LabelMatch, MaskError};
    pub use crate::models::{MaskedPair, QuestionAnswerPair, RawQuestion, Split};
    pub use crate::suffix_tree::lcs::{longest_common_substring, LcsError};
    pub use crate::suffix_tree::SuffixTree;
    pub use crate::unicode::UnicodeString;
}

// Direct re-exports for convenience
pub use models::{MaskedPair, QuestionAnswerPair, RawQuestion, Split};

//! Code-point sequences for the suffix-tree engine
//!
//! The suffix tree indexes text by Unicode scalar value, not by byte.
//! [`UnicodeString`] decodes UTF-8 once at the boundary and afterwards
//! offers O(1) access to individual code points. All tree-side arithmetic
//! is done in code-point units.

use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Errors produced while ingesting text into a [`UnicodeString`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnicodeError {
    /// Input bytes are not valid UTF-8
    #[error("input is not valid UTF-8")]
    InvalidEncoding,

    /// Input exceeds the indexable code-point range of the suffix tree
    #[error("input of {0} code points exceeds the indexable range")]
    TooLarge(usize),
}

/// An immutable sequence of Unicode code points.
///
/// Internally 0-based; the suffix tree speaks 1-based inclusive indices and
/// converts when it reads through [`UnicodeString::at`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnicodeString {
    cp: Vec<char>,
}

impl UnicodeString {
    /// Build a sequence from an already-validated string slice.
    ///
    /// # Errors
    ///
    /// Returns [`UnicodeError::TooLarge`] when the code-point count reaches
    /// the suffix tree's `i32` index range.
    pub fn new(text: &str) -> Result<Self, UnicodeError> {
        let cp: Vec<char> = text.chars().collect();
        if cp.len() >= i32::MAX as usize {
            return Err(UnicodeError::TooLarge(cp.len()));
        }
        Ok(Self { cp })
    }

    /// Decode a UTF-8 byte sequence.
    ///
    /// # Errors
    ///
    /// Returns [`UnicodeError::InvalidEncoding`] on malformed bytes and
    /// [`UnicodeError::TooLarge`] on over-long inputs.
    pub fn from_utf8(bytes: &[u8]) -> Result<Self, UnicodeError> {
        let text = std::str::from_utf8(bytes).map_err(|_| UnicodeError::InvalidEncoding)?;
        Self::new(text)
    }

    /// Number of code points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cp.len()
    }

    /// Whether the sequence holds no code points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cp.is_empty()
    }

    /// The code point at 0-based `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of bounds; callers hold the invariant.
    #[must_use]
    pub fn at(&self, index: usize) -> char {
        self.cp[index]
    }

    /// A new sequence over the half-open code-point range `[lo, hi)`.
    #[must_use]
    pub fn substring(&self, lo: usize, hi: usize) -> Self {
        Self {
            cp: self.cp[lo..hi].to_vec(),
        }
    }

    /// The set of distinct code points, in ascending order.
    #[must_use]
    pub fn distinct_code_points(&self) -> BTreeSet<char> {
        self.cp.iter().copied().collect()
    }

    /// 0-based index of the first occurrence of `code_point`, if any.
    #[must_use]
    pub fn index_of(&self, code_point: char) -> Option<usize> {
        self.cp.iter().position(|&c| c == code_point)
    }

    /// 0-based index of the first occurrence of `needle` as a contiguous
    /// code-point subsequence. An empty needle matches at 0.
    #[must_use]
    pub fn find(&self, needle: &UnicodeString) -> Option<usize> {
        if needle.is_empty() {
            return Some(0);
        }
        if needle.len() > self.len() {
            return None;
        }
        (0..=self.len() - needle.len())
            .find(|&start| self.cp[start..start + needle.len()] == needle.cp[..])
    }

    /// Whether `code_point` occurs anywhere in the sequence.
    #[must_use]
    pub fn contains(&self, code_point: char) -> bool {
        self.index_of(code_point).is_some()
    }
}

impl fmt::Display for UnicodeString {
    /// Encode back to UTF-8.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.cp {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

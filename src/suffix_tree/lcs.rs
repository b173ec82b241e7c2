//! Longest common substring of two strings
//!
//! Builds a generalized suffix tree over `first ‖ sep ‖ second ‖ end`,
//! classifies every explicit state by which of the two strings its
//! substring occurs in, and tracks the deepest state common to both. The
//! separator and terminator are picked from a fixed candidate list so they
//! cannot occur inside either input.

use super::{StateId, SuffixTree, ROOT};
use crate::unicode::{UnicodeError, UnicodeString};
use thiserror::Error;

/// Candidate separator/terminator pairs, tried in order. Adequate for
/// LC-QuAD-like text; inputs using all four pairs yield
/// [`LcsError::NoUsableSeparator`].
pub const SEPARATOR_PAIRS: [(char, char); 4] = [('_', '*'), ('_', '$'), ('#', '$'), ('&', '~')];

/// Errors of the LCS layer. Each fails a single question in the batch
/// pipeline; none is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LcsError {
    /// Encoding or size failure while ingesting an input
    #[error(transparent)]
    Unicode(#[from] UnicodeError),

    /// Every candidate separator pair occurs within the inputs
    #[error("no usable separator pair for the given inputs")]
    NoUsableSeparator,

    /// One of the inputs is empty; a common substring cannot exist
    #[error("cannot take the longest common substring of an empty string")]
    Empty,
}

/// Which of the two concatenated strings a state's substring belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstringKind {
    /// No child classified yet
    Undetermined,
    /// Occurs in the first string only
    First,
    /// Occurs in the second string only
    Second,
    /// Occurs in both strings
    FirstAndSecond,
}

impl SubstringKind {
    /// Fold a child classification into the running one. `Undetermined`
    /// always yields to the child; mixing `First` and `Second` gives
    /// `FirstAndSecond`, which is absorbing.
    #[must_use]
    pub fn combined(self, child: Self) -> Self {
        match self {
            Self::Undetermined => child,
            Self::First | Self::Second => {
                if self == child {
                    self
                } else {
                    Self::FirstAndSecond
                }
            }
            Self::FirstAndSecond => Self::FirstAndSecond,
        }
    }
}

/// Running record of the deepest state common to both strings.
struct LcsBest {
    /// Code-point length of the best path
    length: i32,
    /// 1-based start index of the best path within the concatenation
    start: i32,
}

/// First separator pair whose code points occur in neither input.
fn usable_separator_pair(first: &UnicodeString, second: &UnicodeString) -> Option<(char, char)> {
    SEPARATOR_PAIRS.iter().copied().find(|&(sep, end)| {
        !first.contains(sep)
            && !first.contains(end)
            && !second.contains(sep)
            && !second.contains(end)
    })
}

/// Post-order classification of the subtree below `id`.
///
/// `depth` is the code-point length of the path from the root to `id`;
/// `first_bound` the 1-based position of the separator, bounding the first
/// string plus its separator. A leaf belongs to the first string iff its
/// edge label starts at or before that bound. Whenever a child and the
/// updated running classification are both [`SubstringKind::FirstAndSecond`],
/// the path through that child is a common substring and competes for the
/// record; ties keep the earlier candidate, so DFS order (ascending code
/// point at every branch) breaks them.
fn classify(
    tree: &SuffixTree,
    id: StateId,
    depth: i32,
    first_bound: i32,
    best: &mut LcsBest,
) -> SubstringKind {
    let mut kind = SubstringKind::Undetermined;
    for (_, transition) in tree.state(id).transitions() {
        let right = tree.right_value(transition.right());
        let span = right - transition.left() + 1;
        let child_kind = if tree.state(transition.target()).is_leaf() {
            if transition.left() <= first_bound {
                SubstringKind::First
            } else {
                SubstringKind::Second
            }
        } else {
            classify(tree, transition.target(), depth + span, first_bound, best)
        };
        kind = kind.combined(child_kind);
        if kind == SubstringKind::FirstAndSecond && child_kind == SubstringKind::FirstAndSecond {
            let total = depth + span;
            if best.length < total {
                best.length = total;
                best.start = right - total + 1;
            }
        }
    }
    debug_assert!(
        kind != SubstringKind::Undetermined,
        "an explicit state always has at least one classified child"
    );
    kind
}

/// Longest common substring of two decoded sequences.
///
/// Returns `Ok(None)` when the inputs share no code point at all.
///
/// # Errors
///
/// [`LcsError::Empty`] when either input is empty,
/// [`LcsError::NoUsableSeparator`] when every candidate pair occurs in the
/// inputs, [`LcsError::Unicode`] when the concatenation exceeds the
/// indexable range.
pub fn lcs_of_sequences(
    first: &UnicodeString,
    second: &UnicodeString,
) -> Result<Option<UnicodeString>, LcsError> {
    if first.is_empty() || second.is_empty() {
        return Err(LcsError::Empty);
    }
    let (sep, end) = usable_separator_pair(first, second).ok_or(LcsError::NoUsableSeparator)?;

    let concatenation = format!("{first}{sep}{second}{end}");
    let text = UnicodeString::new(&concatenation)?;
    let sep_index = first.len() as i32; // 0-based position of `sep`
    debug_assert_eq!(text.index_of(sep), Some(sep_index as usize));
    debug_assert_eq!(text.index_of(end), Some(text.len() - 1));

    let tree = SuffixTree::from_unicode(text);
    let mut best = LcsBest {
        length: 0,
        start: 0,
    };
    classify(&tree, ROOT, 0, sep_index + 1, &mut best);

    if best.length >= 1 {
        let lo = (best.start - 1) as usize;
        Ok(Some(tree.text().substring(lo, lo + best.length as usize)))
    } else {
        Ok(None)
    }
}

/// Longest common substring of two string slices.
///
/// # Errors
///
/// See [`lcs_of_sequences`].
pub fn longest_common_substring(first: &str, second: &str) -> Result<Option<String>, LcsError> {
    let first = UnicodeString::new(first)?;
    let second = UnicodeString::new(second)?;
    Ok(lcs_of_sequences(&first, &second)?.map(|s| s.to_string()))
}

/// Longest common substring of two UTF-8 byte sequences, as UTF-8 bytes.
///
/// # Errors
///
/// [`UnicodeError::InvalidEncoding`] (wrapped) on malformed input bytes,
/// plus everything [`lcs_of_sequences`] returns.
pub fn longest_common_substring_bytes(
    first: &[u8],
    second: &[u8],
) -> Result<Option<Vec<u8>>, LcsError> {
    let first = UnicodeString::from_utf8(first)?;
    let second = UnicodeString::from_utf8(second)?;
    Ok(lcs_of_sequences(&first, &second)?.map(|s| s.to_string().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_is_the_spec_monoid() {
        use SubstringKind::*;
        assert_eq!(Undetermined.combined(First), First);
        assert_eq!(Undetermined.combined(Second), Second);
        assert_eq!(First.combined(First), First);
        assert_eq!(Second.combined(Second), Second);
        assert_eq!(First.combined(Second), FirstAndSecond);
        assert_eq!(Second.combined(First), FirstAndSecond);
        assert_eq!(FirstAndSecond.combined(First), FirstAndSecond);
        assert_eq!(FirstAndSecond.combined(Second), FirstAndSecond);
    }

    #[test]
    fn test_separator_selection_skips_used_pairs() {
        let first = UnicodeString::new("x_y*").unwrap();
        let second = UnicodeString::new("plain").unwrap();
        // ('_','*') and ('_','$') are burnt by the underscore.
        assert_eq!(usable_separator_pair(&first, &second), Some(('#', '$')));
    }

    #[test]
    fn test_no_usable_separator() {
        let err = longest_common_substring("_*#$&~", "_*#$&~").unwrap_err();
        assert_eq!(err, LcsError::NoUsableSeparator);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert_eq!(longest_common_substring("", "abc").unwrap_err(), LcsError::Empty);
        assert_eq!(longest_common_substring("abc", "").unwrap_err(), LcsError::Empty);
    }

    #[test]
    fn test_disjoint_strings_have_no_lcs() {
        assert_eq!(longest_common_substring("abc", "xyz").unwrap(), None);
    }

    #[test]
    fn test_prefix_case() {
        assert_eq!(
            longest_common_substring("abc", "ab").unwrap(),
            Some("ab".to_string())
        );
    }

    #[test]
    fn test_bytes_entry_point_rejects_invalid_utf8() {
        let err = longest_common_substring_bytes(&[0xff, 0x41], b"ab").unwrap_err();
        assert_eq!(err, LcsError::Unicode(UnicodeError::InvalidEncoding));
    }

    #[test]
    fn test_bytes_entry_point_round_trips() {
        let lcs = longest_common_substring_bytes(b"banana", b"ananas").unwrap();
        assert_eq!(lcs, Some(b"anana".to_vec()));
    }
}

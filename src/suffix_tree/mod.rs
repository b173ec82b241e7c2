//! Online suffix-tree construction after Ukkonen (1995)
//!
//! The tree is built left to right over a [`UnicodeString`]; at every step
//! the shared leaf right pointer `e` is incremented, which extends all open
//! leaf edges in constant time. An auxiliary state above the root carries
//! one synthetic transition per distinct code point of the text, making the
//! transition function total for every symbol the construction can meet.
//!
//! Index convention: the algorithm speaks 1-based inclusive `(k, p)`
//! pointer pairs as in the paper; [`UnicodeString`] converts to 0-based
//! storage at the boundary. Auxiliary transitions use unique negative
//! pointer pairs `(-j, -j)`.

pub mod lcs;
mod state;

pub use state::{RightPtr, State, StateId, Transition};

use crate::unicode::{UnicodeError, UnicodeString};
use std::fmt::Write as _;

/// Arena id of the auxiliary state (Ukkonen's ⊥).
pub const AUXILIARY: StateId = 0;

/// Arena id of the root state.
pub const ROOT: StateId = 1;

/// An explicit state plus a `(k, p)` pointer pair: the possibly implicit
/// point reached by spelling `text[k..=p]` from the state. Lives only
/// inside the construction loop.
#[derive(Debug, Clone, Copy)]
struct ReferencePair {
    state: StateId,
    left: i32,
    right: i32,
}

/// A Ukkonen suffix tree over a sequence of Unicode code points.
///
/// The name refers to the construction, which is online and linear in the
/// number of code points. A tree built from a string without a unique
/// terminator may leave some suffixes implicit; append one when every
/// suffix must end in a leaf.
#[derive(Debug)]
pub struct SuffixTree {
    text: UnicodeString,
    states: Vec<State>,
    /// Shared leaf right pointer `e`; every open edge reads it on access.
    leaf_right: i32,
}

impl SuffixTree {
    /// Build the suffix tree of `text`.
    ///
    /// # Errors
    ///
    /// Returns [`UnicodeError::TooLarge`] when `text` exceeds the indexable
    /// code-point range.
    pub fn new(text: &str) -> Result<Self, UnicodeError> {
        Ok(Self::build(UnicodeString::new(text)?))
    }

    /// Build the suffix tree of an already-decoded sequence.
    #[must_use]
    pub fn from_unicode(text: UnicodeString) -> Self {
        Self::build(text)
    }

    fn build(text: UnicodeString) -> Self {
        let mut states = vec![State::new(None), State::new(Some(AUXILIARY))];

        // One auxiliary transition to the root per distinct code point,
        // each with its own negative pointer pair.
        let mut j = -1;
        for code_point in text.distinct_code_points() {
            states[AUXILIARY].set_transition(
                code_point,
                Transition {
                    left: j,
                    right: RightPtr::Bounded(j),
                    target: ROOT,
                },
            );
            j -= 1;
        }
        states[ROOT].set_suffix_link(AUXILIARY);

        let mut tree = Self {
            text,
            states,
            leaf_right: 0,
        };
        tree.construct();
        tree
    }

    /// Algorithm 2 of Ukkonen (1995): advance the active point over every
    /// code point of the text.
    fn construct(&mut self) {
        let mut active = ReferencePair {
            state: ROOT,
            left: 1,
            right: 0,
        };
        let n = self.text.len() as i32;
        for i in 1..=n {
            self.leaf_right += 1;
            active.right = i;
            let (state, left) = self.update(active);
            let (state, left) = self.canonize(ReferencePair {
                state,
                left,
                right: i,
            });
            active.state = state;
            active.left = left;
        }
    }

    /// Procedure `update`: extend the tree from `STree(T_{i-1})` to
    /// `STree(T_i)`, adding a leaf for every suffix on the boundary path
    /// until the endpoint is found. Returns the new active point.
    fn update(&mut self, pair: ReferencePair) -> (StateId, i32) {
        let t_i = self.code_point(pair.right);
        let mut state = pair.state;
        let mut left = pair.left;
        // Sentinel meaning "no state awaiting a suffix link yet".
        let mut previous = ROOT;

        let (mut end_point, mut branch) = self.test_and_split(
            ReferencePair {
                state,
                left,
                right: pair.right - 1,
            },
            t_i,
        );
        while !end_point {
            let leaf = self.new_state(branch);
            self.states[branch].set_transition(
                t_i,
                Transition {
                    left: pair.right,
                    right: RightPtr::Open,
                    target: leaf,
                },
            );
            if previous != ROOT {
                self.states[previous].set_suffix_link(branch);
            }
            previous = branch;

            let link = self.states[state]
                .suffix_link()
                .expect("active state on the boundary path has a suffix link");
            let (next_state, next_left) = self.canonize(ReferencePair {
                state: link,
                left,
                right: pair.right - 1,
            });
            state = next_state;
            left = next_left;
            let (ep, br) = self.test_and_split(
                ReferencePair {
                    state,
                    left,
                    right: pair.right - 1,
                },
                t_i,
            );
            end_point = ep;
            branch = br;
        }
        if previous != ROOT {
            self.states[previous].set_suffix_link(state);
        }
        (state, left)
    }

    /// Procedure `test-and-split`: answer whether the canonical reference
    /// pair is the endpoint for `t`, materialising the represented point as
    /// an explicit state when it sits inside an edge.
    fn test_and_split(&mut self, pair: ReferencePair, t: char) -> (bool, StateId) {
        if pair.left <= pair.right {
            let t_k = self.code_point(pair.left);
            let (left, _, _) = self.transition_of(pair.state, t_k);
            // Code point at offset p - k + 1 along the edge label.
            let next = self.text.at((left + pair.right - pair.left) as usize);
            if t == next {
                (true, pair.state)
            } else {
                let branch = self.split_edge(pair.state, t_k, pair.right - pair.left);
                (false, branch)
            }
        } else {
            (self.states[pair.state].has_transition(t), pair.state)
        }
    }

    /// Break the transition from `s` on `t_k` in two, inserting a fresh
    /// state `r` after `span + 1` code points of the label. The new
    /// internal edge `s → r` owns a bounded right pointer; the tail keeps
    /// the old pointer, open or bounded.
    fn split_edge(&mut self, s: StateId, t_k: char, span: i32) -> StateId {
        let old = self.states[s]
            .take_transition(t_k)
            .expect("edge being split exists");
        let branch = self.new_state(s);

        let tail_left = old.left + span + 1;
        let tail_first = self.text.at((tail_left - 1) as usize);
        self.states[branch].set_transition(
            tail_first,
            Transition {
                left: tail_left,
                right: old.right,
                target: old.target,
            },
        );
        self.states[old.target].set_parent(branch);

        self.states[s].set_transition(
            t_k,
            Transition {
                left: old.left,
                right: RightPtr::Bounded(old.left + span),
                target: branch,
            },
        );
        branch
    }

    /// Procedure `canonize`: walk transitions downward until `state` is the
    /// closest explicit ancestor of the represented point, returning the
    /// canonical `(state, left)` pair.
    fn canonize(&self, pair: ReferencePair) -> (StateId, i32) {
        if pair.right < pair.left {
            return (pair.state, pair.left);
        }
        let mut state = pair.state;
        let mut left = pair.left;
        let (mut edge_left, mut edge_right, mut target) =
            self.transition_of(state, self.code_point(left));
        while edge_right - edge_left <= pair.right - left {
            left += edge_right - edge_left + 1;
            state = target;
            if left <= pair.right {
                let (el, er, tg) = self.transition_of(state, self.code_point(left));
                edge_left = el;
                edge_right = er;
                target = tg;
            }
        }
        (state, left)
    }

    /// The code point at 1-based `index`.
    fn code_point(&self, index: i32) -> char {
        self.text.at((index - 1) as usize)
    }

    /// Non-owning view of the transition from `s` on `code_point`:
    /// `(left, resolved right, target)`.
    fn transition_of(&self, s: StateId, code_point: char) -> (i32, i32, StateId) {
        let transition = self.states[s]
            .transition(code_point)
            .expect("transition looked up during construction exists");
        (
            transition.left,
            self.right_value(transition.right),
            transition.target,
        )
    }

    fn new_state(&mut self, parent: StateId) -> StateId {
        let id = self.states.len();
        self.states.push(State::new(Some(parent)));
        id
    }

    /// Resolve a right pointer; `Open` reads the shared leaf pointer `e`.
    #[must_use]
    pub fn right_value(&self, right: RightPtr) -> i32 {
        match right {
            RightPtr::Bounded(value) => value,
            RightPtr::Open => self.leaf_right,
        }
    }

    /// The text the tree was built over.
    #[must_use]
    pub fn text(&self) -> &UnicodeString {
        &self.text
    }

    /// Borrow a state by id.
    ///
    /// # Panics
    ///
    /// Panics when `id` does not belong to this tree.
    #[must_use]
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id]
    }

    /// Total number of explicit states, auxiliary and root included.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Number of leaf states. For a text ending in a code point unique to
    /// it, this equals the text's code-point length.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.states
            .iter()
            .enumerate()
            .filter(|(id, s)| *id != AUXILIARY && *id != ROOT && s.is_leaf())
            .count()
    }

    /// The label of an ordinary (non-auxiliary) transition as a string.
    #[must_use]
    pub fn edge_label(&self, transition: &Transition) -> String {
        let lo = (transition.left() - 1) as usize;
        let hi = self.right_value(transition.right()) as usize;
        self.text.substring(lo, hi).to_string()
    }

    /// Render the tree for inspection: the auxiliary state's synthetic
    /// transitions first, then the subtree below the root.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "state({AUXILIARY}) [auxiliary]");
        for (code_point, transition) in self.states[AUXILIARY].transitions() {
            let j = self.right_value(transition.right());
            let _ = writeln!(
                out,
                "  ({j}, {j}) ({code_point}) state({})",
                transition.target()
            );
        }
        self.render_state(&mut out, ROOT, 0);
        out
    }

    fn render_state(&self, out: &mut String, id: StateId, depth: usize) {
        let indent = "  ".repeat(depth);
        let marker = if id == ROOT { " [root]" } else { "" };
        let _ = writeln!(out, "{indent}state({id}){marker}");
        for (_, transition) in self.states[id].transitions() {
            let _ = writeln!(
                out,
                "{indent}  ({}, {}) ({}) state({})",
                transition.left(),
                self.right_value(transition.right()),
                self.edge_label(transition),
                transition.target()
            );
            self.render_state(out, transition.target(), depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn internal_states(tree: &SuffixTree) -> Vec<StateId> {
        (0..tree.state_count())
            .filter(|&id| id != AUXILIARY && !tree.state(id).is_leaf())
            .collect()
    }

    #[test]
    fn test_leaf_count_with_unique_terminator() {
        let tree = SuffixTree::new("banana$").unwrap();
        assert_eq!(tree.leaf_count(), 7);

        let tree = SuffixTree::new("mississippi#").unwrap();
        assert_eq!(tree.leaf_count(), 12);
    }

    #[test]
    fn test_leaf_count_counts_code_points() {
        let tree = SuffixTree::new("αβγαβ$").unwrap();
        assert_eq!(tree.leaf_count(), 6);
    }

    #[test]
    fn test_internal_states_have_suffix_links() {
        let tree = SuffixTree::new("mississippi$").unwrap();
        for id in internal_states(&tree) {
            assert!(
                tree.state(id).suffix_link().is_some(),
                "internal state {id} lacks a suffix link"
            );
        }
    }

    #[test]
    fn test_root_suffix_link_is_auxiliary() {
        let tree = SuffixTree::new("abc$").unwrap();
        assert_eq!(tree.state(ROOT).suffix_link(), Some(AUXILIARY));
    }

    #[test]
    fn test_auxiliary_covers_distinct_code_points() {
        let tree = SuffixTree::new("banana$").unwrap();
        let aux = tree.state(AUXILIARY);
        assert_eq!(aux.transition_count(), 4); // $ a b n
        for c in ['$', 'a', 'b', 'n'] {
            assert!(aux.has_transition(c));
        }
        // Synthetic pointer pairs are unique negative integers.
        let mut seen = std::collections::BTreeSet::new();
        for (_, t) in aux.transitions() {
            let j = tree.right_value(t.right());
            assert!(j < 0);
            assert_eq!(t.left(), j);
            assert!(seen.insert(j));
        }
    }

    #[test]
    fn test_shared_leaf_pointer_reached_text_length() {
        let tree = SuffixTree::new("banana$").unwrap();
        assert_eq!(tree.right_value(RightPtr::Open), 7);
    }

    #[test]
    fn test_state_count_is_linear() {
        // At most one internal split and one leaf per step, plus the
        // auxiliary state and the root.
        let text = "abcabxabcd$";
        let tree = SuffixTree::new(text).unwrap();
        assert!(tree.state_count() <= 2 * text.chars().count() + 2);
    }

    #[test]
    fn test_split_children_know_their_parent() {
        let tree = SuffixTree::new("banana$").unwrap();
        for id in 2..tree.state_count() {
            let parent = tree.state(id).parent().expect("non-root states have parents");
            assert!(
                tree.state(parent).transitions().any(|(_, t)| t.target() == id),
                "state {id} is not reachable from its recorded parent {parent}"
            );
        }
    }

    #[test]
    fn test_render_names_root_and_auxiliary() {
        let tree = SuffixTree::new("ab$").unwrap();
        let rendering = tree.render();
        assert!(rendering.contains("[auxiliary]"));
        assert!(rendering.contains("[root]"));
    }

    #[test]
    fn test_spelling_every_suffix_reaches_a_leaf() {
        let text = "abcabxabcd$";
        let tree = SuffixTree::new(text).unwrap();
        let chars: Vec<char> = text.chars().collect();
        for start in 0..chars.len() {
            // Walk the suffix starting at `start` from the root.
            let mut state = ROOT;
            let mut pos = start;
            while pos < chars.len() {
                let transition = tree
                    .state(state)
                    .transition(chars[pos])
                    .unwrap_or_else(|| panic!("suffix at {start} stuck at position {pos}"));
                let lo = (transition.left() - 1) as usize;
                let hi = tree.right_value(transition.right()) as usize;
                for idx in lo..hi {
                    assert_eq!(tree.text().at(idx), chars[pos], "mismatch in suffix {start}");
                    pos += 1;
                }
                state = transition.target();
            }
            assert!(tree.state(state).is_leaf(), "suffix {start} ended mid-tree");
        }
    }
}

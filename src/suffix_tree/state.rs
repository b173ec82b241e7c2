//! Explicit states and transitions of the suffix tree
//!
//! States live in an arena owned by the tree; [`StateId`] is a stable index
//! into it. Parent references and suffix links are plain ids, so the cyclic
//! back-references of the structure never contend with ownership, which
//! runs exclusively along the transition spine from the auxiliary state
//! down to the leaves.

use std::collections::BTreeMap;

/// Stable handle to an explicit state in the tree's arena.
///
/// The arena index doubles as the state's unique id; ids are unique within
/// one tree.
pub type StateId = usize;

/// Right pointer of a transition label.
///
/// Internal edges own a concrete inclusive index; every edge that ends in a
/// leaf shares the tree-global leaf right pointer `e` instead, so that
/// incrementing `e` extends all leaves at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RightPtr {
    /// Concrete inclusive index into the text, owned by the transition
    Bounded(i32),
    /// Reads the tree's shared leaf right pointer at access time
    Open,
}

/// A labeled transition between explicit states.
///
/// The label is the text substring `[left, right]`, both ends inclusive and
/// 1-based, following Ukkonen's `(k, p)` pointer pairs. Auxiliary-state
/// transitions carry a synthetic negative pair instead.
#[derive(Debug, Clone)]
pub struct Transition {
    pub(crate) left: i32,
    pub(crate) right: RightPtr,
    pub(crate) target: StateId,
}

impl Transition {
    /// 1-based inclusive left pointer of the label.
    #[must_use]
    pub fn left(&self) -> i32 {
        self.left
    }

    /// Right pointer of the label; resolve through
    /// [`crate::suffix_tree::SuffixTree::right_value`].
    #[must_use]
    pub fn right(&self) -> RightPtr {
        self.right
    }

    /// The state this transition leads to.
    #[must_use]
    pub fn target(&self) -> StateId {
        self.target
    }
}

/// An explicit state: a node materialised in the arena.
///
/// Transitions are keyed by the first code point of their label; Ukkonen's
/// a-transition invariant allows at most one outgoing transition per code
/// point. The `BTreeMap` gives deterministic iteration in ascending
/// code-point order.
#[derive(Debug)]
pub struct State {
    parent: Option<StateId>,
    transitions: BTreeMap<char, Transition>,
    suffix_link: Option<StateId>,
}

impl State {
    pub(crate) fn new(parent: Option<StateId>) -> Self {
        Self {
            parent,
            transitions: BTreeMap::new(),
            suffix_link: None,
        }
    }

    /// The state that created this one during construction. Distinct from
    /// the suffix link, which may point somewhere else entirely.
    #[must_use]
    pub fn parent(&self) -> Option<StateId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: StateId) {
        self.parent = Some(parent);
    }

    /// The state representing this state's string minus its first code
    /// point, once linked.
    #[must_use]
    pub fn suffix_link(&self) -> Option<StateId> {
        self.suffix_link
    }

    pub(crate) fn set_suffix_link(&mut self, target: StateId) {
        self.suffix_link = Some(target);
    }

    /// Whether an outgoing transition starts with `code_point`.
    #[must_use]
    pub fn has_transition(&self, code_point: char) -> bool {
        self.transitions.contains_key(&code_point)
    }

    /// Borrow the transition starting with `code_point`, if present.
    #[must_use]
    pub fn transition(&self, code_point: char) -> Option<&Transition> {
        self.transitions.get(&code_point)
    }

    /// Install a transition starting with `code_point`.
    ///
    /// # Panics
    ///
    /// Panics when a transition on `code_point` already exists; overwriting
    /// one is a violated construction invariant.
    pub(crate) fn set_transition(&mut self, code_point: char, transition: Transition) {
        let previous = self.transitions.insert(code_point, transition);
        assert!(
            previous.is_none(),
            "attempted to overwrite the transition on {code_point:?}"
        );
    }

    /// Remove and return the transition on `code_point`; used when an edge
    /// is split in two.
    pub(crate) fn take_transition(&mut self, code_point: char) -> Option<Transition> {
        self.transitions.remove(&code_point)
    }

    /// Outgoing transitions in ascending code-point order.
    pub fn transitions(&self) -> impl Iterator<Item = (char, &Transition)> {
        self.transitions.iter().map(|(c, t)| (*c, t))
    }

    /// Number of outgoing transitions.
    #[must_use]
    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// A state with no outgoing transitions is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.transitions.is_empty()
    }
}

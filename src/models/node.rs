//! Bracket node: a leaf seats a participant, an internal node is a match slot.

use serde::{Deserialize, Serialize};

/// Stable handle of a node inside a [`BracketTree`](crate::models::BracketTree) arena.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Match lifecycle. Only internal nodes carry a meaningful state.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// At least one child slot is not decided yet.
    #[default]
    Unavailable,
    /// Both children have a decided occupant; the match can be resolved.
    Available,
    /// Resolved; `occupant` holds the winner.
    Finished,
}

/// Outcome relative to `children[0]`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    Win,
    Loss,
    #[default]
    Undecided,
}

impl MatchResult {
    /// The same outcome seen from `children[1]`.
    pub fn flipped(self) -> Self {
        match self {
            MatchResult::Win => MatchResult::Loss,
            MatchResult::Loss => MatchResult::Win,
            MatchResult::Undecided => MatchResult::Undecided,
        }
    }
}

/// Score in child order: `.0` belongs to `children[0]`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Score(pub u32, pub u32);

impl Score {
    /// Synthetic score for outcomes decided without a played match.
    pub fn forfeit() -> Self {
        Score(0, 0)
    }

    pub fn swapped(self) -> Self {
        Score(self.1, self.0)
    }
}

/// One node of the bracket. Parent owns children; `parent` is a plain back-reference.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketNode<P> {
    pub(crate) children: Option<[NodeId; 2]>,
    pub(crate) parent: Option<NodeId>,
    /// Seated participant on a leaf, winner on a finished internal node.
    pub occupant: Option<P>,
    pub state: NodeState,
    pub result: MatchResult,
    /// None until finished.
    pub score: Option<Score>,
}

impl<P> BracketNode<P> {
    pub(crate) fn new(occupant: Option<P>) -> Self {
        Self {
            children: None,
            parent: None,
            occupant,
            state: NodeState::Unavailable,
            result: MatchResult::Undecided,
            score: None,
        }
    }

    pub fn children(&self) -> Option<[NodeId; 2]> {
        self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Read-only view of one match for bracket rendering.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MatchView<P> {
    pub node: NodeId,
    pub round: u32,
    pub state: NodeState,
    /// Occupants of `children[0]` and `children[1]`; None while undecided.
    pub players: [Option<P>; 2],
    pub winner: Option<P>,
    pub score: Option<Score>,
}

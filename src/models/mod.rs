//! Data structures for the bracket engine: tree, participants, teams, tournament state.

mod node;
mod participant;
mod team;
mod tournament;
mod tree;

pub use node::{BracketNode, MatchResult, MatchView, NodeId, NodeState, Score};
pub use participant::{Participant, ParticipantId, ParticipantSummary};
pub use team::{ElementId, PossibleTeams, Team, TeamChangeRecord};
pub use tournament::{
    Tournament, TournamentError, TournamentEvent, TournamentId, TournamentSnapshot, TournamentState,
};
pub use tree::BracketTree;

//! Tournament, TournamentState, TournamentError and outward events.

use crate::config::TournamentConfig;
use crate::logic::activity::{ActivityScheduler, Clock, SystemClock};
use crate::models::node::{MatchView, NodeId, NodeState};
use crate::models::participant::{Participant, ParticipantId, ParticipantSummary};
use crate::models::team::{PossibleTeams, Team, TeamChangeRecord};
use crate::models::tree::BracketTree;
use crate::rules::RulesProvider;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Errors that can occur during tournament operations.
///
/// `BracketNotBuilt`, `MatchNotFound` and `MatchNotAvailable` mean an engine invariant or a
/// caller contract is broken; see [`TournamentError::is_fatal`]. Everything else is a
/// rejected command that leaves the tournament unchanged.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TournamentError {
    #[error("Need at least 2 participants to build a bracket (have {count})")]
    NotEnoughParticipants { count: usize },
    #[error("Participant name must not be empty")]
    InvalidName,
    #[error("A participant with this name already exists")]
    DuplicateParticipant,
    #[error("Invalid state for this action")]
    InvalidState,
    #[error("Participant not found")]
    ParticipantNotFound(ParticipantId),
    #[error("Invalid team: {0}")]
    InvalidTeam(String),
    #[error("Not enough starter elements for teams of {needed} (catalog has {available})")]
    NotEnoughStarters { needed: usize, available: usize },
    #[error("Participant is not in an open match with that opponent")]
    NotInOpenMatch(ParticipantId),
    #[error("Match {} was already resolved", .0.index())]
    AlreadyResolved(NodeId),
    #[error("Tournament has ended")]
    TournamentEnded,
    #[error("Element catalog error: {0}")]
    Catalog(String),
    #[error("Bracket has not been built")]
    BracketNotBuilt,
    #[error("No open match between {0} and {1}")]
    MatchNotFound(ParticipantId, ParticipantId),
    #[error("Match {} is not available", .0.index())]
    MatchNotAvailable(NodeId),
}

impl TournamentError {
    /// Broken invariant rather than bad input: the caller should abort, not retry.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TournamentError::BracketNotBuilt
                | TournamentError::MatchNotFound(..)
                | TournamentError::MatchNotAvailable(_)
        )
    }
}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Current phase of the tournament.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentState {
    /// Adding participants; no bracket yet.
    #[default]
    Registration,
    /// Bracket built, matches being played.
    InProgress,
    /// Fewer than two live participants remain.
    Ended,
}

/// Notifications for the presentation layer, drained with [`Tournament::drain_events`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TournamentEvent {
    /// Both sides of a match are known; they should start playing.
    MatchAvailable {
        node: NodeId,
        round: u32,
        players: [ParticipantId; 2],
    },
    /// The match has been idle for the warning window.
    ActivityWarning {
        node: NodeId,
        players: [ParticipantId; 2],
    },
    /// Both sides are reachable; ask whether they are actually playing.
    VerifyActivity {
        node: NodeId,
        players: [ParticipantId; 2],
    },
    Disqualified { participant: ParticipantId },
    TeamChange { record: TeamChangeRecord },
    TournamentEnded { winner: Option<ParticipantId> },
}

/// Serializable view of the whole tournament.
#[derive(Clone, Debug, Serialize)]
pub struct TournamentSnapshot {
    pub id: TournamentId,
    pub state: TournamentState,
    pub total_rounds: u32,
    pub remaining: usize,
    pub winner: Option<ParticipantId>,
    pub rounds: BTreeMap<u32, Vec<MatchView<ParticipantId>>>,
    pub participants: Vec<ParticipantSummary>,
}

/// One single-elimination tournament: participants, bracket, timers and rules.
pub struct Tournament {
    pub id: TournamentId,
    pub(crate) config: TournamentConfig,
    pub(crate) state: TournamentState,
    pub(crate) participants: Vec<Participant>,
    pub(crate) bracket: Option<BracketTree<ParticipantId>>,
    pub(crate) total_rounds: u32,
    pub(crate) winner: Option<ParticipantId>,
    pub(crate) scheduler: ActivityScheduler,
    pub(crate) rules: Arc<dyn RulesProvider>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) rng: StdRng,
    pub(crate) events: Vec<TournamentEvent>,
}

impl Tournament {
    /// Create a new tournament in Registration state, on the system clock.
    pub fn new(config: TournamentConfig, rules: Arc<dyn RulesProvider>) -> Self {
        Self::with_clock(config, rules, Arc::new(SystemClock))
    }

    pub fn with_clock(config: TournamentConfig, rules: Arc<dyn RulesProvider>, clock: Arc<dyn Clock>) -> Self {
        let rng = config.seed.map(StdRng::seed_from_u64).unwrap_or_else(StdRng::from_entropy);
        Self {
            id: Uuid::new_v4(),
            scheduler: ActivityScheduler::new(config.activity.clone()),
            config,
            state: TournamentState::Registration,
            participants: Vec::new(),
            bracket: None,
            total_rounds: 0,
            winner: None,
            rules,
            clock,
            rng,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    pub fn state(&self) -> TournamentState {
        self.state
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    pub fn winner(&self) -> Option<ParticipantId> {
        self.winner
    }

    pub fn scheduler(&self) -> &ActivityScheduler {
        &self.scheduler
    }

    /// Add a participant (Registration only). Names must be unique (case-insensitive).
    pub fn add_participant(&mut self, name: impl Into<String>) -> Result<ParticipantId, TournamentError> {
        self.register(name.into(), None)
    }

    /// Add a participant who brings their own round-1 team.
    pub fn add_participant_with_team(
        &mut self,
        name: impl Into<String>,
        team: Team,
    ) -> Result<ParticipantId, TournamentError> {
        let rules = &self.config.team_rules;
        if team.len() < rules.min_size() || team.len() > rules.max_size() {
            return Err(TournamentError::InvalidTeam(format!(
                "team size {} outside {}..={}",
                team.len(),
                rules.min_size(),
                rules.max_size()
            )));
        }
        if let Some(bad) = team.iter().find(|e| !self.rules.is_legal_element(e)) {
            return Err(TournamentError::InvalidTeam(format!("{bad} is not legal")));
        }
        self.register(name.into(), Some(team))
    }

    fn register(&mut self, name: String, team: Option<Team>) -> Result<ParticipantId, TournamentError> {
        if self.state != TournamentState::Registration {
            return Err(TournamentError::InvalidState);
        }
        let name_trimmed = name.trim();
        if name_trimmed.is_empty() {
            return Err(TournamentError::InvalidName);
        }
        let is_duplicate = self
            .participants
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(name_trimmed));
        if is_duplicate {
            return Err(TournamentError::DuplicateParticipant);
        }
        let mut participant = Participant::new(name_trimmed);
        if let Some(team) = team {
            participant.assign_starting_team(team);
        }
        let id = participant.id;
        self.participants.push(participant);
        Ok(id)
    }

    /// Remove a participant by id (Registration only).
    pub fn remove_participant(&mut self, id: ParticipantId) -> Result<(), TournamentError> {
        if self.state != TournamentState::Registration {
            return Err(TournamentError::InvalidState);
        }
        let idx = self
            .participants
            .iter()
            .position(|p| p.id == id)
            .ok_or(TournamentError::ParticipantNotFound(id))?;
        self.participants.remove(idx);
        Ok(())
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub(crate) fn participant_mut(&mut self, id: ParticipantId) -> Result<&mut Participant, TournamentError> {
        self.participants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(TournamentError::ParticipantNotFound(id))
    }

    pub(crate) fn require_participant(&self, id: ParticipantId) -> Result<&Participant, TournamentError> {
        self.participant(id).ok_or(TournamentError::ParticipantNotFound(id))
    }

    /// Participants not yet eliminated.
    pub fn remaining_participants(&self) -> usize {
        self.participants.iter().filter(|p| p.is_live()).count()
    }

    pub fn bracket(&self) -> Result<&BracketTree<ParticipantId>, TournamentError> {
        self.bracket.as_ref().ok_or(TournamentError::BracketNotBuilt)
    }

    pub(crate) fn bracket_mut(&mut self) -> Result<&mut BracketTree<ParticipantId>, TournamentError> {
        self.bracket.as_mut().ok_or(TournamentError::BracketNotBuilt)
    }

    /// The available match `id` plays in, if any.
    pub fn open_match(&self, id: ParticipantId) -> Option<NodeId> {
        let bracket = self.bracket.as_ref()?;
        bracket.find(|node_id, node| {
            if node.state != NodeState::Available {
                return None;
            }
            let occupants = bracket.child_occupants(node_id)?;
            occupants.contains(&Some(id)).then_some(node_id)
        })
    }

    /// Opponent in the currently open match, always read from the bracket.
    pub fn current_opponent(&self, id: ParticipantId) -> Option<ParticipantId> {
        let node = self.open_match(id)?;
        let [a, b] = self.match_players(node).ok()?;
        Some(if a == id { b } else { a })
    }

    pub fn possible_teams(&self, id: ParticipantId) -> Option<&PossibleTeams> {
        self.participant(id).map(|p| &p.possible_teams)
    }

    pub fn team_changes(&self, id: ParticipantId) -> Option<&[TeamChangeRecord]> {
        self.participant(id).map(|p| p.team_changes.as_slice())
    }

    /// Both decided occupants of a match node, in child order.
    pub fn match_players(&self, node: NodeId) -> Result<[ParticipantId; 2], TournamentError> {
        match self.bracket()?.child_occupants(node) {
            Some([Some(a), Some(b)]) => Ok([a, b]),
            _ => Err(TournamentError::MatchNotAvailable(node)),
        }
    }

    /// Round a match node belongs to: the final is round `total_rounds`.
    pub fn round_of(&self, node: NodeId) -> u32 {
        match &self.bracket {
            Some(bracket) => self.total_rounds.saturating_sub(bracket.depth(node)),
            None => 0,
        }
    }

    /// Every match node grouped by round, for bracket rendering.
    pub fn matches_by_round(&self) -> BTreeMap<u32, Vec<MatchView<ParticipantId>>> {
        let mut rounds: BTreeMap<u32, Vec<MatchView<ParticipantId>>> = BTreeMap::new();
        let Some(bracket) = &self.bracket else {
            return rounds;
        };
        bracket.traverse(|id, node| {
            let Some(players) = bracket.child_occupants(id) else {
                return;
            };
            let round = self.total_rounds.saturating_sub(bracket.depth(id));
            let winner = if node.state == NodeState::Finished { node.occupant } else { None };
            rounds.entry(round).or_default().push(MatchView {
                node: id,
                round,
                state: node.state,
                players,
                winner,
                score: node.score,
            });
        });
        rounds
    }

    /// Take every event raised since the last drain.
    pub fn drain_events(&mut self) -> Vec<TournamentEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> TournamentSnapshot {
        TournamentSnapshot {
            id: self.id,
            state: self.state,
            total_rounds: self.total_rounds,
            remaining: self.remaining_participants(),
            winner: self.winner,
            rounds: self.matches_by_round(),
            participants: self.participants.iter().map(Participant::summary).collect(),
        }
    }

    pub(crate) fn emit(&mut self, event: TournamentEvent) {
        self.events.push(event);
    }

    /// Raise `MatchAvailable` for a node that just opened and arm its activity timer.
    pub(crate) fn announce_match(&mut self, node: NodeId, first_round: bool) -> Result<(), TournamentError> {
        let players = self.match_players(node)?;
        let round = self.round_of(node);
        let now = self.clock.now();
        self.scheduler.arm(node, now, first_round);
        log::debug!("match {} (round {round}) available: {} vs {}", node.index(), players[0], players[1]);
        self.emit(TournamentEvent::MatchAvailable { node, round, players });
        Ok(())
    }

    /// Close the tournament once fewer than two live participants remain.
    pub(crate) fn end(&mut self) {
        if self.state == TournamentState::Ended {
            return;
        }
        self.state = TournamentState::Ended;
        self.winner = self.participants.iter().find(|p| p.is_live()).map(|p| p.id);
        self.scheduler.cancel_all();
        match self.winner.and_then(|id| self.participant(id)) {
            Some(p) => log::info!("tournament {} ended, winner {}", self.id, p.name),
            None => log::info!("tournament {} ended without a winner", self.id),
        }
        self.emit(TournamentEvent::TournamentEnded { winner: self.winner });
    }
}

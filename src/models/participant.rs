//! Participant and ParticipantSummary data structures.

use crate::models::team::{PossibleTeams, Team, TeamChangeRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a participant (used as the bracket occupant).
pub type ParticipantId = Uuid;

/// Summary view of a participant (for API / display).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub id: ParticipantId,
    pub name: String,
    pub round: u32,
    pub eliminated: bool,
    pub disqualified: bool,
    pub had_bye: bool,
    pub possible_team_count: usize,
    pub team_changes: usize,
}

impl ParticipantSummary {
    pub fn from_participant(p: &Participant) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            round: p.round,
            eliminated: p.eliminated,
            disqualified: p.disqualified,
            had_bye: p.had_bye,
            possible_team_count: p.possible_teams.len(),
            team_changes: p.team_changes.len(),
        }
    }
}

/// A participant in the tournament. The current opponent is not stored here; it is always
/// read back from the bracket.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    /// Starts at 1 and moves up on every win, byes and forfeits included.
    pub round: u32,
    pub eliminated: bool,
    /// Removed by the organiser or the activity checks rather than by losing a match.
    pub disqualified: bool,
    pub had_bye: bool,
    /// Team fielded in round 1. Empty until the bracket is built, unless given up front.
    pub starting_team: Team,
    pub possible_teams: PossibleTeams,
    pub team_changes: Vec<TeamChangeRecord>,
}

impl Participant {
    /// Create a new participant with the given name. Team fields start empty.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            round: 1,
            eliminated: false,
            disqualified: false,
            had_bye: false,
            starting_team: Team::default(),
            possible_teams: PossibleTeams::new(),
            team_changes: Vec::new(),
        }
    }

    /// Current summary as a separate struct (for API responses).
    pub fn summary(&self) -> ParticipantSummary {
        ParticipantSummary::from_participant(self)
    }

    pub fn is_live(&self) -> bool {
        !self.eliminated
    }

    /// Seat the round-1 team; the possible set starts as exactly that team.
    pub fn assign_starting_team(&mut self, team: Team) {
        self.possible_teams = PossibleTeams::single(team.clone());
        self.starting_team = team;
    }

    /// The team this participant must field, when only one composition is possible.
    pub fn required_team(&self) -> Option<&Team> {
        self.possible_teams.only()
    }

    /// Record a won round (played, forfeited by the opponent, or a bye).
    pub fn advance_round(&mut self) {
        self.round += 1;
    }

    /// Mark the participant as eliminated.
    pub fn eliminate(&mut self) {
        self.eliminated = true;
    }

    /// Mark the participant as disqualified (which also eliminates them).
    pub fn disqualify(&mut self) {
        self.disqualified = true;
        self.eliminated = true;
    }
}

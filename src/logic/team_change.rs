//! Team changes for round winners: how many elements to add, drop and transform, what they
//! may pick from, and the possible teams that follow.

use crate::config::{SamplingPreference, TeamRules};
use crate::models::{ElementId, Participant, ParticipantId, PossibleTeams, Team, TeamChangeRecord, Tournament, TournamentError, TournamentEvent};
use crate::rules::{RulesProvider, TeamConstraints};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;

/// Clamped per-round deltas for one winner.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct RoundChange {
    pub additions: u32,
    pub drops: u32,
    pub evolutions: i32,
}

impl RoundChange {
    /// Team size after the change, given the size before it.
    pub fn apply_to(&self, size: usize) -> usize {
        (size + self.additions as usize).saturating_sub(self.drops as usize)
    }
}

/// Configured deltas clamped to a team of `current_size`: additions never exceed the
/// maximum size, drops never take the team below the minimum (and never empty it),
/// transformations never exceed the elements left.
pub fn compute_round_change(rules: &TeamRules, current_size: usize) -> RoundChange {
    let (min, max) = (rules.min_size(), rules.max_size());
    let current = current_size.clamp(min, max);
    let additions = (rules.additions_per_round as usize).min(max - current);
    let after_add = current + additions;
    let drops = (rules.drops_per_round as usize).min(after_add - min);
    let after = after_add - drops;
    let evolutions = (rules.evolutions_per_round.unsigned_abs() as usize).min(after);
    RoundChange {
        additions: additions as u32,
        drops: drops as u32,
        evolutions: evolutions as i32 * rules.evolutions_per_round.signum(),
    }
}

/// Team size a participant has reached: starting size plus the net change of every
/// earlier team change, clamped to the legal bounds after each round.
pub fn current_team_size(participant: &Participant, rules: &TeamRules) -> usize {
    let start = if participant.starting_team.is_empty() {
        rules.starting_team_size
    } else {
        participant.starting_team.len()
    };
    participant
        .team_changes
        .iter()
        .fold(start.clamp(rules.min_size(), rules.max_size()), |size, record| {
            (size + record.additions as usize)
                .saturating_sub(record.drops as usize)
                .clamp(rules.min_size(), rules.max_size())
        })
}

/// Steps from `id` back to its base stage.
fn steps_from_base(rules: &dyn RulesProvider, id: &str) -> u32 {
    let mut seen = HashSet::new();
    let mut steps = 0;
    let mut current = id.to_string();
    while let Some(prev) = rules.previous_stage(&current) {
        if !seen.insert(prev.clone()) {
            break;
        }
        steps += 1;
        current = prev;
    }
    steps
}

/// Longest chain of steps from `id` forward to a final stage.
fn steps_to_final(rules: &dyn RulesProvider, id: &str, seen: &mut Vec<ElementId>) -> u32 {
    if seen.iter().any(|s| s == id) {
        return 0;
    }
    seen.push(id.to_string());
    let longest = rules
        .next_stages(id)
        .iter()
        .map(|next| 1 + steps_to_final(rules, next, seen))
        .max()
        .unwrap_or(0);
    seen.pop();
    longest
}

/// Transformation-depth score of a team under a sampling preference: summed steps from base
/// (more evolved) or summed steps to the final stage (less evolved). Zero without a preference.
pub fn transformation_depth(team: &Team, preference: SamplingPreference, rules: &dyn RulesProvider) -> u32 {
    match preference {
        SamplingPreference::None => 0,
        SamplingPreference::MoreEvolved => team.iter().map(|e| steps_from_base(rules, e)).sum(),
        SamplingPreference::LessEvolved => team.iter().map(|e| steps_to_final(rules, e, &mut Vec::new())).sum(),
    }
}

/// Pick a representative team out of `possible`.
///
/// 1. Keep only the largest teams.
/// 2. With a preference set, keep only the teams with the highest transformation depth.
/// 3. Choose uniformly among what is left.
pub fn sample_team<R: Rng + ?Sized>(
    possible: &PossibleTeams,
    preference: SamplingPreference,
    rules: &dyn RulesProvider,
    rng: &mut R,
) -> Option<Team> {
    let largest = possible.iter().map(Team::len).max()?;
    let mut candidates: Vec<&Team> = possible.iter().filter(|t| t.len() == largest).collect();
    if preference != SamplingPreference::None {
        let scored: Vec<(u32, &Team)> = candidates
            .iter()
            .map(|t| (transformation_depth(t, preference, rules), *t))
            .collect();
        let best = scored.iter().map(|(s, _)| *s).max().unwrap_or(0);
        candidates = scored.into_iter().filter(|(s, _)| *s == best).map(|(_, t)| t).collect();
    }
    candidates.choose(rng).map(|t| (*t).clone())
}

/// `size` distinct starter elements, shuffled.
pub fn random_starting_team<R: Rng + ?Sized>(
    rules: &dyn RulesProvider,
    size: usize,
    rng: &mut R,
) -> Result<Team, TournamentError> {
    let mut pool = rules.starter_elements();
    if pool.len() < size {
        return Err(TournamentError::NotEnoughStarters {
            needed: size,
            available: pool.len(),
        });
    }
    pool.shuffle(rng);
    pool.truncate(size);
    Ok(Team::new(pool))
}

/// Give `winner` the team change for the round they just won and replace their possible teams.
///
/// Choices come from the defeated participant's observed team, or a team sampled from their
/// possible teams when none was observed. `opponent` is None for a bye, whose choices are a
/// starter team drawn up front and passed as `observed`, or a fresh one otherwise.
pub(crate) fn apply_team_change(
    tournament: &mut Tournament,
    winner: ParticipantId,
    opponent: Option<ParticipantId>,
    observed: Option<&Team>,
) -> Result<TeamChangeRecord, TournamentError> {
    let rules = tournament.rules.clone();
    let team_rules = tournament.config.team_rules.clone();
    let winner_ref = tournament.require_participant(winner)?;
    let round = winner_ref.round;
    let change = compute_round_change(&team_rules, current_team_size(winner_ref, &team_rules));

    let choices: Vec<ElementId> = if change.additions == 0 {
        Vec::new()
    } else {
        let source = match (observed, opponent) {
            (Some(team), _) => Some(team.clone()),
            (None, Some(loser)) => {
                let possible = tournament.require_participant(loser)?.possible_teams.clone();
                sample_team(&possible, team_rules.sampling_preference, rules.as_ref(), &mut tournament.rng)
            }
            (None, None) => None,
        };
        let source = match source {
            Some(team) => team,
            None => random_starting_team(rules.as_ref(), team_rules.starting_team_size, &mut tournament.rng)?,
        };
        source.iter().filter(|e| rules.is_legal_element(e)).cloned().collect()
    };

    let constraints = TeamConstraints {
        additions: change.additions,
        drops: change.drops,
        evolutions: change.evolutions,
        required_addition: team_rules.required_addition,
        required_drop: team_rules.required_drop,
        required_evolution: team_rules.required_evolution,
        min_team_size: team_rules.min_size(),
        max_team_size: team_rules.max_size(),
    };
    let record = TeamChangeRecord {
        participant: winner,
        round,
        opponent,
        additions: change.additions,
        drops: change.drops,
        evolutions: change.evolutions,
        choices,
    };

    let participant = tournament.participant_mut(winner)?;
    let next = rules.compute_possible_teams(&participant.possible_teams, &record.choices, &constraints);
    participant.possible_teams = next;
    participant.team_changes.push(record.clone());
    log::debug!(
        "team change for {} (round {round}): +{} -{} ~{}, {} possible team(s)",
        participant.name,
        record.additions,
        record.drops,
        record.evolutions,
        participant.possible_teams.len()
    );
    tournament.emit(TournamentEvent::TeamChange { record: record.clone() });
    Ok(record)
}

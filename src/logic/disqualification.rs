//! Disqualifications: organiser removals, activity timeouts and illegal team reports.

use crate::logic::resolution::resolve_node;
use crate::models::{
    MatchResult, NodeId, NodeState, ParticipantId, Score, Team, TeamChangeRecord, Tournament, TournamentError,
    TournamentEvent, TournamentState,
};

/// Disqualify every participant in `ids` and forfeit their open matches.
///
/// All participants are marked first and matches resolved afterwards, so a match whose two
/// sides are both in `ids` is resolved once (0-0, first side advancing as a placeholder)
/// instead of twice. Already eliminated participants are skipped. If the tournament ends
/// partway through, the remaining participants are still marked but nothing more is
/// resolved. A call arriving after the end is rejected.
pub fn disqualify_participants(
    tournament: &mut Tournament,
    ids: &[ParticipantId],
) -> Result<Vec<TeamChangeRecord>, TournamentError> {
    tournament.bracket()?;
    if tournament.state == TournamentState::Ended {
        return Err(TournamentError::TournamentEnded);
    }
    for &id in ids {
        tournament.require_participant(id)?;
    }

    let mut open: Vec<NodeId> = Vec::new();
    for &id in ids {
        let participant = tournament.participant_mut(id)?;
        if participant.eliminated {
            continue;
        }
        participant.disqualify();
        log::info!("{} disqualified", participant.name);
        tournament.emit(TournamentEvent::Disqualified { participant: id });
        if let Some(node) = tournament.open_match(id) {
            if !open.contains(&node) {
                open.push(node);
            }
        }
    }

    let mut records = Vec::new();
    for node in open {
        if tournament.state == TournamentState::Ended {
            break;
        }
        if tournament.bracket()?.node(node).state != NodeState::Available {
            continue;
        }
        let [first, second] = tournament.match_players(node)?;
        let first_out = tournament.require_participant(first)?.disqualified;
        let second_out = tournament.require_participant(second)?.disqualified;
        let result = if first_out && !second_out {
            MatchResult::Loss
        } else {
            MatchResult::Win
        };
        resolve_node(tournament, node, result, Score::forfeit(), None, &mut records)?;
    }

    if tournament.state == TournamentState::InProgress && tournament.remaining_participants() < 2 {
        tournament.end();
    }
    Ok(records)
}

/// Validate the teams both sides showed at team preview against their possible teams and
/// disqualify whoever fielded an impossible one. When both did, both go and the match is
/// resolved 0-0.
pub fn check_team_preview(
    tournament: &mut Tournament,
    observed: &[(ParticipantId, Team)],
) -> Result<Vec<TeamChangeRecord>, TournamentError> {
    tournament.bracket()?;
    if tournament.state == TournamentState::Ended {
        return Err(TournamentError::TournamentEnded);
    }
    let rules = tournament.rules.clone();
    let mut illegal = Vec::new();
    for (id, team) in observed {
        let participant = tournament.require_participant(*id)?;
        if !rules.is_possible_team(team, &participant.possible_teams) {
            log::warn!("{} fielded an impossible team {:?}", participant.name, team.elements());
            illegal.push(*id);
        }
    }
    if illegal.is_empty() {
        return Ok(Vec::new());
    }
    disqualify_participants(tournament, &illegal)
}

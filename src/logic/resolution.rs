//! Match resolution: apply a result, advance the winner, cascade through disqualifications.

use crate::logic::team_change::apply_team_change;
use crate::models::{
    MatchResult, NodeId, NodeState, ParticipantId, Score, Team, TeamChangeRecord, Tournament, TournamentError,
    TournamentState,
};

/// Available node whose children are `pair`, in that order.
fn locate_match(tournament: &Tournament, pair: [ParticipantId; 2]) -> Result<NodeId, TournamentError> {
    let bracket = tournament.bracket()?;
    let with_pair = |state: NodeState| {
        bracket.find(|id, node| {
            (node.state == state && bracket.child_occupants(id) == Some([Some(pair[0]), Some(pair[1])])).then_some(id)
        })
    };
    if let Some(node) = with_pair(NodeState::Available) {
        return Ok(node);
    }
    if let Some(node) = with_pair(NodeState::Finished) {
        return Err(TournamentError::AlreadyResolved(node));
    }
    Err(TournamentError::MatchNotFound(pair[0], pair[1]))
}

/// Resolve the open match between `pair` (order-sensitive: `result` is relative to
/// `pair[0]`, `score` is in pair order).
///
/// `loser_team` is the team the defeated side actually fielded, when it was observed.
/// Returns every team change produced, including those of cascaded resolutions.
pub fn set_match_result(
    tournament: &mut Tournament,
    pair: [ParticipantId; 2],
    result: MatchResult,
    score: Score,
    loser_team: Option<Team>,
) -> Result<Vec<TeamChangeRecord>, TournamentError> {
    tournament.bracket()?;
    if tournament.state == TournamentState::Ended {
        return Err(TournamentError::TournamentEnded);
    }
    if result == MatchResult::Undecided {
        return Err(TournamentError::InvalidState);
    }
    let node = locate_match(tournament, pair)?;
    let mut records = Vec::new();
    resolve_node(tournament, node, result, score, loser_team.as_ref(), &mut records)?;
    Ok(records)
}

/// Command-layer entry: `winner` reports beating `loser` with `score` in (winner, loser)
/// order. Both must be live and facing each other in an open match.
pub fn report_win(
    tournament: &mut Tournament,
    winner: ParticipantId,
    loser: ParticipantId,
    score: (u32, u32),
    loser_team: Option<Team>,
) -> Result<Vec<TeamChangeRecord>, TournamentError> {
    tournament.bracket()?;
    if tournament.state == TournamentState::Ended {
        return Err(TournamentError::TournamentEnded);
    }
    for id in [winner, loser] {
        if !tournament.require_participant(id)?.is_live() {
            log::warn!("result reported for eliminated participant {id}");
            return Err(TournamentError::NotInOpenMatch(id));
        }
    }
    let Some(node) = tournament
        .open_match(winner)
        .filter(|&node| tournament.match_players(node).is_ok_and(|players| players.contains(&loser)))
    else {
        return match locate_match(tournament, [winner, loser]).or_else(|_| locate_match(tournament, [loser, winner])) {
            Err(TournamentError::AlreadyResolved(node)) => Err(TournamentError::AlreadyResolved(node)),
            _ => Err(TournamentError::NotInOpenMatch(winner)),
        };
    };

    let [first, _] = tournament.match_players(node)?;
    let (pair, result, score) = if first == winner {
        ([winner, loser], MatchResult::Win, Score(score.0, score.1))
    } else {
        ([loser, winner], MatchResult::Loss, Score(score.1, score.0))
    };
    set_match_result(tournament, pair, result, score, loser_team)
}

/// Resolve one available node and propagate upward.
///
/// When the parent becomes available and one of its sides is already disqualified, the
/// parent is resolved right away with a forced result; this recursion is bounded by the
/// bracket depth.
pub(crate) fn resolve_node(
    tournament: &mut Tournament,
    node: NodeId,
    result: MatchResult,
    score: Score,
    loser_team: Option<&Team>,
    records: &mut Vec<TeamChangeRecord>,
) -> Result<(), TournamentError> {
    if tournament.state == TournamentState::Ended {
        return Ok(());
    }
    if tournament.bracket()?.node(node).state != NodeState::Available {
        return Err(TournamentError::MatchNotAvailable(node));
    }
    let [first, second] = tournament.match_players(node)?;
    let (winner, loser) = match result {
        MatchResult::Win => (first, second),
        MatchResult::Loss => (second, first),
        MatchResult::Undecided => return Err(TournamentError::InvalidState),
    };

    tournament.scheduler.cancel(node);
    {
        let n = tournament.bracket_mut()?.node_mut(node);
        n.state = NodeState::Finished;
        n.result = result;
        n.score = Some(score);
        n.occupant = Some(winner);
    }
    tournament.participant_mut(loser)?.eliminate();
    log::debug!(
        "match {} finished {}-{}: {winner} beat {loser}",
        node.index(),
        score.0,
        score.1
    );

    let winner_disqualified = tournament.require_participant(winner)?.disqualified;
    if tournament.config.team_rules.is_active() && !winner_disqualified && tournament.remaining_participants() > 1 {
        records.push(apply_team_change(tournament, winner, Some(loser), loser_team)?);
    }
    // a disqualified placeholder holds the slot without winning a round
    if !winner_disqualified {
        tournament.participant_mut(winner)?.advance_round();
    }

    if let Some(parent) = tournament.bracket()?.node(node).parent() {
        if let Ok(players) = tournament.match_players(parent) {
            tournament.bracket_mut()?.node_mut(parent).state = NodeState::Available;
            let disqualified = players
                .map(|id| tournament.participant(id).is_some_and(|p| p.disqualified));
            let forced = match disqualified {
                [false, false] => None,
                [true, false] => Some(MatchResult::Loss),
                // With both sides gone the first one moves on as a placeholder.
                [false, true] | [true, true] => Some(MatchResult::Win),
            };
            match forced {
                None => tournament.announce_match(parent, false)?,
                Some(forced) => {
                    log::debug!("forfeit cascade at match {}", parent.index());
                    resolve_node(tournament, parent, forced, Score::forfeit(), None, records)?;
                }
            }
        }
    }

    if tournament.state != TournamentState::Ended && tournament.remaining_participants() < 2 {
        tournament.end();
    }
    Ok(())
}

//! Bracket seeding: start the tournament (Registration -> InProgress).

use crate::logic::team_change::{apply_team_change, compute_round_change, current_team_size, random_starting_team};
use crate::models::{
    BracketTree, NodeId, NodeState, ParticipantId, Team, TeamChangeRecord, Tournament, TournamentError,
    TournamentState,
};
use rand::seq::SliceRandom;
use std::collections::VecDeque;

/// Rounds needed for `n` participants: `ceil(log2 n)`.
pub fn total_rounds(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        n.next_power_of_two().trailing_zeros()
    }
}

/// Round-1 byes for `n` participants: `2^total_rounds - n`.
pub fn bye_count(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        n.next_power_of_two() - n
    }
}

/// Grow a balanced bracket from `participants` in the given order.
///
/// The first participant starts as the root leaf. Each next participant splits the oldest
/// leaf of the current layer into a match: the old occupant moves to the left child, the
/// newcomer takes the right. When a layer runs out the next one takes over, so leaves end up
/// at depth `total_rounds` or one above it.
pub fn build_bracket<P: Copy + Eq>(participants: &[P]) -> Result<BracketTree<P>, TournamentError> {
    let not_enough = TournamentError::NotEnoughParticipants {
        count: participants.len(),
    };
    if participants.len() < 2 {
        return Err(not_enough);
    }
    let (&first, rest) = participants.split_first().ok_or(not_enough)?;

    let mut tree = BracketTree::new(Some(first));
    let mut current: VecDeque<NodeId> = VecDeque::from([tree.root()]);
    let mut next: VecDeque<NodeId> = VecDeque::new();
    for &p in rest {
        if current.is_empty() {
            std::mem::swap(&mut current, &mut next);
        }
        let Some(leaf) = current.pop_front() else {
            break;
        };
        let old = tree.node_mut(leaf).occupant.take();
        let left = tree.add_node(old);
        let right = tree.add_node(Some(p));
        tree.set_children(leaf, Some([left, right]));
        next.push_back(left);
        next.push_back(right);
    }
    Ok(tree)
}

/// Participants seated above the bottom layer: they skip round 1.
pub fn bye_participants<P: Copy + Eq>(tree: &BracketTree<P>, total_rounds: u32) -> Vec<P> {
    let mut byes = Vec::new();
    tree.traverse(|id, node| {
        if let (true, Some(p)) = (node.is_leaf(), node.occupant) {
            if tree.depth(id) < total_rounds {
                byes.push(p);
            }
        }
    });
    byes
}

/// Start the tournament: hand out missing starting teams, shuffle, seed the bracket, advance
/// byes and open every match whose two sides are already known.
///
/// Returns the team changes handed to bye participants.
pub fn start_tournament(tournament: &mut Tournament) -> Result<Vec<TeamChangeRecord>, TournamentError> {
    if tournament.state != TournamentState::Registration {
        return Err(TournamentError::InvalidState);
    }
    let count = tournament.participants.len();
    if count < 2 {
        return Err(TournamentError::NotEnoughParticipants { count });
    }

    // Draw every missing team, and every team offered to a bye, before touching any
    // participant, so a short catalog leaves registration as it was.
    let rules = tournament.rules.clone();
    let team_rules = tournament.config.team_rules.clone();
    let size = team_rules.starting_team_size;
    let mut drawn: Vec<(ParticipantId, Team)> = Vec::new();
    for id in tournament
        .participants
        .iter()
        .filter(|p| p.starting_team.is_empty())
        .map(|p| p.id)
        .collect::<Vec<_>>()
    {
        drawn.push((id, random_starting_team(rules.as_ref(), size, &mut tournament.rng)?));
    }

    let mut order: Vec<ParticipantId> = tournament.participants.iter().map(|p| p.id).collect();
    order.shuffle(&mut tournament.rng);
    let bracket = build_bracket(&order)?;
    let rounds = total_rounds(count);
    let byes = bye_participants(&bracket, rounds);

    let mut bye_offers: Vec<(ParticipantId, Option<Team>)> = Vec::new();
    for &id in &byes {
        let additions = if team_rules.is_active() {
            let current = current_team_size(tournament.require_participant(id)?, &team_rules);
            compute_round_change(&team_rules, current).additions
        } else {
            0
        };
        let offer = if additions > 0 {
            Some(random_starting_team(rules.as_ref(), size, &mut tournament.rng)?)
        } else {
            None
        };
        bye_offers.push((id, offer));
    }

    for (id, team) in drawn {
        tournament.participant_mut(id)?.assign_starting_team(team);
    }

    let mut open: Vec<NodeId> = Vec::new();
    bracket.traverse(|id, _| {
        if bracket.children_decided(id) {
            open.push(id);
        }
    });

    tournament.bracket = Some(bracket);
    tournament.total_rounds = rounds;
    tournament.state = TournamentState::InProgress;
    log::info!(
        "tournament {} started: {count} participants, {rounds} rounds, {} byes",
        tournament.id,
        byes.len()
    );

    // Byes advance before any match is played.
    let mut records = Vec::new();
    for (id, offer) in bye_offers {
        if team_rules.is_active() {
            records.push(apply_team_change(tournament, id, None, offer.as_ref())?);
        }
        let participant = tournament.participant_mut(id)?;
        participant.had_bye = true;
        participant.advance_round();
    }

    for node in open {
        tournament.bracket_mut()?.node_mut(node).state = NodeState::Available;
        tournament.announce_match(node, true)?;
    }
    Ok(records)
}

//! Integration tests for bracket seeding: shape, byes, registration and start.

mod common;

use common::{bundled, line_catalog, open_matches, play_out, registered, seeded, started};
use elimination_bracket::{
    build_bracket, bye_count, bye_participants, start_tournament, total_rounds, BracketTree, NodeState, ParticipantId,
    Team, TournamentConfig, TournamentError, TournamentEvent, TournamentState,
};
use std::collections::HashSet;

#[test]
fn seeding_shape_for_every_size() {
    for n in 2..=64usize {
        let rounds = total_rounds(n);
        assert_eq!(rounds, (n as f64).log2().ceil() as u32, "rounds for {n}");
        assert_eq!(bye_count(n), (1usize << rounds) - n, "byes for {n}");

        let players: Vec<usize> = (0..n).collect();
        let tree = build_bracket(&players).unwrap();
        let (mut leaves, mut internal, mut bottom) = (0, 0, 0);
        let mut seen = HashSet::new();
        tree.traverse(|id, node| {
            if node.is_leaf() {
                leaves += 1;
                let depth = tree.depth(id);
                assert!(depth == rounds || depth + 1 == rounds, "leaf depth {depth} for {n}");
                if depth == rounds {
                    bottom += 1;
                }
                assert!(seen.insert(node.occupant.unwrap()));
            } else {
                internal += 1;
                assert!(node.occupant.is_none());
            }
        });
        assert_eq!(leaves, n);
        assert_eq!(internal, n - 1);
        assert_eq!(bye_participants(&tree, rounds).len(), bye_count(n));
        // round-1 matches pair up the bottom layer
        assert_eq!(bottom, n - bye_count(n));
    }
}

#[test]
fn five_participants_have_three_byes() {
    let tree = build_bracket(&[0, 1, 2, 3, 4]).unwrap();
    assert_eq!(total_rounds(5), 3);
    assert_eq!(bye_participants(&tree, 3), vec![2, 1, 3]);
}

#[test]
fn two_participants_make_a_single_match() {
    let tree = build_bracket(&['a', 'b']).unwrap();
    let root = tree.root();
    assert_eq!(tree.child_occupants(root), Some([Some('a'), Some('b')]));
    assert!(tree.children_decided(root));
    assert_eq!(total_rounds(2), 1);
    assert!(bye_participants(&tree, 1).is_empty());
}

#[test]
fn fewer_than_two_is_rejected() {
    assert_eq!(
        build_bracket::<u8>(&[]).unwrap_err(),
        TournamentError::NotEnoughParticipants { count: 0 }
    );
    assert_eq!(
        build_bracket(&[7]).unwrap_err(),
        TournamentError::NotEnoughParticipants { count: 1 }
    );

    let (mut t, _) = registered(1, seeded(1), bundled());
    assert_eq!(
        start_tournament(&mut t).unwrap_err(),
        TournamentError::NotEnoughParticipants { count: 1 }
    );
    assert_eq!(t.state(), TournamentState::Registration);
    let err = t.bracket().unwrap_err();
    assert_eq!(err, TournamentError::BracketNotBuilt);
    assert!(err.is_fatal());
}

#[test]
fn rewiring_children_clears_old_parent() {
    let mut tree = BracketTree::new(None::<u8>);
    let root = tree.root();
    let a = tree.add_node(Some(1));
    let b = tree.add_node(Some(2));
    let c = tree.add_node(Some(3));
    let d = tree.add_node(Some(4));

    tree.set_children(root, Some([a, b]));
    assert_eq!(tree.node(a).parent(), Some(root));
    tree.set_children(root, Some([c, d]));
    assert_eq!(tree.node(a).parent(), None);
    assert_eq!(tree.node(b).parent(), None);
    assert_eq!(tree.node(c).parent(), Some(root));
    assert_eq!(tree.node(root).children(), Some([c, d]));

    let mut visited = Vec::new();
    tree.traverse(|id, _| visited.push(id));
    assert_eq!(visited, vec![root, c, d]);
    assert_eq!(tree.len(), 5);
}

#[test]
fn traverse_and_find_are_breadth_first() {
    let tree = build_bracket(&[10, 20, 30, 40]).unwrap();
    let mut occupants = Vec::new();
    tree.traverse(|_, node| occupants.extend(node.occupant));
    assert_eq!(occupants, vec![10, 30, 20, 40]);

    let found = tree.find(|id, node| node.occupant.filter(|&p| p > 15).map(|p| (id, p)));
    let (id, p) = found.unwrap();
    assert_eq!(p, 30);
    assert_eq!(tree.depth(id), 2);
    assert_eq!(tree.find(|_, node| node.occupant.filter(|&p| p > 100)), None);

    // a lone root is a complete traversal too
    let single = BracketTree::new(Some(1u8));
    let mut count = 0;
    single.traverse(|_, _| count += 1);
    assert_eq!(count, 1);
}

#[test]
fn four_participants_play_two_rounds() {
    let (mut t, _) = started(4, seeded(1));
    assert_eq!(t.state(), TournamentState::InProgress);
    assert_eq!(t.total_rounds(), 2);

    let rounds = t.matches_by_round();
    assert_eq!(rounds[&1].len(), 2);
    assert_eq!(rounds[&2].len(), 1);
    assert_eq!(rounds[&2][0].state, NodeState::Unavailable);
    assert_eq!(open_matches(&t).len(), 2);

    for p in t.participants() {
        assert_eq!(p.round, 1);
        assert!(!p.had_bye);
        assert_eq!(p.starting_team.len(), 3);
        assert_eq!(p.required_team(), Some(&p.starting_team));
        assert!(t.current_opponent(p.id).is_some());
    }

    let announced = t
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, TournamentEvent::MatchAvailable { round: 1, .. }))
        .count();
    assert_eq!(announced, 2);
}

#[test]
fn five_participants_open_a_first_and_a_second_round_match() {
    let (mut t, _) = started(5, seeded(2));
    assert_eq!(t.total_rounds(), 3);

    let rounds = t.matches_by_round();
    assert_eq!(rounds[&1].len(), 1);
    assert_eq!(rounds[&2].len(), 2);
    assert_eq!(rounds[&3].len(), 1);

    let byes: Vec<_> = t.participants().iter().filter(|p| p.had_bye).collect();
    assert_eq!(byes.len(), 3);
    assert!(byes.iter().all(|p| p.round == 2));

    let mut open_rounds: Vec<u32> = open_matches(&t).into_iter().map(|n| t.round_of(n)).collect();
    open_rounds.sort();
    assert_eq!(open_rounds, vec![1, 2]);

    play_out(&mut t);
    assert_eq!(common::finished_count(&t), 4);
    assert!(t.winner().is_some());
}

#[test]
fn registration_rules() {
    let (mut t, _) = registered(2, seeded(1), bundled());
    assert_eq!(t.add_participant("p0").unwrap_err(), TournamentError::DuplicateParticipant);
    assert_eq!(t.add_participant("   ").unwrap_err(), TournamentError::InvalidName);

    let extra = t.add_participant("Extra").unwrap();
    t.remove_participant(extra).unwrap();
    assert_eq!(
        t.remove_participant(extra).unwrap_err(),
        TournamentError::ParticipantNotFound(extra)
    );

    start_tournament(&mut t).unwrap();
    assert_eq!(t.add_participant("Late").unwrap_err(), TournamentError::InvalidState);
    assert_eq!(start_tournament(&mut t).unwrap_err(), TournamentError::InvalidState);
    let someone = t.participants()[0].id;
    assert_eq!(t.remove_participant(someone).unwrap_err(), TournamentError::InvalidState);
}

#[test]
fn brought_teams_are_validated_and_kept() {
    let (mut t, _) = registered(1, seeded(1), line_catalog());
    assert!(matches!(
        t.add_participant_with_team("Bad", Team::new(["a1", "x1"])),
        Err(TournamentError::InvalidTeam(_))
    ));
    assert!(matches!(
        t.add_participant_with_team("Empty", Team::default()),
        Err(TournamentError::InvalidTeam(_))
    ));
    let id = t.add_participant_with_team("Own", Team::new(["b1", "a3"])).unwrap();

    start_tournament(&mut t).unwrap();
    let own = t.participant(id).unwrap();
    assert_eq!(own.starting_team, Team::new(["a3", "b1"]));
    assert_eq!(own.required_team(), Some(&own.starting_team));
}

#[test]
fn short_catalog_leaves_registration_untouched() {
    let mut config = seeded(1);
    config.team_rules.starting_team_size = 7;
    config.team_rules.max_team_size = 8;
    let (mut t, _) = registered(3, config, line_catalog());
    assert_eq!(
        start_tournament(&mut t).unwrap_err(),
        TournamentError::NotEnoughStarters { needed: 7, available: 6 }
    );
    assert_eq!(t.state(), TournamentState::Registration);
    assert!(t.participants().iter().all(|p| p.starting_team.is_empty()));
}

#[test]
fn short_catalog_for_a_bye_offer_leaves_registration_untouched() {
    let mut config = seeded(1);
    config.team_rules.starting_team_size = 7;
    config.team_rules.max_team_size = 8;
    config.team_rules.additions_per_round = 1;
    let (mut t, _) = registered(0, config, line_catalog());
    for name in ["Ann", "Bob", "Cid"] {
        t.add_participant_with_team(name, Team::new(["a1", "b1"])).unwrap();
    }

    assert_eq!(
        start_tournament(&mut t).unwrap_err(),
        TournamentError::NotEnoughStarters { needed: 7, available: 6 }
    );
    assert_eq!(t.state(), TournamentState::Registration);
    assert_eq!(t.bracket().unwrap_err(), TournamentError::BracketNotBuilt);
    assert!(t
        .participants()
        .iter()
        .all(|p| !p.had_bye && p.round == 1 && p.team_changes.is_empty()));
    t.add_participant("Late").unwrap();
}

#[test]
fn same_seed_same_bracket() {
    let names = |t: &elimination_bracket::Tournament| -> Vec<Vec<String>> {
        let name = |id: Option<ParticipantId>| id.and_then(|id| t.participant(id)).map(|p| p.name.clone()).unwrap_or_default();
        t.matches_by_round()
            .values()
            .flatten()
            .map(|m| vec![name(m.players[0]), name(m.players[1])])
            .collect()
    };
    let (a, _) = started(6, seeded(42));
    let (b, _) = started(6, seeded(42));
    assert_eq!(names(&a), names(&b));

    let teams = |t: &elimination_bracket::Tournament| -> Vec<Team> {
        t.participants().iter().map(|p| p.starting_team.clone()).collect()
    };
    assert_eq!(teams(&a), teams(&b));
}

#[test]
fn default_config_is_fixed_payload() {
    assert!(!TournamentConfig::default().team_rules.is_active());
    let (t, _) = started(3, TournamentConfig::default());
    assert!(t.participants().iter().all(|p| p.team_changes.is_empty()));
}

//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use elimination_bracket::{
    set_match_result, start_tournament, ActivityProbe, ElementCatalog, ElementRecord, ManualClock, MatchResult,
    NodeId, NodeState, ParticipantId, RulesProvider, Score, StandardCriteria, TeamChangeRecord, Tournament,
    TournamentConfig, TournamentState,
};
use std::collections::HashSet;
use std::sync::Arc;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

pub fn bundled() -> Arc<dyn RulesProvider> {
    Arc::new(ElementCatalog::bundled(Arc::new(StandardCriteria)).unwrap())
}

/// Small catalog: a1 -> a2 -> a3, b1 -> b2, single-stage c1..f1, and an illegal x1.
pub fn line_records() -> Vec<ElementRecord> {
    vec![
        ElementRecord::new("a1", None),
        ElementRecord::new("a2", Some("a1")),
        ElementRecord::new("a3", Some("a2")),
        ElementRecord::new("b1", None),
        ElementRecord::new("b2", Some("b1")),
        ElementRecord::new("c1", None),
        ElementRecord::new("d1", None),
        ElementRecord::new("e1", None),
        ElementRecord::new("f1", None),
        ElementRecord::new("x1", None).illegal(),
    ]
}

pub fn line_catalog() -> Arc<ElementCatalog> {
    Arc::new(ElementCatalog::from_records(line_records(), Arc::new(StandardCriteria)).unwrap())
}

pub fn seeded(seed: u64) -> TournamentConfig {
    TournamentConfig {
        seed: Some(seed),
        ..TournamentConfig::default()
    }
}

/// Tournament with participants P0..P{n-1} registered, not started.
pub fn registered(n: usize, config: TournamentConfig, rules: Arc<dyn RulesProvider>) -> (Tournament, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start_time()));
    let mut t = Tournament::with_clock(config, rules, clock.clone());
    for i in 0..n {
        t.add_participant(format!("P{i}")).unwrap();
    }
    (t, clock)
}

/// Started tournament with `n` participants on the bundled catalog.
pub fn started(n: usize, config: TournamentConfig) -> (Tournament, Arc<ManualClock>) {
    let (mut t, clock) = registered(n, config, bundled());
    start_tournament(&mut t).unwrap();
    (t, clock)
}

pub fn open_matches(t: &Tournament) -> Vec<NodeId> {
    t.matches_by_round()
        .values()
        .flatten()
        .filter(|m| m.state == NodeState::Available)
        .map(|m| m.node)
        .collect()
}

pub fn finished_count(t: &Tournament) -> usize {
    t.matches_by_round()
        .values()
        .flatten()
        .filter(|m| m.state == NodeState::Finished)
        .count()
}

/// Resolve the first open match in favour of its first side.
pub fn resolve_first_open(t: &mut Tournament) -> Vec<TeamChangeRecord> {
    let node = open_matches(t)[0];
    let players = t.match_players(node).unwrap();
    set_match_result(t, players, MatchResult::Win, Score(2, 1), None).unwrap()
}

pub fn play_out(t: &mut Tournament) {
    while t.state() == TournamentState::InProgress {
        resolve_first_open(t);
    }
}

pub fn id_of(t: &Tournament, name: &str) -> ParticipantId {
    t.participants().iter().find(|p| p.name == name).unwrap().id
}

/// Probe with fixed answers: everyone reachable and idle unless listed.
#[derive(Default)]
pub struct Probe {
    pub unreachable: HashSet<ParticipantId>,
    pub playing: HashSet<ParticipantId>,
}

impl ActivityProbe for Probe {
    fn is_reachable(&self, participant: ParticipantId) -> bool {
        !self.unreachable.contains(&participant)
    }

    fn is_playing(&self, participant: ParticipantId) -> bool {
        self.playing.contains(&participant)
    }
}

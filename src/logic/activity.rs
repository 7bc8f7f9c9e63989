//! Per-match inactivity timers: warn, then disqualify-check, then verify.
//!
//! Nothing here sleeps. Tasks are deadlines keyed by match node; [`tick`] fires whatever is
//! due on the tournament clock. A node holds at most one pending task, so its tasks fire in
//! order, and any resolution cancels it before it can fire.

use crate::config::ActivityConfig;
use crate::logic::disqualification::disqualify_participants;
use crate::models::{
    NodeId, NodeState, ParticipantId, TeamChangeRecord, Tournament, TournamentError, TournamentEvent,
    TournamentState,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Presence information supplied by whoever owns the connections.
pub trait ActivityProbe {
    /// Whether the participant can currently be reached at all.
    fn is_reachable(&self, participant: ParticipantId) -> bool;

    /// Whether the participant has actually started (or challenged for) their match.
    fn is_playing(&self, participant: ParticipantId) -> bool;
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityTask {
    Warn,
    DisqualifyCheck,
    Verify,
}

#[derive(Clone, Copy, Debug)]
struct ScheduledTask {
    task: ActivityTask,
    due: DateTime<Utc>,
    seq: u64,
}

/// Owns every pending activity task of one tournament.
#[derive(Debug)]
pub struct ActivityScheduler {
    config: ActivityConfig,
    tasks: HashMap<NodeId, ScheduledTask>,
    seq: u64,
}

impl ActivityScheduler {
    pub fn new(config: ActivityConfig) -> Self {
        Self {
            config,
            tasks: HashMap::new(),
            seq: 0,
        }
    }

    pub fn config(&self) -> &ActivityConfig {
        &self.config
    }

    /// Start the warn window for a freshly opened match.
    pub fn arm(&mut self, node: NodeId, now: DateTime<Utc>, first_round: bool) {
        let due = deadline(now, self.config.warn_after(first_round));
        self.schedule(node, ActivityTask::Warn, due);
    }

    /// Replace whatever is pending for `node` with `task` at `due`.
    pub fn schedule(&mut self, node: NodeId, task: ActivityTask, due: DateTime<Utc>) {
        self.seq += 1;
        self.tasks.insert(node, ScheduledTask { task, due, seq: self.seq });
    }

    /// Drop the pending task for `node`. Returns whether one was pending; cancelling
    /// twice, or cancelling a node that never had a task, is fine.
    pub fn cancel(&mut self, node: NodeId) -> bool {
        self.tasks.remove(&node).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn pending(&self, node: NodeId) -> Option<(ActivityTask, DateTime<Utc>)> {
        self.tasks.get(&node).map(|t| (t.task, t.due))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Remove and return the earliest task due at `now`. Ties go to the one scheduled first.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<(NodeId, ActivityTask)> {
        let (&node, task) = self
            .tasks
            .iter()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| (t.due, t.seq))?;
        let task = task.task;
        self.tasks.remove(&node);
        Some((node, task))
    }
}

fn deadline(now: DateTime<Utc>, after: TimeDelta) -> DateTime<Utc> {
    now.checked_add_signed(after).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Fire every task due on the tournament clock.
///
/// Returns the team changes produced by any disqualifications the tasks caused.
pub fn tick(tournament: &mut Tournament, probe: &dyn ActivityProbe) -> Result<Vec<TeamChangeRecord>, TournamentError> {
    let now = tournament.clock.now();
    let mut records = Vec::new();
    while let Some((node, task)) = tournament.scheduler.pop_due(now) {
        if tournament.state == TournamentState::Ended {
            break;
        }
        if tournament.bracket()?.node(node).state != NodeState::Available {
            continue;
        }
        let players = tournament.match_players(node)?;
        log::debug!("activity task {task:?} fired for match {}", node.index());
        match task {
            ActivityTask::Warn => {
                tournament.emit(TournamentEvent::ActivityWarning { node, players });
                let due = deadline(now, tournament.scheduler.config.disqualify_after());
                tournament.scheduler.schedule(node, ActivityTask::DisqualifyCheck, due);
            }
            ActivityTask::DisqualifyCheck => {
                let unreachable: Vec<ParticipantId> =
                    players.into_iter().filter(|p| !probe.is_reachable(*p)).collect();
                if unreachable.is_empty() {
                    tournament.emit(TournamentEvent::VerifyActivity { node, players });
                    let due = deadline(now, tournament.scheduler.config.verify_timeout());
                    tournament.scheduler.schedule(node, ActivityTask::Verify, due);
                } else {
                    log::info!("disqualifying {} unreachable participant(s) in match {}", unreachable.len(), node.index());
                    records.extend(disqualify_participants(tournament, &unreachable)?);
                }
            }
            ActivityTask::Verify => {
                let idle: Vec<ParticipantId> = players.into_iter().filter(|p| !probe.is_playing(*p)).collect();
                if !idle.is_empty() {
                    log::info!("disqualifying {} idle participant(s) in match {}", idle.len(), node.index());
                    records.extend(disqualify_participants(tournament, &idle)?);
                }
            }
        }
    }
    Ok(records)
}

/// The participant confirmed their match is under way: stop its inactivity timer.
pub fn mark_match_started(tournament: &mut Tournament, participant: ParticipantId) -> Result<(), TournamentError> {
    tournament.require_participant(participant)?;
    let node = tournament
        .open_match(participant)
        .ok_or(TournamentError::NotInOpenMatch(participant))?;
    tournament.scheduler.cancel(node);
    Ok(())
}

//! Single-elimination bracket engine: library with models, rules provider and business logic.

pub mod config;
pub mod logic;
pub mod models;
pub mod rules;

pub use config::{ActivityConfig, SamplingPreference, ServerConfig, TeamRules, TournamentConfig};
pub use logic::{
    build_bracket, bye_count, bye_participants, check_team_preview, compute_round_change, current_team_size,
    disqualify_participants, mark_match_started, random_starting_team, report_win, sample_team, set_match_result,
    start_tournament, tick, total_rounds, transformation_depth, ActivityProbe, ActivityScheduler, ActivityTask, Clock,
    ManualClock, RoundChange, SystemClock,
};
pub use models::{
    BracketNode, BracketTree, ElementId, MatchResult, MatchView, NodeId, NodeState, Participant, ParticipantId,
    ParticipantSummary, PossibleTeams, Score, Team, TeamChangeRecord, Tournament, TournamentError, TournamentEvent,
    TournamentId, TournamentSnapshot, TournamentState,
};
pub use rules::{ElementCatalog, ElementRecord, RulesProvider, StandardCriteria, TagCriteria, TeamConstraints, VariantCriteria};

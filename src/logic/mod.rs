//! Tournament business logic: seeding, match resolution, disqualification, team changes,
//! activity timers.

pub mod activity;
mod disqualification;
mod resolution;
mod setup;
mod team_change;

pub use activity::{mark_match_started, tick, ActivityProbe, ActivityScheduler, ActivityTask, Clock, ManualClock, SystemClock};
pub use disqualification::{check_team_preview, disqualify_participants};
pub use resolution::{report_win, set_match_result};
pub use setup::{build_bracket, bye_count, bye_participants, start_tournament, total_rounds};
pub use team_change::{
    compute_round_change, current_team_size, random_starting_team, sample_team, transformation_depth, RoundChange,
};

//! Integration tests for tournament configuration defaults.

use chrono::TimeDelta;
use elimination_bracket::{ActivityConfig, SamplingPreference, TeamRules, TournamentConfig};

#[test]
fn empty_config_uses_defaults() {
    let config: TournamentConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, TournamentConfig::default());
    assert!(!config.team_rules.is_active());
    assert_eq!(config.seed, None);
}

#[test]
fn partial_config_fills_the_rest() {
    let config: TournamentConfig = serde_json::from_str(
        r#"{"team_rules":{"additions_per_round":1,"sampling_preference":"more_evolved"},"activity":{"warn_after_secs":30},"seed":9}"#,
    )
    .unwrap();
    assert_eq!(config.seed, Some(9));
    assert_eq!(config.team_rules.starting_team_size, 3);
    assert_eq!(config.team_rules.sampling_preference, SamplingPreference::MoreEvolved);
    assert!(config.team_rules.is_active());
    assert_eq!(config.activity.warn_after(false), TimeDelta::seconds(30));
    assert_eq!(config.activity.disqualify_after(), TimeDelta::seconds(120));
}

#[test]
fn activity_windows() {
    let activity = ActivityConfig::default();
    assert_eq!(activity.warn_after(true), TimeDelta::seconds(240));
    assert_eq!(activity.warn_after(false), TimeDelta::seconds(180));
    assert_eq!(activity.verify_timeout(), TimeDelta::seconds(60));
}

#[test]
fn team_size_bounds_are_sane() {
    let rules = TeamRules {
        min_team_size: 0,
        max_team_size: 0,
        ..TeamRules::default()
    };
    assert_eq!(rules.min_size(), 1);
    assert_eq!(rules.max_size(), 1);
    assert!(TeamRules {
        evolutions_per_round: -1,
        ..TeamRules::default()
    }
    .is_active());
}

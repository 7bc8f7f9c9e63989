//! Contract with the rules/data provider: which elements are legal, how they transform,
//! and which team compositions a participant may field after a team change.

mod catalog;
mod criteria;

pub use catalog::{ElementCatalog, ElementRecord};
pub use criteria::{StandardCriteria, TagCriteria, VariantCriteria};

use crate::models::{ElementId, PossibleTeams, Team};
use serde::{Deserialize, Serialize};

/// Constraints of one team change, as handed to [`RulesProvider::compute_possible_teams`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TeamConstraints {
    pub additions: u32,
    pub drops: u32,
    pub evolutions: i32,
    pub required_addition: bool,
    pub required_drop: bool,
    pub required_evolution: bool,
    pub min_team_size: usize,
    pub max_team_size: usize,
}

/// Catalog of legal elements and the combinatorics over them. Implementations must be
/// pure: the same inputs always give the same answers and nothing is mutated.
pub trait RulesProvider: Send + Sync {
    fn is_legal_element(&self, id: &str) -> bool;

    /// Whether `from` may transform into `to` in one step.
    fn is_legal_transformation_step(&self, from: &str, to: &str) -> bool;

    /// Elements a participant may be handed as part of a starting team.
    fn starter_elements(&self) -> Vec<ElementId>;

    /// One step back towards the base stage.
    fn previous_stage(&self, id: &str) -> Option<ElementId>;

    /// One step forward towards a final stage.
    fn next_stages(&self, id: &str) -> Vec<ElementId>;

    /// Teams reachable from `prior` by one change under `constraints`, picking additions
    /// from `offered`. Returns a new set; `prior` is left untouched.
    fn compute_possible_teams(
        &self,
        prior: &PossibleTeams,
        offered: &[ElementId],
        constraints: &TeamConstraints,
    ) -> PossibleTeams;

    /// Whether an observed team is one of the possible ones.
    fn is_possible_team(&self, observed: &Team, possible: &PossibleTeams) -> bool {
        possible.contains(observed)
    }
}

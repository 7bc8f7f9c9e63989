//! Teams, the set of teams a participant may currently field, and per-round change records.

use crate::models::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier of one selectable element (a species, in the usual ruleset).
pub type ElementId = String;

/// A team composition. Elements are kept sorted and unique, so two teams with the same
/// members compare equal regardless of the order they were reported in.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "Vec<ElementId>")]
pub struct Team(Vec<ElementId>);

impl Team {
    pub fn new<I, S>(elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ElementId>,
    {
        let mut elements: Vec<ElementId> = elements.into_iter().map(Into::into).collect();
        elements.sort();
        elements.dedup();
        Self(elements)
    }

    pub fn elements(&self) -> &[ElementId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, element: &str) -> bool {
        self.0.binary_search_by(|e| e.as_str().cmp(element)).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementId> {
        self.0.iter()
    }

    /// Copy of this team with `added` included.
    pub fn with<'a>(&self, added: impl IntoIterator<Item = &'a ElementId>) -> Self {
        Team::new(self.0.iter().cloned().chain(added.into_iter().cloned()))
    }

    /// Copy of this team with `removed` left out.
    pub fn without(&self, removed: &[ElementId]) -> Self {
        Team::new(self.0.iter().filter(|e| !removed.contains(e)).cloned())
    }
}

impl From<Vec<ElementId>> for Team {
    fn from(elements: Vec<ElementId>) -> Self {
        Team::new(elements)
    }
}

impl FromIterator<ElementId> for Team {
    fn from_iter<I: IntoIterator<Item = ElementId>>(iter: I) -> Self {
        Team::new(iter)
    }
}

/// Every full team composition consistent with the changes a participant has been
/// required to make so far. Replaced wholesale on each team change, never edited in place.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PossibleTeams(BTreeSet<Team>);

impl PossibleTeams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(team: Team) -> Self {
        Self(BTreeSet::from([team]))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, team: &Team) -> bool {
        self.0.contains(team)
    }

    pub fn insert(&mut self, team: Team) -> bool {
        self.0.insert(team)
    }

    /// Teams in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Team> {
        self.0.iter()
    }

    /// The only possible team, when exactly one remains.
    pub fn only(&self) -> Option<&Team> {
        if self.0.len() == 1 {
            self.0.iter().next()
        } else {
            None
        }
    }
}

impl FromIterator<Team> for PossibleTeams {
    fn from_iter<I: IntoIterator<Item = Team>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Team change imposed on a round winner. Created once, never edited afterwards.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TeamChangeRecord {
    /// The participant who must apply the change.
    pub participant: ParticipantId,
    /// Round that was won (before the round counter moved on).
    pub round: u32,
    /// Defeated participant; None for a bye.
    pub opponent: Option<ParticipantId>,
    pub additions: u32,
    pub drops: u32,
    /// Positive: transform forward that many elements. Negative: transform back.
    pub evolutions: i32,
    /// Elements the winner may pick additions from.
    pub choices: Vec<ElementId>,
}

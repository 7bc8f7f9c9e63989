//! CSV-backed element catalog implementing [`RulesProvider`].
//!
//! One row per element: `id,evolves_from,tags,legal`. `evolves_from` is empty for base
//! stages, `tags` is a `|`-separated list, `legal` defaults to true when the column is
//! missing.

use crate::models::{ElementId, PossibleTeams, Team, TournamentError};
use crate::rules::criteria::VariantCriteria;
use crate::rules::{RulesProvider, TeamConstraints};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::Arc;

const BUNDLED_CATALOG: &str = include_str!("../../data/elements.csv");

/// One catalog row.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct ElementRecord {
    pub id: ElementId,
    #[serde(default)]
    pub evolves_from: Option<ElementId>,
    #[serde(default)]
    pub tags: String,
    #[serde(default = "legal_by_default")]
    pub legal: bool,
}

fn legal_by_default() -> bool {
    true
}

impl ElementRecord {
    pub fn new(id: impl Into<ElementId>, evolves_from: Option<&str>) -> Self {
        Self {
            id: id.into(),
            evolves_from: evolves_from.map(str::to_string),
            tags: String::new(),
            legal: true,
        }
    }

    pub fn tagged(mut self, tags: &[&str]) -> Self {
        self.tags = tags.join("|");
        self
    }

    pub fn illegal(mut self) -> Self {
        self.legal = false;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.split('|').any(|t| t.trim().eq_ignore_ascii_case(tag))
    }
}

pub struct ElementCatalog {
    elements: BTreeMap<ElementId, ElementRecord>,
    next: BTreeMap<ElementId, Vec<ElementId>>,
    criteria: Arc<dyn VariantCriteria>,
}

impl ElementCatalog {
    /// Build from rows. Fails on duplicate ids or a transformation from an unknown element.
    pub fn from_records<I>(records: I, criteria: Arc<dyn VariantCriteria>) -> Result<Self, TournamentError>
    where
        I: IntoIterator<Item = ElementRecord>,
    {
        let mut elements = BTreeMap::new();
        for mut record in records {
            record.id = record.id.trim().to_string();
            record.evolves_from = record
                .evolves_from
                .map(|from| from.trim().to_string())
                .filter(|from| !from.is_empty());
            if record.id.is_empty() {
                return Err(TournamentError::Catalog("element with empty id".to_string()));
            }
            if elements.contains_key(&record.id) {
                return Err(TournamentError::Catalog(format!("duplicate element {}", record.id)));
            }
            elements.insert(record.id.clone(), record);
        }

        let mut next: BTreeMap<ElementId, Vec<ElementId>> = BTreeMap::new();
        for record in elements.values() {
            if let Some(from) = &record.evolves_from {
                if !elements.contains_key(from) {
                    return Err(TournamentError::Catalog(format!(
                        "{} transforms from unknown element {}",
                        record.id, from
                    )));
                }
                next.entry(from.clone()).or_default().push(record.id.clone());
            }
        }

        Ok(Self {
            elements,
            next,
            criteria,
        })
    }

    pub fn from_csv_reader<R: io::Read>(reader: R, criteria: Arc<dyn VariantCriteria>) -> Result<Self, TournamentError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let records = rdr
            .deserialize()
            .collect::<Result<Vec<ElementRecord>, _>>()
            .map_err(|e| TournamentError::Catalog(e.to_string()))?;
        Self::from_records(records, criteria)
    }

    pub fn from_path(path: impl AsRef<Path>, criteria: Arc<dyn VariantCriteria>) -> Result<Self, TournamentError> {
        let file = std::fs::File::open(path.as_ref())
            .map_err(|e| TournamentError::Catalog(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_csv_reader(file, criteria)
    }

    /// The catalog shipped with the crate.
    pub fn bundled(criteria: Arc<dyn VariantCriteria>) -> Result<Self, TournamentError> {
        Self::from_csv_reader(BUNDLED_CATALOG.as_bytes(), criteria)
    }

    pub fn get(&self, id: &str) -> Option<&ElementRecord> {
        self.elements.get(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn with_additions(&self, team: &Team, offered: &[ElementId], c: &TeamConstraints, max: usize) -> Vec<Team> {
        let candidates: Vec<ElementId> = offered.iter().filter(|e| !team.contains(e)).cloned().collect();
        let room = max.saturating_sub(team.len());
        let most = (c.additions as usize).min(room).min(candidates.len());
        counts(most, c.required_addition)
            .flat_map(|k| combinations(&candidates, k))
            .map(|picked| team.with(&picked))
            .collect()
    }

    fn with_evolutions(&self, team: &Team, c: &TeamConstraints) -> Vec<Team> {
        let steps = c.evolutions.unsigned_abs() as usize;
        if steps == 0 {
            return vec![team.clone()];
        }
        let forward = c.evolutions > 0;
        let options: Vec<(ElementId, Vec<ElementId>)> = team
            .iter()
            .filter_map(|from| {
                let targets: Vec<ElementId> = if forward {
                    self.next_stages(from)
                        .into_iter()
                        .filter(|to| self.is_legal_transformation_step(from, to))
                        .collect()
                } else {
                    self.previous_stage(from)
                        .into_iter()
                        .filter(|to| self.is_legal_transformation_step(to, from))
                        .collect()
                };
                (!targets.is_empty()).then(|| (from.clone(), targets))
            })
            .collect();

        let most = steps.min(options.len());
        let mut out = Vec::new();
        for k in counts(most, c.required_evolution) {
            for chosen in combinations(&options, k) {
                let mut partial = vec![team.clone()];
                for (from, targets) in &chosen {
                    partial = partial
                        .iter()
                        .flat_map(|t| targets.iter().map(move |to| replaced(t, from, to)))
                        .collect();
                }
                // two elements landing on the same target would shrink the team
                out.extend(partial.into_iter().filter(|t| t.len() == team.len()));
            }
        }
        out
    }
}

impl RulesProvider for ElementCatalog {
    fn is_legal_element(&self, id: &str) -> bool {
        self.elements.get(id).is_some_and(|e| e.legal)
    }

    fn is_legal_transformation_step(&self, from: &str, to: &str) -> bool {
        match (self.elements.get(from), self.elements.get(to)) {
            (Some(f), Some(t)) => {
                f.legal
                    && t.legal
                    && t.evolves_from.as_deref() == Some(from)
                    && self.criteria.qualifies_as_evolution(f, t)
            }
            _ => false,
        }
    }

    fn starter_elements(&self) -> Vec<ElementId> {
        self.elements
            .values()
            .filter(|e| e.legal && self.criteria.qualifies_as_starter(e))
            .map(|e| e.id.clone())
            .collect()
    }

    fn previous_stage(&self, id: &str) -> Option<ElementId> {
        self.elements.get(id).and_then(|e| e.evolves_from.clone())
    }

    fn next_stages(&self, id: &str) -> Vec<ElementId> {
        self.next.get(id).cloned().unwrap_or_default()
    }

    fn compute_possible_teams(
        &self,
        prior: &PossibleTeams,
        offered: &[ElementId],
        constraints: &TeamConstraints,
    ) -> PossibleTeams {
        let min = constraints.min_team_size.max(1);
        let max = constraints.max_team_size.max(min);
        let mut offered: Vec<ElementId> = offered.iter().filter(|e| self.is_legal_element(e)).cloned().collect();
        offered.sort();
        offered.dedup();

        let mut out = PossibleTeams::new();
        for team in prior.iter() {
            for added in self.with_additions(team, &offered, constraints, max) {
                for dropped in with_drops(&added, constraints, min) {
                    for evolved in self.with_evolutions(&dropped, constraints) {
                        out.insert(evolved);
                    }
                }
            }
        }
        out
    }
}

fn with_drops(team: &Team, c: &TeamConstraints, min: usize) -> Vec<Team> {
    let removable = team.len().saturating_sub(min);
    let most = (c.drops as usize).min(removable);
    counts(most, c.required_drop)
        .flat_map(|k| combinations(team.elements(), k))
        .map(|picked| team.without(&picked))
        .collect()
}

fn replaced(team: &Team, from: &str, to: &ElementId) -> Team {
    team.iter()
        .map(|e| if e == from { to.clone() } else { e.clone() })
        .collect()
}

/// Change counts to enumerate: exactly `most` when the change is required, else `0..=most`.
fn counts(most: usize, required: bool) -> RangeInclusive<usize> {
    if required {
        most..=most
    } else {
        0..=most
    }
}

/// All `k`-element subsets of `items`, in lexicographic index order.
fn combinations<T: Clone>(items: &[T], k: usize) -> Vec<Vec<T>> {
    if k > items.len() {
        return Vec::new();
    }
    let n = items.len();
    let mut out = Vec::new();
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.iter().map(|&i| items[i].clone()).collect());
        let mut i = k;
        loop {
            if i == 0 {
                return out;
            }
            i -= 1;
            if idx[i] != i + n - k {
                break;
            }
        }
        idx[i] += 1;
        for j in i + 1..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
}

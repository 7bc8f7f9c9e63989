//! Integration tests for the CSV element catalog.

mod common;

use common::line_records;
use elimination_bracket::{
    ElementCatalog, ElementRecord, PossibleTeams, RulesProvider, StandardCriteria, TagCriteria, Team,
    TournamentError,
};
use std::sync::Arc;

#[test]
fn bundled_catalog_loads() {
    let catalog = ElementCatalog::bundled(Arc::new(StandardCriteria)).unwrap();
    assert_eq!(catalog.len(), 33);
    assert!(catalog.is_legal_element("pikachu"));
    assert!(!catalog.is_legal_element("mewtwo"));
    assert!(!catalog.is_legal_element("missingno"));

    let starters = catalog.starter_elements();
    assert_eq!(starters.len(), 12);
    assert!(starters.iter().all(|s| catalog.previous_stage(s).is_none()));
    assert!(!starters.contains(&"mewtwo".to_string()));

    assert_eq!(catalog.previous_stage("charizard").as_deref(), Some("charmeleon"));
    assert_eq!(catalog.next_stages("eevee").len(), 3);
    assert_eq!(catalog.get("gyarados").unwrap().evolves_from.as_deref(), Some("magikarp"));
}

#[test]
fn transformation_steps_are_single_and_forward() {
    let catalog = ElementCatalog::bundled(Arc::new(StandardCriteria)).unwrap();
    assert!(catalog.is_legal_transformation_step("bulbasaur", "ivysaur"));
    assert!(!catalog.is_legal_transformation_step("bulbasaur", "venusaur"));
    assert!(!catalog.is_legal_transformation_step("ivysaur", "bulbasaur"));
    assert!(!catalog.is_legal_transformation_step("bulbasaur", "missingno"));
}

#[test]
fn tag_variant_narrows_starters_and_steps() {
    let catalog = ElementCatalog::bundled(Arc::new(TagCriteria::new("water"))).unwrap();
    assert_eq!(catalog.starter_elements(), vec!["lapras", "magikarp", "poliwag", "squirtle"]);
    assert!(catalog.is_legal_transformation_step("eevee", "vaporeon"));
    assert!(!catalog.is_legal_transformation_step("eevee", "jolteon"));
}

#[test]
fn csv_rows_are_validated() {
    let unknown = "id,evolves_from,tags,legal\nivysaur,bulbasaur,grass,true\n";
    assert!(matches!(
        ElementCatalog::from_csv_reader(unknown.as_bytes(), Arc::new(StandardCriteria)),
        Err(TournamentError::Catalog(_))
    ));

    let duplicate = "id,evolves_from,tags,legal\nfoo,,,true\nfoo,,,true\n";
    assert!(matches!(
        ElementCatalog::from_csv_reader(duplicate.as_bytes(), Arc::new(StandardCriteria)),
        Err(TournamentError::Catalog(_))
    ));

    assert!(matches!(
        ElementCatalog::from_path("/nonexistent/elements.csv", Arc::new(StandardCriteria)),
        Err(TournamentError::Catalog(_))
    ));
}

#[test]
fn legal_column_is_optional() {
    let csv = "id,evolves_from,tags\n foo , , a|b\nbar,foo,b\n";
    let catalog = ElementCatalog::from_csv_reader(csv.as_bytes(), Arc::new(StandardCriteria)).unwrap();
    assert!(catalog.is_legal_element("foo"));
    assert!(catalog.is_legal_transformation_step("foo", "bar"));
    assert!(catalog.get("foo").unwrap().has_tag("A"));
    assert_eq!(catalog.starter_elements(), vec!["foo"]);
}

#[test]
fn illegal_elements_block_transformations() {
    let mut records = line_records();
    records.push(ElementRecord::new("x2", Some("x1")));
    let catalog = ElementCatalog::from_records(records, Arc::new(StandardCriteria)).unwrap();
    assert!(!catalog.is_legal_transformation_step("x1", "x2"));
    assert!(!catalog.starter_elements().contains(&"x1".to_string()));
}

#[test]
fn observed_team_must_be_a_possible_one() {
    let catalog = ElementCatalog::from_records(line_records(), Arc::new(StandardCriteria)).unwrap();
    let possible: PossibleTeams = [Team::new(["a1", "b1"]), Team::new(["a2", "b1"])].into_iter().collect();
    assert!(catalog.is_possible_team(&Team::new(["b1", "a2"]), &possible));
    assert!(!catalog.is_possible_team(&Team::new(["a3", "b1"]), &possible));
}

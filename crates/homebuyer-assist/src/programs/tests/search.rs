use std::sync::Arc;

use super::common::*;
use crate::programs::catalog::Visibility;
use crate::programs::domain::{ProgramId, ProgramStatus};
use crate::programs::eligibility::{DisqualificationReason, ProgramEligibility};
use crate::programs::search::SearchIndex;
use crate::programs::store::MemoryStore;
use crate::programs::ProgramCatalog;

fn populated() -> Arc<ProgramCatalog<MemoryStore>> {
    let (catalog, _, _) = catalog();
    catalog
        .create(draft("montgomery-hoc", "Montgomery HOC", montgomery_eligibility()))
        .expect("created");
    catalog
        .create(draft(
            "statewide",
            "Statewide",
            ProgramEligibility {
                eligible_counties: counties(&["any"]),
                eligible_cities: counties(&["any"]),
                ..ProgramEligibility::default()
            },
        ))
        .expect("created");
    catalog
        .create(draft(
            "baltimore",
            "Buying Into Baltimore",
            ProgramEligibility {
                eligible_counties: counties(&["baltimore-city"]),
                eligible_cities: counties(&["baltimore"]),
                ..ProgramEligibility::default()
            },
        ))
        .expect("created");
    catalog
        .create(draft(
            "gaithersburg",
            "Gaithersburg HOP",
            ProgramEligibility {
                eligible_counties: counties(&["montgomery"]),
                eligible_cities: counties(&["gaithersburg"]),
                ..ProgramEligibility::default()
            },
        ))
        .expect("created");
    catalog
        .set_status(&ProgramId::from("gaithersburg"), ProgramStatus::Outdated, None)
        .expect("retired");
    catalog
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn counties_come_from_active_programs_plus_wildcard() {
    let catalog = populated();

    let counties: Vec<String> = SearchIndex::new(&catalog)
        .counties()
        .expect("counties")
        .into_iter()
        .collect();

    assert_eq!(counties, strings(&["any", "baltimore-city", "montgomery"]));
}

#[test]
fn cities_include_wildcard_county_programs() {
    let catalog = populated();
    let index = SearchIndex::new(&catalog);

    let baltimore: Vec<String> = index
        .cities_for_county("Baltimore-City")
        .expect("cities")
        .into_iter()
        .collect();
    assert_eq!(baltimore, strings(&["any", "baltimore"]));

    let montgomery: Vec<String> = index
        .cities_for_county("montgomery")
        .expect("cities")
        .into_iter()
        .collect();
    assert_eq!(montgomery, strings(&["any"]), "outdated programs are ignored");
}

#[test]
fn search_returns_only_qualifying_active_programs() {
    let catalog = populated();
    let profile = montgomery_profile();

    let ids: Vec<String> = SearchIndex::new(&catalog)
        .search(&profile, Visibility::Active)
        .expect("search")
        .into_iter()
        .map(|record| record.id.0)
        .collect();

    assert_eq!(ids, strings(&["montgomery-hoc", "statewide"]));
}

#[test]
fn search_can_opt_into_broader_visibility() {
    let catalog = populated();
    let mut profile = montgomery_profile();
    profile.city = "gaithersburg".to_string();

    let ids: Vec<String> = SearchIndex::new(&catalog)
        .search(&profile, Visibility::All)
        .expect("search")
        .into_iter()
        .map(|record| record.id.0)
        .collect();

    assert_eq!(ids, strings(&["montgomery-hoc", "statewide", "gaithersburg"]));
}

#[test]
fn search_never_fails_for_a_well_formed_profile() {
    let (catalog, _, _) = catalog();
    let results = SearchIndex::new(&catalog)
        .search(&montgomery_profile(), Visibility::Active)
        .expect("search");
    assert!(results.is_empty());
}

#[test]
fn explain_reports_every_visible_program() {
    let catalog = populated();
    let mut profile = montgomery_profile();
    profile.household_income = 500_000.0;

    let verdicts = SearchIndex::new(&catalog)
        .explain(&profile, Visibility::Active)
        .expect("explain");

    assert_eq!(verdicts.len(), 3);
    let hoc = verdicts
        .iter()
        .find(|verdict| verdict.program_id.as_str() == "montgomery-hoc")
        .expect("hoc verdict");
    assert!(!hoc.result.qualifies);
    assert!(matches!(
        hoc.result.primary_reason(),
        Some(DisqualificationReason::IncomeAboveLimit { .. })
    ));

    let baltimore = verdicts
        .iter()
        .find(|verdict| verdict.program_id.as_str() == "baltimore")
        .expect("baltimore verdict");
    assert_eq!(
        baltimore.result.primary_reason(),
        Some(&DisqualificationReason::CountyNotEligible {
            county: "montgomery".to_string()
        })
    );
}

//! Read-side queries composed from catalog listings and the eligibility evaluator.

use std::collections::BTreeSet;

use serde::Serialize;

use super::catalog::{CatalogError, ProgramCatalog, Visibility};
use super::domain::{ProgramId, ProgramRecord};
use super::eligibility::{evaluate, ApplicantProfile, QualificationResult, ANY_LOCATION};
use super::store::CatalogStore;

/// One row of an eligibility explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramVerdict {
    pub program_id: ProgramId,
    pub name: String,
    #[serde(flatten)]
    pub result: QualificationResult,
}

/// Query surface used by the form and the admin API.
pub struct SearchIndex<'a, S> {
    catalog: &'a ProgramCatalog<S>,
}

impl<'a, S> SearchIndex<'a, S>
where
    S: CatalogStore + 'static,
{
    pub fn new(catalog: &'a ProgramCatalog<S>) -> Self {
        Self { catalog }
    }

    /// County codes referenced by active programs, always including the wildcard.
    pub fn counties(&self) -> Result<BTreeSet<String>, CatalogError> {
        let records = self.catalog.list(Visibility::Active)?;
        let mut counties: BTreeSet<String> = records
            .iter()
            .flat_map(|record| record.eligibility.named_counties())
            .map(str::to_string)
            .collect();
        counties.insert(ANY_LOCATION.to_string());
        Ok(counties)
    }

    /// City codes from active programs open to `county`, always including the wildcard.
    pub fn cities_for_county(&self, county: &str) -> Result<BTreeSet<String>, CatalogError> {
        let county = county.trim().to_ascii_lowercase();
        let records = self.catalog.list(Visibility::Active)?;
        let mut cities: BTreeSet<String> = records
            .iter()
            .filter(|record| record.eligibility.admits_county(&county))
            .flat_map(|record| record.eligibility.named_cities())
            .map(str::to_string)
            .collect();
        cities.insert(ANY_LOCATION.to_string());
        Ok(cities)
    }

    /// Programs `profile` qualifies for, in listing order.
    pub fn search(
        &self,
        profile: &ApplicantProfile,
        visibility: Visibility,
    ) -> Result<Vec<ProgramRecord>, CatalogError> {
        Ok(self
            .catalog
            .list(visibility)?
            .into_iter()
            .filter(|record| evaluate(profile, &record.eligibility, record.id.as_str()).qualifies)
            .collect())
    }

    /// Every visible program with its verdict, qualifying or not.
    pub fn explain(
        &self,
        profile: &ApplicantProfile,
        visibility: Visibility,
    ) -> Result<Vec<ProgramVerdict>, CatalogError> {
        Ok(self
            .catalog
            .list(visibility)?
            .into_iter()
            .map(|record| ProgramVerdict {
                result: evaluate(profile, &record.eligibility, record.id.as_str()),
                program_id: record.id,
                name: record.name,
            })
            .collect())
    }
}

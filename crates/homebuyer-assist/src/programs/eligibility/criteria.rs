use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Wildcard used by county and city lists.
pub const ANY_LOCATION: &str = "any";

/// Largest household tier tracked by income tables; bigger households use this tier.
pub const MAX_HOUSEHOLD_TIER: u8 = 5;

/// Qualification rules attached to one program.
///
/// Every optional constraint is an explicit field: `None` means the program does not
/// enforce it, and boolean requirements default to `false`. Unknown keys are rejected so a
/// misspelled constraint can never be dropped silently; the scraper's short names
/// (`firstTimeBuyer`, `creditScore`, `counties`, `cities`) are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProgramEligibility {
    #[serde(default, alias = "firstTimeBuyer")]
    pub first_time_buyer_required: bool,
    /// 0 means no minimum.
    #[serde(default, alias = "creditScore")]
    pub min_credit_score: u16,
    #[serde(default)]
    pub must_live_in_county: bool,
    #[serde(default)]
    pub must_work_in_county: bool,
    #[serde(default)]
    pub must_be_county_employee: bool,
    #[serde(default)]
    pub disallow_current_ownership: bool,
    #[serde(default)]
    pub student_debt_required: bool,
    #[serde(default, alias = "counties", skip_serializing_if = "Option::is_none")]
    pub eligible_counties: Option<BTreeSet<String>>,
    #[serde(default, alias = "cities", skip_serializing_if = "Option::is_none")]
    pub eligible_cities: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_limits: Option<IncomeLimits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_municipality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_stay_years: Option<u8>,
}

impl ProgramEligibility {
    /// Counties named by the program, excluding the wildcard.
    pub fn named_counties(&self) -> impl Iterator<Item = &str> {
        named(self.eligible_counties.as_ref())
    }

    pub fn named_cities(&self) -> impl Iterator<Item = &str> {
        named(self.eligible_cities.as_ref())
    }

    /// True when the county list is absent, contains the wildcard, or names `county`.
    pub fn admits_county(&self, county: &str) -> bool {
        admits(self.eligible_counties.as_ref(), county)
    }

    pub fn admits_city(&self, city: &str) -> bool {
        admits(self.eligible_cities.as_ref(), city)
    }

    /// Trim and lowercase county and city codes to match applicant profile codes.
    pub fn normalized(mut self) -> Self {
        self.eligible_counties = self.eligible_counties.map(location_set);
        self.eligible_cities = self.eligible_cities.map(location_set);
        self
    }
}

fn location_set(values: BTreeSet<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}

fn named(set: Option<&BTreeSet<String>>) -> impl Iterator<Item = &str> {
    set.into_iter()
        .flatten()
        .map(String::as_str)
        .filter(|value| *value != ANY_LOCATION)
}

fn admits(set: Option<&BTreeSet<String>>, value: &str) -> bool {
    match set {
        None => true,
        Some(values) => values.contains(ANY_LOCATION) || values.contains(value),
    }
}

/// Annual income ceilings keyed by household-size tier (1..=5, tier 5 meaning "5 or more").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncomeLimits(pub BTreeMap<u8, u64>);

impl IncomeLimits {
    pub fn from_tiers<I>(tiers: I) -> Self
    where
        I: IntoIterator<Item = (u8, u64)>,
    {
        Self(tiers.into_iter().collect())
    }

    /// Ceiling for a household, clamping sizes above the largest tier.
    pub fn ceiling_for(&self, household_size: u32) -> Option<u64> {
        self.0.get(&clamp_household(household_size)).copied()
    }

    /// First tier in 1..=5 that has no ceiling, if any.
    pub fn first_missing_tier(&self) -> Option<u8> {
        (1..=MAX_HOUSEHOLD_TIER).find(|tier| !self.0.contains_key(tier))
    }
}

pub(crate) fn clamp_household(household_size: u32) -> u8 {
    household_size.clamp(1, u32::from(MAX_HOUSEHOLD_TIER)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> IncomeLimits {
        IncomeLimits::from_tiers([
            (1, 109_500),
            (2, 125_000),
            (3, 140_500),
            (4, 156_000),
            (5, 168_500),
        ])
    }

    #[test]
    fn large_households_use_the_top_tier() {
        let limits = limits();
        for size in [6, 7, 100] {
            assert_eq!(limits.ceiling_for(size), Some(168_500));
        }
        assert_eq!(limits.ceiling_for(2), Some(125_000));
    }

    #[test]
    fn income_table_reads_string_keys() {
        let parsed: IncomeLimits =
            serde_json::from_str(r#"{"1": 71400, "2": 81600}"#).expect("parses");
        assert_eq!(parsed.ceiling_for(2), Some(81_600));
        assert_eq!(parsed.first_missing_tier(), Some(3));
        assert_eq!(limits().first_missing_tier(), None);
    }

    #[test]
    fn wildcard_and_absent_lists_admit_everything() {
        let mut eligibility = ProgramEligibility::default();
        assert!(eligibility.admits_county("howard"));

        eligibility.eligible_counties = Some(BTreeSet::from(["any".to_string()]));
        assert!(eligibility.admits_county("howard"));
        assert_eq!(eligibility.named_counties().count(), 0);

        eligibility.eligible_counties = Some(BTreeSet::from(["frederick".to_string()]));
        assert!(!eligibility.admits_county("howard"));
        assert!(eligibility.admits_county("frederick"));
    }

    #[test]
    fn location_codes_are_lowercased() {
        let eligibility = ProgramEligibility {
            eligible_counties: Some(BTreeSet::from([" Montgomery ".to_string()])),
            eligible_cities: Some(BTreeSet::from(["Gaithersburg".to_string(), "ANY".to_string()])),
            ..ProgramEligibility::default()
        }
        .normalized();

        assert!(eligibility.admits_county("montgomery"));
        assert_eq!(eligibility.named_cities().collect::<Vec<_>>(), vec!["gaithersburg"]);
    }

    #[test]
    fn scraper_key_names_are_accepted() {
        let parsed: ProgramEligibility = serde_json::from_str(
            r#"{"firstTimeBuyer": true, "creditScore": 640, "counties": ["montgomery"]}"#,
        )
        .expect("aliases parse");
        assert!(parsed.first_time_buyer_required);
        assert_eq!(parsed.min_credit_score, 640);
        assert!(!parsed.admits_county("howard"));
    }

    #[test]
    fn unknown_eligibility_keys_are_rejected() {
        let parsed = serde_json::from_str::<ProgramEligibility>(
            r#"{"firstTimeBuyerRequired": true, "maxPurchasePrice": 450000}"#,
        );
        assert!(parsed.is_err());
    }
}

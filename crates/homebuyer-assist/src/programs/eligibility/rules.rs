use super::criteria::{clamp_household, ProgramEligibility, ANY_LOCATION};
use super::overrides::{minimum_stay, overrides_for};
use super::profile::ApplicantProfile;
use super::reasons::DisqualificationReason;

pub(crate) struct RuleInput<'a> {
    pub profile: &'a ApplicantProfile,
    pub eligibility: &'a ProgramEligibility,
    pub program_id: &'a str,
}

type Rule = fn(&RuleInput<'_>) -> Option<DisqualificationReason>;

/// Canonical order. The first failing rule is the one reported.
pub(crate) const RULES: [Rule; 10] = [
    first_time_buyer,
    credit_score,
    location,
    residency,
    county_employee,
    current_ownership,
    student_debt,
    income,
    municipality,
    program_overrides,
];

pub(crate) fn first_failure(input: &RuleInput<'_>) -> Option<DisqualificationReason> {
    RULES.iter().find_map(|rule| rule(input))
}

fn first_time_buyer(input: &RuleInput<'_>) -> Option<DisqualificationReason> {
    (input.eligibility.first_time_buyer_required && !input.profile.first_time_buyer)
        .then_some(DisqualificationReason::NotFirstTimeBuyer)
}

fn credit_score(input: &RuleInput<'_>) -> Option<DisqualificationReason> {
    let required = input.eligibility.min_credit_score;
    if required == 0 {
        return None;
    }

    let floor = input.profile.credit_score.floor();
    (floor < required).then_some(DisqualificationReason::CreditScoreTooLow { required, floor })
}

fn location(input: &RuleInput<'_>) -> Option<DisqualificationReason> {
    let ApplicantProfile { county, city, .. } = input.profile;

    if county != ANY_LOCATION && !input.eligibility.admits_county(county) {
        return Some(DisqualificationReason::CountyNotEligible {
            county: county.clone(),
        });
    }

    if city != ANY_LOCATION && !input.eligibility.admits_city(city) {
        return Some(DisqualificationReason::CityNotEligible { city: city.clone() });
    }

    None
}

fn residency(input: &RuleInput<'_>) -> Option<DisqualificationReason> {
    if input.eligibility.must_live_in_county && !input.profile.living_in_county {
        return Some(DisqualificationReason::MustLiveInCounty);
    }
    if input.eligibility.must_work_in_county && !input.profile.working_in_county {
        return Some(DisqualificationReason::MustWorkInCounty);
    }
    None
}

fn county_employee(input: &RuleInput<'_>) -> Option<DisqualificationReason> {
    (input.eligibility.must_be_county_employee && !input.profile.county_employee)
        .then_some(DisqualificationReason::MustBeCountyEmployee)
}

fn current_ownership(input: &RuleInput<'_>) -> Option<DisqualificationReason> {
    (input.eligibility.disallow_current_ownership && input.profile.currently_own_property)
        .then_some(DisqualificationReason::CurrentlyOwnsProperty)
}

fn student_debt(input: &RuleInput<'_>) -> Option<DisqualificationReason> {
    (input.eligibility.student_debt_required && !input.profile.student_debt)
        .then_some(DisqualificationReason::StudentDebtRequired)
}

/// Missing tables or tiers never exclude anyone.
fn income(input: &RuleInput<'_>) -> Option<DisqualificationReason> {
    let limits = input.eligibility.income_limits.as_ref()?;
    let household_size = input.profile.household_size;
    let Some(limit) = limits.ceiling_for(household_size) else {
        tracing::debug!(
            program_id = input.program_id,
            household_size,
            "no income limit for household tier; treating as unlimited"
        );
        return None;
    };

    let income = input.profile.household_income;
    (income > limit as f64).then(|| DisqualificationReason::IncomeAboveLimit {
        limit,
        income,
        household_tier: clamp_household(household_size),
    })
}

fn municipality(input: &RuleInput<'_>) -> Option<DisqualificationReason> {
    let required = input.eligibility.required_municipality.as_deref()?;
    (!input.profile.municipality.eq_ignore_ascii_case(required)).then(|| {
        DisqualificationReason::MunicipalityRequired {
            municipality: required.to_string(),
        }
    })
}

fn program_overrides(input: &RuleInput<'_>) -> Option<DisqualificationReason> {
    if let Some(years) = input.eligibility.minimum_stay_years {
        if let Some(reason) = minimum_stay(input.profile, years) {
            return Some(reason);
        }
    }

    overrides_for(input.program_id).find_map(|rule| rule.check(input.profile))
}

use serde::{Deserialize, Serialize};

/// Why a profile failed one rule. Variants are listed in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum DisqualificationReason {
    NotFirstTimeBuyer,
    CreditScoreTooLow {
        required: u16,
        floor: u16,
    },
    CountyNotEligible {
        county: String,
    },
    CityNotEligible {
        city: String,
    },
    MustLiveInCounty,
    MustWorkInCounty,
    MustBeCountyEmployee,
    CurrentlyOwnsProperty,
    StudentDebtRequired,
    IncomeAboveLimit {
        limit: u64,
        income: f64,
        household_tier: u8,
    },
    MunicipalityRequired {
        municipality: String,
    },
    MinimumStayRequired {
        years: u8,
    },
}

impl DisqualificationReason {
    pub fn summary(&self) -> String {
        match self {
            DisqualificationReason::NotFirstTimeBuyer => "not a first-time buyer".to_string(),
            DisqualificationReason::CreditScoreTooLow { required, floor } => {
                format!("credit score too low (need {required}, have {floor})")
            }
            DisqualificationReason::CountyNotEligible { county } => {
                format!("program is not offered in county '{county}'")
            }
            DisqualificationReason::CityNotEligible { city } => {
                format!("program is not offered in city '{city}'")
            }
            DisqualificationReason::MustLiveInCounty => "must live in the county".to_string(),
            DisqualificationReason::MustWorkInCounty => "must work in the county".to_string(),
            DisqualificationReason::MustBeCountyEmployee => {
                "must be a county employee".to_string()
            }
            DisqualificationReason::CurrentlyOwnsProperty => {
                "cannot currently own property".to_string()
            }
            DisqualificationReason::StudentDebtRequired => "must have student debt".to_string(),
            DisqualificationReason::IncomeAboveLimit {
                limit,
                income,
                household_tier,
            } => format!(
                "income too high (limit is ${limit} for household tier {household_tier}, have ${income:.0})"
            ),
            DisqualificationReason::MunicipalityRequired { municipality } => {
                format!("must live in {municipality}")
            }
            DisqualificationReason::MinimumStayRequired { years } => {
                format!("must plan to stay {years}+ years")
            }
        }
    }
}

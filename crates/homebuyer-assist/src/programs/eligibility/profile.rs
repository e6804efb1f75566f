use std::fmt;

use serde::{Deserialize, Serialize};

use super::criteria::ANY_LOCATION;

/// Self-reported credit bracket. Each band maps to one representative floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CreditScoreBand {
    #[serde(rename = "below-620")]
    Below620,
    #[serde(rename = "620-639")]
    From620To639,
    #[serde(rename = "640-659")]
    From640To659,
    #[serde(rename = "660-679")]
    From660To679,
    #[serde(rename = "680-699")]
    From680To699,
    #[serde(rename = "700-719")]
    From700To719,
    #[serde(rename = "720-739")]
    From720To739,
    #[serde(rename = "740-plus")]
    From740Plus,
    /// Older three-bucket form values.
    #[serde(rename = "below-640")]
    Below640,
    #[serde(rename = "640-699")]
    From640To699,
    #[serde(rename = "700-plus")]
    From700Plus,
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(untagged)]
    Score(u16),
}

/// Floor granted to applicants who do not know their score.
const UNKNOWN_SCORE_FLOOR: u16 = 640;

/// Range of scores issued by the FICO model.
const SCORE_RANGE: std::ops::RangeInclusive<u16> = 300..=850;

impl CreditScoreBand {
    pub fn parse(raw: &str) -> Option<Self> {
        let band = match raw.trim().to_ascii_lowercase().as_str() {
            "below-620" => Self::Below620,
            "620-639" => Self::From620To639,
            "640-659" => Self::From640To659,
            "660-679" => Self::From660To679,
            "680-699" => Self::From680To699,
            "700-719" => Self::From700To719,
            "720-739" => Self::From720To739,
            "740-plus" => Self::From740Plus,
            "below-640" => Self::Below640,
            "640-699" => Self::From640To699,
            "700-plus" => Self::From700Plus,
            "" | "unknown" => Self::Unknown,
            other => return Self::from_score(other.parse().ok()?),
        };
        Some(band)
    }

    /// A numeric score, if it lies inside the scoring range.
    pub fn from_score(score: u16) -> Option<Self> {
        SCORE_RANGE.contains(&score).then_some(Self::Score(score))
    }

    /// Representative numeric floor compared against a program minimum.
    pub const fn floor(self) -> u16 {
        match self {
            Self::Below620 => 619,
            Self::From620To639 => 620,
            Self::From640To659 => 640,
            Self::From660To679 => 660,
            Self::From680To699 => 680,
            Self::From700To719 => 700,
            Self::From720To739 => 720,
            Self::From740Plus => 740,
            Self::Below640 => 600,
            Self::From640To699 => 640,
            Self::From700Plus => 700,
            Self::Unknown => UNKNOWN_SCORE_FLOOR,
            Self::Score(score) => score,
        }
    }
}

/// How long the applicant expects to keep the home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StayDuration {
    #[serde(rename = "less-than-5")]
    LessThanFive,
    #[serde(rename = "5-10")]
    FiveToTen,
    #[serde(rename = "10-15")]
    TenToFifteen,
    #[serde(rename = "15-plus")]
    FifteenPlus,
    #[serde(rename = "unsure")]
    Unsure,
}

impl StayDuration {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "less-than-5" => Some(Self::LessThanFive),
            "5-10" => Some(Self::FiveToTen),
            "10-15" => Some(Self::TenToFifteen),
            "15-plus" => Some(Self::FifteenPlus),
            "unsure" | "not-sure" => Some(Self::Unsure),
            _ => None,
        }
    }

    /// Unsure applicants get the benefit of the doubt.
    pub const fn satisfies(self, minimum_years: u8) -> bool {
        let lower_bound = match self {
            Self::LessThanFive => 0,
            Self::FiveToTen => 5,
            Self::TenToFifteen => 10,
            Self::FifteenPlus => 15,
            Self::Unsure => return true,
        };
        lower_bound >= minimum_years
    }
}

/// Validated description of one household at decision time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantProfile {
    pub county: String,
    pub city: String,
    pub first_time_buyer: bool,
    pub currently_own_property: bool,
    pub credit_score: CreditScoreBand,
    pub household_income: f64,
    pub household_size: u32,
    pub living_in_county: bool,
    pub working_in_county: bool,
    pub county_employee: bool,
    pub student_debt: bool,
    pub planned_stay: Option<StayDuration>,
    pub municipality: String,
}

impl ApplicantProfile {
    /// A profile with wildcard location and no special circumstances.
    pub fn new(household_income: f64, household_size: u32) -> Result<Self, ProfileError> {
        ProfileSubmission {
            household_income: Some(household_income),
            household_size: Some(i64::from(household_size)),
            ..ProfileSubmission::default()
        }
        .try_into()
    }
}

/// Raw applicant form payload, validated into an [`ApplicantProfile`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSubmission {
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub first_time_buyer: bool,
    #[serde(default)]
    pub currently_own_property: bool,
    #[serde(default, alias = "creditScoreBand")]
    pub credit_score: Option<RawCreditScore>,
    #[serde(default, alias = "income")]
    pub household_income: Option<f64>,
    #[serde(default)]
    pub household_size: Option<i64>,
    #[serde(default, alias = "liveInCounty")]
    pub living_in_county: bool,
    #[serde(default, alias = "workInCounty")]
    pub working_in_county: bool,
    #[serde(default)]
    pub county_employee: bool,
    #[serde(default)]
    pub student_debt: bool,
    #[serde(default, alias = "howLongStay")]
    pub planned_stay: Option<String>,
    #[serde(default)]
    pub municipality: Option<String>,
}

/// Credit score as submitted: either a band code or a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawCreditScore {
    Numeric(u16),
    Label(String),
}

impl TryFrom<ProfileSubmission> for ApplicantProfile {
    type Error = ProfileError;

    fn try_from(submission: ProfileSubmission) -> Result<Self, Self::Error> {
        let household_income = submission
            .household_income
            .ok_or(ProfileError::MissingField("householdIncome"))?;
        if !household_income.is_finite() || household_income < 0.0 {
            return Err(ProfileError::InvalidIncome(household_income));
        }

        let household_size = submission
            .household_size
            .ok_or(ProfileError::MissingField("householdSize"))?;
        let household_size = u32::try_from(household_size)
            .ok()
            .filter(|size| *size >= 1)
            .ok_or(ProfileError::InvalidHouseholdSize(household_size))?;

        let credit_score = match submission.credit_score {
            None => CreditScoreBand::Unknown,
            Some(RawCreditScore::Numeric(score)) => CreditScoreBand::from_score(score)
                .ok_or_else(|| ProfileError::UnrecognizedCreditScore(score.to_string()))?,
            Some(RawCreditScore::Label(label)) => CreditScoreBand::parse(&label)
                .ok_or(ProfileError::UnrecognizedCreditScore(label))?,
        };

        let planned_stay = match submission.planned_stay.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                StayDuration::parse(raw)
                    .ok_or_else(|| ProfileError::UnrecognizedStay(raw.to_string()))?,
            ),
        };

        Ok(Self {
            county: location_code(submission.county),
            city: location_code(submission.city),
            first_time_buyer: submission.first_time_buyer,
            currently_own_property: submission.currently_own_property,
            credit_score,
            household_income,
            household_size,
            living_in_county: submission.living_in_county,
            working_in_county: submission.working_in_county,
            county_employee: submission.county_employee,
            student_debt: submission.student_debt,
            planned_stay,
            municipality: submission
                .municipality
                .map(|value| value.trim().to_ascii_lowercase())
                .unwrap_or_default(),
        })
    }
}

fn location_code(raw: Option<String>) -> String {
    match raw.map(|value| value.trim().to_ascii_lowercase()) {
        Some(value) if !value.is_empty() => value,
        _ => ANY_LOCATION.to_string(),
    }
}

/// Rejections raised while building a profile from untrusted input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("applicant {0} is required")]
    MissingField(&'static str),
    #[error("household income must be a non-negative number (found {0})")]
    InvalidIncome(f64),
    #[error("household size must be at least 1 (found {0})")]
    InvalidHouseholdSize(i64),
    #[error("unrecognized credit score '{0}'")]
    UnrecognizedCreditScore(String),
    #[error("unrecognized planned stay '{0}'")]
    UnrecognizedStay(String),
}

impl fmt::Display for CreditScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Score(score) => write!(f, "{score}"),
            band => write!(f, "band with floor {}", band.floor()),
        }
    }
}

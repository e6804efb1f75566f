mod criteria;
mod overrides;
mod profile;
mod reasons;
mod rules;

pub use criteria::{IncomeLimits, ProgramEligibility, ANY_LOCATION, MAX_HOUSEHOLD_TIER};
pub use overrides::ProgramOverride;
pub use profile::{
    ApplicantProfile, CreditScoreBand, ProfileError, ProfileSubmission, RawCreditScore,
    StayDuration,
};
pub use reasons::DisqualificationReason;

use rules::RuleInput;
use serde::{Deserialize, Serialize};

/// Outcome of checking one profile against one program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationResult {
    pub qualifies: bool,
    /// Empty when the profile qualifies; otherwise the first blocking rule.
    pub reasons: Vec<DisqualificationReason>,
}

impl QualificationResult {
    pub fn qualified() -> Self {
        Self {
            qualifies: true,
            reasons: Vec::new(),
        }
    }

    pub fn primary_reason(&self) -> Option<&DisqualificationReason> {
        self.reasons.first()
    }

    pub fn summary(&self) -> String {
        match self.primary_reason() {
            None => "qualifies".to_string(),
            Some(reason) => reason.summary(),
        }
    }
}

/// Decide whether `profile` qualifies for the program identified by `program_id`.
///
/// Pure and deterministic: rules run in a fixed order and stop at the first failure, so
/// the same inputs always report the same reason.
pub fn evaluate(
    profile: &ApplicantProfile,
    eligibility: &ProgramEligibility,
    program_id: &str,
) -> QualificationResult {
    let input = RuleInput {
        profile,
        eligibility,
        program_id,
    };

    match rules::first_failure(&input) {
        None => QualificationResult::qualified(),
        Some(reason) => {
            tracing::debug!(program_id, reason = %reason.summary(), "program disqualified");
            QualificationResult {
                qualifies: false,
                reasons: vec![reason],
            }
        }
    }
}

use super::profile::ApplicantProfile;
use super::reasons::DisqualificationReason;

/// Extra condition attached to a specific program id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramOverride {
    MinimumStay { years: u8 },
}

impl ProgramOverride {
    pub(crate) fn check(self, profile: &ApplicantProfile) -> Option<DisqualificationReason> {
        match self {
            ProgramOverride::MinimumStay { years } => minimum_stay(profile, years),
        }
    }
}

/// Programs whose forgiveness terms assume the buyer stays put.
const OVERRIDES: &[(&str, ProgramOverride)] = &[
    ("mchaf", ProgramOverride::MinimumStay { years: 5 }),
    ("hoc-dpa", ProgramOverride::MinimumStay { years: 5 }),
    ("pap", ProgramOverride::MinimumStay { years: 5 }),
];

pub(crate) fn overrides_for(program_id: &str) -> impl Iterator<Item = ProgramOverride> + '_ {
    OVERRIDES
        .iter()
        .filter(move |(id, _)| *id == program_id)
        .map(|(_, rule)| *rule)
}

/// A missing stay answer is not held against the applicant.
pub(crate) fn minimum_stay(
    profile: &ApplicantProfile,
    years: u8,
) -> Option<DisqualificationReason> {
    match profile.planned_stay {
        Some(stay) if !stay.satisfies(years) => {
            Some(DisqualificationReason::MinimumStayRequired { years })
        }
        _ => None,
    }
}

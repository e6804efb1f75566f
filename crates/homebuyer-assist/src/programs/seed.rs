use super::domain::ProgramDraft;

const SEED_PROGRAMS: &str = include_str!("../../data/seed-programs.json");

/// Sample Maryland programs bundled with the crate, used to populate an empty catalog.
pub fn seed_programs() -> Result<Vec<ProgramDraft>, serde_json::Error> {
    serde_json::from_str(SEED_PROGRAMS)
}

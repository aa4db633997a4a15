//! Roster loading and the activity filter

use std::path::Path;

use shared::{Candidate, Stage, parse_roster, stage_info};

use crate::error::{TournamentError, TournamentResult};

/// Read and validate the preprocessed roster at `path`
pub async fn load_roster(path: &Path) -> TournamentResult<Vec<Candidate>> {
    let content = tokio::fs::read_to_string(path).await?;
    let roster = parse_roster(&content, &path.display().to_string())?;

    stage_info!(
        Stage::Setup,
        "Loaded {} player records from {}",
        roster.len(),
        path.display()
    );
    Ok(roster)
}

/// Players who have made at least one appearance or bench selection.
/// Order is preserved.
pub fn eligible(roster: &[Candidate]) -> TournamentResult<Vec<Candidate>> {
    let active: Vec<Candidate> = roster.iter().filter(|c| c.is_active()).cloned().collect();

    stage_info!(
        Stage::Setup,
        "{} of {} players are active",
        active.len(),
        roster.len()
    );

    if active.is_empty() {
        return Err(TournamentError::EmptyPool);
    }
    Ok(active)
}

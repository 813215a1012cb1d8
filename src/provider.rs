use std::collections::HashMap;

use anyhow::Result;

use crate::fixtures::{FixtureSet, Match};
use crate::team_state::TeamStrength;

/// Read/write contract the engine expects from whatever storage surrounds
/// it. Team keys are normalized upper-case names throughout. Fetch failures
/// surface as errors to the caller; the engine never retries.
pub trait DataProvider {
    /// Played matches, season -> round -> matches, with scores and results.
    fn fixtures(&self) -> Result<FixtureSet>;

    /// Unplayed matches, same shape, no scores or results.
    fn future_matches(&self) -> Result<FixtureSet>;

    /// Persisted ratings seeding the canonical table. May be empty on a
    /// first run; teams then start from their league tier's base rating.
    fn team_ratings(&self) -> Result<HashMap<String, f64>>;

    /// Empirical home/away win fractions per team.
    fn team_strengths(&self) -> Result<HashMap<String, TeamStrength>>;

    /// All historical meetings between the two teams, either venue order.
    fn head_to_head(&self, team_a: &str, team_b: &str) -> Result<Vec<Match>>;

    /// Real points already earned this season, the starting tally for every
    /// simulation trial.
    fn current_table(&self) -> Result<HashMap<String, u32>>;

    /// Persist updated canonical ratings after history has been processed.
    fn set_ratings(&self, ratings: &HashMap<String, f64>) -> Result<()>;
}

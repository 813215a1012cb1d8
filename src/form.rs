use std::collections::{HashMap, VecDeque};

use tracing::warn;

use crate::elo;
use crate::fixtures::{FixtureSet, flatten_by_date};
use crate::model_params::ModelParams;
use crate::team_state::TeamTable;

/// Window size of the form tracker. Fixed: the weight curve below is tuned
/// for exactly three games.
pub const FORM_GAMES: usize = 3;

/// Recency-weighted form per team plus the raw gain windows backing it.
/// Cloned wholesale into each simulation trial.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    form: HashMap<String, f64>,
    windows: HashMap<String, VecDeque<f64>>,
}

impl FormState {
    /// All-zero form with empty windows, used when a season is too young for
    /// form to mean anything.
    pub fn zeroed<'a>(teams: impl Iterator<Item = &'a String>) -> Self {
        let mut state = Self::default();
        for team in teams {
            state.form.insert(team.clone(), 0.0);
            state.windows.insert(team.clone(), VecDeque::new());
        }
        state
    }

    /// Current form, zero for teams with no recorded gains.
    pub fn form(&self, team: &str) -> f64 {
        self.form.get(team).copied().unwrap_or(0.0)
    }

    pub fn window(&self, team: &str) -> Option<&VecDeque<f64>> {
        self.windows.get(team)
    }

    /// Append a rating gain, evicting the oldest entry past capacity, and
    /// recompute the team's weighted form.
    pub fn record_gain(&mut self, team: &str, gain: f64) {
        let window = self.windows.entry(team.to_string()).or_default();
        if window.len() == FORM_GAMES {
            window.pop_front();
        }
        window.push_back(gain);
        let form = weighted_form(window);
        self.form.insert(team.to_string(), form);
    }
}

/// Weights ln(i^2+1) for i = 1..=3, normalized to sum to 1. The most recent
/// game lands on the largest weight (exactly 0.5).
fn normalized_weights() -> [f64; FORM_GAMES] {
    let mut weights = [0.0; FORM_GAMES];
    let mut total = 0.0;
    for (i, w) in weights.iter_mut().enumerate() {
        let idx = (i + 1) as f64;
        *w = (idx * idx + 1.0).ln();
        total += *w;
    }
    for w in &mut weights {
        *w /= total;
    }
    weights
}

/// Weighted sum over the window, oldest first. Short windows are padded on
/// the left with zero gains so one or two data points can't produce an
/// extreme form swing for an unproven team.
fn weighted_form(window: &VecDeque<f64>) -> f64 {
    let weights = normalized_weights();
    let pad = FORM_GAMES.saturating_sub(window.len());
    window
        .iter()
        .take(FORM_GAMES)
        .enumerate()
        .map(|(i, gain)| gain * weights[pad + i])
        .sum()
}

/// Seed form windows by replaying the full history through the rating
/// engine against a scratch copy of the canonical table. Ratings are *not*
/// advanced between matches: each gain answers "what would this game be
/// worth now", not a compounding walk.
pub fn init_form(fixtures: &FixtureSet, table: &TeamTable, params: &ModelParams) -> FormState {
    for (season, rounds) in fixtures {
        if rounds.len() < 3 {
            warn!(
                season,
                rounds = rounds.len(),
                "season has fewer than 3 rounds, skipping form calculation"
            );
            return FormState::zeroed(table.team_names());
        }
    }

    let mut scratch = table.clone();
    let mut state = FormState::zeroed(table.team_names());

    for m in flatten_by_date(fixtures) {
        let Some(result) = m.result else {
            continue;
        };
        let base = params.base_rating(m.league_id);
        let rating_home = scratch.rating_or_init(&m.home_team, base);
        let rating_away = scratch.rating_or_init(&m.away_team, base);
        let (home_strength, away_strength) =
            scratch.matchup_strengths(&m.home_team, &m.away_team);

        let update = elo::update_match(
            params,
            result,
            m.date,
            m.league_id,
            rating_home,
            rating_away,
            home_strength,
            away_strength,
        );

        // Ratings deliberately left at their pre-match values.
        state.record_gain(&m.home_team, update.gain_home);
        state.record_gain(&m.away_team, update.gain_away);
    }

    state
}

use std::collections::HashMap;

use tracing::{debug, info};

use crate::elo::{self, RatingUpdate};
use crate::fixtures::{FixtureSet, Match, flatten_by_date};
use crate::model_params::ModelParams;
use crate::team_state::{TeamStrength, TeamTable};

/// Run one played match through the rating engine and commit the result to
/// the table. Returns the update, or `None` for unplayed fixtures. Unseen
/// teams are initialized from their league tier; teams without strength data
/// play with zero advantage.
pub fn process_match(
    table: &mut TeamTable,
    m: &Match,
    params: &ModelParams,
) -> Option<RatingUpdate> {
    let result = m.result?;

    let base = params.base_rating(m.league_id);
    let rating_home = table.rating_or_init(&m.home_team, base);
    let rating_away = table.rating_or_init(&m.away_team, base);
    let (home_strength, away_strength) = table.matchup_strengths(&m.home_team, &m.away_team);

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

    table.set_rating(&m.home_team, update.home);
    table.set_rating(&m.away_team, update.away);
    debug!(
        home = %m.home_team,
        away = %m.away_team,
        gain_home = update.gain_home,
        gain_away = update.gain_away,
        "rating update"
    );
    Some(update)
}

/// Replay the full history, seasons ascending, matches in non-decreasing
/// date order, committing every update to the canonical table. This is the
/// whole "training" step: deterministic replay, no statistical fitting.
/// Returns the number of matches processed.
pub fn process_seasons(
    table: &mut TeamTable,
    fixtures: &FixtureSet,
    params: &ModelParams,
) -> usize {
    let mut processed = 0;
    for m in flatten_by_date(fixtures) {
        if process_match(table, m, params).is_some() {
            processed += 1;
        }
    }
    info!(matches = processed, teams = table.len(), "history replayed");
    processed
}

/// Derive home/away strengths as plain win fractions over the historical
/// fixture set. Used to (re)seed strength data when the store has none.
pub fn strengths_from_fixtures(fixtures: &FixtureSet) -> HashMap<String, TeamStrength> {
    let mut home_games: HashMap<String, u32> = HashMap::new();
    let mut away_games: HashMap<String, u32> = HashMap::new();
    let mut home_wins: HashMap<String, u32> = HashMap::new();
    let mut away_wins: HashMap<String, u32> = HashMap::new();

    for m in flatten_by_date(fixtures) {
        let Some(result) = m.result else {
            continue;
        };
        *home_games.entry(m.home_team.clone()).or_default() += 1;
        *away_games.entry(m.away_team.clone()).or_default() += 1;
        match result {
            crate::fixtures::MatchResult::Home => {
                *home_wins.entry(m.home_team.clone()).or_default() += 1;
            }
            crate::fixtures::MatchResult::Away => {
                *away_wins.entry(m.away_team.clone()).or_default() += 1;
            }
            crate::fixtures::MatchResult::Draw => {}
        }
    }

    let mut strengths: HashMap<String, TeamStrength> = HashMap::new();
    for (team, games) in &home_games {
        let wins = home_wins.get(team).copied().unwrap_or(0);
        strengths.entry(team.clone()).or_default().home = wins as f64 / *games as f64;
    }
    for (team, games) in &away_games {
        let wins = away_wins.get(team).copied().unwrap_or(0);
        strengths.entry(team.clone()).or_default().away = wins as f64 / *games as f64;
    }
    strengths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Score, insert_match};
    use crate::model_params::DecayAnchor;

    fn params() -> ModelParams {
        ModelParams {
            decay_anchor: DecayAnchor::Fixed("2025-12-01".parse().unwrap()),
            ..ModelParams::default()
        }
    }

    fn played(home: &str, away: &str, hg: u32, ag: u32, day: &str, round: &str) -> Match {
        let score = Score { home: hg, away: ag };
        Match {
            date: day.parse().unwrap(),
            league_id: 103,
            season: "2025".to_string(),
            round: round.to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            score: Some(score),
            result: Some(score.result()),
        }
    }

    #[test]
    fn unplayed_fixture_is_skipped() {
        let mut table = TeamTable::default();
        let mut m = played("BRANN", "VIKING", 0, 0, "2025-04-06", "Round 1");
        m.score = None;
        m.result = None;
        assert!(process_match(&mut table, &m, &params()).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn processing_commits_ratings_and_initializes_teams() {
        let mut table = TeamTable::default();
        let m = played("BRANN", "VIKING", 2, 0, "2025-04-06", "Round 1");
        let update = process_match(&mut table, &m, &params()).unwrap();

        assert!(update.gain_home > 0.0);
        assert_eq!(table.rating("BRANN"), Some(update.home));
        assert_eq!(table.rating("VIKING"), Some(update.away));
        assert!(table.rating("BRANN").unwrap() > 1500.0);
        assert!(table.rating("VIKING").unwrap() < 1500.0);
    }

    #[test]
    fn replay_is_path_dependent_on_date_order() {
        let p = params();
        let mut fixtures = FixtureSet::new();
        insert_match(
            &mut fixtures,
            played("BRANN", "VIKING", 1, 0, "2025-04-06", "Round 1"),
        );
        insert_match(
            &mut fixtures,
            played("VIKING", "BRANN", 2, 0, "2025-04-13", "Round 2"),
        );
        insert_match(
            &mut fixtures,
            played("BRANN", "VIKING", 1, 1, "2025-04-20", "Round 3"),
        );

        let mut table = TeamTable::default();
        let processed = process_seasons(&mut table, &fixtures, &p);
        assert_eq!(processed, 3);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn strengths_are_win_fractions() {
        let mut fixtures = FixtureSet::new();
        insert_match(
            &mut fixtures,
            played("BRANN", "VIKING", 2, 0, "2025-04-06", "Round 1"),
        );
        insert_match(
            &mut fixtures,
            played("BRANN", "MOLDE", 1, 1, "2025-04-13", "Round 2"),
        );
        insert_match(
            &mut fixtures,
            played("MOLDE", "VIKING", 0, 1, "2025-04-20", "Round 3"),
        );

        let strengths = strengths_from_fixtures(&fixtures);
        // BRANN: 1 home win in 2 home games, no away games.
        assert!((strengths["BRANN"].home - 0.5).abs() < 1e-12);
        assert_eq!(strengths["BRANN"].away, 0.0);
        // VIKING: lost at BRANN, won at MOLDE.
        assert!((strengths["VIKING"].away - 0.5).abs() < 1e-12);
    }
}

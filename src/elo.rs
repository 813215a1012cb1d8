use chrono::NaiveDate;

use crate::fixtures::MatchResult;
use crate::model_params::{DecayAnchor, ModelParams};

/// Result of one rating update. Pure data: the caller decides whether the new
/// ratings land in canonical or trial-private state.
#[derive(Debug, Clone, Copy)]
pub struct RatingUpdate {
    pub home: f64,
    pub away: f64,
    pub gain_home: f64,
    pub gain_away: f64,
}

/// Logistic expected score for the home side.
pub fn expected_score(rating_home: f64, rating_away: f64, home_advantage: f64) -> f64 {
    let exponent = (rating_away - rating_home + home_advantage) / 400.0;
    1.0 / (1.0 + 10.0_f64.powf(exponent))
}

/// Home advantage in rating points from empirical win fractions. Amplifies
/// the edge when the home side's home record beats the opponent's away
/// record, and goes negative when it doesn't.
pub fn home_advantage(home_strength: f64, away_strength: f64) -> f64 {
    let hfa = home_strength * 100.0;
    let afa = away_strength * 100.0;
    hfa + (hfa - afa) / 2.0
}

/// Logarithmic age decay: `k / ln(days + 10)`, days floored at 1 so the
/// denominator stays positive even for same-day or future-dated matches.
pub fn decay_factor(k: f64, match_date: NaiveDate, anchor: DecayAnchor) -> f64 {
    let days = (anchor.reference_date() - match_date).num_days().max(1) as f64;
    k / (days + 10.0).ln()
}

/// Actual scores per side. Strict goal-difference sign only; a 5-0 scores
/// the same as a 1-0.
pub fn actual_scores(result: MatchResult) -> (f64, f64) {
    match result {
        MatchResult::Home => (1.0, 0.0),
        MatchResult::Away => (0.0, 1.0),
        MatchResult::Draw => (0.5, 0.5),
    }
}

/// Apply the rating rule to one match.
#[allow(clippy::too_many_arguments)]
pub fn update_match(
    params: &ModelParams,
    result: MatchResult,
    match_date: NaiveDate,
    league_id: u32,
    rating_home: f64,
    rating_away: f64,
    home_strength: f64,
    away_strength: f64,
) -> RatingUpdate {
    let advantage = home_advantage(home_strength, away_strength);
    let expected_home = expected_score(rating_home, rating_away, advantage);
    let expected_away = 1.0 - expected_home;
    let (actual_home, actual_away) = actual_scores(result);

    let effective_k = params.k_factor
        * params.league_weight(league_id)
        * decay_factor(params.k_factor, match_date, params.decay_anchor);

    let new_home = rating_home + effective_k * (actual_home - expected_home);
    let new_away = rating_away + effective_k * (actual_away - expected_away);

    RatingUpdate {
        home: new_home,
        away: new_away,
        gain_home: new_home - rating_home,
        gain_away: new_away - rating_away,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_params() -> ModelParams {
        ModelParams {
            decay_anchor: DecayAnchor::Fixed("2024-12-10".parse().unwrap()),
            ..ModelParams::default()
        }
    }

    #[test]
    fn expected_scores_sum_to_one() {
        for (rh, ra, adv) in [
            (1500.0, 1500.0, 0.0),
            (1600.0, 1400.0, 75.0),
            (1200.0, 1800.0, -40.0),
        ] {
            let eh = expected_score(rh, ra, adv);
            let ea = 1.0 - eh;
            assert!((eh + ea - 1.0).abs() < 1e-12);
            assert!(eh > 0.0 && eh < 1.0);
        }
    }

    #[test]
    fn home_advantage_can_go_negative() {
        // Weak home record against a strong travelling side.
        assert!(home_advantage(0.2, 0.6) < 0.0);
        // 0.6 home vs 0.3 away: 60 + (60 - 30) / 2 = 75.
        assert!((home_advantage(0.6, 0.3) - 75.0).abs() < 1e-12);
    }

    #[test]
    fn decay_shrinks_with_age_and_floors_days() {
        let anchor = DecayAnchor::Fixed("2024-12-10".parse().unwrap());
        let recent = decay_factor(3.0, "2024-12-01".parse().unwrap(), anchor);
        let old = decay_factor(3.0, "2022-05-01".parse().unwrap(), anchor);
        assert!(recent > old);

        // Same-day and future-dated matches both clamp to one day of age.
        let same_day = decay_factor(3.0, "2024-12-10".parse().unwrap(), anchor);
        let future = decay_factor(3.0, "2025-03-01".parse().unwrap(), anchor);
        assert!((same_day - 3.0 / 11.0_f64.ln()).abs() < 1e-12);
        assert!((future - same_day).abs() < 1e-12);
    }

    #[test]
    fn update_is_zero_sum_without_strength_asymmetry() {
        let params = fixed_params();
        for result in [MatchResult::Home, MatchResult::Draw, MatchResult::Away] {
            let up = update_match(
                &params,
                result,
                "2024-11-30".parse().unwrap(),
                103,
                1550.0,
                1450.0,
                0.0,
                0.0,
            );
            assert!((up.gain_home + up.gain_away).abs() < 1e-9);
        }
    }

    #[test]
    fn winner_gains_and_loser_drops() {
        let params = fixed_params();
        let up = update_match(
            &params,
            MatchResult::Away,
            "2024-11-30".parse().unwrap(),
            103,
            1500.0,
            1500.0,
            0.55,
            0.30,
        );
        assert!(up.gain_away > 0.0);
        assert!(up.gain_home < 0.0);
    }

    #[test]
    fn lower_tier_updates_are_scaled_down() {
        let params = fixed_params();
        let date: NaiveDate = "2024-11-30".parse().unwrap();
        let top = update_match(
            &params,
            MatchResult::Home,
            date,
            103,
            1500.0,
            1500.0,
            0.0,
            0.0,
        );
        let lower = update_match(
            &params,
            MatchResult::Home,
            date,
            104,
            1500.0,
            1500.0,
            0.0,
            0.0,
        );
        assert!((lower.gain_home - top.gain_home * 0.75).abs() < 1e-9);
    }
}

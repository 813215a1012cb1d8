use crate::elo;
use crate::fixtures::Match;
use crate::model_params::ModelParams;

/// Bounded head-to-head nudge from the two teams' direct record, in rating
/// points, positive when history favors `team`. Each meeting counts +1/0/-1
/// from `team`'s perspective, weighted by the same log time-decay as the
/// rating updates, averaged, then scaled by `h2h_factor`.
///
/// No shared history means no bias: exactly 0.
pub fn h2h_adjustment(history: &[Match], team: &str, params: &ModelParams) -> f64 {
    if history.is_empty() {
        return 0.0;
    }

    let mut score = 0.0;
    for m in history {
        let result = m.result_for(team) as f64;
        let decay = elo::decay_factor(params.k_factor, m.date, params.decay_anchor);
        score += result * decay;
    }

    score / history.len() as f64 * params.h2h_factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{MatchResult, Score};
    use crate::model_params::DecayAnchor;

    fn params() -> ModelParams {
        ModelParams {
            decay_anchor: DecayAnchor::Fixed("2024-12-10".parse().unwrap()),
            ..ModelParams::default()
        }
    }

    fn meeting(home: &str, away: &str, hg: u32, ag: u32, day: &str) -> Match {
        let score = Score { home: hg, away: ag };
        Match {
            date: day.parse().unwrap(),
            league_id: 103,
            season: "2024".to_string(),
            round: "Round 1".to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            score: Some(score),
            result: Some(score.result()),
        }
    }

    #[test]
    fn no_history_means_no_adjustment() {
        assert_eq!(h2h_adjustment(&[], "BRANN", &params()), 0.0);
    }

    #[test]
    fn dominant_record_pushes_the_adjustment_positive() {
        let history = vec![
            meeting("BRANN", "VIKING", 2, 0, "2024-05-12"),
            meeting("VIKING", "BRANN", 0, 1, "2024-08-03"),
            meeting("BRANN", "VIKING", 3, 3, "2024-10-20"),
        ];
        let adj = h2h_adjustment(&history, "BRANN", &params());
        assert!(adj > 0.0);
        // Same history from the other side is the mirror image.
        let other = h2h_adjustment(&history, "VIKING", &params());
        assert!((adj + other).abs() < 1e-12);
    }

    #[test]
    fn recent_meetings_outweigh_old_ones() {
        let p = params();
        let recent_win = h2h_adjustment(
            &[meeting("BRANN", "VIKING", 1, 0, "2024-11-30")],
            "BRANN",
            &p,
        );
        let old_win = h2h_adjustment(
            &[meeting("BRANN", "VIKING", 1, 0, "2021-06-15")],
            "BRANN",
            &p,
        );
        assert!(recent_win > old_win);
        assert!(old_win > 0.0);
    }
}

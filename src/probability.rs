use crate::model_params::ModelParams;

/// Win/draw/loss probabilities for one pairing. Sums to 1 by construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeProbs {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
}

impl OutcomeProbs {
    pub fn sum(&self) -> f64 {
        self.home_win + self.draw + self.away_win
    }
}

/// Bradley-Terry with a draw term. `theta` controls rating sensitivity,
/// `draw_k` the baseline draw mass; the denominator always includes
/// `draw_k > 0`, so there is no division-by-zero path.
pub fn match_probabilities(
    params: &ModelParams,
    rating_home: f64,
    rating_away: f64,
    home_advantage: f64,
    h2h_adjustment: f64,
) -> OutcomeProbs {
    let delta = rating_home + home_advantage + h2h_adjustment - rating_away;

    let exp_positive = (delta / params.theta).exp();
    let exp_negative = (-delta / params.theta).exp();
    let denominator = exp_positive + exp_negative + params.draw_k;

    OutcomeProbs {
        home_win: exp_positive / denominator,
        draw: params.draw_k / denominator,
        away_win: exp_negative / denominator,
    }
}

//! Name -> strategy constructor lookup.

use super::{
    Strategy, bollinger_reversion, donchian_breakout, ma_cross, range_reversion, rsi_divergence,
    rsi_stoch_confluence, run_pattern, stoch_adaptive, support_bounce, swing_low, trend_adx,
};
use crate::domain::error::ProbtraderError;
use crate::domain::params::ParamMap;

pub const STRATEGY_NAMES: &[&str] = &[
    "sma_cross",
    "ema_cross",
    "rsi_divergence",
    "rsi_stoch_confluence",
    "stoch_adaptive",
    "support_bounce",
    "trend_adx",
    "bollinger_reversion",
    "donchian_breakout",
    "range_reversion",
    "swing_low",
    "run_pattern",
];

/// Build a named strategy from parameter overrides.
pub fn build_strategy(name: &str, params: &ParamMap) -> Result<Box<dyn Strategy>, ProbtraderError> {
    let strategy: Box<dyn Strategy> = match name {
        "sma_cross" => Box::new(ma_cross::build_sma_cross(params)?),
        "ema_cross" => Box::new(ma_cross::build_ema_cross(params)?),
        "rsi_divergence" => Box::new(rsi_divergence::build(params)?),
        "rsi_stoch_confluence" => Box::new(rsi_stoch_confluence::build(params)?),
        "stoch_adaptive" => Box::new(stoch_adaptive::build(params)?),
        "support_bounce" => Box::new(support_bounce::build(params)?),
        "trend_adx" => Box::new(trend_adx::build(params)?),
        "bollinger_reversion" => Box::new(bollinger_reversion::build(params)?),
        "donchian_breakout" => Box::new(donchian_breakout::build(params)?),
        "range_reversion" => Box::new(range_reversion::build(params)?),
        "swing_low" => Box::new(swing_low::build(params)?),
        "run_pattern" => Box::new(run_pattern::build(params)?),
        other => {
            return Err(ProbtraderError::UnknownStrategy {
                name: other.to_string(),
            });
        }
    };
    tracing::debug!(
        strategy = name,
        params = params.len(),
        indicators = ?strategy.indicators(),
        "strategy built"
    );
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_name_builds() {
        let params = ParamMap::new().with("buy_on_dip", true);
        for name in STRATEGY_NAMES {
            let strategy = build_strategy(name, &params).unwrap();
            assert_eq!(strategy.name(), *name);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = build_strategy("martingale", &ParamMap::new()).err().unwrap();
        assert!(matches!(err, ProbtraderError::UnknownStrategy { ref name } if name == "martingale"));
    }

    #[test]
    fn invalid_risk_surfaces() {
        let params = ParamMap::new().with("risk_percent", 1.5);
        let err = build_strategy("sma_cross", &params).err().unwrap();
        assert!(matches!(err, ProbtraderError::ConfigInvalid { .. }));
    }

    #[test]
    fn oversized_period_is_rejected_at_build() {
        let params = ParamMap::new().with("slow_period", 1e19);
        let err = build_strategy("sma_cross", &params).err().unwrap();
        assert!(matches!(err, ProbtraderError::ConfigInvalid { ref key, .. } if key == "slow_period"));

        let params = ParamMap::new()
            .with("buy_on_dip", true)
            .with("consec_bars", usize::MAX as f64);
        let err = build_strategy("run_pattern", &params).err().unwrap();
        assert!(matches!(err, ProbtraderError::ConfigInvalid { ref key, .. } if key == "consec_bars"));
    }

    #[test]
    fn run_pattern_needs_buy_on_dip() {
        let err = build_strategy("run_pattern", &ParamMap::new()).err().unwrap();
        assert!(matches!(err, ProbtraderError::ConfigMissing { .. }));
    }
}

//! Risk parameters shared by every strategy: sizing and the exit stack.

use crate::domain::error::ProbtraderError;
use crate::domain::lifecycle::Lifecycle;
use crate::domain::params::{ParamMap, ParamValue};
use crate::domain::position::ExitRules;

/// Built-in risk settings of one strategy. Zero disables an optional exit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskDefaults {
    pub risk_percent: f64,
    pub stop_loss: f64,
    pub trailing_stop: f64,
    pub trail_requires_gain: bool,
    pub take_profit: f64,
    pub take_profit_enabled: bool,
    pub max_hold_bars: u32,
}

impl Default for RiskDefaults {
    fn default() -> Self {
        Self {
            risk_percent: 0.1,
            stop_loss: 0.05,
            trailing_stop: 0.0,
            trail_requires_gain: true,
            take_profit: 0.0,
            take_profit_enabled: false,
            max_hold_bars: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    pub risk_percent: f64,
    pub rules: ExitRules,
}

impl RiskConfig {
    /// Read `risk_percent`, `stop_loss`, `trailing_stop`, `trail_requires_gain`,
    /// `take_profit` (or `profit_target`), `take_profit_enabled` and
    /// `max_hold_bars`, falling back to `defaults`.
    ///
    /// A boolean `trailing_stop` switches a trail at the stop-loss distance on
    /// or off.
    pub fn from_params(params: &ParamMap, defaults: RiskDefaults) -> Result<Self, ProbtraderError> {
        let risk_percent = params.number("risk_percent", defaults.risk_percent);
        if !(risk_percent > 0.0 && risk_percent <= 1.0) {
            return Err(ProbtraderError::invalid_param(
                "risk_percent",
                format!("must be in (0, 1], got {risk_percent}"),
            ));
        }
        let stop_loss = params.fraction("stop_loss", defaults.stop_loss)?;

        let trailing = match params.get("trailing_stop") {
            Some(ParamValue::Bool(true)) => stop_loss,
            Some(ParamValue::Bool(false)) => 0.0,
            _ => params.fraction("trailing_stop", defaults.trailing_stop)?,
        };

        let take_profit_key = if params.contains("take_profit") {
            "take_profit"
        } else {
            "profit_target"
        };
        let take_profit = params.fraction(take_profit_key, defaults.take_profit)?;
        let take_profit_enabled = params.flag("take_profit_enabled", defaults.take_profit_enabled);

        let max_hold = params.number("max_hold_bars", defaults.max_hold_bars as f64).floor();
        if !(max_hold >= 0.0) {
            return Err(ProbtraderError::invalid_param(
                "max_hold_bars",
                format!("must be >= 0, got {max_hold}"),
            ));
        }
        let max_hold = max_hold.min(u32::MAX as f64) as u32;

        Ok(Self {
            risk_percent,
            rules: ExitRules {
                stop_loss_pct: stop_loss,
                trailing_stop_pct: (trailing > 0.0).then_some(trailing),
                trail_requires_gain: params.flag("trail_requires_gain", defaults.trail_requires_gain),
                take_profit_pct: (take_profit_enabled && take_profit > 0.0).then_some(take_profit),
                max_hold_bars: (max_hold > 0).then_some(max_hold),
            },
        })
    }

    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::new(self.rules.clone(), self.risk_percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let cfg = RiskConfig::from_params(&ParamMap::new(), RiskDefaults::default()).unwrap();
        assert_eq!(cfg.risk_percent, 0.1);
        assert_eq!(cfg.rules.stop_loss_pct, 0.05);
        assert_eq!(cfg.rules.trailing_stop_pct, None);
        assert_eq!(cfg.rules.take_profit_pct, None);
        assert_eq!(cfg.rules.max_hold_bars, None);
        assert!(cfg.rules.trail_requires_gain);
    }

    #[test]
    fn overrides_and_profit_target_alias() {
        let params = ParamMap::new()
            .with("trailing_stop", 0.04)
            .with("profit_target", 0.12)
            .with("take_profit_enabled", true)
            .with("max_hold_bars", 40.0);
        let cfg = RiskConfig::from_params(&params, RiskDefaults::default()).unwrap();
        assert_eq!(cfg.rules.trailing_stop_pct, Some(0.04));
        assert_eq!(cfg.rules.take_profit_pct, Some(0.12));
        assert_eq!(cfg.rules.max_hold_bars, Some(40));
    }

    #[test]
    fn disabled_take_profit_is_ignored() {
        let params = ParamMap::new().with("take_profit", 0.08);
        let cfg = RiskConfig::from_params(&params, RiskDefaults::default()).unwrap();
        assert_eq!(cfg.rules.take_profit_pct, None);
    }

    #[test]
    fn boolean_trailing_stop_uses_stop_distance() {
        let params = ParamMap::new().with("stop_loss", 0.03).with("trailing_stop", true);
        let cfg = RiskConfig::from_params(&params, RiskDefaults::default()).unwrap();
        assert_eq!(cfg.rules.trailing_stop_pct, Some(0.03));

        let off = ParamMap::new().with("trailing_stop", false);
        let defaults = RiskDefaults {
            trailing_stop: 0.02,
            ..RiskDefaults::default()
        };
        let cfg = RiskConfig::from_params(&off, defaults).unwrap();
        assert_eq!(cfg.rules.trailing_stop_pct, None);
    }

    #[test]
    fn invalid_risk_percent() {
        for bad in [0.0, -0.1, 1.5] {
            let params = ParamMap::new().with("risk_percent", bad);
            let err = RiskConfig::from_params(&params, RiskDefaults::default()).unwrap_err();
            assert!(matches!(err, ProbtraderError::ConfigInvalid { ref key, .. } if key == "risk_percent"));
        }
    }

    #[test]
    fn negative_stop_rejected() {
        let params = ParamMap::new().with("trailing_stop", -0.01);
        assert!(RiskConfig::from_params(&params, RiskDefaults::default()).is_err());
    }

    #[test]
    fn lifecycle_carries_rules() {
        let cfg = RiskConfig::from_params(&ParamMap::new(), RiskDefaults::default()).unwrap();
        let lc = cfg.lifecycle();
        assert_eq!(lc.risk_percent, 0.1);
        assert_eq!(lc.rules, cfg.rules);
    }
}

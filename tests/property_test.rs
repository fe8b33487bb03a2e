//! Property tests for indicator bounds and run determinism.

mod common;

use common::*;
use probtrader::domain::backtest::{BacktestConfig, run_backtest};
use probtrader::domain::events::RecordingSink;
use probtrader::domain::indicator::{Indicator, PercentileRank, Rsi, Sma, Stochastic};
use probtrader::domain::params::ParamMap;
use probtrader::domain::strategy::{STRATEGY_NAMES, build_strategy};
use proptest::prelude::*;

fn closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01f64..0.99, 1..120)
}

proptest! {
    #[test]
    fn rsi_stays_in_range(values in closes(), period in 1usize..20) {
        let mut rsi = Rsi::new(period);
        for v in values {
            rsi.push(v);
            if let Some(value) = rsi.value() {
                prop_assert!((0.0..=100.0).contains(&value), "rsi {value}");
            }
        }
    }

    #[test]
    fn stochastic_k_stays_in_range(values in closes(), k in 1usize..15, d in 1usize..5) {
        let mut stoch = Stochastic::new(k, d);
        for bar in price_bars("t", &values) {
            stoch.update(&bar);
            if let Some(value) = stoch.value() {
                prop_assert!((0.0..=100.0).contains(&value.k), "%K {}", value.k);
                if let Some(d) = value.d {
                    prop_assert!((0.0..=100.0).contains(&d), "%D {d}");
                }
            }
        }
    }

    #[test]
    fn sma_is_mean_of_window(values in closes(), period in 1usize..30) {
        let mut sma = Sma::new(period);
        for (i, v) in values.iter().enumerate() {
            sma.push(*v);
            let expected = (i + 1 >= period)
                .then(|| values[i + 1 - period..=i].iter().sum::<f64>() / period as f64);
            match (sma.value(), expected) {
                (Some(got), Some(want)) => prop_assert!((got - want).abs() < 1e-9),
                (None, None) => {}
                (got, want) => prop_assert!(false, "sma {got:?} vs {want:?}"),
            }
        }
    }

    #[test]
    fn percentile_rank_is_a_fraction(values in closes(), period in 2usize..30) {
        let mut rank = PercentileRank::new(period);
        for v in values {
            rank.push(v);
            if let Some(value) = rank.value() {
                prop_assert!((0.0..=1.0).contains(&value), "rank {value}");
            }
        }
    }

    #[test]
    fn backtests_are_deterministic_and_solvent(values in closes(), pick in 0usize..12) {
        let name = STRATEGY_NAMES[pick % STRATEGY_NAMES.len()];
        let params = ParamMap::new().with("buy_on_dip", true);
        let bars = price_bars("t", &values);

        let mut runs = Vec::new();
        for _ in 0..2 {
            let mut strategy = build_strategy(name, &params).unwrap();
            let mut sink = RecordingSink::new();
            let result = run_backtest(bars.clone(), strategy.as_mut(), &BacktestConfig::default(), &mut sink).unwrap();
            prop_assert!(result.portfolio.cash >= -1e-9);
            prop_assert_eq!(result.portfolio.equity_curve.len(), values.len());
            runs.push((sink.events, result.portfolio.equity_curve));
        }
        prop_assert_eq!(&runs[0], &runs[1]);
    }
}

//! Core domain types and logic.

pub mod bar;
pub mod rolling;
pub mod indicator;
pub mod detector;
pub mod position;
pub mod lifecycle;
pub mod events;
pub mod params;
pub mod portfolio;
pub mod strategy;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;

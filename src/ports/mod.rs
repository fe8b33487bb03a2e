//! Port traits: the interfaces the domain consumes from the outside world.

pub mod config_port;
pub mod data_port;
pub mod portfolio_port;

//! Pattern detectors built on indicator outputs and raw price history.

pub mod confluence;
pub mod divergence;
pub mod run;
pub mod swing;

pub use confluence::Confluence;
pub use divergence::{Divergence, DivergenceDetector};
pub use run::RunCounter;
pub use swing::SwingDetector;

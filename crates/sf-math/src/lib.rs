//! Symbol Forecast math utilities.

pub mod math;

pub use math::ranking::*;
pub use math::smoothing::*;

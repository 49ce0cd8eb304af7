//! Core math modules.

pub mod ranking;
pub mod smoothing;

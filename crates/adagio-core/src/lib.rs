//! # adagio-core
//!
//! Core types, configuration, and error handling shared by the adagio
//! playback engine and the control loop that drives it.

pub mod config;
pub mod error;
pub mod types;

pub use config::{FadeCurve, PlayerConfig};
pub use error::{Error, Result};
pub use types::*;

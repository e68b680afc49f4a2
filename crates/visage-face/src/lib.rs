//! Visage Face - The non-speech animation sources
//!
//! - Expression presets, layers and timed transitions
//! - Gaze, blinking and micro-saccades
//! - Idle breathing and micro-movement
//! - Pure mapping from cognitive state to expression and gaze

pub mod expression;
pub mod eye;
pub mod idle;
pub mod layer;
pub mod mapper;
pub mod preset;

pub use expression::*;
pub use eye::*;
pub use idle::*;
pub use layer::*;
pub use mapper::*;
pub use preset::*;

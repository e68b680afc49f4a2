//! Visage Core - Fundamental types and primitives
//!
//! This crate defines the types shared by every animation source:
//! - Blendshape channels and the clamped weight vector
//! - Easing curves
//! - Cognitive state snapshots
//! - Clocks for wall-clock anchored playback

pub mod channel;
pub mod clock;
pub mod cognitive;
pub mod easing;
pub mod error;
pub mod weights;

pub use channel::*;
pub use clock::*;
pub use cognitive::*;
pub use easing::*;
pub use error::*;
pub use weights::*;

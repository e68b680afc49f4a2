//! Visage Lip Sync - Viseme-driven mouth animation
//!
//! Speech arrives as a list of timed visemes. Playback is anchored to a
//! clock so the mouth stays locked to the audio even when frames drop.
//!
//! - Oculus-15 viseme set and phoneme lookup
//! - Timeline generation from phonemes, text or word timestamps
//! - Coarticulation applied at ingest
//! - Clock-anchored playback with eased mouth poses

pub mod coarticulation;
pub mod controller;
pub mod generate;
pub mod synthetic;
pub mod timeline;
pub mod viseme;

pub use coarticulation::*;
pub use controller::*;
pub use generate::*;
pub use synthetic::*;
pub use timeline::*;
pub use viseme::*;

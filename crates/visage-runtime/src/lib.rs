//! Visage Runtime - Avatar compositor
//!
//! Ties the animation sources into one per-frame driver:
//! - `Avatar` runs expression, eyes, idle and lip sync in a fixed order
//! - `AvatarInputs` delivers state and speech from any thread
//! - Output adapters rename the result for ARKit or VRM renderers

pub mod adapter;
pub mod avatar;
pub mod config;
pub mod mailbox;
pub mod telemetry;

pub use adapter::*;
pub use avatar::*;
pub use config::*;
pub use mailbox::*;
pub use telemetry::*;

//! Core data models for shellroute
//!
//! Plain data shared between the dispatcher and its collaborators.

pub mod color;
pub mod launchable;

// Re-exports for convenience
pub use color::Color;
pub use launchable::{LaunchTarget, Launchable};

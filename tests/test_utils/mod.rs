//! Test Utilities and Mocks
//!
//! Mock collaborators and a dispatcher harness shared by the integration,
//! contract and unit test targets.

#![allow(dead_code)]

pub mod fixtures;

// Re-exports for convenience
pub use fixtures::{test_config, Harness, OutputCapture};
pub use mock_collaborators::{
    CountingHooks, FailingGroup, MockApps, RecordingGroup, RecordingParser,
};
pub use mock_shell::MockShell;

//! Launchable applications and their resolved launch targets

use serde::{Deserialize, Serialize};

/// An application as the registry knows it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Launchable {
    /// Label shown to (and typed by) the user
    pub public_label: String,
    /// Package identifier
    pub package: String,
    /// Entry point class identifier
    pub activity: String,
}

impl Launchable {
    pub fn new(
        public_label: impl Into<String>,
        package: impl Into<String>,
        activity: impl Into<String>,
    ) -> Self {
        Self {
            public_label: public_label.into(),
            package: package.into(),
            activity: activity.into(),
        }
    }
}

/// Platform handle produced by resolving a [`Launchable`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTarget {
    /// Target class identifier (`%a` in launch templates)
    pub class_name: String,
    /// Target package identifier (`%p` in launch templates)
    pub package: String,
    /// Host-specific launch payload, e.g. a command line
    pub payload: Option<String>,
}

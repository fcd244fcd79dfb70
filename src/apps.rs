//! Application registry
//!
//! The dispatcher asks the registry three things: which shown application
//! carries a label, what platform handle launches it, and to perform that
//! launch. [`ConfiguredApps`] is the reference registry built from the
//! `[[apps]]` configuration entries; hosts with a real application catalog
//! implement [`AppRegistry`] themselves.

use std::process::Stdio;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::models::{LaunchTarget, Launchable};

/// Application registry collaborator
pub trait AppRegistry: Send + Sync {
    /// Shown application whose public label equals `label` exactly
    fn find_label(&self, label: &str) -> Option<Launchable>;

    /// Launch handle for an application, `None` when it has no entry point
    fn launch_target(&self, app: &Launchable) -> Option<LaunchTarget>;

    /// Start the application behind a resolved handle
    fn perform_launch(&self, target: &LaunchTarget) -> Result<()>;

    /// Labels of every shown application
    fn shown_labels(&self) -> Vec<String>;
}

/// Registry backed by configuration entries
#[derive(Debug, Clone, Default)]
pub struct ConfiguredApps {
    apps: Vec<AppConfig>,
}

impl ConfiguredApps {
    pub fn new(apps: Vec<AppConfig>) -> Self {
        Self { apps }
    }

    fn shown(&self) -> impl Iterator<Item = &AppConfig> {
        self.apps.iter().filter(|app| !app.hidden)
    }

    fn entry_for(&self, app: &Launchable) -> Option<&AppConfig> {
        self.apps.iter().find(|entry| {
            entry.label == app.public_label
                && entry.package == app.package
                && entry.activity == app.activity
        })
    }
}

impl AppRegistry for ConfiguredApps {
    fn find_label(&self, label: &str) -> Option<Launchable> {
        self.shown()
            .find(|app| app.label == label)
            .map(|app| Launchable::new(&app.label, &app.package, &app.activity))
    }

    fn launch_target(&self, app: &Launchable) -> Option<LaunchTarget> {
        let entry = self.entry_for(app)?;
        let exec = entry.exec.as_ref().filter(|exec| !exec.trim().is_empty())?;
        Some(LaunchTarget {
            class_name: entry.activity.clone(),
            package: entry.package.clone(),
            payload: Some(exec.clone()),
        })
    }

    fn perform_launch(&self, target: &LaunchTarget) -> Result<()> {
        let command = target.payload.as_deref().ok_or_else(|| Error::LaunchFailed {
            label: target.package.clone(),
            reason: "no command to run".to_string(),
        })?;

        debug!("Launching '{}'", command);
        spawn_detached(command)
            .map(|_pid| ())
            .map_err(|e| Error::LaunchFailed {
                label: target.package.clone(),
                reason: e.to_string(),
            })
    }

    fn shown_labels(&self) -> Vec<String> {
        self.shown().map(|app| app.label.clone()).collect()
    }
}

/// Start `sh -c command` with null stdio and reap it in the background.
///
/// Inside a runtime the child is awaited on a detached task; otherwise a
/// plain thread waits on it. Returns the child's pid when known.
fn spawn_detached(command: &str) -> std::io::Result<Option<u32>> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let mut child = tokio::process::Command::new("sh")
                .arg("-c")
                .arg(command)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()?;
            let pid = child.id();
            handle.spawn(async move {
                match child.wait().await {
                    Ok(status) => trace!("Launched process {:?} exited with {}", pid, status),
                    Err(e) => warn!("Failed to reap launched process {:?}: {}", pid, e),
                }
            });
            Ok(pid)
        }
        Err(_) => {
            let mut child = std::process::Command::new("sh")
                .arg("-c")
                .arg(command)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()?;
            let pid = child.id();
            std::thread::Builder::new()
                .name("shellroute-reaper".to_string())
                .spawn(move || {
                    if let Err(e) = child.wait() {
                        warn!("Failed to reap launched process {}: {}", pid, e);
                    }
                })?;
            Ok(Some(pid))
        }
    }
}

//! Application launch path
//!
//! Shared by the application-label resolver, the selection entry point and
//! application groups. When launch history is enabled a line rendered from
//! `behavior.app_launch_format` is emitted before the launch:
//!
//! | placeholder | value                        |
//! |-------------|------------------------------|
//! | `%a`        | target class identifier      |
//! | `%p`        | target package identifier    |
//! | `%l`        | public label                 |
//! | `%n`        | newline                      |
//! | `%t`        | local time (`time_format`)   |
//!
//! Placeholders are case-insensitive and substituted in a single pass.

use chrono::Local;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::context::ExecutionContext;
use crate::error::Result;
use crate::models::{LaunchTarget, Launchable};

static LAUNCH_PLACEHOLDERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new("(?i)%([aplnt])").expect("launch placeholder pattern is valid")
});

/// Render a launch-history template
pub fn format_launch(
    template: &str,
    target: &LaunchTarget,
    label: &str,
    time_format: &str,
) -> String {
    LAUNCH_PLACEHOLDERS
        .replace_all(template, |caps: &Captures| {
            match caps[1].to_ascii_lowercase().as_str() {
                "a" => target.class_name.clone(),
                "p" => target.package.clone(),
                "l" => label.to_string(),
                "n" => "\n".to_string(),
                _ => Local::now().format(time_format).to_string(),
            }
        })
        .into_owned()
}

/// Launch an application through the registry
///
/// Returns `Ok(false)` without emitting anything when the application has
/// no launch target.
pub fn launch(context: &ExecutionContext, app: &Launchable) -> Result<bool> {
    let Some(target) = context.apps().launch_target(app) else {
        debug!("No launch target for '{}'", app.public_label);
        return Ok(false);
    };

    let behavior = context.behavior();
    if behavior.show_launch_history {
        let line = format_launch(
            &behavior.app_launch_format,
            &target,
            &app.public_label,
            &behavior.time_format,
        );
        context
            .output()
            .on_colored_output(context.theme().output_color, &line);
    }

    context.apps().perform_launch(&target)?;
    info!("Launched '{}' ({})", app.public_label, target.package);
    Ok(true)
}

//! Output and input collaborators
//!
//! The dispatcher never renders anything itself. Text leaves the core
//! through an [`OutputSink`], and synthetic input (such as the empty line
//! produced by a "back" gesture) enters the host through an [`InputSource`].

use tokio::sync::mpsc;

use crate::models::Color;

/// Destination for text produced by the dispatcher and its commands
///
/// Both methods are fire-and-forget. Implementations must be cheap and
/// must not block, since they are called from dispatch and from background
/// command tasks alike.
pub trait OutputSink: Send + Sync {
    /// Emit plain output text
    fn on_output(&self, text: &str);

    /// Emit output text in a specific color
    fn on_colored_output(&self, color: Color, text: &str);
}

/// Receiver of injected synthetic input lines
pub trait InputSource: Send + Sync {
    /// Feed a line into the host's input path as if the user typed it
    fn inject(&self, text: &str);
}

/// One piece of output captured by a [`ChannelSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// Plain text
    Text(String),
    /// Colored text
    Colored { color: Color, text: String },
}

impl OutputEvent {
    /// The text carried by the event, regardless of color
    pub fn text(&self) -> &str {
        match self {
            OutputEvent::Text(text) => text,
            OutputEvent::Colored { text, .. } => text,
        }
    }
}

/// Output sink forwarding every event over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutputEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver draining it
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutputEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: OutputEvent) {
        if self.tx.send(event).is_err() {
            trace!("Output receiver dropped, discarding output");
        }
    }
}

impl OutputSink for ChannelSink {
    fn on_output(&self, text: &str) {
        self.send(OutputEvent::Text(text.to_string()));
    }

    fn on_colored_output(&self, color: Color, text: &str) {
        self.send(OutputEvent::Colored {
            color,
            text: text.to_string(),
        });
    }
}

/// Input source forwarding injected lines over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelInput {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelInput {
    /// Create an input source and the receiver the host reads from
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl InputSource for ChannelInput {
    fn inject(&self, text: &str) {
        if self.tx.send(text.to_string()).is_err() {
            trace!("Input receiver dropped, discarding injected line");
        }
    }
}

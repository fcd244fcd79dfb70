//! Redirection: multi-turn interactive sessions
//!
//! A structured command that needs follow-up input (a confirmation, a
//! missing argument) installs a [`RedirectionSession`] through the
//! [`Redirector`]. While a session is installed every line the dispatcher
//! receives is routed to the session's handler instead of the resolver
//! chain. The handler decides when the conversation is over by returning
//! [`RedirectReply::Finish`]; the host can also end it from outside, e.g.
//! when a permission it asked for is denied.
//!
//! There is at most one session per dispatcher. The slot lives in the
//! dispatcher and is shared by handle with the execution context, so
//! commands running on background tasks can install a session.

use chrono::{DateTime, Utc};
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::context::ExecutionContext;
use crate::error::{Error, Result};

/// Inputs captured by a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectObjects {
    /// Inputs captured before the session started
    pub before: Vec<String>,
    /// Inputs received while the session is active
    pub after: Vec<String>,
}

impl RedirectObjects {
    fn clear(&mut self) {
        self.before.clear();
        self.after.clear();
    }

    /// The most recent input received by the session
    pub fn last_input(&self) -> Option<&str> {
        self.after.last().map(String::as_str)
    }
}

/// What a handler wants after processing one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectReply {
    /// Emit the text and keep the session
    Continue(String),
    /// Emit the text and end the session
    Finish(String),
}

impl RedirectReply {
    /// Text to emit
    pub fn text(&self) -> &str {
        match self {
            RedirectReply::Continue(text) | RedirectReply::Finish(text) => text,
        }
    }

    fn is_finish(&self) -> bool {
        matches!(self, RedirectReply::Finish(_))
    }
}

/// Behavior of a redirection session
pub trait RedirectHandler: Send {
    /// Handle one routed input; `objects.after` already holds it unless the
    /// session is waiting for a permission grant
    fn on_redirect(
        &mut self,
        objects: &mut RedirectObjects,
        context: &ExecutionContext,
    ) -> RedirectReply;

    /// Prompt hint shown by the host while the session is active
    fn hint(&self) -> Option<String> {
        None
    }
}

/// Host hooks fired when sessions start and end
pub trait RedirectionListener: Send + Sync {
    fn on_redirection_request(&self, hint: Option<&str>);

    fn on_redirection_end(&self);
}

/// One multi-turn interactive session
pub struct RedirectionSession {
    id: Uuid,
    objects: RedirectObjects,
    waiting_permission: bool,
    started_at: DateTime<Utc>,
    handler: Box<dyn RedirectHandler>,
}

impl RedirectionSession {
    pub fn new(handler: impl RedirectHandler + 'static) -> Self {
        Self {
            id: Uuid::new_v4(),
            objects: RedirectObjects::default(),
            waiting_permission: false,
            started_at: Utc::now(),
            handler: Box::new(handler),
        }
    }

    /// Seed the inputs captured before the session started
    pub fn with_before(mut self, before: Vec<String>) -> Self {
        self.objects.before = before;
        self
    }

    /// Start the session waiting for a permission grant
    pub fn waiting_for_permission(mut self) -> Self {
        self.waiting_permission = true;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn objects(&self) -> &RedirectObjects {
        &self.objects
    }

    pub fn is_waiting_permission(&self) -> bool {
        self.waiting_permission
    }

    pub fn set_waiting_permission(&mut self, waiting: bool) {
        self.waiting_permission = waiting;
    }

    /// Record an input and run the handler on it
    pub fn route(&mut self, input: &str, context: &ExecutionContext) -> RedirectReply {
        if !self.waiting_permission {
            self.objects.after.push(input.trim().to_string());
        }
        self.handler.on_redirect(&mut self.objects, context)
    }

    /// Drop every captured input
    pub fn cleanup(&mut self) {
        self.objects.clear();
    }

    fn snapshot(&self) -> RedirectionSnapshot {
        RedirectionSnapshot {
            id: self.id,
            before: self.objects.before.clone(),
            after: self.objects.after.clone(),
            waiting_permission: self.waiting_permission,
            hint: self.handler.hint(),
            started_at: self.started_at,
        }
    }
}

impl fmt::Debug for RedirectionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedirectionSession")
            .field("id", &self.id)
            .field("objects", &self.objects)
            .field("waiting_permission", &self.waiting_permission)
            .field("started_at", &self.started_at)
            .finish()
    }
}

/// Read-only copy of the active session's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectionSnapshot {
    pub id: Uuid,
    pub before: Vec<String>,
    pub after: Vec<String>,
    pub waiting_permission: bool,
    pub hint: Option<String>,
    pub started_at: DateTime<Utc>,
}

enum SlotState {
    Idle,
    Active(Box<RedirectionSession>),
    /// The session is out of the slot while its handler runs
    Routing {
        cleanup_requested: bool,
        permission_granted: bool,
    },
}

/// Shared handle to the single redirection slot
#[derive(Clone)]
pub struct Redirector {
    slot: Arc<Mutex<SlotState>>,
    /// Serializes routed inputs so handlers never run concurrently
    gate: Arc<Mutex<()>>,
    listener: Option<Arc<dyn RedirectionListener>>,
}

impl Redirector {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(SlotState::Idle)),
            gate: Arc::new(Mutex::new(())),
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn RedirectionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install a session; fails if one is already active
    pub fn prepare(&self, session: RedirectionSession) -> Result<()> {
        let hint = session.handler.hint();
        {
            let mut slot = self.lock();
            if !matches!(*slot, SlotState::Idle) {
                return Err(Error::RedirectionActive);
            }
            debug!("Redirection {} started", session.id);
            *slot = SlotState::Active(Box::new(session));
        }

        if let Some(listener) = &self.listener {
            listener.on_redirection_request(hint.as_deref());
        }
        Ok(())
    }

    /// End the active session, clearing its captured inputs
    ///
    /// Returns whether a session was active. Calling it again is a no-op.
    pub fn cleanup(&self) -> bool {
        let ended = {
            let mut slot = self.lock();
            match &mut *slot {
                SlotState::Idle => false,
                SlotState::Active(session) => {
                    session.cleanup();
                    debug!("Redirection {} ended", session.id);
                    *slot = SlotState::Idle;
                    true
                }
                SlotState::Routing {
                    cleanup_requested, ..
                } => {
                    // Applied once the running handler returns.
                    *cleanup_requested = true;
                    false
                }
            }
        };

        if ended {
            self.notify_end();
        }
        ended
    }

    /// Whether a session is installed
    pub fn is_active(&self) -> bool {
        !matches!(*self.lock(), SlotState::Idle)
    }

    /// Copy of the active session's state
    pub fn snapshot(&self) -> Option<RedirectionSnapshot> {
        match &*self.lock() {
            SlotState::Active(session) => Some(session.snapshot()),
            _ => None,
        }
    }

    /// Clear the waiting-for-permission flag of the active session
    pub fn grant_permission(&self) -> bool {
        match &mut *self.lock() {
            SlotState::Idle => false,
            SlotState::Active(session) => {
                session.set_waiting_permission(false);
                true
            }
            SlotState::Routing {
                permission_granted, ..
            } => {
                *permission_granted = true;
                true
            }
        }
    }

    /// Route one input to the active session
    ///
    /// Returns `None` when no session is active, otherwise the text the
    /// handler produced.
    pub fn route(&self, input: &str, context: &ExecutionContext) -> Option<String> {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        let mut session = {
            let mut slot = self.lock();
            match mem::replace(&mut *slot, SlotState::Idle) {
                SlotState::Active(session) => {
                    *slot = SlotState::Routing {
                        cleanup_requested: false,
                        permission_granted: false,
                    };
                    session
                }
                other => {
                    *slot = other;
                    return None;
                }
            }
        };

        let reply = match panic::catch_unwind(AssertUnwindSafe(|| session.route(input, context))) {
            Ok(reply) => reply,
            Err(_) => {
                error!("Redirection {} handler panicked", session.id);
                session.cleanup();
                *self.lock() = SlotState::Idle;
                self.notify_end();
                return Some(Error::RedirectionPanicked.to_string());
            }
        };

        let ended = {
            let mut slot = self.lock();
            let (cleanup_requested, permission_granted) = match &*slot {
                SlotState::Routing {
                    cleanup_requested,
                    permission_granted,
                } => (*cleanup_requested, *permission_granted),
                _ => (false, false),
            };

            if reply.is_finish() || cleanup_requested {
                session.cleanup();
                debug!("Redirection {} ended", session.id);
                *slot = SlotState::Idle;
                true
            } else {
                if permission_granted {
                    session.set_waiting_permission(false);
                }
                *slot = SlotState::Active(session);
                false
            }
        };

        if ended {
            self.notify_end();
        }
        Some(reply.text().to_string())
    }

    fn notify_end(&self) {
        if let Some(listener) = &self.listener {
            listener.on_redirection_end();
        }
    }
}

impl Default for Redirector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Redirector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Redirector")
            .field("active", &self.is_active())
            .finish()
    }
}

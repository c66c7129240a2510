//! The Signal Bus: decoupled completion notifications.
//!
//! A leaf content component publishes a [`CompletionSignal`] when the learner
//! has exhausted the current section; any component holding a clone of the
//! same [`SignalBus`] can react without a structural link to the publisher.
//!
//! Delivery is synchronous and in subscription order. There is no queue: a
//! signal published with no subscribers is dropped. A panicking handler is
//! caught and logged so it cannot stop delivery to the handlers after it.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! use lesson_core::{CompletionSignal, SignalBus};
//!
//! let bus = SignalBus::new();
//! let seen = Arc::new(AtomicBool::new(false));
//!
//! let flag = Arc::clone(&seen);
//! let subscription = bus.subscribe(move |signal| {
//!     flag.store(signal.is_at_end, Ordering::SeqCst);
//! });
//!
//! bus.publish(&CompletionSignal::at_end());
//! assert!(seen.load(Ordering::SeqCst));
//!
//! subscription.unsubscribe();
//! assert_eq!(bus.subscriber_count(), 0);
//! ```

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::Section;

/// Event name under which completion signals travel on the wire.
pub const SECTION_END_EVENT: &str = "sectionEnd";

/// "The learner has reached the end of this section."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSignal {
    /// Whether the section's content is exhausted.
    pub is_at_end: bool,
    /// The section the signal refers to. When absent, the signal applies to
    /// whichever section is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
}

impl CompletionSignal {
    /// An end-of-section signal for whichever section is active.
    #[must_use]
    pub const fn at_end() -> Self {
        Self {
            is_at_end: true,
            section_id: None,
        }
    }

    /// An end-of-section signal tagged with a specific section.
    #[must_use]
    pub fn for_section(section: Section) -> Self {
        Self {
            is_at_end: true,
            section_id: Some(section.as_str().to_string()),
        }
    }

    /// Returns `true` if the signal applies to `section`.
    #[must_use]
    pub fn applies_to(&self, section: Section) -> bool {
        self.section_id
            .as_deref()
            .map_or(true, |id| id == section.as_str())
    }
}

type Handler = Arc<dyn Fn(&CompletionSignal) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

/// Injected publish/subscribe channel for [`CompletionSignal`]s.
///
/// Cloning is cheap; every clone shares the same subscriber list.
#[derive(Clone, Default)]
pub struct SignalBus {
    registry: Arc<Mutex<Registry>>,
}

impl SignalBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler until the returned [`Subscription`] is dropped or
    /// explicitly unsubscribed.
    #[must_use = "dropping the subscription unsubscribes the handler immediately"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&CompletionSignal) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.push((id, Arc::new(handler)));
        debug!(subscriber = id, "Signal bus subscriber added");

        Subscription {
            registry: Arc::downgrade(&self.registry),
            id,
        }
    }

    /// Delivers `signal` to every current subscriber, in subscription order.
    ///
    /// Returns the number of handlers that ran to completion.
    pub fn publish(&self, signal: &CompletionSignal) -> usize {
        // Snapshot so handlers may subscribe or publish re-entrantly.
        let handlers: Vec<(u64, Handler)> = lock(&self.registry).handlers.clone();

        if handlers.is_empty() {
            debug!(?signal, "Signal dropped, no subscribers");
            return 0;
        }

        let mut delivered = 0;
        for (id, handler) in &handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(signal))).is_ok() {
                delivered += 1;
            } else {
                error!(subscriber = *id, "Signal bus subscriber panicked");
            }
        }
        delivered
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).handlers.len()
    }
}

impl fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle returned by [`SignalBus::subscribe`]. Unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    id: u64,
}

impl Subscription {
    /// Removes the handler from the bus.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).handlers.retain(|(id, _)| *id != self.id);
            debug!(subscriber = self.id, "Signal bus subscriber removed");
        }
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

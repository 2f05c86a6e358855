//! # articles-rs-signals
//!
//! Signal dispatcher for content changes. Pages and application-content
//! bindings announce saves and deletes here; the articles app listens and
//! cycles the reverse cache generation.
//!
//! ## Usage
//!
//! ```
//! use articles_rs_signals::{BindingChanged, ContentSignals};
//! use std::sync::Arc;
//!
//! let signals = ContentSignals::new();
//!
//! signals.binding_saved.connect("log", Arc::new(|change: &BindingChanged| {
//!     println!("binding {} now mounts {}", change.binding_id, change.urlconf_path);
//!     None
//! }));
//!
//! let results = signals.binding_saved.send(&BindingChanged::new(1, "articles.urls"));
//! assert_eq!(results.len(), 1);
//! ```

use std::any::Any;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The type signature for a signal receiver callback.
///
/// Receivers accept a reference to the signal payload and may optionally
/// return a boxed value.
pub type SignalReceiver<T> = Arc<dyn Fn(&T) -> Option<Box<dyn Any + Send>> + Send + Sync>;

/// A signal that can be connected to and dispatched.
///
/// Receivers are called in the order they were connected.
pub struct Signal<T: 'static> {
    receivers: RwLock<Vec<(String, SignalReceiver<T>)>>,
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<String> = self.read().iter().map(|(id, _)| id.clone()).collect();
        f.debug_struct("Signal").field("receivers", &ids).finish()
    }
}

impl<T: 'static> Signal<T> {
    /// Creates a new signal with no connected receivers.
    pub fn new() -> Self {
        Self {
            receivers: RwLock::new(Vec::new()),
        }
    }

    // Receivers never run under the lock, so a poisoned list is still intact.
    fn read(&self) -> RwLockReadGuard<'_, Vec<(String, SignalReceiver<T>)>> {
        self.receivers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<(String, SignalReceiver<T>)>> {
        self.receivers.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Connects a receiver to this signal.
    ///
    /// If a receiver with the same ID is already connected, it is replaced.
    pub fn connect(&self, receiver_id: impl Into<String>, callback: SignalReceiver<T>) {
        let id = receiver_id.into();
        let mut receivers = self.write();
        if let Some(entry) = receivers.iter_mut().find(|(rid, _)| *rid == id) {
            entry.1 = callback;
        } else {
            tracing::trace!(receiver = %id, "signal receiver connected");
            receivers.push((id, callback));
        }
    }

    /// Disconnects the receiver with the given ID.
    ///
    /// Returns `true` if a receiver was found and removed.
    pub fn disconnect(&self, receiver_id: &str) -> bool {
        let mut receivers = self.write();
        let len_before = receivers.len();
        receivers.retain(|(id, _)| id != receiver_id);
        receivers.len() < len_before
    }

    /// Sends the signal to all connected receivers and collects their
    /// return values.
    pub fn send(&self, payload: &T) -> Vec<Option<Box<dyn Any + Send>>> {
        // Snapshot so receivers may connect or disconnect while running.
        let receivers: Vec<SignalReceiver<T>> =
            self.read().iter().map(|(_, cb)| Arc::clone(cb)).collect();
        receivers.iter().map(|callback| callback(payload)).collect()
    }

    /// Returns the number of connected receivers.
    pub fn receiver_count(&self) -> usize {
        self.read().len()
    }
}

/// Payload for application-content binding saves and deletes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingChanged {
    /// Primary key of the binding.
    pub binding_id: u64,
    /// The urlconf the binding mounts.
    pub urlconf_path: String,
}

impl BindingChanged {
    /// Creates a payload.
    pub fn new(binding_id: u64, urlconf_path: impl Into<String>) -> Self {
        Self {
            binding_id,
            urlconf_path: urlconf_path.into(),
        }
    }
}

/// Payload for page saves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageChanged {
    /// Primary key of the page.
    pub page_id: u64,
}

/// The signals the reverse cache depends on.
#[derive(Debug, Default)]
pub struct ContentSignals {
    /// Fired after an application-content binding is saved.
    pub binding_saved: Signal<BindingChanged>,
    /// Fired after an application-content binding is deleted.
    pub binding_deleted: Signal<BindingChanged>,
    /// Fired after a page is saved (slug, parent, activity or URL changes).
    pub page_saved: Signal<PageChanged>,
}

impl ContentSignals {
    /// Creates a set of signals with no receivers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of receivers across all signals.
    pub fn receiver_count(&self) -> usize {
        self.binding_saved.receiver_count()
            + self.binding_deleted.receiver_count()
            + self.page_saved.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter(signal: &Signal<PageChanged>, id: &str) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        signal.connect(
            id,
            Arc::new(move |_: &PageChanged| {
                c.fetch_add(1, Ordering::SeqCst);
                None
            }),
        );
        count
    }

    #[test]
    fn test_signal_connect_and_send() {
        let signal = Signal::new();
        let count = counter(&signal, "a");
        let results = signal.send(&PageChanged { page_id: 1 });
        assert_eq!(results.len(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_signal_replace_same_id() {
        let signal = Signal::new();
        let first = counter(&signal, "dup");
        let second = counter(&signal, "dup");
        assert_eq!(signal.receiver_count(), 1);
        signal.send(&PageChanged { page_id: 1 });
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_signal_disconnect() {
        let signal = Signal::new();
        let count = counter(&signal, "a");
        assert!(signal.disconnect("a"));
        assert!(!signal.disconnect("a"));
        signal.send(&PageChanged { page_id: 1 });
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_signal_return_values() {
        let signal: Signal<BindingChanged> = Signal::new();
        signal.connect(
            "echo",
            Arc::new(|change: &BindingChanged| Some(Box::new(change.binding_id) as Box<dyn Any + Send>)),
        );
        let results = signal.send(&BindingChanged::new(9, "articles.urls"));
        let value = results[0].as_ref().and_then(|v| v.downcast_ref::<u64>());
        assert_eq!(value, Some(&9));
    }

    #[test]
    fn test_receiver_may_disconnect_during_send() {
        let signals = Arc::new(ContentSignals::new());
        let inner = Arc::clone(&signals);
        signals.page_saved.connect(
            "once",
            Arc::new(move |_: &PageChanged| {
                inner.page_saved.disconnect("once");
                None
            }),
        );
        signals.page_saved.send(&PageChanged { page_id: 1 });
        assert_eq!(signals.receiver_count(), 0);
    }
}

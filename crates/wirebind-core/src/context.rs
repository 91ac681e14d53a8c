//! # Ambient Request Context
//!
//! Request-scoped context passed opaquely to coercion functions,
//! context-aware validators, and the rules engine.
//!
//! ## Design Principles (SOLID)
//!
//! - **S**: Only handles per-request ambient state
//! - **O**: Extensible via `get::<T>()` for any type
//! - **D**: Collaborators depend on the context interface, not its contents
//!
//! The engine itself never interprets the context. Cancellation in
//! particular is carried as an opaque flag: a canceled context is only
//! observed if a collaborator chooses to check it.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Request-scoped ambient context
///
/// Carries a thread-safe type-keyed extension map plus an opaque
/// cancellation flag. Cloning is cheap; clones share the same storage.
#[derive(Clone, Default)]
pub struct Context {
    /// Type-erased extension storage
    values: Arc<RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>>,
    /// Cancellation flag, set by the surrounding transport
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// Create a new empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an extension value by its type
    ///
    /// Overwrites any existing value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&self, value: T) {
        let mut values = self.values.write().expect("Context lock poisoned");
        values.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a cloned extension value by type
    ///
    /// Returns `None` if no value of that type was stored.
    #[must_use]
    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        let values = self.values.read().expect("Context lock poisoned");
        values
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .cloned()
    }

    /// Check whether an extension of the given type exists
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        let values = self.values.read().expect("Context lock poisoned");
        values.contains_key(&TypeId::of::<T>())
    }

    /// Mark the context as canceled
    ///
    /// Called by the surrounding transport; the engine never calls this.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether the surrounding transport has canceled this request
    ///
    /// The engine never reads this on its own behalf; it exists for
    /// collaborators that want to stop early.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values = self.values.read().expect("Context lock poisoned");
        f.debug_struct("Context")
            .field("extensions", &values.len())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

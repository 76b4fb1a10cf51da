//! # Handler registry.
//!
//! Maps a task-type name to the [`Handler`](crate::Handler) that executes it.
//! Populated imperatively at startup by the modules owning each task type.
//!
//! ## Rules
//! - Names are unique: [`Registry::register`] rejects a second handler for the same name.
//! - [`Registry::replace`] is the explicit way to swap a handler; tasks already
//!   submitted keep the handler they were submitted with.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::RegistryError;
use crate::tasks::HandlerRef;

/// Name → handler map.
///
/// # Example
/// ```
/// use serde_json::json;
/// use taskpool::{HandlerFn, Registry, RegistryError, TaskContext, TaskError};
///
/// let registry = Registry::new();
/// let ping = HandlerFn::arc(|_ctx: TaskContext| async { Ok::<_, TaskError>(json!("pong")) });
///
/// registry.register("ping", ping.clone()).unwrap();
/// assert!(matches!(
///     registry.register("ping", ping),
///     Err(RegistryError::Duplicate { .. })
/// ));
/// assert_eq!(registry.names(), vec!["ping".to_string()]);
/// ```
#[derive(Default)]
pub struct Registry {
    handlers: RwLock<HashMap<String, HandlerRef>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`; fails if the name is taken.
    pub fn register(
        &self,
        name: impl Into<String>,
        handler: HandlerRef,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if handlers.contains_key(&name) {
            return Err(RegistryError::Duplicate { name });
        }
        handlers.insert(name, handler);
        Ok(())
    }

    /// Registers or overwrites `name`; returns the previous handler.
    pub fn replace(&self, name: impl Into<String>, handler: HandlerRef) -> Option<HandlerRef> {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), handler)
    }

    /// Looks up the handler for `name`.
    pub fn get(&self, name: &str) -> Option<HandlerRef> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// True if a handler is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Returns sorted list of registered names.
    pub fn names(&self) -> Vec<String> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = handlers.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Directive handler registry.

use std::collections::HashMap;
use std::fmt;

use super::DirectiveHandler;

/// Maps directive names and aliases to handlers.
///
/// Registering a name that is already taken replaces the earlier mapping.
#[derive(Default)]
pub struct DirectiveRegistry {
    handlers: Vec<Box<dyn DirectiveHandler>>,
    by_name: HashMap<String, usize>,
}

impl DirectiveRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its name and aliases.
    pub fn register<H: DirectiveHandler + 'static>(&mut self, handler: H) {
        let idx = self.handlers.len();
        self.by_name.insert(handler.name().to_owned(), idx);
        for alias in handler.aliases() {
            self.by_name.insert((*alias).to_owned(), idx);
        }
        self.handlers.push(Box::new(handler));
    }

    /// Register a handler (builder pattern).
    #[must_use]
    pub fn with<H: DirectiveHandler + 'static>(mut self, handler: H) -> Self {
        self.register(handler);
        self
    }

    /// Look up a handler by name or alias.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn DirectiveHandler> {
        let idx = *self.by_name.get(name)?;
        self.handlers.get(idx).map(|handler| &**handler)
    }

    /// Check if a name or alias is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Registered names and aliases, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveRegistry")
            .field("names", &self.names())
            .finish()
    }
}

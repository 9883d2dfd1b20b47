//! Handlers addressable by name

use super::dispatch::Next;
use super::phase::Phase;
use crate::error::{FilterError, Result};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Before/after callback body
pub type FilterFn<C, E> = Arc<dyn Fn(&mut C) -> std::result::Result<(), E> + Send + Sync>;

/// Around callback body; receives the rest of the chain as `next`
pub type AroundFn<C, E> =
    Arc<dyn Fn(&mut C, Next<'_, C, E>) -> std::result::Result<(), E> + Send + Sync>;

/// A callable that can back a filter
pub enum Handler<C, E> {
    Callback(FilterFn<C, E>),
    Around(AroundFn<C, E>),
}

impl<C, E> Handler<C, E> {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&mut C) -> std::result::Result<(), E> + Send + Sync + 'static,
    {
        Handler::Callback(Arc::new(f))
    }

    pub fn around<F>(f: F) -> Self
    where
        F: Fn(&mut C, Next<'_, C, E>) -> std::result::Result<(), E> + Send + Sync + 'static,
    {
        Handler::Around(Arc::new(f))
    }

    /// Whether this handler can run in `phase`
    pub fn supports(&self, phase: Phase) -> bool {
        matches!(
            (self, phase),
            (Handler::Callback(_), Phase::Before | Phase::After)
                | (Handler::Around(_), Phase::Around)
        )
    }
}

impl<C, E> Clone for Handler<C, E> {
    fn clone(&self) -> Self {
        match self {
            Handler::Callback(f) => Handler::Callback(Arc::clone(f)),
            Handler::Around(f) => Handler::Around(Arc::clone(f)),
        }
    }
}

impl<C, E> fmt::Debug for Handler<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Callback(_) => f.write_str("Callback(..)"),
            Handler::Around(_) => f.write_str("Around(..)"),
        }
    }
}

/// Named handlers a chain resolves filter targets against.
///
/// Defining a name twice replaces the earlier handler, the way a derived
/// controller overrides a method of its parent.
pub struct HandlerRegistry<C, E> {
    handlers: IndexMap<String, Handler<C, E>>,
}

impl<C, E> HandlerRegistry<C, E> {
    pub fn new() -> Self {
        Self {
            handlers: IndexMap::new(),
        }
    }

    /// Define a before/after handler
    pub fn callback<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut C) -> std::result::Result<(), E> + Send + Sync + 'static,
    {
        self.insert(name.into(), Handler::callback(f));
        self
    }

    /// Define an around handler
    pub fn around<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut C, Next<'_, C, E>) -> std::result::Result<(), E> + Send + Sync + 'static,
    {
        self.insert(name.into(), Handler::around(f));
        self
    }

    pub fn insert(&mut self, name: String, handler: Handler<C, E>) {
        debug!("Defining handler: {}", name);
        self.handlers.insert(name, handler);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handler names in definition order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Look up `name` for use in `phase`
    pub fn resolve(&self, name: &str, phase: Phase) -> Result<Handler<C, E>> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| FilterError::UnknownHandler(name.to_string()))?;

        if !handler.supports(phase) {
            return Err(FilterError::HandlerKindMismatch {
                name: name.to_string(),
                phase,
            });
        }

        Ok(handler.clone())
    }
}

impl<C, E> Default for HandlerRegistry<C, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, E> Clone for HandlerRegistry<C, E> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl<C, E> fmt::Debug for HandlerRegistry<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.handlers.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ctx {
        text: String,
    }

    fn registry() -> HandlerRegistry<Ctx, ()> {
        HandlerRegistry::new()
            .callback("first", |c: &mut Ctx| {
                c.text = "Hello world".to_string();
                Ok(())
            })
            .around("aroundz", |c: &mut Ctx, next| next.run(c))
    }

    #[test]
    fn test_resolve_known_handler() {
        let registry = registry();
        assert!(registry.resolve("first", Phase::Before).is_ok());
        assert!(registry.resolve("first", Phase::After).is_ok());
        assert!(registry.resolve("aroundz", Phase::Around).is_ok());
    }

    #[test]
    fn test_resolve_unknown_handler() {
        let err = registry().resolve("missing", Phase::Before).unwrap_err();
        assert_eq!(err, FilterError::UnknownHandler("missing".to_string()));
    }

    #[test]
    fn test_resolve_kind_mismatch() {
        let registry = registry();

        assert!(matches!(
            registry.resolve("aroundz", Phase::Before),
            Err(FilterError::HandlerKindMismatch { phase: Phase::Before, .. })
        ));
        assert!(matches!(
            registry.resolve("first", Phase::Around),
            Err(FilterError::HandlerKindMismatch { phase: Phase::Around, .. })
        ));
    }

    #[test]
    fn test_redefinition_replaces_handler() {
        let registry = registry().around("first", |c: &mut Ctx, next| next.run(c));

        assert_eq!(registry.len(), 2);
        assert!(registry.resolve("first", Phase::Around).is_ok());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["first", "aroundz"]);
    }

    #[test]
    fn test_callback_runs() {
        let mut ctx = Ctx { text: String::new() };
        if let Ok(Handler::Callback(f)) = registry().resolve("first", Phase::Before) {
            f(&mut ctx).unwrap();
        }
        assert_eq!(ctx.text, "Hello world");
    }
}

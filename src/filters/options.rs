//! Registration options and filter targets

use super::condition::{Conditions, Predicate};
use super::registry::Handler;
use std::fmt;

/// Options accepted when registering or skipping filters.
///
/// `only`/`except` restrict a filter by action name and are normalized into
/// the same `if`/`unless` predicates that [`FilterOptions::when`] and
/// [`FilterOptions::unless`] add directly.
pub struct FilterOptions<C> {
    only: Option<Vec<String>>,
    except: Option<Vec<String>>,
    when: Vec<Predicate<C>>,
    unless: Vec<Predicate<C>>,
    prepend: bool,
}

impl<C> FilterOptions<C> {
    pub fn new() -> Self {
        Self {
            only: None,
            except: None,
            when: Vec::new(),
            unless: Vec::new(),
            prepend: false,
        }
    }

    /// Run only for the listed actions
    pub fn only<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only
            .get_or_insert_with(Vec::new)
            .extend(actions.into_iter().map(Into::into));
        self
    }

    /// Run for every action except the listed ones
    pub fn except<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.except
            .get_or_insert_with(Vec::new)
            .extend(actions.into_iter().map(Into::into));
        self
    }

    /// Require `predicate` to hold (`:if`)
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.when.push(Predicate::custom(predicate));
        self
    }

    /// Require `predicate` not to hold (`:unless`)
    pub fn unless<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.unless.push(Predicate::custom(predicate));
        self
    }

    /// Insert ahead of the filters already registered in the phase
    pub fn prepend(mut self) -> Self {
        self.prepend = true;
        self
    }

    pub fn is_prepend(&self) -> bool {
        self.prepend
    }

    /// Normalize into a single conjunction of predicates
    pub fn conditions(&self) -> Conditions<C> {
        let mut if_all = self.when.clone();
        let mut unless_any = self.unless.clone();

        if let Some(only) = &self.only {
            if_all.push(Predicate::ActionIn(only.clone()));
        }
        if let Some(except) = &self.except {
            unless_any.push(Predicate::ActionIn(except.clone()));
        }

        Conditions { if_all, unless_any }
    }
}

impl<C> Default for FilterOptions<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for FilterOptions<C> {
    fn clone(&self) -> Self {
        Self {
            only: self.only.clone(),
            except: self.except.clone(),
            when: self.when.clone(),
            unless: self.unless.clone(),
            prepend: self.prepend,
        }
    }
}

impl<C> fmt::Debug for FilterOptions<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterOptions")
            .field("only", &self.only)
            .field("except", &self.except)
            .field("when", &self.when.len())
            .field("unless", &self.unless.len())
            .field("prepend", &self.prepend)
            .finish()
    }
}

/// What a filter invokes: a handler looked up by name, or an inline closure
pub enum Target<C, E> {
    Named(String),
    Inline(Handler<C, E>),
}

impl<C, E> Target<C, E> {
    pub fn named(name: impl Into<String>) -> Self {
        Target::Named(name.into())
    }

    /// Inline before/after callback
    pub fn inline<F>(f: F) -> Self
    where
        F: Fn(&mut C) -> Result<(), E> + Send + Sync + 'static,
    {
        Target::Inline(Handler::callback(f))
    }

    /// Inline around callback
    pub fn inline_around<F>(f: F) -> Self
    where
        F: Fn(&mut C, super::dispatch::Next<'_, C, E>) -> Result<(), E> + Send + Sync + 'static,
    {
        Target::Inline(Handler::around(f))
    }
}

impl<C, E> From<&str> for Target<C, E> {
    fn from(name: &str) -> Self {
        Target::Named(name.to_string())
    }
}

impl<C, E> From<String> for Target<C, E> {
    fn from(name: String) -> Self {
        Target::Named(name)
    }
}

impl<C, E> fmt::Debug for Target<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Target::Inline(_) => f.write_str("Inline(..)"),
        }
    }
}

//! Filter chain registration and skipping

use super::condition::Conditions;
use super::dispatch::Next;
use super::options::{FilterOptions, Target};
use super::phase::Phase;
use super::registry::{AroundFn, FilterFn, Handler, HandlerRegistry};
use crate::config::ChainConfig;
use crate::error::{FilterError, Result};
use crate::observability::DispatchMetrics;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Identity of a registered callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EntryKey {
    Named(String),
    Anonymous(u64),
}

impl EntryKey {
    pub(crate) fn label(&self) -> String {
        match self {
            EntryKey::Named(name) => name.clone(),
            EntryKey::Anonymous(id) => format!("<inline #{}>", id),
        }
    }

    fn is_named(&self, name: &str) -> bool {
        matches!(self, EntryKey::Named(n) if n == name)
    }
}

/// One registered callback in a phase
pub(crate) struct Entry<H, C> {
    pub(crate) key: EntryKey,
    pub(crate) handler: H,
    pub(crate) conditions: Conditions<C>,
}

impl<H: Clone, C> Clone for Entry<H, C> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            handler: self.handler.clone(),
            conditions: self.conditions.clone(),
        }
    }
}

/// Narrows a [`Handler`] to the callable shape a phase stores
pub(crate) trait PhaseHandler<C, E>: Sized + Clone {
    fn from_handler(handler: Handler<C, E>) -> Option<Self>;
}

impl<C, E> PhaseHandler<C, E> for FilterFn<C, E> {
    fn from_handler(handler: Handler<C, E>) -> Option<Self> {
        match handler {
            Handler::Callback(f) => Some(f),
            Handler::Around(_) => None,
        }
    }
}

impl<C, E> PhaseHandler<C, E> for AroundFn<C, E> {
    fn from_handler(handler: Handler<C, E>) -> Option<Self> {
        match handler {
            Handler::Around(f) => Some(f),
            Handler::Callback(_) => None,
        }
    }
}

/// Before/after/around callbacks wrapped around an action.
///
/// A chain is built once, while the owning controller type is set up, and
/// is read-only afterwards: [`FilterChain::run`] takes `&self`, so a built
/// chain can be shared between threads dispatching on separate contexts.
/// Derived controllers clone their parent's chain and extend the copy.
pub struct FilterChain<C, E> {
    pub(crate) registry: HandlerRegistry<C, E>,
    pub(crate) before: Vec<Entry<FilterFn<C, E>, C>>,
    pub(crate) after: Vec<Entry<FilterFn<C, E>, C>>,
    pub(crate) around: Vec<Entry<AroundFn<C, E>, C>>,
    pub(crate) config: ChainConfig,
    pub(crate) metrics: Option<Arc<DispatchMetrics>>,
    next_anonymous: u64,
}

impl<C, E> FilterChain<C, E> {
    /// Create an empty chain resolving names against `registry`
    pub fn new(registry: HandlerRegistry<C, E>) -> Self {
        Self::with_config(registry, ChainConfig::default())
    }

    pub fn with_config(registry: HandlerRegistry<C, E>, config: ChainConfig) -> Self {
        Self {
            registry,
            before: Vec::new(),
            after: Vec::new(),
            around: Vec::new(),
            config,
            metrics: None,
            next_anonymous: 0,
        }
    }

    /// Record dispatch outcomes into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ChainConfig) {
        self.config = config;
    }

    pub fn registry(&self) -> &HandlerRegistry<C, E> {
        &self.registry
    }

    /// Copy of this chain for a derived controller
    pub fn inherit(&self) -> Self {
        self.clone()
    }

    /// Register `targets` in `phase`.
    ///
    /// Every target is resolved before the chain changes, so a failed
    /// registration leaves it untouched. A named target already present in
    /// the phase is replaced, taking the new conditions and position.
    pub fn register<I>(&mut self, phase: Phase, targets: I, options: FilterOptions<C>) -> Result<()>
    where
        I: IntoIterator<Item = Target<C, E>>,
    {
        let conditions = options.conditions();
        let prepend = options.is_prepend();

        match phase {
            Phase::Before => {
                let entries = self.resolve_targets(phase, targets, &conditions)?;
                insert_entries(&mut self.before, entries, prepend, phase);
            }
            Phase::After => {
                let entries = self.resolve_targets(phase, targets, &conditions)?;
                insert_entries(&mut self.after, entries, prepend, phase);
            }
            Phase::Around => {
                let entries = self.resolve_targets(phase, targets, &conditions)?;
                insert_entries(&mut self.around, entries, prepend, phase);
            }
        }

        Ok(())
    }

    fn resolve_targets<H, I>(
        &mut self,
        phase: Phase,
        targets: I,
        conditions: &Conditions<C>,
    ) -> Result<Vec<Entry<H, C>>>
    where
        H: PhaseHandler<C, E>,
        I: IntoIterator<Item = Target<C, E>>,
    {
        let mut resolved = Vec::new();

        for target in targets {
            let (key, handler) = match target {
                Target::Named(name) => {
                    let handler = self.registry.resolve(&name, phase)?;
                    (EntryKey::Named(name), handler)
                }
                Target::Inline(handler) => (EntryKey::Anonymous(0), handler),
            };

            let handler = H::from_handler(handler).ok_or_else(|| {
                let name = match &key {
                    EntryKey::Named(name) => name.clone(),
                    EntryKey::Anonymous(_) => "<inline>".to_string(),
                };
                FilterError::HandlerKindMismatch { name, phase }
            })?;

            resolved.push(Entry {
                key,
                handler,
                conditions: conditions.clone(),
            });
        }

        // Ids are handed out only once the whole group is known to be valid
        for entry in &mut resolved {
            if let EntryKey::Anonymous(id) = &mut entry.key {
                self.next_anonymous += 1;
                *id = self.next_anonymous;
            }
        }

        Ok(resolved)
    }

    /// Remove named filters from `phase`, or narrow them when `options`
    /// carries conditions.
    ///
    /// A conditional skip adds the skip's `if` conditions (including
    /// `only`) to the filter's `unless`, so `skip ... only: [index]` stops
    /// the filter for `index` alone. Names unknown to the registry are
    /// always an error; names missing from the phase are an error under
    /// `strict_skip` and a logged no-op otherwise.
    pub fn skip<I, S>(&mut self, phase: Phase, names: I, options: FilterOptions<C>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let conditions = options.conditions();

        for name in &names {
            if !self.registry.contains(name) {
                return Err(FilterError::UnknownHandler(name.clone()));
            }
            if self.config.strict_skip && !self.contains(phase, name) {
                return Err(FilterError::NotRegistered {
                    name: name.clone(),
                    phase,
                });
            }
        }

        for name in &names {
            let found = match phase {
                Phase::Before => skip_in(&mut self.before, name, &conditions),
                Phase::After => skip_in(&mut self.after, name, &conditions),
                Phase::Around => skip_in(&mut self.around, name, &conditions),
            };

            if found {
                debug!("Skipped {} filter: {}", phase, name);
            } else {
                warn!("Cannot skip {} filter '{}': not registered, ignoring", phase, name);
            }
        }

        Ok(())
    }

    /// Skip `names` in every phase they are registered in
    pub fn skip_filter<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();

        for name in &names {
            if !self.registry.contains(name) {
                return Err(FilterError::UnknownHandler(name.clone()));
            }
            let anywhere = Phase::ALL.iter().any(|phase| self.contains(*phase, name));
            if self.config.strict_skip && !anywhere {
                return Err(FilterError::NotRegisteredAnywhere(name.clone()));
            }
        }

        let always = Conditions::always();
        for name in &names {
            let removed = [
                skip_in(&mut self.before, name, &always),
                skip_in(&mut self.after, name, &always),
                skip_in(&mut self.around, name, &always),
            ];

            if removed.iter().any(|r| *r) {
                debug!("Skipped filter in all phases: {}", name);
            } else {
                warn!("Cannot skip filter '{}': not registered in any phase, ignoring", name);
            }
        }

        Ok(())
    }

    /// Same as [`FilterChain::skip_filter`]
    pub fn skip_all_phases<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_filter(names)
    }

    /// Define (or override) a named before/after handler.
    ///
    /// Filters already bound to `name` are rebound to the new handler.
    pub fn define_callback<F>(&mut self, name: impl Into<String>, f: F) -> Result<()>
    where
        F: Fn(&mut C) -> std::result::Result<(), E> + Send + Sync + 'static,
    {
        self.define(name.into(), Handler::callback(f))
    }

    /// Define (or override) a named around handler
    pub fn define_around<F>(&mut self, name: impl Into<String>, f: F) -> Result<()>
    where
        F: Fn(&mut C, Next<'_, C, E>) -> std::result::Result<(), E> + Send + Sync + 'static,
    {
        self.define(name.into(), Handler::around(f))
    }

    fn define(&mut self, name: String, handler: Handler<C, E>) -> Result<()> {
        for phase in Phase::ALL {
            if self.contains(phase, &name) && !handler.supports(phase) {
                return Err(FilterError::HandlerKindMismatch { name, phase });
            }
        }

        rebind(&mut self.before, &name, &handler);
        rebind(&mut self.after, &name, &handler);
        rebind(&mut self.around, &name, &handler);
        self.registry.insert(name, handler);
        Ok(())
    }

    /// Whether a filter named `name` is registered in `phase`
    pub fn contains(&self, phase: Phase, name: &str) -> bool {
        match phase {
            Phase::Before => self.before.iter().any(|e| e.key.is_named(name)),
            Phase::After => self.after.iter().any(|e| e.key.is_named(name)),
            Phase::Around => self.around.iter().any(|e| e.key.is_named(name)),
        }
    }

    /// Labels of the filters in `phase`, in chain order
    pub fn filter_names(&self, phase: Phase) -> Vec<String> {
        match phase {
            Phase::Before => self.before.iter().map(|e| e.key.label()).collect(),
            Phase::After => self.after.iter().map(|e| e.key.label()).collect(),
            Phase::Around => self.around.iter().map(|e| e.key.label()).collect(),
        }
    }

    pub fn len(&self, phase: Phase) -> usize {
        match phase {
            Phase::Before => self.before.len(),
            Phase::After => self.after.len(),
            Phase::Around => self.around.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty() && self.around.is_empty()
    }

    fn add_named<I, S>(&mut self, phase: Phase, names: I, options: FilterOptions<C>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets: Vec<Target<C, E>> =
            names.into_iter().map(|n| Target::Named(n.into())).collect();
        self.register(phase, targets, options)
    }

    /// Append named before filters
    pub fn before_filter<I, S>(&mut self, names: I, options: FilterOptions<C>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_named(Phase::Before, names, options)
    }

    /// Append named after filters
    pub fn after_filter<I, S>(&mut self, names: I, options: FilterOptions<C>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_named(Phase::After, names, options)
    }

    /// Append named around filters
    pub fn around_filter<I, S>(&mut self, names: I, options: FilterOptions<C>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_named(Phase::Around, names, options)
    }

    /// Same as [`FilterChain::before_filter`]
    pub fn append_before_filter<I, S>(&mut self, names: I, options: FilterOptions<C>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.before_filter(names, options)
    }

    /// Same as [`FilterChain::after_filter`]
    pub fn append_after_filter<I, S>(&mut self, names: I, options: FilterOptions<C>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after_filter(names, options)
    }

    /// Same as [`FilterChain::around_filter`]
    pub fn append_around_filter<I, S>(&mut self, names: I, options: FilterOptions<C>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.around_filter(names, options)
    }

    pub fn prepend_before_filter<I, S>(&mut self, names: I, options: FilterOptions<C>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_named(Phase::Before, names, options.prepend())
    }

    pub fn prepend_after_filter<I, S>(&mut self, names: I, options: FilterOptions<C>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_named(Phase::After, names, options.prepend())
    }

    pub fn prepend_around_filter<I, S>(&mut self, names: I, options: FilterOptions<C>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_named(Phase::Around, names, options.prepend())
    }

    /// Append an inline before filter. Inline filters cannot be skipped.
    pub fn before_filter_with<F>(&mut self, f: F, options: FilterOptions<C>) -> Result<()>
    where
        F: Fn(&mut C) -> std::result::Result<(), E> + Send + Sync + 'static,
    {
        self.register(Phase::Before, [Target::inline(f)], options)
    }

    /// Append an inline after filter. Inline filters cannot be skipped.
    pub fn after_filter_with<F>(&mut self, f: F, options: FilterOptions<C>) -> Result<()>
    where
        F: Fn(&mut C) -> std::result::Result<(), E> + Send + Sync + 'static,
    {
        self.register(Phase::After, [Target::inline(f)], options)
    }

    /// Append an inline around filter. Inline filters cannot be skipped.
    pub fn around_filter_with<F>(&mut self, f: F, options: FilterOptions<C>) -> Result<()>
    where
        F: Fn(&mut C, Next<'_, C, E>) -> std::result::Result<(), E> + Send + Sync + 'static,
    {
        self.register(Phase::Around, [Target::inline_around(f)], options)
    }

    pub fn skip_before_filter<I, S>(&mut self, names: I, options: FilterOptions<C>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip(Phase::Before, names, options)
    }

    pub fn skip_after_filter<I, S>(&mut self, names: I, options: FilterOptions<C>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip(Phase::After, names, options)
    }

    pub fn skip_around_filter<I, S>(&mut self, names: I, options: FilterOptions<C>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip(Phase::Around, names, options)
    }
}

fn insert_entries<H, C>(
    list: &mut Vec<Entry<H, C>>,
    mut entries: Vec<Entry<H, C>>,
    prepend: bool,
    phase: Phase,
) {
    // A name listed twice in one group keeps its last occurrence
    let mut index = entries.len();
    while index > 0 {
        index -= 1;
        let duplicate = match &entries[index].key {
            EntryKey::Named(name) => entries[index + 1..].iter().any(|e| e.key.is_named(name)),
            EntryKey::Anonymous(_) => false,
        };
        if duplicate {
            entries.remove(index);
        }
    }

    list.retain(|existing| {
        !entries
            .iter()
            .any(|new| matches!(&new.key, EntryKey::Named(name) if existing.key.is_named(name)))
    });

    for entry in &entries {
        debug!(
            "Registering {} filter: {}{}",
            phase,
            entry.key.label(),
            if prepend { " (prepend)" } else { "" }
        );
    }

    if prepend {
        list.splice(0..0, entries);
    } else {
        list.extend(entries);
    }
}

/// Returns whether a filter named `name` was found
fn skip_in<H, C>(list: &mut Vec<Entry<H, C>>, name: &str, conditions: &Conditions<C>) -> bool {
    if conditions.is_unconditional() {
        let before = list.len();
        list.retain(|e| !e.key.is_named(name));
        return list.len() != before;
    }

    let mut found = false;
    for entry in list.iter_mut().filter(|e| e.key.is_named(name)) {
        entry.conditions.absorb_skip(conditions);
        found = true;
    }
    found
}

fn rebind<H, C, E>(list: &mut [Entry<H, C>], name: &str, handler: &Handler<C, E>)
where
    H: PhaseHandler<C, E>,
{
    for entry in list.iter_mut().filter(|e| e.key.is_named(name)) {
        if let Some(h) = H::from_handler(handler.clone()) {
            entry.handler = h;
        }
    }
}

impl<C, E> Clone for FilterChain<C, E> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            before: self.before.clone(),
            after: self.after.clone(),
            around: self.around.clone(),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
            next_anonymous: self.next_anonymous,
        }
    }
}

impl<C, E> fmt::Debug for FilterChain<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("before", &self.filter_names(Phase::Before))
            .field("around", &self.filter_names(Phase::Around))
            .field("after", &self.filter_names(Phase::After))
            .field("config", &self.config)
            .finish()
    }
}

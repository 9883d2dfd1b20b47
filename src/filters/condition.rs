//! Typed conditions deciding whether a callback applies to an action

use std::fmt;
use std::sync::Arc;

/// Host-supplied predicate evaluated against the action context
pub type PredicateFn<C> = Arc<dyn Fn(&C) -> bool + Send + Sync>;

/// A single condition attached to a callback
pub enum Predicate<C> {
    /// True when the dispatched action is one of the listed names
    ActionIn(Vec<String>),

    /// Arbitrary check against the context
    Custom(PredicateFn<C>),
}

impl<C> Predicate<C> {
    /// Build an action-name predicate from a list of names
    pub fn actions<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::ActionIn(names.into_iter().map(Into::into).collect())
    }

    /// Wrap a closure as a predicate
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Predicate::Custom(Arc::new(f))
    }

    pub fn evaluate(&self, ctx: &C, action: &str) -> bool {
        match self {
            // An empty list matches nothing
            Predicate::ActionIn(names) => names.iter().any(|name| name == action),
            Predicate::Custom(f) => f(ctx),
        }
    }
}

impl<C> Clone for Predicate<C> {
    fn clone(&self) -> Self {
        match self {
            Predicate::ActionIn(names) => Predicate::ActionIn(names.clone()),
            Predicate::Custom(f) => Predicate::Custom(Arc::clone(f)),
        }
    }
}

impl<C> fmt::Debug for Predicate<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::ActionIn(names) => f.debug_tuple("ActionIn").field(names).finish(),
            Predicate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Conjunction of `if` predicates and negated `unless` predicates
pub struct Conditions<C> {
    pub(crate) if_all: Vec<Predicate<C>>,
    pub(crate) unless_any: Vec<Predicate<C>>,
}

impl<C> Conditions<C> {
    /// Conditions that always hold
    pub fn always() -> Self {
        Self {
            if_all: Vec::new(),
            unless_any: Vec::new(),
        }
    }

    pub fn is_unconditional(&self) -> bool {
        self.if_all.is_empty() && self.unless_any.is_empty()
    }

    /// Whether a callback carrying these conditions runs for `action`
    pub fn matches(&self, ctx: &C, action: &str) -> bool {
        self.if_all.iter().all(|p| p.evaluate(ctx, action))
            && !self.unless_any.iter().any(|p| p.evaluate(ctx, action))
    }

    /// Fold a partial skip into these conditions.
    ///
    /// What the skip asks to run *under* becomes a reason not to run, and
    /// the skip's own `unless` becomes an additional requirement.
    pub(crate) fn absorb_skip(&mut self, skip: &Conditions<C>) {
        self.unless_any.extend(skip.if_all.iter().cloned());
        self.if_all.extend(skip.unless_any.iter().cloned());
    }
}

impl<C> Default for Conditions<C> {
    fn default() -> Self {
        Self::always()
    }
}

impl<C> Clone for Conditions<C> {
    fn clone(&self) -> Self {
        Self {
            if_all: self.if_all.clone(),
            unless_any: self.unless_any.clone(),
        }
    }
}

impl<C> fmt::Debug for Conditions<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conditions")
            .field("if", &self.if_all)
            .field("unless", &self.unless_any)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ctx {
        admin: bool,
    }

    #[test]
    fn test_action_in_matches_any_listed_name() {
        let p: Predicate<Ctx> = Predicate::actions(["index", "show"]);
        let ctx = Ctx { admin: false };

        assert!(p.evaluate(&ctx, "index"));
        assert!(p.evaluate(&ctx, "show"));
        assert!(!p.evaluate(&ctx, "destroy"));
    }

    #[test]
    fn test_empty_action_list_never_matches() {
        let p: Predicate<Ctx> = Predicate::actions(Vec::<String>::new());
        assert!(!p.evaluate(&Ctx { admin: true }, "index"));
    }

    #[test]
    fn test_conditions_conjunction() {
        let conditions = Conditions {
            if_all: vec![Predicate::custom(|c: &Ctx| c.admin)],
            unless_any: vec![Predicate::actions(["destroy"])],
        };

        assert!(conditions.matches(&Ctx { admin: true }, "index"));
        assert!(!conditions.matches(&Ctx { admin: false }, "index"));
        assert!(!conditions.matches(&Ctx { admin: true }, "destroy"));
    }

    #[test]
    fn test_absorb_skip_inverts_conditions() {
        let mut conditions: Conditions<Ctx> = Conditions::always();
        let skip = Conditions {
            if_all: vec![Predicate::actions(["index"])],
            unless_any: Vec::new(),
        };

        conditions.absorb_skip(&skip);

        let ctx = Ctx { admin: false };
        assert!(!conditions.matches(&ctx, "index"));
        assert!(conditions.matches(&ctx, "show"));
    }
}

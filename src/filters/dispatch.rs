//! Running a filter chain around an action
//!
//! A dispatch walks `Idle → RunningBefore → RunningAround → RunningAction →
//! RunningAfter → Done`. Checking the context's response flag after each
//! before filter, whenever an around filter yields, and when an around filter
//! returns without yielding, may move it to `Terminated` instead. From there
//! only the after phase (subject to `skip_after_callbacks_if_terminated`)
//! remains.

use super::chain::{Entry, FilterChain};
use super::controller::ActionContext;
use super::phase::Phase;
use super::registry::AroundFn;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// Continuation handed to an around filter.
///
/// Calling [`Next::run`] executes the inner around layers and the action
/// body. It consumes the continuation, so it runs at most once; an around
/// filter that drops it without running it prevents the inner layers and
/// the action from executing. If it also produced the response, the dispatch
/// is halted at that filter; otherwise after filters still run.
pub struct Next<'a, C, E> {
    rest: &'a mut dyn FnMut(&mut C) -> Result<(), E>,
}

impl<'a, C, E> Next<'a, C, E> {
    pub fn run(self, ctx: &mut C) -> Result<(), E> {
        (self.rest)(ctx)
    }
}

impl<C, E> fmt::Debug for Next<'_, C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Next(..)")
    }
}

/// Dispatch state machine positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    Idle,
    RunningBefore,
    RunningAround,
    RunningAction,
    Terminated,
    RunningAfter,
    Done,
}

/// Where a dispatch was halted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaltPoint {
    pub phase: Phase,

    /// Filter whose work produced the response
    pub filter: String,
}

/// Summary of a single dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub action: String,

    /// Set when a filter produced the response before the action ran
    pub halted: Option<HaltPoint>,

    /// Whether the action body was invoked
    pub action_performed: bool,

    /// Number of filters invoked, across all phases
    pub filters_invoked: usize,

    /// Whether the after phase was skipped because of a halt
    pub after_skipped: bool,

    /// States visited, in order
    pub transitions: Vec<DispatchState>,
}

impl DispatchReport {
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    pub fn final_state(&self) -> DispatchState {
        self.transitions.last().copied().unwrap_or(DispatchState::Idle)
    }
}

/// Mutable bookkeeping for one dispatch
pub(crate) struct Progress {
    report: DispatchReport,
}

impl Progress {
    fn new(action: &str) -> Self {
        Self {
            report: DispatchReport {
                action: action.to_string(),
                halted: None,
                action_performed: false,
                filters_invoked: 0,
                after_skipped: false,
                transitions: vec![DispatchState::Idle],
            },
        }
    }

    fn enter(&mut self, state: DispatchState) {
        if self.report.final_state() != state {
            trace!("Dispatch of '{}' entering {:?}", self.report.action, state);
            self.report.transitions.push(state);
        }
    }

    fn halt(&mut self, phase: Phase, filter: String) {
        debug!(
            "Dispatch of '{}' halted by {} filter {}",
            self.report.action, phase, filter
        );
        self.report.halted = Some(HaltPoint { phase, filter });
        self.enter(DispatchState::Terminated);
    }

    fn invoked(&mut self, phase: Phase, label: &str) {
        trace!("Running {} filter {} for '{}'", phase, label, self.report.action);
        self.report.filters_invoked += 1;
    }

    fn is_halted(&self) -> bool {
        self.report.halted.is_some()
    }

    pub(crate) fn report(&self) -> &DispatchReport {
        &self.report
    }
}

impl<C, E> FilterChain<C, E>
where
    C: ActionContext,
{
    /// Run the chain for `action` with `body` as the action.
    ///
    /// Conditions are evaluated once, up front, against the context as it
    /// is when dispatch starts. Errors from any filter or the body are
    /// returned unchanged; work done up to that point is not undone.
    pub fn run<F>(&self, action: &str, ctx: &mut C, body: F) -> Result<DispatchReport, E>
    where
        F: FnOnce(&mut C) -> Result<(), E>,
    {
        let mut progress = Progress::new(action);
        let result = self.dispatch(action, ctx, body, &mut progress);

        if let Some(metrics) = &self.metrics {
            metrics.record(progress.report(), result.is_ok());
        }

        result.map(|()| progress.report)
    }

    fn dispatch<F>(
        &self,
        action: &str,
        ctx: &mut C,
        body: F,
        progress: &mut Progress,
    ) -> Result<(), E>
    where
        F: FnOnce(&mut C) -> Result<(), E>,
    {
        let before = active(&self.before, ctx, action);
        let around = active(&self.around, ctx, action);
        let after = active(&self.after, ctx, action);

        progress.enter(DispatchState::RunningBefore);
        for entry in &before {
            let label = entry.key.label();
            progress.invoked(Phase::Before, &label);
            (entry.handler)(ctx)?;

            if ctx.performed() {
                progress.halt(Phase::Before, label);
                break;
            }
        }

        if !progress.is_halted() {
            let mut body = Some(body);
            run_around(&around, ctx, &mut body, progress)?;
        }

        if progress.is_halted() && self.config.skip_after_callbacks_if_terminated {
            if !after.is_empty() {
                debug!(
                    "Skipping {} after filter(s) for halted action '{}'",
                    after.len(),
                    action
                );
            }
            progress.report.after_skipped = true;
        } else {
            progress.enter(DispatchState::RunningAfter);
            for entry in &after {
                progress.invoked(Phase::After, &entry.key.label());
                (entry.handler)(ctx)?;
            }
        }

        progress.enter(DispatchState::Done);
        Ok(())
    }
}

fn active<'a, H, C>(entries: &'a [Entry<H, C>], ctx: &C, action: &str) -> Vec<&'a Entry<H, C>> {
    entries
        .iter()
        .filter(|entry| entry.conditions.matches(ctx, action))
        .collect()
}

/// Run the outermost layer of `around`, nesting the rest and the body inside it
fn run_around<C, E, F>(
    around: &[&Entry<AroundFn<C, E>, C>],
    ctx: &mut C,
    body: &mut Option<F>,
    progress: &mut Progress,
) -> Result<(), E>
where
    C: ActionContext,
    F: FnOnce(&mut C) -> Result<(), E>,
{
    let Some((current, inner)) = around.split_first() else {
        return run_action(ctx, body, progress);
    };

    progress.enter(DispatchState::RunningAround);
    progress.invoked(Phase::Around, &current.key.label());

    let mut yielded = false;
    let mut rest = |ctx: &mut C| -> Result<(), E> {
        yielded = true;
        if ctx.performed() {
            progress.halt(Phase::Around, current.key.label());
            return Ok(());
        }
        run_around(inner, ctx, body, progress)
    };

    (current.handler)(ctx, Next { rest: &mut rest })?;

    // Rendering without yielding terminates the chain like a halting before filter
    if !yielded && !progress.is_halted() && ctx.performed() {
        progress.halt(Phase::Around, current.key.label());
    }
    Ok(())
}

fn run_action<C, E, F>(ctx: &mut C, body: &mut Option<F>, progress: &mut Progress) -> Result<(), E>
where
    F: FnOnce(&mut C) -> Result<(), E>,
{
    match body.take() {
        Some(action) => {
            progress.enter(DispatchState::RunningAction);
            progress.report.action_performed = true;
            action(ctx)
        }
        None => Ok(()),
    }
}

//! Action filter chains: before, after and around callbacks for controller actions

pub mod chain;
pub mod condition;
pub mod controller;
pub mod dispatch;
pub mod options;
pub mod phase;
pub mod registry;

pub use chain::FilterChain;
pub use condition::{Conditions, Predicate};
pub use controller::{ActionContext, Controller};
pub use dispatch::{DispatchReport, DispatchState, HaltPoint, Next};
pub use options::{FilterOptions, Target};
pub use phase::Phase;
pub use registry::{AroundFn, FilterFn, Handler, HandlerRegistry};

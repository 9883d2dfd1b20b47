//! Action Filters - before/after/around callback chains for controller actions
//!
//! This library wraps a controller's action dispatch in a chain of filters,
//! with per-action `only`/`except` restrictions and `if`/`unless` predicates.
//!
//! ## Features
//!
//! - **Phases**: before, around (nested continuations) and after filters
//! - **Conditions**: `only`/`except` action lists normalized into typed predicates
//! - **Halting**: a filter that produces the response stops the chain
//! - **Skipping**: named filters can be removed or narrowed, including in derived chains
//! - **Observability**: structured logging and dispatch metrics
//!
//! ## Quick Start
//!
//! ```rust
//! use action_filters::prelude::*;
//!
//! #[derive(Default)]
//! struct Posts {
//!     text: Option<String>,
//!     response_body: Option<String>,
//! }
//!
//! impl ActionContext for Posts {
//!     fn performed(&self) -> bool {
//!         self.response_body.is_some()
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let registry = HandlerRegistry::new().callback("load", |c: &mut Posts| {
//!         c.text = Some("Hello world".to_string());
//!         Ok(())
//!     });
//!
//!     let mut chain: FilterChain<Posts, FilterError> = FilterChain::new(registry);
//!     chain.before_filter(["load"], FilterOptions::new().only(["index"]))?;
//!
//!     let mut posts = Posts::default();
//!     chain.run("index", &mut posts, |c| {
//!         c.response_body = c.text.clone();
//!         Ok(())
//!     })?;
//!
//!     assert_eq!(posts.response_body.as_deref(), Some("Hello world"));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod filters;
pub mod observability;

pub use config::FilterConfig;
pub use error::{FilterError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ChainConfig, FilterConfig};
    pub use crate::error::{FilterError, Result};
    pub use crate::filters::{
        ActionContext, Controller, DispatchReport, FilterChain, FilterOptions, HandlerRegistry,
        Next, Phase, Target,
    };
    pub use crate::observability::DispatchMetrics;
}

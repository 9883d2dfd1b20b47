//! Host-facing traits for controllers that carry a filter chain

use super::chain::FilterChain;
use super::dispatch::DispatchReport;

/// The receiver an action and its filters run on
pub trait ActionContext {
    /// Whether a response has already been produced.
    ///
    /// Checked after every before filter and whenever an around filter
    /// yields; once true, the rest of the chain and the action are skipped.
    fn performed(&self) -> bool;
}

/// A controller type whose actions dispatch through a shared filter chain.
///
/// The chain belongs to the type, not to an instance: it is typically built
/// once into a `static OnceLock` and handed out by [`Controller::filter_chain`].
///
/// ```rust
/// use action_filters::prelude::*;
/// use std::sync::OnceLock;
///
/// #[derive(Default)]
/// struct Greeter {
///     text: String,
///     response_body: Option<String>,
/// }
///
/// impl ActionContext for Greeter {
///     fn performed(&self) -> bool {
///         self.response_body.is_some()
///     }
/// }
///
/// impl Controller for Greeter {
///     type Error = FilterError;
///
///     fn filter_chain() -> &'static FilterChain<Self, Self::Error> {
///         static CHAIN: OnceLock<FilterChain<Greeter, FilterError>> = OnceLock::new();
///         CHAIN.get_or_init(|| {
///             let registry = HandlerRegistry::new().callback("first", |c: &mut Greeter| {
///                 c.text = "Hello world".to_string();
///                 Ok(())
///             });
///             let mut chain = FilterChain::new(registry);
///             chain
///                 .before_filter(["first"], FilterOptions::new())
///                 .expect("first is defined");
///             chain
///         })
///     }
/// }
///
/// let mut greeter = Greeter::default();
/// greeter
///     .process("index", |c| {
///         c.response_body = Some(c.text.clone());
///         Ok(())
///     })
///     .unwrap();
/// assert_eq!(greeter.response_body.as_deref(), Some("Hello world"));
/// ```
pub trait Controller: ActionContext + Sized + 'static {
    type Error: 'static;

    fn filter_chain() -> &'static FilterChain<Self, Self::Error>;

    /// Dispatch `action` through the type's chain
    fn process<F>(&mut self, action: &str, body: F) -> Result<DispatchReport, Self::Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Self::Error>,
    {
        Self::filter_chain().run(action, self, body)
    }
}

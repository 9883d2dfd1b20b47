//! Filter chain demo binary
//!
//! Builds a small controller with before, around and after filters, dispatches
//! a few actions through it and prints each dispatch report as JSON.

use action_filters::{
    config::FilterConfig,
    filters::{ActionContext, FilterChain, FilterOptions, HandlerRegistry},
    observability::{self, DispatchMetrics},
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default)]
struct DemoController {
    text: Option<String>,
    second: Option<String>,
    aroundz: String,
    response_body: Option<String>,
}

impl ActionContext for DemoController {
    fn performed(&self) -> bool {
        self.response_body.is_some()
    }
}

fn build_chain(
    config: &FilterConfig,
    metrics: Arc<DispatchMetrics>,
) -> anyhow::Result<FilterChain<DemoController, anyhow::Error>> {
    let registry = HandlerRegistry::new()
        .callback("first", |c: &mut DemoController| {
            c.text = Some("Hello world".to_string());
            Ok(())
        })
        .callback("second", |c: &mut DemoController| {
            c.second = Some("Goodbye".to_string());
            Ok(())
        })
        .callback("deny", |c: &mut DemoController| {
            c.response_body = Some("Forbidden".to_string());
            Ok(())
        })
        .around("aroundz", |c: &mut DemoController, next| {
            c.aroundz = "FIRST".to_string();
            next.run(c)?;
            c.aroundz.push_str("SECOND");
            Ok(())
        });

    let mut chain = FilterChain::with_config(registry, config.chain.clone()).with_metrics(metrics);
    chain.before_filter(["first"], FilterOptions::new())?;
    chain.before_filter(["deny"], FilterOptions::new().only(["admin"]))?;
    chain.after_filter(["second"], FilterOptions::new())?;
    chain.around_filter(["aroundz"], FilterOptions::new())?;
    Ok(chain)
}

fn main() -> anyhow::Result<()> {
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "action-filters.toml".to_string());
    let config = if Path::new(&config_path).exists() {
        FilterConfig::from_file_with_env(&config_path)?
    } else {
        FilterConfig::default_config()
    };
    config.validate()?;

    observability::init_from_config(&config.logging)?;
    info!("Starting filter demo");

    let metrics = Arc::new(DispatchMetrics::new());
    let chain = build_chain(&config, metrics.clone())?;
    info!("Filter chain built: {:?}", chain);

    for action in ["index", "admin"] {
        let mut controller = DemoController::default();
        let report = chain.run(action, &mut controller, |c| {
            c.response_body = c.text.clone();
            Ok(())
        })?;

        info!("Dispatched '{}': response={:?}", action, controller.response_body);
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    print!("{}", metrics.export_prometheus());
    Ok(())
}

//! Property-based tests for filter ordering and action conditions

use action_filters::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Default)]
struct Recorder {
    log: Vec<String>,
    response_body: Option<String>,
}

impl ActionContext for Recorder {
    fn performed(&self) -> bool {
        self.response_body.is_some()
    }
}

fn registry(names: &[String]) -> HandlerRegistry<Recorder, String> {
    names.iter().fold(HandlerRegistry::new(), |registry, name| {
        let label = name.clone();
        registry.callback(name.clone(), move |c: &mut Recorder| {
            c.log.push(label.clone());
            Ok(())
        })
    })
}

fn filter_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("filter_{}", i)).collect()
}

fn action(c: &mut Recorder) -> std::result::Result<(), String> {
    c.log.push("action".to_string());
    Ok(())
}

fn action_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["index", "show", "edit", "update", "destroy"]).prop_map(String::from)
}

proptest! {
    #[test]
    fn before_filters_run_in_registration_order(count in 1usize..12) {
        let names = filter_names(count);
        let mut chain = FilterChain::new(registry(&names));
        for name in &names {
            chain.before_filter([name.as_str()], FilterOptions::new()).unwrap();
        }

        let mut ctx = Recorder::default();
        chain.run("index", &mut ctx, action).unwrap();

        let mut expected = names.clone();
        expected.push("action".to_string());
        prop_assert_eq!(ctx.log, expected);
    }

    #[test]
    fn prepend_goes_ahead_of_existing_filters(count in 1usize..8, prepend_at in 0usize..8) {
        let names = filter_names(count + 1);
        let prepend_at = prepend_at.min(count);
        let mut chain = FilterChain::new(registry(&names));

        for name in &names[..count] {
            if name == &names[prepend_at] {
                continue;
            }
            chain.before_filter([name.as_str()], FilterOptions::new()).unwrap();
        }
        chain.prepend_before_filter([names[prepend_at].as_str()], FilterOptions::new()).unwrap();

        let order = chain.filter_names(Phase::Before);
        prop_assert_eq!(&order[0], &names[prepend_at]);
    }

    #[test]
    fn only_runs_exactly_for_listed_actions(
        only in prop::collection::vec(action_name(), 0..4),
        dispatched in action_name(),
    ) {
        let names = filter_names(1);
        let mut chain = FilterChain::new(registry(&names));
        chain.before_filter(["filter_0"], FilterOptions::new().only(only.clone())).unwrap();

        let mut ctx = Recorder::default();
        chain.run(&dispatched, &mut ctx, action).unwrap();

        let ran = ctx.log.contains(&"filter_0".to_string());
        prop_assert_eq!(ran, only.contains(&dispatched));
    }

    #[test]
    fn except_is_complement_of_only(
        list in prop::collection::vec(action_name(), 1..4),
        dispatched in action_name(),
    ) {
        let names = vec!["with_only".to_string(), "with_except".to_string()];
        let mut chain = FilterChain::new(registry(&names));
        chain.before_filter(["with_only"], FilterOptions::new().only(list.clone())).unwrap();
        chain.before_filter(["with_except"], FilterOptions::new().except(list.clone())).unwrap();

        let mut ctx = Recorder::default();
        chain.run(&dispatched, &mut ctx, action).unwrap();

        let only_ran = ctx.log.contains(&"with_only".to_string());
        let except_ran = ctx.log.contains(&"with_except".to_string());
        prop_assert!(only_ran != except_ran);
    }

    #[test]
    fn halting_filter_stops_everything_after_it(count in 1usize..8, halt_at in 0usize..8) {
        let halt_at = halt_at.min(count - 1);
        let names = filter_names(count);
        let mut reg = registry(&names);
        let halting = names[halt_at].clone();
        reg = reg.callback(halting.clone(), move |c: &mut Recorder| {
            c.log.push(halting.clone());
            c.response_body = Some("halted".to_string());
            Ok(())
        });

        let mut chain = FilterChain::new(reg);
        for name in &names {
            chain.before_filter([name.as_str()], FilterOptions::new()).unwrap();
        }
        chain.after_filter(["filter_0"], FilterOptions::new()).unwrap();

        let mut ctx = Recorder::default();
        let report = chain.run("index", &mut ctx, action).unwrap();

        prop_assert_eq!(ctx.log, names[..=halt_at].to_vec());
        prop_assert!(report.is_halted());
        prop_assert!(!report.action_performed);
    }
}

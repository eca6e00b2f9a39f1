//! Simulation tests

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use taxiway_engine::{ExecContext, Module, Simulator, SimulatorConfig, StepOutcome, Workspace};
use taxiway_foundation::{Changeset, Clock, Environment, Value};

use crate::quiet;

fn flag() -> Module {
    Module::new(Environment::new().with_var("flag", Value::Bool(false)).unwrap()).with_rule(
        "set",
        |ctx: &mut ExecContext<'_>| {
            if ctx.read("flag")? == Value::Bool(false) {
                ctx.write("flag", Value::Bool(true))?;
            }
            Ok(())
        },
    )
}

/// A light that switches on at `on` and off again at `off`.
fn timer(on: Clock, off: Clock) -> Module {
    Module::new(Environment::new().with_var("light", Value::from("dark")).unwrap())
        .with_rule("on", move |ctx: &mut ExecContext<'_>| {
            if ctx.read("light")? == Value::from("dark") && ctx.past(on)? {
                ctx.write("light", Value::from("lit"))?;
            }
            Ok(())
        })
        .with_rule("off", move |ctx: &mut ExecContext<'_>| {
            if ctx.read("light")? == Value::from("lit") && ctx.past(off)? {
                ctx.write("light", Value::from("spent"))?;
            }
            Ok(())
        })
}

// =============================================================================
// Stepping
// =============================================================================

#[test]
fn flag_sets_once_then_deadlocks() {
    let mut ws = Workspace::with_config(flag(), quiet()).unwrap();
    let mut sim = Simulator::new(SimulatorConfig::default());

    let first = sim.step(&mut ws).unwrap();
    assert_eq!(
        first,
        StepOutcome::Fired {
            rule: "set".to_string(),
            changes: Changeset::from_paths(["flag"]),
        }
    );
    assert_eq!(
        ws.current_event().unwrap().message(),
        "set (changed flag)"
    );
    assert_eq!(sim.step(&mut ws).unwrap(), StepOutcome::Deadlock);
    assert_eq!(ws.history().len(), 2);
}

#[test]
fn clock_jumps_to_each_deadline() {
    let mut ws = Workspace::with_config(timer(4, 9), quiet()).unwrap();
    let mut sim = Simulator::new(SimulatorConfig::default());

    sim.step(&mut ws).unwrap();
    assert_eq!(ws.value("light").unwrap(), &Value::from("lit"));
    assert_eq!(ws.current_event().unwrap().clock(), 4);

    sim.step(&mut ws).unwrap();
    assert_eq!(ws.value("light").unwrap(), &Value::from("spent"));
    assert_eq!(ws.current_event().unwrap().clock(), 9);

    assert!(sim.step(&mut ws).unwrap().is_deadlock());
}

#[test]
fn asynchronous_mode_ignores_deadlines() {
    let config = quiet().asynchronous(true);
    let mut ws = Workspace::with_config(timer(400, 900), config).unwrap();
    let mut sim = Simulator::new(SimulatorConfig::default());
    assert_eq!(sim.run(&mut ws, 10).unwrap(), 2);
    assert_eq!(ws.clock(), 2);
}

#[test]
fn same_seed_same_run() {
    let module = || {
        let env = Environment::new().with_var("log", Value::list(Vec::new())).unwrap();
        (0..5).fold(Module::new(env), |module, i| {
            module.with_rule(format!("push{i}"), move |ctx: &mut ExecContext<'_>| {
                let log = ctx.read("log")?;
                let items = log.as_list().cloned().unwrap_or_default();
                if !items.contains(&Value::Int(i)) {
                    let mut items = items;
                    items.push_back(Value::Int(i));
                    ctx.write("log", Value::List(items))?;
                }
                Ok(())
            })
        })
    };
    let run = |seed: u64| {
        let mut ws = Workspace::with_config(module(), quiet()).unwrap();
        let rng = ChaCha8Rng::seed_from_u64(seed);
        let mut sim = Simulator::with_rng(rng, SimulatorConfig::default());
        sim.run(&mut ws, 100).unwrap();
        ws.value("log").unwrap().clone()
    };
    assert_eq!(run(11), run(11));
    assert_eq!(run(11).as_list().map(|items| items.len()), Some(5));
}

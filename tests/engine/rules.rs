//! Rule firing and caching tests

use std::cell::Cell;
use std::rc::Rc;

use taxiway_engine::{Activity, ExecContext, Module, Simulator, SimulatorConfig, Workspace};
use taxiway_foundation::{Changeset, Environment, Error, Value};

use crate::quiet;

fn copy_module(calls: Rc<Cell<u32>>) -> Module {
    Module::new(
        Environment::new()
            .with_var("x", Value::Int(0)).unwrap()
            .with_var("y", Value::Int(0)).unwrap()
            .with_var("z", Value::Int(0)).unwrap(),
    )
    .with_rule("copy", move |ctx: &mut ExecContext<'_>| {
        calls.set(calls.get() + 1);
        let y = ctx.read("y")?;
        ctx.write("x", y)
    })
}

// =============================================================================
// Caching
// =============================================================================

#[test]
fn known_no_op_is_not_rerun() {
    let calls = Rc::new(Cell::new(0));
    let mut ws = Workspace::with_config(copy_module(Rc::clone(&calls)), quiet()).unwrap();
    let id = ws.rule_ids()[0];

    assert!(ws.fire(id).unwrap().is_empty());
    assert!(ws.fire(id).unwrap().is_empty());
    assert!(ws.fire(id).unwrap().is_empty());
    assert_eq!(calls.get(), 1);
}

#[test]
fn change_to_read_path_wakes_rule() {
    let calls = Rc::new(Cell::new(0));
    let mut ws = Workspace::with_config(copy_module(Rc::clone(&calls)), quiet()).unwrap();
    let id = ws.rule_ids()[0];
    ws.fire(id).unwrap();

    ws.try_change_state(|env, _| {
        env.set("y", Value::Int(4))?;
        Ok("poke y".to_string())
    })
    .unwrap();
    assert_eq!(ws.rule(id).unwrap().activity(), &Activity::Unevaluated);
    assert_eq!(ws.fire(id).unwrap(), Changeset::from_paths(["x"]));
    assert_eq!(ws.value("x").unwrap(), &Value::Int(4));
}

#[test]
fn unrelated_change_keeps_rule_asleep() {
    let calls = Rc::new(Cell::new(0));
    let mut ws = Workspace::with_config(copy_module(Rc::clone(&calls)), quiet()).unwrap();
    let id = ws.rule_ids()[0];
    ws.fire(id).unwrap();

    ws.try_change_state(|env, _| {
        env.set("z", Value::Int(4))?;
        Ok("poke z".to_string())
    })
    .unwrap();
    assert!(ws.rule(id).unwrap().is_known_no_op());
    assert!(ws.fire(id).unwrap().is_empty());
    assert_eq!(calls.get(), 1);
}

#[test]
fn probe_predicts_fire() {
    let calls = Rc::new(Cell::new(0));
    let module = copy_module(Rc::clone(&calls));
    let mut ws = Workspace::with_config(module, quiet()).unwrap();
    ws.try_change_state(|env, _| {
        env.set("y", Value::Int(2))?;
        Ok("seed".to_string())
    })
    .unwrap();
    let id = ws.rule_ids()[0];

    let predicted = ws.would_fire(id).unwrap();
    assert_eq!(ws.value("x").unwrap(), &Value::Int(0));
    // answered from the cache the second time
    assert_eq!(ws.would_fire(id).unwrap(), predicted);
    assert_eq!(calls.get(), 1);

    assert_eq!(ws.fire(id).unwrap(), predicted);
    assert_eq!(calls.get(), 2);
}

// =============================================================================
// Bodies
// =============================================================================

#[test]
fn early_return_keeps_prior_writes() {
    let module = Module::new(Environment::new().with_var("x", Value::Int(0)).unwrap()).with_rule(
        "bail",
        |ctx: &mut ExecContext<'_>| {
            ctx.write("x", Value::Int(1))?;
            Err(Error::early_return())
        },
    );
    let mut ws = Workspace::with_config(module, quiet()).unwrap();
    let id = ws.rule_ids()[0];
    assert_eq!(ws.fire(id).unwrap(), Changeset::from_paths(["x"]));
    assert_eq!(ws.value("x").unwrap(), &Value::Int(1));
}

#[test]
fn failing_rule_leaves_no_trace() {
    let module = Module::new(Environment::new().with_var("x", Value::Int(0)).unwrap()).with_rule(
        "broken",
        |ctx: &mut ExecContext<'_>| {
            ctx.write("x", Value::Int(1))?;
            ctx.emit("log", Value::from("half done"));
            Err(Error::runtime("broke halfway"))
        },
    );
    let mut ws = Workspace::with_config(module, quiet()).unwrap();
    let id = ws.rule_ids()[0];
    let err = ws.fire(id).unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(ws.value("x").unwrap(), &Value::Int(0));
    assert!(ws.take_output().is_empty());
    assert_eq!(ws.history().len(), 1);
    assert_eq!(ws.rule(id).unwrap().activity(), &Activity::Unevaluated);
}

#[test]
fn emitted_output_is_collected() {
    let module = Module::new(Environment::new().with_var("said", Value::Bool(false)).unwrap())
        .with_rule("speak", |ctx: &mut ExecContext<'_>| {
            if ctx.read("said")? == Value::Bool(false) {
                ctx.emit("console", Value::from("hello"));
                ctx.write("said", Value::Bool(true))?;
            }
            Ok(())
        });
    let mut ws = Workspace::with_config(module, quiet()).unwrap();
    let id = ws.rule_ids()[0];
    ws.fire(id).unwrap();
    let output = ws.take_output();
    assert_eq!(output.len(), 1);
    assert_eq!(output[0].channel, "console");
    assert_eq!(output[0].value, Value::from("hello"));
    assert!(ws.take_output().is_empty());
}

// =============================================================================
// External Rules
// =============================================================================

#[test]
fn external_rules_fire_only_on_request() {
    let module = Module::new(Environment::new().with_var("pressed", Value::Bool(false)).unwrap())
        .with_external_rule("press", |ctx: &mut ExecContext<'_>| {
            ctx.write("pressed", Value::Bool(true))
        });
    let mut ws = Workspace::with_config(module, quiet()).unwrap();
    assert!(ws.rule_ids().is_empty());

    let mut sim = Simulator::new(SimulatorConfig::default());
    assert!(sim.step(&mut ws).unwrap().is_deadlock());
    assert_eq!(ws.value("pressed").unwrap(), &Value::Bool(false));

    assert_eq!(
        ws.fire_external("press").unwrap(),
        Changeset::from_paths(["pressed"])
    );
    assert_eq!(
        ws.current_event().unwrap().message(),
        "press (changed pressed)"
    );
}

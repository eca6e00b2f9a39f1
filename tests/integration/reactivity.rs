//! Reactive caching checked against fresh evaluation
//!
//! Every rule the workspace believes is a no-op must really be one, and a
//! reactive deadlock must also be a deadlock for the uncached search.

use proptest::prelude::*;
use taxiway_engine::{
    ExecContext, Module, RuleId, Simulator, SimulatorConfig, StepOutcome, Workspace,
};
use taxiway_foundation::{Environment, Result, Value};

use crate::quiet;

fn int(ctx: &mut ExecContext<'_>, name: &str) -> Result<i64> {
    Ok(ctx.read(name)?.as_int().unwrap_or(0))
}

/// A lift that travels to a target floor, opens, and after tick 10 goes home.
fn lift() -> Module {
    let env = Environment::new()
        .with_var("floor", Value::Int(0)).unwrap()
        .with_var("target", Value::Int(3)).unwrap()
        .with_var("door", Value::from("closed")).unwrap()
        .with_var("lamps", Value::list((0..4).map(|_| Value::Bool(false)))).unwrap()
        .with_constant("floors", Value::Int(4)).unwrap();
    Module::new(env)
        .with_rule("move", |ctx: &mut ExecContext<'_>| {
            if ctx.read("door")? != Value::from("closed") {
                return Ok(());
            }
            let floor = int(ctx, "floor")?;
            let target = int(ctx, "target")?;
            if floor != target {
                let step = if target > floor { 1 } else { -1 };
                ctx.write("floor", Value::Int(floor + step))?;
            }
            Ok(())
        })
        .with_rule("open", |ctx: &mut ExecContext<'_>| {
            if int(ctx, "floor")? == int(ctx, "target")?
                && int(ctx, "target")? != 0
                && ctx.read("door")? == Value::from("closed")
            {
                ctx.write("door", Value::from("open"))?;
            }
            Ok(())
        })
        .with_rule("home", |ctx: &mut ExecContext<'_>| {
            if ctx.read("door")? == Value::from("open") && ctx.past(10)? {
                ctx.write("door", Value::from("closed"))?;
                ctx.write("target", Value::Int(0))?;
            }
            Ok(())
        })
        .with_quantified_rule(
            "lamp",
            |ctx: &mut ExecContext<'_>| {
                let floors = int(ctx, "floors")?;
                Ok((0..floors).map(|i| vec![Value::Int(i)]).collect())
            },
            |indexes: &[Value], ctx: &mut ExecContext<'_>| {
                let i = indexes[0].as_int().unwrap_or(0);
                let slot = usize::try_from(i).unwrap_or(0);
                let lit = int(ctx, "floor")? == i;
                if ctx.read_path("lamps", &[slot.into()])? != Value::Bool(lit) {
                    let mut lamps = ctx.read("lamps")?.as_list().cloned().unwrap_or_default();
                    lamps.set(slot, Value::Bool(lit));
                    ctx.write("lamps", Value::List(lamps))?;
                }
                Ok(())
            },
        )
}

/// Re-runs every cached no-op rule from scratch and returns the ones that
/// would in fact change something.
fn unsound_no_ops(ws: &mut Workspace) -> Vec<RuleId> {
    let mut unsound = Vec::new();
    for id in ws.rule_ids() {
        let rule = ws.rule(id).unwrap();
        if !rule.is_known_no_op() {
            continue;
        }
        let action = rule.action();
        let clock = ws.clock();
        let changes = ws
            .would_change_state(|env| {
                let mut ctx = ExecContext::new(env).with_clock(clock);
                action(&mut ctx)
            })
            .unwrap();
        if !changes.is_empty() {
            unsound.push(id);
        }
    }
    unsound
}

#[test]
fn lift_reaches_home() {
    let mut ws = Workspace::with_config(lift(), quiet()).unwrap();
    let mut sim = Simulator::new(SimulatorConfig::default());
    sim.run(&mut ws, 200).unwrap();
    assert_eq!(ws.value("floor").unwrap(), &Value::Int(0));
    assert_eq!(ws.value("door").unwrap(), &Value::from("closed"));
    assert!(ws.clock() > 10);
    let lamps = ws.value("lamps").unwrap().as_list().unwrap().clone();
    assert_eq!(lamps.get(0), Some(&Value::Bool(true)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn cached_no_ops_are_real(seed in any::<u64>()) {
        let mut ws = Workspace::with_config(lift(), quiet()).unwrap();
        let mut sim = Simulator::new(SimulatorConfig::new().with_seed(seed));
        for _ in 0..200 {
            let outcome = sim.step(&mut ws).unwrap();
            prop_assert!(unsound_no_ops(&mut ws).is_empty());
            if outcome == StepOutcome::Deadlock {
                break;
            }
        }
        prop_assert!(sim.step(&mut ws).unwrap().is_deadlock());
        prop_assert!(sim.naive_step(&mut ws).unwrap().is_deadlock());
    }

    #[test]
    fn reactive_and_naive_agree_on_final_state(seed in any::<u64>()) {
        let mut reactive = Workspace::with_config(lift(), quiet()).unwrap();
        let mut sim = Simulator::new(SimulatorConfig::new().with_seed(seed));
        sim.run(&mut reactive, 200).unwrap();

        let mut naive = Workspace::with_config(lift(), quiet()).unwrap();
        naive.set_tick(reactive.clock()).unwrap();
        let mut sim = Simulator::new(SimulatorConfig::new().with_seed(seed));
        for _ in 0..200 {
            if sim.naive_step(&mut naive).unwrap().is_deadlock() {
                break;
            }
        }
        prop_assert_eq!(
            reactive.environment().snapshot(),
            naive.environment().snapshot()
        );
    }
}

//! Counter Example - state, effects and commits
//!
//! This example demonstrates:
//! - A function component with `use_state` and `use_effect`
//! - Dispatching a callback attribute through the in-memory output
//! - Watching commits with `on_commit`
//!
//! Run with: cargo run --example counter

use std::cell::Cell;
use std::rc::Rc;

use spark_fiber::{
    Callback, Cleanup, Element, Props, RenderContext, Result, Scheduler, SchedulerConfig,
};

fn counter(ctx: &mut RenderContext, props: &Props) -> Result<Vec<Element>> {
    let step = props.number("step").unwrap_or(1.0) as i64;
    let (count, set_count) = ctx.use_state(|| 0i64)?;

    ctx.use_effect(Some(&[count][..]), move || {
        println!("  effect: count is {count}");
        Some(Box::new(move || println!("  cleanup: leaving {count}")) as Cleanup)
    })?;

    let increment = Callback::new(move || set_count.update(move |n| n + step));
    Ok(vec![
        Element::host("div").attr("class", "counter").children([
            Element::host("span").child(format!("Count: {count}")),
            Element::host("button").attr("onclick", increment).child("+"),
        ]),
    ])
}

fn main() -> Result<()> {
    println!("=== spark-fiber Counter Example ===\n");

    let mut scheduler = Scheduler::in_memory(SchedulerConfig::default());
    let commits = Rc::new(Cell::new(0));
    let seen = commits.clone();
    let _unsubscribe = scheduler.on_commit(move |stats| {
        seen.set(seen.get() + 1);
        println!(
            "  commit: {} placed, {} patched, {} effects",
            stats.placements, stats.updates, stats.effects
        );
    });

    scheduler.render(Element::component("Counter", counter).attr("step", 5))?;
    scheduler.run_until_idle()?;
    println!("{}\n", scheduler.output().markup());

    for _ in 0..3 {
        let button = scheduler.output().find("button");
        if let Some(button) = button {
            scheduler.output().dispatch(button, "onclick");
        }
        scheduler.run_until_idle()?;
        println!("{}\n", scheduler.output().markup());
    }

    println!("{} commits", commits.get());
    Ok(())
}

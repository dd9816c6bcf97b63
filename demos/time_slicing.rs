//! Time Slicing Example - yielding between units of work
//!
//! This example demonstrates:
//! - Rendering a large keyed list in bounded slices
//! - A custom `IdleHost` granting fixed-length frames
//! - Reversing the list, which moves outputs instead of recreating them
//!
//! Run with: cargo run --example time_slicing

use std::cell::RefCell;
use std::time::Duration;

use spark_fiber::{
    Deadline, Element, FrameDeadline, IdleHost, OutputOp, Props, RenderContext, Result, Scheduler,
    SchedulerConfig,
};

thread_local! {
    static ROWS: RefCell<Vec<u32>> = RefCell::new((0..2_000).collect());
}

fn row(_ctx: &mut RenderContext, props: &Props) -> Result<Vec<Element>> {
    let id = props.number("id").unwrap_or_default();
    Ok(vec![Element::host("li").child(format!("row {id}"))])
}

fn table(_ctx: &mut RenderContext, _props: &Props) -> Result<Vec<Element>> {
    let rows = ROWS.with(|rows| rows.borrow().clone());
    Ok(vec![Element::host("ul").children(rows.into_iter().map(|id| {
        Element::component("Row", row)
            .key(i64::from(id))
            .attr("id", f64::from(id))
    }))])
}

/// Grants 2ms frames and counts them.
struct FrameHost {
    frames: usize,
}

impl IdleHost for FrameHost {
    fn wait_for_idle(&mut self) -> Option<Box<dyn Deadline>> {
        self.frames += 1;
        Some(Box::new(FrameDeadline::new(Duration::from_millis(2))))
    }
}

fn main() -> Result<()> {
    println!("=== spark-fiber Time Slicing Example ===\n");

    let config = SchedulerConfig::default().with_yield_threshold(Duration::from_micros(200));
    let mut scheduler = Scheduler::in_memory(config);
    scheduler.render(Element::component("Table", table))?;

    let mut host = FrameHost { frames: 0 };
    scheduler.run(&mut host)?;
    println!(
        "mounted {} output nodes in {} frames",
        scheduler.output().node_count(),
        host.frames
    );

    ROWS.with(|rows| rows.borrow_mut().reverse());
    let table = scheduler
        .tree()
        .preorder(scheduler.root())
        .into_iter()
        .find(|id| scheduler.tree()[*id].kind().name() == "Table");
    if let Some(table) = table {
        scheduler.output_mut().take_ops();
        scheduler.updater(table).schedule();
        host.frames = 0;
        scheduler.run(&mut host)?;
    }

    let ops = scheduler.output().ops();
    let created = ops.iter().filter(|op| matches!(op, OutputOp::Create { .. })).count();
    let attached = ops.iter().filter(|op| matches!(op, OutputOp::Attach { .. })).count();
    println!("reversed in {} frames: {created} created, {attached} re-attached", host.frames);
    Ok(())
}

//! Scheduler - cooperative, resumable render passes over the fiber tree.
//!
//! # States
//!
//! ```text
//!            queue_update               last unit done
//!   Idle ────────────────► Rendering ─────────────────► Committing ──► Idle
//!    ▲                        │  ▲                                       │
//!    │      render error      │  └──── yield / resume (between units) ───┘
//!    └──── (rollback) ◄───────┘                         (new requests restart)
//! ```
//!
//! A pass processes a queue of tree roots (`trees_in_progress`) one unit of
//! work at a time. Between two units the loop may yield; the next unit is
//! the continue token and nothing else needs to be saved. Update requests
//! arriving meanwhile are merged into the queue by
//! [`Scheduler::queue_update`], which never leaves an ancestor/descendant
//! pair in it.
//!
//! # Example
//!
//! ```ignore
//! let mut scheduler = Scheduler::in_memory(SchedulerConfig::default());
//! scheduler.render(Element::component("App", app))?;
//! scheduler.run_until_idle()?;
//! println!("{}", scheduler.output().markup());
//! ```

mod deadline;
mod invalidation;
mod work_loop;

pub use deadline::{Deadline, FrameDeadline, IdleHost, ImmediateHost, UnitBudget};
pub use invalidation::UpdateDecision;
pub use work_loop::Step;

use std::rc::Rc;

use spark_signals::Signal;

use crate::commit::{CommitStats, EffectBatch};
use crate::config::SchedulerConfig;
use crate::element::{Element, Props};
use crate::engine::{Fiber, FiberId, FiberTree};
use crate::error::Result;
use crate::hooks::{UpdateRequests, Updater};
use crate::notify::CommitNotifier;
use crate::renderer::{MemoryRenderer, OutputTarget};
use crate::types::{Cleanup, OutputHandle};

/// Where the scheduler is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Rendering,
    Committing,
}

/// Owns the fiber tree, the output target and the in-flight pass.
pub struct Scheduler<O: OutputTarget> {
    tree: FiberTree,
    output: O,
    config: SchedulerConfig,
    root: FiberId,
    phase: Phase,
    /// Current pass. Bumped at commit and at abort.
    pass: u64,
    next_unit: Option<FiberId>,
    trees: Vec<FiberId>,
    cursor: usize,
    deletions: Vec<FiberId>,
    pending_effects: Vec<EffectBatch>,
    /// Already-rendered nodes to re-queue once the pass commits.
    deferred: Vec<FiberId>,
    requests: UpdateRequests,
    notifier: CommitNotifier,
}

impl<O: OutputTarget> Scheduler<O> {
    /// Create a scheduler rendering into `container` of `output`.
    pub fn new(output: O, container: OutputHandle, config: SchedulerConfig) -> Self {
        let mut tree = FiberTree::new();
        let root = tree.insert(Fiber::root(container));
        Self {
            tree,
            output,
            config,
            root,
            phase: Phase::Idle,
            pass: 1,
            next_unit: None,
            trees: Vec::new(),
            cursor: 0,
            deletions: Vec::new(),
            pending_effects: Vec::new(),
            deferred: Vec::new(),
            requests: UpdateRequests::new(),
            notifier: CommitNotifier::new(),
        }
    }

    /// Replace the whole application with `element` and schedule a render.
    pub fn render(&mut self, element: Element) -> Result<FiberId> {
        let root = self.root;
        self.tree.begin_work(root, self.pass);
        self.tree[root].props = Rc::new(Props {
            children: vec![element],
            ..Props::default()
        });
        let decision = self.queue_update(root)?;
        log::debug!("render scheduled: {decision:?}");
        Ok(root)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn tree(&self) -> &FiberTree {
        &self.tree
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The container fiber.
    pub fn root(&self) -> FiberId {
        self.root
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pass(&self) -> u64 {
        self.pass
    }

    /// Roots queued in the current pass, in processing order.
    pub fn trees_in_progress(&self) -> &[FiberId] {
        &self.trees
    }

    /// Index of the tree being processed.
    pub fn current_tree_index(&self) -> usize {
        self.cursor
    }

    /// The continue token: the node the next step will process.
    pub fn next_unit_of_work(&self) -> Option<FiberId> {
        self.next_unit
    }

    /// Nothing in flight and nothing waiting in the inbox.
    pub fn is_idle(&self) -> bool {
        self.next_unit.is_none() && self.requests.is_empty()
    }

    /// Inbox shared with state setters.
    pub fn requests(&self) -> &UpdateRequests {
        &self.requests
    }

    /// Handle that requests a re-render of `fiber` from outside a render.
    pub fn updater(&self, fiber: FiberId) -> Updater {
        Updater::external(fiber, self.requests.clone())
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Call `listener` after every commit. The returned cleanup unsubscribes.
    pub fn on_commit(&self, listener: impl Fn(&CommitStats) + 'static) -> Cleanup {
        self.notifier.subscribe(listener)
    }

    /// Reactive commit counter.
    pub fn commit_signal(&self) -> Signal<u64> {
        self.notifier.signal()
    }
}

impl Scheduler<MemoryRenderer> {
    /// Scheduler over a fresh [`MemoryRenderer`].
    pub fn in_memory(config: SchedulerConfig) -> Self {
        let output = MemoryRenderer::new();
        let container = output.container();
        Self::new(output, container, config)
    }
}

impl<O: OutputTarget> std::fmt::Debug for Scheduler<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("phase", &self.phase)
            .field("pass", &self.pass)
            .field("next_unit", &self.next_unit)
            .field("trees", &self.trees)
            .field("cursor", &self.cursor)
            .field("deletions", &self.deletions.len())
            .field("pending_effects", &self.pending_effects.len())
            .field("deferred", &self.deferred)
            .field("fibers", &self.tree.len())
            .finish()
    }
}

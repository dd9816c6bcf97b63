//! # spark-fiber
//!
//! Incremental UI-tree reconciler with a cooperative, time-sliced scheduler.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! commit notifications.
//!
//! ## Architecture
//!
//! Components return [`Element`] descriptions. The scheduler walks a
//! persistent fiber tree one unit of work at a time, reconciles each node's
//! new children against its current ones and, once every queued tree is
//! done, commits the accumulated mutations to an [`OutputTarget`] in one
//! uninterrupted step:
//!
//! ```text
//! queue_update → [unit → reconcile → unit → ...] (yield between units) → commit → effects
//! ```
//!
//! Fibers live in a slotmap arena and keep their [`FiberId`] for as long as
//! they are mounted. Hook state is bound to a fiber by call order and reached
//! through the explicit [`RenderContext`] each component receives.
//!
//! ## Modules
//!
//! - [`types`] - Handles, keys, attributes, effect tags
//! - [`element`] - Description model (elements, props, component kinds)
//! - [`engine`] - Fiber arena
//! - [`hooks`] - Render context and hooks (state, effect, ref)
//! - [`reconciler`] - Child list diffing
//! - [`scheduler`] - Work loop, update invalidation, deadlines
//! - [`commit`] - Commit applier
//! - [`renderer`] - Output target boundary and the in-memory target

pub mod commit;
pub mod config;
pub mod element;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod notify;
pub mod reconciler;
pub mod renderer;
pub mod scheduler;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use commit::CommitStats;
pub use config::SchedulerConfig;
pub use element::{
    ClassComponent, Component, ComponentFactory, ComponentFn, Element, FunctionComponent,
    Instance, NodeKind, NodeRef, Props,
};
pub use engine::{Fiber, FiberId, FiberTree, FiberVersion};
pub use error::{ReconcileError, Result};
pub use hooks::{
    deps_require_change, HookBinding, HookSlot, RenderContext, StateSetter, UpdateRequests, Updater,
};
pub use notify::CommitNotifier;
pub use renderer::{
    diff_attributes, AttributeChange, MemoryNode, MemoryRenderer, OutputOp, OutputTarget,
};
pub use scheduler::{
    Deadline, FrameDeadline, IdleHost, ImmediateHost, Phase, Scheduler, Step, UnitBudget,
    UpdateDecision,
};

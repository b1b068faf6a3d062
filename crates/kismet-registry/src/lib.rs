//! Kismet action registry
//!
//! Discovery, filtering and spawning of graph node actions.
//!
//! ## Architecture
//!
//! - **Discovery**: passes over reflection metadata produce [`Action`]s, stored
//!   per class, node type or asset in the [`ActionCatalog`]
//! - **Priming**: the [`IncrementalPrimer`] builds template nodes a little
//!   at a time so pin shapes are ready when a query needs them
//! - **Filtering**: an [`ActionFilter`] narrows the catalog to what is valid
//!   for a [`FilterContext`]
//! - **Spawning**: [`Action::invoke`] and [`Action::invoke_bound`] place the
//!   configured node in a graph
//!
//! ## Modules
//!
//! - [`action`]: actions, template nodes and menu signatures
//! - [`catalog`]: the action catalog
//! - [`filter`]: the context filter and its rejection tests
//! - [`primer`]: budgeted template priming

pub mod action;
pub mod catalog;
mod discovery;
mod env;
pub mod filter;
pub mod primer;
mod spawn;

pub use action::{
    Action, ActionKey, BoundField, CustomizeFn, MenuSignature, SpawnerKind, TemplateNode,
};
pub use catalog::ActionCatalog;
pub use env::ActionEnv;
pub use filter::{ActionFilter, FilterContext, FilterFlags, GraphContext, RejectionTest};
pub use primer::{Clock, IncrementalPrimer, MonotonicClock, PrimerConfig};

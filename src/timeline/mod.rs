//! The headless timeline engine: clustering and filtering, derived lookup
//! structures, the selection/focus state machine, scroll compensation, and
//! step navigation. Everything in here is plain data and pure-ish functions
//! so the whole engine is unit-testable without a display.

pub mod clusterer;
pub mod compensation;
pub mod filter;
pub mod index;
pub mod navigator;
pub mod selection;

pub use clusterer::{cluster_items, GAP_THRESHOLD_MS};
pub use filter::TagFilter;
pub use index::TimelineIndex;
pub use selection::{SelectionState, Transition, TransitionKind};

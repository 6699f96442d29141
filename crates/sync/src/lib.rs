#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Asynchronous state synchronization primitives for searchable lists and
//! entity-bound forms.
//!
//! The problem this crate solves is a small, easy-to-get-wrong concurrency
//! puzzle: user keystrokes, persisted filter state, and overlapping keyed
//! fetches race each other, and "just show the latest response" is provably
//! wrong (a response for an old query can arrive after a response for a new
//! one if it happens to be satisfied faster). Everything here is an explicit
//! state machine; correctness holds from the transition tables alone, with
//! no reliance on any UI runtime's re-render scheduling.
//!
//! # Main Types
//!
//! - [`debounce::Debouncer`] - collapses rapid input into one settled value
//! - [`fetch::FetchCoordinator`] - keyed fetches with per-scope sequence numbers
//! - [`stale::StaleGuard`] - gates display of response data against staleness
//! - [`form::FormSyncController`] - per-entity baseline init state machine
//! - [`query::FilterStore`] - string-keyed persisted filter surface
//!
//! # Data Flow
//!
//! ```text
//! keystrokes -> Debouncer -> filter store (page reset)
//!            -> FetchCoordinator (keyed request, seq number)
//!            -> StaleGuard (gates display) -> rendered list
//! ```

pub mod debounce;
pub mod fetch;
pub mod form;
pub mod observe;
pub mod query;
pub mod stale;
pub mod structural;

pub use debounce::Debouncer;
pub use fetch::{
	FetchCoordinator, FetchError, FetchKey, FetchOutcome, FetchPage, PageFetcher, ScopeId,
	SeqClock,
};
pub use form::{EntityId, EntityPayload, FieldMap, FieldValue, FormPhase, FormSyncController};
pub use observe::{Listeners, SubscriptionId};
pub use query::{FilterStore, MemoryFilterStore, QueryState, QueryUpdate};
pub use stale::{ResolveAction, StaleGuard};

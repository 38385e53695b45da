//! drift-agg — the aggregation-and-diff engine.
//!
//! Tracks one cell per (environment, service) pair through its
//! loading/errored/loaded lifecycle, normalizes heterogeneous payload
//! shapes into the commit model, compares commit sets against a
//! baseline environment, and coordinates session-tagged full-matrix
//! refreshes with a hard deadline guard.
//!
//! # Session discipline
//!
//! Every refresh gets a fresh session id. A fetch completion is applied
//! only while its session is still the active one and has not been
//! closed by the deadline guard; anything else is discarded. The final
//! committed table therefore never mixes results from two sessions.

pub mod compare;
pub mod normalize;
pub mod refresh;
pub mod store;

pub use compare::{compare, mismatched_entries, MatchStatus, MismatchDetail};
pub use normalize::normalize;
pub use refresh::RefreshOrchestrator;
pub use store::{AggregationStore, CellState, SessionId};

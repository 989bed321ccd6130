//! # haggle-store
//!
//! Persistence for negotiation threads, messages, and deal proposals.
//!
//! This crate provides:
//!
//! - **Store contract**: [`NegotiationStore`], the async trait both backends
//!   implement
//! - **Durable backend**: [`PgStore`] over a postgres pool
//! - **Volatile backend**: [`MemoryStore`] for tests and degraded operation
//! - **Backend resolution**: [`connect_store`] which probes the configured
//!   database and falls back to memory, reporting the degraded flag
//!
//! Turn tracking is owned here: every recorded message flips the thread's
//! `current_turn` exactly once. Role alternation itself is call discipline of
//! the protocol engine, not a store-enforced rule.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod contract;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod resolve;

pub use contract::NegotiationStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use resolve::{connect_store, StoreBackend, StoreHandle};
